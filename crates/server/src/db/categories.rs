//! Category repository.
//!
//! Categories form a tree through `parent_id`. Each row also stores its
//! materialized `path` of slugs from the root, which is rewritten for the
//! whole subtree when a category is renamed.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use real_taste_core::{CategoryId, Slug, UserId};

use super::RepositoryError;
use crate::models::category::{Category, CategoryInput};

const CATEGORY_COLUMNS: &str = "id, name, slug, description, image, is_active, parent_id, level, \
     path, created_by, updated_by, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: i32,
    name: String,
    slug: String,
    description: String,
    image: Option<String>,
    is_active: bool,
    parent_id: Option<i32>,
    level: i16,
    path: Vec<String>,
    created_by: Option<i32>,
    updated_by: Option<i32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: CategoryId::new(row.id),
            name: row.name,
            slug: Slug::from_stored(row.slug),
            description: row.description,
            image: row.image,
            is_active: row.is_active,
            parent_id: row.parent_id.map(CategoryId::new),
            level: row.level,
            path: row.path,
            created_by: row.created_by.map(UserId::new),
            updated_by: row.updated_by.map(UserId::new),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// A category ready to insert.
#[derive(Debug)]
pub struct NewCategory<'a> {
    pub input: &'a CategoryInput,
    pub slug: &'a Slug,
    pub level: i16,
    pub path: &'a [String],
    pub created_by: Option<UserId>,
}

/// Repository for category database operations.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All categories ordered by path, so parents precede their children.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM cafe.category ORDER BY path, id"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM cafe.category WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(Category::from))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM cafe.category WHERE slug = lower($1)"
        ))
        .bind(slug.trim())
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(Category::from))
    }

    /// Resolve a category from an id, slug or name (case-insensitive).
    ///
    /// Used by bulk import where the file refers to categories loosely.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Category>, RepositoryError> {
        let reference = reference.trim();
        if let Ok(id) = reference.parse::<CategoryId>() {
            return self.get(id).await;
        }
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            r"
            SELECT {CATEGORY_COLUMNS} FROM cafe.category
            WHERE slug = lower($1) OR lower(name) = lower($1)
            ORDER BY (slug = lower($1)) DESC, id
            LIMIT 1
            "
        ))
        .bind(reference)
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(Category::from))
    }

    /// Direct children of a category, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn children(&self, id: CategoryId) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM cafe.category WHERE parent_id = $1 ORDER BY name, id"
        ))
        .bind(id.as_i32())
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    /// Insert a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is already used.
    pub async fn create(&self, new: NewCategory<'_>) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            r"
            INSERT INTO cafe.category
                (name, slug, description, image, is_active, parent_id, level, path, created_by, updated_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            RETURNING {CATEGORY_COLUMNS}
            "
        ))
        .bind(&new.input.name)
        .bind(new.slug.as_str())
        .bind(&new.input.description)
        .bind(new.input.image.as_deref())
        .bind(new.input.is_active)
        .bind(new.input.parent_id.map(|id| id.as_i32()))
        .bind(new.level)
        .bind(new.path)
        .bind(new.created_by.map(|id| id.as_i32()))
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::unique_violation(e, "Category already exists"))?;
        Ok(row.into())
    }

    /// Update a category's fields. The parent never changes.
    ///
    /// When the slug changes, the category's path and the path of every
    /// descendant are rewritten in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category doesn't exist.
    /// Returns `RepositoryError::Conflict` if the new slug is already used.
    pub async fn update(
        &self,
        id: CategoryId,
        input: &CategoryInput,
        slug: &Slug,
        updated_by: Option<UserId>,
    ) -> Result<Category, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM cafe.category WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_i32())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        let old_path = current.path;
        let mut new_path = old_path.clone();
        match new_path.last_mut() {
            Some(last) => slug.as_str().clone_into(last),
            None => new_path.push(slug.as_str().to_owned()),
        }

        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            r"
            UPDATE cafe.category
            SET name = $2, slug = $3, description = $4, image = $5, is_active = $6,
                path = $7, updated_by = $8
            WHERE id = $1
            RETURNING {CATEGORY_COLUMNS}
            "
        ))
        .bind(id.as_i32())
        .bind(&input.name)
        .bind(slug.as_str())
        .bind(&input.description)
        .bind(input.image.as_deref())
        .bind(input.is_active)
        .bind(&new_path)
        .bind(updated_by.map(|id| id.as_i32()))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::unique_violation(e, "Category already exists"))?;

        if new_path != old_path {
            let depth = i32::try_from(old_path.len())
                .map_err(|e| RepositoryError::corrupt("category path", e))?;
            sqlx::query(
                r"
                UPDATE cafe.category
                SET path = $2 || path[$3 + 1:]
                WHERE id <> $4 AND path[1:$3] = $1
                ",
            )
            .bind(&old_path)
            .bind(&new_path)
            .bind(depth)
            .bind(id.as_i32())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(row.into())
    }

    /// Whether any category has `id` as its parent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn has_children(&self, id: CategoryId) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM cafe.category WHERE parent_id = $1)",
        )
        .bind(id.as_i32())
        .fetch_one(self.pool)
        .await?;
        Ok(exists)
    }

    /// Delete a leaf category. Its products become uncategorized.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category doesn't exist.
    /// Returns `RepositoryError::Database` if it still has children.
    pub async fn delete(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM cafe.category WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Number of categories, used by seeding.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM cafe.category")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
