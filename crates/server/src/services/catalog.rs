//! Category rules shared by the admin API and bulk import.

use sqlx::PgPool;
use thiserror::Error;

use real_taste_core::{CategoryId, UserId};

use crate::db::categories::NewCategory;
use crate::db::{CategoryRepository, RepositoryError};
use crate::models::ValidationError;
use crate::models::category::{Category, CategoryInput, placement};

#[derive(Debug, Error)]
pub enum CategoryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Category not found")]
    NotFound,

    #[error("Parent category not found")]
    ParentNotFound,

    #[error("Cannot delete category with subcategories")]
    HasSubcategories,

    #[error("Category with this name already exists")]
    Conflict,

    #[error("database error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for CategoryError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => Self::NotFound,
            RepositoryError::Conflict(_) => Self::Conflict,
            other => Self::Repository(other),
        }
    }
}

pub struct CategoryService<'a> {
    categories: CategoryRepository<'a>,
}

impl<'a> CategoryService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            categories: CategoryRepository::new(pool),
        }
    }

    /// Create a category under its optional parent.
    ///
    /// # Errors
    ///
    /// Returns `CategoryError::ParentNotFound` for an unknown parent,
    /// `CategoryError::Validation` when the parent is already at the deepest
    /// level, and `CategoryError::Conflict` for a duplicate slug.
    pub async fn create(
        &self,
        input: CategoryInput,
        created_by: Option<UserId>,
    ) -> Result<Category, CategoryError> {
        let (input, slug) = input.validate()?;
        let parent = match input.parent_id {
            Some(parent_id) => Some(
                self.categories
                    .get(parent_id)
                    .await?
                    .ok_or(CategoryError::ParentNotFound)?,
            ),
            None => None,
        };
        let (level, path) = placement(parent.as_ref(), &slug)?;

        let category = self
            .categories
            .create(NewCategory {
                input: &input,
                slug: &slug,
                level,
                path: &path,
                created_by,
            })
            .await?;
        Ok(category)
    }

    /// Update a category's own fields; `parent_id` in the input is ignored.
    ///
    /// # Errors
    ///
    /// Returns `CategoryError::NotFound` or `CategoryError::Conflict`.
    pub async fn update(
        &self,
        id: CategoryId,
        input: CategoryInput,
        updated_by: Option<UserId>,
    ) -> Result<Category, CategoryError> {
        let (input, slug) = input.validate()?;
        Ok(self.categories.update(id, &input, &slug, updated_by).await?)
    }

    /// Delete a category that has no subcategories.
    ///
    /// # Errors
    ///
    /// Returns `CategoryError::HasSubcategories` or `CategoryError::NotFound`.
    pub async fn delete(&self, id: CategoryId) -> Result<(), CategoryError> {
        if self.categories.has_children(id).await? {
            return Err(CategoryError::HasSubcategories);
        }
        Ok(self.categories.delete(id).await?)
    }
}
