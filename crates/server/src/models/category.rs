//! Category models and tree construction.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use real_taste_core::{CategoryId, Slug, UserId};

use super::{ValidationError, check_max_len, require_text};

pub const MAX_NAME_LENGTH: usize = 50;
pub const MAX_DESCRIPTION_LENGTH: usize = 500;
/// Deepest allowed nesting; roots are level 1.
pub const MAX_LEVEL: i16 = 5;

/// A menu category.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: Slug,
    pub description: String,
    pub image: Option<String>,
    pub is_active: bool,
    pub parent_id: Option<CategoryId>,
    pub level: i16,
    /// Ancestor slugs followed by this category's own slug.
    pub path: Vec<String>,
    pub created_by: Option<UserId>,
    pub updated_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Admin create/update payload.
///
/// `parent_id` is only honored on create.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub parent_id: Option<CategoryId>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

const fn default_active() -> bool {
    true
}

impl CategoryInput {
    /// Validate the payload and derive the slug from the name.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for a blank or over-long name, an over-long
    /// description, or a name with no sluggable characters.
    pub fn validate(mut self) -> Result<(Self, Slug), ValidationError> {
        self.name = require_text(&self.name, "Category name", MAX_NAME_LENGTH)?;
        self.description = self.description.trim().to_owned();
        check_max_len(&self.description, "Description", MAX_DESCRIPTION_LENGTH)?;
        self.image = self
            .image
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty());
        let slug = Slug::from_name(&self.name)
            .map_err(|_| ValidationError::new("Category name must contain letters or digits"))?;
        Ok((self, slug))
    }
}

/// Level and path for a new category placed under `parent`.
///
/// # Errors
///
/// Returns `ValidationError` when the parent is already at the maximum depth.
pub fn placement(parent: Option<&Category>, slug: &Slug) -> Result<(i16, Vec<String>), ValidationError> {
    match parent {
        None => Ok((1, vec![slug.as_str().to_owned()])),
        Some(parent) if parent.level >= MAX_LEVEL => Err(ValidationError::new(format!(
            "Categories cannot be nested more than {MAX_LEVEL} levels deep"
        ))),
        Some(parent) => {
            let mut path = parent.path.clone();
            path.push(slug.as_str().to_owned());
            Ok((parent.level + 1, path))
        }
    }
}

/// A node of the nested category tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryNode {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub level: i16,
    pub children: Vec<Self>,
}

/// Build the category forest from a flat list.
///
/// Roots are categories without a parent, or whose parent is not in the
/// list. Siblings are ordered by name. A category reachable twice (a corrupt
/// cycle) is emitted only once.
#[must_use]
pub fn build_category_tree(categories: &[Category]) -> Vec<CategoryNode> {
    let ids: HashSet<CategoryId> = categories.iter().map(|c| c.id).collect();
    let mut children: HashMap<CategoryId, Vec<&Category>> = HashMap::new();
    let mut roots: Vec<&Category> = Vec::new();

    for category in categories {
        match category.parent_id {
            Some(parent) if ids.contains(&parent) && parent != category.id => {
                children.entry(parent).or_default().push(category);
            }
            _ => roots.push(category),
        }
    }

    for siblings in children.values_mut() {
        sort_by_name(siblings);
    }
    sort_by_name(&mut roots);

    let mut seen = HashSet::new();
    roots
        .into_iter()
        .filter_map(|root| build_node(root, &children, &mut seen))
        .collect()
}

fn sort_by_name(categories: &mut [&Category]) {
    categories.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
}

fn build_node(
    category: &Category,
    children: &HashMap<CategoryId, Vec<&Category>>,
    seen: &mut HashSet<CategoryId>,
) -> Option<CategoryNode> {
    if !seen.insert(category.id) {
        return None;
    }
    let kids = children
        .get(&category.id)
        .map(|list| {
            list.iter()
                .filter_map(|child| build_node(child, children, seen))
                .collect()
        })
        .unwrap_or_default();
    Some(CategoryNode {
        id: category.id,
        name: category.name.clone(),
        slug: category.slug.as_str().to_owned(),
        level: category.level,
        children: kids,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn category(id: i32, name: &str, parent: Option<i32>, level: i16) -> Category {
        let slug = Slug::from_name(name).unwrap();
        Category {
            id: CategoryId::new(id),
            name: name.to_string(),
            path: vec![slug.as_str().to_string()],
            slug,
            description: String::new(),
            image: None,
            is_active: true,
            parent_id: parent.map(CategoryId::new),
            level,
            created_by: None,
            updated_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_tree_nests_children_sorted_by_name() {
        let flat = vec![
            category(1, "Drinks", None, 1),
            category(2, "Snacks", None, 1),
            category(3, "Lassi", Some(1), 2),
            category(4, "Chai", Some(1), 2),
        ];
        let tree = build_category_tree(&flat);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].name, "Drinks");
        let names: Vec<_> = tree[0].children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Chai", "Lassi"]);
        assert!(tree[1].children.is_empty());
    }

    #[test]
    fn test_orphan_becomes_root() {
        let flat = vec![category(7, "Rolls", Some(99), 2)];
        let tree = build_category_tree(&flat);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].id, CategoryId::new(7));
    }

    #[test]
    fn test_empty_input() {
        assert!(build_category_tree(&[]).is_empty());
    }

    #[test]
    fn test_cycle_does_not_loop() {
        let flat = vec![
            category(1, "A", None, 1),
            category(2, "B", Some(3), 2),
            category(3, "C", Some(2), 3),
        ];
        let tree = build_category_tree(&flat);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_placement_root_and_child() {
        let slug = Slug::from_name("Cold Coffee").unwrap();
        assert_eq!(placement(None, &slug).unwrap(), (1, vec!["cold-coffee".to_string()]));

        let mut parent = category(1, "Drinks", None, 1);
        parent.path = vec!["drinks".to_string()];
        let (level, path) = placement(Some(&parent), &slug).unwrap();
        assert_eq!(level, 2);
        assert_eq!(path, ["drinks", "cold-coffee"]);
    }

    #[test]
    fn test_placement_rejects_too_deep() {
        let slug = Slug::from_name("Deep").unwrap();
        let parent = category(1, "Level Five", None, MAX_LEVEL);
        assert!(placement(Some(&parent), &slug).is_err());
    }

    #[test]
    fn test_input_derives_slug() {
        let input = CategoryInput {
            name: " Hot Beverages ".to_string(),
            description: String::new(),
            image: Some("  ".to_string()),
            parent_id: None,
            is_active: true,
        };
        let (input, slug) = input.validate().unwrap();
        assert_eq!(input.name, "Hot Beverages");
        assert_eq!(slug.as_str(), "hot-beverages");
        assert!(input.image.is_none());
    }
}
