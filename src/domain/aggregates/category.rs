//! Category Aggregate
//!
//! Products reference a category by its name, so a rename has to be
//! cascaded to every product carrying the old name.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct CategoryDraft {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Categories seeded into a fresh store.
pub const DEFAULT_CATEGORIES: [(&str, &str); 7] = [
    ("Fruits & Vegetables", "Fresh farm produce"),
    ("Dairy & Bakery", "Milk, bread, eggs and more"),
    ("Atta, Rice & Dal", "Daily essentials and grains"),
    ("Snacks & Munchies", "Chips, biscuits and tea-time snacks"),
    ("Cleaning & Household", "Detergents and cleaning supplies"),
    ("Beauty & Grooming", "Personal care products"),
    ("Beverages", "Cold drinks, juices and energy drinks"),
];

impl Category {
    pub fn create(draft: CategoryDraft) -> Self {
        Self { id: Uuid::now_v7(), name: draft.name.trim().to_string(), description: draft.description, created_at: Utc::now() }
    }

    pub fn defaults() -> Vec<Self> {
        DEFAULT_CATEGORIES.iter()
            .map(|(name, description)| Self::create(CategoryDraft { name: (*name).into(), description: (*description).into() }))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_unique() {
        let defaults = Category::defaults();
        let mut names: Vec<_> = defaults.iter().map(|c| c.name.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), DEFAULT_CATEGORIES.len());
    }

    #[test]
    fn test_create_trims_name() {
        let c = Category::create(CategoryDraft { name: " Beverages ".into(), description: String::new() });
        assert_eq!(c.name, "Beverages");
    }
}
