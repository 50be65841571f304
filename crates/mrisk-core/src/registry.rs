//! Risk category registry.
//!
//! The registry is the read-only, ordered list of risk categories seeded from reference data.
//! Categories are addressed by a stable [`CategoryKey`] resolved once at load time; display names
//! are for people and never drive control flow.

use crate::{RiskError, RiskResult};
use mrisk_types::{CategoryId, NonEmptyText};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Stable identifier of a risk category, independent of its display name and database id.
///
/// Variants are declared in severity order, so `Ord` ranks them: the three severity bands
/// first, then the sticky abortion category above all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CategoryKey {
    #[serde(rename = "normal")]
    Normal,
    #[serde(rename = "medio")]
    Medium,
    #[serde(rename = "alto")]
    High,
    #[serde(rename = "aborto")]
    Abortion,
}

impl CategoryKey {
    /// Every key, in severity order.
    pub const ALL: [CategoryKey; 4] = [
        CategoryKey::Normal,
        CategoryKey::Medium,
        CategoryKey::High,
        CategoryKey::Abortion,
    ];

    /// The sticky category survives later readings until the admission is closed.
    pub fn is_sticky(self) -> bool {
        matches!(self, CategoryKey::Abortion)
    }

    /// True for the keys a rule or condition may produce.
    pub fn is_severity_band(self) -> bool {
        !self.is_sticky()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CategoryKey::Normal => "normal",
            CategoryKey::Medium => "medio",
            CategoryKey::High => "alto",
            CategoryKey::Abortion => "aborto",
        }
    }
}

impl fmt::Display for CategoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the risk-category reference table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RiskCategory {
    pub id: CategoryId,
    pub key: CategoryKey,
    pub name: NonEmptyText,
    pub color: String,
    #[serde(default)]
    pub description: String,
}

/// Ordered, validated set of risk categories.
#[derive(Debug, Clone)]
pub struct CategoryRegistry {
    categories: Vec<RiskCategory>,
}

impl CategoryRegistry {
    /// Build a registry from seeded rows.
    ///
    /// # Errors
    ///
    /// Returns [`RiskError::InvalidReference`] if:
    /// - two rows share an id,
    /// - a key is missing or appears more than once (so exactly one sticky category exists).
    pub fn from_categories(mut categories: Vec<RiskCategory>) -> RiskResult<Self> {
        let mut ids = HashSet::new();
        for category in &categories {
            if !ids.insert(category.id) {
                return Err(RiskError::InvalidReference(format!(
                    "duplicate category id {}",
                    category.id
                )));
            }
        }

        for key in CategoryKey::ALL {
            let count = categories.iter().filter(|c| c.key == key).count();
            if count != 1 {
                return Err(RiskError::InvalidReference(format!(
                    "category key '{key}' must appear exactly once, found {count}"
                )));
            }
        }

        categories.sort_by_key(|c| c.key);
        Ok(Self { categories })
    }

    /// Look up a category by id.
    ///
    /// # Errors
    ///
    /// Returns [`RiskError::UnknownCategory`] if the id is not part of the seeded set.
    pub fn lookup(&self, id: CategoryId) -> RiskResult<&RiskCategory> {
        self.categories
            .iter()
            .find(|c| c.id == id)
            .ok_or(RiskError::UnknownCategory(id))
    }

    pub fn contains(&self, id: CategoryId) -> bool {
        self.categories.iter().any(|c| c.id == id)
    }

    /// Id of the category resolved for `key`.
    pub fn id_for(&self, key: CategoryKey) -> CategoryId {
        self.by_key(key).id
    }

    pub fn by_key(&self, key: CategoryKey) -> &RiskCategory {
        // from_categories guarantees one row per key, sorted in key order
        &self.categories[key as usize]
    }

    pub fn sticky_category_id(&self) -> CategoryId {
        self.id_for(CategoryKey::Abortion)
    }

    /// The lowest-severity category, returned when nothing was triggered.
    pub fn default_category_id(&self) -> CategoryId {
        self.id_for(CategoryKey::Normal)
    }

    pub fn ids(&self) -> impl Iterator<Item = CategoryId> + '_ {
        self.categories.iter().map(|c| c.id)
    }

    /// Categories in severity order.
    pub fn iter(&self) -> impl Iterator<Item = &RiskCategory> {
        self.categories.iter()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(id: i64, key: CategoryKey, name: &str) -> RiskCategory {
        RiskCategory {
            id: CategoryId::new(id),
            key,
            name: NonEmptyText::new(name).unwrap(),
            color: "#000000".into(),
            description: String::new(),
        }
    }

    fn seeded_rows() -> Vec<RiskCategory> {
        vec![
            category(4, CategoryKey::Abortion, "Aborto"),
            category(1, CategoryKey::Normal, "Normal"),
            category(3, CategoryKey::High, "Alto"),
            category(2, CategoryKey::Medium, "Médio"),
        ]
    }

    #[test]
    fn test_registry_orders_categories_by_severity() {
        let registry = CategoryRegistry::from_categories(seeded_rows()).unwrap();
        let keys: Vec<_> = registry.iter().map(|c| c.key).collect();
        assert_eq!(keys, CategoryKey::ALL.to_vec());
    }

    #[test]
    fn test_registry_resolves_sticky_and_default_ids() {
        let registry = CategoryRegistry::from_categories(seeded_rows()).unwrap();
        assert_eq!(registry.sticky_category_id(), CategoryId::new(4));
        assert_eq!(registry.default_category_id(), CategoryId::new(1));
        assert_eq!(registry.id_for(CategoryKey::High), CategoryId::new(3));
    }

    #[test]
    fn test_lookup_unknown_id_fails() {
        let registry = CategoryRegistry::from_categories(seeded_rows()).unwrap();
        let err = registry.lookup(CategoryId::new(99)).unwrap_err();
        assert!(matches!(err, RiskError::UnknownCategory(id) if id == CategoryId::new(99)));
        assert!(!registry.contains(CategoryId::new(99)));
    }

    #[test]
    fn test_lookup_does_not_depend_on_display_name() {
        let mut rows = seeded_rows();
        rows[0].name = NonEmptyText::new("Abortamento").unwrap();
        let registry = CategoryRegistry::from_categories(rows).unwrap();
        let sticky = registry.lookup(registry.sticky_category_id()).unwrap();
        assert!(sticky.key.is_sticky());
        assert_eq!(sticky.name.as_str(), "Abortamento");
    }

    #[test]
    fn test_registry_rejects_duplicate_ids() {
        let mut rows = seeded_rows();
        rows[1].id = CategoryId::new(4);
        let err = CategoryRegistry::from_categories(rows).unwrap_err();
        assert!(matches!(err, RiskError::InvalidReference(msg) if msg.contains("duplicate")));
    }

    #[test]
    fn test_registry_requires_exactly_one_sticky_category() {
        let mut rows = seeded_rows();
        rows.retain(|c| c.key != CategoryKey::Abortion);
        let err = CategoryRegistry::from_categories(rows).unwrap_err();
        assert!(matches!(err, RiskError::InvalidReference(msg) if msg.contains("aborto")));

        let mut rows = seeded_rows();
        rows.push(category(5, CategoryKey::Abortion, "Abortamento"));
        let err = CategoryRegistry::from_categories(rows).unwrap_err();
        assert!(matches!(err, RiskError::InvalidReference(msg) if msg.contains("found 2")));
    }

    #[test]
    fn test_category_key_ordering_ranks_sticky_last() {
        assert!(CategoryKey::Normal < CategoryKey::Medium);
        assert!(CategoryKey::Medium < CategoryKey::High);
        assert!(CategoryKey::High < CategoryKey::Abortion);
        assert!(!CategoryKey::Abortion.is_severity_band());
    }
}
