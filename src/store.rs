//! Category-keyed aggregation of item records
//!
//! The store is owned by a single collector during a sweep, so it needs no
//! interior locking. It serializes directly as the products document: an
//! object mapping each category name to an array of item objects.

use crate::crawler::ItemRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mapping from category name to the records extracted under it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregationStore {
    categories: BTreeMap<String, Vec<ItemRecord>>,
}

impl AggregationStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensures a category key exists, even if it never receives a record
    pub fn register_category(&mut self, name: &str) {
        self.categories.entry(name.to_string()).or_default();
    }

    /// Appends a record under a category, creating the key if needed
    pub fn insert(&mut self, category: &str, record: ItemRecord) {
        self.categories
            .entry(category.to_string())
            .or_default()
            .push(record);
    }

    /// Returns the records of a category in insertion order
    pub fn get(&self, category: &str) -> Option<&[ItemRecord]> {
        self.categories.get(category).map(Vec::as_slice)
    }

    /// Iterates category names in sorted order
    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    /// Iterates categories with their records
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ItemRecord])> {
        self.categories
            .iter()
            .map(|(name, records)| (name.as_str(), records.as_slice()))
    }

    /// Number of category keys
    pub fn category_count(&self) -> usize {
        self.categories.len()
    }

    /// Total number of records across all categories
    pub fn item_count(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.item_count() == 0
    }

    /// Returns a copy with every category's records sorted
    ///
    /// Two stores holding the same multiset of records per category have
    /// equal canonical forms regardless of insertion order.
    pub fn canonical(&self) -> Self {
        let mut canonical = self.clone();
        for records in canonical.categories.values_mut() {
            records.sort();
        }
        canonical
    }

    /// Compares two stores as multisets of records per category
    pub fn same_contents(&self, other: &Self) -> bool {
        self.canonical() == other.canonical()
    }
}
