//! Introspection metadata describing declared extensions.
//!
//! Entries describe the configuration itself for debugging tools; nothing at
//! request time reads them.

use crate::config::action::Discriminator;
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Metadata for one declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Introspectable {
    pub id: Uuid,
    pub category: String,
    pub discriminator: Discriminator,
    pub title: String,
    pub type_name: String,
    pub fields: BTreeMap<String, String>,
}

impl Introspectable {
    pub fn new(
        category: impl Into<String>,
        discriminator: Discriminator,
        title: impl Into<String>,
        type_name: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            category: category.into(),
            discriminator,
            title: title.into(),
            type_name: type_name.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Sets one free-text field.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }
}

/// Committed introspectables grouped by category.
///
/// A later entry with the same category and discriminator replaces the
/// earlier one.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Introspector {
    categories: BTreeMap<String, Vec<Introspectable>>,
}

impl Introspector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, introspectable: Introspectable) {
        let entries = self
            .categories
            .entry(introspectable.category.clone())
            .or_default();
        match entries
            .iter_mut()
            .find(|entry| entry.discriminator == introspectable.discriminator)
        {
            Some(existing) => *existing = introspectable,
            None => entries.push(introspectable),
        }
    }

    pub fn get(&self, category: &str, discriminator: &Discriminator) -> Option<&Introspectable> {
        self.categories
            .get(category)?
            .iter()
            .find(|entry| &entry.discriminator == discriminator)
    }

    /// Returns one category in declaration order.
    pub fn category(&self, category: &str) -> &[Introspectable] {
        self.categories
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn categories(&self) -> Vec<&str> {
        self.categories.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
