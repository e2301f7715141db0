//! Cookie definition registry
//!
//! Maps cookie name to its definition. Lookups drive the consent gate, so the
//! registry is populated from the catalog before any gated write.

use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

use crate::category::CookieCategory;
use crate::definition::{default_catalog, CookieDefinition};

pub struct CookieRegistry {
    definitions: RwLock<HashMap<String, CookieDefinition>>,
}

impl CookieRegistry {
    pub fn new() -> Self {
        Self {
            definitions: RwLock::new(HashMap::new()),
        }
    }

    /// Registry pre-populated with [`default_catalog`]
    pub fn with_default_catalog() -> Self {
        let registry = Self::new();
        for definition in default_catalog() {
            registry.register(definition);
        }
        registry
    }

    /// Insert or overwrite the definition for `definition.name`
    pub fn register(&self, definition: CookieDefinition) {
        self.definitions
            .write()
            .insert(definition.name.clone(), definition);
    }

    pub fn get_definition(&self, name: &str) -> Option<CookieDefinition> {
        self.definitions.read().get(name).cloned()
    }

    /// Category of a registered cookie
    pub fn category_of(&self, name: &str) -> Option<CookieCategory> {
        self.definitions.read().get(name).map(|d| d.category)
    }

    pub fn get_by_category(&self, category: CookieCategory) -> Vec<CookieDefinition> {
        let mut out: Vec<CookieDefinition> = self
            .definitions
            .read()
            .values()
            .filter(|d| d.category == category)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    /// Count per category; every category is present, even with zero cookies
    pub fn category_summary(&self) -> BTreeMap<CookieCategory, usize> {
        let mut summary: BTreeMap<CookieCategory, usize> =
            CookieCategory::ALL.iter().map(|c| (*c, 0)).collect();

        for definition in self.definitions.read().values() {
            *summary.entry(definition.category).or_insert(0) += 1;
        }

        summary
    }

    pub fn all_definitions(&self) -> Vec<CookieDefinition> {
        let mut out: Vec<CookieDefinition> =
            self.definitions.read().values().cloned().collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    pub fn len(&self) -> usize {
        self.definitions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.read().is_empty()
    }
}

impl Default for CookieRegistry {
    fn default() -> Self {
        Self::new()
    }
}
