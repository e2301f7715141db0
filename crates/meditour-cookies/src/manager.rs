//! Cookie Manager
//!
//! Facade over the cookie jar. Writes of registered non-essential cookies are
//! refused unless their category currently has consent; that check is the
//! single enforcement point for the consent policy.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;

use meditour_consent::{ConsentStore, CookieCategory, CookieDefinition, CookieRegistry};
use meditour_storage::{cookie_pairs, decode_value, read_cookie, CookieJar, SetCookie};

use crate::info::StoredCookieInfo;
use crate::options::CookieOptions;
use crate::Result;

pub struct CookieManager {
    jar: Arc<dyn CookieJar>,
    registry: Arc<CookieRegistry>,
    consent: Arc<ConsentStore>,
}

impl CookieManager {
    pub fn new(
        jar: Arc<dyn CookieJar>,
        registry: Arc<CookieRegistry>,
        consent: Arc<ConsentStore>,
    ) -> Self {
        Self {
            jar,
            registry,
            consent,
        }
    }

    fn header(&self) -> Result<String> {
        Ok(self.jar.cookie_header()?)
    }

    fn write(&self, cookie: &SetCookie) -> Result<()> {
        Ok(self.jar.write(&cookie.to_string())?)
    }

    /// Whether a write of `name` would pass the consent gate right now
    pub fn is_permitted(&self, name: &str) -> bool {
        match self.registry.category_of(name) {
            Some(category) => self.consent.has_consent(category),
            None => true,
        }
    }

    /// Write a cookie. Returns false when consent is missing or the jar fails.
    pub fn set(&self, name: &str, value: &str, options: &CookieOptions) -> bool {
        if let Some(category) = self.registry.category_of(name) {
            if !self.consent.has_consent(category) {
                tracing::warn!(
                    cookie = %name,
                    category = %category,
                    "Consent denied, cookie not set"
                );
                return false;
            }
        }

        match self.write(&options.to_set_cookie(name, value)) {
            Ok(()) => {
                tracing::debug!(cookie = %name, "Cookie set");
                true
            }
            Err(e) => {
                tracing::warn!(cookie = %name, error = %e, "Failed to set cookie");
                false
            }
        }
    }

    /// Decoded value of `name`, or `None` if absent or unreadable
    pub fn get(&self, name: &str) -> Option<String> {
        match self.header() {
            Ok(header) => read_cookie(&header, name),
            Err(e) => {
                tracing::warn!(cookie = %name, error = %e, "Failed to read cookies");
                None
            }
        }
    }

    /// Expire `name` at the domain and path given in `options`
    pub fn remove(&self, name: &str, options: &CookieOptions) -> bool {
        match self.write(&options.to_removal(name)) {
            Ok(()) => {
                tracing::debug!(cookie = %name, "Cookie removed");
                true
            }
            Err(e) => {
                tracing::warn!(cookie = %name, error = %e, "Failed to remove cookie");
                false
            }
        }
    }

    pub fn exists(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Every live cookie with its decoded value
    pub fn get_all(&self) -> HashMap<String, String> {
        let header = match self.header() {
            Ok(header) => header,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read cookies");
                return HashMap::new();
            }
        };

        cookie_pairs(&header)
            .filter_map(|(name, raw)| decode_value(raw).map(|value| (name.to_string(), value)))
            .collect()
    }

    /// Delete `name` at every domain and path. Returns how many cookies
    /// were actually removed.
    fn purge(&self, name: &str) -> usize {
        match self.jar.remove_all(name) {
            Ok(removed) => {
                if removed > 0 {
                    tracing::debug!(cookie = %name, removed, "Cookie purged");
                }
                removed
            }
            Err(e) => {
                tracing::warn!(cookie = %name, error = %e, "Failed to purge cookie");
                0
            }
        }
    }

    /// Remove every live cookie regardless of category
    pub fn clear_all(&self) -> usize {
        let removed: usize = self
            .get_all()
            .into_keys()
            .map(|name| self.purge(&name))
            .sum();

        tracing::info!(removed, "Cleared all cookies");
        removed
    }

    /// Remove the live cookies registered under `category`
    pub fn clear_by_category(&self, category: CookieCategory) -> usize {
        let removed: usize = self
            .registry
            .get_by_category(category)
            .iter()
            .map(|definition| self.purge(&definition.name))
            .sum();

        tracing::info!(category = %category, removed, "Cleared cookie category");
        removed
    }

    /// Remove every registered cookie whose category has lost consent, at
    /// any path or domain. Run after each consent change.
    pub fn validate_consent(&self) -> usize {
        let removed: usize = self
            .registry
            .all_definitions()
            .iter()
            .filter(|definition| !self.consent.has_consent(definition.category))
            .map(|definition| self.purge(&definition.name))
            .sum();

        if removed > 0 {
            tracing::info!(removed, "Removed cookies without consent");
        }
        removed
    }

    /// Live registered cookies joined with their definitions, sorted by name
    pub fn stored_cookies(&self) -> Vec<StoredCookieInfo> {
        let now = Utc::now();
        let mut out: Vec<StoredCookieInfo> = self
            .get_all()
            .into_iter()
            .filter_map(|(name, value)| {
                let definition = self.registry.get_definition(&name)?;
                Some(StoredCookieInfo {
                    name,
                    value,
                    category: definition.category,
                    purpose: definition.purpose,
                    created_at: now,
                })
            })
            .collect();

        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    fn set_in_category(
        &self,
        category: CookieCategory,
        name: &str,
        value: &str,
        purpose: &str,
        options: &CookieOptions,
    ) -> bool {
        if let Some(existing) = self.registry.category_of(name) {
            if existing != category {
                tracing::warn!(
                    cookie = %name,
                    registered = %existing,
                    requested = %category,
                    "Refusing to reclassify registered cookie"
                );
                return false;
            }
        }

        self.registry.register(CookieDefinition::new(
            name,
            category,
            purpose,
            options.lifetime_label(),
        ));
        self.set(name, value, options)
    }

    pub fn set_essential(
        &self,
        name: &str,
        value: &str,
        purpose: &str,
        options: &CookieOptions,
    ) -> bool {
        self.set_in_category(CookieCategory::Essential, name, value, purpose, options)
    }

    pub fn set_functional(
        &self,
        name: &str,
        value: &str,
        purpose: &str,
        options: &CookieOptions,
    ) -> bool {
        self.set_in_category(CookieCategory::Functional, name, value, purpose, options)
    }

    pub fn set_analytics(
        &self,
        name: &str,
        value: &str,
        purpose: &str,
        options: &CookieOptions,
    ) -> bool {
        self.set_in_category(CookieCategory::Analytics, name, value, purpose, options)
    }

    pub fn set_marketing(
        &self,
        name: &str,
        value: &str,
        purpose: &str,
        options: &CookieOptions,
    ) -> bool {
        self.set_in_category(CookieCategory::Marketing, name, value, purpose, options)
    }

    pub fn registry(&self) -> &Arc<CookieRegistry> {
        &self.registry
    }

    pub fn consent(&self) -> &Arc<ConsentStore> {
        &self.consent
    }
}

impl Clone for CookieManager {
    fn clone(&self) -> Self {
        Self {
            jar: Arc::clone(&self.jar),
            registry: Arc::clone(&self.registry),
            consent: Arc::clone(&self.consent),
        }
    }
}
