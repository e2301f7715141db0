//! Typed cookie namespaces
//!
//! Each namespace owns a fixed set of cookie names with their category,
//! purpose and lifetime, and gives each one an explicit schema. Values that
//! fail to decode read as absent.

mod accessibility;
mod analytics;
mod form;
mod language;
mod marketing;
mod theme;

pub use accessibility::{AccessibilityCookies, AccessibilityPreferences, TextSize};
pub use analytics::{AnalyticsCookies, PageView};
pub use form::{ContactFormDraft, FormCookies};
pub use language::{LanguageCookies, Locale};
pub use marketing::{MarketingCookies, UtmAttribution};
pub use theme::{Theme, ThemeCookies};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::manager::CookieManager;
use crate::Result;

fn encode<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

fn decode<T: DeserializeOwned>(raw: &str) -> Result<T> {
    Ok(serde_json::from_str(raw)?)
}

/// Read a JSON cookie; undecodable values are logged and treated as absent
fn read_json<T: DeserializeOwned>(manager: &CookieManager, name: &str) -> Option<T> {
    let raw = manager.get(name)?;
    match decode(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(cookie = %name, error = %e, "Discarding undecodable cookie value");
            None
        }
    }
}

fn encode_or_log<T: Serialize>(name: &str, value: &T) -> Option<String> {
    match encode(value) {
        Ok(json) => Some(json),
        Err(e) => {
            tracing::warn!(cookie = %name, error = %e, "Failed to encode cookie value");
            None
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use meditour_consent::{ConsentSettings, ConsentStore, CookieRegistry};
    use meditour_storage::{MemoryCookieJar, MemoryLocalStore};

    use crate::manager::CookieManager;

    /// Manager over in-memory storage with the default catalog and no consent
    pub fn manager() -> CookieManager {
        let jar = Arc::new(MemoryCookieJar::new());
        let consent = Arc::new(ConsentStore::load(
            jar.clone(),
            Arc::new(MemoryLocalStore::new()),
            ConsentSettings::default(),
        ));
        CookieManager::new(
            jar,
            Arc::new(CookieRegistry::with_default_catalog()),
            consent,
        )
    }
}
