//! Meditour Core
//!
//! Wires storage, the consent store and the cookie manager into one engine.
//! Consent changes made through the engine are always followed by a
//! reconciliation pass, so no cookie outlives the permission it was set under.

mod config;
mod engine;
mod error;

pub use config::Config;
pub use engine::CookieEngine;
pub use error::CoreError;

// Re-export the component crates
pub use meditour_consent::{
    default_catalog, ConsentError, ConsentSettings, ConsentState, ConsentStore, ConsentUpdate,
    CookieCategory, CookieDefinition, CookieRegistry, GdprBasis, ListenerId,
};
pub use meditour_cookies::{
    namespaces, AccessibilityCookies, AccessibilityPreferences, AnalyticsCookies,
    ContactFormDraft, CookieError, CookieManager, CookieOptions, FormCookies, LanguageCookies,
    Locale, MarketingCookies, PageView, SameSite, StoredCookieInfo, TextSize, Theme, ThemeCookies,
    UtmAttribution,
};
pub use meditour_storage::{
    CookieJar, Database, DetachedStorage, LocalStore, MemoryCookieJar, MemoryLocalStore,
    StorageError,
};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
