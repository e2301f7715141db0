//! Meditour Cookie Manager
//!
//! Every write of a registered, non-essential cookie passes the consent gate.
//! The namespaces wrap the manager with one typed schema per named cookie.

mod error;
mod info;
mod manager;
pub mod namespaces;
mod options;
mod tracking;

pub use error::CookieError;
pub use info::StoredCookieInfo;
pub use manager::CookieManager;
pub use namespaces::{
    AccessibilityCookies, AccessibilityPreferences, AnalyticsCookies, ContactFormDraft,
    FormCookies, LanguageCookies, Locale, MarketingCookies, PageView, TextSize, Theme,
    ThemeCookies, UtmAttribution,
};
pub use options::CookieOptions;
pub use tracking::{is_tracking_param, strip_tracking_params};

pub use meditour_storage::SameSite;

pub type Result<T> = std::result::Result<T, CookieError>;
