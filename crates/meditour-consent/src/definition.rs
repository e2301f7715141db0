//! Cookie definitions and the site's fixed catalog

use serde::{Deserialize, Serialize};

use crate::category::{CookieCategory, GdprBasis};

/// Default name of the durable consent cookie
pub const CONSENT_COOKIE: &str = "cookie-consent";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieDefinition {
    pub name: String,
    pub category: CookieCategory,
    /// Human-readable purpose shown in the cookie policy
    pub purpose: String,
    /// Human-readable lifetime, e.g. "1 year"
    pub duration: String,
    pub third_party: bool,
    pub gdpr_basis: GdprBasis,
}

impl CookieDefinition {
    /// First-party definition with the category's default legal basis
    pub fn new(
        name: impl Into<String>,
        category: CookieCategory,
        purpose: impl Into<String>,
        duration: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            category,
            purpose: purpose.into(),
            duration: duration.into(),
            third_party: false,
            gdpr_basis: category.default_basis(),
        }
    }

    pub fn third_party(mut self) -> Self {
        self.third_party = true;
        self
    }

    pub fn with_basis(mut self, basis: GdprBasis) -> Self {
        self.gdpr_basis = basis;
        self
    }
}

/// Every cookie the site declares, registered at startup
pub fn default_catalog() -> Vec<CookieDefinition> {
    use CookieCategory::*;

    vec![
        // Essential
        CookieDefinition::new(
            CONSENT_COOKIE,
            Essential,
            "Stores your cookie consent preferences",
            "1 year",
        ),
        CookieDefinition::new(
            "NEXT_LOCALE",
            Essential,
            "Keeps the site in the language selected by locale routing",
            "Session",
        ),
        CookieDefinition::new(
            "csrf-token",
            Essential,
            "Protects the contact form against cross-site request forgery",
            "Session",
        ),
        CookieDefinition::new(
            "session-id",
            Essential,
            "Links contact form submissions to your visit",
            "24 hours",
        ),
        // Functional
        CookieDefinition::new(
            "preferred-language",
            Functional,
            "Remembers your preferred site language",
            "1 year",
        ),
        CookieDefinition::new(
            "theme-preference",
            Functional,
            "Remembers your light or dark theme choice",
            "1 year",
        ),
        CookieDefinition::new(
            "contact-form-draft",
            Functional,
            "Keeps an unsent contact form so you do not lose your message",
            "7 days",
        ),
        CookieDefinition::new(
            "accessibility-preferences",
            Functional,
            "Remembers text size, contrast and motion settings",
            "1 year",
        ),
        // Analytics
        CookieDefinition::new(
            "visitor-id",
            Analytics,
            "Distinguishes returning visitors in aggregate statistics",
            "2 years",
        ),
        CookieDefinition::new(
            "analytics-session",
            Analytics,
            "Groups page views into a single visit",
            "30 minutes",
        ),
        CookieDefinition::new(
            "page-views",
            Analytics,
            "Records the most recent pages viewed during your visits",
            "30 days",
        ),
        CookieDefinition::new(
            "_ga",
            Analytics,
            "Google Analytics visitor identifier",
            "2 years",
        )
        .third_party(),
        CookieDefinition::new(
            "_gid",
            Analytics,
            "Google Analytics daily visitor identifier",
            "24 hours",
        )
        .third_party(),
        // Marketing
        CookieDefinition::new(
            "utm-attribution",
            Marketing,
            "Records which campaign brought you to the site",
            "90 days",
        ),
        CookieDefinition::new(
            "ad-click-id",
            Marketing,
            "Stores the advertising click identifier for conversion reporting",
            "90 days",
        ),
        CookieDefinition::new(
            "_fbp",
            Marketing,
            "Meta Pixel browser identifier for ad delivery",
            "90 days",
        )
        .third_party(),
    ]
}
