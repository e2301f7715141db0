//! Cookie categories and legal bases

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CookieCategory {
    /// Required for the site to work; always permitted
    Essential,
    /// Preferences such as language, theme and form drafts
    Functional,
    Analytics,
    Marketing,
}

impl CookieCategory {
    pub const ALL: [CookieCategory; 4] = [
        CookieCategory::Essential,
        CookieCategory::Functional,
        CookieCategory::Analytics,
        CookieCategory::Marketing,
    ];

    /// Whether consent for this category can be withheld or withdrawn
    pub fn is_revocable(&self) -> bool {
        !matches!(self, CookieCategory::Essential)
    }

    /// Legal basis a cookie of this category is declared under by default
    pub fn default_basis(&self) -> GdprBasis {
        match self {
            CookieCategory::Essential => GdprBasis::Necessary,
            CookieCategory::Functional => GdprBasis::Consent,
            CookieCategory::Analytics => GdprBasis::Consent,
            CookieCategory::Marketing => GdprBasis::Consent,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CookieCategory::Essential => "essential",
            CookieCategory::Functional => "functional",
            CookieCategory::Analytics => "analytics",
            CookieCategory::Marketing => "marketing",
        }
    }
}

impl std::fmt::Display for CookieCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CookieCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "essential" => Ok(CookieCategory::Essential),
            "functional" => Ok(CookieCategory::Functional),
            "analytics" => Ok(CookieCategory::Analytics),
            "marketing" => Ok(CookieCategory::Marketing),
            _ => Err(format!("Unknown cookie category: {}", s)),
        }
    }
}

/// Declared legal justification for a cookie. Documentation only; the
/// consent gate is driven by the category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GdprBasis {
    Consent,
    LegitimateInterest,
    Necessary,
}
