//! Preferred site language

use serde::{Deserialize, Serialize};

use crate::manager::CookieManager;
use crate::options::CookieOptions;

pub const LANGUAGE_COOKIE: &str = "preferred-language";
const PURPOSE: &str = "Remembers your preferred site language";
const LIFETIME_DAYS: i64 = 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    En,
    De,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::En, Locale::De];

    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::De => "de",
        }
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" => Ok(Locale::En),
            "de" => Ok(Locale::De),
            _ => Err(format!("Unsupported locale: {}", s)),
        }
    }
}

pub struct LanguageCookies {
    manager: CookieManager,
}

impl LanguageCookies {
    pub fn new(manager: CookieManager) -> Self {
        Self { manager }
    }

    pub fn set_language(&self, locale: Locale) -> bool {
        self.manager.set_functional(
            LANGUAGE_COOKIE,
            locale.as_str(),
            PURPOSE,
            &CookieOptions::days(LIFETIME_DAYS),
        )
    }

    pub fn get_language(&self) -> Option<Locale> {
        let raw = self.manager.get(LANGUAGE_COOKIE)?;
        match raw.parse() {
            Ok(locale) => Some(locale),
            Err(e) => {
                tracing::debug!(cookie = LANGUAGE_COOKIE, error = %e, "Ignoring stored language");
                None
            }
        }
    }

    pub fn clear_language(&self) -> bool {
        self.manager
            .remove(LANGUAGE_COOKIE, &CookieOptions::default())
    }
}
