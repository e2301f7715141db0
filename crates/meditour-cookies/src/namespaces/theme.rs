//! Colour theme preference

use serde::{Deserialize, Serialize};

use crate::manager::CookieManager;
use crate::options::CookieOptions;

pub const THEME_COOKIE: &str = "theme-preference";
const PURPOSE: &str = "Remembers your light or dark theme choice";
const LIFETIME_DAYS: i64 = 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    /// Follow the operating system
    #[default]
    System,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "system",
        }
    }
}

impl std::str::FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "system" => Ok(Theme::System),
            _ => Err(format!("Unknown theme: {}", s)),
        }
    }
}

pub struct ThemeCookies {
    manager: CookieManager,
}

impl ThemeCookies {
    pub fn new(manager: CookieManager) -> Self {
        Self { manager }
    }

    pub fn set_theme(&self, theme: Theme) -> bool {
        self.manager.set_functional(
            THEME_COOKIE,
            theme.as_str(),
            PURPOSE,
            &CookieOptions::days(LIFETIME_DAYS),
        )
    }

    pub fn get_theme(&self) -> Option<Theme> {
        self.manager
            .get(THEME_COOKIE)
            .and_then(|raw| raw.parse().ok())
    }

    pub fn clear_theme(&self) -> bool {
        self.manager.remove(THEME_COOKIE, &CookieOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespaces::test_support;

    #[test]
    fn test_theme_roundtrip() {
        let manager = test_support::manager();
        let theme = ThemeCookies::new(manager.clone());
        assert!(!theme.set_theme(Theme::Dark));

        manager.consent().accept_all();
        assert!(theme.set_theme(Theme::Dark));
        assert_eq!(theme.get_theme(), Some(Theme::Dark));

        theme.clear_theme();
        assert_eq!(theme.get_theme(), None);
        assert_eq!(theme.get_theme().unwrap_or_default(), Theme::System);
    }
}
