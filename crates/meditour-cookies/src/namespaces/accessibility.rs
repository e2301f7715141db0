//! Accessibility preferences

use serde::{Deserialize, Serialize};

use super::{encode_or_log, read_json};
use crate::manager::CookieManager;
use crate::options::CookieOptions;

pub const ACCESSIBILITY_COOKIE: &str = "accessibility-preferences";
const PURPOSE: &str = "Remembers text size, contrast and motion settings";
const LIFETIME_DAYS: i64 = 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextSize {
    #[default]
    Normal,
    Large,
    ExtraLarge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccessibilityPreferences {
    pub text_size: TextSize,
    pub high_contrast: bool,
    pub reduced_motion: bool,
}

pub struct AccessibilityCookies {
    manager: CookieManager,
}

impl AccessibilityCookies {
    pub fn new(manager: CookieManager) -> Self {
        Self { manager }
    }

    pub fn save_preferences(&self, preferences: &AccessibilityPreferences) -> bool {
        let Some(json) = encode_or_log(ACCESSIBILITY_COOKIE, preferences) else {
            return false;
        };

        self.manager.set_functional(
            ACCESSIBILITY_COOKIE,
            &json,
            PURPOSE,
            &CookieOptions::days(LIFETIME_DAYS),
        )
    }

    pub fn get_preferences(&self) -> Option<AccessibilityPreferences> {
        read_json(&self.manager, ACCESSIBILITY_COOKIE)
    }

    pub fn clear_preferences(&self) -> bool {
        self.manager
            .remove(ACCESSIBILITY_COOKIE, &CookieOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespaces::test_support;

    #[test]
    fn test_preferences_roundtrip() {
        let manager = test_support::manager();
        manager.consent().accept_all();
        let accessibility = AccessibilityCookies::new(manager);

        let preferences = AccessibilityPreferences {
            text_size: TextSize::ExtraLarge,
            high_contrast: true,
            reduced_motion: false,
        };
        assert!(accessibility.save_preferences(&preferences));
        assert_eq!(accessibility.get_preferences(), Some(preferences));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let preferences: AccessibilityPreferences =
            serde_json::from_str(r#"{"highContrast":true}"#).unwrap();
        assert_eq!(preferences.text_size, TextSize::Normal);
        assert!(preferences.high_contrast);

        assert_eq!(
            serde_json::to_string(&TextSize::ExtraLarge).unwrap(),
            "\"extraLarge\""
        );
    }
}
