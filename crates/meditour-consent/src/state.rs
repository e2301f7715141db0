//! Consent state
//!
//! Wire format of the durable consent cookie:
//! ```text
//! {"essential":true,"functional":false,"analytics":false,"marketing":false,
//!  "timestamp":"<ISO-8601>","version":"1.0.0"}
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::category::CookieCategory;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentState {
    /// Always true; forced on every construction and decode
    #[serde(default = "always")]
    pub essential: bool,
    #[serde(default)]
    pub functional: bool,
    #[serde(default)]
    pub analytics: bool,
    #[serde(default)]
    pub marketing: bool,
    /// Time of the last change
    pub timestamp: DateTime<Utc>,
    /// Policy version the visitor consented under
    #[serde(default)]
    pub version: String,
    /// True only for a state nobody has chosen or restored. Not persisted.
    #[serde(skip)]
    pub is_default: bool,
}

fn always() -> bool {
    true
}

impl ConsentState {
    /// First-visit state: only essential cookies permitted
    pub fn default_for(policy_version: &str) -> Self {
        Self {
            essential: true,
            functional: false,
            analytics: false,
            marketing: false,
            timestamp: Utc::now(),
            version: policy_version.to_string(),
            is_default: true,
        }
    }

    pub fn allows(&self, category: CookieCategory) -> bool {
        match category {
            CookieCategory::Essential => true,
            CookieCategory::Functional => self.functional,
            CookieCategory::Analytics => self.analytics,
            CookieCategory::Marketing => self.marketing,
        }
    }

    /// Whether any optional category is granted
    pub fn any_optional(&self) -> bool {
        self.functional || self.analytics || self.marketing
    }

    /// Merge an update, stamping time and policy version
    pub fn apply(&mut self, update: &ConsentUpdate, policy_version: &str) {
        if let Some(functional) = update.functional {
            self.functional = functional;
        }
        if let Some(analytics) = update.analytics {
            self.analytics = analytics;
        }
        if let Some(marketing) = update.marketing {
            self.marketing = marketing;
        }

        self.essential = true;
        self.timestamp = Utc::now();
        self.version = policy_version.to_string();
        self.is_default = false;
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a persisted state. Anything restored counts as a visitor choice.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut state: ConsentState = serde_json::from_str(json)?;
        state.essential = true;
        state.is_default = false;
        Ok(state)
    }
}

/// Partial consent change; `None` leaves a category as it is
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsentUpdate {
    pub functional: Option<bool>,
    pub analytics: Option<bool>,
    pub marketing: Option<bool>,
}

impl ConsentUpdate {
    /// Same decision for every optional category
    pub fn all(granted: bool) -> Self {
        Self {
            functional: Some(granted),
            analytics: Some(granted),
            marketing: Some(granted),
        }
    }

    pub fn functional(mut self, granted: bool) -> Self {
        self.functional = Some(granted);
        self
    }

    pub fn analytics(mut self, granted: bool) -> Self {
        self.analytics = Some(granted);
        self
    }

    pub fn marketing(mut self, granted: bool) -> Self {
        self.marketing = Some(granted);
        self
    }

    /// Set one category. Essential is not revocable and is ignored.
    pub fn category(self, category: CookieCategory, granted: bool) -> Self {
        match category {
            CookieCategory::Essential => self,
            CookieCategory::Functional => self.functional(granted),
            CookieCategory::Analytics => self.analytics(granted),
            CookieCategory::Marketing => self.marketing(granted),
        }
    }
}
