//! Engine configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use meditour_consent::ConsentSettings;

use crate::error::CoreError;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// SQLite file for durable cookies and the local backup; in-memory when unset
    pub database_path: Option<PathBuf>,
    /// Current consent policy version
    pub policy_version: String,
    pub consent_cookie_name: String,
    pub consent_backup_key: String,
    pub consent_max_age_days: i64,
}

impl Config {
    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: Some(database_path.into()),
            ..Self::default()
        }
    }

    /// Load from a JSON file; missing fields keep their defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.consent_cookie_name.is_empty()
            || self.consent_cookie_name.contains(|c: char| c.is_whitespace() || c == ';' || c == '=')
        {
            return Err(CoreError::Config(format!(
                "Invalid consent cookie name: {:?}",
                self.consent_cookie_name
            )));
        }
        if self.consent_backup_key.is_empty() {
            return Err(CoreError::Config("Consent backup key is empty".to_string()));
        }
        if self.policy_version.is_empty() {
            return Err(CoreError::Config("Policy version is empty".to_string()));
        }
        if self.consent_max_age_days <= 0 {
            return Err(CoreError::Config(format!(
                "Consent max age must be positive, got {} days",
                self.consent_max_age_days
            )));
        }
        Ok(())
    }

    pub fn consent_settings(&self) -> ConsentSettings {
        ConsentSettings {
            cookie_name: self.consent_cookie_name.clone(),
            backup_key: self.consent_backup_key.clone(),
            policy_version: self.policy_version.clone(),
            max_age_days: self.consent_max_age_days,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let consent = ConsentSettings::default();
        Self {
            database_path: None,
            policy_version: consent.policy_version,
            consent_cookie_name: consent.cookie_name,
            consent_backup_key: consent.backup_key,
            consent_max_age_days: consent.max_age_days,
        }
    }
}
