//! Cookie engine
//!
//! Owns the registry, the consent store and the cookie manager for one site.

use std::sync::Arc;

use meditour_consent::{
    ConsentState, ConsentStore, ConsentUpdate, CookieCategory, CookieDefinition, CookieRegistry,
};
use meditour_cookies::{
    AccessibilityCookies, AnalyticsCookies, CookieManager, CookieOptions, FormCookies,
    LanguageCookies, MarketingCookies, ThemeCookies,
};
use meditour_storage::{CookieJar, Database, LocalStore};

use crate::config::Config;
use crate::Result;

const CONSENT_PURPOSE: &str = "Stores your cookie consent preferences";

pub struct CookieEngine {
    config: Config,
    registry: Arc<CookieRegistry>,
    consent: Arc<ConsentStore>,
    manager: CookieManager,
}

impl CookieEngine {
    /// Open the engine over SQLite storage, or in memory when no database
    /// path is configured
    pub fn new(config: Config) -> Result<Self> {
        let db = match &config.database_path {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                Database::open(path)?
            }
            None => Database::open_in_memory()?,
        };

        let db = Arc::new(db);
        Self::with_storage(config, db.clone(), db)
    }

    pub fn with_storage(
        config: Config,
        jar: Arc<dyn CookieJar>,
        backup: Arc<dyn LocalStore>,
    ) -> Result<Self> {
        config.validate()?;

        let registry = Arc::new(CookieRegistry::with_default_catalog());
        registry.register(CookieDefinition::new(
            config.consent_cookie_name.as_str(),
            CookieCategory::Essential,
            CONSENT_PURPOSE,
            CookieOptions::days(config.consent_max_age_days).lifetime_label(),
        ));

        let consent = Arc::new(ConsentStore::load(
            jar.clone(),
            backup,
            config.consent_settings(),
        ));
        let manager = CookieManager::new(jar, registry.clone(), consent.clone());

        let engine = Self {
            config,
            registry,
            consent,
            manager,
        };

        // Cookies left over from a previous, broader consent
        engine.reconcile();

        tracing::info!(
            policy_version = %engine.config.policy_version,
            has_given_consent = engine.consent.has_given_consent(),
            "Cookie engine initialized"
        );

        Ok(engine)
    }

    fn reconcile(&self) -> usize {
        self.manager.validate_consent()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &Arc<CookieRegistry> {
        &self.registry
    }

    /// The underlying store, for reads and listeners. Change consent through
    /// the engine's own methods: calling `set_consent` and friends here skips
    /// the reconciliation pass, so call `cookies().validate_consent()` after.
    pub fn consent(&self) -> &Arc<ConsentStore> {
        &self.consent
    }

    pub fn cookies(&self) -> &CookieManager {
        &self.manager
    }

    pub fn consent_state(&self) -> ConsentState {
        self.consent.consent_state()
    }

    // Consent changes; each returns the number of cookies removed afterwards

    pub fn update_consent(&self, update: ConsentUpdate) -> usize {
        self.consent.set_consent(update);
        self.reconcile()
    }

    pub fn accept_all(&self) -> usize {
        self.consent.accept_all();
        self.reconcile()
    }

    pub fn accept_essential_only(&self) -> usize {
        self.consent.accept_essential_only();
        self.reconcile()
    }

    pub fn withdraw_consent(&self) -> usize {
        self.consent.withdraw_consent();
        self.reconcile()
    }

    pub fn reset_consent(&self) -> usize {
        self.consent.reset_consent();
        self.reconcile()
    }

    // Namespaces

    pub fn language(&self) -> LanguageCookies {
        LanguageCookies::new(self.manager.clone())
    }

    pub fn theme(&self) -> ThemeCookies {
        ThemeCookies::new(self.manager.clone())
    }

    pub fn forms(&self) -> FormCookies {
        FormCookies::new(self.manager.clone())
    }

    pub fn analytics(&self) -> AnalyticsCookies {
        AnalyticsCookies::new(self.manager.clone())
    }

    pub fn marketing(&self) -> MarketingCookies {
        MarketingCookies::new(self.manager.clone())
    }

    pub fn accessibility(&self) -> AccessibilityCookies {
        AccessibilityCookies::new(self.manager.clone())
    }
}
