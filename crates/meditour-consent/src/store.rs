//! Consent State Store
//!
//! Owns the one canonical consent state for a running site. The durable
//! cookie is the source of truth across reloads: it is read once at load and
//! rewritten (along with the local backup) on every change. Storage failures
//! are logged and never surface to callers.

use chrono::{Duration, Utc};
use parking_lot::RwLock;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use meditour_storage::{cookie_pairs, decode_value, CookieJar, LocalStore, SameSite, SetCookie};

use crate::category::CookieCategory;
use crate::definition::CONSENT_COOKIE;
use crate::error::ConsentError;
use crate::state::{ConsentState, ConsentUpdate};
use crate::Result;

/// Callback invoked with the new state after every change
pub type ConsentListener = Arc<dyn Fn(&ConsentState) + Send + Sync>;

/// Handle returned by [`ConsentStore::add_listener`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsentSettings {
    /// Name of the durable consent cookie
    pub cookie_name: String,
    /// Key of the mirrored copy in the local backup store
    pub backup_key: String,
    /// Current policy version; stored states with another version need refresh
    pub policy_version: String,
    /// Lifetime of the durable cookie
    pub max_age_days: i64,
}

impl Default for ConsentSettings {
    fn default() -> Self {
        Self {
            cookie_name: CONSENT_COOKIE.to_string(),
            backup_key: format!("{}-backup", CONSENT_COOKIE),
            policy_version: "1.0.0".to_string(),
            max_age_days: 365,
        }
    }
}

pub struct ConsentStore {
    settings: ConsentSettings,
    state: RwLock<ConsentState>,
    /// Notified in registration order
    listeners: RwLock<Vec<(ListenerId, ConsentListener)>>,
    next_listener_id: AtomicU64,
    jar: Arc<dyn CookieJar>,
    backup: Arc<dyn LocalStore>,
}

impl ConsentStore {
    /// Build the store and restore persisted state.
    ///
    /// Order: durable cookie, then local backup (re-persisted to heal the
    /// cookie), then the all-denied default.
    pub fn load(
        jar: Arc<dyn CookieJar>,
        backup: Arc<dyn LocalStore>,
        settings: ConsentSettings,
    ) -> Self {
        let store = Self {
            state: RwLock::new(ConsentState::default_for(&settings.policy_version)),
            settings,
            listeners: RwLock::new(Vec::new()),
            next_listener_id: AtomicU64::new(0),
            jar,
            backup,
        };

        match store.read_cookie() {
            Ok(Some(state)) => {
                tracing::info!(
                    version = %state.version,
                    functional = state.functional,
                    analytics = state.analytics,
                    marketing = state.marketing,
                    "Restored consent state from cookie"
                );
                *store.state.write() = state;
                return store;
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unreadable consent cookie");
            }
        }

        match store.read_backup() {
            Ok(Some(state)) => {
                tracing::info!(
                    version = %state.version,
                    "Restored consent state from backup, re-persisting cookie"
                );
                *store.state.write() = state.clone();
                store.persist(&state);
            }
            Ok(None) => {
                tracing::debug!("No persisted consent state, using defaults");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unreadable consent backup");
            }
        }

        store
    }

    fn read_cookie(&self) -> Result<Option<ConsentState>> {
        let header = self.jar.cookie_header()?;
        let raw = match cookie_pairs(&header).find(|(name, _)| *name == self.settings.cookie_name)
        {
            Some((_, raw)) => raw,
            None => return Ok(None),
        };

        let json = decode_value(raw).ok_or(ConsentError::Encoding)?;
        Ok(Some(ConsentState::from_json(&json)?))
    }

    fn read_backup(&self) -> Result<Option<ConsentState>> {
        match self.backup.get_item(&self.settings.backup_key)? {
            Some(json) => Ok(Some(ConsentState::from_json(&json)?)),
            None => Ok(None),
        }
    }

    /// Write the durable cookie and mirror it to the backup. Best effort.
    fn persist(&self, state: &ConsentState) {
        let json = match state.to_json() {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize consent state");
                return;
            }
        };

        let mut cookie = SetCookie::new(self.settings.cookie_name.as_str(), json.as_str())
            .path("/")
            .same_site(SameSite::Lax);

        let now = Utc::now();
        match Duration::try_days(self.settings.max_age_days)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
        {
            Some(expires) => cookie = cookie.expires(expires),
            None => tracing::warn!(
                max_age_days = self.settings.max_age_days,
                "Consent cookie lifetime out of range, writing a session cookie"
            ),
        }

        if let Err(e) = self.jar.write(&cookie.to_string()) {
            tracing::warn!(error = %e, "Failed to write consent cookie");
        }

        if let Err(e) = self.backup.set_item(&self.settings.backup_key, &json) {
            tracing::warn!(error = %e, "Failed to write consent backup");
        }
    }

    fn notify(&self, state: &ConsentState) {
        // Snapshot so listeners may add or remove listeners
        let listeners = self.listeners.read().clone();

        for (id, listener) in listeners {
            let delivered = panic::catch_unwind(AssertUnwindSafe(|| listener(state)));
            if delivered.is_err() {
                tracing::error!(listener = ?id, "Consent listener panicked");
            }
        }
    }

    /// Copy of the current state
    pub fn consent_state(&self) -> ConsentState {
        self.state.read().clone()
    }

    pub fn has_consent(&self, category: CookieCategory) -> bool {
        match category {
            CookieCategory::Essential => true,
            other => self.state.read().allows(other),
        }
    }

    /// Merge `update` into the current state, persist and notify listeners
    pub fn set_consent(&self, update: ConsentUpdate) {
        let snapshot = {
            let mut state = self.state.write();
            state.apply(&update, &self.settings.policy_version);
            state.clone()
        };

        self.persist(&snapshot);

        tracing::info!(
            functional = snapshot.functional,
            analytics = snapshot.analytics,
            marketing = snapshot.marketing,
            version = %snapshot.version,
            "Consent updated"
        );

        self.notify(&snapshot);
    }

    pub fn accept_all(&self) {
        self.set_consent(ConsentUpdate::all(true));
    }

    pub fn accept_essential_only(&self) {
        self.set_consent(ConsentUpdate::all(false));
    }

    pub fn withdraw_consent(&self) {
        self.set_consent(ConsentUpdate::all(false));
    }

    /// Back to the all-denied default with a fresh timestamp
    pub fn reset_consent(&self) {
        let snapshot = ConsentState::default_for(&self.settings.policy_version);
        *self.state.write() = snapshot.clone();

        self.persist(&snapshot);
        tracing::info!("Consent reset to defaults");
        self.notify(&snapshot);
    }

    /// Whether the visitor has made (or previously persisted) a choice
    pub fn has_given_consent(&self) -> bool {
        let state = self.state.read();
        state.any_optional() || !state.is_default
    }

    /// Whether the stored choice was made under another policy version
    pub fn needs_consent_refresh(&self) -> bool {
        self.state.read().version != self.settings.policy_version
    }

    pub fn add_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&ConsentState) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_listener_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, Arc::new(listener)));
        id
    }

    /// Returns false if the listener was already removed
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub fn policy_version(&self) -> &str {
        &self.settings.policy_version
    }

    pub fn settings(&self) -> &ConsentSettings {
        &self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meditour_storage::{read_cookie, DetachedStorage, MemoryCookieJar, MemoryLocalStore};
    use parking_lot::Mutex;

    fn memory_storage() -> (Arc<MemoryCookieJar>, Arc<MemoryLocalStore>) {
        (
            Arc::new(MemoryCookieJar::new()),
            Arc::new(MemoryLocalStore::new()),
        )
    }

    fn load(jar: &Arc<MemoryCookieJar>, backup: &Arc<MemoryLocalStore>) -> ConsentStore {
        ConsentStore::load(jar.clone(), backup.clone(), ConsentSettings::default())
    }

    fn persisted(version: &str, analytics: bool) -> String {
        format!(
            r#"{{"essential":true,"functional":false,"analytics":{},"marketing":false,"timestamp":"2025-03-01T10:00:00.000Z","version":"{}"}}"#,
            analytics, version
        )
    }

    /// Jar that records every assignment string
    struct RecordingJar {
        inner: MemoryCookieJar,
        writes: Mutex<Vec<String>>,
    }

    impl CookieJar for RecordingJar {
        fn cookie_header(&self) -> meditour_storage::Result<String> {
            self.inner.cookie_header()
        }

        fn write(&self, cookie: &str) -> meditour_storage::Result<()> {
            self.writes.lock().push(cookie.to_string());
            self.inner.write(cookie)
        }

        fn remove_all(&self, name: &str) -> meditour_storage::Result<usize> {
            self.inner.remove_all(name)
        }
    }

    #[test]
    fn test_first_visit_defaults() {
        let (jar, backup) = memory_storage();
        let store = load(&jar, &backup);

        let state = store.consent_state();
        assert!(state.essential);
        assert!(!state.any_optional());
        assert!(store.has_consent(CookieCategory::Essential));
        assert!(!store.has_consent(CookieCategory::Functional));
        assert!(!store.has_given_consent());
        assert!(!store.needs_consent_refresh());

        // Nothing is written until the visitor chooses
        assert!(jar.is_empty());
    }

    #[test]
    fn test_set_consent_merges_and_stamps() {
        let (jar, backup) = memory_storage();
        let store = load(&jar, &backup);
        let before = store.consent_state().timestamp;

        store.set_consent(ConsentUpdate::default().functional(true));
        store.set_consent(ConsentUpdate::default().marketing(true));

        let state = store.consent_state();
        assert!(state.essential);
        assert!(state.functional);
        assert!(!state.analytics);
        assert!(state.marketing);
        assert_eq!(state.version, "1.0.0");
        assert!(state.timestamp >= before);
        assert!(store.has_given_consent());
    }

    #[test]
    fn test_persists_to_cookie_and_backup() {
        let (jar, backup) = memory_storage();
        let store = load(&jar, &backup);
        store.accept_all();

        let header = jar.cookie_header().unwrap();
        let cookie_json = read_cookie(&header, CONSENT_COOKIE).unwrap();
        let backup_json = backup.get_item("cookie-consent-backup").unwrap().unwrap();
        assert_eq!(cookie_json, backup_json);

        let reloaded = load(&jar, &backup);
        let state = reloaded.consent_state();
        assert!(state.functional && state.analytics && state.marketing);
        assert!(!state.is_default);
        assert_eq!(state.timestamp, store.consent_state().timestamp);
    }

    #[test]
    fn test_cookie_attributes() {
        let jar = Arc::new(RecordingJar {
            inner: MemoryCookieJar::new(),
            writes: Mutex::new(Vec::new()),
        });
        let store = ConsentStore::load(
            jar.clone(),
            Arc::new(MemoryLocalStore::new()),
            ConsentSettings::default(),
        );
        store.accept_essential_only();

        let writes = jar.writes.lock();
        assert_eq!(writes.len(), 1);
        let written = &writes[0];
        assert!(written.starts_with("cookie-consent=%7B"));
        assert!(written.contains("; path=/"));
        assert!(written.contains("; samesite=Lax"));

        let parsed = meditour_storage::RawCookie::parse(written, Utc::now()).unwrap();
        let lifetime = parsed.expires_at.unwrap() - Utc::now();
        assert!(lifetime > Duration::days(364) && lifetime <= Duration::days(365));
    }

    #[test]
    fn test_restores_from_backup_and_heals_cookie() {
        let (jar, backup) = memory_storage();
        backup
            .set_item("cookie-consent-backup", &persisted("1.0.0", true))
            .unwrap();

        let store = load(&jar, &backup);
        assert!(store.has_consent(CookieCategory::Analytics));
        assert!(store.has_given_consent());

        let header = jar.cookie_header().unwrap();
        let healed = read_cookie(&header, CONSENT_COOKIE).unwrap();
        assert!(ConsentState::from_json(&healed).unwrap().analytics);
    }

    #[test]
    fn test_cookie_wins_over_backup() {
        let (jar, backup) = memory_storage();
        jar.write(&SetCookie::new(CONSENT_COOKIE, persisted("1.0.0", false)).to_string())
            .unwrap();
        backup
            .set_item("cookie-consent-backup", &persisted("1.0.0", true))
            .unwrap();

        let store = load(&jar, &backup);
        assert!(!store.has_consent(CookieCategory::Analytics));
    }

    #[test]
    fn test_malformed_cookie_yields_defaults() {
        let (jar, backup) = memory_storage();
        jar.write("cookie-consent=not-json; path=/").unwrap();

        let store = load(&jar, &backup);
        let state = store.consent_state();
        assert!(state.essential);
        assert!(!state.any_optional());
        assert!(state.is_default);
        assert!(!store.has_given_consent());
    }

    #[test]
    fn test_malformed_cookie_falls_back_to_backup() {
        let (jar, backup) = memory_storage();
        jar.write("cookie-consent=not-json; path=/").unwrap();
        backup
            .set_item("cookie-consent-backup", &persisted("1.0.0", true))
            .unwrap();

        let store = load(&jar, &backup);
        assert!(store.has_consent(CookieCategory::Analytics));
    }

    #[test]
    fn test_version_refresh() {
        let (jar, backup) = memory_storage();
        backup
            .set_item("cookie-consent-backup", &persisted("0.9.0", false))
            .unwrap();

        let store = load(&jar, &backup);
        assert!(store.needs_consent_refresh());

        store.set_consent(ConsentUpdate::default());
        assert!(!store.needs_consent_refresh());
        assert_eq!(store.consent_state().version, store.policy_version());
    }

    #[test]
    fn test_essential_only_counts_as_given() {
        let (jar, backup) = memory_storage();
        let store = load(&jar, &backup);

        store.accept_essential_only();
        assert!(!store.consent_state().any_optional());
        assert!(store.has_given_consent());

        store.reset_consent();
        assert!(!store.has_given_consent());
    }

    #[test]
    fn test_withdraw_after_accept() {
        let (jar, backup) = memory_storage();
        let store = load(&jar, &backup);

        store.accept_all();
        store.withdraw_consent();

        for category in CookieCategory::ALL {
            assert_eq!(
                store.has_consent(category),
                category == CookieCategory::Essential
            );
        }
    }

    #[test]
    fn test_listeners_in_order() {
        let (jar, backup) = memory_storage();
        let store = load(&jar, &backup);
        let seen = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second"] {
            let seen = seen.clone();
            store.add_listener(move |state: &ConsentState| {
                seen.lock().push((tag, state.analytics));
            });
        }

        store.set_consent(ConsentUpdate::default().analytics(true));
        assert_eq!(*seen.lock(), vec![("first", true), ("second", true)]);
    }

    #[test]
    fn test_panicking_listener_is_isolated() {
        let (jar, backup) = memory_storage();
        let store = load(&jar, &backup);
        let received = Arc::new(Mutex::new(None));

        store.add_listener(|_: &ConsentState| panic!("banner went away"));
        let sink = received.clone();
        store.add_listener(move |state: &ConsentState| {
            *sink.lock() = Some(state.clone());
        });

        store.accept_all();

        let delivered = received.lock().clone().unwrap();
        assert!(delivered.marketing);
        assert!(store.has_consent(CookieCategory::Marketing));
    }

    #[test]
    fn test_remove_listener() {
        let (jar, backup) = memory_storage();
        let store = load(&jar, &backup);
        let calls = Arc::new(AtomicU64::new(0));

        let counter = calls.clone();
        let id = store.add_listener(move |_: &ConsentState| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        store.accept_all();
        assert!(store.remove_listener(id));
        assert!(!store.remove_listener(id));
        store.reset_consent();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_listener_can_read_store() {
        let (jar, backup) = memory_storage();
        let store = Arc::new(load(&jar, &backup));
        let observed = Arc::new(Mutex::new(None));

        let weak = Arc::downgrade(&store);
        let sink = observed.clone();
        store.add_listener(move |_: &ConsentState| {
            if let Some(store) = weak.upgrade() {
                *sink.lock() = Some(store.has_consent(CookieCategory::Functional));
            }
        });

        store.set_consent(ConsentUpdate::default().functional(true));
        assert_eq!(*observed.lock(), Some(true));
    }

    #[test]
    fn test_unavailable_storage_degrades() {
        let store = ConsentStore::load(
            Arc::new(DetachedStorage),
            Arc::new(DetachedStorage),
            ConsentSettings::default(),
        );
        assert!(!store.has_given_consent());

        store.accept_all();
        assert!(store.has_consent(CookieCategory::Analytics));
    }
}
