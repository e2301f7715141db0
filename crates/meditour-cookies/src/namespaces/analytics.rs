//! First-party analytics cookies

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{encode_or_log, read_json};
use crate::manager::CookieManager;
use crate::options::CookieOptions;
use crate::tracking::strip_tracking_params;

pub const VISITOR_COOKIE: &str = "visitor-id";
pub const SESSION_COOKIE: &str = "analytics-session";
pub const PAGE_VIEWS_COOKIE: &str = "page-views";

/// Page views kept in the rolling log
pub const MAX_PAGE_VIEWS: usize = 50;

const VISITOR_PURPOSE: &str = "Distinguishes returning visitors in aggregate statistics";
const SESSION_PURPOSE: &str = "Groups page views into a single visit";
const PAGE_VIEWS_PURPOSE: &str = "Records the most recent pages viewed during your visits";

const VISITOR_LIFETIME_DAYS: i64 = 730;
const SESSION_LIFETIME_SECS: i64 = 30 * 60;
const PAGE_VIEWS_LIFETIME_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageView {
    pub path: String,
    pub viewed_at: DateTime<Utc>,
}

pub struct AnalyticsCookies {
    manager: CookieManager,
}

impl AnalyticsCookies {
    pub fn new(manager: CookieManager) -> Self {
        Self { manager }
    }

    pub fn set_visitor_id(&self, visitor_id: &str) -> bool {
        self.manager.set_analytics(
            VISITOR_COOKIE,
            visitor_id,
            VISITOR_PURPOSE,
            &CookieOptions::days(VISITOR_LIFETIME_DAYS),
        )
    }

    pub fn get_visitor_id(&self) -> Option<String> {
        self.manager.get(VISITOR_COOKIE)
    }

    /// Existing visitor id, or a new one if analytics is permitted
    pub fn ensure_visitor_id(&self) -> Option<String> {
        if let Some(existing) = self.get_visitor_id() {
            return Some(existing);
        }

        let visitor_id = Uuid::new_v4().to_string();
        self.set_visitor_id(&visitor_id).then_some(visitor_id)
    }

    pub fn set_session_id(&self, session_id: &str) -> bool {
        self.manager.set_analytics(
            SESSION_COOKIE,
            session_id,
            SESSION_PURPOSE,
            &CookieOptions::max_age_secs(SESSION_LIFETIME_SECS),
        )
    }

    pub fn get_session_id(&self) -> Option<String> {
        self.manager.get(SESSION_COOKIE)
    }

    /// Start a new analytics session; `None` without analytics consent
    pub fn start_session(&self) -> Option<String> {
        let session_id = Uuid::new_v4().to_string();
        self.set_session_id(&session_id).then_some(session_id)
    }

    /// Append `path` to the page-view log, keeping the newest entries
    pub fn track_page_view(&self, path: &str) -> bool {
        if !self.manager.is_permitted(PAGE_VIEWS_COOKIE) {
            tracing::debug!(path = %path, "Page view not recorded without analytics consent");
            return false;
        }

        let mut views = self.page_views();
        views.push(PageView {
            path: strip_tracking_params(path),
            viewed_at: Utc::now(),
        });

        if views.len() > MAX_PAGE_VIEWS {
            let overflow = views.len() - MAX_PAGE_VIEWS;
            views.drain(0..overflow);
        }

        let Some(json) = encode_or_log(PAGE_VIEWS_COOKIE, &views) else {
            return false;
        };

        self.manager.set_analytics(
            PAGE_VIEWS_COOKIE,
            &json,
            PAGE_VIEWS_PURPOSE,
            &CookieOptions::days(PAGE_VIEWS_LIFETIME_DAYS),
        )
    }

    /// Recorded page views, oldest first
    pub fn page_views(&self) -> Vec<PageView> {
        read_json(&self.manager, PAGE_VIEWS_COOKIE).unwrap_or_default()
    }

    pub fn clear(&self) -> bool {
        [VISITOR_COOKIE, SESSION_COOKIE, PAGE_VIEWS_COOKIE]
            .into_iter()
            .map(|name| self.manager.remove(name, &CookieOptions::default()))
            .fold(true, |all, removed| all && removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespaces::test_support;

    #[test]
    fn test_visitor_id_gated() {
        let manager = test_support::manager();
        let analytics = AnalyticsCookies::new(manager.clone());

        assert!(!analytics.set_visitor_id("v1"));
        assert_eq!(analytics.ensure_visitor_id(), None);
        assert_eq!(analytics.get_visitor_id(), None);

        manager.consent().accept_all();
        assert!(analytics.set_visitor_id("v1"));
        assert_eq!(analytics.ensure_visitor_id(), Some("v1".to_string()));
    }

    #[test]
    fn test_ensure_visitor_id_generates_once() {
        let manager = test_support::manager();
        manager.consent().accept_all();
        let analytics = AnalyticsCookies::new(manager);

        let first = analytics.ensure_visitor_id().unwrap();
        assert!(Uuid::parse_str(&first).is_ok());
        assert_eq!(analytics.ensure_visitor_id(), Some(first));
    }

    #[test]
    fn test_session() {
        let manager = test_support::manager();
        let analytics = AnalyticsCookies::new(manager.clone());
        assert_eq!(analytics.start_session(), None);

        manager.consent().accept_all();
        let session = analytics.start_session().unwrap();
        assert_eq!(analytics.get_session_id(), Some(session));
    }

    #[test]
    fn test_page_views_capped() {
        let manager = test_support::manager();
        manager.consent().accept_all();
        let analytics = AnalyticsCookies::new(manager);

        for i in 0..(MAX_PAGE_VIEWS + 5) {
            assert!(analytics.track_page_view(&format!("/en/blog/{}", i)));
        }

        let views = analytics.page_views();
        assert_eq!(views.len(), MAX_PAGE_VIEWS);
        assert_eq!(views[0].path, "/en/blog/5");
        assert_eq!(views[MAX_PAGE_VIEWS - 1].path, format!("/en/blog/{}", MAX_PAGE_VIEWS + 4));
    }

    #[test]
    fn test_page_view_strips_tracking() {
        let manager = test_support::manager();
        manager.consent().accept_all();
        let analytics = AnalyticsCookies::new(manager);

        analytics.track_page_view("/de/services?utm_source=mail&tab=2");
        assert_eq!(analytics.page_views()[0].path, "/de/services?tab=2");
    }

    #[test]
    fn test_page_view_refused_without_consent() {
        let analytics = AnalyticsCookies::new(test_support::manager());
        assert!(!analytics.track_page_view("/en"));
        assert!(analytics.page_views().is_empty());
    }

    #[test]
    fn test_clear() {
        let manager = test_support::manager();
        manager.consent().accept_all();
        let analytics = AnalyticsCookies::new(manager.clone());
        analytics.set_visitor_id("v1");
        analytics.track_page_view("/en");

        assert!(analytics.clear());
        assert_eq!(analytics.get_visitor_id(), None);
        assert!(analytics.page_views().is_empty());
    }
}
