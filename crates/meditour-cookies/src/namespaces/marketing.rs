//! Campaign attribution
//!
//! Records which campaign brought a visitor to the site so an enquiry can be
//! attributed later. Only written with marketing consent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{encode_or_log, read_json};
use crate::manager::CookieManager;
use crate::options::CookieOptions;
use crate::tracking::{parse_location, strip_tracking_params, CLICK_ID_PARAMS};

pub const ATTRIBUTION_COOKIE: &str = "utm-attribution";
pub const CLICK_ID_COOKIE: &str = "ad-click-id";

const ATTRIBUTION_PURPOSE: &str = "Records which campaign brought you to the site";
const CLICK_ID_PURPOSE: &str = "Stores the advertising click identifier for conversion reporting";
const LIFETIME_DAYS: i64 = 90;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UtmAttribution {
    pub source: Option<String>,
    pub medium: Option<String>,
    pub campaign: Option<String>,
    pub term: Option<String>,
    pub content: Option<String>,
    /// Landing path without tracking parameters
    pub landing_page: String,
    pub click_id: Option<String>,
    pub captured_at: DateTime<Utc>,
}

impl UtmAttribution {
    /// Attribution carried by `landing_url`, if it has any campaign data
    pub fn from_landing_url(landing_url: &str) -> Option<Self> {
        let parsed = parse_location(landing_url)?;
        let param = |key: &str| {
            parsed
                .query_pairs()
                .find(|(k, v)| k == key && !v.is_empty())
                .map(|(_, v)| v.into_owned())
        };

        let attribution = Self {
            source: param("utm_source"),
            medium: param("utm_medium"),
            campaign: param("utm_campaign"),
            term: param("utm_term"),
            content: param("utm_content"),
            landing_page: strip_tracking_params(landing_url),
            click_id: CLICK_ID_PARAMS.iter().find_map(|&key| param(key)),
            captured_at: Utc::now(),
        };

        attribution.has_campaign_data().then_some(attribution)
    }

    fn has_campaign_data(&self) -> bool {
        [
            &self.source,
            &self.medium,
            &self.campaign,
            &self.term,
            &self.content,
            &self.click_id,
        ]
        .iter()
        .any(|value| value.is_some())
    }
}

pub struct MarketingCookies {
    manager: CookieManager,
}

impl MarketingCookies {
    pub fn new(manager: CookieManager) -> Self {
        Self { manager }
    }

    /// Record attribution from a landing URL. True only when the attribution
    /// and any click id were both stored.
    pub fn capture_campaign(&self, landing_url: &str) -> bool {
        let Some(attribution) = UtmAttribution::from_landing_url(landing_url) else {
            tracing::debug!(url = %landing_url, "No campaign parameters to capture");
            return false;
        };

        let Some(json) = encode_or_log(ATTRIBUTION_COOKIE, &attribution) else {
            return false;
        };

        let options = CookieOptions::days(LIFETIME_DAYS);
        if !self
            .manager
            .set_marketing(ATTRIBUTION_COOKIE, &json, ATTRIBUTION_PURPOSE, &options)
        {
            return false;
        }

        match &attribution.click_id {
            Some(click_id) => {
                let stored = self.manager.set_marketing(
                    CLICK_ID_COOKIE,
                    click_id,
                    CLICK_ID_PURPOSE,
                    &options,
                );
                if !stored {
                    tracing::warn!(cookie = CLICK_ID_COOKIE, "Click id not stored with attribution");
                }
                stored
            }
            None => true,
        }
    }

    pub fn get_attribution(&self) -> Option<UtmAttribution> {
        read_json(&self.manager, ATTRIBUTION_COOKIE)
    }

    pub fn get_click_id(&self) -> Option<String> {
        self.manager.get(CLICK_ID_COOKIE)
    }

    pub fn clear_attribution(&self) -> bool {
        let attribution = self
            .manager
            .remove(ATTRIBUTION_COOKIE, &CookieOptions::default());
        let click_id = self
            .manager
            .remove(CLICK_ID_COOKIE, &CookieOptions::default());
        attribution && click_id
    }
}
