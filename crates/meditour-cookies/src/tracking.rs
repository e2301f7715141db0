//! Tracking parameters
//!
//! Query parameters that identify campaigns, ad clicks or visitors. They are
//! stripped from recorded page paths and read by campaign attribution.

use url::Url;

/// Campaign parameters captured for attribution
pub(crate) const CAMPAIGN_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
];

/// Ad click identifiers, in lookup order
pub(crate) const CLICK_ID_PARAMS: &[&str] = &[
    // Google
    "gclid",
    "dclid",
    // Facebook
    "fbclid",
    // Microsoft
    "msclkid",
    // Twitter
    "twclid",
    // Yandex
    "yclid",
];

/// Other known tracking parameters
const TRACKING_PARAMS: &[&str] = &[
    "utm_id",
    "utm_cid",
    "gclsrc",
    "fb_action_ids",
    "fb_action_types",
    "fb_source",
    "fb_ref",
    "_ga",
    "_gl",
    "mc_eid",
    "mc_cid",
    "igshid",
];

/// Base used to resolve site-relative paths
const SITE_BASE: &str = "https://site.invalid/";

pub fn is_tracking_param(key: &str) -> bool {
    CAMPAIGN_PARAMS.contains(&key) || CLICK_ID_PARAMS.contains(&key) || TRACKING_PARAMS.contains(&key)
}

/// Parse an absolute URL or a site-relative path
pub(crate) fn parse_location(location: &str) -> Option<Url> {
    Url::parse(location)
        .or_else(|_| Url::parse(SITE_BASE).and_then(|base| base.join(location)))
        .ok()
}

/// Path and query of `location` without tracking parameters or fragment.
/// The host is dropped so only site paths are ever recorded.
pub fn strip_tracking_params(location: &str) -> String {
    let parsed = match parse_location(location) {
        Some(parsed) => parsed,
        None => return location.to_string(),
    };

    let pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key.as_ref()))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    if pairs.is_empty() {
        return parsed.path().to_string();
    }

    let query = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish();

    format!("{}?{}", parsed.path(), query)
}
