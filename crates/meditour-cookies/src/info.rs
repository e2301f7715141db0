//! Read-only view of a live cookie

use chrono::{DateTime, Utc};
use serde::Serialize;

use meditour_consent::CookieCategory;

/// Live cookie joined with its registry definition. Computed on demand;
/// `created_at` is when the snapshot was taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCookieInfo {
    pub name: String,
    pub value: String,
    pub category: CookieCategory,
    pub purpose: String,
    pub created_at: DateTime<Utc>,
}
