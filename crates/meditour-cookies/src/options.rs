//! Cookie write options

use chrono::{DateTime, Utc};

use meditour_storage::{SameSite, SetCookie};

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const YEAR: i64 = 365 * DAY;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieOptions {
    pub expires: Option<DateTime<Utc>>,
    /// Seconds; takes precedence over `expires`
    pub max_age: Option<i64>,
    pub domain: Option<String>,
    /// Defaults to `/`
    pub path: Option<String>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: Option<SameSite>,
}

impl CookieOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lifetime of `days` whole days
    pub fn days(days: i64) -> Self {
        Self::max_age_secs(days.saturating_mul(DAY))
    }

    pub fn max_age_secs(seconds: i64) -> Self {
        Self {
            max_age: Some(seconds),
            ..Self::default()
        }
    }

    pub fn expires_at(mut self, at: DateTime<Utc>) -> Self {
        self.expires = Some(at);
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn secure(mut self) -> Self {
        self.secure = true;
        self
    }

    pub fn http_only(mut self) -> Self {
        self.http_only = true;
        self
    }

    pub fn same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }

    pub(crate) fn to_set_cookie(&self, name: &str, value: &str) -> SetCookie {
        let mut cookie = SetCookie::new(name, value)
            .path(self.path.as_deref().unwrap_or("/"))
            .secure(self.secure)
            .http_only(self.http_only);

        if let Some(expires) = self.expires {
            cookie = cookie.expires(expires);
        }
        if let Some(max_age) = self.max_age {
            cookie = cookie.max_age(max_age);
        }
        if let Some(domain) = &self.domain {
            cookie = cookie.domain(domain.as_str());
        }
        if let Some(same_site) = self.same_site {
            cookie = cookie.same_site(same_site);
        }

        cookie
    }

    /// Deletion of the cookie these options address (same domain and path)
    pub(crate) fn to_removal(&self, name: &str) -> SetCookie {
        let mut cookie = SetCookie::removal(name).path(self.path.as_deref().unwrap_or("/"));
        if let Some(domain) = &self.domain {
            cookie = cookie.domain(domain.as_str());
        }
        cookie
    }

    /// Human-readable lifetime for a cookie definition, e.g. "1 year"
    pub fn lifetime_label(&self) -> String {
        if let Some(max_age) = self.max_age {
            return describe_seconds(max_age);
        }

        match self.expires {
            Some(expires) => {
                let remaining = (expires - Utc::now()).num_seconds();
                // Round to the minute so whole-day expiries read as days
                let remaining = (remaining + MINUTE / 2) / MINUTE * MINUTE;
                describe_seconds(remaining)
            }
            None => "Session".to_string(),
        }
    }
}

fn describe_seconds(seconds: i64) -> String {
    if seconds <= 0 {
        return "Expired".to_string();
    }

    let (count, unit) = [(YEAR, "year"), (DAY, "day"), (HOUR, "hour"), (MINUTE, "minute")]
        .into_iter()
        .find(|(size, _)| seconds >= *size && seconds % size == 0)
        .map(|(size, unit)| (seconds / size, unit))
        .unwrap_or((seconds, "second"));

    if count == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", count, unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_lifetime_labels() {
        assert_eq!(CookieOptions::days(365).lifetime_label(), "1 year");
        assert_eq!(CookieOptions::days(730).lifetime_label(), "2 years");
        assert_eq!(CookieOptions::days(7).lifetime_label(), "7 days");
        assert_eq!(CookieOptions::max_age_secs(1800).lifetime_label(), "30 minutes");
        assert_eq!(CookieOptions::max_age_secs(90).lifetime_label(), "90 seconds");
        assert_eq!(CookieOptions::max_age_secs(0).lifetime_label(), "Expired");
        assert_eq!(CookieOptions::new().lifetime_label(), "Session");
    }

    #[test]
    fn test_expires_label_rounds() {
        let options = CookieOptions::new().expires_at(Utc::now() + Duration::days(30));
        assert_eq!(options.lifetime_label(), "30 days");
    }

    #[test]
    fn test_default_path() {
        let cookie = CookieOptions::days(1).to_set_cookie("theme-preference", "dark");
        assert_eq!(
            cookie.to_string(),
            "theme-preference=dark; max-age=86400; path=/"
        );
    }

    #[test]
    fn test_removal_targets_same_location() {
        let options = CookieOptions::days(1)
            .with_domain("example.com")
            .with_path("/de");
        let removal = options.to_removal("theme-preference").to_string();

        assert!(removal.starts_with("theme-preference=; expires=Thu, 01 Jan 1970 00:00:00 GMT"));
        assert!(removal.contains("; domain=example.com"));
        assert!(removal.contains("; path=/de"));
    }
}
