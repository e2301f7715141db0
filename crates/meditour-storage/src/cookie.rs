//! Cookie strings
//!
//! Building and parsing `document.cookie` assignment strings:
//! `name=value; expires=<HTTP date>; max-age=<secs>; domain=..; path=..; secure; httponly; samesite=..`

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::fmt;

use crate::error::StorageError;
use crate::Result;

/// Characters `encodeURIComponent` leaves untouched
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const HTTP_DATE: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Percent-encode a cookie value
pub fn encode_value(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT).to_string()
}

/// Decode a cookie value. `None` when the escapes do not form valid UTF-8.
pub fn decode_value(value: &str) -> Option<String> {
    percent_decode_str(value)
        .decode_utf8()
        .ok()
        .map(|decoded| decoded.into_owned())
}

pub(crate) fn format_http_date(at: DateTime<Utc>) -> String {
    at.format(HTTP_DATE).to_string()
}

fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, HTTP_DATE)
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
        .or_else(|| {
            DateTime::parse_from_rfc2822(value)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        })
}

/// Iterate the `name=value` pairs of a cookie header (values still encoded)
pub fn cookie_pairs(header: &str) -> impl Iterator<Item = (&str, &str)> {
    header.split(';').filter_map(|pair| {
        let pair = pair.trim();
        if pair.is_empty() {
            return None;
        }
        match pair.split_once('=') {
            Some((name, value)) => Some((name.trim(), value.trim())),
            None => Some((pair, "")),
        }
    })
}

/// Find a cookie by exact name in a cookie header and decode its value
pub fn read_cookie(header: &str, name: &str) -> Option<String> {
    cookie_pairs(header)
        .find(|(candidate, _)| *candidate == name)
        .and_then(|(_, value)| decode_value(value))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SameSite {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(SameSite::Strict),
            "lax" => Ok(SameSite::Lax),
            "none" => Ok(SameSite::None),
            _ => Err(format!("Unknown SameSite value: {}", s)),
        }
    }
}

/// Builder for a cookie assignment string. The value is stored raw and
/// percent-encoded when rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie {
    pub name: String,
    pub value: String,
    pub expires: Option<DateTime<Utc>>,
    /// Seconds; takes precedence over `expires`
    pub max_age: Option<i64>,
    pub domain: Option<String>,
    pub path: Option<String>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: Option<SameSite>,
}

impl SetCookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            expires: None,
            max_age: None,
            domain: None,
            path: None,
            secure: false,
            http_only: false,
            same_site: None,
        }
    }

    /// An assignment that deletes `name` (empty value, expiry at the epoch)
    pub fn removal(name: impl Into<String>) -> Self {
        let mut cookie = Self::new(name, "");
        cookie.expires = Utc.timestamp_opt(0, 0).single();
        cookie
    }

    pub fn expires(mut self, at: DateTime<Utc>) -> Self {
        self.expires = Some(at);
        self
    }

    pub fn max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    pub fn same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }
}

impl fmt::Display for SetCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, encode_value(&self.value))?;
        if let Some(expires) = self.expires {
            write!(f, "; expires={}", format_http_date(expires))?;
        }
        if let Some(max_age) = self.max_age {
            write!(f, "; max-age={}", max_age)?;
        }
        if let Some(domain) = &self.domain {
            write!(f, "; domain={}", domain)?;
        }
        write!(f, "; path={}", self.path.as_deref().unwrap_or("/"))?;
        if self.secure {
            write!(f, "; secure")?;
        }
        if self.http_only {
            write!(f, "; httponly")?;
        }
        if let Some(same_site) = self.same_site {
            write!(f, "; samesite={}", same_site)?;
        }
        Ok(())
    }
}

/// A cookie as held by a jar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCookie {
    pub name: String,
    /// Value exactly as written (still percent-encoded)
    pub value: String,
    pub domain: Option<String>,
    pub path: String,
    /// `None` for session cookies
    pub expires_at: Option<DateTime<Utc>>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: Option<SameSite>,
    pub created_at: DateTime<Utc>,
}

impl RawCookie {
    /// Parse one assignment string, resolving `max-age` against `now`
    pub fn parse(cookie: &str, now: DateTime<Utc>) -> Result<Self> {
        let mut parts = cookie.split(';');
        let pair = parts.next().unwrap_or_default().trim();
        let (name, value) = pair
            .split_once('=')
            .ok_or_else(|| StorageError::InvalidCookie(cookie.to_string()))?;

        let name = name.trim();
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(StorageError::InvalidCookie(cookie.to_string()));
        }

        let mut parsed = Self {
            name: name.to_string(),
            value: value.trim().to_string(),
            domain: None,
            path: "/".to_string(),
            expires_at: None,
            secure: false,
            http_only: false,
            same_site: None,
            created_at: now,
        };

        let mut max_age: Option<i64> = None;

        for attribute in parts {
            let attribute = attribute.trim();
            let (key, val) = match attribute.split_once('=') {
                Some((key, val)) => (key.trim().to_lowercase(), val.trim()),
                None => (attribute.to_lowercase(), ""),
            };

            match key.as_str() {
                "expires" => parsed.expires_at = parse_http_date(val),
                "max-age" => max_age = val.parse().ok(),
                "domain" if !val.is_empty() => {
                    parsed.domain = Some(val.trim_start_matches('.').to_lowercase())
                }
                "path" if val.starts_with('/') => parsed.path = val.to_string(),
                "secure" => parsed.secure = true,
                "httponly" => parsed.http_only = true,
                "samesite" => parsed.same_site = val.parse().ok(),
                _ => {}
            }
        }

        if let Some(seconds) = max_age {
            parsed.expires_at = Duration::try_seconds(seconds)
                .and_then(|offset| now.checked_add_signed(offset));
        }

        Ok(parsed)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    /// Cookies are identified by name, domain and path
    pub fn same_key(&self, other: &RawCookie) -> bool {
        self.name == other.name && self.domain == other.domain && self.path == other.path
    }

    /// `name=value` as it appears in a cookie header
    pub fn header_pair(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}
