//! Cookie jars
//!
//! A jar exposes the one process-wide cookie string: reads return every live
//! cookie as `name=value` pairs, writes take a single assignment string.
//! There is no transactionality; the last write wins.

use chrono::Utc;
use parking_lot::RwLock;

use crate::cookie::RawCookie;
use crate::Result;

pub trait CookieJar: Send + Sync {
    /// All live cookies as `name=value` pairs joined by `"; "`
    fn cookie_header(&self) -> Result<String>;

    /// Apply one cookie assignment string. An expiry in the past deletes the
    /// cookie with the same name, domain and path.
    fn write(&self, cookie: &str) -> Result<()>;

    /// Delete every cookie called `name`, whatever its domain or path.
    /// Returns how many live cookies were removed.
    fn remove_all(&self, name: &str) -> Result<usize>;
}

/// Cookie jar held in process memory
pub struct MemoryCookieJar {
    /// Insertion order is header order
    cookies: RwLock<Vec<RawCookie>>,
}

impl MemoryCookieJar {
    pub fn new() -> Self {
        Self {
            cookies: RwLock::new(Vec::new()),
        }
    }

    /// Number of live cookies
    pub fn len(&self) -> usize {
        let now = Utc::now();
        self.cookies
            .read()
            .iter()
            .filter(|c| !c.is_expired(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryCookieJar {
    fn default() -> Self {
        Self::new()
    }
}

impl CookieJar for MemoryCookieJar {
    fn cookie_header(&self) -> Result<String> {
        let now = Utc::now();
        let mut cookies = self.cookies.write();
        cookies.retain(|c| !c.is_expired(now));

        Ok(cookies
            .iter()
            .map(RawCookie::header_pair)
            .collect::<Vec<_>>()
            .join("; "))
    }

    fn write(&self, cookie: &str) -> Result<()> {
        let now = Utc::now();
        let mut incoming = RawCookie::parse(cookie, now)?;

        let mut cookies = self.cookies.write();
        let existing = cookies.iter().position(|c| c.same_key(&incoming));

        if incoming.is_expired(now) {
            if let Some(index) = existing {
                cookies.remove(index);
                tracing::debug!(cookie = %incoming.name, "Deleted cookie");
            }
            return Ok(());
        }

        match existing {
            Some(index) => {
                incoming.created_at = cookies[index].created_at;
                cookies[index] = incoming;
            }
            None => cookies.push(incoming),
        }

        Ok(())
    }

    fn remove_all(&self, name: &str) -> Result<usize> {
        let now = Utc::now();
        let mut cookies = self.cookies.write();
        cookies.retain(|c| !c.is_expired(now));

        let before = cookies.len();
        cookies.retain(|c| c.name != name);
        Ok(before - cookies.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookie::SetCookie;

    #[test]
    fn test_write_and_read() {
        let jar = MemoryCookieJar::new();
        jar.write("theme=dark; path=/").unwrap();
        jar.write("preferred-language=de; path=/").unwrap();

        assert_eq!(
            jar.cookie_header().unwrap(),
            "theme=dark; preferred-language=de"
        );
    }

    #[test]
    fn test_overwrite_keeps_position() {
        let jar = MemoryCookieJar::new();
        jar.write("a=1").unwrap();
        jar.write("b=2").unwrap();
        jar.write("a=3").unwrap();

        assert_eq!(jar.cookie_header().unwrap(), "a=3; b=2");
        assert_eq!(jar.len(), 2);
    }

    #[test]
    fn test_removal() {
        let jar = MemoryCookieJar::new();
        jar.write("theme=dark").unwrap();
        jar.write(&SetCookie::removal("theme").to_string()).unwrap();

        assert!(jar.is_empty());
        assert_eq!(jar.cookie_header().unwrap(), "");
    }

    #[test]
    fn test_path_is_part_of_identity() {
        let jar = MemoryCookieJar::new();
        jar.write("theme=dark; path=/de").unwrap();
        jar.write(&SetCookie::removal("theme").to_string()).unwrap();

        // Removal targeted path=/ so the /de cookie survives
        assert_eq!(jar.cookie_header().unwrap(), "theme=dark");
    }

    #[test]
    fn test_remove_all_ignores_path_and_domain() {
        let jar = MemoryCookieJar::new();
        jar.write("theme=dark; path=/de").unwrap();
        jar.write("theme=light; domain=example.com").unwrap();
        jar.write("theme=system").unwrap();
        jar.write("visitor-id=v1").unwrap();

        assert_eq!(jar.remove_all("theme").unwrap(), 3);
        assert_eq!(jar.cookie_header().unwrap(), "visitor-id=v1");
        assert_eq!(jar.remove_all("theme").unwrap(), 0);
    }

    #[test]
    fn test_remove_all_skips_expired() {
        let jar = MemoryCookieJar::new();
        jar.write("theme=dark; max-age=3600").unwrap();
        {
            let mut cookies = jar.cookies.write();
            cookies[0].expires_at = Some(Utc::now() - chrono::Duration::seconds(5));
        }

        assert_eq!(jar.remove_all("theme").unwrap(), 0);
    }

    #[test]
    fn test_invalid_write_rejected() {
        let jar = MemoryCookieJar::new();
        assert!(jar.write("garbage").is_err());
        assert!(jar.is_empty());
    }
}
