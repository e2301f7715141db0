//! SQLite-backed cookie jar and local store
//!
//! One database holds both the durable cookies and the local backup, so
//! consent state survives a process restart.

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;

use crate::cookie::RawCookie;
use crate::jar::CookieJar;
use crate::local::LocalStore;
use crate::migrations::run_migrations;
use crate::Result;

/// Fixed-width timestamps so expiry comparisons work on the text column
fn to_db_time(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn from_db_time(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;

        let _: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;

        run_migrations(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        run_migrations(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock();
        f(&conn)
    }

    /// Live cookies in creation order; expired rows are purged first
    pub fn load_cookies(&self) -> Result<Vec<RawCookie>> {
        let now = to_db_time(Utc::now());

        self.with_connection(|conn| {
            conn.execute(
                "DELETE FROM cookies WHERE expires_at IS NOT NULL AND expires_at <= ?1",
                [&now],
            )?;

            let mut stmt = conn.prepare(
                "SELECT name, domain, path, value, expires_at, secure, http_only, same_site, created_at
                 FROM cookies ORDER BY created_at, rowid",
            )?;

            let cookies: Vec<RawCookie> = stmt
                .query_map([], |row| {
                    let domain: String = row.get(1)?;
                    let expires_at: Option<String> = row.get(4)?;
                    let same_site: Option<String> = row.get(7)?;
                    let created_str: String = row.get(8)?;

                    Ok(RawCookie {
                        name: row.get(0)?,
                        domain: (!domain.is_empty()).then_some(domain),
                        path: row.get(2)?,
                        value: row.get(3)?,
                        expires_at: expires_at.as_deref().and_then(from_db_time),
                        secure: row.get::<_, i32>(5)? != 0,
                        http_only: row.get::<_, i32>(6)? != 0,
                        same_site: same_site.and_then(|s| s.parse().ok()),
                        created_at: from_db_time(&created_str).unwrap_or_else(Utc::now),
                    })
                })?
                .filter_map(|r| r.ok())
                .collect();

            Ok(cookies)
        })
    }

    /// Insert or replace a cookie, keeping the original creation time
    pub fn save_cookie(&self, cookie: &RawCookie) -> Result<()> {
        self.with_connection(|conn| {
            conn.execute(
                "INSERT INTO cookies
                 (name, domain, path, value, expires_at, secure, http_only, same_site, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(name, domain, path) DO UPDATE SET
                    value = excluded.value,
                    expires_at = excluded.expires_at,
                    secure = excluded.secure,
                    http_only = excluded.http_only,
                    same_site = excluded.same_site",
                rusqlite::params![
                    cookie.name,
                    cookie.domain.as_deref().unwrap_or(""),
                    cookie.path,
                    cookie.value,
                    cookie.expires_at.map(to_db_time),
                    cookie.secure as i32,
                    cookie.http_only as i32,
                    cookie.same_site.map(|s| s.as_str()),
                    to_db_time(cookie.created_at),
                ],
            )?;
            Ok(())
        })
    }

    pub fn delete_cookie(&self, name: &str, domain: Option<&str>, path: &str) -> Result<()> {
        self.with_connection(|conn| {
            conn.execute(
                "DELETE FROM cookies WHERE name = ?1 AND domain = ?2 AND path = ?3",
                rusqlite::params![name, domain.unwrap_or(""), path],
            )?;
            Ok(())
        })
    }

    /// Delete `name` at every domain and path; returns the live rows removed
    pub fn delete_cookies_named(&self, name: &str) -> Result<usize> {
        let now = to_db_time(Utc::now());

        self.with_connection(|conn| {
            conn.execute(
                "DELETE FROM cookies WHERE expires_at IS NOT NULL AND expires_at <= ?1",
                [&now],
            )?;
            let removed = conn.execute("DELETE FROM cookies WHERE name = ?1", [name])?;
            Ok(removed)
        })
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
        }
    }
}

impl CookieJar for Database {
    fn cookie_header(&self) -> Result<String> {
        Ok(self
            .load_cookies()?
            .iter()
            .map(RawCookie::header_pair)
            .collect::<Vec<_>>()
            .join("; "))
    }

    fn write(&self, cookie: &str) -> Result<()> {
        let now = Utc::now();
        let cookie = RawCookie::parse(cookie, now)?;

        if cookie.is_expired(now) {
            tracing::debug!(cookie = %cookie.name, "Deleted persistent cookie");
            return self.delete_cookie(&cookie.name, cookie.domain.as_deref(), &cookie.path);
        }

        self.save_cookie(&cookie)
    }

    fn remove_all(&self, name: &str) -> Result<usize> {
        let removed = self.delete_cookies_named(name)?;
        if removed > 0 {
            tracing::debug!(cookie = %name, removed, "Deleted persistent cookies");
        }
        Ok(removed)
    }
}

impl LocalStore for Database {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.with_connection(|conn| {
            let value = conn
                .query_row(
                    "SELECT value FROM local_storage WHERE key = ?1",
                    [key],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(value)
        })
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let updated_at = Utc::now().to_rfc3339();
        self.with_connection(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO local_storage (key, value, updated_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![key, value, updated_at],
            )?;
            Ok(())
        })
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.with_connection(|conn| {
            conn.execute("DELETE FROM local_storage WHERE key = ?1", [key])?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookie::SetCookie;

    #[test]
    fn test_open_in_memory() {
        let db = Database::open_in_memory().unwrap();
        db.with_connection(|conn| {
            let count: i32 =
                conn.query_row("SELECT COUNT(*) FROM cookies", [], |row| row.get(0))?;
            assert_eq!(count, 0);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_cookie_jar_roundtrip() {
        let db = Database::open_in_memory().unwrap();
        db.write("theme=dark; max-age=3600; samesite=Lax").unwrap();
        db.write("preferred-language=de").unwrap();
        db.write("theme=light; max-age=3600").unwrap();

        assert_eq!(
            db.cookie_header().unwrap(),
            "theme=light; preferred-language=de"
        );

        db.write(&SetCookie::removal("theme").to_string()).unwrap();
        assert_eq!(db.cookie_header().unwrap(), "preferred-language=de");
    }

    #[test]
    fn test_expired_cookies_are_hidden() {
        let db = Database::open_in_memory().unwrap();
        let mut cookie = RawCookie::parse("stale=1", Utc::now()).unwrap();
        cookie.expires_at = Some(Utc::now() - chrono::Duration::seconds(5));
        db.save_cookie(&cookie).unwrap();

        assert_eq!(db.cookie_header().unwrap(), "");
    }

    #[test]
    fn test_remove_all_across_paths() {
        let db = Database::open_in_memory().unwrap();
        db.write("visitor-id=v1; path=/de; max-age=3600").unwrap();
        db.write("visitor-id=v2; domain=example.com").unwrap();
        db.write("theme=dark").unwrap();

        assert_eq!(db.remove_all("visitor-id").unwrap(), 2);
        assert_eq!(db.cookie_header().unwrap(), "theme=dark");
        assert_eq!(db.remove_all("visitor-id").unwrap(), 0);
    }

    #[test]
    fn test_local_store() {
        let db = Database::open_in_memory().unwrap();
        db.set_item("cookie-consent-backup", "{}").unwrap();
        assert_eq!(
            db.get_item("cookie-consent-backup").unwrap(),
            Some("{}".to_string())
        );
        db.remove_item("cookie-consent-backup").unwrap();
        assert_eq!(db.get_item("cookie-consent-backup").unwrap(), None);
    }

    #[test]
    fn test_reopen_file_keeps_cookies() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site.db");

        {
            let db = Database::open(&path).unwrap();
            db.write("preferred-language=en; max-age=3600").unwrap();
        }

        let db = Database::open(&path).unwrap();
        assert_eq!(db.cookie_header().unwrap(), "preferred-language=en");
    }
}
