//! Database migrations
//!
//! Schema: `cookies` (the durable jar) and `local_storage` (the backup store)

use crate::Result;
use rusqlite::Connection;

const SCHEMA_VERSION: i32 = 1;

pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
    }

    if current_version != SCHEMA_VERSION {
        set_schema_version(conn, SCHEMA_VERSION)?;
    }
    Ok(())
}

fn get_schema_version(conn: &Connection) -> Result<i32> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)",
        [],
    )?;

    let result = conn.query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
        row.get(0)
    });

    match result {
        Ok(v) => Ok(v),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
        Err(e) => Err(e.into()),
    }
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

fn migrate_v1(conn: &Connection) -> Result<()> {
    tracing::info!("Running migration v1: cookie jar and local storage");

    // Domain is '' for host-only cookies so the primary key stays unique
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS cookies (
            name TEXT NOT NULL,
            domain TEXT NOT NULL DEFAULT '',
            path TEXT NOT NULL DEFAULT '/',
            value TEXT NOT NULL,
            expires_at TEXT,
            secure INTEGER NOT NULL DEFAULT 0,
            http_only INTEGER NOT NULL DEFAULT 0,
            same_site TEXT,
            created_at TEXT NOT NULL,
            PRIMARY KEY (name, domain, path)
        );

        CREATE INDEX IF NOT EXISTS idx_cookies_expires ON cookies(expires_at);
    "#,
    )?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS local_storage (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
    "#,
    )?;

    Ok(())
}
