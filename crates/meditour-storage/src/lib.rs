//! Meditour Storage Layer
//!
//! Host storage primitives the consent engine runs on:
//! - [`CookieJar`]: a `document.cookie`-style string API
//! - [`LocalStore`]: a `localStorage`-style key/value API
//!
//! Both are implemented in memory, on SQLite ([`Database`]), and by
//! [`DetachedStorage`] for contexts with no storage at all.

mod cookie;
mod database;
mod detached;
mod error;
mod jar;
mod local;
mod migrations;

pub use cookie::{
    cookie_pairs, decode_value, encode_value, read_cookie, RawCookie, SameSite, SetCookie,
};
pub use database::Database;
pub use detached::DetachedStorage;
pub use error::StorageError;
pub use jar::{CookieJar, MemoryCookieJar};
pub use local::{LocalStore, MemoryLocalStore};

pub type Result<T> = std::result::Result<T, StorageError>;
