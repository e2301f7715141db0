//! Storage for contexts without a cookie or local storage API

use crate::error::StorageError;
use crate::jar::CookieJar;
use crate::local::LocalStore;
use crate::Result;

/// Every read and write fails with [`StorageError::Unavailable`]
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedStorage;

impl DetachedStorage {
    fn unavailable<T>(api: &str) -> Result<T> {
        Err(StorageError::Unavailable(format!(
            "{} is not available in this context",
            api
        )))
    }
}

impl CookieJar for DetachedStorage {
    fn cookie_header(&self) -> Result<String> {
        Self::unavailable("cookie jar")
    }

    fn write(&self, _cookie: &str) -> Result<()> {
        Self::unavailable("cookie jar")
    }

    fn remove_all(&self, _name: &str) -> Result<usize> {
        Self::unavailable("cookie jar")
    }
}

impl LocalStore for DetachedStorage {
    fn get_item(&self, _key: &str) -> Result<Option<String>> {
        Self::unavailable("local storage")
    }

    fn set_item(&self, _key: &str, _value: &str) -> Result<()> {
        Self::unavailable("local storage")
    }

    fn remove_item(&self, _key: &str) -> Result<()> {
        Self::unavailable("local storage")
    }
}
