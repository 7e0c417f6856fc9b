//! A cookie store that stores nothing.

use super::CookieStore;
use crate::{cookie::Cookie, error::Error};
use http::Uri;

/// A no-op store for when cookie tracking is disabled.
///
/// Mutations report no effect and lookups always come back empty. The store
/// holds no state at all, so a single instance can be shared freely between
/// every client adapter in the process.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullCookieStore;

impl NullCookieStore {
    /// Create a null store.
    pub fn new() -> Self {
        Self
    }
}

impl CookieStore for NullCookieStore {
    fn add(&self, _uri: &Uri, _cookie: Cookie) -> Result<(), Error> {
        Ok(())
    }

    fn get(&self, _uri: &Uri) -> Result<Vec<Cookie>, Error> {
        Ok(Vec::new())
    }

    fn cookies(&self) -> Vec<Cookie> {
        Vec::new()
    }

    fn uris(&self) -> Vec<Uri> {
        Vec::new()
    }

    fn remove(&self, _uri: Option<&Uri>, _cookie: &Cookie) -> bool {
        false
    }

    fn remove_all(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static_assertions::assert_impl_all!(NullCookieStore: Send, Sync, Copy);

    #[test]
    fn reports_no_effect() {
        let store = NullCookieStore::new();
        let uri: Uri = "https://example.com/".parse().unwrap();

        store.add(&uri, Cookie::new("foo", "bar")).unwrap();

        assert!(store.get(&uri).unwrap().is_empty());
        assert!(store.cookies().is_empty());
        assert!(store.uris().is_empty());
        assert!(!store.remove(Some(&uri), &Cookie::new("foo", "bar")));
        assert!(!store.remove_all());
    }
}
