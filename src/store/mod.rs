//! Cookie store implementations and the contract they share.
//!
//! Client adapters are handed a store instance at construction time and
//! call into it around every request; which implementation backs it is the
//! caller's choice:
//!
//! - [`InMemoryCookieStore`] for session-scoped cookie state.
//! - [`PersistentCookieStore`] to additionally survive restarts.
//! - [`NullCookieStore`] to disable cookie tracking entirely.
//!
//! Stores are shared, not global: construct one and inject it into each
//! adapter that should see the same cookies.

use crate::{cookie::Cookie, error::Error};
use http::Uri;

mod memory;
mod null;
mod persistent;
mod record;

pub use self::{
    memory::InMemoryCookieStore, null::NullCookieStore, persistent::PersistentCookieStore,
};

/// The contract shared by every cookie store implementation.
///
/// All methods take `&self` and implementations must be safe to call from
/// many threads at once; one store instance is expected to serve every
/// in-flight request of a client.
pub trait CookieStore: Send + Sync {
    /// Add a cookie observed on a response to the given request URI.
    ///
    /// A cookie without a domain is scoped to the URI's host (host-only).
    /// Adding a cookie whose identity (name, domain, path) matches an
    /// existing entry replaces it; adding one with a non-positive max-age
    /// deletes the existing entry instead, or does nothing if there is
    /// none. A secure cookie is accepted regardless of the request scheme;
    /// the secure check applies only when reading.
    ///
    /// Fails fast with [`Error::MissingHost`] if the URI has no host.
    fn add(&self, uri: &Uri, cookie: Cookie) -> Result<(), Error>;

    /// Get all cookies that apply to a request to the given URI.
    ///
    /// A cookie applies when its domain matches the URI host, its path
    /// prefix-matches the URI path on a `/` boundary, it has not expired,
    /// and it is not secure-only for a non-HTTPS request. The returned
    /// cookies are ordered longest path first, then by insertion order.
    ///
    /// Expired entries encountered during the scan are purged from the
    /// store as a side effect.
    fn get(&self, uri: &Uri) -> Result<Vec<Cookie>, Error>;

    /// Get a snapshot of every unexpired cookie in the store, regardless of
    /// domain or path.
    ///
    /// Unlike [`get`](CookieStore::get), this never purges anything.
    fn cookies(&self) -> Vec<Cookie>;

    /// Best-effort list of URIs for the hosts the store holds host-only
    /// cookies for.
    fn uris(&self) -> Vec<Uri>;

    /// Remove the cookie sharing the given cookie's identity (name, domain,
    /// path), returning whether anything was removed.
    ///
    /// The URI is only consulted when the cookie itself has no domain; it
    /// may be `None` otherwise.
    fn remove(&self, uri: Option<&Uri>, cookie: &Cookie) -> bool;

    /// Remove every cookie, returning whether the store held any.
    fn remove_all(&self) -> bool;
}

/// Extract the lowercased host from a request URI, failing fast on URIs
/// without one.
pub(crate) fn request_host(uri: &Uri) -> Result<String, Error> {
    uri.host().map(str::to_lowercase).ok_or(Error::MissingHost)
}

/// The request path, with the empty path normalized to `/`.
pub(crate) fn request_path(uri: &Uri) -> &str {
    match uri.path() {
        "" => "/",
        path => path,
    }
}
