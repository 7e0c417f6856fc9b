//! The authoritative in-memory cookie table.

use super::{request_host, request_path, CookieStore};
use crate::{
    cookie::Cookie,
    error::Error,
    matching::{candidate_domains, domain_matches, path_matches},
};
use chrono::{Duration, Utc};
use dashmap::DashMap;
use http::{uri::Scheme, Uri};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

/// A concurrency-safe in-memory cookie store.
///
/// The store is designed to be shared across many concurrent requests, so
/// cloning it returns a new handle to the same shared state instead of a
/// deep copy.
///
/// Cookies are indexed by their domain-value, with a per-domain table keyed
/// by (name, path), so the identity triple (name, domain, path) addresses
/// exactly one entry. Lookups walk only the label suffixes of the request
/// host and lock only the shards they touch, so concurrent readers never
/// block each other.
///
/// Expired cookies are purged cooperatively: [`get`](CookieStore::get)
/// removes any expired entries it scans over. There is no background
/// sweeper, so a cookie nobody asks for may stay resident past its expiry.
#[derive(Clone, Debug, Default)]
pub struct InMemoryCookieStore {
    shared: Arc<Shared>,
}

#[derive(Debug, Default)]
struct Shared {
    /// Cookie tables keyed by domain-value.
    domains: DashMap<String, DashMap<CookieId, StoredCookie>>,

    /// Monotonic insertion counter, used to keep `get` ordering stable for
    /// cookies with equal path lengths.
    sequence: AtomicU64,
}

/// Identity of a cookie within its domain table.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
struct CookieId {
    name: String,
    path: String,
}

/// A cookie plus the bookkeeping the store needs to match and order it.
#[derive(Clone, Debug)]
struct StoredCookie {
    /// The cookie, with its effective domain and path materialized.
    cookie: Cookie,

    /// True if the cookie was added without a domain attribute and is only
    /// valid for the exact host that set it.
    host_only: bool,

    /// Insertion order.
    sequence: u64,
}

/// The effect an [`InMemoryCookieStore::upsert`] call had on the table.
#[derive(Debug)]
pub(crate) enum Mutation {
    /// The cookie was inserted or replaced; carries the materialized cookie
    /// as stored.
    Stored(Cookie),

    /// A non-positive max-age deleted the previously stored cookie.
    Deleted(Cookie),

    /// Nothing changed.
    Unchanged,
}

/// The result of scanning the table for a request URI.
#[derive(Debug)]
pub(crate) struct Lookup {
    /// Matching cookies, longest path first, then insertion order.
    pub(crate) matched: Vec<Cookie>,

    /// Expired cookies that were purged from the table during the scan.
    pub(crate) purged: Vec<Cookie>,
}

impl InMemoryCookieStore {
    /// Create a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert, replace, or expire-delete a cookie, reporting what changed.
    pub(crate) fn upsert(&self, uri: &Uri, mut cookie: Cookie) -> Result<Mutation, Error> {
        let host = request_host(uri)?;
        let host_only = cookie.domain.is_none();
        let domain = match cookie.domain.as_deref() {
            Some(domain) => domain.to_lowercase(),
            None => host,
        };
        let path = cookie.path.as_deref().unwrap_or("/").to_owned();
        let id = CookieId {
            name: cookie.name().to_owned(),
            path: path.clone(),
        };

        // A non-positive max-age means "expire now": delete any existing
        // cookie with the same identity instead of storing anything.
        if matches!(cookie.max_age(), Some(seconds) if seconds <= 0) {
            if let Some(entries) = self.shared.domains.get(&domain) {
                if let Some((_, stored)) = entries.remove(&id) {
                    return Ok(Mutation::Deleted(stored.cookie));
                }
            }

            return Ok(Mutation::Unchanged);
        }

        // Materialize the effective attributes so the stored cookie is
        // self-describing: domain and path defaults are filled in, and
        // max-age is converted into an absolute expiration.
        cookie.domain = Some(domain.clone());
        cookie.path = Some(path);
        if let Some(seconds) = cookie.max_age.take() {
            cookie.expiration = Some(Utc::now() + Duration::seconds(seconds));
        }

        let stored = StoredCookie {
            cookie: cookie.clone(),
            host_only,
            sequence: self.next_sequence(),
        };

        self.shared.domains.entry(domain).or_default().insert(id, stored);

        Ok(Mutation::Stored(cookie))
    }

    /// Re-insert a cookie restored from a durable record.
    ///
    /// The record already carries the materialized domain and path, so no
    /// request URI is involved. Host-only provenance is not recorded on
    /// disk, so restored cookies match as domain cookies.
    pub(crate) fn restore(&self, cookie: Cookie) {
        let domain = cookie.domain.clone().unwrap_or_default();
        let id = CookieId {
            name: cookie.name().to_owned(),
            path: cookie.path.clone().unwrap_or_else(|| "/".to_owned()),
        };
        let stored = StoredCookie {
            cookie,
            host_only: false,
            sequence: self.next_sequence(),
        };

        self.shared.domains.entry(domain).or_default().insert(id, stored);
    }

    /// Scan the table for cookies matching a request, purging any expired
    /// entries encountered along the way.
    pub(crate) fn lookup(&self, uri: &Uri) -> Result<Lookup, Error> {
        let host = request_host(uri)?;
        let path = request_path(uri);
        let is_secure = uri.scheme() == Some(&Scheme::HTTPS);
        let now = Utc::now();

        let mut matched: Vec<(usize, u64, Cookie)> = Vec::new();
        let mut purged = Vec::new();

        for domain in candidate_domains(&host) {
            let entries = match self.shared.domains.get(domain) {
                Some(entries) => entries,
                None => continue,
            };

            // Collect expired identities first; removing entries while the
            // iterator holds their shard lock would deadlock.
            let mut expired = Vec::new();

            for entry in entries.iter() {
                let stored = entry.value();

                if stored.cookie.is_expired_at(now) {
                    expired.push(entry.key().clone());
                    continue;
                }

                if stored.host_only {
                    if domain != host {
                        continue;
                    }
                } else if !domain_matches(&host, domain) {
                    continue;
                }

                if stored.cookie.is_secure() && !is_secure {
                    continue;
                }

                let cookie_path = stored.cookie.path().unwrap_or("/");
                if !path_matches(path, cookie_path) {
                    continue;
                }

                matched.push((cookie_path.len(), stored.sequence, stored.cookie.clone()));
            }

            for id in expired {
                if let Some((_, stored)) = entries.remove(&id) {
                    purged.push(stored.cookie);
                }
            }
        }

        // Conventional cookie-header ordering: most specific path first,
        // then least recently stored.
        matched.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

        Ok(Lookup {
            matched: matched.into_iter().map(|(_, _, cookie)| cookie).collect(),
            purged,
        })
    }

    /// Remove a cookie by identity, returning the stored cookie if one was
    /// present.
    pub(crate) fn take(&self, uri: Option<&Uri>, cookie: &Cookie) -> Option<Cookie> {
        let domain = match cookie.domain() {
            Some(domain) => domain.to_lowercase(),
            None => uri.and_then(Uri::host).map(str::to_lowercase)?,
        };
        let id = CookieId {
            name: cookie.name().to_owned(),
            path: cookie.path().unwrap_or("/").to_owned(),
        };

        let entries = self.shared.domains.get(&domain)?;

        entries.remove(&id).map(|(_, stored)| stored.cookie)
    }

    /// Clear the table, reporting whether it held anything.
    pub(crate) fn clear(&self) -> bool {
        let had_cookies = self
            .shared
            .domains
            .iter()
            .any(|entries| !entries.value().is_empty());

        self.shared.domains.clear();

        had_cookies
    }

    fn next_sequence(&self) -> u64 {
        self.shared.sequence.fetch_add(1, Ordering::Relaxed)
    }
}

impl CookieStore for InMemoryCookieStore {
    fn add(&self, uri: &Uri, cookie: Cookie) -> Result<(), Error> {
        self.upsert(uri, cookie).map(|_| ())
    }

    fn get(&self, uri: &Uri) -> Result<Vec<Cookie>, Error> {
        self.lookup(uri).map(|lookup| lookup.matched)
    }

    fn cookies(&self) -> Vec<Cookie> {
        let now = Utc::now();
        let mut all = Vec::new();

        for entries in self.shared.domains.iter() {
            for entry in entries.value().iter() {
                if !entry.value().cookie.is_expired_at(now) {
                    all.push(entry.value().cookie.clone());
                }
            }
        }

        all
    }

    fn uris(&self) -> Vec<Uri> {
        let mut uris = Vec::new();

        for entries in self.shared.domains.iter() {
            if entries.value().iter().any(|entry| entry.value().host_only) {
                let uri = Uri::builder()
                    .scheme("http")
                    .authority(entries.key().as_str())
                    .path_and_query("/")
                    .build();

                if let Ok(uri) = uri {
                    uris.push(uri);
                }
            }
        }

        uris
    }

    fn remove(&self, uri: Option<&Uri>, cookie: &Cookie) -> bool {
        self.take(uri, cookie).is_some()
    }

    fn remove_all(&self) -> bool {
        self.clear()
    }
}
