//! The durable record format: one flat JSON file per cookie.

use crate::cookie::Cookie;
use chrono::{TimeZone, Utc};
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    hash::{Hash, Hasher},
    io,
    path::Path,
};

/// File extension for cookie records.
pub(crate) const EXTENSION: &str = "cookie";

/// The serialized form of a cookie.
///
/// Every field except the name is defaulted on read, so a truncated or
/// hand-edited record degrades to documented defaults (not secure, version
/// 0, session lifetime) instead of poisoning the whole directory scan.
#[derive(Debug, Deserialize, Serialize)]
pub(crate) struct CookieRecord {
    pub(crate) name: String,

    #[serde(default)]
    pub(crate) value: String,

    #[serde(default)]
    pub(crate) domain: String,

    #[serde(default)]
    pub(crate) path: String,

    #[serde(default)]
    pub(crate) secure: bool,

    /// Absolute expiry as unix seconds. Max-age is consumed when a cookie
    /// is added to a store, so only the absolute instant is recorded.
    #[serde(default)]
    pub(crate) expires: Option<i64>,

    #[serde(default)]
    pub(crate) comment: Option<String>,

    #[serde(default, rename = "commentURL")]
    pub(crate) comment_url: Option<String>,

    #[serde(default)]
    pub(crate) discard: bool,

    #[serde(default)]
    pub(crate) version: u32,
}

impl From<&Cookie> for CookieRecord {
    fn from(cookie: &Cookie) -> Self {
        Self {
            name: cookie.name().to_owned(),
            value: cookie.value().to_owned(),
            domain: cookie.domain().unwrap_or("").to_owned(),
            path: cookie.path().unwrap_or("/").to_owned(),
            secure: cookie.is_secure(),
            expires: cookie.expiration().map(|time| time.timestamp()),
            comment: cookie.comment().map(str::to_owned),
            comment_url: cookie.comment_url().map(str::to_owned),
            discard: cookie.is_discard(),
            version: cookie.version(),
        }
    }
}

impl CookieRecord {
    pub(crate) fn into_cookie(self) -> Cookie {
        let mut builder = Cookie::builder(self.name, self.value)
            .domain(self.domain)
            .path(if self.path.is_empty() {
                "/".to_owned()
            } else {
                self.path
            })
            .secure(self.secure)
            .discard(self.discard)
            .version(self.version);

        if let Some(secs) = self.expires {
            if let Some(time) = Utc.timestamp_opt(secs, 0).single() {
                builder = builder.expires(time);
            }
        }

        if let Some(comment) = self.comment {
            builder = builder.comment(comment);
        }

        if let Some(comment_url) = self.comment_url {
            builder = builder.comment_url(comment_url);
        }

        builder.build()
    }
}

/// Deterministic record file name for a cookie identity.
///
/// The name is a stable hash of (name, domain, path), so updating a cookie
/// overwrites its previous record and removal targets the same file.
pub(crate) fn file_name(cookie: &Cookie) -> String {
    let mut hasher = FxHasher::default();

    cookie.name().hash(&mut hasher);
    cookie.domain().unwrap_or("").hash(&mut hasher);
    cookie.path().unwrap_or("/").hash(&mut hasher);

    format!("{:016x}.{}", hasher.finish(), EXTENSION)
}

/// Write a cookie's record, going through a temporary sibling so a crash
/// mid-write cannot corrupt an existing record.
pub(crate) fn save(directory: &Path, cookie: &Cookie) -> io::Result<()> {
    let path = directory.join(file_name(cookie));
    let staging = path.with_extension("tmp");
    let json = serde_json::to_vec_pretty(&CookieRecord::from(cookie))?;

    fs::write(&staging, json)?;
    fs::rename(&staging, &path)
}

/// Load a cookie record from a file.
pub(crate) fn load(path: &Path) -> io::Result<CookieRecord> {
    let bytes = fs::read(path)?;
    let record = serde_json::from_slice(&bytes)?;

    Ok(record)
}

/// Delete a cookie's record file.
pub(crate) fn delete(directory: &Path, cookie: &Cookie) -> io::Result<()> {
    delete_path(&directory.join(file_name(cookie)))
}

/// Delete a record file, treating "already gone" as success.
pub(crate) fn delete_path(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        result => result,
    }
}

/// Delete every record file in the directory, continuing past individual
/// failures and reporting the first one.
pub(crate) fn delete_all(directory: &Path) -> io::Result<()> {
    let mut first_error = None;

    for entry in fs::read_dir(directory)? {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(e) => {
                first_error.get_or_insert(e);
                continue;
            }
        };

        if path.extension().map_or(false, |ext| ext == EXTENSION) {
            if let Err(e) = delete_path(&path) {
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_record_uses_defaults() {
        let record: CookieRecord = serde_json::from_str(r#"{"name": "sid"}"#).unwrap();

        assert_eq!(record.name, "sid");
        assert_eq!(record.value, "");
        assert!(!record.secure);
        assert!(!record.discard);
        assert_eq!(record.expires, None);
        assert_eq!(record.version, 0);

        let cookie = record.into_cookie();

        assert_eq!(cookie.path(), Some("/"));
        assert!(!cookie.is_expired());
    }

    #[test]
    fn file_name_is_keyed_by_identity() {
        let a = Cookie::builder("sid", "1").domain("example.com").path("/").build();
        let same_identity = Cookie::builder("sid", "2").domain("example.com").path("/").build();
        let other_path = Cookie::builder("sid", "1").domain("example.com").path("/a").build();
        let other_domain = Cookie::builder("sid", "1").domain("other.com").path("/").build();

        assert_eq!(file_name(&a), file_name(&same_identity));
        assert_ne!(file_name(&a), file_name(&other_path));
        assert_ne!(file_name(&a), file_name(&other_domain));
        assert!(file_name(&a).ends_with(".cookie"));
    }

    #[test]
    fn save_load_roundtrip() {
        let directory = tempfile::tempdir().unwrap();
        let cookie = Cookie::builder("sid", "abc123")
            .domain("example.com")
            .path("/app")
            .secure(true)
            .expires(Utc.timestamp_opt(4_102_444_800, 0).unwrap())
            .comment("session id")
            .build();

        save(directory.path(), &cookie).unwrap();

        let record = load(&directory.path().join(file_name(&cookie))).unwrap();
        let restored = record.into_cookie();

        assert_eq!(restored, cookie);
    }

    #[test]
    fn delete_missing_file_is_ok() {
        let directory = tempfile::tempdir().unwrap();

        delete(directory.path(), &Cookie::new("ghost", "")).unwrap();
    }
}
