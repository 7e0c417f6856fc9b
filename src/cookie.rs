//! The cookie value type shared by all store implementations.

use chrono::{DateTime, Utc};

/// Information stored about an HTTP cookie.
///
/// This is a plain value type. Parsing `Set-Cookie` header strings into
/// cookies, and rendering stored cookies back into `Cookie` request headers,
/// belong to the client adapters that consume the store; cookies are built
/// here through [`Cookie::builder`].
#[derive(Clone, Debug, PartialEq)]
pub struct Cookie {
    /// The name of the cookie.
    name: String,

    /// The cookie value.
    value: String,

    /// The domain the cookie belongs to. Absent for host-only cookies,
    /// which are valid only for the exact host that set them.
    pub(crate) domain: Option<String>,

    /// A path prefix that this cookie belongs to.
    pub(crate) path: Option<String>,

    /// True if the cookie is marked as secure (limited in scope to HTTPS).
    secure: bool,

    /// Time when this cookie expires. If not present, then this is a
    /// session cookie that expires when the current client session ends.
    pub(crate) expiration: Option<DateTime<Utc>>,

    /// Lifetime in seconds. Consumed when the cookie is added to a store to
    /// compute or refresh `expiration`; zero or negative means the cookie
    /// is already expired.
    pub(crate) max_age: Option<i64>,

    /// True if the cookie must not survive a restart, regardless of any
    /// expiration metadata.
    discard: bool,

    /// Cookie specification version. Opaque to matching.
    version: u32,

    /// Free-form comment attribute. Opaque to matching.
    comment: Option<String>,

    /// Comment URL attribute. Opaque to matching.
    comment_url: Option<String>,
}

impl Cookie {
    /// Create a session cookie with the given name and value and no other
    /// attributes.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: None,
            path: None,
            secure: false,
            expiration: None,
            max_age: None,
            discard: false,
            version: 0,
            comment: None,
            comment_url: None,
        }
    }

    /// Start building a cookie with additional attributes.
    pub fn builder(name: impl Into<String>, value: impl Into<String>) -> CookieBuilder {
        CookieBuilder {
            cookie: Self::new(name, value),
        }
    }

    /// Get the name of the cookie.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the value of the cookie.
    #[inline]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Get the domain the cookie belongs to, if it has one.
    ///
    /// A cookie without a domain is host-only: it applies to the exact host
    /// that set it and nothing else.
    #[inline]
    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    /// Get the path prefix the cookie belongs to, if it has one.
    #[inline]
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Get whether this cookie was marked as being secure only.
    #[inline]
    pub fn is_secure(&self) -> bool {
        self.secure
    }

    /// Get the absolute time this cookie expires, if any.
    #[inline]
    pub fn expiration(&self) -> Option<DateTime<Utc>> {
        self.expiration
    }

    /// Get the cookie's remaining lifetime in seconds, if one was set.
    ///
    /// Stores consume this attribute at insertion time, converting it into
    /// an absolute [`expiration`](Cookie::expiration).
    #[inline]
    pub fn max_age(&self) -> Option<i64> {
        self.max_age
    }

    /// Get whether this cookie must be discarded at the end of the session
    /// even if it carries a later expiration.
    #[inline]
    pub fn is_discard(&self) -> bool {
        self.discard
    }

    /// Get the cookie specification version.
    #[inline]
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Get the cookie's comment attribute, if any.
    #[inline]
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Get the cookie's comment URL attribute, if any.
    #[inline]
    pub fn comment_url(&self) -> Option<&str> {
        self.comment_url.as_deref()
    }

    /// True if this cookie has expired.
    ///
    /// A cookie with a non-positive max-age is expired from the moment it
    /// is created; a cookie with neither max-age nor expiration is a pure
    /// session cookie and never expires by this rule.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub(crate) fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        if matches!(self.max_age, Some(seconds) if seconds <= 0) {
            return true;
        }

        match self.expiration {
            Some(time) => time < now,
            None => false,
        }
    }
}

/// A builder for constructing a [`Cookie`] with optional attributes.
///
/// Created by [`Cookie::builder`].
#[derive(Clone, Debug)]
pub struct CookieBuilder {
    cookie: Cookie,
}

impl CookieBuilder {
    /// Set the domain the cookie applies to.
    ///
    /// Leaving the domain unset produces a host-only cookie, scoped to the
    /// exact host of the request URI it is added with.
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.cookie.domain = Some(domain.into());
        self
    }

    /// Set the path prefix the cookie applies to. Defaults to `/`.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.cookie.path = Some(path.into());
        self
    }

    /// Limit the cookie to secure request schemes.
    pub fn secure(mut self, secure: bool) -> Self {
        self.cookie.secure = secure;
        self
    }

    /// Set an absolute expiration time.
    pub fn expires(mut self, at: DateTime<Utc>) -> Self {
        self.cookie.expiration = Some(at);
        self
    }

    /// Set the cookie lifetime in seconds.
    ///
    /// Zero or negative values mark the cookie as expired on arrival, which
    /// stores interpret as a deletion of any previously stored cookie with
    /// the same identity.
    pub fn max_age(mut self, seconds: i64) -> Self {
        self.cookie.max_age = Some(seconds);
        self
    }

    /// Mark the cookie as discard-on-session-end. Discard cookies are never
    /// written to durable storage.
    pub fn discard(mut self, discard: bool) -> Self {
        self.cookie.discard = discard;
        self
    }

    /// Set the cookie specification version.
    pub fn version(mut self, version: u32) -> Self {
        self.cookie.version = version;
        self
    }

    /// Set the comment attribute.
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.cookie.comment = Some(comment.into());
        self
    }

    /// Set the comment URL attribute.
    pub fn comment_url(mut self, comment_url: impl Into<String>) -> Self {
        self.cookie.comment_url = Some(comment_url.into());
        self
    }

    /// Finish building the cookie.
    pub fn build(self) -> Cookie {
        self.cookie
    }
}
