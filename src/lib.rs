//! A concurrency-safe, optionally file-persisted cookie store for HTTP
//! clients.
//!
//! This crate provides the cookie half of an HTTP client: a jar that many
//! in-flight requests can share without blocking each other or touching the
//! disk from a request thread. Parsing `Set-Cookie` headers into [`Cookie`]
//! values and rendering stored cookies back into request headers are the
//! responsibility of the client adapters consuming the store; what lives
//! here are the matching rules, the table, and the durability layer.
//!
//! Three implementations of the [`CookieStore`] contract are provided:
//!
//! - [`InMemoryCookieStore`]: the authoritative concurrency-safe table.
//!   Cookie state lasts as long as the process.
//! - [`PersistentCookieStore`]: wraps an in-memory store and mirrors each
//!   surviving cookie into a file under a configured directory, so state
//!   survives a restart.
//! - [`NullCookieStore`]: stores nothing, for when cookie tracking is
//!   disabled entirely.
//!
//! # Write-behind persistence
//!
//! The persistent store never performs file I/O on a request path. Every
//! logical operation is applied to the in-memory table synchronously, and
//! the corresponding file write or delete is handed to a [`TaskRunner`] to
//! happen afterwards. Durability is therefore eventual: a crash between a
//! mutation and the completion of its persistence task can lose that one
//! cookie's record and nothing more.
//! [`shutdown`](PersistentCookieStore::shutdown) drains all outstanding
//! persistence work and is the only synchronization barrier offered.
//!
//! # Examples
//!
//! ```no_run
//! use morsel::{Cookie, CookieStore, PersistentCookieStore};
//!
//! # fn main() -> Result<(), morsel::Error> {
//! let store = PersistentCookieStore::new("/tmp/cookies")?;
//!
//! let uri: http::Uri = "https://example.com/login".parse().unwrap();
//! store.add(&uri, Cookie::builder("sid", "abc123").path("/").build())?;
//!
//! for cookie in store.get(&uri)? {
//!     println!("{}={}", cookie.name(), cookie.value());
//! }
//!
//! store.shutdown()?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(
    future_incompatible,
    missing_debug_implementations,
    missing_docs,
    rust_2018_idioms,
    unreachable_pub,
    unused
)]

mod cookie;
mod error;
mod matching;
mod runner;
mod store;

pub use crate::{
    cookie::{Cookie, CookieBuilder},
    error::Error,
    runner::{BackgroundRunner, ImmediateRunner, Task, TaskRunner},
    store::{CookieStore, InMemoryCookieStore, NullCookieStore, PersistentCookieStore},
};
