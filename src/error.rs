//! Types for error handling.

use std::{error::Error as StdError, fmt, io};

/// All possible types of errors that can be returned from a cookie store.
#[derive(Debug)]
pub enum Error {
    /// The request URI did not contain a host component.
    ///
    /// Cookies are scoped to the host that set them, so every store
    /// operation that resolves a cookie against a request URI requires the
    /// URI to be absolute.
    MissingHost,

    /// An I/O error on the persistence directory.
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::MissingHost => write!(f, "request URI does not contain a host"),
            Error::Io(e) => write!(f, "cookie persistence I/O error: {}", e),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

#[doc(hidden)]
impl From<io::Error> for Error {
    fn from(error: io::Error) -> Error {
        Error::Io(error)
    }
}
