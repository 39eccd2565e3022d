//! Unified error type.

use std::fmt;

/// The error type returned by sendero's fallible operations.
///
/// A request that matches no route is *not* an error: it ends in the default
/// `404 Not Found` response. `Error` covers three other things:
///
/// - **configuration mistakes** in the route tree (a bad placeholder pattern,
///   a named condition nobody registered, a custom matcher that claims to
///   consume more than the path holds). These are programmer errors; they
///   abort the dispatch and are never mistaken for "no match".
/// - **handler failures**: a route body returned `Err(e)`. `e` is passed
///   through unchanged.
/// - **I/O** while binding or accepting in the host adapter.
#[derive(Debug)]
pub enum Error {
    /// A pattern failed to compile.
    Pattern {
        pattern: String,
        source: regex::Error,
    },
    /// A [`Condition::Named`](crate::Condition::Named) refers to a name that
    /// was never registered with [`RouterBuilder::condition`](crate::RouterBuilder::condition).
    UnknownCondition(String),
    /// A [`Matcher::Custom`](crate::Matcher::Custom) reported a consumed
    /// length that does not fit the remaining path or stops inside a segment.
    Consume { consumed: usize, available: usize },
    /// A route body failed.
    Handler(Box<dyn std::error::Error + Send + Sync + 'static>),
    Io(std::io::Error),
}

impl Error {
    /// `true` for errors caused by how the route tree is written rather than
    /// by the request being served.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::Pattern { .. } | Self::UnknownCondition(_) | Self::Consume { .. }
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pattern { pattern, source } => {
                write!(f, "invalid pattern `{pattern}`: {source}")
            }
            Self::UnknownCondition(name) => {
                write!(f, "no condition registered under `{name}`")
            }
            Self::Consume { consumed, available } => write!(
                f,
                "custom matcher consumed {consumed} bytes of a {available}-byte path, \
                 not ending on a segment boundary"
            ),
            Self::Handler(e) => write!(f, "handler: {e}"),
            Self::Io(e) => write!(f, "io: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Pattern { source, .. } => Some(source),
            Self::Handler(e) => Some(e.as_ref()),
            Self::Io(e) => Some(e),
            Self::UnknownCondition(_) | Self::Consume { .. } => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
