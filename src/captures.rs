//! Capture scope and the captured values handed to route bodies.

use std::ops::Deref;
use std::str::FromStr;

/// Values captured by the matcher group currently being evaluated.
///
/// Reset when a group starts, so nested groups never see an ancestor's
/// captures. Values appear in the order the matchers that produced them ran.
#[derive(Debug, Default)]
pub(crate) struct CaptureScope {
    values: Vec<String>,
}

impl CaptureScope {
    pub(crate) fn reset(&mut self) {
        self.values.clear();
    }

    pub(crate) fn append(&mut self, values: impl IntoIterator<Item = String>) {
        self.values.extend(values);
    }

    pub(crate) fn push(&mut self, value: impl Into<String>) {
        self.values.push(value.into());
    }

    pub(crate) fn len(&self) -> usize {
        self.values.len()
    }

    /// Drops everything captured after the first `len` values.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.values.truncate(len);
    }

    /// A copy of the current captures in order.
    pub(crate) fn snapshot(&self) -> Captures {
        Captures(self.values.clone())
    }
}

/// Positional captures passed to a route body.
///
/// ```rust
/// # use sendero::{Matcher, Method, Router, Flow};
/// let app = Router::new(|r| {
///     r.is("posts/:year/:slug", |_, caps| {
///         let year: u16 = caps.parse(0).unwrap_or_default();
///         format!("{} from {year}", &caps[1])
///     })
/// });
/// let res = app.dispatch(Method::Get, "/posts/2024/hello").unwrap();
/// assert_eq!(res.body_str(), Some("hello from 2024"));
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Captures(Vec<String>);

impl Captures {
    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    /// Parses the capture at `index`; `None` if it is missing or does not parse.
    pub fn parse<T: FromStr>(&self, index: usize) -> Option<T> {
        self.get(index)?.parse().ok()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl Deref for Captures {
    type Target = [String];

    fn deref(&self) -> &[String] {
        &self.0
    }
}

impl IntoIterator for Captures {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
