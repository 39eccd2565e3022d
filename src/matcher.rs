//! Matcher values.
//!
//! A route tree guards each branch with a list of [`Matcher`]s. Most of the
//! time they come from plain values through [`IntoMatchers`]:
//!
//! ```text
//! "users"                  Literal       one segment, exactly
//! "posts/:year/:slug"      Literal       placeholders capture a segment each
//! Matcher::placeholder("id")             one segment, pattern overridable per name
//! Regex::new(r"(\d+)")     Pattern       all groups captured
//! Matcher::any([..])       Any           first alternative that matches
//! Condition::Param("q")    All           request conditions, all must hold
//! Matcher::pred(|req| ..)  Predicate     never touches the path
//! TERM                     Terminal      nothing left to consume
//! true / false             Raw           a decision made elsewhere
//! ```
//!
//! Evaluation lives in `eval.rs`.

use std::fmt;

use regex::Regex;

use crate::method::Method;
use crate::request::Request;

/// What a [`Matcher::Custom`] closure reports after matching.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Consumed {
    /// Bytes of the remaining path to consume. What is left afterwards must
    /// be empty or start with `/`.
    pub len: usize,
    pub captures: Vec<String>,
}

type PredicateFn = Box<dyn Fn(&Request) -> bool + Send + Sync>;
type CustomFn = Box<dyn Fn(&str) -> Option<Consumed> + Send + Sync>;

/// One matcher in a route guard.
pub enum Matcher {
    /// Literal path text; `:name` placeholders capture one segment each.
    /// The empty literal matches only an empty remaining path.
    Literal(String),
    /// A single-segment capture, like one embedded `:name`.
    Placeholder(String),
    /// A regular expression anchored at the start of the remaining path and
    /// ending on a segment boundary. Every group is a capture. The regex runs
    /// as built, so `RegexBuilder` settings such as case insensitivity apply.
    Pattern(Regex),
    /// Conjunction: every condition must hold, checked in order.
    All(Vec<Condition>),
    /// Disjunction: the first alternative that matches wins. A winning
    /// [`Literal`](Self::Literal) also captures its own text.
    Any(Vec<Matcher>),
    /// A check on the request that consumes nothing.
    Predicate(PredicateFn),
    /// A closure handed the remaining path; it decides how much to consume.
    Custom(CustomFn),
    /// Matches only when nothing is left to consume.
    Terminal,
    /// A precomputed decision.
    Raw(bool),
}

/// The terminal matcher: nothing left to consume.
pub const TERM: Matcher = Matcher::Terminal;

impl Matcher {
    pub fn literal(text: impl Into<String>) -> Self {
        Self::Literal(text.into())
    }

    pub fn placeholder(name: impl Into<String>) -> Self {
        Self::Placeholder(name.into())
    }

    pub fn any(alternatives: impl IntoIterator<Item = Matcher>) -> Self {
        Self::Any(alternatives.into_iter().collect())
    }

    pub fn all(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Self::All(conditions.into_iter().collect())
    }

    pub fn pred<F>(f: F) -> Self
    where
        F: Fn(&Request) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Box::new(f))
    }

    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&str) -> Option<Consumed> + Send + Sync + 'static,
    {
        Self::Custom(Box::new(f))
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(s)     => f.debug_tuple("Literal").field(s).finish(),
            Self::Placeholder(s) => f.debug_tuple("Placeholder").field(s).finish(),
            Self::Pattern(re)    => f.debug_tuple("Pattern").field(&re.as_str()).finish(),
            Self::All(conds)     => f.debug_tuple("All").field(conds).finish(),
            Self::Any(alts)      => f.debug_tuple("Any").field(alts).finish(),
            Self::Predicate(_)   => f.write_str("Predicate(..)"),
            Self::Custom(_)      => f.write_str("Custom(..)"),
            Self::Terminal       => f.write_str("Terminal"),
            Self::Raw(b)         => f.debug_tuple("Raw").field(b).finish(),
        }
    }
}

/// A named sub-matcher inside [`Matcher::All`].
#[derive(Debug)]
pub enum Condition {
    /// The request method is one of these.
    Method(Vec<Method>),
    /// The query parameter is present. Captures its decoded value.
    Param(String),
    /// The header is present. Captures its value.
    Header(String),
    /// The `host` header, port stripped, equals this (ASCII case-insensitive).
    Host(String),
    /// The rest of the path is `/<stem>.<ext>`. Consumes it, captures `stem`.
    Extension(String),
    /// A nested matcher list, all of which must match.
    All(Vec<Matcher>),
    /// A condition registered on the router with
    /// [`RouterBuilder::condition`](crate::RouterBuilder::condition).
    Named { name: String, value: String },
}

impl Condition {
    pub fn named(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Named { name: name.into(), value: value.into() }
    }
}

// ── Conversions ───────────────────────────────────────────────────────────────

impl From<&str> for Matcher {
    fn from(text: &str) -> Self { Self::Literal(text.to_owned()) }
}

impl From<String> for Matcher {
    fn from(text: String) -> Self { Self::Literal(text) }
}

impl From<Regex> for Matcher {
    fn from(re: Regex) -> Self { Self::Pattern(re) }
}

impl From<bool> for Matcher {
    fn from(b: bool) -> Self { Self::Raw(b) }
}

impl From<Condition> for Matcher {
    fn from(cond: Condition) -> Self { Self::All(vec![cond]) }
}

/// A guard: the list of matchers a route body is conditional on.
///
/// Implemented for single matcher-like values, `()` (no matchers), tuples of
/// up to five matcher-like values, arrays and `Vec`s of [`Matcher`].
pub trait IntoMatchers {
    fn into_matchers(self) -> Vec<Matcher>;
}

impl IntoMatchers for () {
    fn into_matchers(self) -> Vec<Matcher> { Vec::new() }
}

impl IntoMatchers for Vec<Matcher> {
    fn into_matchers(self) -> Vec<Matcher> { self }
}

impl<const N: usize> IntoMatchers for [Matcher; N] {
    fn into_matchers(self) -> Vec<Matcher> { self.into() }
}

macro_rules! single {
    ($($ty:ty),*) => {$(
        impl IntoMatchers for $ty {
            fn into_matchers(self) -> Vec<Matcher> { vec![self.into()] }
        }
    )*};
}

single!(Matcher, &str, String, Regex, bool, Condition);

macro_rules! tuple {
    ($($name:ident),+) => {
        impl<$($name: Into<Matcher>),+> IntoMatchers for ($($name,)+) {
            #[allow(non_snake_case)]
            fn into_matchers(self) -> Vec<Matcher> {
                let ($($name,)+) = self;
                vec![$($name.into()),+]
            }
        }
    };
}

tuple!(A);
tuple!(A, B);
tuple!(A, B, C);
tuple!(A, B, C, D);
tuple!(A, B, C, D, E);
