//! Routing configuration and the dispatch entry point.
//!
//! A [`Router`] is a route tree plus everything the tree's matchers need at
//! run time: the compiled-pattern cache, per-name placeholder patterns, named
//! conditions and the default content type. Build it once at startup; clone it
//! freely (it is two `Arc`s) and share it across threads.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::cache::PatternCache;
use crate::cursor::PathCursor;
use crate::error::Error;
use crate::handler::{self, IntoOutcome, Outcome, Tree};
use crate::method::Method;
use crate::pattern::{self, Anchor, CompiledPattern, PatternKind, SymbolTable};
use crate::request::Request;
use crate::response::{Response, DEFAULT_CONTENT_TYPE};
use crate::route::{Exit, Flow, Halt, Route};

type ConditionFn = Arc<dyn Fn(&Request, &str) -> bool + Send + Sync + 'static>;

/// Everything a dispatch reads but never writes, apart from the cache.
pub(crate) struct Config {
    cache: PatternCache,
    symbols: SymbolTable,
    pub(crate) conditions: HashMap<String, ConditionFn>,
    pub(crate) content_type: String,
}

impl Config {
    pub(crate) fn pattern(
        &self,
        kind: PatternKind,
        source: &str,
        anchor: Anchor,
    ) -> Result<Arc<CompiledPattern>, Error> {
        self.cache.fetch(kind, source, anchor, || {
            pattern::compile(kind, source, &self.symbols, anchor)
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache: PatternCache::default(),
            symbols: SymbolTable::default(),
            conditions: HashMap::new(),
            content_type: DEFAULT_CONTENT_TYPE.to_owned(),
        }
    }
}

/// The application router.
///
/// ```rust
/// use sendero::{Flow, Matcher, Method, Router, StatusCode};
///
/// let app = Router::new(|r| {
///     r.root(|_, _| "home")?;
///     r.on("users", |r, _| {
///         r.is(Matcher::placeholder("id"), |_, caps| format!("user {}", &caps[0]))
///     })?;
///     Flow::Continue(())
/// });
///
/// let res = app.dispatch(Method::Get, "/users/42").unwrap();
/// assert_eq!(res.body_str(), Some("user 42"));
///
/// let res = app.dispatch(Method::Get, "/nope").unwrap();
/// assert_eq!(res.status(), StatusCode::NOT_FOUND);
/// ```
#[derive(Clone)]
pub struct Router {
    config: Arc<Config>,
    tree: Tree,
}

impl Router {
    /// A router with default configuration.
    pub fn new<F, R>(tree: F) -> Self
    where
        F: Fn(&mut Route<'_>) -> R + Send + Sync + 'static,
        R: IntoOutcome,
    {
        Self::builder().build(tree)
    }

    pub fn builder() -> RouterBuilder {
        RouterBuilder { config: Config::default() }
    }

    /// Routes `method` + `target` (path with optional `?query`).
    pub fn dispatch(&self, method: Method, target: &str) -> Result<Response, Error> {
        self.call(&Request::new(method, target))
    }

    /// Routes one request and produces one response.
    ///
    /// `Err` means the route tree is misconfigured or a route body failed;
    /// a request no route accepts still gets `Ok` (usually a 404).
    pub fn call(&self, request: &Request) -> Result<Response, Error> {
        self.call_at(request, PathCursor::new(request.path()))
    }

    pub(crate) fn call_at(&self, request: &Request, cursor: PathCursor) -> Result<Response, Error> {
        let mut route = Route::new(request, &self.config, cursor);
        let flow = match self.tree.route(&mut route) {
            Outcome::Exit(halt) => Flow::Break(halt),
            Outcome::Body(body) => {
                route.write(body);
                Flow::Continue(())
            }
            Outcome::Status(code) => {
                route.response().status(code);
                Flow::Continue(())
            }
            Outcome::Pass => Flow::Continue(()),
        };

        match flow {
            Flow::Break(Halt(Exit::Respond(res))) => Ok(res),
            Flow::Break(Halt(Exit::Fail(e))) => Err(e),
            Flow::Continue(()) => {
                let res = route.finish();
                debug!(
                    method = %request.method(),
                    path = request.path(),
                    status = res.status().as_u16(),
                    "no route halted, sending default response"
                );
                Ok(res)
            }
        }
    }

    /// Number of patterns compiled so far.
    pub fn cached_patterns(&self) -> usize {
        self.config.cache.len()
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("cached_patterns", &self.cached_patterns())
            .field("conditions", &self.config.conditions.keys().collect::<Vec<_>>())
            .field("content_type", &self.config.content_type)
            .finish_non_exhaustive()
    }
}

// ── RouterBuilder ─────────────────────────────────────────────────────────────

/// Configures a [`Router`]. Obtain via [`Router::builder`].
pub struct RouterBuilder {
    config: Config,
}

impl fmt::Debug for RouterBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterBuilder")
            .field("conditions", &self.config.conditions.keys().collect::<Vec<_>>())
            .field("content_type", &self.config.content_type)
            .finish_non_exhaustive()
    }
}

impl RouterBuilder {
    /// Overrides the pattern for placeholders called `name`, both
    /// [`Matcher::Placeholder`](crate::Matcher::Placeholder) and `:name`
    /// inside literals. The whole pattern becomes one capture.
    ///
    /// Fails if `pattern` is not a valid regular expression.
    pub fn symbol(mut self, name: &str, pattern: &str) -> Result<Self, Error> {
        self.config.symbols.insert(name, pattern)?;
        Ok(self)
    }

    /// Registers a condition for [`Condition::Named`](crate::Condition::Named).
    /// `check` receives the request and the condition's value.
    pub fn condition<F>(mut self, name: &str, check: F) -> Self
    where
        F: Fn(&Request, &str) -> bool + Send + Sync + 'static,
    {
        self.config.conditions.insert(name.to_owned(), Arc::new(check));
        self
    }

    /// Content type for responses that have a body but no `content-type`.
    pub fn content_type(mut self, value: &str) -> Self {
        self.config.content_type = value.to_owned();
        self
    }

    pub fn build<F, R>(self, tree: F) -> Router
    where
        F: Fn(&mut Route<'_>) -> R + Send + Sync + 'static,
        R: IntoOutcome,
    {
        Router {
            config: Arc::new(self.config),
            tree: handler::erase(tree),
        }
    }
}
