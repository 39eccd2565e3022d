//! # sendero
//!
//! A routing tree for HTTP services. Routes are nested code, not a table.
//!
//! ## The model
//!
//! A route tree is one closure. Inside it, every guarded block tries its
//! matchers against what is left of the request path and, if they all match,
//! runs its body with that part of the path consumed. The first block that
//! produces a response ends the dispatch; the rest of the tree never runs.
//!
//! - **Branches** ([`Route::on`]) consume a prefix and fall through when their
//!   body has nothing to say.
//! - **Leaves** ([`Route::is`], [`Route::get`], [`Route::post`], …,
//!   [`Route::root`]) must consume the whole path and always end the dispatch.
//! - **Matchers** ([`Matcher`]) are literals with `:placeholders`, regexes,
//!   request conditions, alternatives and plain predicates. Captured values
//!   reach the body positionally as [`Captures`].
//!
//! A dispatch no block answers ends with whatever was written so far:
//! `404` if nothing was, `200` otherwise.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use sendero::{Condition, Flow, Matcher, Router, Server, StatusCode};
//!
//! #[tokio::main]
//! async fn main() {
//!     let app = Router::new(|r| {
//!         r.root(|_, _| "home")?;
//!
//!         r.on("users", |r, _| {
//!             r.get((), |_, _| "all users")?;
//!             r.get(Matcher::placeholder("id"), |_, caps| format!("user {}", &caps[0]))?;
//!             r.post((), |_, _| StatusCode::CREATED)
//!         })?;
//!
//!         r.get(("search", Condition::Param("q".into())), |_, caps| {
//!             format!("results for {}", &caps[0])
//!         })?;
//!
//!         Flow::Continue(())
//!     });
//!
//!     Server::bind(([0, 0, 0, 0], 3000).into()).serve(app).await.unwrap();
//! }
//! ```

mod cache;
mod captures;
mod cursor;
mod error;
mod eval;
mod handler;
mod matcher;
mod method;
mod pattern;
mod request;
mod response;
mod route;
mod router;
mod server;

pub use captures::Captures;
pub use error::Error;
pub use handler::{IntoOutcome, Outcome};
pub use matcher::{Condition, Consumed, IntoMatchers, Matcher, TERM};
pub use method::Method;
pub use pattern::{PLACEHOLDER_LEAD, SEGMENT};
pub use request::Request;
pub use response::{Response, ResponseBuilder, DEFAULT_CONTENT_TYPE};
pub use route::{Flow, Halt, Route};
pub use router::{Router, RouterBuilder};
pub use server::Server;

pub use http::StatusCode;
pub use regex::Regex;
