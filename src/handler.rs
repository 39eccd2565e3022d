//! Route body results and type erasure of the route tree.
//!
//! # What a route body may return
//!
//! A body passed to [`Route::on`](crate::Route::on), [`Route::is`](crate::Route::is)
//! or a verb matcher can return anything implementing [`IntoOutcome`]:
//!
//! ```text
//! Flow                   nested routing result: Break exits, Continue passes
//! ()  / None             nothing to say: a branch falls through, a leaf halts
//! &str / String / Vec<u8>  written to the body, then the dispatch halts
//! StatusCode             sets the status, then the dispatch halts
//! Response               replaces the response, then the dispatch halts
//! Result<T, E>           Ok(t) as above, Err(e) ends the dispatch with Error::Handler
//! ```
//!
//! # How the tree is stored
//!
//! The [`Router`](crate::Router) holds the application's route-tree closure
//! behind a trait object so that routers built from different closure types
//! share one concrete type:
//!
//! ```text
//! Router::new(|r| { … })          ← user writes this
//!        ↓
//! Arc::new(FnTree(closure))       ← stored as Tree = Arc<dyn ErasedTree>
//!        ↓
//! tree.route(&mut route)          ← once per dispatch, one vtable call
//! ```

use std::sync::Arc;

use http::StatusCode;

use crate::error::Error;
use crate::response::Response;
use crate::route::{Exit, Flow, Halt, Route};

/// What a route body asked the routing engine to do.
#[derive(Debug)]
pub enum Outcome {
    /// No decision; keep routing.
    Pass,
    /// Append to the body and halt.
    Body(Vec<u8>),
    /// Set the status and halt.
    Status(StatusCode),
    /// Leave the dispatch with this exit.
    Exit(Halt),
}

/// Conversion of a route body's return value into an [`Outcome`].
///
/// Implement it on your own types to return them straight from bodies.
pub trait IntoOutcome {
    fn into_outcome(self) -> Outcome;
}

impl IntoOutcome for Outcome {
    fn into_outcome(self) -> Outcome { self }
}

impl IntoOutcome for () {
    fn into_outcome(self) -> Outcome { Outcome::Pass }
}

impl IntoOutcome for Flow {
    fn into_outcome(self) -> Outcome {
        match self {
            Flow::Continue(()) => Outcome::Pass,
            Flow::Break(halt) => Outcome::Exit(halt),
        }
    }
}

impl IntoOutcome for &str {
    fn into_outcome(self) -> Outcome { Outcome::Body(self.as_bytes().to_vec()) }
}

impl IntoOutcome for String {
    fn into_outcome(self) -> Outcome { Outcome::Body(self.into_bytes()) }
}

impl IntoOutcome for Vec<u8> {
    fn into_outcome(self) -> Outcome { Outcome::Body(self) }
}

/// Return a status directly from a body: `return StatusCode::NO_CONTENT`.
impl IntoOutcome for StatusCode {
    fn into_outcome(self) -> Outcome { Outcome::Status(self) }
}

impl IntoOutcome for Response {
    fn into_outcome(self) -> Outcome { Outcome::Exit(Halt(Exit::Respond(self))) }
}

impl<T: IntoOutcome> IntoOutcome for Option<T> {
    fn into_outcome(self) -> Outcome {
        self.map_or(Outcome::Pass, IntoOutcome::into_outcome)
    }
}

impl<T, E> IntoOutcome for Result<T, E>
where
    T: IntoOutcome,
    E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
{
    fn into_outcome(self) -> Outcome {
        match self {
            Ok(value) => value.into_outcome(),
            Err(e) => Outcome::Exit(Halt(Exit::Fail(Error::Handler(e.into())))),
        }
    }
}

// ── Tree erasure ──────────────────────────────────────────────────────────────

/// Internal dispatch interface for a stored route tree.
pub(crate) trait ErasedTree: Send + Sync + 'static {
    fn route(&self, route: &mut Route<'_>) -> Outcome;
}

/// The application's route tree, shared by every concurrent dispatch.
pub(crate) type Tree = Arc<dyn ErasedTree>;

/// Newtype that holds the concrete tree closure `F` and implements
/// [`ErasedTree`], bridging the typed closure to the trait object.
struct FnTree<F>(F);

impl<F, R> ErasedTree for FnTree<F>
where
    F: Fn(&mut Route<'_>) -> R + Send + Sync + 'static,
    R: IntoOutcome,
{
    fn route(&self, route: &mut Route<'_>) -> Outcome {
        (self.0)(route).into_outcome()
    }
}

pub(crate) fn erase<F, R>(tree: F) -> Tree
where
    F: Fn(&mut Route<'_>) -> R + Send + Sync + 'static,
    R: IntoOutcome,
{
    Arc::new(FnTree(tree))
}
