//! The routing engine: the context a route tree runs against.
//!
//! # Control flow
//!
//! A route tree is ordinary nested code. Each guarded block is a call:
//!
//! ```text
//! r.on("users", |r, _| {                 branch: consumes /users, runs the body
//!     r.is(Matcher::placeholder("id"),   leaf: /<id> and nothing after it
//!          |_, caps| format!("user {}", &caps[0]))?;
//!     r.get((), |_, _| "all users")      leaf gated on GET
//! })?;
//! ```
//!
//! Every call returns a [`Flow`]. `Flow::Break` carries the finished response
//! (or the error that ended the dispatch) and `?` hands it straight up to the
//! dispatch boundary in [`Router::call`](crate::Router::call), skipping every
//! sibling and every line after the call site. `Flow::Continue` means "not
//! me": the next sibling gets its turn.
//!
//! # Cursor discipline
//!
//! Each guarded call snapshots the path cursor on entry and restores it on
//! return, whatever happened in between. A branch only consumes path for as
//! long as its own body runs; siblings always see the path their parent saw.

use std::ops::ControlFlow;

use http::StatusCode;
use tracing::trace;

use crate::captures::{CaptureScope, Captures};
use crate::cursor::PathCursor;
use crate::error::Error;
use crate::handler::{IntoOutcome, Outcome};
use crate::matcher::{IntoMatchers, Matcher};
use crate::method::Method;
use crate::request::Request;
use crate::response::{Response, ResponseBuilder};
use crate::router::{Config, Router};

/// Result of a guarded call: keep routing, or leave the dispatch.
pub type Flow = ControlFlow<Halt>;

/// Why a dispatch is ending early.
#[derive(Debug)]
pub struct Halt(pub(crate) Exit);

#[derive(Debug)]
pub(crate) enum Exit {
    Respond(Response),
    Fail(Error),
}

impl Halt {
    /// The response this halt carries, unless the dispatch is failing.
    pub fn response(&self) -> Option<&Response> {
        match &self.0 {
            Exit::Respond(res) => Some(res),
            Exit::Fail(_) => None,
        }
    }
}

impl From<Response> for Halt {
    fn from(res: Response) -> Self {
        Self(Exit::Respond(res))
    }
}

#[derive(Clone, Copy, Eq, PartialEq)]
enum Group {
    /// Falls through when its body does not decide.
    Branch,
    /// Always ends the dispatch once matched.
    Leaf,
}

/// Per-dispatch routing state: the request, the path cursor, the capture
/// scope and the response being assembled.
///
/// One is created for every dispatch and dropped when it ends; nothing in it
/// outlives the request.
pub struct Route<'a> {
    request: &'a Request,
    config: &'a Config,
    pub(crate) cursor: PathCursor,
    pub(crate) captures: CaptureScope,
    response: ResponseBuilder,
}

impl<'a> Route<'a> {
    pub(crate) fn new(request: &'a Request, config: &'a Config, cursor: PathCursor) -> Self {
        Self {
            request,
            config,
            cursor,
            captures: CaptureScope::default(),
            response: ResponseBuilder::default(),
        }
    }

    pub fn request(&self) -> &'a Request { self.request }
    pub(crate) fn config(&self) -> &'a Config { self.config }

    /// The response being assembled.
    pub fn response(&mut self) -> &mut ResponseBuilder { &mut self.response }

    pub fn matched_path(&self) -> &str { self.cursor.matched() }
    pub fn remaining_path(&self) -> &str { self.cursor.remaining() }

    pub fn is_get(&self) -> bool {
        self.request.method() == Method::Get
    }

    /// Appends to the response body without ending the dispatch.
    pub fn write(&mut self, chunk: impl AsRef<[u8]>) {
        self.response.write(chunk);
    }

    // ── Guarded blocks ────────────────────────────────────────────────────────

    /// Branch: runs `body` if every matcher matches, with the path they
    /// consumed removed for the duration of `body`.
    ///
    /// If the body returns a value ([`IntoOutcome`]) other than a pass, the
    /// dispatch ends with it. If it passes, routing continues with the next
    /// sibling and the cursor restored.
    pub fn on<M, F, R>(&mut self, matchers: M, body: F) -> Flow
    where
        M: IntoMatchers,
        F: FnOnce(&mut Self, Captures) -> R,
        R: IntoOutcome,
    {
        self.if_match(matchers.into_matchers(), Group::Branch, body)
    }

    /// Leaf: like [`on`](Self::on), but the matchers must consume the whole
    /// remaining path, and once they do the dispatch always ends here.
    pub fn is<M, F, R>(&mut self, matchers: M, body: F) -> Flow
    where
        M: IntoMatchers,
        F: FnOnce(&mut Self, Captures) -> R,
        R: IntoOutcome,
    {
        let mut matchers = matchers.into_matchers();
        matchers.push(Matcher::Terminal);
        self.if_match(matchers, Group::Leaf, body)
    }

    /// Leaf gated on the request method. With `()` as matchers it matches
    /// only an empty remaining path.
    pub fn verb<M, F, R>(&mut self, method: Method, matchers: M, body: F) -> Flow
    where
        M: IntoMatchers,
        F: FnOnce(&mut Self, Captures) -> R,
        R: IntoOutcome,
    {
        if self.request.method() != method {
            return Flow::Continue(());
        }
        self.is(matchers, body)
    }

    pub fn get<M, F, R>(&mut self, matchers: M, body: F) -> Flow
    where
        M: IntoMatchers,
        F: FnOnce(&mut Self, Captures) -> R,
        R: IntoOutcome,
    {
        self.verb(Method::Get, matchers, body)
    }

    pub fn post<M, F, R>(&mut self, matchers: M, body: F) -> Flow
    where
        M: IntoMatchers,
        F: FnOnce(&mut Self, Captures) -> R,
        R: IntoOutcome,
    {
        self.verb(Method::Post, matchers, body)
    }

    pub fn put<M, F, R>(&mut self, matchers: M, body: F) -> Flow
    where
        M: IntoMatchers,
        F: FnOnce(&mut Self, Captures) -> R,
        R: IntoOutcome,
    {
        self.verb(Method::Put, matchers, body)
    }

    pub fn patch<M, F, R>(&mut self, matchers: M, body: F) -> Flow
    where
        M: IntoMatchers,
        F: FnOnce(&mut Self, Captures) -> R,
        R: IntoOutcome,
    {
        self.verb(Method::Patch, matchers, body)
    }

    pub fn delete<M, F, R>(&mut self, matchers: M, body: F) -> Flow
    where
        M: IntoMatchers,
        F: FnOnce(&mut Self, Captures) -> R,
        R: IntoOutcome,
    {
        self.verb(Method::Delete, matchers, body)
    }

    /// `GET` with exactly `/` left to match.
    pub fn root<F, R>(&mut self, body: F) -> Flow
    where
        F: FnOnce(&mut Self, Captures) -> R,
        R: IntoOutcome,
    {
        if self.cursor.remaining() != "/" || !self.is_get() {
            return Flow::Continue(());
        }
        self.if_match(Vec::new(), Group::Leaf, body)
    }

    // ── Exits ─────────────────────────────────────────────────────────────────

    /// Ends the dispatch with the response assembled so far.
    pub fn halt(&mut self) -> Flow {
        trace!(matched = self.cursor.matched(), "dispatch halted");
        Flow::Break(Halt(Exit::Respond(self.finish())))
    }

    /// Ends the dispatch with `response`, discarding what was assembled.
    pub fn halt_with(&mut self, response: Response) -> Flow {
        trace!(matched = self.cursor.matched(), status = response.status().as_u16(), "dispatch halted");
        Flow::Break(Halt(Exit::Respond(response)))
    }

    /// `302 Found` to `location`.
    pub fn redirect(&mut self, location: &str) -> Flow {
        self.redirect_with(location, StatusCode::FOUND)
    }

    pub fn redirect_with(&mut self, location: &str, code: StatusCode) -> Flow {
        self.response.redirect(location, code);
        self.halt()
    }

    /// Hands the rest of the path to another router and ends the dispatch
    /// with whatever it answers, `404` included. The other router sees the
    /// path matched so far as already consumed.
    pub fn run(&mut self, app: &Router) -> Flow {
        match app.call_at(self.request, self.cursor.clone()) {
            Ok(res) => self.halt_with(res),
            Err(e) => Flow::Break(Halt(Exit::Fail(e))),
        }
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    /// Runs `f` and puts the path cursor back where it was, whatever `f` did.
    pub fn with_restore<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let mark = self.cursor.mark();
        let out = f(self);
        self.cursor.restore(mark);
        out
    }

    fn if_match<F, R>(&mut self, matchers: Vec<Matcher>, group: Group, body: F) -> Flow
    where
        F: FnOnce(&mut Self, Captures) -> R,
        R: IntoOutcome,
    {
        self.with_restore(|route| {
            route.captures.reset();
            match route.match_all(&matchers) {
                Ok(true) => {
                    let captures = route.captures.snapshot();
                    let outcome = body(route, captures).into_outcome();
                    route.settle(outcome, group)
                }
                Ok(false) => Flow::Continue(()),
                Err(e) => Flow::Break(Halt(Exit::Fail(e))),
            }
        })
    }

    fn settle(&mut self, outcome: Outcome, group: Group) -> Flow {
        match outcome {
            Outcome::Exit(halt) => Flow::Break(halt),
            Outcome::Body(body) => {
                self.response.write(body);
                self.halt()
            }
            Outcome::Status(code) => {
                self.response.status(code);
                self.halt()
            }
            Outcome::Pass if group == Group::Leaf => self.halt(),
            Outcome::Pass => Flow::Continue(()),
        }
    }

    pub(crate) fn finish(&mut self) -> Response {
        self.response.finish_with(&self.config.content_type)
    }
}
