//! Response assembly.
//!
//! A dispatch owns one [`ResponseBuilder`]. Route bodies write into it, set a
//! status or headers, and when the dispatch ends it is finished into a
//! [`Response`]: plain data the calling layer turns into bytes on the wire.

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::StatusCode;
use http_body_util::Full;
use tracing::warn;

/// Content type used when a body was written but no `content-type` was set.
pub const DEFAULT_CONTENT_TYPE: &str = "text/html; charset=utf-8";

// ── Response ─────────────────────────────────────────────────────────────────

/// A finished HTTP response.
///
/// ```rust
/// use sendero::{Response, StatusCode};
///
/// let res = Response::builder()
///     .status(StatusCode::CREATED)
///     .header("location", "/users/42")
///     .write("created")
///     .finish();
/// assert_eq!(res.status(), StatusCode::CREATED);
/// assert_eq!(res.header("content-length"), Some("7"));
/// ```
#[derive(Clone, Debug)]
pub struct Response {
    pub(crate) status: StatusCode,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Bytes,
}

impl Response {
    /// Response with the given status and no body.
    pub fn with_status(code: StatusCode) -> Self {
        Self {
            status: code,
            headers: vec![("content-length".to_owned(), "0".to_owned())],
            body: Bytes::new(),
        }
    }

    /// An empty assembler. Status stays unset until a body is written or
    /// [`ResponseBuilder::status`] is called.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder::default()
    }

    pub fn status(&self) -> StatusCode { self.status }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn body(&self) -> &Bytes { &self.body }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The body as UTF-8, if it is.
    pub fn body_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }

    pub(crate) fn into_inner(self) -> http::Response<Full<Bytes>> {
        let mut res = http::Response::new(Full::new(self.body));
        *res.status_mut() = self.status;
        for (name, value) in self.headers {
            match (HeaderName::try_from(name.as_str()), HeaderValue::try_from(value.as_str())) {
                (Ok(name), Ok(value)) => {
                    res.headers_mut().append(name, value);
                }
                _ => warn!(header = %name, "dropping header that is not valid on the wire"),
            }
        }
        res
    }
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Mutable response assembler for one dispatch.
///
/// Methods take `&mut self` so route bodies can reach it through
/// [`Route::response`](crate::Route::response) and keep writing across
/// nested matchers.
#[derive(Debug, Default)]
pub struct ResponseBuilder {
    status: Option<StatusCode>,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl ResponseBuilder {
    pub fn status(&mut self, code: StatusCode) -> &mut Self {
        self.status = Some(code);
        self
    }

    /// Sets a header, replacing any earlier value under the same name.
    pub fn header(&mut self, name: &str, value: &str) -> &mut Self {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    /// Appends to the body.
    pub fn write(&mut self, chunk: impl AsRef<[u8]>) -> &mut Self {
        self.body.extend_from_slice(chunk.as_ref());
        self
    }

    /// Sets `location` and the redirect status.
    pub fn redirect(&mut self, location: &str, code: StatusCode) -> &mut Self {
        self.header("location", location).status(code)
    }

    /// The explicitly set status, if any.
    pub fn current_status(&self) -> Option<StatusCode> { self.status }

    /// `true` once anything has been written to the body.
    pub fn is_written(&self) -> bool { !self.body.is_empty() }

    /// Finishes with [`DEFAULT_CONTENT_TYPE`], leaving this assembler empty.
    pub fn finish(&mut self) -> Response {
        self.finish_with(DEFAULT_CONTENT_TYPE)
    }

    /// Finishes the response, leaving this assembler empty.
    ///
    /// With no explicit status the response is `404 Not Found` when nothing
    /// was written and `200 OK` otherwise. A non-empty body gets
    /// `content_type` unless a `content-type` header is already set.
    /// `content-length` always reflects the body.
    pub(crate) fn finish_with(&mut self, content_type: &str) -> Response {
        let Self { status, mut headers, body } = std::mem::take(self);
        let status = status.unwrap_or(if body.is_empty() {
            StatusCode::NOT_FOUND
        } else {
            StatusCode::OK
        });

        let has = |headers: &[(String, String)], name: &str| {
            headers.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
        };
        if !body.is_empty() && !has(&headers, "content-type") {
            headers.insert(0, ("content-type".to_owned(), content_type.to_owned()));
        }
        headers.retain(|(k, _)| !k.eq_ignore_ascii_case("content-length"));
        headers.push(("content-length".to_owned(), body.len().to_string()));

        Response { status, headers, body: Bytes::from(body) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unwritten_finishes_as_not_found() {
        let res = Response::builder().finish();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert!(res.body().is_empty());
        assert_eq!(res.header("content-length"), Some("0"));
        assert_eq!(res.header("content-type"), None);
    }

    #[test]
    fn test_written_finishes_as_ok() {
        let mut builder = Response::builder();
        builder.write("hello, ").write("world");
        assert!(builder.is_written());

        let res = builder.finish();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.body_str(), Some("hello, world"));
        assert_eq!(res.header("content-length"), Some("12"));
        assert_eq!(res.header("content-type"), Some(DEFAULT_CONTENT_TYPE));
        assert!(!builder.is_written());
    }

    #[test]
    fn test_explicit_status_and_content_type_win() {
        let res = Response::builder()
            .status(StatusCode::ACCEPTED)
            .header("Content-Type", "application/json")
            .write("{}")
            .finish();
        assert_eq!(res.status(), StatusCode::ACCEPTED);
        assert_eq!(res.header("content-type"), Some("application/json"));
        assert_eq!(res.headers().iter().filter(|(k, _)| k.eq_ignore_ascii_case("content-type")).count(), 1);
    }

    #[test]
    fn test_redirect() {
        let res = Response::builder().redirect("/login", StatusCode::FOUND).finish();
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(res.header("location"), Some("/login"));
    }

    #[test]
    fn test_into_inner_drops_invalid_headers() {
        let res = Response::builder()
            .header("x-ok", "1")
            .header("bad header", "2")
            .write("x")
            .finish()
            .into_inner();
        assert_eq!(res.status(), http::StatusCode::OK);
        assert_eq!(res.headers()["x-ok"], "1");
        assert_eq!(res.headers()["content-length"], "1");
        assert!(res.headers().get("bad header").is_none());
    }
}
