//! Pattern compiler.
//!
//! Every literal, placeholder and extension matcher ends up as one
//! `CompiledPattern`: an expression anchored at the start of the remaining
//! path, requiring a leading `/`, the matcher body, and then a segment
//! boundary. A user-supplied `Regex` is never recompiled; `match_regex`
//! runs it as built, so its builder settings hold.
//!
//! ```text
//! Segment:  \A/(?:body)(/|\z)     prefix match, stops before the next '/'
//! End:      \A/(?:body)()\z       must consume everything
//! ```
//!
//! The trailing group is the boundary marker. Consumption stops at its start,
//! so the `/` that separates segments is left in the remaining path. It is a
//! real group rather than a look-ahead (which `regex` does not support), and
//! it is never reported as a capture.

use std::collections::HashMap;

use regex::Regex;

use crate::error::Error;

/// Character that introduces a placeholder inside a literal, as in `/users/:id`.
pub const PLACEHOLDER_LEAD: char = ':';

/// Default placeholder body: one non-empty path segment.
pub const SEGMENT: &str = "[^/]+";

/// Where a compiled pattern has to stop.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) enum Anchor {
    /// Followed by `/` or the end of the path.
    Segment,
    /// Followed by the end of the path only.
    End,
}

/// The matcher kind a pattern was compiled from. Part of the cache key, so a
/// literal `"id"` and a placeholder named `id` never collide.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) enum PatternKind {
    Literal,
    Placeholder,
    Extension,
}

/// A successful prefix match.
#[derive(Debug, PartialEq)]
pub(crate) struct PrefixMatch {
    /// Bytes of the remaining path the match consumed.
    pub len: usize,
    /// Capture groups in order. Groups that did not participate are empty.
    pub captures: Vec<String>,
}

#[derive(Debug)]
pub(crate) struct CompiledPattern {
    regex: Regex,
    boundary: usize,
}

impl CompiledPattern {
    fn wrap(body: &str, anchor: Anchor) -> Result<Self, Error> {
        let source = match anchor {
            Anchor::Segment => format!(r"\A/(?:{body})(/|\z)"),
            Anchor::End => format!(r"\A/(?:{body})()\z"),
        };
        let regex = Regex::new(&source)
            .map_err(|source| Error::Pattern { pattern: body.to_owned(), source })?;
        let boundary = regex.captures_len() - 1;
        Ok(Self { regex, boundary })
    }

    /// Matches against the start of `remaining`.
    pub(crate) fn match_prefix(&self, remaining: &str) -> Option<PrefixMatch> {
        let caps = self.regex.captures(remaining)?;
        let len = caps.get(self.boundary)?.start();
        let captures = (1..self.boundary)
            .map(|i| caps.get(i).map_or_else(String::new, |m| m.as_str().to_owned()))
            .collect();
        Some(PrefixMatch { len, captures })
    }
}

// ── Symbol table ──────────────────────────────────────────────────────────────

/// Per-name placeholder bodies, e.g. `id → \d+`.
#[derive(Clone, Debug, Default)]
pub(crate) struct SymbolTable {
    patterns: HashMap<String, String>,
}

impl SymbolTable {
    /// Registers `pattern` for placeholders called `name`, rejecting patterns
    /// that do not compile on their own.
    pub(crate) fn insert(&mut self, name: &str, pattern: &str) -> Result<(), Error> {
        Regex::new(&format!(r"\A(?:{pattern})\z"))
            .map_err(|source| Error::Pattern { pattern: pattern.to_owned(), source })?;
        self.patterns.insert(name.to_owned(), pattern.to_owned());
        Ok(())
    }

    fn group(&self, name: &str) -> String {
        let body = self.patterns.get(name).map_or(SEGMENT, String::as_str);
        format!("({body})")
    }
}

// ── Compilation ───────────────────────────────────────────────────────────────

pub(crate) fn compile(
    kind: PatternKind,
    source: &str,
    symbols: &SymbolTable,
    anchor: Anchor,
) -> Result<CompiledPattern, Error> {
    match kind {
        PatternKind::Literal => literal(source, symbols, anchor),
        PatternKind::Placeholder => CompiledPattern::wrap(&symbols.group(source), anchor),
        PatternKind::Extension => extension(source),
    }
}

/// Escapes `text` for literal matching, turning each `:name` into a capture.
fn literal(text: &str, symbols: &SymbolTable, anchor: Anchor) -> Result<CompiledPattern, Error> {
    let mut body = String::with_capacity(text.len() * 2);
    let mut rest = text;
    while let Some(at) = rest.find(PLACEHOLDER_LEAD) {
        body.push_str(&regex::escape(&rest[..at]));
        let after = &rest[at + PLACEHOLDER_LEAD.len_utf8()..];
        let name_len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());
        if name_len == 0 {
            body.push(PLACEHOLDER_LEAD);
        } else {
            body.push_str(&symbols.group(&after[..name_len]));
        }
        rest = &after[name_len..];
    }
    body.push_str(&regex::escape(rest));
    CompiledPattern::wrap(&body, anchor)
}

/// `/<stem>.<ext>` at the very end of the path; captures the stem.
fn extension(ext: &str) -> Result<CompiledPattern, Error> {
    CompiledPattern::wrap(&format!(r"([^/]+?)\.{}", regex::escape(ext)), Anchor::End)
}

/// Matches a user-supplied regex against the start of `remaining`, which
/// must begin with `/`. The match has to start right after that `/` and end
/// on a segment boundary.
///
/// The regex's own preferred match is tried first. If it stops inside a
/// segment, the text up to each later `/` is tried in turn, longest first,
/// so a greedy expression that ran past a boundary can still settle on one.
/// Alternatives are otherwise taken in the regex's leftmost-first order:
/// `ab|a` consumes `/ab`, `a|ab` does not.
pub(crate) fn match_regex(re: &Regex, remaining: &str) -> Option<PrefixMatch> {
    let rest = remaining.strip_prefix('/')?;
    let on_boundary = |end: usize| end == rest.len() || rest.as_bytes()[end] == b'/';

    let cuts = std::iter::once(rest.len())
        .chain(rest.match_indices('/').map(|(at, _)| at).rev());
    for cut in cuts {
        let Some(caps) = re.captures(&rest[..cut]) else { continue };
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() != 0 || !on_boundary(whole.end()) {
            continue;
        }
        let captures = caps
            .iter()
            .skip(1)
            .map(|group| group.map_or_else(String::new, |m| m.as_str().to_owned()))
            .collect();
        return Some(PrefixMatch { len: whole.end() + 1, captures });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(text: &str) -> CompiledPattern {
        compile(PatternKind::Literal, text, &SymbolTable::default(), Anchor::Segment).unwrap()
    }

    #[test]
    fn test_literal_consumes_whole_segment() {
        let p = lit("users");
        assert_eq!(p.match_prefix("/users"), Some(PrefixMatch { len: 6, captures: vec![] }));
        assert_eq!(p.match_prefix("/users/42").map(|m| m.len), Some(6));
        assert_eq!(p.match_prefix("/usersx"), None);
        assert_eq!(p.match_prefix("users"), None);
        assert_eq!(p.match_prefix(""), None);
    }

    #[test]
    fn test_literal_escapes_metacharacters() {
        let p = lit("a.b+(c)");
        assert!(p.match_prefix("/a.b+(c)").is_some());
        assert!(p.match_prefix("/aXbb(c)").is_none());
    }

    #[test]
    fn test_embedded_placeholders() {
        let p = lit("posts/:year/:slug");
        let m = p.match_prefix("/posts/2024/hello/comments").unwrap();
        assert_eq!(m.len, "/posts/2024/hello".len());
        assert_eq!(m.captures, ["2024", "hello"]);
        assert!(p.match_prefix("/posts/2024").is_none());
    }

    #[test]
    fn test_lone_lead_is_literal() {
        let p = lit("a:/b");
        assert!(p.match_prefix("/a:/b").is_some());
    }

    #[test]
    fn test_placeholder_override() {
        let mut symbols = SymbolTable::default();
        symbols.insert("id", r"\d+").unwrap();

        let p = compile(PatternKind::Placeholder, "id", &symbols, Anchor::Segment).unwrap();
        assert_eq!(p.match_prefix("/42").unwrap().captures, ["42"]);
        assert!(p.match_prefix("/abc").is_none());

        let p = compile(PatternKind::Literal, "items/:id", &symbols, Anchor::Segment).unwrap();
        assert!(p.match_prefix("/items/7").is_some());
        assert!(p.match_prefix("/items/seven").is_none());
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let mut symbols = SymbolTable::default();
        let err = symbols.insert("id", r"(\d+").unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_regex_prefix_ends_on_boundary() {
        let re = Regex::new("ab|a").unwrap();
        assert_eq!(match_regex(&re, "/ab/c").map(|m| m.len), Some(3));
        assert_eq!(match_regex(&re, "/a/c").map(|m| m.len), Some(2));
        assert_eq!(match_regex(&re, "/abc"), None);
        assert_eq!(match_regex(&re, "ab"), None);
        assert_eq!(match_regex(&re, "/xab"), None);
    }

    #[test]
    fn test_regex_greedy_overshoot_settles_on_boundary() {
        let re = Regex::new(r"(.*)b").unwrap();
        let m = match_regex(&re, "/ab/cbd").unwrap();
        assert_eq!(m.len, 3);
        assert_eq!(m.captures, ["a"]);

        let re = Regex::new(r"files/(.+)").unwrap();
        assert_eq!(match_regex(&re, "/files/a/b.txt").map(|m| m.len), Some(14));
    }

    #[test]
    fn test_regex_keeps_builder_settings() {
        let re = regex::RegexBuilder::new("abc").case_insensitive(true).build().unwrap();
        assert_eq!(match_regex(&re, "/ABC").map(|m| m.len), Some(4));
        assert_eq!(match_regex(&Regex::new("abc").unwrap(), "/ABC"), None);
    }

    #[test]
    fn test_optional_group_captures_empty() {
        let re = Regex::new(r"(\d+)(x)?").unwrap();
        assert_eq!(match_regex(&re, "/12").unwrap().captures, ["12", ""]);
    }

    #[test]
    fn test_end_anchor() {
        let p = compile(PatternKind::Literal, "a", &SymbolTable::default(), Anchor::End).unwrap();
        assert!(p.match_prefix("/a").is_some());
        assert!(p.match_prefix("/a/").is_none());
    }

    #[test]
    fn test_extension() {
        let p = compile(PatternKind::Extension, "json", &SymbolTable::default(), Anchor::End).unwrap();
        let m = p.match_prefix("/report.v2.json").unwrap();
        assert_eq!(m.captures, ["report.v2"]);
        assert_eq!(m.len, "/report.v2.json".len());
        assert!(p.match_prefix("/report.json/x").is_none());
        assert!(p.match_prefix("/reportxjson").is_none());
    }

    #[test]
    fn test_trailing_slash_in_body() {
        let p = lit("a/");
        assert_eq!(p.match_prefix("/a/").map(|m| m.len), Some(3));
        let p = lit("a");
        assert_eq!(p.match_prefix("/a/").map(|m| m.len), Some(2));
    }
}
