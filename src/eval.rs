//! Matcher evaluation against the per-dispatch routing state.

use crate::error::Error;
use crate::matcher::{Condition, Consumed, Matcher};
use crate::pattern::{self, Anchor, PatternKind};
use crate::route::Route;

impl Route<'_> {
    /// All-of: every matcher in order, stopping at the first that fails.
    pub(crate) fn match_all(&mut self, matchers: &[Matcher]) -> Result<bool, Error> {
        for matcher in matchers {
            if !self.evaluate(matcher)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Evaluates one matcher. A failed matcher leaves neither consumed path
    /// nor captures behind, however far it got before failing.
    pub(crate) fn evaluate(&mut self, matcher: &Matcher) -> Result<bool, Error> {
        let mark = self.cursor.mark();
        let captured = self.captures.len();
        let matched = self.evaluate_in_place(matcher)?;
        if !matched {
            self.cursor.restore(mark);
            self.captures.truncate(captured);
        }
        Ok(matched)
    }

    fn evaluate_in_place(&mut self, matcher: &Matcher) -> Result<bool, Error> {
        match matcher {
            Matcher::Literal(text) if text.is_empty() => Ok(self.cursor.remaining().is_empty()),
            Matcher::Literal(text) => self.consume(PatternKind::Literal, text, Anchor::Segment),
            Matcher::Placeholder(name) => self.consume(PatternKind::Placeholder, name, Anchor::Segment),
            Matcher::Pattern(re) => Ok(match pattern::match_regex(re, self.cursor.remaining()) {
                Some(m) => {
                    self.cursor.accept(m, &mut self.captures);
                    true
                }
                None => false,
            }),
            Matcher::All(conditions) => {
                for condition in conditions {
                    if !self.condition(condition)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Matcher::Any(alternatives) => {
                for alternative in alternatives {
                    if self.evaluate(alternative)? {
                        if let Matcher::Literal(text) = alternative {
                            self.captures.push(text.as_str());
                        }
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Matcher::Predicate(check) => Ok(check(self.request())),
            Matcher::Custom(custom) => match custom(self.cursor.remaining()) {
                Some(consumed) => self.advance(consumed),
                None => Ok(false),
            },
            Matcher::Terminal => Ok(self.cursor.remaining().is_empty()),
            Matcher::Raw(decided) => Ok(*decided),
        }
    }

    fn condition(&mut self, condition: &Condition) -> Result<bool, Error> {
        let request = self.request();
        match condition {
            Condition::Method(methods) => Ok(methods.contains(&request.method())),
            Condition::Param(name) => Ok(match request.param(name) {
                Some(value) => {
                    self.captures.push(value);
                    true
                }
                None => false,
            }),
            Condition::Header(name) => Ok(match request.header(name) {
                Some(value) => {
                    self.captures.push(value);
                    true
                }
                None => false,
            }),
            Condition::Host(expected) => {
                Ok(request.host().is_some_and(|host| host.eq_ignore_ascii_case(expected)))
            }
            Condition::Extension(ext) => self.consume(PatternKind::Extension, ext, Anchor::End),
            Condition::All(matchers) => self.match_all(matchers),
            Condition::Named { name, value } => {
                let check = self.config()
                    .conditions
                    .get(name)
                    .ok_or_else(|| Error::UnknownCondition(name.clone()))?;
                Ok(check(request, value))
            }
        }
    }

    fn consume(&mut self, kind: PatternKind, source: &str, anchor: Anchor) -> Result<bool, Error> {
        let pattern = self.config().pattern(kind, source, anchor)?;
        Ok(self.cursor.consume(&pattern, &mut self.captures))
    }

    fn advance(&mut self, consumed: Consumed) -> Result<bool, Error> {
        let available = self.cursor.remaining().len();
        if consumed.len > available || !self.cursor.advance(consumed.len) {
            return Err(Error::Consume { consumed: consumed.len, available });
        }
        self.captures.append(consumed.captures);
        Ok(true)
    }
}
