//! Compiled-pattern cache.
//!
//! One per [`Router`](crate::Router). Route trees are closures that rebuild
//! their matchers on every request, so without the cache every `"users"` in
//! the tree would be compiled again for every request that reaches it.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::Error;
use crate::pattern::{Anchor, CompiledPattern, PatternKind};

type Shelf = HashMap<String, Arc<CompiledPattern>>;

/// Read-mostly map from `(kind, anchor, source)` to a compiled pattern.
///
/// Lookups share a read lock. A miss compiles outside any lock and then
/// inserts under the write lock; if two requests race on the same key the
/// first insert wins and both get equivalent patterns. Entries are never
/// evicted.
#[derive(Debug, Default)]
pub(crate) struct PatternCache {
    shelves: RwLock<HashMap<(PatternKind, Anchor), Shelf>>,
}

impl PatternCache {
    pub(crate) fn fetch<F>(
        &self,
        kind: PatternKind,
        source: &str,
        anchor: Anchor,
        compute: F,
    ) -> Result<Arc<CompiledPattern>, Error>
    where
        F: FnOnce() -> Result<CompiledPattern, Error>,
    {
        if let Some(hit) = self.shelves.read()
            .get(&(kind, anchor))
            .and_then(|shelf| shelf.get(source))
        {
            return Ok(Arc::clone(hit));
        }

        let compiled = Arc::new(compute()?);
        let mut shelves = self.shelves.write();
        let entry = shelves
            .entry((kind, anchor))
            .or_default()
            .entry(source.to_owned())
            .or_insert(compiled);
        Ok(Arc::clone(entry))
    }

    /// Number of cached patterns.
    pub(crate) fn len(&self) -> usize {
        self.shelves.read().values().map(HashMap::len).sum()
    }
}
