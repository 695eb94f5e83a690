//! Streaming query reconciliation
//!
//! Sub-queries arrive as a series of partial events followed by one final
//! event. Partial queries live in a map keyed by (category, number) and are
//! overwritten in place; finalization appends to an ordered list and drops the
//! partial entry in the same call, so a key is never in both collections.

use crate::models::{FinalizedQuery, PartialQuery, QueryKey};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Tracks partial and finalized research sub-queries
#[derive(Debug, Clone, Default)]
pub struct QueryTracker {
    /// Completion order
    finalized: Vec<FinalizedQuery>,
    finalized_keys: HashSet<QueryKey>,
    partial: BTreeMap<QueryKey, PartialQuery>,
}

impl QueryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the partial query at (category, number)
    ///
    /// Ignored when the key is already finalized: a late partial event must
    /// not resurrect a finished query. Returns whether the map changed.
    pub fn upsert_partial(&mut self, category: &str, number: i64, text: &str) -> bool {
        let key = QueryKey::new(category, number);
        if self.finalized_keys.contains(&key) {
            debug!(category, number, "Ignoring partial for finalized query");
            return false;
        }

        self.partial.insert(
            key,
            PartialQuery {
                text: text.to_string(),
                number,
                category: category.to_string(),
                is_complete: false,
            },
        );
        true
    }

    /// Finalize the query at (category, number)
    ///
    /// Appends to the finalized list unless the key is already there, and
    /// always removes the partial entry. No prior partial event is required.
    /// Returns whether the query was appended.
    pub fn promote(&mut self, category: &str, number: i64, text: &str) -> bool {
        let key = QueryKey::new(category, number);
        self.partial.remove(&key);

        if !self.finalized_keys.insert(key) {
            debug!(category, number, "Query already finalized");
            return false;
        }

        self.finalized.push(FinalizedQuery {
            text: text.to_string(),
            number,
            category: category.to_string(),
        });
        true
    }

    /// Clear both collections
    pub fn reset(&mut self) {
        self.finalized.clear();
        self.finalized_keys.clear();
        self.partial.clear();
    }

    /// Finalized queries in completion order
    pub fn finalized(&self) -> &[FinalizedQuery] {
        &self.finalized
    }

    /// In-flight queries
    pub fn partial(&self) -> &BTreeMap<QueryKey, PartialQuery> {
        &self.partial
    }

    pub fn is_empty(&self) -> bool {
        self.finalized.is_empty() && self.partial.is_empty()
    }
}
