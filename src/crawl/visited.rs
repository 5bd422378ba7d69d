// src/crawl/visited.rs
// =============================================================================
// The set of pages that some task has already started working on.
//
// Many tasks crawl at the same time and two of them can discover the same
// link at the same moment. `claim_if_new` is the only place that decides who
// gets to fetch it: exactly one caller sees `true`, everyone else `false`.
//
// Entries are never removed while a crawl is running.
//
// Rust concepts:
// - DashSet: A HashSet split into shards, each behind its own lock
// - &self methods that mutate: the set handles its own locking internally
// =============================================================================

use dashmap::DashSet;

#[derive(Debug, Default)]
pub struct VisitedRegistry {
    urls: DashSet<String>,
}

impl VisitedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // Records `url` and returns true for the first caller only
    //
    // insert() takes the shard's write lock for the whole check-and-insert,
    // so two callers can never both observe "new".
    pub fn claim_if_new(&self, url: &str) -> bool {
        self.urls.insert(url.to_string())
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }
}
