//! Local search over the fetched note list.

use crate::entity::Note;

/// A search query, lowercased once for case-insensitive matching.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    needle: String,
}

impl SearchQuery {
    pub fn new(raw: &str) -> Self {
        Self {
            needle: raw.to_lowercase(),
        }
    }

    /// An empty query matches everything.
    pub fn is_empty(&self) -> bool {
        self.needle.is_empty()
    }

    pub fn matches(&self, note: &Note) -> bool {
        self.is_empty() || note.matches(&self.needle)
    }
}

/// Notes whose title or content contains `query`, case-insensitively,
/// in their original order.
pub fn filter_notes<'a>(notes: &'a [Note], query: &str) -> Vec<&'a Note> {
    let query = SearchQuery::new(query);
    notes.iter().filter(|n| query.matches(n)).collect()
}
