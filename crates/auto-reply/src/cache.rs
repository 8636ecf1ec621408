use std::sync::Arc;

use {
    dashmap::DashMap,
    paperbot_channels::ConversationId,
    paperbot_repository::{DocumentSummary, SearchResultSet},
    tracing::debug,
};

use crate::error::ReferenceError;

/// Latest search outcome per conversation.
///
/// Each operation is atomic for its key; different conversations live in
/// different shards and do not block each other. Entries are never evicted.
#[derive(Debug, Default)]
pub struct ResultCache {
    entries: DashMap<ConversationId, Arc<SearchResultSet>>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the conversation's stored results.
    pub fn put(&self, conversation: ConversationId, results: SearchResultSet) {
        debug!(conversation = %conversation, items = results.len(), "caching search results");
        self.entries.insert(conversation, Arc::new(results));
    }

    pub fn get(&self, conversation: &ConversationId) -> Option<Arc<SearchResultSet>> {
        self.entries
            .get(conversation)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Resolve a one-based item reference against the last search.
    pub fn resolve_index(
        &self,
        conversation: &ConversationId,
        index: usize,
    ) -> Result<DocumentSummary, ReferenceError> {
        let results = self.get(conversation).ok_or(ReferenceError::NoPriorSearch)?;
        index
            .checked_sub(1)
            .and_then(|i| results.items.get(i))
            .cloned()
            .ok_or(ReferenceError::IndexOutOfRange {
                index,
                len: results.len(),
            })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
