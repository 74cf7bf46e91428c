use crate::db::ContentStore;
use crate::models::ContentEntry;
use crate::pipeline::keywords::KeywordTables;
use crate::pipeline::triage::derive_topic;

/// Picks catalogue entries for the topic a message is about.
pub struct ContentRecommender<'a, C: ContentStore + ?Sized> {
    store: &'a C,
    tables: &'a KeywordTables,
}

impl<'a, C: ContentStore + ?Sized> ContentRecommender<'a, C> {
    pub fn new(store: &'a C, tables: &'a KeywordTables) -> Self {
        Self { store, tables }
    }

    /// At most `limit` active entries. Store failures degrade to no content.
    pub fn recommend(&self, message: &str, limit: usize) -> Vec<ContentEntry> {
        if limit == 0 {
            return Vec::new();
        }
        let topic = derive_topic(message, self.tables);

        match self
            .store
            .find_active_by_topic(topic, &self.tables.default_topic, limit)
        {
            Ok(mut entries) => {
                // Stores are trusted but not blindly
                entries.retain(|e| e.active);
                entries.truncate(limit);
                tracing::debug!(topic, count = entries.len(), "Content recommended");
                entries
            }
            Err(e) => {
                tracing::warn!(topic, error = %e, "Content lookup failed; continuing without content");
                Vec::new()
            }
        }
    }
}
