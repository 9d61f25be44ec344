//! Search indexer keeping the index in step with the primary store.
//!
//! Every write is a keyed upsert or delete that is committed before the
//! call returns. Indexing is a side effect of a primary-store write, so no
//! method here returns an error: an unavailable or failing backend is
//! logged and reported as [`IndexOutcome::Degraded`].

use std::sync::Arc;

use tantivy::{IndexWriter, Term};
use tracing::{debug, info, warn};

use huddle_types::{entry_key, EntityType, IndexEntry};

use crate::document::entry_to_doc;
use crate::error::SearchError;
use crate::handle::{Backend, IndexHandle, OpenIndex};
use crate::schema::SearchSchema;

/// What happened to an index write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexOutcome {
    Indexed,
    Removed,
    /// Entry was not indexable (e.g. a comment without a parent)
    Skipped(String),
    /// Backend unavailable or write failed; the index may be stale
    Degraded(String),
}

impl IndexOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(self, IndexOutcome::Degraded(_))
    }
}

/// Manages document indexing operations.
pub struct SearchIndexer {
    handle: Arc<IndexHandle>,
}

impl SearchIndexer {
    pub fn new(handle: Arc<IndexHandle>) -> Self {
        Self { handle }
    }

    pub fn handle(&self) -> &Arc<IndexHandle> {
        &self.handle
    }

    /// Upsert an entry keyed by `(entity_type, entity_id)`.
    pub fn index(&self, entry: &IndexEntry) -> IndexOutcome {
        if let Some(reason) = check_entry(entry) {
            warn!(key = %entry.key(), reason = %reason, "Skipping unindexable entry");
            return IndexOutcome::Skipped(reason);
        }

        let key = entry.key();
        let result = self.write(|open| {
            open.write(|writer, schema| {
                writer.delete_term(Term::from_field_text(schema.key, &key));
                writer.add_document(entry_to_doc(schema, entry))?;
                Ok(())
            })
        });

        match result {
            Ok(()) => {
                debug!(key = %key, "Indexed entry");
                IndexOutcome::Indexed
            }
            Err(reason) => degraded("index", &key, reason),
        }
    }

    /// Delete an entry. Deleting an absent entry succeeds.
    pub fn remove(&self, entity_type: EntityType, entity_id: &str) -> IndexOutcome {
        let key = entry_key(entity_type, entity_id);
        let result = self.write(|open| {
            open.write(|writer, schema| {
                writer.delete_term(Term::from_field_text(schema.key, &key));
                Ok(())
            })
        });

        match result {
            Ok(()) => {
                debug!(key = %key, "Removed entry");
                IndexOutcome::Removed
            }
            Err(reason) => degraded("remove", &key, reason),
        }
    }

    /// Delete every comment entry attached to the given parent.
    pub fn remove_comments_of(&self, reference_type: EntityType, reference_id: &str) -> IndexOutcome {
        let reference_key = entry_key(reference_type, reference_id);
        let result = self.write(|open| {
            open.write(|writer, schema| {
                writer.delete_term(Term::from_field_text(schema.reference_key, &reference_key));
                Ok(())
            })
        });

        match result {
            Ok(()) => {
                debug!(parent = %reference_key, "Removed comments of entity");
                IndexOutcome::Removed
            }
            Err(reason) => degraded("remove comments", &reference_key, reason),
        }
    }

    /// Upsert many entries with a single commit.
    ///
    /// Unindexable entries are skipped; the outcome reflects the batch as a whole.
    pub fn index_batch(&self, entries: &[IndexEntry]) -> IndexOutcome {
        let result = self.write(|open| {
            open.write(|writer, schema| add_entries(writer, schema, entries))
        });

        match result {
            Ok(()) => {
                debug!(count = entries.len(), "Indexed entry batch");
                IndexOutcome::Indexed
            }
            Err(reason) => degraded("index batch", "*", reason),
        }
    }

    /// Replace every entry of `entity_types` with `entries` in one commit.
    ///
    /// Readers see the previous entries until the commit and the new ones
    /// after it. If any step fails the transaction is rolled back and the
    /// index is left as it was.
    pub fn replace_types(&self, entity_types: &[EntityType], entries: &[IndexEntry]) -> IndexOutcome {
        let result = self.write(|open| {
            open.write(|writer, schema| {
                for entity_type in entity_types {
                    writer.delete_term(Term::from_field_text(
                        schema.entity_type,
                        entity_type.as_str(),
                    ));
                }
                add_entries(writer, schema, entries)
            })
        });

        match result {
            Ok(()) => {
                info!(
                    types = ?entity_types,
                    count = entries.len(),
                    "Replaced search index entries"
                );
                IndexOutcome::Indexed
            }
            Err(reason) => degraded("replace", "*", reason),
        }
    }

    fn write<F>(&self, op: F) -> Result<(), String>
    where
        F: FnOnce(&OpenIndex) -> Result<u64, SearchError>,
    {
        match self.handle.acquire() {
            Backend::Available(open) => op(&open).map(|_| ()).map_err(|e| e.to_string()),
            Backend::Unavailable(reason) => Err(reason),
        }
    }
}

/// Upsert entries through an open writer, skipping unindexable ones.
fn add_entries(
    writer: &IndexWriter,
    schema: &SearchSchema,
    entries: &[IndexEntry],
) -> Result<(), SearchError> {
    for entry in entries {
        if let Some(reason) = check_entry(entry) {
            warn!(key = %entry.key(), reason = %reason, "Skipping unindexable entry");
            continue;
        }
        writer.delete_term(Term::from_field_text(schema.key, &entry.key()));
        writer.add_document(entry_to_doc(schema, entry))?;
    }
    Ok(())
}

fn check_entry(entry: &IndexEntry) -> Option<String> {
    if entry.entity_id.is_empty() {
        return Some("empty entity id".to_string());
    }
    if entry.entity_type == EntityType::Comment && entry.reference_key().is_none() {
        return Some("comment without reference".to_string());
    }
    None
}

fn degraded(op: &str, key: &str, reason: String) -> IndexOutcome {
    warn!(op, key, reason = %reason, "Search index write degraded");
    IndexOutcome::Degraded(reason)
}
