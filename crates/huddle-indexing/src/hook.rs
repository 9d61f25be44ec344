//! Document lifecycle hook.
//!
//! The primary store calls the hook after each committed create, update or
//! delete of a discussion, task or comment. Every call returns an
//! [`IndexOutcome`] and never an error: a search index that is missing or
//! failing must not fail the primary-store write.

use std::sync::Arc;

use tracing::{debug, warn};

use huddle_search::{IndexHandle, IndexOutcome, SearchIndexer, SearchService};
use huddle_types::{Entity, EntityType, IndexEntry};

pub struct DocumentLifecycleHook {
    indexer: SearchIndexer,
}

impl DocumentLifecycleHook {
    pub fn new(handle: Arc<IndexHandle>) -> Self {
        Self {
            indexer: SearchIndexer::new(handle),
        }
    }

    /// Hook writing to the same index a service searches.
    pub fn for_service(service: &SearchService) -> Self {
        Self::new(service.handle().clone())
    }

    pub fn on_create(&self, entity: &Entity) -> IndexOutcome {
        self.upsert(entity)
    }

    /// Re-index when any of the type's indexable fields changed.
    ///
    /// Changes limited to other fields (project, team, status, ...) leave
    /// the existing entry untouched.
    pub fn on_update(&self, entity: &Entity, changed_fields: &[&str]) -> IndexOutcome {
        let indexable = entity.entity_type().indexable_fields();
        if !changed_fields.iter().any(|f| indexable.contains(f)) {
            debug!(
                entity_type = %entity.entity_type(),
                entity_id = entity.id(),
                ?changed_fields,
                "No indexable field changed"
            );
            return IndexOutcome::Skipped("no indexable field changed".to_string());
        }
        self.upsert(entity)
    }

    /// Remove the entity and, for discussions and tasks, their comments.
    pub fn on_delete(&self, entity_type: EntityType, entity_id: &str) -> IndexOutcome {
        let outcome = self.indexer.remove(entity_type, entity_id);
        if outcome.is_degraded() || !entity_type.accepts_comments() {
            return outcome;
        }
        self.indexer.remove_comments_of(entity_type, entity_id)
    }

    fn upsert(&self, entity: &Entity) -> IndexOutcome {
        if let Err(e) = entity.validate() {
            warn!(
                entity_type = %entity.entity_type(),
                entity_id = entity.id(),
                error = %e,
                "Not indexing invalid entity"
            );
            return IndexOutcome::Skipped(e.to_string());
        }
        self.indexer.index(&IndexEntry::from(entity))
    }
}
