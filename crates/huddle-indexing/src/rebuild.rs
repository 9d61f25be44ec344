//! Index rebuild from the primary store.
//!
//! The search index is a derived projection: it can be dropped and fully
//! reconstructed by reading every discussion, task and comment from an
//! [`EntitySource`].
//!
//! Every entity is read and validated before the index is touched. A
//! clearing rebuild then swaps the old entries for the new ones in a single
//! commit, so a failed rebuild leaves the previous index intact and readers
//! never observe it empty. A non-clearing rebuild upserts in batches.

use std::time::Instant;

use serde::Serialize;
use tracing::{info, warn};

use huddle_search::{IndexOutcome, SearchIndexer};
use huddle_types::{EntityType, IndexEntry};

use crate::error::IndexingError;
use crate::source::EntitySource;

/// Configuration for index rebuild operations.
#[derive(Debug, Clone)]
pub struct RebuildConfig {
    /// Entries written per commit when existing entries are kept.
    pub batch_size: usize,
    /// Whether to replace existing entries instead of upserting over them.
    pub clear_first: bool,
    /// Whether to continue when a source read fails or an entity is invalid.
    pub continue_on_error: bool,
}

impl Default for RebuildConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            clear_first: true,
            continue_on_error: true,
        }
    }
}

impl RebuildConfig {
    /// A zero batch size is raised to one.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    pub fn with_clear_first(mut self, clear: bool) -> Self {
        self.clear_first = clear;
        self
    }

    pub fn with_continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }
}

/// Progress tracking for rebuild operations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RebuildProgress {
    pub total_processed: u64,
    pub discussions_indexed: u64,
    pub tasks_indexed: u64,
    pub comments_indexed: u64,
    pub errors: u64,
    /// Entities that failed validation
    pub skipped: u64,
    pub completed: bool,
}

impl RebuildProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_indexed(&mut self, entity_type: EntityType, count: u64) {
        match entity_type {
            EntityType::Discussion => self.discussions_indexed += count,
            EntityType::Task => self.tasks_indexed += count,
            EntityType::Comment => self.comments_indexed += count,
        }
        self.total_processed += count;
    }

    pub fn record_error(&mut self) {
        self.errors += 1;
        self.total_processed += 1;
    }

    pub fn record_skip(&mut self) {
        self.skipped += 1;
        self.total_processed += 1;
    }

    pub fn mark_completed(&mut self) {
        self.completed = true;
    }

    pub fn indexed(&self) -> u64 {
        self.discussions_indexed + self.tasks_indexed + self.comments_indexed
    }
}

/// Result of a rebuild operation.
#[derive(Debug, Serialize)]
pub struct RebuildResult {
    pub progress: RebuildProgress,
    pub elapsed_ms: u64,
}

/// Receives progress after every commit and once on completion.
pub trait ProgressCallback {
    fn on_progress(&self, progress: &RebuildProgress);
}

pub struct NoOpProgressCallback;

impl ProgressCallback for NoOpProgressCallback {
    fn on_progress(&self, _progress: &RebuildProgress) {}
}

/// Logs progress at info level.
pub struct LoggingProgressCallback;

impl ProgressCallback for LoggingProgressCallback {
    fn on_progress(&self, progress: &RebuildProgress) {
        info!(
            total = progress.total_processed,
            discussions = progress.discussions_indexed,
            tasks = progress.tasks_indexed,
            comments = progress.comments_indexed,
            errors = progress.errors,
            "Rebuild progress"
        );
    }
}

/// Rebuild the index from `source`.
///
/// Fails with [`IndexingError::Unavailable`] as soon as the backend rejects
/// a write; unlike lifecycle notifications, a rebuild has no primary-store
/// write to protect. Entity types whose read failed under
/// `continue_on_error` keep their existing entries.
pub fn rebuild_index<S, P>(
    source: &S,
    indexer: &SearchIndexer,
    config: &RebuildConfig,
    progress_callback: &P,
) -> Result<RebuildResult, IndexingError>
where
    S: EntitySource + ?Sized,
    P: ProgressCallback + ?Sized,
{
    let started = Instant::now();
    let mut progress = RebuildProgress::new();

    info!(
        batch_size = config.batch_size,
        clear_first = config.clear_first,
        "Starting search index rebuild"
    );

    let mut collected: Vec<(EntityType, Vec<IndexEntry>)> = Vec::new();
    for entity_type in EntityType::ALL {
        let entities = match source.entities(entity_type) {
            Ok(entities) => entities,
            Err(e) if config.continue_on_error => {
                warn!(%entity_type, error = %e, "Failed to read entities");
                progress.record_error();
                continue;
            }
            Err(e) => return Err(e),
        };
        info!(%entity_type, count = entities.len(), "Found entities to index");

        let mut entries = Vec::with_capacity(entities.len());
        for entity in &entities {
            if let Err(e) = entity.validate() {
                if !config.continue_on_error {
                    return Err(e.into());
                }
                warn!(%entity_type, entity_id = entity.id(), error = %e, "Skipping invalid entity");
                progress.record_skip();
                continue;
            }
            entries.push(IndexEntry::from(entity));
        }
        collected.push((entity_type, entries));
    }

    if config.clear_first {
        let read_types: Vec<EntityType> = collected.iter().map(|(t, _)| *t).collect();
        let all: Vec<IndexEntry> = collected
            .iter()
            .flat_map(|(_, entries)| entries.iter().cloned())
            .collect();
        check_write(indexer.replace_types(&read_types, &all))?;
        for (entity_type, entries) in &collected {
            progress.record_indexed(*entity_type, entries.len() as u64);
        }
        progress_callback.on_progress(&progress);
    } else {
        let batch_size = config.batch_size.max(1);
        for (entity_type, entries) in &collected {
            for batch in entries.chunks(batch_size) {
                check_write(indexer.index_batch(batch))?;
                progress.record_indexed(*entity_type, batch.len() as u64);
                progress_callback.on_progress(&progress);
            }
        }
    }

    progress.mark_completed();
    progress_callback.on_progress(&progress);

    let elapsed_ms = started.elapsed().as_millis() as u64;
    info!(
        discussions = progress.discussions_indexed,
        tasks = progress.tasks_indexed,
        comments = progress.comments_indexed,
        skipped = progress.skipped,
        errors = progress.errors,
        elapsed_ms,
        "Search index rebuild complete"
    );

    Ok(RebuildResult {
        progress,
        elapsed_ms,
    })
}

fn check_write(outcome: IndexOutcome) -> Result<(), IndexingError> {
    match outcome {
        IndexOutcome::Degraded(reason) => Err(IndexingError::Unavailable(reason)),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::sync::Arc;

    use chrono::Utc;
    use huddle_search::IndexHandle;
    use huddle_types::{Comment, Discussion, Entity, Task};

    use crate::source::Corpus;

    fn discussion(id: &str) -> Entity {
        Entity::Discussion(Discussion {
            id: id.to_string(),
            title: format!("Discussion {}", id),
            content: "Body".to_string(),
            project: None,
            team: None,
            modified_at: Utc::now(),
        })
    }

    fn task(id: &str) -> Entity {
        Entity::Task(Task {
            id: id.to_string(),
            title: format!("Task {}", id),
            description: String::new(),
            project: None,
            team: None,
            modified_at: Utc::now(),
        })
    }

    fn comment(id: &str, reference_id: &str) -> Entity {
        Entity::Comment(Comment {
            id: id.to_string(),
            content: "Noted".to_string(),
            reference_type: EntityType::Task,
            reference_id: reference_id.to_string(),
            project: None,
            team: None,
            modified_at: Utc::now(),
        })
    }

    fn setup() -> (Arc<IndexHandle>, SearchIndexer) {
        let handle = Arc::new(IndexHandle::in_memory().unwrap());
        let indexer = SearchIndexer::new(handle.clone());
        (handle, indexer)
    }

    struct FailingSource;

    impl EntitySource for FailingSource {
        fn entities(&self, _entity_type: EntityType) -> Result<Vec<Entity>, IndexingError> {
            Err(IndexingError::Source("store offline".to_string()))
        }
    }

    #[derive(Default)]
    struct RecordingCallback(RefCell<Vec<u64>>);

    impl ProgressCallback for RecordingCallback {
        fn on_progress(&self, progress: &RebuildProgress) {
            self.0.borrow_mut().push(progress.total_processed);
        }
    }

    #[test]
    fn test_rebuild_config_default() {
        let config = RebuildConfig::default();
        assert_eq!(config.batch_size, 100);
        assert!(config.clear_first);
        assert!(config.continue_on_error);
    }

    #[test]
    fn test_rebuild_config_builder() {
        let config = RebuildConfig::default()
            .with_batch_size(0)
            .with_clear_first(false)
            .with_continue_on_error(false);

        assert_eq!(config.batch_size, 1);
        assert!(!config.clear_first);
        assert!(!config.continue_on_error);
    }

    #[test]
    fn test_rebuild_progress() {
        let mut progress = RebuildProgress::new();
        progress.record_indexed(EntityType::Task, 3);
        progress.record_indexed(EntityType::Comment, 2);
        progress.record_error();
        progress.record_skip();

        assert_eq!(progress.tasks_indexed, 3);
        assert_eq!(progress.comments_indexed, 2);
        assert_eq!(progress.indexed(), 5);
        assert_eq!(progress.total_processed, 7);
        assert!(!progress.completed);
    }

    #[test]
    fn test_rebuild_counts_per_type() {
        let (handle, indexer) = setup();
        let corpus = Corpus::new(vec![
            discussion("D1"),
            task("T1"),
            task("T2"),
            comment("c1", "T1"),
        ]);

        let result = rebuild_index(&corpus, &indexer, &RebuildConfig::default(), &NoOpProgressCallback)
            .unwrap();

        assert!(result.progress.completed);
        assert_eq!(result.progress.discussions_indexed, 1);
        assert_eq!(result.progress.tasks_indexed, 2);
        assert_eq!(result.progress.comments_indexed, 1);
        assert_eq!(handle.acquire().into_result().unwrap().num_docs(), 4);
    }

    #[test]
    fn test_rebuild_clears_stale_entries() {
        let (handle, indexer) = setup();
        let stale = Corpus::new(vec![task("T-old")]);
        rebuild_index(&stale, &indexer, &RebuildConfig::default(), &NoOpProgressCallback).unwrap();

        let fresh = Corpus::new(vec![task("T1")]);
        rebuild_index(&fresh, &indexer, &RebuildConfig::default(), &NoOpProgressCallback).unwrap();

        assert_eq!(handle.acquire().into_result().unwrap().num_docs(), 1);
    }

    #[test]
    fn test_rebuild_batches_report_progress() {
        let (_handle, indexer) = setup();
        let corpus = Corpus::new((0..5).map(|i| task(&format!("T{}", i))).collect());
        let callback = RecordingCallback::default();

        let config = RebuildConfig::default()
            .with_batch_size(2)
            .with_clear_first(false);
        rebuild_index(&corpus, &indexer, &config, &callback).unwrap();

        assert_eq!(*callback.0.borrow(), vec![2, 4, 5, 5]);
    }

    #[test]
    fn test_clearing_rebuild_commits_once() {
        let (_handle, indexer) = setup();
        let corpus = Corpus::new((0..5).map(|i| task(&format!("T{}", i))).collect());
        let callback = RecordingCallback::default();

        let config = RebuildConfig::default().with_batch_size(2);
        rebuild_index(&corpus, &indexer, &config, &callback).unwrap();

        assert_eq!(*callback.0.borrow(), vec![5, 5]);
    }

    /// Serves the given entities, but fails for one entity type.
    struct FailsFor {
        corpus: Corpus,
        failing: EntityType,
    }

    impl EntitySource for FailsFor {
        fn entities(&self, entity_type: EntityType) -> Result<Vec<Entity>, IndexingError> {
            if entity_type == self.failing {
                return Err(IndexingError::Source("store offline".to_string()));
            }
            self.corpus.entities(entity_type)
        }
    }

    #[test]
    fn test_failed_strict_rebuild_keeps_existing_index() {
        let (handle, indexer) = setup();
        let seed = Corpus::new(vec![task("T1"), task("T2"), task("T3")]);
        rebuild_index(&seed, &indexer, &RebuildConfig::default(), &NoOpProgressCallback).unwrap();

        let source = FailsFor {
            corpus: Corpus::new(vec![discussion("D1")]),
            failing: EntityType::Task,
        };
        let strict = RebuildConfig::default().with_continue_on_error(false);
        let err = rebuild_index(&source, &indexer, &strict, &NoOpProgressCallback).unwrap_err();

        assert!(matches!(err, IndexingError::Source(_)));
        assert_eq!(handle.acquire().into_result().unwrap().num_docs(), 3);
    }

    #[test]
    fn test_lenient_rebuild_keeps_unreadable_types() {
        let (handle, indexer) = setup();
        let seed = Corpus::new(vec![discussion("D-old"), task("T1"), task("T2")]);
        rebuild_index(&seed, &indexer, &RebuildConfig::default(), &NoOpProgressCallback).unwrap();

        let source = FailsFor {
            corpus: Corpus::new(vec![discussion("D1"), discussion("D2")]),
            failing: EntityType::Task,
        };
        let result =
            rebuild_index(&source, &indexer, &RebuildConfig::default(), &NoOpProgressCallback)
                .unwrap();

        assert_eq!(result.progress.errors, 1);
        assert_eq!(result.progress.discussions_indexed, 2);
        assert_eq!(handle.acquire().into_result().unwrap().num_docs(), 4);
    }

    #[test]
    fn test_invalid_entities_skipped() {
        let (handle, indexer) = setup();
        let corpus = Corpus::new(vec![task("T1"), comment("c1", "")]);

        let result =
            rebuild_index(&corpus, &indexer, &RebuildConfig::default(), &NoOpProgressCallback)
                .unwrap();
        assert_eq!(result.progress.skipped, 1);
        assert_eq!(result.progress.tasks_indexed, 1);

        let strict = RebuildConfig::default().with_continue_on_error(false);
        let err = rebuild_index(&corpus, &indexer, &strict, &NoOpProgressCallback).unwrap_err();
        assert!(matches!(err, IndexingError::Invalid(_)));
        assert_eq!(handle.acquire().into_result().unwrap().num_docs(), 1);
    }

    #[test]
    fn test_source_errors() {
        let (_handle, indexer) = setup();

        let result =
            rebuild_index(&FailingSource, &indexer, &RebuildConfig::default(), &NoOpProgressCallback)
                .unwrap();
        assert_eq!(result.progress.errors, 3);

        let strict = RebuildConfig::default().with_continue_on_error(false);
        let err = rebuild_index(&FailingSource, &indexer, &strict, &NoOpProgressCallback).unwrap_err();
        assert!(matches!(err, IndexingError::Source(_)));
    }

    #[test]
    fn test_rebuild_closed_index_fails() {
        let (handle, indexer) = setup();
        handle.close();

        let corpus = Corpus::new(vec![task("T1")]);
        let err = rebuild_index(&corpus, &indexer, &RebuildConfig::default(), &NoOpProgressCallback)
            .unwrap_err();
        assert!(matches!(err, IndexingError::Unavailable(_)));
    }
}
