//! Entity sources for rebuilding the index and resolving comment parents.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use huddle_search::{ParentLookup, ParentSummary};
use huddle_types::{Entity, EntityType};

use crate::error::IndexingError;

/// Read access to the primary store.
pub trait EntitySource {
    /// Every current entity of the given type.
    fn entities(&self, entity_type: EntityType) -> Result<Vec<Entity>, IndexingError>;
}

/// A fixed set of entities, e.g. an exported JSON corpus.
///
/// The JSON form is an array of entities tagged by `type`:
///
/// ```json
/// [{"type": "task", "id": "T1", "title": "Ship it", "modified_at": 1700000000000}]
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Corpus {
    entities: Vec<Entity>,
}

impl Corpus {
    pub fn new(entities: Vec<Entity>) -> Self {
        Self { entities }
    }

    pub fn from_json(json: &str) -> Result<Self, IndexingError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, IndexingError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let corpus = Self::from_json(&json)?;
        debug!(path = %path.display(), entities = corpus.len(), "Loaded corpus");
        Ok(corpus)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl EntitySource for Corpus {
    fn entities(&self, entity_type: EntityType) -> Result<Vec<Entity>, IndexingError> {
        Ok(self
            .entities
            .iter()
            .filter(|e| e.entity_type() == entity_type)
            .cloned()
            .collect())
    }
}

/// Parents are resolved from the corpus; ids it does not contain are
/// reported missing, which drops their comment matches.
impl ParentLookup for Corpus {
    fn lookup(&self, entity_type: EntityType, ids: &[String]) -> HashMap<String, ParentSummary> {
        self.entities
            .iter()
            .filter(|e| e.entity_type() == entity_type && ids.iter().any(|id| id == e.id()))
            .filter_map(|e| {
                let summary = match e {
                    Entity::Discussion(d) => ParentSummary {
                        title: Some(d.title.clone()),
                        project: d.project.clone(),
                        team: d.team.clone(),
                        modified_at: Some(d.modified_at),
                    },
                    Entity::Task(t) => ParentSummary {
                        title: Some(t.title.clone()),
                        project: t.project.clone(),
                        team: t.team.clone(),
                        modified_at: Some(t.modified_at),
                    },
                    Entity::Comment(_) => return None,
                };
                Some((e.id().to_string(), summary))
            })
            .collect()
    }
}
