//! Index entry: the searchable projection of one entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EntityType};

/// Build the index key for an entity, e.g. `task:T123`.
pub fn entry_key(entity_type: EntityType, entity_id: &str) -> String {
    format!("{}:{}", entity_type.as_str(), entity_id)
}

/// One row in the search index.
///
/// At most one entry exists per `(entity_type, entity_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub entity_type: EntityType,
    pub entity_id: String,
    /// Comments have no title
    #[serde(default)]
    pub title: Option<String>,
    pub content: String,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
    /// Parent type, comments only
    #[serde(default)]
    pub reference_type: Option<EntityType>,
    /// Parent id, comments only
    #[serde(default)]
    pub reference_id: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub modified_at: DateTime<Utc>,
}

impl IndexEntry {
    pub fn key(&self) -> String {
        entry_key(self.entity_type, &self.entity_id)
    }

    /// Index key of the parent entity, for comment entries.
    pub fn reference_key(&self) -> Option<String> {
        match (self.reference_type, &self.reference_id) {
            (Some(t), Some(id)) => Some(entry_key(t, id)),
            _ => None,
        }
    }
}

impl From<&Entity> for IndexEntry {
    fn from(entity: &Entity) -> Self {
        match entity {
            Entity::Discussion(d) => IndexEntry {
                entity_type: EntityType::Discussion,
                entity_id: d.id.clone(),
                title: Some(d.title.clone()),
                content: d.content.clone(),
                project: d.project.clone(),
                team: d.team.clone(),
                reference_type: None,
                reference_id: None,
                modified_at: d.modified_at,
            },
            Entity::Task(t) => IndexEntry {
                entity_type: EntityType::Task,
                entity_id: t.id.clone(),
                title: Some(t.title.clone()),
                content: t.description.clone(),
                project: t.project.clone(),
                team: t.team.clone(),
                reference_type: None,
                reference_id: None,
                modified_at: t.modified_at,
            },
            Entity::Comment(c) => IndexEntry {
                entity_type: EntityType::Comment,
                entity_id: c.id.clone(),
                title: None,
                content: c.content.clone(),
                project: c.project.clone(),
                team: c.team.clone(),
                reference_type: Some(c.reference_type),
                reference_id: Some(c.reference_id.clone()),
                modified_at: c.modified_at,
            },
        }
    }
}
