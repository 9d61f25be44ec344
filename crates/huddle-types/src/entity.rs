//! Primary-store entities that can appear in search.
//!
//! The collaboration tool stores discussions, tasks and comments as
//! documents. Only the fields the search subsystem needs are modelled here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::HuddleError;

/// Kind of indexable entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Discussion,
    Task,
    Comment,
}

impl EntityType {
    /// All entity types, in display order.
    pub const ALL: [EntityType; 3] = [
        EntityType::Discussion,
        EntityType::Task,
        EntityType::Comment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Discussion => "discussion",
            EntityType::Task => "task",
            EntityType::Comment => "comment",
        }
    }

    /// Parse from string, returning None for unknown types.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "discussion" => Some(EntityType::Discussion),
            "task" => Some(EntityType::Task),
            "comment" => Some(EntityType::Comment),
            _ => None,
        }
    }

    /// Primary-store field names whose change requires re-indexing.
    pub fn indexable_fields(&self) -> &'static [&'static str] {
        match self {
            EntityType::Discussion => &["title", "content"],
            EntityType::Task => &["title", "description"],
            EntityType::Comment => &["content"],
        }
    }

    /// Whether entities of this type can own comments.
    pub fn accepts_comments(&self) -> bool {
        !matches!(self, EntityType::Comment)
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntityType {
    type Err = HuddleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| HuddleError::InvalidInput(format!("unknown entity type: {}", s)))
    }
}

/// A project discussion thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discussion {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub modified_at: DateTime<Utc>,
}

/// A project task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub modified_at: DateTime<Utc>,
}

/// A comment attached to a discussion or task.
///
/// `project` and `team` are inherited from the parent by the primary store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub content: String,
    pub reference_type: EntityType,
    pub reference_id: String,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub modified_at: DateTime<Utc>,
}

/// A primary-store document eligible for search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Entity {
    Discussion(Discussion),
    Task(Task),
    Comment(Comment),
}

impl Entity {
    pub fn entity_type(&self) -> EntityType {
        match self {
            Entity::Discussion(_) => EntityType::Discussion,
            Entity::Task(_) => EntityType::Task,
            Entity::Comment(_) => EntityType::Comment,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Entity::Discussion(d) => &d.id,
            Entity::Task(t) => &t.id,
            Entity::Comment(c) => &c.id,
        }
    }

    pub fn modified_at(&self) -> DateTime<Utc> {
        match self {
            Entity::Discussion(d) => d.modified_at,
            Entity::Task(t) => t.modified_at,
            Entity::Comment(c) => c.modified_at,
        }
    }

    /// Check that the entity can be indexed.
    ///
    /// Comments must point at a discussion or task.
    pub fn validate(&self) -> Result<(), HuddleError> {
        if self.id().trim().is_empty() {
            return Err(HuddleError::InvalidInput(format!(
                "{} has an empty id",
                self.entity_type()
            )));
        }
        if let Entity::Comment(c) = self {
            if !c.reference_type.accepts_comments() {
                return Err(HuddleError::InvalidInput(format!(
                    "comment {} references another comment",
                    c.id
                )));
            }
            if c.reference_id.trim().is_empty() {
                return Err(HuddleError::InvalidInput(format!(
                    "comment {} has no reference_id",
                    c.id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_comment(reference_type: EntityType) -> Entity {
        Entity::Comment(Comment {
            id: "c-1".to_string(),
            content: "looks good".to_string(),
            reference_type,
            reference_id: "T123".to_string(),
            project: Some("apollo".to_string()),
            team: None,
            modified_at: Utc::now(),
        })
    }

    #[test]
    fn test_entity_type_conversion() {
        assert_eq!(EntityType::Task.as_str(), "task");
        assert_eq!(EntityType::parse("discussion"), Some(EntityType::Discussion));
        assert_eq!(EntityType::parse("GP Task"), None);
        assert_eq!("comment".parse::<EntityType>().unwrap(), EntityType::Comment);
        assert!("invalid".parse::<EntityType>().is_err());
    }

    #[test]
    fn test_indexable_fields() {
        assert!(EntityType::Task.indexable_fields().contains(&"description"));
        assert!(!EntityType::Comment.indexable_fields().contains(&"title"));
    }

    #[test]
    fn test_comment_validation() {
        assert!(sample_comment(EntityType::Task).validate().is_ok());
        assert!(sample_comment(EntityType::Comment).validate().is_err());
    }

    #[test]
    fn test_entity_serde_tagged() {
        let json = r#"{
            "type": "task",
            "id": "T1",
            "title": "Fix login",
            "modified_at": 1700000000000
        }"#;
        let entity: Entity = serde_json::from_str(json).unwrap();
        assert_eq!(entity.entity_type(), EntityType::Task);
        assert_eq!(entity.id(), "T1");
        match entity {
            Entity::Task(t) => assert!(t.description.is_empty()),
            other => panic!("unexpected entity {:?}", other),
        }
    }
}
