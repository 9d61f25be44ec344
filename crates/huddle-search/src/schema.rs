//! Tantivy schema definition for entity search.
//!
//! One document per discussion, task or comment. `title` and `content`
//! are the only tokenized fields; everything else is an exact-match
//! STRING field used for keys, filters and comment-to-parent linkage.

use tantivy::schema::{Field, Schema, FAST, INDEXED, STORED, STRING, TEXT};

use crate::SearchError;

/// Name of the fast field used for recency ordering.
pub const MODIFIED_AT_FIELD: &str = "modified_at";

/// Schema field handles for efficient access
#[derive(Debug, Clone)]
pub struct SearchSchema {
    schema: Schema,
    /// Primary key: "<entity_type>:<entity_id>" (STRING | STORED)
    pub key: Field,
    /// "discussion", "task" or "comment" (STRING | STORED)
    pub entity_type: Field,
    /// Entity id within its type (STRING | STORED)
    pub entity_id: Field,
    /// Title, absent for comments (TEXT | STORED)
    pub title: Field,
    /// Body text (TEXT | STORED)
    pub content: Field,
    /// Denormalized project (STRING | STORED)
    pub project: Field,
    /// Denormalized team (STRING | STORED)
    pub team: Field,
    /// Parent entity type, comments only (STRING | STORED)
    pub reference_type: Field,
    /// Parent entity id, comments only (STRING | STORED)
    pub reference_id: Field,
    /// Parent key, comments only (STRING)
    pub reference_key: Field,
    /// Last modification in milliseconds (i64 INDEXED | STORED | FAST)
    pub modified_at: Field,
}

impl SearchSchema {
    /// Get the underlying Tantivy schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Create a SearchSchema from an existing Tantivy Schema
    pub fn from_schema(schema: Schema) -> Result<Self, SearchError> {
        let field = |name: &str| {
            schema
                .get_field(name)
                .map_err(|_| SearchError::SchemaMismatch(format!("missing {} field", name)))
        };

        Ok(Self {
            key: field("key")?,
            entity_type: field("entity_type")?,
            entity_id: field("entity_id")?,
            title: field("title")?,
            content: field("content")?,
            project: field("project")?,
            team: field("team")?,
            reference_type: field("reference_type")?,
            reference_id: field("reference_id")?,
            reference_key: field("reference_key")?,
            modified_at: field(MODIFIED_AT_FIELD)?,
            schema,
        })
    }

    /// Fields matched by free-text queries.
    pub fn text_fields(&self) -> [Field; 2] {
        [self.title, self.content]
    }
}

/// Build the entity search schema.
pub fn build_entity_schema() -> SearchSchema {
    let mut schema_builder = Schema::builder();

    let key = schema_builder.add_text_field("key", STRING | STORED);
    let entity_type = schema_builder.add_text_field("entity_type", STRING | STORED);
    let entity_id = schema_builder.add_text_field("entity_id", STRING | STORED);

    // Tokenized with the default analyzer (lowercased words)
    let title = schema_builder.add_text_field("title", TEXT | STORED);
    let content = schema_builder.add_text_field("content", TEXT | STORED);

    let project = schema_builder.add_text_field("project", STRING | STORED);
    let team = schema_builder.add_text_field("team", STRING | STORED);

    let reference_type = schema_builder.add_text_field("reference_type", STRING | STORED);
    let reference_id = schema_builder.add_text_field("reference_id", STRING | STORED);
    let reference_key = schema_builder.add_text_field("reference_key", STRING);

    let modified_at = schema_builder.add_i64_field(MODIFIED_AT_FIELD, INDEXED | STORED | FAST);

    let schema = schema_builder.build();

    SearchSchema {
        schema,
        key,
        entity_type,
        entity_id,
        title,
        content,
        project,
        team,
        reference_type,
        reference_id,
        reference_key,
        modified_at,
    }
}
