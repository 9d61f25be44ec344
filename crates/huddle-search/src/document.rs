//! Document mapping between index entries and Tantivy documents.

use chrono::{DateTime, Utc};
use tantivy::schema::{Field, Value};
use tantivy::TantivyDocument;

use huddle_types::{EntityType, IndexEntry};

use crate::schema::SearchSchema;

/// Convert an index entry to a Tantivy document.
///
/// Optional fields are omitted rather than stored empty, so an exact-match
/// filter never matches a missing value.
pub fn entry_to_doc(schema: &SearchSchema, entry: &IndexEntry) -> TantivyDocument {
    let mut doc = TantivyDocument::default();

    doc.add_text(schema.key, entry.key());
    doc.add_text(schema.entity_type, entry.entity_type.as_str());
    doc.add_text(schema.entity_id, &entry.entity_id);
    if let Some(title) = entry.title.as_deref().filter(|t| !t.is_empty()) {
        doc.add_text(schema.title, title);
    }
    doc.add_text(schema.content, &entry.content);
    add_optional(&mut doc, schema.project, entry.project.as_deref());
    add_optional(&mut doc, schema.team, entry.team.as_deref());

    if let Some(reference_type) = entry.reference_type {
        doc.add_text(schema.reference_type, reference_type.as_str());
    }
    add_optional(&mut doc, schema.reference_id, entry.reference_id.as_deref());
    if let Some(reference_key) = entry.reference_key() {
        doc.add_text(schema.reference_key, reference_key);
    }

    doc.add_i64(schema.modified_at, entry.modified_at.timestamp_millis());
    doc
}

fn add_optional(doc: &mut TantivyDocument, field: Field, value: Option<&str>) {
    if let Some(v) = value.filter(|v| !v.is_empty()) {
        doc.add_text(field, v);
    }
}

/// Read a stored text field.
pub fn stored_text(doc: &TantivyDocument, field: Field) -> Option<String> {
    doc.get_first(field)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

/// Read the stored entity type.
pub fn stored_entity_type(doc: &TantivyDocument, field: Field) -> Option<EntityType> {
    doc.get_first(field)
        .and_then(|v| v.as_str())
        .and_then(EntityType::parse)
}

/// Read the stored modification time.
pub fn stored_modified_at(doc: &TantivyDocument, schema: &SearchSchema) -> DateTime<Utc> {
    doc.get_first(schema.modified_at)
        .and_then(|v| v.as_i64())
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .unwrap_or_default()
}
