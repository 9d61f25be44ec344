//! Rendering of normalized queries and filters into Tantivy queries.
//!
//! This is the only place query syntax for the backend is produced. Terms
//! become anchored regexes over the tokenized `title`/`content` term
//! dictionaries, so no user text ever reaches a query parser.

use std::collections::{BTreeMap, BTreeSet};

use tantivy::query::{BooleanQuery, Occur, Query, RegexQuery, TermQuery};
use tantivy::schema::IndexRecordOption;
use tantivy::Term;

use huddle_types::EntityType;

use crate::error::SearchError;
use crate::normalize::{MatchMode, NormalizedQuery, QueryTerm};
use crate::schema::SearchSchema;

/// Exact-match filters keyed by field name, AND-combined.
///
/// A field given twice with different values cannot be satisfied by any
/// entry; it is remembered and rejected when the filters are validated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilters {
    fields: BTreeMap<String, String>,
    conflicting: BTreeSet<String>,
}

impl SearchFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(field.into(), value.into());
        self
    }

    pub fn project(value: impl Into<String>) -> Self {
        Self::new().with("project", value)
    }

    pub fn entity_type(entity_type: EntityType) -> Self {
        Self::new().with("entity_type", entity_type.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Validate and convert into typed clauses.
    pub fn clauses(&self) -> Result<Vec<FilterClause>, SearchError> {
        if let Some(field) = self.conflicting.iter().next() {
            return Err(SearchError::InvalidQuery(format!(
                "filter {} given more than once with different values",
                field
            )));
        }
        self.iter()
            .map(|(field, value)| FilterClause::parse(field, value))
            .collect()
    }

    fn insert(&mut self, field: String, value: String) {
        match self.fields.get(&field) {
            Some(existing) if *existing != value => {
                self.conflicting.insert(field);
            }
            Some(_) => {}
            None => {
                self.fields.insert(field, value);
            }
        }
    }
}

impl From<BTreeMap<String, String>> for SearchFilters {
    fn from(fields: BTreeMap<String, String>) -> Self {
        Self {
            fields,
            conflicting: BTreeSet::new(),
        }
    }
}

impl FromIterator<(String, String)> for SearchFilters {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut filters = Self::new();
        for (field, value) in iter {
            filters.insert(field, value);
        }
        filters
    }
}

/// Filter field names accepted by the engine.
pub const FILTER_FIELDS: [&str; 3] = ["entity_type", "project", "team"];

/// One validated exact-match constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterClause {
    /// Entries of this type, or comments attached to an entity of this type
    EntityType(EntityType),
    Project(String),
    Team(String),
}

impl FilterClause {
    pub fn parse(field: &str, value: &str) -> Result<Self, SearchError> {
        if value.is_empty() {
            return Err(SearchError::InvalidQuery(format!(
                "filter {} has an empty value",
                field
            )));
        }
        match field {
            "entity_type" => EntityType::parse(value)
                .map(FilterClause::EntityType)
                .ok_or_else(|| {
                    SearchError::InvalidQuery(format!("unknown entity type: {}", value))
                }),
            "project" => Ok(FilterClause::Project(value.to_string())),
            "team" => Ok(FilterClause::Team(value.to_string())),
            other => Err(SearchError::InvalidQuery(format!(
                "unknown filter field: {} (expected one of {})",
                other,
                FILTER_FIELDS.join(", ")
            ))),
        }
    }
}

/// Build the full query: text match AND every filter clause.
pub fn build_query(
    schema: &SearchSchema,
    query: &NormalizedQuery,
    filters: &[FilterClause],
) -> Result<Box<dyn Query>, SearchError> {
    let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();
    clauses.push((Occur::Must, text_query(schema, query)?));
    for filter in filters {
        clauses.push((Occur::Must, filter_query(schema, filter)));
    }
    Ok(Box::new(BooleanQuery::new(clauses)))
}

/// AND over terms, each an OR over `title`/`content`.
pub fn text_query(
    schema: &SearchSchema,
    query: &NormalizedQuery,
) -> Result<Box<dyn Query>, SearchError> {
    let terms = query.terms();
    if terms.is_empty() {
        return Err(SearchError::InvalidQuery("query is empty".to_string()));
    }

    let mut must = Vec::with_capacity(terms.len());
    for term in terms {
        let pattern = term_pattern(term);
        let mut should: Vec<(Occur, Box<dyn Query>)> = Vec::new();
        for field in schema.text_fields() {
            should.push((Occur::Should, Box::new(RegexQuery::from_pattern(&pattern, field)?)));
        }
        must.push((Occur::Must, Box::new(BooleanQuery::new(should)) as Box<dyn Query>));
    }

    Ok(Box::new(BooleanQuery::new(must)))
}

fn filter_query(schema: &SearchSchema, filter: &FilterClause) -> Box<dyn Query> {
    match filter {
        FilterClause::EntityType(entity_type) => {
            let value = entity_type.as_str();
            let mut should = vec![(Occur::Should, term_query(schema.entity_type, value))];
            if entity_type.accepts_comments() {
                should.push((Occur::Should, term_query(schema.reference_type, value)));
            }
            Box::new(BooleanQuery::new(should))
        }
        FilterClause::Project(value) => term_query(schema.project, value),
        FilterClause::Team(value) => term_query(schema.team, value),
    }
}

fn term_query(field: tantivy::schema::Field, value: &str) -> Box<dyn Query> {
    Box::new(TermQuery::new(
        Term::from_field_text(field, value),
        IndexRecordOption::Basic,
    ))
}

/// Regex over whole indexed terms.
///
/// Term text is alphanumeric after normalization; anything else is escaped
/// so a hand-built term cannot widen the pattern.
pub fn term_pattern(term: &QueryTerm) -> String {
    let mut escaped = String::with_capacity(term.text.len());
    for c in term.text.chars() {
        if !c.is_alphanumeric() {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    match term.mode {
        MatchMode::Prefix => format!("{}.*", escaped),
        MatchMode::Substring => format!(".*{}.*", escaped),
    }
}
