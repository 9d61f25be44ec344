//! Result aggregation: grouping hits by type and resolving comment matches
//! to the entity they belong to.
//!
//! Comments never surface on their own. A matching comment produces an
//! entry for its parent, unless the parent itself matched directly, in which
//! case the direct entry wins regardless of hit order.
//!
//! Hits arrive newest first, so when several comments on one parent match,
//! the most recent of them supplies the parent's excerpt and the older ones
//! are dropped.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use huddle_types::EntityType;

use crate::highlight::strip_highlight;
use crate::searcher::{RawHit, RawHitSet};

/// How an entry came to be in the results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchedVia {
    /// The entity's own title or content matched
    Direct,
    /// A comment on the entity matched
    ViaComment,
}

/// One entity in the final result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultEntry {
    pub entity_type: EntityType,
    pub entity_id: String,
    pub title: Option<String>,
    /// Possibly highlighted snippet
    pub excerpt: String,
    pub project: Option<String>,
    pub team: Option<String>,
    pub matched_via: MatchedVia,
    pub modified_at: Option<DateTime<Utc>>,
}

impl ResultEntry {
    /// Excerpt with highlight markers removed.
    pub fn plain_excerpt(&self) -> String {
        strip_highlight(&self.excerpt)
    }
}

/// Grouped search response.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResult {
    pub results: BTreeMap<EntityType, Vec<ResultEntry>>,
    /// Raw match count reported by the engine, comments included
    pub total: usize,
    pub duration: Duration,
}

impl SearchResult {
    pub fn entries(&self, entity_type: EntityType) -> &[ResultEntry] {
        self.results
            .get(&entity_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Find the entry for one entity.
    pub fn find(&self, entity_type: EntityType, entity_id: &str) -> Option<&ResultEntry> {
        self.entries(entity_type)
            .iter()
            .find(|e| e.entity_id == entity_id)
    }

    /// Number of entries across all groups.
    pub fn len(&self) -> usize {
        self.results.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Fields of a parent entity resolved from the primary store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParentSummary {
    pub title: Option<String>,
    pub project: Option<String>,
    pub team: Option<String>,
    pub modified_at: Option<DateTime<Utc>>,
}

/// Primary-store lookup for parents surfaced through comments.
///
/// Ids missing from the returned map are treated as deleted parents and
/// their comment matches are dropped.
pub trait ParentLookup: Send + Sync {
    fn lookup(&self, entity_type: EntityType, ids: &[String]) -> HashMap<String, ParentSummary>;
}

/// Group raw hits by type and resolve comment matches to their parents.
///
/// Without a lookup, synthesized entries carry the comment's project and
/// team and no title; the caller may resolve them later.
pub fn aggregate(raw: RawHitSet, lookup: Option<&dyn ParentLookup>) -> SearchResult {
    let RawHitSet {
        hits,
        total,
        duration,
    } = raw;

    let mut results: BTreeMap<EntityType, Vec<ResultEntry>> = BTreeMap::new();
    let mut direct_keys: HashSet<(EntityType, String)> = HashSet::new();
    let mut comments: Vec<RawHit> = Vec::new();

    // Direct hits first, so the comment pass sees every direct key
    for hit in hits {
        if hit.entity_type == EntityType::Comment {
            comments.push(hit);
            continue;
        }
        if !direct_keys.insert((hit.entity_type, hit.entity_id.clone())) {
            continue;
        }
        results
            .entry(hit.entity_type)
            .or_default()
            .push(direct_entry(hit));
    }

    // Most recent matching comment per parent, per parent type
    let mut via_comment: BTreeMap<EntityType, Vec<(String, RawHit)>> = BTreeMap::new();
    let mut seen_parents: HashSet<(EntityType, String)> = HashSet::new();
    for comment in comments {
        let (reference_type, reference_id) =
            match (comment.reference_type, comment.reference_id.clone()) {
                (Some(t), Some(id)) if t != EntityType::Comment => (t, id),
                _ => {
                    warn!(comment_id = %comment.entity_id, "Comment hit without usable reference");
                    continue;
                }
            };
        let parent = (reference_type, reference_id);
        if direct_keys.contains(&parent) || !seen_parents.insert(parent.clone()) {
            continue;
        }
        via_comment
            .entry(parent.0)
            .or_default()
            .push((parent.1, comment));
    }

    for (parent_type, parents) in via_comment {
        let resolved = lookup.map(|l| {
            let ids: Vec<String> = parents.iter().map(|(id, _)| id.clone()).collect();
            l.lookup(parent_type, &ids)
        });

        let group = results.entry(parent_type).or_default();
        for (parent_id, comment) in parents {
            let summary = match &resolved {
                Some(found) => match found.get(&parent_id) {
                    Some(summary) => Some(summary.clone()),
                    None => {
                        debug!(%parent_type, %parent_id, "Parent of matching comment not found");
                        continue;
                    }
                },
                None => None,
            };
            group.push(synthesized_entry(parent_type, parent_id, comment, summary));
        }
    }

    results.retain(|_, entries| !entries.is_empty());

    SearchResult {
        results,
        total,
        duration,
    }
}

fn direct_entry(hit: RawHit) -> ResultEntry {
    ResultEntry {
        entity_type: hit.entity_type,
        entity_id: hit.entity_id,
        title: hit.title,
        excerpt: hit.excerpt,
        project: hit.project,
        team: hit.team,
        matched_via: MatchedVia::Direct,
        modified_at: Some(hit.modified_at),
    }
}

fn synthesized_entry(
    entity_type: EntityType,
    entity_id: String,
    comment: RawHit,
    summary: Option<ParentSummary>,
) -> ResultEntry {
    let summary = summary.unwrap_or_default();
    ResultEntry {
        entity_type,
        entity_id,
        title: summary.title,
        excerpt: comment.excerpt,
        project: summary.project.or(comment.project),
        team: summary.team.or(comment.team),
        matched_via: MatchedVia::ViaComment,
        modified_at: summary.modified_at,
    }
}
