//! Command-level tests against a temporary index directory.

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use huddle_cli::{
    open_service, run, run_filters, run_query, run_rebuild, with_corpus_lookup, Commands,
};
use huddle_indexing::RebuildConfig;
use huddle_search::MatchedVia;
use huddle_types::{EntityType, Settings};

const CORPUS: &str = r#"[
    {"type": "discussion", "id": "D1", "title": "Project Alpha kickoff", "content": "scope and owners",
     "project": "apollo", "team": "core", "modified_at": 1700000000000},
    {"type": "task", "id": "T123", "title": "Release checklist", "description": "cut the branch",
     "project": "apollo", "team": "core", "modified_at": 1700000060000},
    {"type": "task", "id": "T200", "title": "Bug in export", "description": "",
     "project": "zeus", "team": "web", "modified_at": 1700000120000},
    {"type": "comment", "id": "c1", "content": "urgent fix needed", "reference_type": "task",
     "reference_id": "T123", "project": "apollo", "team": "core", "modified_at": 1700000180000}
]"#;

fn setup() -> (TempDir, Settings) {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("corpus.json"), CORPUS).unwrap();
    let settings = Settings {
        search_index_path: temp_dir.path().join("index").to_string_lossy().to_string(),
        ..Default::default()
    };
    (temp_dir, settings)
}

#[test]
fn test_rebuild_query_filters() {
    let (temp_dir, settings) = setup();
    let service = open_service(&settings).unwrap();

    let rebuilt = run_rebuild(
        &service,
        &temp_dir.path().join("corpus.json"),
        &RebuildConfig::default(),
    )
    .unwrap();
    assert_eq!(rebuilt.progress.indexed(), 4);

    let result = run_query(&service, "urgent fix", Vec::new(), 0).unwrap();
    let entry = result.find(EntityType::Task, "T123").unwrap();
    assert_eq!(entry.matched_via, MatchedVia::ViaComment);

    let result = run_query(
        &service,
        "proj",
        vec![("project".to_string(), "apollo".to_string())],
        0,
    )
    .unwrap();
    assert!(result.find(EntityType::Discussion, "D1").is_some());

    let options = run_filters(&service).unwrap();
    assert_eq!(options["entity_type"], vec!["discussion", "task"]);
    assert_eq!(options["project"], vec!["apollo", "zeus"]);
    assert_eq!(options["team"], vec!["core", "web"]);
}

#[test]
fn test_unknown_filter_is_an_error() {
    let (_temp_dir, settings) = setup();
    let service = open_service(&settings).unwrap();

    let err = run_query(
        &service,
        "bug",
        vec![("owner".to_string(), "me".to_string())],
        0,
    )
    .unwrap_err();
    assert!(err.to_string().contains("failed"));
}

#[test]
fn test_repeated_filter_field_is_an_error() {
    let (_temp_dir, settings) = setup();
    let service = open_service(&settings).unwrap();

    let err = run_query(
        &service,
        "bug",
        vec![
            ("project".to_string(), "apollo".to_string()),
            ("project".to_string(), "zeus".to_string()),
        ],
        0,
    )
    .unwrap_err();
    assert!(format!("{:#}", err).contains("given more than once"));
}

#[test]
fn test_query_with_corpus_resolves_parent_titles() {
    let (temp_dir, settings) = setup();
    let corpus_path = temp_dir.path().join("corpus.json");
    let service = open_service(&settings).unwrap();
    run_rebuild(&service, &corpus_path, &RebuildConfig::default()).unwrap();

    let service = with_corpus_lookup(service, &corpus_path).unwrap();
    let result = run_query(&service, "urgent fix", Vec::new(), 0).unwrap();
    let entry = result.find(EntityType::Task, "T123").unwrap();
    assert_eq!(entry.matched_via, MatchedVia::ViaComment);
    assert_eq!(entry.title.as_deref(), Some("Release checklist"));
    drop(service);

    let output = run(
        &settings,
        Commands::Query {
            text: "urgent".to_string(),
            filters: Vec::new(),
            start: 0,
            corpus: Some(corpus_path),
        },
    )
    .unwrap();
    assert!(output.contains("Release checklist"));
}

#[test]
fn test_missing_corpus_is_an_error() {
    let (temp_dir, settings) = setup();
    let service = open_service(&settings).unwrap();

    let result = run_rebuild(
        &service,
        &temp_dir.path().join("missing.json"),
        &RebuildConfig::default(),
    );
    assert!(result.is_err());
}

#[test]
fn test_run_renders_json() {
    let (_temp_dir, settings) = setup();

    let output = run(
        &settings,
        Commands::Normalize {
            text: "Project".to_string(),
        },
    )
    .unwrap();
    let json: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(json["normalized"], "@title|content:(project*)");

    let output = run(
        &settings,
        Commands::Query {
            text: "nothing".to_string(),
            filters: Vec::new(),
            start: 0,
            corpus: None,
        },
    )
    .unwrap();
    let json: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(json["total"], 0);
}
