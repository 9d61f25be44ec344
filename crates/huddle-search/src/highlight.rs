//! Excerpt highlighting with Tantivy's snippet generator.
//!
//! Query terms are prefix or substring patterns, which the snippet generator
//! cannot extract from a regex query. They are first expanded to the indexed
//! words they match in the `content` term dictionary of every segment; the
//! generator then marks those words, whole, wherever they occur in the text.
//!
//! Excerpts are HTML: the field text is escaped and matches are wrapped in
//! [`HIGHLIGHT_PRE`]/[`HIGHLIGHT_POST`]. The excerpt runs from the start of
//! the field to its last word, so trailing punctuation is dropped.

use std::collections::BTreeSet;

use tantivy::query::{BooleanQuery, Occur, Query, TermQuery};
use tantivy::schema::{Field, IndexRecordOption};
use tantivy::snippet::SnippetGenerator;
use tantivy::{Searcher, Term};
use tracing::debug;

use crate::error::SearchError;
use crate::normalize::{MatchMode, QueryTerm};

pub const HIGHLIGHT_PRE: &str = "<b>";
pub const HIGHLIGHT_POST: &str = "</b>";

/// Highlights query matches in one field for the hits of a single search.
pub struct Highlighter {
    generator: SnippetGenerator,
    words: BTreeSet<String>,
}

impl Highlighter {
    /// Expand `terms` against `field` and prepare a snippet generator.
    pub fn new(searcher: &Searcher, field: Field, terms: &[QueryTerm]) -> Result<Self, SearchError> {
        let words = expand_terms(searcher, field, terms)?;

        let clauses: Vec<(Occur, Box<dyn Query>)> = words
            .iter()
            .map(|word| {
                let term = Term::from_field_text(field, word);
                let query: Box<dyn Query> =
                    Box::new(TermQuery::new(term, IndexRecordOption::Basic));
                (Occur::Should, query)
            })
            .collect();
        let query = BooleanQuery::new(clauses);

        let mut generator = SnippetGenerator::create(searcher, &query, field)?;
        // One fragment spanning the whole field.
        generator.set_max_num_chars(usize::MAX);

        debug!(terms = terms.len(), words = words.len(), "Prepared highlighter");
        Ok(Self { generator, words })
    }

    /// Indexed words the query terms expanded to.
    pub fn words(&self) -> &BTreeSet<String> {
        &self.words
    }

    /// Highlight matched words in `text`.
    ///
    /// Fails with [`SearchError::HighlightUnsupported`] when the text is empty
    /// or contains none of the matched words (e.g. the hit matched on its title).
    pub fn highlight(&self, text: &str) -> Result<String, SearchError> {
        if text.is_empty() {
            return Err(SearchError::HighlightUnsupported("field is empty".to_string()));
        }

        let mut snippet = self.generator.snippet(text);
        if snippet.is_empty() {
            return Err(SearchError::HighlightUnsupported(
                "no query term occurs in field".to_string(),
            ));
        }
        snippet.set_snippet_prefix_postfix(HIGHLIGHT_PRE, HIGHLIGHT_POST);
        Ok(snippet.to_html())
    }

    /// Highlight, falling back to the plain text.
    ///
    /// Returns the excerpt and whether it was highlighted.
    pub fn highlight_or_plain(&self, text: &str) -> (String, bool) {
        match self.highlight(text) {
            Ok(highlighted) => (highlighted, true),
            Err(_) => (text.to_string(), false),
        }
    }
}

/// Indexed words of `field` matched by any of `terms`.
///
/// A prefix term matches words starting with it, a substring term words
/// containing it, mirroring the regex queries the hits were found with.
pub fn expand_terms(
    searcher: &Searcher,
    field: Field,
    terms: &[QueryTerm],
) -> Result<BTreeSet<String>, SearchError> {
    let mut words = BTreeSet::new();

    for segment_reader in searcher.segment_readers() {
        let inverted_index = segment_reader.inverted_index(field)?;
        let term_dict = inverted_index.terms();

        for term in terms.iter().filter(|t| !t.text.is_empty()) {
            match term.mode {
                MatchMode::Prefix => {
                    let mut stream = term_dict.range().ge(term.text.as_bytes()).into_stream()?;
                    while stream.advance() {
                        if !stream.key().starts_with(term.text.as_bytes()) {
                            break;
                        }
                        if let Ok(word) = std::str::from_utf8(stream.key()) {
                            words.insert(word.to_string());
                        }
                    }
                }
                MatchMode::Substring => {
                    let mut stream = term_dict.stream()?;
                    while stream.advance() {
                        if let Ok(word) = std::str::from_utf8(stream.key()) {
                            if word.contains(term.text.as_str()) {
                                words.insert(word.to_string());
                            }
                        }
                    }
                }
            }
        }
    }

    Ok(words)
}

/// Remove highlight markers from an excerpt.
pub fn strip_highlight(excerpt: &str) -> String {
    excerpt.replace(HIGHLIGHT_PRE, "").replace(HIGHLIGHT_POST, "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tantivy::doc;

    use crate::index::{SearchIndex, SearchIndexConfig};

    /// In-memory index whose `content` holds one document per text.
    fn searcher_over(texts: &[&str]) -> (Searcher, Field) {
        let index = SearchIndex::open_or_create(SearchIndexConfig::in_memory()).unwrap();
        let content = index.schema().content;
        let mut writer = index.writer().unwrap();
        for text in texts {
            writer.add_document(doc!(content => *text)).unwrap();
        }
        writer.commit().unwrap();
        let reader = index.reader().unwrap();
        reader.reload().unwrap();
        (reader.searcher(), content)
    }

    #[test]
    fn test_highlight_substring_terms() {
        let (searcher, content) = searcher_over(&["Urgent fix needed", "prefix rules"]);
        let terms = vec![QueryTerm::substring("urgent"), QueryTerm::substring("fix")];
        let highlighter = Highlighter::new(&searcher, content, &terms).unwrap();

        assert!(highlighter.words().contains("prefix"));
        assert_eq!(
            highlighter.highlight("Urgent fix needed").unwrap(),
            "<b>Urgent</b> <b>fix</b> needed"
        );
        assert_eq!(
            highlighter.highlight("prefix rules").unwrap(),
            "<b>prefix</b> rules"
        );
    }

    #[test]
    fn test_prefix_highlights_word_starts_only() {
        let text = "Project Alpha and subprojects";
        let (searcher, content) = searcher_over(&[text]);
        let highlighter = Highlighter::new(&searcher, content, &[QueryTerm::prefix("proj")]).unwrap();

        let words: Vec<&str> = highlighter.words().iter().map(String::as_str).collect();
        assert_eq!(words, vec!["project"]);
        assert_eq!(
            highlighter.highlight(text).unwrap(),
            "<b>Project</b> Alpha and subprojects"
        );
    }

    #[test]
    fn test_unsupported_when_no_occurrence() {
        let (searcher, content) = searcher_over(&["bug in login", "nothing relevant"]);
        let highlighter = Highlighter::new(&searcher, content, &[QueryTerm::prefix("bug")]).unwrap();

        let err = highlighter.highlight("nothing relevant").unwrap_err();
        assert!(matches!(err, SearchError::HighlightUnsupported(_)));
        assert!(matches!(
            highlighter.highlight(""),
            Err(SearchError::HighlightUnsupported(_))
        ));
    }

    #[test]
    fn test_no_indexed_match_falls_back_to_plain() {
        let (searcher, content) = searcher_over(&["title-only match"]);
        let highlighter = Highlighter::new(&searcher, content, &[QueryTerm::prefix("bug")]).unwrap();

        assert!(highlighter.words().is_empty());
        assert_eq!(
            highlighter.highlight_or_plain("title-only match"),
            ("title-only match".to_string(), false)
        );
    }

    #[test]
    fn test_unicode_case_folding() {
        let text = "Überprüfung läuft";
        let (searcher, content) = searcher_over(&[text]);
        let highlighter = Highlighter::new(&searcher, content, &[QueryTerm::prefix("über")]).unwrap();

        assert_eq!(
            highlighter.highlight(text).unwrap(),
            "<b>Überprüfung</b> läuft"
        );
    }

    #[test]
    fn test_markup_in_text_is_escaped() {
        let text = "fix <script> tag";
        let (searcher, content) = searcher_over(&[text]);
        let highlighter = Highlighter::new(&searcher, content, &[QueryTerm::prefix("fix")]).unwrap();

        assert_eq!(
            highlighter.highlight(text).unwrap(),
            "<b>fix</b> &lt;script&gt; tag"
        );
    }

    #[test]
    fn test_strip_highlight() {
        assert_eq!(
            strip_highlight("<b>urgent</b> <b>fix</b> needed"),
            "urgent fix needed"
        );
    }
}
