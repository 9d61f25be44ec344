//! Query normalization.
//!
//! Turns raw user text into a [`NormalizedQuery`]: an AND of terms, each
//! matched against `title` OR `content`.
//!
//! - One token: prefix match, so `proj` finds "Project Alpha".
//! - Several tokens: every token is a substring match and all of them must
//!   be present somewhere in the two fields, in any order.
//!
//! Characters with meaning in query syntax are never passed through; only
//! alphanumeric runs survive, plus a trailing `*` as explicit wildcard.

use std::fmt;

/// Explicit wildcard marker accepted at the end of a token.
pub const WILDCARD: char = '*';

/// Fields a normalized query matches against.
pub const QUERY_FIELDS: [&str; 2] = ["title", "content"];

/// How a single term matches indexed words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Word starts with the term
    Prefix,
    /// Word contains the term anywhere
    Substring,
}

/// One lowercased query token with its match mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTerm {
    pub text: String,
    pub mode: MatchMode,
}

impl QueryTerm {
    pub fn prefix(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            mode: MatchMode::Prefix,
        }
    }

    pub fn substring(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            mode: MatchMode::Substring,
        }
    }
}

impl fmt::Display for QueryTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode {
            MatchMode::Prefix => write!(f, "{}{}", self.text, WILDCARD),
            MatchMode::Substring => write!(f, "{}{}{}", WILDCARD, self.text, WILDCARD),
        }
    }
}

/// Result of normalizing raw query text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizedQuery {
    /// Nothing matchable was left; rejected before reaching the index
    Empty,
    /// AND of terms, each matched against title OR content
    Terms(Vec<QueryTerm>),
}

impl NormalizedQuery {
    pub fn is_empty(&self) -> bool {
        match self {
            NormalizedQuery::Empty => true,
            NormalizedQuery::Terms(terms) => terms.is_empty(),
        }
    }

    pub fn terms(&self) -> &[QueryTerm] {
        match self {
            NormalizedQuery::Empty => &[],
            NormalizedQuery::Terms(terms) => terms,
        }
    }
}

impl fmt::Display for NormalizedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let terms = self.terms();
        if terms.is_empty() {
            return Ok(());
        }
        write!(f, "@{}:(", QUERY_FIELDS.join("|"))?;
        for (i, term) in terms.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", term)?;
        }
        f.write_str(")")
    }
}

/// Normalize raw query text.
pub fn normalize(raw: &str) -> NormalizedQuery {
    let tokens = tokenize(raw);

    match tokens.len() {
        0 => NormalizedQuery::Empty,
        1 => {
            // An explicit trailing wildcard is the same prefix match
            let (text, _explicit) = tokens.into_iter().next().unwrap_or_default();
            NormalizedQuery::Terms(vec![QueryTerm::prefix(text)])
        }
        _ => NormalizedQuery::Terms(
            tokens
                .into_iter()
                .map(|(text, _)| QueryTerm::substring(text))
                .collect(),
        ),
    }
}

/// Normalize and render to the canonical query string, e.g. `@title|content:(proj*)`.
///
/// Returns an empty string for an empty query.
pub fn normalize_to_string(raw: &str) -> String {
    normalize(raw).to_string()
}

/// Split on whitespace and reserved characters, keeping alphanumeric runs.
///
/// Returns lowercased tokens paired with whether they carried an explicit
/// trailing wildcard.
fn tokenize(raw: &str) -> Vec<(String, bool)> {
    let mut tokens = Vec::new();

    for word in raw.split_whitespace() {
        let explicit = word.ends_with(WILDCARD);
        let mut parts: Vec<String> = word
            .split(|c: char| !c.is_alphanumeric())
            .filter(|part| !part.is_empty())
            .map(|part| part.to_lowercase())
            .collect();

        let last = parts.pop();
        tokens.extend(parts.into_iter().map(|p| (p, false)));
        if let Some(last) = last {
            tokens.push((last, explicit));
        }
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_token_gets_prefix_wildcard() {
        assert_eq!(
            normalize("proj"),
            NormalizedQuery::Terms(vec![QueryTerm::prefix("proj")])
        );
        assert_eq!(normalize_to_string("proj"), "@title|content:(proj*)");
    }

    #[test]
    fn test_explicit_wildcard_not_doubled() {
        assert_eq!(normalize_to_string("proj*"), "@title|content:(proj*)");
    }

    #[test]
    fn test_multi_token_substring_and() {
        assert_eq!(
            normalize("alpha proj"),
            NormalizedQuery::Terms(vec![
                QueryTerm::substring("alpha"),
                QueryTerm::substring("proj"),
            ])
        );
        assert_eq!(
            normalize_to_string("alpha proj"),
            "@title|content:(*alpha* *proj*)"
        );
    }

    #[test]
    fn test_multi_token_drops_explicit_wildcard() {
        assert_eq!(
            normalize_to_string("alpha proj*"),
            "@title|content:(*alpha* *proj*)"
        );
    }

    #[test]
    fn test_whitespace_is_trimmed_and_collapsed() {
        assert_eq!(
            normalize("  Urgent \t\n  FIX  "),
            NormalizedQuery::Terms(vec![
                QueryTerm::substring("urgent"),
                QueryTerm::substring("fix"),
            ])
        );
    }

    #[test]
    fn test_reserved_characters_are_stripped() {
        assert_eq!(
            normalize_to_string("@title:(drop) | -x"),
            "@title|content:(*title* *drop* *x*)"
        );
        assert_eq!(normalize_to_string("\"bug\""), "@title|content:(bug*)");
    }

    #[test]
    fn test_reserved_characters_split_words() {
        assert_eq!(
            normalize("release-notes"),
            NormalizedQuery::Terms(vec![
                QueryTerm::substring("release"),
                QueryTerm::substring("notes"),
            ])
        );
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(normalize(""), NormalizedQuery::Empty);
        assert_eq!(normalize("   \t"), NormalizedQuery::Empty);
        assert_eq!(normalize("*** ()"), NormalizedQuery::Empty);
        assert!(normalize("").is_empty());
        assert_eq!(normalize_to_string("  "), "");
    }

    #[test]
    fn test_unicode_tokens_are_lowercased() {
        assert_eq!(
            normalize("Überprüfung"),
            NormalizedQuery::Terms(vec![QueryTerm::prefix("überprüfung")])
        );
    }
}
