//! Product search rules.
//!
//! The storefront turns a query into lower-cased word tokens; a product
//! matches when every token appears (case-insensitively) in its name, its
//! description, or its category name. This module owns the tokenization, the
//! matching predicate used to test it, the rolling log of popular searches,
//! and the suggestion list built from that log.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Minimum trimmed query length for the live search API.
pub const MIN_QUERY_LEN: usize = 2;

/// Maximum results returned by the live search API.
pub const MAX_RESULTS: usize = 8;

/// Distinct queries remembered by [`SearchLog`].
pub const SEARCH_LOG_CAPACITY: usize = 10;

/// Total suggestions returned with a search.
pub const MAX_SUGGESTIONS: usize = 5;

const MAX_LOG_SUGGESTIONS: usize = 3;
const MAX_CATEGORY_SUGGESTIONS: usize = 2;
const PREVIEW_CHARS: usize = 100;

static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w+").expect("Invalid regex"));

/// Split a query into lower-cased word tokens.
#[must_use]
pub fn tokenize(query: &str) -> Vec<String> {
    let lowered = query.to_lowercase();
    WORD_RE
        .find_iter(&lowered)
        .map(|m| m.as_str().to_owned())
        .collect()
}

/// Cache key for a query: its tokens joined by single spaces.
#[must_use]
pub fn normalize(query: &str) -> String {
    tokenize(query).join(" ")
}

/// `%token%` with `LIKE` wildcards escaped, for binding into an `ILIKE`.
#[must_use]
pub fn like_pattern(token: &str) -> String {
    let mut pattern = String::with_capacity(token.len() + 2);
    pattern.push('%');
    for c in token.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Whether a query is long enough for the live search API.
#[must_use]
pub fn is_searchable(query: &str) -> bool {
    query.trim().chars().count() >= MIN_QUERY_LEN
}

/// The searchable text of one product.
#[derive(Debug, Clone, Copy)]
pub struct Haystack<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub category: &'a str,
}

/// AND over tokens, OR over fields. An empty token list matches everything.
#[must_use]
pub fn matches(tokens: &[String], haystack: Haystack<'_>) -> bool {
    let fields = [
        haystack.name.to_lowercase(),
        haystack.description.to_lowercase(),
        haystack.category.to_lowercase(),
    ];
    tokens
        .iter()
        .all(|token| fields.iter().any(|field| field.contains(token.as_str())))
}

/// First 100 characters of a description, with `...` when truncated.
#[must_use]
pub fn description_preview(description: &str) -> String {
    if description.chars().count() > PREVIEW_CHARS {
        let head: String = description.chars().take(PREVIEW_CHARS).collect();
        format!("{head}...")
    } else {
        description.to_owned()
    }
}

/// Rolling log of the most recent distinct search queries.
///
/// Oldest entries fall off once the log holds [`SEARCH_LOG_CAPACITY`] queries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchLog {
    entries: Vec<String>,
}

impl SearchLog {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Record a query (lower-cased). Returns `false` if it was already logged.
    pub fn record(&mut self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() || self.entries.contains(&query) {
            return false;
        }
        self.entries.push(query);
        if self.entries.len() > SEARCH_LOG_CAPACITY {
            let overflow = self.entries.len() - SEARCH_LOG_CAPACITY;
            self.entries.drain(..overflow);
        }
        true
    }

    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build the suggestion list shown under the search box.
///
/// Up to three logged queries containing `query`, then up to two matching
/// category names as `"Category: <name>"`, capped at five in total.
#[must_use]
pub fn suggestions<S: AsRef<str>>(query: &str, log: &SearchLog, categories: &[S]) -> Vec<String> {
    let needle = query.trim().to_lowercase();

    let from_log = log
        .entries()
        .iter()
        .filter(|entry| entry.contains(&needle))
        .take(MAX_LOG_SUGGESTIONS)
        .cloned();

    let from_categories = categories
        .iter()
        .map(AsRef::as_ref)
        .filter(|name| name.to_lowercase().contains(&needle))
        .take(MAX_CATEGORY_SUGGESTIONS)
        .map(|name| format!("Category: {name}"));

    from_log.chain(from_categories).take(MAX_SUGGESTIONS).collect()
}
