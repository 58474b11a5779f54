//! Search string construction.
//!
//! Each emitted city carries a `search` field: a space-joined list of lowercase,
//! category-tagged tokens in fixed priority order.
//!
//! 1. `tz:<alias>` for every alias of the city's timezone, in alias-table order
//! 2. `city:<name>`
//! 3. `city:<ascii-folded name>`, only when folding changed the name
//! 4. `country:<country name>`
//!
//! Repeated tokens keep their first position, so a downstream ranker can weight
//! matches by category and by position.

use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::constants::{CITY_TOKEN_TAG, COUNTRY_TOKEN_TAG, TIMEZONE_TOKEN_TAG};

/// Convert text to a best-effort ASCII equivalent.
///
/// The text is decomposed (NFKD), then combining marks and any remaining
/// non-ASCII characters are dropped.
///
/// # Examples
/// ```
/// use cityindex::search::ascii_fold;
/// assert_eq!(ascii_fold("Samandağ"), "Samandag");
/// assert_eq!(ascii_fold("São Paulo"), "Sao Paulo");
/// assert_eq!(ascii_fold("Berlin"), "Berlin");
/// ```
pub fn ascii_fold(text: &str) -> String {
    text.nfkd()
        .filter(|c| !is_combining_mark(*c) && c.is_ascii())
        .collect()
}

/// Build the tagged, deduplicated search string for one city.
///
/// # Arguments
/// * `name` - City display name as it appears in the feed
/// * `country` - Resolved country display name
/// * `timezone_aliases` - Aliases of the city's timezone, highest priority first
///
/// # Examples
/// ```
/// use cityindex::search::build_search;
/// let aliases = vec!["EST".to_string(), "Eastern Time".to_string()];
/// assert_eq!(
///     build_search("New York", "United States", &aliases),
///     "tz:est tz:eastern time city:new york country:united states"
/// );
/// ```
pub fn build_search(name: &str, country: &str, timezone_aliases: &[String]) -> String {
    search_tokens(name, country, timezone_aliases).join(" ")
}

/// Ordered, deduplicated search tokens for one city.
pub fn search_tokens(name: &str, country: &str, timezone_aliases: &[String]) -> Vec<String> {
    let name_lower = name.to_lowercase();
    let folded_lower = ascii_fold(name).to_lowercase();

    let mut candidates: Vec<String> = timezone_aliases
        .iter()
        .map(|alias| tagged(TIMEZONE_TOKEN_TAG, &alias.to_lowercase()))
        .collect();

    candidates.push(tagged(CITY_TOKEN_TAG, &name_lower));
    if folded_lower != name_lower {
        candidates.push(tagged(CITY_TOKEN_TAG, &folded_lower));
    }
    candidates.push(tagged(COUNTRY_TOKEN_TAG, &country.to_lowercase()));

    dedup_preserving_order(candidates)
}

/// Prefix a token value with its category tag; empty values produce no token.
fn tagged(tag: &str, value: &str) -> String {
    if value.is_empty() {
        String::new()
    } else {
        format!("{}{}", tag, value)
    }
}

/// Drop empty tokens and later repeats, keeping first occurrences in order.
fn dedup_preserving_order(tokens: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(tokens.len());
    tokens
        .into_iter()
        .filter(|token| !token.is_empty() && seen.insert(token.clone()))
        .collect()
}
