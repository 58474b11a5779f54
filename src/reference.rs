//! Reference tables loaded once at startup.
//!
//! Two lookup tables feed the pipeline:
//! - [`CountryLookup`]: ISO country code to country display name, built from a JSON
//!   array of `{ "abbreviation": ..., "country": ... }` objects.
//! - [`TimezoneAliasTable`]: IANA timezone name to an ordered list of human-readable
//!   aliases, built from a JSON object of string arrays.
//!
//! Both are immutable once constructed and are passed by reference into the later
//! stages. Failing to read or parse either file is fatal for the run.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// One entry of the country table. Entries may omit either field.
#[derive(Debug, Deserialize, Clone)]
pub struct CountryEntry {
    pub abbreviation: Option<String>,
    pub country: Option<String>,
}

/// Country code to country name mapping.
#[derive(Debug, Default, Clone)]
pub struct CountryLookup {
    names: HashMap<String, String>,
}

impl CountryLookup {
    /// Build the lookup from parsed entries.
    ///
    /// Entries missing either field are skipped. A repeated abbreviation replaces
    /// the earlier mapping.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = CountryEntry>,
    {
        let names = entries
            .into_iter()
            .filter_map(|entry| match (entry.abbreviation, entry.country) {
                (Some(code), Some(name)) => Some((code, name)),
                _ => None,
            })
            .collect();
        Self { names }
    }

    /// Parse the lookup from the JSON text of a country table.
    pub fn from_json(content: &str) -> Result<Self> {
        let entries: Vec<CountryEntry> =
            serde_json::from_str(content).context("Country table is not a JSON array of objects")?;
        Ok(Self::from_entries(entries))
    }

    /// Read and parse a country table file.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read country table from {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Failed to parse country table from {}", path.display()))
    }

    /// Resolve a country code to its display name.
    ///
    /// Codes mapped to an empty name are treated as unknown.
    pub fn resolve(&self, code: &str) -> Option<&str> {
        self.names
            .get(code)
            .map(String::as_str)
            .filter(|name| !name.is_empty())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Timezone name to ordered alias list.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(transparent)]
pub struct TimezoneAliasTable {
    aliases: HashMap<String, Vec<String>>,
}

impl TimezoneAliasTable {
    pub fn new(aliases: HashMap<String, Vec<String>>) -> Self {
        Self { aliases }
    }

    /// Parse the alias table from JSON text. Timezone names are not validated.
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .context("Timezone alias table is not a JSON object of string arrays")
    }

    /// Read and parse a timezone alias file.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).with_context(|| {
            format!("Failed to read timezone aliases from {}", path.display())
        })?;
        Self::from_json(&content)
            .with_context(|| format!("Failed to parse timezone aliases from {}", path.display()))
    }

    /// Aliases for a timezone in stored order; empty when the timezone is unknown.
    pub fn aliases_for(&self, timezone: &str) -> &[String] {
        self.aliases
            .get(timezone)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

/// Both reference tables, loaded together before the feed is read.
#[derive(Debug, Default, Clone)]
pub struct ReferenceData {
    pub countries: CountryLookup,
    pub timezone_aliases: TimezoneAliasTable,
}

impl ReferenceData {
    pub fn load(countries_path: &Path, aliases_path: &Path) -> Result<Self> {
        Ok(Self {
            countries: CountryLookup::load_from_path(countries_path)?,
            timezone_aliases: TimezoneAliasTable::load_from_path(aliases_path)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_country_lookup_skips_incomplete_entries() {
        let lookup = CountryLookup::from_json(
            r#"[
                {"abbreviation": "US", "country": "United States"},
                {"abbreviation": "XX"},
                {"country": "Nowhere"},
                {"abbreviation": "FR", "country": "France", "capital": "Paris"}
            ]"#,
        )
        .unwrap();

        assert_eq!(lookup.len(), 2);
        assert_eq!(lookup.resolve("US"), Some("United States"));
        assert_eq!(lookup.resolve("FR"), Some("France"));
        assert_eq!(lookup.resolve("XX"), None);
    }

    #[test]
    fn test_country_lookup_last_duplicate_wins() {
        let lookup = CountryLookup::from_json(
            r#"[
                {"abbreviation": "GB", "country": "Great Britain"},
                {"abbreviation": "GB", "country": "United Kingdom"}
            ]"#,
        )
        .unwrap();

        assert_eq!(lookup.resolve("GB"), Some("United Kingdom"));
    }

    #[test]
    fn test_country_lookup_empty_name_is_unknown() {
        let lookup =
            CountryLookup::from_json(r#"[{"abbreviation": "AQ", "country": ""}]"#).unwrap();
        assert_eq!(lookup.resolve("AQ"), None);
    }

    #[test]
    fn test_country_lookup_rejects_non_array() {
        assert!(CountryLookup::from_json(r#"{"US": "United States"}"#).is_err());
        assert!(CountryLookup::from_json("not json").is_err());
    }

    #[test]
    fn test_alias_table_preserves_order() {
        let table = TimezoneAliasTable::from_json(
            r#"{"America/New_York": ["EST", "Eastern Time", "EDT"]}"#,
        )
        .unwrap();

        assert_eq!(
            table.aliases_for("America/New_York"),
            ["EST", "Eastern Time", "EDT"]
        );
    }

    #[test]
    fn test_alias_table_unknown_timezone_is_empty() {
        let table = TimezoneAliasTable::from_json(r#"{"Europe/Paris": ["CET"]}"#).unwrap();
        assert!(table.aliases_for("Mars/Olympus_Mons").is_empty());
        assert!(table.aliases_for("").is_empty());
    }

    #[test]
    fn test_alias_table_rejects_malformed_json() {
        assert!(TimezoneAliasTable::from_json(r#"["EST"]"#).is_err());
        assert!(TimezoneAliasTable::from_json(r#"{"UTC": "Coordinated"}"#).is_err());
    }

    #[test]
    fn test_reference_data_missing_file_is_fatal() {
        let dir = tempdir().unwrap();
        let countries = dir.path().join("countries.json");
        fs::write(&countries, "[]").unwrap();

        let result = ReferenceData::load(&countries, &dir.path().join("missing.json"));
        let message = format!("{:#}", result.unwrap_err());
        assert!(message.contains("Failed to read timezone aliases"));
    }
}
