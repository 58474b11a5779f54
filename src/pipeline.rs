//! End-to-end index build.
//!
//! Stages run strictly in sequence:
//! 1. Load the reference tables (fatal on failure)
//! 2. Stream the gazetteer feed line by line, filtering and joining each row
//! 3. Build the search string and resolve the UTC offset of each accepted row
//! 4. Sort every accepted record and write the index atomically
//!
//! Only accepted records are held in memory; the feed itself is never buffered.

use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::logger::Log;
use crate::offset::{ReferenceInstant, sort_records};
use crate::record::{CityRecord, FilterRule, RowOutcome, SkipReason, validate_line};
use crate::reference::{CountryLookup, ReferenceData, TimezoneAliasTable};
use crate::utils::{path_for_display, write_atomically};

/// Counters collected while building the index.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub lines_read: usize,
    pub accepted: usize,
    pub malformed: usize,
    pub bad_population: usize,
    pub below_threshold: usize,
    pub unknown_country: usize,
    /// Timezone names of accepted rows that resolved to the UTC fallback.
    pub fallback_timezones: BTreeSet<String>,
    pub fallback_rows: usize,
}

impl RunStats {
    fn record_skip(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::Malformed => self.malformed += 1,
            SkipReason::BadPopulation => self.bad_population += 1,
            SkipReason::BelowThreshold => self.below_threshold += 1,
            SkipReason::UnknownCountry => self.unknown_country += 1,
        }
    }

    pub fn skipped(&self) -> usize {
        self.malformed + self.bad_population + self.below_threshold + self.unknown_country
    }

    /// Log the per-reason breakdown.
    pub fn log_summary(&self) {
        Log::log_block_start("Run statistics:");
        Log::log_count("lines read", self.lines_read);
        Log::log_count("accepted", self.accepted);
        Log::log_count(SkipReason::Malformed.as_str(), self.malformed);
        Log::log_count(SkipReason::BadPopulation.as_str(), self.bad_population);
        Log::log_count(SkipReason::BelowThreshold.as_str(), self.below_threshold);
        Log::log_count(SkipReason::UnknownCountry.as_str(), self.unknown_country);
        Log::log_count("utc fallback", self.fallback_rows);

        if !self.fallback_timezones.is_empty() {
            let names: Vec<&str> = self
                .fallback_timezones
                .iter()
                .map(|tz| if tz.is_empty() { "<empty>" } else { tz.as_str() })
                .collect();
            Log::log_indented(&format!("Unresolved timezones: {}", names.join(", ")));
        }
    }
}

/// Accepted, sorted records together with the statistics of the run.
#[derive(Debug, Clone)]
pub struct IndexBuild {
    pub records: Vec<CityRecord>,
    pub stats: RunStats,
}

/// Turn feed lines into sorted index records.
///
/// Rows are rejected silently; the reasons are counted in the returned stats.
pub fn build_index<I>(
    lines: I,
    rule: &FilterRule,
    countries: &CountryLookup,
    aliases: &TimezoneAliasTable,
    instant: ReferenceInstant,
) -> IndexBuild
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut stats = RunStats::default();

    let mut records: Vec<CityRecord> = lines
        .into_iter()
        .filter_map(|line| {
            stats.lines_read += 1;
            match validate_line(line.as_ref(), rule, countries) {
                RowOutcome::Accepted(row) => {
                    let timezone = row.timezone.clone();
                    let (record, fell_back) = CityRecord::build(row, aliases, instant);
                    if fell_back {
                        stats.fallback_rows += 1;
                        stats.fallback_timezones.insert(timezone);
                    }
                    Some(record)
                }
                RowOutcome::Skipped(reason) => {
                    stats.record_skip(reason);
                    None
                }
            }
        })
        .collect();

    stats.accepted = records.len();
    sort_records(&mut records);

    IndexBuild { records, stats }
}

/// Read the feed at `path` and build the index from it.
pub fn build_index_from_feed(
    path: &Path,
    rule: &FilterRule,
    reference: &ReferenceData,
    instant: ReferenceInstant,
) -> Result<IndexBuild> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open city feed {}", path.display()))?;

    // Lines are consumed lazily; a read error stops the stream and fails the run.
    let mut read_error = None;
    let lines = BufReader::new(file)
        .lines()
        .map_while(|line| line.map_err(|e| read_error = Some(e)).ok());

    let build = build_index(
        lines,
        rule,
        &reference.countries,
        &reference.timezone_aliases,
        instant,
    );

    if let Some(e) = read_error {
        return Err(e).with_context(|| format!("Failed to read city feed {}", path.display()));
    }

    Ok(build)
}

/// Serialize records as a compact JSON array and write them atomically.
pub fn write_index(path: &Path, records: &[CityRecord]) -> Result<()> {
    write_atomically(path, |writer| {
        serde_json::to_writer(writer, records)
            .with_context(|| format!("Failed to serialize index for {}", path.display()))
    })
}

/// Summary of a completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub output_path: PathBuf,
    pub rows_written: usize,
    pub stats: RunStats,
}

/// Run the whole pipeline for a configuration.
pub fn run(config: &Config, debug_enabled: bool) -> Result<RunSummary> {
    let instant = config.reference_instant()?;
    let output_path = config.output_path();

    Log::log_block_start("Loading reference tables...");
    let reference = ReferenceData::load(&config.countries_input(), &config.timezone_aliases_input())?;
    Log::log_indented(&format!("{} countries", reference.countries.len()));
    Log::log_indented(&format!(
        "{} timezones with aliases",
        reference.timezone_aliases.len()
    ));

    Log::log_block_start(&format!(
        "Reading city feed {}...",
        path_for_display(&config.cities_input())
    ));
    let IndexBuild { records, stats } =
        build_index_from_feed(&config.cities_input(), &config.filter_rule(), &reference, instant)?;
    Log::log_indented(&format!(
        "{} of {} rows accepted",
        stats.accepted, stats.lines_read
    ));

    if stats.accepted == 0 {
        Log::log_info("No rows matched the filter; writing an empty index");
    }

    if stats.fallback_rows > 0 {
        Log::log_warning(&format!(
            "{} rows have a timezone that could not be resolved and were placed at UTC",
            stats.fallback_rows
        ));
    }

    if debug_enabled {
        stats.log_summary();
    }

    write_index(&output_path, &records)?;

    Ok(RunSummary {
        output_path,
        rows_written: records.len(),
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::test_constants::*;
    use crate::reference::CountryEntry;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::tempdir;

    fn countries() -> CountryLookup {
        CountryLookup::from_entries(
            [("US", "United States"), ("LI", "Liechtenstein"), ("TR", "Turkey")]
                .into_iter()
                .map(|(code, name)| CountryEntry {
                    abbreviation: Some(code.to_string()),
                    country: Some(name.to_string()),
                }),
        )
    }

    fn aliases() -> TimezoneAliasTable {
        TimezoneAliasTable::new(HashMap::from([
            ("America/New_York".to_string(), vec!["EST".to_string()]),
            ("Europe/Vaduz".to_string(), vec!["CET".to_string()]),
        ]))
    }

    fn instant() -> ReferenceInstant {
        ReferenceInstant::start_of_year(2025).unwrap()
    }

    #[test]
    fn test_build_index_counts_every_skip_reason() {
        let lines = vec![
            TEST_NEW_YORK_ROW.to_string(),
            TEST_VADUZ_ROW.to_string(),
            "too\tfew\tfields".to_string(),
            TEST_SAMANDAG_ROW.replace("123447", "n/a"),
            TEST_SAMANDAG_ROW.replace("123447", "99999"),
            TEST_NEW_YORK_ROW.replace("\tUS\t", "\tZZ\t"),
        ];

        let build = build_index(lines, &FilterRule::default(), &countries(), &aliases(), instant());

        assert_eq!(build.stats.lines_read, 6);
        assert_eq!(build.stats.accepted, 2);
        assert_eq!(build.stats.malformed, 1);
        assert_eq!(build.stats.bad_population, 1);
        assert_eq!(build.stats.below_threshold, 1);
        assert_eq!(build.stats.unknown_country, 1);
        assert_eq!(build.stats.skipped(), 4);
        assert_eq!(build.records.len(), 2);
    }

    #[test]
    fn test_build_index_sorts_west_to_east() {
        let lines = [TEST_VADUZ_ROW, TEST_SAMANDAG_ROW, TEST_NEW_YORK_ROW];

        let build = build_index(lines, &FilterRule::default(), &countries(), &aliases(), instant());

        let cities: Vec<&str> = build.records.iter().map(|r| r.city.as_str()).collect();
        assert_eq!(cities, ["New York City", "Vaduz", "Samandağ"]);
        let offsets: Vec<i32> = build.records.iter().map(|r| r.offset_minutes).collect();
        assert_eq!(offsets, [-300, 60, 180]);
    }

    #[test]
    fn test_build_index_tracks_fallback_timezones() {
        let lines = [
            TEST_NEW_YORK_ROW.replace("America/New_York", "Atlantis/Capital"),
            TEST_VADUZ_ROW.replace("Europe/Vaduz", ""),
        ];

        let build = build_index(lines, &FilterRule::default(), &countries(), &aliases(), instant());

        assert_eq!(build.stats.fallback_rows, 2);
        assert!(build.stats.fallback_timezones.contains("Atlantis/Capital"));
        assert!(build.stats.fallback_timezones.contains(""));
        assert!(build.records.iter().all(|r| r.offset_minutes == 0));
        assert!(build.records.iter().all(|r| !r.search.contains("tz:")));
    }

    #[test]
    fn test_build_index_ids_are_unique() {
        let lines = vec![TEST_NEW_YORK_ROW; 50];
        let build = build_index(lines, &FilterRule::default(), &countries(), &aliases(), instant());

        let ids: std::collections::HashSet<&str> =
            build.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids.len(), 50);
    }

    #[test]
    fn test_build_index_from_missing_feed_is_fatal() {
        let dir = tempdir().unwrap();
        let reference = ReferenceData::default();
        let result = build_index_from_feed(
            &dir.path().join("cities15000.txt"),
            &FilterRule::default(),
            &reference,
            instant(),
        );
        assert!(format!("{:#}", result.unwrap_err()).contains("Failed to open city feed"));
    }

    #[test]
    fn test_build_index_from_feed_rejects_invalid_utf8() {
        let dir = tempdir().unwrap();
        let feed = dir.path().join("cities.txt");
        let mut bytes = format!("{}\n", TEST_NEW_YORK_ROW).into_bytes();
        bytes.extend_from_slice(&[0xff, 0xfe, b'\n']);
        fs::write(&feed, bytes).unwrap();

        let reference = ReferenceData {
            countries: countries(),
            timezone_aliases: aliases(),
        };
        let result = build_index_from_feed(&feed, &FilterRule::default(), &reference, instant());
        assert!(format!("{:#}", result.unwrap_err()).contains("Failed to read city feed"));
    }

    #[test]
    fn test_write_index_compact_json() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("index.json");
        let records = vec![CityRecord {
            id: "a".to_string(),
            city: "Zürich".to_string(),
            country: "Switzerland".to_string(),
            timezone: "Europe/Zurich".to_string(),
            search: "city:zürich city:zurich country:switzerland".to_string(),
            offset_minutes: 60,
        }];

        write_index(&output, &records).unwrap();

        let written = fs::read_to_string(&output).unwrap();
        assert!(written.starts_with(r#"[{"id":"a","city":"Zürich""#));
        assert!(!written.contains("\": ") && !written.contains("\", "));
        assert!(!written.contains("offset"));
        assert!(!written.contains("\\u"));
    }

    #[test]
    fn test_write_index_empty() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("index.json");
        write_index(&output, &[]).unwrap();
        assert_eq!(fs::read_to_string(&output).unwrap(), "[]");
    }
}
