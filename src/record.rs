//! Gazetteer row parsing, filtering and the emitted city record.
//!
//! A feed line goes through three steps before it becomes a [`CityRecord`]:
//! positional parsing into a [`RawCityRecord`], the population/capital filter,
//! and the country join. Each step can reject the row; rejection is a normal
//! outcome reported as a [`SkipReason`], never an error.

use serde::Serialize;
use uuid::Uuid;

use crate::constants::*;
use crate::offset::{ReferenceInstant, resolve_offset};
use crate::reference::{CountryLookup, TimezoneAliasTable};
use crate::search::build_search;

/// Why a feed line did not make it into the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// Fewer tab-separated fields than the feed layout requires.
    Malformed,
    /// Population column is not an integer.
    BadPopulation,
    /// Neither populous enough nor a capital.
    BelowThreshold,
    /// Country code missing from the country table.
    UnknownCountry,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::Malformed => "malformed",
            SkipReason::BadPopulation => "bad population",
            SkipReason::BelowThreshold => "below threshold",
            SkipReason::UnknownCountry => "unknown country",
        }
    }
}

/// Inclusion rule for the population filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterRule {
    /// Exclusive population floor.
    pub min_population: u64,
    /// Feature code that bypasses the population floor.
    pub capital_feature_code: String,
}

impl Default for FilterRule {
    fn default() -> Self {
        Self {
            min_population: DEFAULT_MIN_POPULATION,
            capital_feature_code: DEFAULT_CAPITAL_FEATURE_CODE.to_string(),
        }
    }
}

impl FilterRule {
    /// Keep a city iff it is strictly above the floor or is a capital.
    pub fn keeps(&self, population: i64, feature_code: &str) -> bool {
        let above_floor = u64::try_from(population).is_ok_and(|p| p > self.min_population);
        above_floor || feature_code == self.capital_feature_code
    }
}

/// The columns of one feed line that the index uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCityRecord<'a> {
    pub name: &'a str,
    pub feature_code: &'a str,
    pub country_code: &'a str,
    pub population: i64,
    pub timezone: &'a str,
}

impl<'a> RawCityRecord<'a> {
    /// Split a feed line into its positional fields.
    pub fn parse(line: &'a str) -> Result<Self, SkipReason> {
        let line = line.strip_suffix('\n').unwrap_or(line);
        let line = line.strip_suffix('\r').unwrap_or(line);
        let fields: Vec<&str> = line.split(FEED_FIELD_DELIMITER).collect();

        if fields.len() < FEED_MIN_FIELDS {
            return Err(SkipReason::Malformed);
        }

        let population = fields[FEED_POPULATION_INDEX]
            .trim()
            .parse::<i64>()
            .map_err(|_| SkipReason::BadPopulation)?;

        Ok(Self {
            name: fields[FEED_NAME_INDEX],
            feature_code: fields[FEED_FEATURE_CODE_INDEX],
            country_code: fields[FEED_COUNTRY_CODE_INDEX],
            population,
            timezone: fields[FEED_TIMEZONE_INDEX],
        })
    }
}

/// A feed row that passed filtering and has a resolved country name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRow {
    pub name: String,
    pub feature_code: String,
    pub country_code: String,
    pub population: i64,
    pub timezone: String,
    pub country: String,
}

/// Result of pushing one feed line through the filter and join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Accepted(ValidatedRow),
    Skipped(SkipReason),
}

impl RowOutcome {
    pub fn accepted(self) -> Option<ValidatedRow> {
        match self {
            RowOutcome::Accepted(row) => Some(row),
            RowOutcome::Skipped(_) => None,
        }
    }
}

/// Parse, filter and join a single feed line.
pub fn validate_line(line: &str, rule: &FilterRule, countries: &CountryLookup) -> RowOutcome {
    let raw = match RawCityRecord::parse(line) {
        Ok(raw) => raw,
        Err(reason) => return RowOutcome::Skipped(reason),
    };

    if !rule.keeps(raw.population, raw.feature_code) {
        return RowOutcome::Skipped(SkipReason::BelowThreshold);
    }

    let Some(country) = countries.resolve(raw.country_code) else {
        return RowOutcome::Skipped(SkipReason::UnknownCountry);
    };

    RowOutcome::Accepted(ValidatedRow {
        name: raw.name.to_string(),
        feature_code: raw.feature_code.to_string(),
        country_code: raw.country_code.to_string(),
        population: raw.population,
        timezone: raw.timezone.to_string(),
        country: country.to_string(),
    })
}

/// One entry of the emitted index.
///
/// `offset_minutes` is only used to order the index and is not serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CityRecord {
    pub id: String,
    pub city: String,
    pub country: String,
    pub timezone: String,
    pub search: String,
    #[serde(skip_serializing)]
    pub offset_minutes: i32,
}

impl CityRecord {
    /// Build the index entry for an accepted row.
    ///
    /// Returns the record together with whether its timezone fell back to UTC.
    pub fn build(
        row: ValidatedRow,
        aliases: &TimezoneAliasTable,
        instant: ReferenceInstant,
    ) -> (Self, bool) {
        let search = build_search(&row.name, &row.country, aliases.aliases_for(&row.timezone));
        let offset = resolve_offset(&row.timezone, instant);

        let record = Self {
            id: Uuid::new_v4().to_string(),
            city: row.name,
            country: row.country,
            timezone: row.timezone,
            search,
            offset_minutes: offset.minutes(),
        };
        (record, offset.is_fallback())
    }
}
