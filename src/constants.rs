//! Application constants and default values for cityindex.
//!
//! This module contains the configuration defaults, validation limits,
//! gazetteer column layout and exit codes used throughout the application.

// ═══ Application Configuration Defaults ═══
// These values are used when config options are not specified by the user

pub const DEFAULT_CITIES_INPUT: &str = "./cities15000.txt";
pub const DEFAULT_COUNTRIES_INPUT: &str = "./countries.json";
pub const DEFAULT_TIMEZONE_ALIASES_INPUT: &str = "./timezone_aliases.json";
pub const DEFAULT_OUTPUT_PATH: &str = "./cities100000_with_country.json";
pub const DEFAULT_MIN_POPULATION: u64 = 100_000; // exclusive: a city must be strictly larger
pub const DEFAULT_CAPITAL_FEATURE_CODE: &str = "PPLC"; // GeoNames code for a national capital
pub const DEFAULT_REFERENCE_YEAR: i32 = 2025; // offsets are resolved at Jan 1, 00:00 UTC

pub const CONFIG_DIR_NAME: &str = "cityindex";
pub const CONFIG_FILE_NAME: &str = "cityindex.toml";

// ═══ Validation Limits ═══

pub const MINIMUM_REFERENCE_YEAR: i32 = 1970;
pub const MAXIMUM_REFERENCE_YEAR: i32 = 2100;

// ═══ Gazetteer Feed Layout ═══
// 0-based column indices of the tab-separated GeoNames dump

pub const FEED_FIELD_DELIMITER: char = '\t';
pub const FEED_MIN_FIELDS: usize = 18;
pub const FEED_NAME_INDEX: usize = 1;
pub const FEED_FEATURE_CODE_INDEX: usize = 7;
pub const FEED_COUNTRY_CODE_INDEX: usize = 8;
pub const FEED_POPULATION_INDEX: usize = 14;
pub const FEED_TIMEZONE_INDEX: usize = 17;

// ═══ Search Token Tags ═══

pub const TIMEZONE_TOKEN_TAG: &str = "tz:";
pub const CITY_TOKEN_TAG: &str = "city:";
pub const COUNTRY_TOKEN_TAG: &str = "country:";

// ═══ Exit Codes ═══

pub const EXIT_FAILURE: i32 = 1; // General failure

// ═══ Test Constants ═══
// Common values used in tests for consistency
#[cfg(test)]
pub mod test_constants {
    pub const TEST_NEW_YORK_ROW: &str = "5128581\tNew York City\tNew York City\tNYC\t40.71427\t-74.00597\tP\tPPL\tUS\t\tNY\t\t\t\t8804190\t10\t57\tAmerica/New_York\t2024-03-18";
    pub const TEST_VADUZ_ROW: &str = "3042030\tVaduz\tVaduz\t\t47.14151\t9.52154\tP\tPPLC\tLI\t\t11\t\t\t\t5774\t\t452\tEurope/Vaduz\t2022-03-31";
    pub const TEST_SAMANDAG_ROW: &str = "311665\tSamandağ\tSamandag\t\t36.08333\t35.98333\tP\tPPLA2\tTR\t\t31\t\t\t\t123447\t\t10\tEurope/Istanbul\t2022-03-10";
}
