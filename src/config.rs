//! Configuration system for cityindex.
//!
//! Every setting is optional; with no configuration file at all the tool reads
//! `./cities15000.txt`, `./countries.json` and `./timezone_aliases.json` and
//! writes `./cities100000_with_country.json`.
//!
//! ## Configuration Sources
//!
//! 1. A file passed explicitly with `--config <path>` (must exist)
//! 2. **XDG_CONFIG_HOME**/cityindex/cityindex.toml, when present
//! 3. Built-in defaults
//!
//! The default location is only read, never created.
//!
//! ## Configuration Structure
//!
//! ```toml
//! # Inputs
//! cities_input = "./cities15000.txt"              # GeoNames tab-separated dump
//! countries_input = "./countries.json"            # [{ "abbreviation", "country" }, ...]
//! timezone_aliases_input = "./timezone_aliases.json"
//!
//! # Output
//! output_path = "./cities100000_with_country.json"
//!
//! # Filtering
//! min_population = 100000                         # exclusive floor
//! capital_feature_code = "PPLC"                   # always kept regardless of population
//!
//! # Offset resolution
//! reference_year = 2025                           # offsets taken at Jan 1, 00:00 UTC
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::*;
use crate::logger::Log;
use crate::offset::ReferenceInstant;
use crate::record::FilterRule;

/// Configuration structure for cityindex settings.
///
/// Loaded from `cityindex.toml`. Fields left out of the file use the defaults
/// from [`crate::constants`].
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub cities_input: Option<PathBuf>,
    pub countries_input: Option<PathBuf>,
    pub timezone_aliases_input: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
    pub min_population: Option<u64>, // exclusive
    pub capital_feature_code: Option<String>,
    pub reference_year: Option<i32>,
}

impl Config {
    /// Default configuration file location, whether or not it exists.
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not determine config directory")?;
        Ok(config_dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load configuration for a run.
    ///
    /// An explicit path must exist. Without one, the default location is used
    /// when a file is present there and built-in defaults otherwise.
    pub fn load(explicit_path: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        if let Some(path) = explicit_path {
            let config = Self::load_from_path(path)?;
            return Ok((config, Some(path.to_path_buf())));
        }

        match Self::get_config_path() {
            Ok(path) if path.exists() => {
                let config = Self::load_from_path(&path).with_context(|| {
                    Log::log_pipe();
                    format!("Failed to load configuration from {}", path.display())
                })?;
                Ok((config, Some(path)))
            }
            _ => Ok((Self::default(), None)),
        }
    }

    /// Load and validate a configuration file.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!(
                "Configuration file not found at specified path: {}",
                path.display()
            );
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;

        validate_config(&config)?;

        Ok(config)
    }

    pub fn cities_input(&self) -> PathBuf {
        self.cities_input
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CITIES_INPUT))
    }

    pub fn countries_input(&self) -> PathBuf {
        self.countries_input
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_COUNTRIES_INPUT))
    }

    pub fn timezone_aliases_input(&self) -> PathBuf {
        self.timezone_aliases_input
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TIMEZONE_ALIASES_INPUT))
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_PATH))
    }

    pub fn filter_rule(&self) -> FilterRule {
        FilterRule {
            min_population: self.min_population.unwrap_or(DEFAULT_MIN_POPULATION),
            capital_feature_code: self
                .capital_feature_code
                .clone()
                .unwrap_or_else(|| DEFAULT_CAPITAL_FEATURE_CODE.to_string()),
        }
    }

    pub fn reference_year(&self) -> i32 {
        self.reference_year.unwrap_or(DEFAULT_REFERENCE_YEAR)
    }

    /// Reference instant for offset resolution.
    pub fn reference_instant(&self) -> Result<ReferenceInstant> {
        let year = self.reference_year();
        ReferenceInstant::start_of_year(year)
            .with_context(|| format!("Reference year {} cannot be represented", year))
    }

    /// Log the effective configuration.
    pub fn log_config(&self, source: Option<&Path>) {
        match source {
            Some(path) => Log::log_block_start(&format!(
                "Loaded configuration from {}",
                crate::utils::path_for_display(path)
            )),
            None => Log::log_block_start("Using default configuration"),
        }

        let rule = self.filter_rule();
        Log::log_indented(&format!(
            "Cities: {}",
            crate::utils::path_for_display(&self.cities_input())
        ));
        Log::log_indented(&format!(
            "Countries: {}",
            crate::utils::path_for_display(&self.countries_input())
        ));
        Log::log_indented(&format!(
            "Timezone aliases: {}",
            crate::utils::path_for_display(&self.timezone_aliases_input())
        ));
        Log::log_indented(&format!(
            "Output: {}",
            crate::utils::path_for_display(&self.output_path())
        ));
        Log::log_indented(&format!(
            "Keep: population > {} or feature code {}",
            rule.min_population, rule.capital_feature_code
        ));
        Log::log_indented(&format!(
            "Offsets resolved at: {}-01-01 00:00 UTC",
            self.reference_year()
        ));
    }
}

/// Reject configurations that cannot produce a meaningful run.
pub fn validate_config(config: &Config) -> Result<()> {
    let paths = [
        ("cities_input", &config.cities_input),
        ("countries_input", &config.countries_input),
        ("timezone_aliases_input", &config.timezone_aliases_input),
        ("output_path", &config.output_path),
    ];
    for (key, path) in paths {
        if path.as_ref().is_some_and(|p| p.as_os_str().is_empty()) {
            anyhow::bail!("{} must not be empty", key);
        }
    }

    if let Some(code) = &config.capital_feature_code {
        if code.is_empty() || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            anyhow::bail!(
                "capital_feature_code ({:?}) must be a non-empty ASCII alphanumeric code",
                code
            );
        }
    }

    if let Some(year) = config.reference_year {
        if !(MINIMUM_REFERENCE_YEAR..=MAXIMUM_REFERENCE_YEAR).contains(&year) {
            anyhow::bail!(
                "Reference year ({}) must be between {} and {}",
                year,
                MINIMUM_REFERENCE_YEAR,
                MAXIMUM_REFERENCE_YEAR
            );
        }
    }

    Ok(())
}
