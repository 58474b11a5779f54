//! # cityindex
//!
//! Builds a search-ready city index from a GeoNames gazetteer dump.
//!
//! The tool reads the tab-separated city feed, keeps large cities and national
//! capitals, joins in country names, derives a tagged search string and the
//! timezone's UTC offset, and writes one JSON array sorted west to east.
//!
//! ## Architecture
//!
//! - **reference**: Country and timezone-alias lookup tables
//! - **record**: Feed row parsing, filtering and the emitted record type
//! - **search**: ASCII folding and search token construction
//! - **offset**: UTC offset resolution and index ordering
//! - **pipeline**: Stage composition, run statistics and output writing
//! - **config**: TOML configuration loading and validation
//! - **args**: Command-line parsing
//! - **constants**: Defaults, limits and the feed column layout
//! - **logger**: Structured logging with visual formatting
//! - **utils**: Path display and atomic writes

pub mod args;
pub mod config;
pub mod constants;
pub mod logger;
pub mod offset;
pub mod pipeline;
pub mod record;
pub mod reference;
pub mod search;
pub mod utils;

// Re-export important types for easier access
pub use config::Config;
pub use logger::{Log, LogLevel};
pub use offset::{ReferenceInstant, resolve_offset_minutes, sort_records};
pub use pipeline::{IndexBuild, RunStats, RunSummary, build_index, run};
pub use record::{CityRecord, FilterRule, RowOutcome, SkipReason, validate_line};
pub use reference::{CountryLookup, ReferenceData, TimezoneAliasTable};
pub use search::{ascii_fold, build_search};
