//! Command-line argument parsing and processing.
//!
//! cityindex needs no arguments: a bare invocation builds the index from the
//! default inputs. The few supported flags cover help, version, debug output
//! and pointing at a configuration file.

use std::path::PathBuf;

use crate::logger::Log;

/// Represents the parsed command-line arguments and their intended actions.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Build the index
    Run {
        debug_enabled: bool,
        config_path: Option<PathBuf>,
    },
    /// Display help information and exit
    ShowHelp,
    /// Display version information and exit
    ShowVersion,
    /// Show help due to unknown or incomplete arguments and exit
    ShowHelpDueToError,
}

/// Result of parsing command-line arguments.
pub struct ParsedArgs {
    pub action: CliAction,
}

impl ParsedArgs {
    /// Parse command-line arguments into a structured result.
    ///
    /// # Arguments
    /// * `args` - Iterator over command-line arguments, program name first
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut debug_enabled = false;
        let mut display_help = false;
        let mut display_version = false;
        let mut config_path: Option<PathBuf> = None;
        let mut unknown_arg_found = false;

        let mut args_iter = args.into_iter().skip(1);

        while let Some(arg) = args_iter.next() {
            match arg.as_ref() {
                "--help" | "-h" => display_help = true,
                "--version" | "-V" | "-v" => display_version = true,
                "--debug" | "-d" => debug_enabled = true,
                "--config" | "-c" => match args_iter.next() {
                    Some(path) if !path.as_ref().starts_with('-') => {
                        config_path = Some(PathBuf::from(path.as_ref()));
                    }
                    _ => {
                        Log::log_warning("Missing path for --config. Usage: --config <path>");
                        unknown_arg_found = true;
                    }
                },
                other => {
                    if other.starts_with('-') {
                        Log::log_warning(&format!("Unknown option: {}", other));
                    } else {
                        Log::log_warning(&format!("Unexpected argument: {}", other));
                    }
                    unknown_arg_found = true;
                }
            }
        }

        let action = if display_version {
            CliAction::ShowVersion
        } else if unknown_arg_found {
            CliAction::ShowHelpDueToError
        } else if display_help {
            CliAction::ShowHelp
        } else {
            CliAction::Run {
                debug_enabled,
                config_path,
            }
        };

        ParsedArgs { action }
    }

    /// Convenience method to parse from std::env::args()
    pub fn from_env() -> ParsedArgs {
        Self::parse(std::env::args())
    }
}

/// Displays version information using custom logging style.
pub fn display_version_info() {
    Log::log_version();
    println!("┗ {}", env!("CARGO_PKG_DESCRIPTION"));
}

/// Displays custom help message using logger methods.
pub fn display_help() {
    Log::log_version();
    Log::log_decorated(env!("CARGO_PKG_DESCRIPTION"));
    Log::log_block_start("Usage: cityindex [OPTIONS]");
    Log::log_block_start("Options:");
    Log::log_indented("-c, --config <path>  Read settings from this TOML file");
    Log::log_indented("-d, --debug          Print per-reason skip statistics");
    Log::log_indented("-h, --help           Print help information");
    Log::log_indented("-V, --version        Print version information");
    Log::log_end();
}
