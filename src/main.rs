use anyhow::Result;

use cityindex::args::{CliAction, ParsedArgs, display_help, display_version_info};
use cityindex::constants::EXIT_FAILURE;
use cityindex::utils::path_for_display;
use cityindex::{Config, Log, pipeline};

fn main() -> Result<()> {
    let (debug_enabled, config_path) = match ParsedArgs::from_env().action {
        CliAction::Run {
            debug_enabled,
            config_path,
        } => (debug_enabled, config_path),
        CliAction::ShowVersion => {
            display_version_info();
            return Ok(());
        }
        CliAction::ShowHelp => {
            display_help();
            return Ok(());
        }
        CliAction::ShowHelpDueToError => {
            display_help();
            std::process::exit(EXIT_FAILURE);
        }
    };

    Log::log_version();

    if debug_enabled {
        Log::log_debug("Debug mode enabled");
    }

    let (config, source) = Config::load(config_path.as_deref())?;
    config.log_config(source.as_deref());

    let summary = pipeline::run(&config, debug_enabled).inspect_err(|_| {
        Log::log_pipe();
        Log::log_error("Index build failed");
        Log::log_end();
    })?;

    Log::log_block_start(&format!(
        "Wrote {} rows to {}",
        summary.rows_written,
        path_for_display(&summary.output_path)
    ));
    Log::log_end();

    Ok(())
}
