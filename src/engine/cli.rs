//! CLI command handler: merge config file and flags, run, print a summary.

use anyhow::Result;
use log::info;
use std::path::Path;

use crate::RunReport;
use crate::engine::arg_parser::Cli;
use crate::run::run;
use crate::utils::splitrun_toml::{
    RunSettings, SplitrunFile, load_config_file, load_default_config, save_config_file,
};
use crate::utils::{Colors, setup_logging};

/// Config file settings (explicit `--config`, else `.splitrun.toml` in `dir`) with CLI flags on top.
fn setup_settings(cli: &Cli, dir: &Path) -> Result<RunSettings> {
    let file = match &cli.config {
        Some(path) => Some(load_config_file(path)?),
        None => load_default_config(dir)?,
    };
    let mut settings = file.map(|f| f.settings).unwrap_or_default();
    settings.overlay(cli.to_settings());
    Ok(settings)
}

/// Run the job described by the config file and flags.
pub fn handle_run(cli: &Cli) -> Result<()> {
    let settings = setup_settings(cli, Path::new("."))?;
    setup_logging(settings.verbose.unwrap_or(false));

    if let Some(path) = &cli.save_config {
        save_config_file(
            path,
            &SplitrunFile {
                settings: settings.clone(),
            },
        )?;
        info!("Saved settings to {}", path.display());
    }

    let config = settings.to_run_config()?;
    let report = run(&config)?;
    print_summary(&report);
    Ok(())
}

fn print_summary(report: &RunReport) {
    let failed = report.failures.len();
    let failed_str = format!("Failed: {}", failed);
    let output = match &report.merged {
        Some(path) => Colors::colorize(Colors::OK, &format!("Output: {}", path.display())),
        None => Colors::colorize(Colors::FAILED, "Output: not written"),
    };
    info!(
        "{} | {} | {}",
        Colors::colorize(Colors::INFO, &format!("Chunks: {}", report.chunk_count)),
        if failed == 0 {
            Colors::colorize(Colors::OK, &failed_str)
        } else {
            Colors::colorize(Colors::FAILED, &failed_str)
        },
        output
    );
    if let Some(stats) = &report.stats {
        info!("Stats written to {}", stats.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::fs;

    fn write_default_config(dir: &Path, body: &str) {
        fs::write(dir.join(".splitrun.toml"), body).unwrap();
    }

    #[test]
    fn test_verbose_from_config_file_applies_without_flag() {
        let tmp = tempfile::TempDir::new().unwrap();
        write_default_config(tmp.path(), "[settings]\nverbose = true\nworkers = 2\n");
        let cli = Cli::parse_from(["splitrun", "-i", "in.txt"]);

        let settings = setup_settings(&cli, tmp.path()).unwrap();
        assert_eq!(settings.verbose, Some(true));
        assert_eq!(settings.workers, Some(2));
        assert_eq!(settings.input.as_deref(), Some(Path::new("in.txt")));
    }

    #[test]
    fn test_cli_verbose_overrides_config_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        write_default_config(tmp.path(), "[settings]\nverbose = true\n");
        let cli = Cli::parse_from(["splitrun", "--verbose", "false"]);

        let settings = setup_settings(&cli, tmp.path()).unwrap();
        assert_eq!(settings.verbose, Some(false));
    }

    #[test]
    fn test_broken_default_config_is_an_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        write_default_config(tmp.path(), "[settings]\nnot_a_setting = 1\n");
        let cli = Cli::parse_from(["splitrun"]);
        assert!(setup_settings(&cli, tmp.path()).is_err());
    }

    #[test]
    fn test_no_default_config_uses_cli_only() {
        let tmp = tempfile::TempDir::new().unwrap();
        let cli = Cli::parse_from(["splitrun", "-j", "3"]);
        let settings = setup_settings(&cli, tmp.path()).unwrap();
        assert_eq!(settings.workers, Some(3));
        assert_eq!(settings.verbose, None);
    }
}
