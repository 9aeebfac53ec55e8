//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use imtidy_core::{CleanupOptions, ConfigError, TidyConfig};

const REVIEW_HELP: &str = "\
Duplicate review:
  Each answer lists the entries to keep. Entries left out are removed from the
  output, including ones kept in an earlier cluster. Set

    [review]
    withdraw_rejected = false

  in the configuration file to only ever add to the kept set.";

/// Process .bib files to remove unused and/or duplicate entries.
#[derive(Debug, Parser)]
#[command(name = "imtidy")]
#[command(version, about, long_about = None)]
#[command(after_help = REVIEW_HELP)]
pub struct Cli {
    /// Remove unused entries from .bib file.
    #[arg(long)]
    pub remove_unused: bool,

    /// Remove duplicate entries from .bib file.
    #[arg(long)]
    pub remove_duplicates: bool,

    /// The path to the .bib file.
    #[arg(short, long, value_name = "FILE")]
    pub bib_file: PathBuf,

    /// The directory containing .tex files.
    #[arg(short, long, value_name = "DIR")]
    pub tex_dir: PathBuf,

    /// Configuration file (default: ~/.imtidy/config.toml when present)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Extension of source files to scan, overriding the configuration
    #[arg(short, long, value_name = "EXT")]
    pub extension: Option<String>,

    /// Write a JSON summary of the cleanup to this path
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// More log output (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn cleanup_options(&self) -> CleanupOptions {
        CleanupOptions {
            remove_unused: self.remove_unused,
            remove_duplicates: self.remove_duplicates,
        }
    }

    /// Load the configuration and apply command line overrides
    pub fn resolve_config(&self) -> Result<TidyConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => TidyConfig::load(path)?,
            None => TidyConfig::load_standard()?,
        };

        if let Some(extension) = &self.extension {
            config.sources.extension = extension.trim_start_matches('.').to_string();
            config.validate()?;
        }

        Ok(config)
    }

    /// Default log directive for the verbosity level
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}
