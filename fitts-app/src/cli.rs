//! Command-line interface

use clap::Parser;
use fitts_experiment::AttemptPolicy;
use fitts_store::StorageMode;
use std::path::PathBuf;

use crate::config::AppConfig;

/// Fitts' law pointing experiment
#[derive(Parser, Debug, Default)]
#[command(name = "fitts")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Config file path (default: ./fitts.toml if present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Where records go: sqlite, csv or memory
    #[arg(long)]
    pub storage: Option<StorageMode>,

    /// Database file (sqlite) or table directory (csv)
    #[arg(long)]
    pub data_path: Option<PathBuf>,

    /// Trials per session
    #[arg(long)]
    pub trials: Option<usize>,

    /// retry-until-hit or single-attempt
    #[arg(long)]
    pub policy: Option<AttemptPolicy>,

    /// Run in a window instead of fullscreen
    #[arg(long)]
    pub windowed: bool,

    /// TrueType font for on-screen text
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Write the spreadsheet export when the session completes
    #[arg(long)]
    pub export: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Command-line flags win over the config file
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(mode) = self.storage {
            config.storage.mode = mode;
        }
        if let Some(path) = &self.data_path {
            match config.storage.mode {
                StorageMode::Sqlite => config.storage.sqlite_path = path.clone(),
                StorageMode::Csv => config.storage.csv_dir = path.clone(),
                StorageMode::Memory => {}
            }
        }
        if let Some(trials) = self.trials {
            config.experiment.trials = trials;
        }
        if let Some(policy) = self.policy {
            config.experiment.attempt_policy = policy;
        }
        if self.windowed {
            config.display.fullscreen = false;
        }
        if let Some(font) = &self.font {
            config.display.font_path = Some(font.clone());
        }
        if self.export {
            config.export.enabled = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_the_file() {
        let cli = Cli::try_parse_from([
            "fitts",
            "--storage",
            "db",
            "--data-path",
            "/tmp/run.db",
            "--trials",
            "10",
            "--policy",
            "single-attempt",
            "--windowed",
        ])
        .unwrap();

        let mut config = AppConfig::default();
        cli.apply(&mut config);

        assert_eq!(config.storage.mode, StorageMode::Sqlite);
        assert_eq!(config.storage.sqlite_path, PathBuf::from("/tmp/run.db"));
        assert_eq!(config.experiment.trials, 10);
        assert_eq!(config.experiment.attempt_policy, AttemptPolicy::SingleAttempt);
        assert!(!config.display.fullscreen);
        assert!(!config.export.enabled);
    }

    #[test]
    fn unknown_policy_is_rejected() {
        assert!(Cli::try_parse_from(["fitts", "--policy", "sometimes"]).is_err());
    }
}
