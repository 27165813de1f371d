use crate::config::SheetsConfig;
use crate::core::runner::HistoryFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "love-sandwiches")]
#[command(about = "Record market sales and stock surplus in the Love Sandwiches spreadsheet")]
pub struct Cli {
    /// Path to TOML configuration file (default: ./love-sandwiches.toml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit log lines as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Enter today's sales, then record sales and surplus rows
    Update {
        /// Stop after this many invalid entries instead of asking forever
        #[arg(long)]
        max_attempts: Option<usize>,
    },
    /// Print the most recent sales entries for each sandwich
    History {
        /// Number of entries per sandwich
        #[arg(long)]
        entries: Option<usize>,

        #[arg(long, value_enum, default_value_t = HistoryFormat::Text)]
        format: HistoryFormat,
    },
}

impl Cli {
    /// `update` when no subcommand is given.
    pub fn command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or(Command::Update { max_attempts: None })
    }

    /// Command-line values win over the configuration file.
    pub fn apply_overrides(&self, config: &mut SheetsConfig) {
        match self.command() {
            Command::Update { max_attempts } => {
                if max_attempts.is_some() {
                    config.input.max_attempts = max_attempts;
                    tracing::info!("🔧 Max attempts overridden to: {:?}", max_attempts);
                }
            }
            Command::History { entries, .. } => {
                if let Some(entries) = entries {
                    config.history.entries = entries;
                    tracing::info!("🔧 History entries overridden to: {}", entries);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_means_update() {
        let cli = Cli::parse_from(["love-sandwiches"]);
        assert!(matches!(cli.command(), Command::Update { max_attempts: None }));
    }

    #[test]
    fn test_history_overrides() {
        let cli = Cli::parse_from(["love-sandwiches", "history", "--entries", "3", "--format", "json"]);
        let mut config = SheetsConfig::default();
        cli.apply_overrides(&mut config);

        assert_eq!(config.history.entries, 3);
        assert!(matches!(
            cli.command(),
            Command::History {
                format: HistoryFormat::Json,
                ..
            }
        ));
    }

    #[test]
    fn test_update_overrides() {
        let cli = Cli::parse_from(["love-sandwiches", "-v", "update", "--max-attempts", "2"]);
        let mut config = SheetsConfig::default();
        cli.apply_overrides(&mut config);

        assert!(cli.verbose);
        assert_eq!(config.input.max_attempts, Some(2));
    }
}
