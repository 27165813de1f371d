pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::{Cli, Command};

pub use adapters::{ConfiguredTokens, GoogleSheetsGateway, StaticToken};
pub use config::SheetsConfig;
pub use core::input::SalesPrompt;
pub use core::runner::{HistoryFormat, ReportRunner, UpdateOutcome};
pub use utils::error::{Result, SheetsError};
