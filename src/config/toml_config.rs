use crate::core::WorksheetLayout;
use crate::utils::error::{Result, SheetsError};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "love-sandwiches.toml";

pub const DEFAULT_SCOPES: [&str; 3] = [
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive.file",
    "https://www.googleapis.com/auth/drive",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetsConfig {
    pub spreadsheet: SpreadsheetConfig,
    pub credentials: CredentialsConfig,
    pub worksheets: WorksheetNames,
    pub layout: LayoutConfig,
    pub input: InputConfig,
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpreadsheetConfig {
    pub id: Option<String>,
    pub name: Option<String>,
    pub api_base_url: String,
    pub drive_base_url: String,
    pub timeout_seconds: Option<u64>,
}

impl Default for SpreadsheetConfig {
    fn default() -> Self {
        Self {
            id: None,
            name: Some("love_sandwiches".to_string()),
            api_base_url: "https://sheets.googleapis.com".to_string(),
            drive_base_url: "https://www.googleapis.com".to_string(),
            timeout_seconds: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    pub service_account_file: Option<String>,
    pub access_token: Option<String>,
    pub scopes: Vec<String>,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            service_account_file: Some("creds.json".to_string()),
            access_token: None,
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl CredentialsConfig {
    /// The configured access token, ignoring blanks and `${VAR}` placeholders
    /// whose variable was not set.
    pub fn access_token(&self) -> Option<&str> {
        self.access_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty() && !token.contains("${"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorksheetNames {
    pub sales: String,
    pub stock: String,
    pub surplus: String,
}

impl Default for WorksheetNames {
    fn default() -> Self {
        Self {
            sales: "sales".to_string(),
            stock: "stock".to_string(),
            surplus: "surplus".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// 1-based column holding the first sandwich type.
    pub first_column: usize,
    pub header_rows: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            first_column: 1,
            header_rows: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub trim_whitespace: bool,
    pub max_attempts: Option<usize>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            trim_whitespace: true,
            max_attempts: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub entries: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { entries: 5 }
    }
}

impl SheetsConfig {
    /// Loads `path`, or `love-sandwiches.toml` in the working directory when no
    /// path is given. A missing default file falls back to built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(DEFAULT_CONFIG_FILE),
            None => {
                tracing::debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                Ok(Self::default())
            }
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(SheetsError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| SheetsError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value. Unset variables are left
    /// as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| SheetsError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("spreadsheet.api_base_url", &self.spreadsheet.api_base_url)?;
        validation::validate_url("spreadsheet.drive_base_url", &self.spreadsheet.drive_base_url)?;

        let has_id = self.spreadsheet.id.as_deref().is_some_and(|id| !id.trim().is_empty());
        let has_name = self.spreadsheet.name.as_deref().is_some_and(|n| !n.trim().is_empty());
        if !has_id && !has_name {
            return Err(SheetsError::MissingConfigError {
                field: "spreadsheet.id or spreadsheet.name".to_string(),
            });
        }

        if self.credentials.access_token().is_none() {
            let key_file = validation::validate_required_field(
                "credentials.service_account_file or credentials.access_token",
                &self.credentials.service_account_file,
            )?;
            validation::validate_path("credentials.service_account_file", key_file)?;
            if self.credentials.scopes.is_empty() {
                return Err(SheetsError::MissingConfigError {
                    field: "credentials.scopes".to_string(),
                });
            }
        }

        validation::validate_worksheet_name("worksheets.sales", &self.worksheets.sales)?;
        validation::validate_worksheet_name("worksheets.stock", &self.worksheets.stock)?;
        validation::validate_worksheet_name("worksheets.surplus", &self.worksheets.surplus)?;

        validation::validate_positive_number("layout.first_column", self.layout.first_column, 1)?;
        validation::validate_positive_number("history.entries", self.history.entries, 1)?;
        if let Some(max) = self.input.max_attempts {
            validation::validate_positive_number("input.max_attempts", max, 1)?;
        }

        Ok(())
    }
}

impl WorksheetLayout for SheetsConfig {
    fn sales_worksheet(&self) -> &str {
        &self.worksheets.sales
    }

    fn stock_worksheet(&self) -> &str {
        &self.worksheets.stock
    }

    fn surplus_worksheet(&self) -> &str {
        &self.worksheets.surplus
    }

    fn first_column(&self) -> usize {
        self.layout.first_column
    }

    fn header_rows(&self) -> usize {
        self.layout.header_rows
    }

    fn history_entries(&self) -> usize {
        self.history.entries
    }
}

impl Validate for SheetsConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
