use crate::config::SpreadsheetConfig;
use crate::core::{TokenProvider, WorksheetGateway};
use crate::utils::error::{Result, SheetsError};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

const SPREADSHEET_MIME_TYPE: &str = "application/vnd.google-apps.spreadsheet";

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
    name: String,
}

/// `WorksheetGateway` over the Google Sheets v4 values API.
pub struct GoogleSheetsGateway<T: TokenProvider> {
    client: Client,
    api_base: Url,
    spreadsheet_id: String,
    tokens: T,
}

impl<T: TokenProvider> GoogleSheetsGateway<T> {
    pub fn new(client: Client, api_base_url: &str, spreadsheet_id: impl Into<String>, tokens: T) -> Result<Self> {
        let api_base = Url::parse(api_base_url).map_err(|e| SheetsError::InvalidConfigValueError {
            field: "spreadsheet.api_base_url".to_string(),
            value: api_base_url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            client,
            api_base,
            spreadsheet_id: spreadsheet_id.into(),
            tokens,
        })
    }

    /// Opens the spreadsheet by id, or by title through the Drive files listing.
    pub async fn connect(client: Client, config: &SpreadsheetConfig, tokens: T) -> Result<Self> {
        let spreadsheet_id = match config.id.as_deref().filter(|id| !id.trim().is_empty()) {
            Some(id) => id.to_string(),
            None => {
                let name = config.name.as_deref().ok_or_else(|| SheetsError::MissingConfigError {
                    field: "spreadsheet.id or spreadsheet.name".to_string(),
                })?;
                find_spreadsheet_id(&client, &config.drive_base_url, name, &tokens).await?
            }
        };
        tracing::info!("📄 Using spreadsheet {}", spreadsheet_id);
        Self::new(client, &config.api_base_url, spreadsheet_id, tokens)
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    fn values_url(&self, range: &str, suffix: &str) -> Result<Url> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| SheetsError::ConfigError {
                message: format!("'{}' cannot be used as a base URL", self.api_base),
            })?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str(), "values"])
            .push(&format!("{}{}", range, suffix));
        Ok(url)
    }

    async fn get_range(&self, worksheet: &str, range: &str, major_dimension: &str) -> Result<Vec<Vec<String>>> {
        let url = self.values_url(range, "")?;
        let token = self.tokens.access_token().await?;

        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .query(&[("majorDimension", major_dimension)])
            .send()
            .await?;
        let response = check_response(response, worksheet, &self.spreadsheet_id).await?;

        let body: ValueRange = response.json().await?;
        Ok(body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }
}

#[async_trait]
impl<T: TokenProvider> WorksheetGateway for GoogleSheetsGateway<T> {
    async fn append_row(&self, worksheet: &str, first_column: usize, values: &[i64]) -> Result<()> {
        let last_column = first_column + values.len().saturating_sub(1);
        let range = format!(
            "{}!{}:{}",
            quoted_sheet(worksheet),
            column_index(first_column)?,
            column_index(last_column)?
        );
        let url = self.values_url(&range, ":append")?;
        let token = self.tokens.access_token().await?;

        tracing::debug!("POST {} ({} values)", url, values.len());
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .query(&[
                ("valueInputOption", "RAW"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&json!({
                "majorDimension": "ROWS",
                "values": [values],
            }))
            .send()
            .await?;
        check_response(response, worksheet, &self.spreadsheet_id).await?;
        Ok(())
    }

    async fn get_all_values(&self, worksheet: &str) -> Result<Vec<Vec<String>>> {
        self.get_range(worksheet, &quoted_sheet(worksheet), "ROWS").await
    }

    async fn get_latest_row(&self, worksheet: &str) -> Result<Vec<String>> {
        self.get_all_values(worksheet)
            .await?
            .pop()
            .ok_or_else(|| SheetsError::EmptyWorksheet {
                worksheet: worksheet.to_string(),
            })
    }

    async fn get_column(&self, worksheet: &str, column: usize) -> Result<Vec<String>> {
        let letter = column_index(column)?;
        let range = format!("{}!{}:{}", quoted_sheet(worksheet), letter, letter);
        let columns = self.get_range(worksheet, &range, "COLUMNS").await?;
        Ok(columns.into_iter().next().unwrap_or_default())
    }
}

async fn find_spreadsheet_id<T: TokenProvider>(
    client: &Client,
    drive_base_url: &str,
    name: &str,
    tokens: &T,
) -> Result<String> {
    let mut url = Url::parse(drive_base_url).map_err(|e| SheetsError::InvalidConfigValueError {
        field: "spreadsheet.drive_base_url".to_string(),
        value: drive_base_url.to_string(),
        reason: e.to_string(),
    })?;
    url.path_segments_mut()
        .map_err(|_| SheetsError::ConfigError {
            message: format!("'{}' cannot be used as a base URL", drive_base_url),
        })?
        .pop_if_empty()
        .extend(["drive", "v3", "files"]);

    let query = format!(
        "name = '{}' and mimeType = '{}' and trashed = false",
        name.replace('\\', "\\\\").replace('\'', "\\'"),
        SPREADSHEET_MIME_TYPE
    );
    let token = tokens.access_token().await?;

    tracing::debug!("Looking up spreadsheet '{}' in Drive", name);
    let response = client
        .get(url)
        .bearer_auth(token)
        .query(&[
            ("q", query.as_str()),
            ("fields", "files(id,name)"),
            ("supportsAllDrives", "true"),
            ("includeItemsFromAllDrives", "true"),
        ])
        .send()
        .await?;
    let response = check_response(response, "drive files", name).await?;

    let list: FileList = response.json().await?;
    if list.files.len() > 1 {
        tracing::warn!(
            "{} spreadsheets are named '{}', using the first",
            list.files.len(),
            name
        );
    }
    list.files
        .into_iter()
        .find(|file| file.name == name)
        .map(|file| file.id)
        .ok_or_else(|| SheetsError::SpreadsheetNotFound {
            name: name.to_string(),
        })
}

/// Maps a failed response onto the error for `worksheet` or `spreadsheet`.
async fn check_response(response: Response, worksheet: &str, spreadsheet: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::debug!("Request for '{}' failed with {}: {}", worksheet, status, body);

    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SheetsError::AuthError {
            message: format!("{}: {}", status, body),
        },
        // the values API answers a missing tab with "Unable to parse range"
        StatusCode::BAD_REQUEST if body.contains("Unable to parse range") => {
            SheetsError::WorksheetNotFound {
                worksheet: worksheet.to_string(),
            }
        }
        StatusCode::NOT_FOUND => SheetsError::SpreadsheetNotFound {
            name: spreadsheet.to_string(),
        },
        _ => SheetsError::RemoteStatus {
            status: status.as_u16(),
            body,
        },
    })
}

/// A1 sheet prefix, quoted so titles with spaces or digits parse.
fn quoted_sheet(worksheet: &str) -> String {
    format!("'{}'", worksheet.replace('\'', "''"))
}

/// 1 -> A, 26 -> Z, 27 -> AA.
fn column_letter(column: usize) -> Option<String> {
    if column == 0 {
        return None;
    }
    let mut n = column;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }
    Some(letters.into_iter().rev().collect())
}

fn column_index(column: usize) -> Result<String> {
    column_letter(column).ok_or_else(|| SheetsError::InvalidConfigValueError {
        field: "column".to_string(),
        value: column.to_string(),
        reason: "Columns are numbered from 1".to_string(),
    })
}

fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
