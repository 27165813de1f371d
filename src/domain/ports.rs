use crate::utils::error::Result;
use async_trait::async_trait;

/// Row and column access to named worksheets of one spreadsheet.
#[async_trait]
pub trait WorksheetGateway: Send + Sync {
    /// Appends one row after the last non-empty row of `worksheet`, with the
    /// first value landing in the 1-based `first_column`.
    async fn append_row(&self, worksheet: &str, first_column: usize, values: &[i64]) -> Result<()>;

    /// Every row of `worksheet`, top to bottom. Trailing empty cells are omitted
    /// by the service, so rows may be ragged.
    async fn get_all_values(&self, worksheet: &str) -> Result<Vec<Vec<String>>>;

    /// The most recently appended row.
    async fn get_latest_row(&self, worksheet: &str) -> Result<Vec<String>>;

    /// All cells of a 1-based column, top to bottom.
    async fn get_column(&self, worksheet: &str, column: usize) -> Result<Vec<String>>;
}

#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}

/// Maps the logical record kinds onto worksheet titles and column layout.
pub trait WorksheetLayout: Send + Sync {
    fn sales_worksheet(&self) -> &str;
    fn stock_worksheet(&self) -> &str;
    fn surplus_worksheet(&self) -> &str;
    /// 1-based column of the first sandwich type.
    fn first_column(&self) -> usize;
    fn header_rows(&self) -> usize;
    fn history_entries(&self) -> usize;
}
