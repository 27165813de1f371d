use crate::core::input::SalesPrompt;
use crate::core::surplus::calculate_surplus;
use crate::domain::model::{RecentHistory, SalesRecord, StockRecord, SurplusRecord, ITEM_COUNT};
use crate::domain::ports::{WorksheetGateway, WorksheetLayout};
use crate::utils::error::{Result, SheetsError};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};

/// Rows written and read during one update cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOutcome {
    pub sales: SalesRecord,
    pub stock: StockRecord,
    pub surplus: SurplusRecord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum HistoryFormat {
    #[default]
    Text,
    Json,
    Csv,
}

pub struct ReportRunner<G: WorksheetGateway, L: WorksheetLayout> {
    gateway: G,
    layout: L,
}

impl<G: WorksheetGateway, L: WorksheetLayout> ReportRunner<G, L> {
    pub fn new(gateway: G, layout: L) -> Self {
        Self { gateway, layout }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Prompt, record sales, then record the surplus against the latest stock.
    ///
    /// The two appends are not atomic. If the surplus write fails the sales
    /// row stays in place and has to be reconciled by hand.
    pub async fn run_update_cycle<R: BufRead, W: Write>(
        &self,
        prompt: &mut SalesPrompt<R, W>,
    ) -> Result<UpdateOutcome> {
        let sales = prompt.get_sales_data()?;
        tracing::info!("Accepted sales data: {:?}", sales.values());

        self.update_worksheet(sales.values(), self.layout.sales_worksheet())
            .await?;

        let (stock, surplus) = match self.calculate_surplus_data(&sales).await {
            Ok(result) => result,
            Err(e) => {
                self.log_partial_update(&sales, &e);
                return Err(e);
            }
        };

        if let Err(e) = self
            .update_worksheet(surplus.values(), self.layout.surplus_worksheet())
            .await
        {
            self.log_partial_update(&sales, &e);
            return Err(e);
        }

        Ok(UpdateOutcome {
            sales,
            stock,
            surplus,
        })
    }

    pub async fn update_worksheet(&self, values: &[i64], worksheet: &str) -> Result<()> {
        println!("Updating {} worksheet...\n", worksheet);
        self.gateway
            .append_row(worksheet, self.layout.first_column(), values)
            .await?;
        println!("{} worksheet updated successfully.\n", worksheet);
        tracing::debug!("Appended {:?} to '{}'", values, worksheet);
        Ok(())
    }

    pub async fn calculate_surplus_data(
        &self,
        sales: &SalesRecord,
    ) -> Result<(StockRecord, SurplusRecord)> {
        println!("Calculating surplus data...\n");
        let worksheet = self.layout.stock_worksheet();
        let row = self.gateway.get_latest_row(worksheet).await?;
        let stock = StockRecord::from_cells(worksheet, item_cells(&row, self.layout.first_column()))?;
        tracing::debug!("Latest stock row: {:?}", stock.values());
        let surplus = calculate_surplus(&stock, sales)?;
        Ok((stock, surplus))
    }

    /// Last `history_entries` data cells of each sales column.
    pub async fn recent_sales_history(&self) -> Result<RecentHistory> {
        let worksheet = self.layout.sales_worksheet();
        let first = self.layout.first_column();
        let mut columns = Vec::with_capacity(ITEM_COUNT);

        for offset in 0..ITEM_COUNT {
            let column = self.gateway.get_column(worksheet, first + offset).await?;
            columns.push(last_entries(
                &column,
                self.layout.header_rows(),
                self.layout.history_entries(),
            ));
        }

        tracing::debug!("Collected {} history columns from '{}'", columns.len(), worksheet);
        Ok(RecentHistory { columns })
    }

    pub async fn print_recent_sales_history<W: Write>(
        &self,
        format: HistoryFormat,
        writer: W,
    ) -> Result<RecentHistory> {
        let history = self.recent_sales_history().await?;
        render_history(&history, format, writer)?;
        Ok(history)
    }

    fn log_partial_update(&self, sales: &SalesRecord, error: &SheetsError) {
        tracing::error!(
            "Sales row {:?} was appended to '{}' but no surplus row was written to '{}': {}",
            sales.values(),
            self.layout.sales_worksheet(),
            self.layout.surplus_worksheet(),
            error
        );
    }
}

/// The cells from the 1-based `first_column` onwards, at most `ITEM_COUNT` of them.
fn item_cells(row: &[String], first_column: usize) -> &[String] {
    let cells = row.get(first_column.saturating_sub(1)..).unwrap_or(&[]);
    &cells[..cells.len().min(ITEM_COUNT)]
}

fn last_entries(column: &[String], header_rows: usize, entries: usize) -> Vec<String> {
    let data = column.get(header_rows..).unwrap_or(&[]);
    data[data.len().saturating_sub(entries)..].to_vec()
}

pub fn render_history<W: Write>(
    history: &RecentHistory,
    format: HistoryFormat,
    mut writer: W,
) -> Result<()> {
    match format {
        HistoryFormat::Text => {
            let columns: Vec<String> = history
                .columns
                .iter()
                .map(|column| {
                    let cells: Vec<String> = column.iter().map(|v| format!("'{}'", v)).collect();
                    format!("[{}]", cells.join(", "))
                })
                .collect();
            writeln!(writer, "[{}]", columns.join(",\n "))?;
        }
        HistoryFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, &history.columns)?;
            writeln!(writer)?;
        }
        HistoryFormat::Csv => {
            let mut csv_writer = csv::WriterBuilder::new()
                .flexible(true)
                .from_writer(writer);
            for column in &history.columns {
                csv_writer.write_record(column)?;
            }
            csv_writer.flush()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockGateway {
        sheets: Mutex<HashMap<String, Vec<Vec<String>>>>,
        fail_appends_to: Option<String>,
    }

    impl MockGateway {
        fn with_sheet(self, name: &str, rows: Vec<Vec<&str>>) -> Self {
            let rows: Vec<Vec<String>> = rows
                .into_iter()
                .map(|row| row.into_iter().map(str::to_string).collect())
                .collect();
            self.sheets.lock().unwrap().insert(name.to_string(), rows);
            self
        }

        fn rows(&self, name: &str) -> Vec<Vec<String>> {
            self.sheets.lock().unwrap().get(name).cloned().unwrap_or_default()
        }
    }

    #[async_trait]
    impl WorksheetGateway for MockGateway {
        async fn append_row(
            &self,
            worksheet: &str,
            first_column: usize,
            values: &[i64],
        ) -> Result<()> {
            if self.fail_appends_to.as_deref() == Some(worksheet) {
                return Err(SheetsError::RemoteStatus {
                    status: 503,
                    body: "unavailable".to_string(),
                });
            }
            let mut sheets = self.sheets.lock().unwrap();
            let rows = sheets
                .get_mut(worksheet)
                .ok_or_else(|| SheetsError::WorksheetNotFound {
                    worksheet: worksheet.to_string(),
                })?;
            let mut row = vec![String::new(); first_column - 1];
            row.extend(values.iter().map(|v| v.to_string()));
            rows.push(row);
            Ok(())
        }

        async fn get_all_values(&self, worksheet: &str) -> Result<Vec<Vec<String>>> {
            self.sheets
                .lock()
                .unwrap()
                .get(worksheet)
                .cloned()
                .ok_or_else(|| SheetsError::WorksheetNotFound {
                    worksheet: worksheet.to_string(),
                })
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
            Ok(self
                .get_all_values(worksheet)
                .await?
                .into_iter()
                .filter_map(|row| row.get(column - 1).cloned())
                .collect())
        }
    }

    struct Layout {
        entries: usize,
        first_column: usize,
    }

    impl Layout {
        fn entries(entries: usize) -> Self {
            Self {
                entries,
                first_column: 1,
            }
        }
    }

    impl WorksheetLayout for Layout {
        fn sales_worksheet(&self) -> &str {
            "sales"
        }
        fn stock_worksheet(&self) -> &str {
            "stock"
        }
        fn surplus_worksheet(&self) -> &str {
            "surplus"
        }
        fn first_column(&self) -> usize {
            self.first_column
        }
        fn header_rows(&self) -> usize {
            1
        }
        fn history_entries(&self) -> usize {
            self.entries
        }
    }

    const HEADER: [&str; 6] = ["cheese", "ham", "egg", "tuna", "chicken", "veggie"];

    fn prompt(input: &str) -> SalesPrompt<Cursor<Vec<u8>>, Vec<u8>> {
        SalesPrompt::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    fn workbook() -> MockGateway {
        MockGateway::default()
            .with_sheet("sales", vec![HEADER.to_vec()])
            .with_sheet(
                "stock",
                vec![HEADER.to_vec(), vec!["1", "1", "1", "1", "1", "1"], vec!["30"; 6]],
            )
            .with_sheet("surplus", vec![HEADER.to_vec()])
    }

    #[tokio::test]
    async fn test_update_cycle_writes_sales_and_surplus() {
        let runner = ReportRunner::new(workbook(), Layout::entries(5));
        let mut prompt = prompt("10,20,30,40,50\n10,20,30,40,50,60\n");

        let outcome = runner.run_update_cycle(&mut prompt).await.unwrap();

        assert_eq!(outcome.stock.values(), &[30; 6]);
        assert_eq!(outcome.surplus.values(), &[20, 10, 0, -10, -20, -30]);
        assert_eq!(
            runner.gateway().rows("sales").last().unwrap(),
            &vec!["10", "20", "30", "40", "50", "60"]
        );
        assert_eq!(
            runner.gateway().rows("surplus").last().unwrap(),
            &vec!["20", "10", "0", "-10", "-20", "-30"]
        );
    }

    #[tokio::test]
    async fn test_short_stock_row_fails_after_sales_write() {
        let gateway = workbook().with_sheet("stock", vec![vec!["30", "30", "30", "30", "30"]]);
        let runner = ReportRunner::new(gateway, Layout::entries(5));
        let mut prompt = prompt("1,2,3,4,5,6\n");

        let err = runner.run_update_cycle(&mut prompt).await.unwrap_err();

        assert!(matches!(err, SheetsError::RecordShape { found: 5, .. }));
        assert_eq!(runner.gateway().rows("sales").len(), 2);
        assert_eq!(runner.gateway().rows("surplus").len(), 1);
    }

    #[tokio::test]
    async fn test_offset_layout_reads_and_writes_from_first_column() {
        let gateway = MockGateway::default()
            .with_sheet("sales", vec![])
            .with_sheet(
                "stock",
                vec![vec!["2024-01-01", "30", "30", "30", "30", "30", "30", "note"]],
            )
            .with_sheet("surplus", vec![]);
        let layout = Layout {
            entries: 5,
            first_column: 2,
        };
        let runner = ReportRunner::new(gateway, layout);
        let mut prompt = prompt("1,2,3,4,5,6
");

        let outcome = runner.run_update_cycle(&mut prompt).await.unwrap();

        assert_eq!(outcome.stock.values(), &[30; 6]);
        assert_eq!(outcome.surplus.values(), &[29, 28, 27, 26, 25, 24]);
        assert_eq!(
            runner.gateway().rows("sales"),
            vec![vec!["", "1", "2", "3", "4", "5", "6"]]
        );
        assert_eq!(
            runner.gateway().rows("surplus"),
            vec![vec!["", "29", "28", "27", "26", "25", "24"]]
        );
    }

    #[tokio::test]
    async fn test_surplus_overflow_stops_before_surplus_write() {
        let gateway = workbook().with_sheet("stock", vec![vec!["-2"; 6]]);
        let runner = ReportRunner::new(gateway, Layout::entries(5));
        let mut prompt = prompt(&format!("{},0,0,0,0,0\n", i64::MAX));

        let err = runner.run_update_cycle(&mut prompt).await.unwrap_err();

        assert!(matches!(err, SheetsError::SurplusOverflow { item: 1, .. }));
        assert_eq!(err.exit_code(), 1);
        assert_eq!(runner.gateway().rows("sales").len(), 2);
        assert_eq!(runner.gateway().rows("surplus").len(), 1);
    }

    #[tokio::test]
    async fn test_failed_surplus_write_leaves_sales_row() {
        let gateway = MockGateway {
            fail_appends_to: Some("surplus".to_string()),
            ..workbook()
        };
        let runner = ReportRunner::new(gateway, Layout::entries(5));
        let mut prompt = prompt("1,2,3,4,5,6\n");

        let err = runner.run_update_cycle(&mut prompt).await.unwrap_err();

        assert!(matches!(err, SheetsError::RemoteStatus { status: 503, .. }));
        assert_eq!(runner.gateway().rows("sales").len(), 2);
    }

    #[tokio::test]
    async fn test_recent_history_takes_last_entries() {
        let mut rows = vec![HEADER.to_vec()];
        let values: Vec<Vec<String>> = (1..=8)
            .map(|n| (0..6).map(|col| (n * 10 + col).to_string()).collect())
            .collect();
        rows.extend(values.iter().map(|row| row.iter().map(String::as_str).collect::<Vec<_>>()));
        let runner = ReportRunner::new(
            workbook().with_sheet("sales", rows),
            Layout::entries(5),
        );

        let history = runner.recent_sales_history().await.unwrap();

        assert_eq!(history.columns.len(), 6);
        assert_eq!(history.columns[0], vec!["40", "50", "60", "70", "80"]);
        assert_eq!(history.columns[5], vec!["45", "55", "65", "75", "85"]);
    }

    #[tokio::test]
    async fn test_recent_history_with_few_rows_skips_header() {
        let runner = ReportRunner::new(
            workbook().with_sheet("sales", vec![HEADER.to_vec(), vec!["7"; 6], vec!["9"; 6]]),
            Layout::entries(5),
        );

        let history = runner.recent_sales_history().await.unwrap();

        assert!(history.columns.iter().all(|c| c == &vec!["7", "9"]));
    }

    #[test]
    fn test_item_cells_skips_leading_columns() {
        let row: Vec<String> = ["d", "1", "2", "3", "4", "5", "6", "x"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(item_cells(&row, 2), &row[1..7]);
        assert_eq!(item_cells(&row, 1), &row[..6]);
        assert_eq!(item_cells(&row, 5).len(), 4);
        assert!(item_cells(&row, 20).is_empty());
    }

    #[test]
    fn test_last_entries_edges() {
        let column: Vec<String> = ["h", "1", "2", "3"].iter().map(|s| s.to_string()).collect();
        assert_eq!(last_entries(&column, 1, 2), vec!["2", "3"]);
        assert_eq!(last_entries(&column, 1, 10), vec!["1", "2", "3"]);
        assert!(last_entries(&column, 9, 5).is_empty());
        assert!(last_entries(&[], 1, 5).is_empty());
    }

    #[test]
    fn test_render_history_formats() {
        let history = RecentHistory {
            columns: vec![vec!["1".to_string(), "2".to_string()], vec!["3".to_string()]],
        };

        let mut text = Vec::new();
        render_history(&history, HistoryFormat::Text, &mut text).unwrap();
        assert_eq!(String::from_utf8(text).unwrap(), "[['1', '2'],\n ['3']]\n");

        let mut json = Vec::new();
        render_history(&history, HistoryFormat::Json, &mut json).unwrap();
        let parsed: Vec<Vec<String>> = serde_json::from_slice(&json).unwrap();
        assert_eq!(parsed, history.columns);

        let mut csv = Vec::new();
        render_history(&history, HistoryFormat::Csv, &mut csv).unwrap();
        assert_eq!(String::from_utf8(csv).unwrap(), "1,2\n3\n");
    }
}
