use crate::utils::error::{Result, SheetsError};
use serde::{Deserialize, Serialize};

/// Number of sandwich types tracked; the width of every record.
pub const ITEM_COUNT: usize = 6;

/// One day's sales, one slot per sandwich type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesRecord([i64; ITEM_COUNT]);

/// Stock available per sandwich type, read from the stock worksheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRecord([i64; ITEM_COUNT]);

/// Stock minus sales per sandwich type. Positive is waste, negative is
/// extra made during the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurplusRecord([i64; ITEM_COUNT]);

macro_rules! record_accessors {
    ($name:ident) => {
        impl $name {
            pub fn new(values: [i64; ITEM_COUNT]) -> Self {
                Self(values)
            }

            pub fn values(&self) -> &[i64; ITEM_COUNT] {
                &self.0
            }
        }

        impl From<[i64; ITEM_COUNT]> for $name {
            fn from(values: [i64; ITEM_COUNT]) -> Self {
                Self(values)
            }
        }
    };
}

record_accessors!(SalesRecord);
record_accessors!(StockRecord);
record_accessors!(SurplusRecord);

impl StockRecord {
    /// Converts a worksheet row of cell strings. The row must be exactly
    /// `ITEM_COUNT` wide and every cell an integer.
    pub fn from_cells(worksheet: &str, cells: &[String]) -> Result<Self> {
        if cells.len() != ITEM_COUNT {
            return Err(SheetsError::RecordShape {
                worksheet: worksheet.to_string(),
                expected: ITEM_COUNT,
                found: cells.len(),
            });
        }

        let mut values = [0i64; ITEM_COUNT];
        for (slot, cell) in values.iter_mut().zip(cells) {
            *slot = cell
                .trim()
                .parse::<i64>()
                .map_err(|_| SheetsError::InvalidCell {
                    worksheet: worksheet.to_string(),
                    value: cell.clone(),
                })?;
        }
        Ok(Self(values))
    }
}

/// Last few entries of each sales column, one inner list per sandwich type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentHistory {
    pub columns: Vec<Vec<String>>,
}

impl RecentHistory {
    /// Longest column length; columns can differ when cells were left blank.
    pub fn depth(&self) -> usize {
        self.columns.iter().map(Vec::len).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_stock_record_from_cells() {
        let record =
            StockRecord::from_cells("stock", &cells(&["30", "30", "30", "30", "30", " 31 "])).unwrap();
        assert_eq!(record.values(), &[30, 30, 30, 30, 30, 31]);
    }

    #[test]
    fn test_stock_record_rejects_short_row() {
        let err = StockRecord::from_cells("stock", &cells(&["1", "2", "3", "4", "5"])).unwrap_err();
        match err {
            SheetsError::RecordShape {
                worksheet,
                expected,
                found,
            } => {
                assert_eq!(worksheet, "stock");
                assert_eq!(expected, 6);
                assert_eq!(found, 5);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_stock_record_rejects_text_cell() {
        let err =
            StockRecord::from_cells("stock", &cells(&["1", "2", "3", "4", "5", "n/a"])).unwrap_err();
        assert!(matches!(err, SheetsError::InvalidCell { value, .. } if value == "n/a"));
    }

    #[test]
    fn test_history_depth() {
        let history = RecentHistory {
            columns: vec![cells(&["1", "2"]), cells(&["3"]), vec![]],
        };
        assert_eq!(history.depth(), 2);
    }
}
