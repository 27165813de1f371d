pub mod input;
pub mod runner;
pub mod surplus;

pub use crate::domain::model::{RecentHistory, SalesRecord, StockRecord, SurplusRecord, ITEM_COUNT};
pub use crate::domain::ports::{TokenProvider, WorksheetGateway, WorksheetLayout};
pub use crate::utils::error::Result;
