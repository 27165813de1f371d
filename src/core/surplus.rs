use crate::domain::model::{SalesRecord, StockRecord, SurplusRecord, ITEM_COUNT};
use crate::utils::error::{Result, SheetsError};

/// `stock[i] - sales[i]` for every sandwich type. A difference outside the
/// `i64` range is an error rather than a wrapped value.
pub fn calculate_surplus(stock: &StockRecord, sales: &SalesRecord) -> Result<SurplusRecord> {
    let mut surplus = [0i64; ITEM_COUNT];
    for (item, ((slot, &on_hand), &sold)) in surplus
        .iter_mut()
        .zip(stock.values())
        .zip(sales.values())
        .enumerate()
    {
        *slot = on_hand
            .checked_sub(sold)
            .ok_or(SheetsError::SurplusOverflow {
                item: item + 1,
                stock: on_hand,
                sales: sold,
            })?;
    }
    Ok(SurplusRecord::new(surplus))
}
