use crate::models::{Bill, SplitResult};
use csv::Writer;
use std::fmt::Display;
use std::hash::Hash;
use std::io::Write;

/// 导出分账明细为 CSV: 每个 (用户, 明细) 一行
pub fn export_to_csv<U, W>(bill: &Bill, result: &SplitResult<U>, output: W) -> Result<W, csv::Error>
where
    U: Eq + Hash + Display,
    W: Write,
{
    let mut writer = Writer::from_writer(output);
    writer.write_record([
        "bill_id",
        "user_id",
        "item_id",
        "item_name",
        "currency",
        "proportion",
        "proportional_price",
        "user_total",
    ])?;

    for (user, selection) in &result.user_selections {
        for entry in &selection.items_with_proportion {
            writer.write_record(&[
                bill.id.to_string(),
                user.to_string(),
                entry.item.id.to_string(),
                entry.item.name_english.clone(),
                bill.currency.clone(),
                entry.proportion.to_string(),
                entry.proportional_price.to_string(),
                selection.total.to_string(),
            ])?;
        }
    }

    writer.flush()?;
    writer.into_inner().map_err(|e| e.into_error().into())
}
