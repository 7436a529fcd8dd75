pub mod export;
pub mod telegram;

pub use export::export_to_csv;
pub use telegram::{currency_symbol, format_bill_analysis, format_calculation};
