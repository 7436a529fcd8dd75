pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod report;
pub mod service;

pub use config::AppConfig;
pub use db::{BillRepository, InMemoryBillStore};
pub use service::{calculate_split, Adjustment, SplitService};
