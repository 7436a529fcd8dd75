use super::repository::{BillRepository, RepositoryError};
use crate::models::ParsedBill;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid seed file: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// 启动时从 JSON 文件 (ParsedBill 数组) 预置账单, 返回录入数量
pub async fn load_seed<R: BillRepository + ?Sized>(
    repo: &R,
    path: &Path,
) -> Result<usize, SeedError> {
    let content = tokio::fs::read_to_string(path).await?;
    let bills: Vec<ParsedBill> = serde_json::from_str(&content)?;
    let count = bills.len();

    for parsed in bills {
        let bill = repo.insert_bill(parsed).await?;
        tracing::info!(
            "Seeded bill {} ({} items, {})",
            bill.id,
            bill.items.len(),
            bill.currency
        );
    }

    Ok(count)
}
