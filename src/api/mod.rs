pub mod handlers;

pub use handlers::*;

use crate::service::SplitService;
use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

/// 构建路由
pub fn router(service: Arc<SplitService>) -> Router {
    let bill_routes = Router::new()
        .route("/api/bills", post(create_bill))
        .route("/api/bills/:bill_id", get(get_bill))
        .route("/api/bills/:bill_id/votes/:user_id", put(submit_votes))
        .route("/api/bills/:bill_id/items/:item_id", get(get_item))
        .route("/api/bills/:bill_id/items/:item_id/votes", put(submit_item_votes))
        .route("/api/bills/:bill_id/split", get(split_bill))
        .route("/api/bills/:bill_id/split/message", get(split_message))
        .route("/api/bills/:bill_id/split/csv", get(split_csv))
        .route("/api/split/batch", post(batch_split))
        .with_state(service);

    Router::new()
        .route("/health", get(health_check))
        .merge(bill_routes)
}
