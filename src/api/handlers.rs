use crate::models::{
    Bill, BillId, BillItemDetails, BillSplit, BillWithClaims, Claim, ItemId, ParsedBill, UserId,
    UserShare,
};
use crate::report::{export_to_csv, format_calculation};
use crate::service::{
    Adjustment, AdjustmentParseError, SplitError, SplitService, VoteError, VoteInput,
};
use axum::{
    extract::{Json, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

type AppState = State<Arc<SplitService>>;

/// 通用失败响应
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m),
        };
        if status.is_server_error() {
            tracing::error!("Request failed: {}", message);
        }
        let body = ErrorResponse {
            success: false,
            message: format!("Error: {}", message),
        };
        (status, Json(body)).into_response()
    }
}

impl From<SplitError> for ApiError {
    fn from(e: SplitError) -> Self {
        match e {
            SplitError::BillNotFound(_) | SplitError::ItemNotFound { .. } => {
                ApiError::NotFound(e.to_string())
            }
        }
    }
}

impl From<VoteError> for ApiError {
    fn from(e: VoteError) -> Self {
        match e {
            VoteError::NoValidItems | VoteError::InvalidShare(_) => {
                ApiError::BadRequest(e.to_string())
            }
            VoteError::Split(inner) => inner.into(),
        }
    }
}

impl From<AdjustmentParseError> for ApiError {
    fn from(e: AdjustmentParseError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl From<csv::Error> for ApiError {
    fn from(e: csv::Error) -> Self {
        ApiError::Internal(e.to_string())
    }
}

/// 查询参数: ?adjust=none|total_over_subtotal|charges|1.1
#[derive(Debug, Default, Deserialize)]
pub struct SplitQuery {
    pub adjust: Option<String>,
}

fn parse_adjustment(raw: Option<&str>) -> Result<Option<Adjustment>, AdjustmentParseError> {
    raw.map(|s| s.parse::<Adjustment>()).transpose()
}

/// 请求体: 投票原文 ("1, 3, 3") 或 1-based 序号列表, 原文优先; `name` 为可选的展示名
#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub text: Option<String>,
    pub items: Option<Vec<usize>>,
    pub name: Option<String>,
}

/// 请求体: 单个明细上各用户的份数
#[derive(Debug, Deserialize)]
pub struct ItemVotesRequest {
    pub votes: Vec<UserShare>,
}

#[derive(Debug, Serialize)]
pub struct VoteResponse {
    pub success: bool,
    pub message: String,
    pub claims: Vec<Claim>,
}

/// 请求体: 账单ID列表
#[derive(Debug, Deserialize)]
pub struct BatchSplitRequest {
    pub bill_ids: Vec<BillId>,
    pub adjust: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BatchSplitResponse {
    pub success: bool,
    pub message: String,
    pub splits: Vec<BillSplit>,
}

/// 健康检查
pub async fn health_check() -> &'static str {
    "OK"
}

/// 录入识别后的账单
pub async fn create_bill(
    State(service): AppState,
    Json(parsed): Json<ParsedBill>,
) -> Result<(StatusCode, Json<Bill>), ApiError> {
    let bill = service.ingest_bill(parsed).await?;
    Ok((StatusCode::CREATED, Json(bill)))
}

/// 账单及全部认领
pub async fn get_bill(
    State(service): AppState,
    Path(bill_id): Path<BillId>,
) -> Result<Json<BillWithClaims>, ApiError> {
    Ok(Json(service.get_bill_with_claims(bill_id).await?))
}

/// 明细详情及各用户份数
pub async fn get_item(
    State(service): AppState,
    Path((bill_id, item_id)): Path<(BillId, ItemId)>,
) -> Result<Json<BillItemDetails>, ApiError> {
    Ok(Json(service.get_item_details(bill_id, item_id).await?))
}

/// 用户投票 (覆盖该用户之前的投票)
pub async fn submit_votes(
    State(service): AppState,
    Path((bill_id, user_id)): Path<(BillId, UserId)>,
    Json(req): Json<VoteRequest>,
) -> Result<Json<VoteResponse>, ApiError> {
    let input = match (req.text, req.items) {
        (Some(text), _) => VoteInput::Text(text),
        (None, Some(items)) => VoteInput::Positions(items),
        (None, None) => {
            return Err(ApiError::BadRequest(
                "either 'text' or 'items' is required".to_string(),
            ))
        }
    };

    let claims = service.submit_votes(bill_id, user_id, input).await?;
    if let Some(name) = req.name.filter(|n| !n.trim().is_empty()) {
        service.register_user(user_id, &name).await?;
    }
    Ok(Json(VoteResponse {
        success: true,
        message: format!("User {} claimed {} items", user_id, claims.len()),
        claims,
    }))
}

/// 直接设置单个明细上的份数 (支持小数)
pub async fn submit_item_votes(
    State(service): AppState,
    Path((bill_id, item_id)): Path<(BillId, ItemId)>,
    Json(req): Json<ItemVotesRequest>,
) -> Result<Json<VoteResponse>, ApiError> {
    let claims = service.set_item_shares(bill_id, item_id, req.votes).await?;
    Ok(Json(VoteResponse {
        success: true,
        message: format!("Item {} has {} claims", item_id, claims.len()),
        claims,
    }))
}

/// 分账结果 (JSON)
pub async fn split_bill(
    State(service): AppState,
    Path(bill_id): Path<BillId>,
    Query(query): Query<SplitQuery>,
) -> Result<Json<BillSplit>, ApiError> {
    let adjustment = parse_adjustment(query.adjust.as_deref())?;
    Ok(Json(service.split_bill(bill_id, adjustment).await?))
}

/// 分账结果 (Telegram MarkdownV2 文本)
pub async fn split_message(
    State(service): AppState,
    Path(bill_id): Path<BillId>,
    Query(query): Query<SplitQuery>,
) -> Result<String, ApiError> {
    let adjustment = parse_adjustment(query.adjust.as_deref())?;
    let split = service.split_bill(bill_id, adjustment).await?;
    Ok(format_calculation(&split.bill, &split.split, &split.user_names))
}

/// 分账结果 (CSV)
pub async fn split_csv(
    State(service): AppState,
    Path(bill_id): Path<BillId>,
    Query(query): Query<SplitQuery>,
) -> Result<Response, ApiError> {
    let adjustment = parse_adjustment(query.adjust.as_deref())?;
    let split = service.split_bill(bill_id, adjustment).await?;
    let body = export_to_csv(&split.bill, &split.split, Vec::new())?;
    Ok(([(header::CONTENT_TYPE, "text/csv; charset=utf-8")], body).into_response())
}

/// 批量分账
pub async fn batch_split(
    State(service): AppState,
    Json(req): Json<BatchSplitRequest>,
) -> Result<Json<BatchSplitResponse>, ApiError> {
    let adjustment = parse_adjustment(req.adjust.as_deref())?;
    let splits = service.split_many(&req.bill_ids, adjustment).await?;
    let users: usize = splits.iter().map(|s| s.split.user_selections.len()).sum();

    Ok(Json(BatchSplitResponse {
        success: true,
        message: format!("Successfully split {} bills, {} users", splits.len(), users),
        splits,
    }))
}
