use super::bill::ItemId;
use serde::{Deserialize, Serialize};

/// 服务层使用的用户 id (计算器本身对用户 id 类型是泛型的)
pub type UserId = i64;

/// 用户对某明细的认领 (投票)
///
/// `quantity` 是份数, 允许小数 (例如 3 份由 2 人不均分)。
/// 同一 (user, item) 只应出现一次, 重复投票需先聚合。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claim<U = UserId> {
    pub user_id: U,
    pub item_id: ItemId,
    pub quantity: f64,
}

impl<U> Claim<U> {
    pub fn new(user_id: U, item_id: ItemId, quantity: f64) -> Self {
        Self {
            user_id,
            item_id,
            quantity,
        }
    }
}

/// 聚合后的单用户投票 (不含用户 id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemVote {
    pub item_id: ItemId,
    pub quantity: f64,
}

/// 某用户在单个明细上的份数, 可为小数 (例如 3 份按 1.5 / 1.5 分)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserShare {
    pub user_id: UserId,
    pub share: f64,
}

/// 参与分账的用户, `name` 用于消息展示
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
}
