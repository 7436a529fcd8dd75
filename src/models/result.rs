use super::bill::{Bill, BillItem};
use super::claim::{Claim, UserId, UserShare};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::hash::Hash;

/// 用户分摊到的一条明细
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemWithProportion {
    pub item: BillItem,
    pub proportional_price: f64,
    pub proportion: f64,
}

/// 单个用户的分账结果
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSelection {
    pub items_with_proportion: Vec<ItemWithProportion>,
    pub total: f64,
}

/// 分账结果 (即时计算, 不落库)
///
/// `user_selections` 按用户首次出现的顺序保存, 顺序本身没有业务含义。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(bound(
    serialize = "U: Serialize + Eq + Hash",
    deserialize = "U: Deserialize<'de> + Eq + Hash"
))]
pub struct SplitResult<U = UserId> {
    pub user_selections: IndexMap<U, UserSelection>,
    pub unvoted_items: Vec<BillItem>,
}

impl<U: Eq + Hash> PartialEq for SplitResult<U> {
    fn eq(&self, other: &Self) -> bool {
        self.user_selections == other.user_selections && self.unvoted_items == other.unvoted_items
    }
}

impl<U: Eq + Hash> SplitResult<U> {
    /// 所有用户应付金额之和
    pub fn allocated_total(&self) -> f64 {
        self.user_selections.values().map(|s| s.total).sum()
    }

    /// 无人认领的明细总价
    pub fn unvoted_total(&self) -> f64 {
        self.unvoted_items.iter().map(BillItem::total_cost).sum()
    }
}

/// 接口返回: 账单 + 分账结果 + 实际使用的调整系数
///
/// `user_names` 只包含已登记名字的用户, 展示时其余用户回退为 id。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillSplit {
    pub bill: Bill,
    pub coefficient: f64,
    pub split: SplitResult,
    #[serde(default)]
    pub user_names: IndexMap<UserId, String>,
}

/// 账单及其全部认领
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillWithClaims {
    pub bill: Bill,
    pub claims: Vec<Claim>,
}

/// 单个明细及各用户在其上的份数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillItemDetails {
    pub bill_item: BillItem,
    pub bill: Bill,
    pub user_votes: Vec<UserShare>,
}
