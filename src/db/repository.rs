use crate::models::{Bill, BillId, Claim, ItemId, ItemVote, ParsedBill, User, UserId, UserShare};
use async_trait::async_trait;
use indexmap::IndexMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum RepositoryError {
    #[error("Bill {0} not found")]
    BillNotFound(BillId),

    #[error("Item {item_id} not found in bill {bill_id}")]
    ItemNotFound { bill_id: BillId, item_id: ItemId },
}

/// 账单仓库: 分账服务只依赖这组接口, 存储方式可替换
#[async_trait]
pub trait BillRepository: Send + Sync {
    /// 查询账单及其明细
    async fn get_bill(&self, bill_id: BillId) -> Result<Option<Bill>, RepositoryError>;

    /// 查询账单下所有认领
    async fn list_claims(&self, bill_id: BillId) -> Result<Vec<Claim>, RepositoryError>;

    /// 录入识别结果, 分配账单 id 与明细 id
    async fn insert_bill(&self, parsed: ParsedBill) -> Result<Bill, RepositoryError>;

    /// 覆盖某用户在该账单上的全部认领 (空列表即清空)
    async fn replace_user_claims(
        &self,
        bill_id: BillId,
        user_id: UserId,
        votes: Vec<ItemVote>,
    ) -> Result<Vec<Claim>, RepositoryError>;

    /// 按 (用户, 明细) 写入份数; 未列出的用户保持不变, 返回该明细上的全部认领
    async fn upsert_item_claims(
        &self,
        bill_id: BillId,
        item_id: ItemId,
        shares: Vec<UserShare>,
    ) -> Result<Vec<Claim>, RepositoryError>;

    /// 登记或更新用户名字
    async fn save_user(&self, user: User) -> Result<(), RepositoryError>;

    /// 查询已登记的名字, 按传入顺序返回, 未登记的用户不出现
    async fn user_names(
        &self,
        user_ids: &[UserId],
    ) -> Result<IndexMap<UserId, String>, RepositoryError>;
}
