use super::adjustment::Adjustment;
use super::calculator::calculate_split;
use super::votes::{aggregate_votes, item_ids_at_positions, parse_vote_message};
use crate::db::{BillRepository, RepositoryError};
use crate::models::{
    Bill, BillId, BillItemDetails, BillSplit, BillWithClaims, Claim, ItemId, ParsedBill, User,
    UserId, UserShare,
};
use futures::future::try_join_all;
use indexmap::{IndexMap, IndexSet};
use rayon::prelude::*;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SplitError {
    #[error("Bill {0} not found")]
    BillNotFound(BillId),

    #[error("Item {item_id} not found in bill {bill_id}")]
    ItemNotFound { bill_id: BillId, item_id: ItemId },
}

impl From<RepositoryError> for SplitError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::BillNotFound(id) => SplitError::BillNotFound(id),
            RepositoryError::ItemNotFound { bill_id, item_id } => {
                SplitError::ItemNotFound { bill_id, item_id }
            }
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum VoteError {
    #[error("Please provide valid item numbers separated by commas (e.g. '1,3,4')")]
    NoValidItems,

    #[error("Share must be a non-negative number, got {0}")]
    InvalidShare(f64),

    #[error(transparent)]
    Split(#[from] SplitError),
}

impl From<RepositoryError> for VoteError {
    fn from(e: RepositoryError) -> Self {
        VoteError::Split(e.into())
    }
}

/// 用户提交的投票: 聊天原文或已解析的 1-based 序号
#[derive(Debug, Clone, PartialEq)]
pub enum VoteInput {
    Text(String),
    Positions(Vec<usize>),
}

/// 分账服务: 从仓库取账单与认领, 调用计算器, 可选地做系数调整
pub struct SplitService {
    repo: Arc<dyn BillRepository>,
    default_adjustment: Adjustment,
}

impl SplitService {
    pub fn new(repo: Arc<dyn BillRepository>, default_adjustment: Adjustment) -> Self {
        Self {
            repo,
            default_adjustment,
        }
    }

    pub fn default_adjustment(&self) -> Adjustment {
        self.default_adjustment
    }

    /// 录入识别后的账单
    pub async fn ingest_bill(&self, parsed: ParsedBill) -> Result<Bill, SplitError> {
        let bill = self.repo.insert_bill(parsed).await?;
        tracing::info!(
            "[Split] Bill {}: 录入 {} 条明细, total {} {}",
            bill.id,
            bill.items.len(),
            bill.total,
            bill.currency
        );
        Ok(bill)
    }

    pub async fn get_bill(&self, bill_id: BillId) -> Result<Bill, SplitError> {
        self.repo
            .get_bill(bill_id)
            .await?
            .ok_or(SplitError::BillNotFound(bill_id))
    }

    pub async fn get_bill_with_claims(
        &self,
        bill_id: BillId,
    ) -> Result<BillWithClaims, SplitError> {
        let bill = self.get_bill(bill_id).await?;
        let claims = self.repo.list_claims(bill_id).await?;
        Ok(BillWithClaims { bill, claims })
    }

    /// 明细详情: 明细 + 所属账单 + 各用户份数
    pub async fn get_item_details(
        &self,
        bill_id: BillId,
        item_id: ItemId,
    ) -> Result<BillItemDetails, SplitError> {
        let BillWithClaims { bill, claims } = self.get_bill_with_claims(bill_id).await?;
        let bill_item = bill
            .item(item_id)
            .cloned()
            .ok_or(SplitError::ItemNotFound { bill_id, item_id })?;

        let user_votes = claims
            .into_iter()
            .filter(|c| c.item_id == item_id)
            .map(|c| UserShare {
                user_id: c.user_id,
                share: c.quantity,
            })
            .collect();

        Ok(BillItemDetails {
            bill_item,
            bill,
            user_votes,
        })
    }

    /// 登记用户展示名
    pub async fn register_user(&self, user_id: UserId, name: &str) -> Result<User, SplitError> {
        let user = User {
            id: user_id,
            name: name.trim().to_string(),
        };
        self.repo.save_user(user.clone()).await?;
        tracing::debug!("[Split] user {} registered as {}", user.id, user.name);
        Ok(user)
    }

    /// 覆盖用户在账单上的投票; 用户 id 必须由调用方显式给出
    pub async fn submit_votes(
        &self,
        bill_id: BillId,
        user_id: UserId,
        input: VoteInput,
    ) -> Result<Vec<Claim>, VoteError> {
        let bill = self.get_bill(bill_id).await?;
        let item_count = bill.items.len();

        let positions = match input {
            VoteInput::Text(text) => {
                let positions = parse_vote_message(&text, item_count);
                if positions.is_empty() {
                    return Err(VoteError::NoValidItems);
                }
                positions
            }
            VoteInput::Positions(raw) => {
                let positions: Vec<usize> = raw
                    .iter()
                    .copied()
                    .filter(|n| (1..=item_count).contains(n))
                    .collect();
                // 空列表表示撤回投票, 全部非法才报错
                if positions.is_empty() && !raw.is_empty() {
                    return Err(VoteError::NoValidItems);
                }
                positions
            }
        };

        let votes = aggregate_votes(&item_ids_at_positions(&bill, &positions));

        let claims = self.repo.replace_user_claims(bill_id, user_id, votes).await?;
        tracing::info!(
            "[Split] Bill {}: user {} voted {:?}",
            bill_id,
            user_id,
            positions
        );
        Ok(claims)
    }

    /// 直接设置多个用户在单个明细上的份数 (可为小数)
    pub async fn set_item_shares(
        &self,
        bill_id: BillId,
        item_id: ItemId,
        shares: Vec<UserShare>,
    ) -> Result<Vec<Claim>, VoteError> {
        if let Some(bad) = shares
            .iter()
            .find(|s| !(s.share.is_finite() && s.share >= 0.0))
        {
            return Err(VoteError::InvalidShare(bad.share));
        }

        let claims = self.repo.upsert_item_claims(bill_id, item_id, shares).await?;
        tracing::info!(
            "[Split] Bill {}: item {} now has {} claims",
            bill_id,
            item_id,
            claims.len()
        );
        Ok(claims)
    }

    /// 单张账单分账
    pub async fn split_bill(
        &self,
        bill_id: BillId,
        adjustment: Option<Adjustment>,
    ) -> Result<BillSplit, SplitError> {
        let loaded = self.load(bill_id).await?;
        let adjustment = adjustment.unwrap_or(self.default_adjustment);
        Ok(split_loaded(loaded, adjustment))
    }

    /// 批量分账: 先并发取数, 再用 rayon 并行计算; 任一账单不存在即失败
    pub async fn split_many(
        &self,
        bill_ids: &[BillId],
        adjustment: Option<Adjustment>,
    ) -> Result<Vec<BillSplit>, SplitError> {
        let adjustment = adjustment.unwrap_or(self.default_adjustment);
        let loaded = try_join_all(bill_ids.iter().map(|&id| self.load(id))).await?;

        tracing::info!("[Split] 批量分账 {} 张账单", loaded.len());

        Ok(loaded
            .into_par_iter()
            .map(|loaded| split_loaded(loaded, adjustment))
            .collect())
    }

    async fn load(&self, bill_id: BillId) -> Result<LoadedBill, SplitError> {
        let BillWithClaims { bill, claims } = self.get_bill_with_claims(bill_id).await?;
        let user_ids: Vec<UserId> = claims
            .iter()
            .map(|c| c.user_id)
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect();
        let user_names = self.repo.user_names(&user_ids).await?;
        Ok(LoadedBill {
            bill,
            claims,
            user_names,
        })
    }
}

struct LoadedBill {
    bill: Bill,
    claims: Vec<Claim>,
    user_names: IndexMap<UserId, String>,
}

fn split_loaded(loaded: LoadedBill, adjustment: Adjustment) -> BillSplit {
    let LoadedBill {
        bill,
        claims,
        user_names,
    } = loaded;
    let result = calculate_split(&bill, &claims);
    let (coefficient, split) = adjustment.apply(&bill, result);

    tracing::info!(
        "[Split] Bill {}: {} 条认领, {} 位用户, {} 条无人认领, 系数 {}",
        bill.id,
        claims.len(),
        split.user_selections.len(),
        split.unvoted_items.len(),
        coefficient
    );

    BillSplit {
        bill,
        coefficient,
        split,
        user_names,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryBillStore;
    use crate::models::ParsedBillItem;

    fn parsed() -> ParsedBill {
        let item = |name: &str, quantity: u32, total: f64| ParsedBillItem {
            name_original: name.to_string(),
            name_english: name.to_string(),
            quantity,
            price_per_unit: None,
            price_total: Some(total),
        };
        ParsedBill {
            items: vec![item("Beer", 3, 9.0), item("Pizza", 1, 20.0), item("Salad", 1, 7.0)],
            subtotal: Some(36.0),
            total: 39.6,
            currency: "EUR".to_string(),
            vat: None,
            service_fee: Some(3.6),
            total_discount: None,
        }
    }

    fn service() -> SplitService {
        SplitService::new(Arc::new(InMemoryBillStore::new()), Adjustment::None)
    }

    #[tokio::test]
    async fn test_vote_then_split() {
        let service = service();
        let bill = service.ingest_bill(parsed()).await.unwrap();

        service
            .submit_votes(bill.id, 1, VoteInput::Text("1, 2".to_string()))
            .await
            .unwrap();
        service
            .submit_votes(bill.id, 2, VoteInput::Positions(vec![1, 1]))
            .await
            .unwrap();

        let split = service.split_bill(bill.id, None).await.unwrap();

        assert_eq!(split.coefficient, 1.0);
        assert!((split.split.user_selections[&1].total - 23.0).abs() < 1e-9);
        assert!((split.split.user_selections[&2].total - 6.0).abs() < 1e-9);
        let unvoted: Vec<_> = split
            .split
            .unvoted_items
            .iter()
            .map(|i| i.name_english.as_str())
            .collect();
        assert_eq!(unvoted, vec!["Salad"]);
    }

    #[tokio::test]
    async fn test_revote_replaces_previous_claims() {
        let service = service();
        let bill = service.ingest_bill(parsed()).await.unwrap();

        service
            .submit_votes(bill.id, 1, VoteInput::Text("1".to_string()))
            .await
            .unwrap();
        let claims = service
            .submit_votes(bill.id, 1, VoteInput::Text("3,3".to_string()))
            .await
            .unwrap();

        assert_eq!(claims, vec![Claim::new(1, bill.items[2].id, 2.0)]);
        let split = service.split_bill(bill.id, None).await.unwrap();
        assert_eq!(split.split.user_selections[&1].items_with_proportion.len(), 1);
        assert_eq!(split.split.unvoted_items.len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_votes_are_rejected() {
        let service = service();
        let bill = service.ingest_bill(parsed()).await.unwrap();

        let err = service
            .submit_votes(bill.id, 1, VoteInput::Text("7, abc".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err, VoteError::NoValidItems);

        let err = service
            .submit_votes(bill.id, 1, VoteInput::Positions(vec![0, 4]))
            .await
            .unwrap_err();
        assert_eq!(err, VoteError::NoValidItems);

        let cleared = service
            .submit_votes(bill.id, 1, VoteInput::Positions(vec![]))
            .await
            .unwrap();
        assert!(cleared.is_empty());
    }

    #[tokio::test]
    async fn test_missing_bill() {
        let service = service();
        assert_eq!(
            service.split_bill(42, None).await.unwrap_err(),
            SplitError::BillNotFound(42)
        );
        assert_eq!(
            service
                .submit_votes(42, 1, VoteInput::Text("1".to_string()))
                .await
                .unwrap_err(),
            VoteError::Split(SplitError::BillNotFound(42))
        );
    }

    #[tokio::test]
    async fn test_split_many_applies_adjustment() {
        let service = service();
        let first = service.ingest_bill(parsed()).await.unwrap();
        let second = service.ingest_bill(parsed()).await.unwrap();
        service
            .submit_votes(second.id, 5, VoteInput::Text("2".to_string()))
            .await
            .unwrap();

        let splits = service
            .split_many(&[first.id, second.id], Some(Adjustment::TotalOverSubtotal))
            .await
            .unwrap();

        assert_eq!(splits.len(), 2);
        assert_eq!(splits[0].bill.id, first.id);
        assert!(splits[0].split.user_selections.is_empty());
        assert!((splits[1].coefficient - 1.1).abs() < 1e-9);
        assert!((splits[1].split.user_selections[&5].total - 22.0).abs() < 1e-9);

        assert_eq!(
            service.split_many(&[first.id, 99], None).await.unwrap_err(),
            SplitError::BillNotFound(99)
        );
    }

    #[tokio::test]
    async fn test_fractional_item_shares() {
        let service = service();
        let bill = service.ingest_bill(parsed()).await.unwrap();
        let beer = bill.items[0].id;
        let share = |user_id: UserId, share: f64| UserShare { user_id, share };

        service
            .set_item_shares(bill.id, beer, vec![share(1, 1.5), share(2, 1.5)])
            .await
            .unwrap();
        let split = service.split_bill(bill.id, None).await.unwrap();
        assert!((split.split.user_selections[&1].total - 4.5).abs() < 1e-9);
        assert!((split.split.user_selections[&2].total - 4.5).abs() < 1e-9);

        service
            .set_item_shares(bill.id, beer, vec![share(1, 2.5), share(2, 0.5)])
            .await
            .unwrap();
        let split = service.split_bill(bill.id, None).await.unwrap();
        let first = &split.split.user_selections[&1];
        assert!((first.total - 7.5).abs() < 1e-9);
        assert!((first.items_with_proportion[0].proportion - 2.5 / 3.0).abs() < 1e-12);
        assert!((split.split.user_selections[&2].total - 1.5).abs() < 1e-9);

        let details = service.get_item_details(bill.id, beer).await.unwrap();
        assert_eq!(details.bill_item.name_english, "Beer");
        assert_eq!(details.user_votes, vec![share(1, 2.5), share(2, 0.5)]);
    }

    #[tokio::test]
    async fn test_item_shares_rejected() {
        let service = service();
        let bill = service.ingest_bill(parsed()).await.unwrap();
        let share = |user_id: UserId, share: f64| UserShare { user_id, share };

        assert_eq!(
            service
                .set_item_shares(bill.id, 999, vec![share(1, 1.0)])
                .await
                .unwrap_err(),
            VoteError::Split(SplitError::ItemNotFound {
                bill_id: bill.id,
                item_id: 999
            })
        );
        assert_eq!(
            service
                .set_item_shares(bill.id, bill.items[0].id, vec![share(1, -1.0)])
                .await
                .unwrap_err(),
            VoteError::InvalidShare(-1.0)
        );
        assert_eq!(
            service.get_item_details(bill.id, 999).await.unwrap_err(),
            SplitError::ItemNotFound {
                bill_id: bill.id,
                item_id: 999
            }
        );
    }

    #[tokio::test]
    async fn test_split_carries_known_user_names() {
        let service = service();
        let bill = service.ingest_bill(parsed()).await.unwrap();
        service.register_user(1, " Alice ").await.unwrap();
        service
            .submit_votes(bill.id, 1, VoteInput::Text("1".to_string()))
            .await
            .unwrap();
        service
            .submit_votes(bill.id, 2, VoteInput::Text("2".to_string()))
            .await
            .unwrap();

        let split = service.split_bill(bill.id, None).await.unwrap();

        assert_eq!(split.user_names.get(&1).map(String::as_str), Some("Alice"));
        assert!(!split.user_names.contains_key(&2));

        let with_claims = service.get_bill_with_claims(bill.id).await.unwrap();
        assert_eq!(with_claims.claims.len(), 2);
    }
}
