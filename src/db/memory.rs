use super::repository::{BillRepository, RepositoryError};
use crate::models::{
    Bill, BillId, BillItem, Claim, ItemId, ItemVote, ParsedBill, User, UserId, UserShare,
};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use indexmap::IndexMap;
use std::sync::atomic::{AtomicI64, Ordering};

/// 内存账单仓库 (并发安全)
#[derive(Debug)]
pub struct InMemoryBillStore {
    bills: DashMap<BillId, Bill>,
    claims: DashMap<BillId, Vec<Claim>>,
    users: DashMap<UserId, String>,
    next_bill_id: AtomicI64,
    next_item_id: AtomicI64,
}

impl InMemoryBillStore {
    pub fn new() -> Self {
        Self {
            bills: DashMap::new(),
            claims: DashMap::new(),
            users: DashMap::new(),
            next_bill_id: AtomicI64::new(1),
            next_item_id: AtomicI64::new(1),
        }
    }

    pub fn bill_count(&self) -> usize {
        self.bills.len()
    }
}

impl Default for InMemoryBillStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BillRepository for InMemoryBillStore {
    async fn get_bill(&self, bill_id: BillId) -> Result<Option<Bill>, RepositoryError> {
        Ok(self.bills.get(&bill_id).map(|b| b.value().clone()))
    }

    async fn list_claims(&self, bill_id: BillId) -> Result<Vec<Claim>, RepositoryError> {
        if !self.bills.contains_key(&bill_id) {
            return Err(RepositoryError::BillNotFound(bill_id));
        }
        Ok(self
            .claims
            .get(&bill_id)
            .map(|c| c.value().clone())
            .unwrap_or_default())
    }

    async fn insert_bill(&self, parsed: ParsedBill) -> Result<Bill, RepositoryError> {
        let bill_id = self.next_bill_id.fetch_add(1, Ordering::SeqCst);

        // 明细 id 全局递增, 不复用
        let items = parsed
            .items
            .into_iter()
            .map(|item| BillItem {
                id: self.next_item_id.fetch_add(1, Ordering::SeqCst),
                name_original: item.name_original,
                name_english: item.name_english,
                quantity: item.quantity,
                price_per_unit: item.price_per_unit,
                price_total: item.price_total,
            })
            .collect();

        let bill = Bill {
            id: bill_id,
            currency: parsed.currency,
            total: parsed.total,
            subtotal: parsed.subtotal,
            vat: parsed.vat,
            service_fee: parsed.service_fee,
            total_discount: parsed.total_discount,
            created_at: Utc::now(),
            items,
        };

        self.bills.insert(bill_id, bill.clone());
        tracing::debug!("Bill {} stored with {} items", bill_id, bill.items.len());
        Ok(bill)
    }

    async fn replace_user_claims(
        &self,
        bill_id: BillId,
        user_id: UserId,
        votes: Vec<ItemVote>,
    ) -> Result<Vec<Claim>, RepositoryError> {
        if !self.bills.contains_key(&bill_id) {
            return Err(RepositoryError::BillNotFound(bill_id));
        }

        let user_claims: Vec<Claim> = votes
            .into_iter()
            .map(|vote| Claim::new(user_id, vote.item_id, vote.quantity))
            .collect();

        let mut entry = self.claims.entry(bill_id).or_default();
        entry.retain(|claim| claim.user_id != user_id);
        entry.extend(user_claims.iter().cloned());

        Ok(user_claims)
    }

    async fn upsert_item_claims(
        &self,
        bill_id: BillId,
        item_id: ItemId,
        shares: Vec<UserShare>,
    ) -> Result<Vec<Claim>, RepositoryError> {
        match self.bills.get(&bill_id) {
            None => return Err(RepositoryError::BillNotFound(bill_id)),
            Some(bill) if bill.item(item_id).is_none() => {
                return Err(RepositoryError::ItemNotFound { bill_id, item_id })
            }
            Some(_) => {}
        }

        let mut entry = self.claims.entry(bill_id).or_default();
        for share in shares {
            let existing = entry
                .iter()
                .position(|c| c.item_id == item_id && c.user_id == share.user_id);
            match existing {
                Some(idx) => entry[idx].quantity = share.share,
                None => entry.push(Claim::new(share.user_id, item_id, share.share)),
            }
        }

        Ok(entry
            .iter()
            .filter(|c| c.item_id == item_id)
            .cloned()
            .collect())
    }

    async fn save_user(&self, user: User) -> Result<(), RepositoryError> {
        self.users.insert(user.id, user.name);
        Ok(())
    }

    async fn user_names(
        &self,
        user_ids: &[UserId],
    ) -> Result<IndexMap<UserId, String>, RepositoryError> {
        Ok(user_ids
            .iter()
            .filter_map(|id| self.users.get(id).map(|name| (*id, name.value().clone())))
            .collect())
    }
}
