use crate::models::{Bill, BillItem, Claim, ItemId, ItemWithProportion, SplitResult, UserSelection};
use indexmap::IndexMap;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// 按认领份数计算每个用户的分摊金额
///
/// 纯函数: 不做 I/O, 不修改输入, 不校验负数。
/// - 引用不存在明细的认领直接忽略
/// - 比例 = 用户份数 / 该明细被认领的总份数 (而不是明细数量)
/// - 被认领总份数为 0 的明细不产生分摊
pub fn calculate_split<U>(bill: &Bill, claims: &[Claim<U>]) -> SplitResult<U>
where
    U: Eq + Hash + Clone,
{
    let items_by_id: HashMap<ItemId, &BillItem> =
        bill.items.iter().map(|item| (item.id, item)).collect();

    // 1. 无人认领: 只看是否存在认领, 与份数无关
    let voted: HashSet<ItemId> = claims.iter().map(|c| c.item_id).collect();
    let unvoted_items: Vec<BillItem> = bill
        .items
        .iter()
        .filter(|item| !voted.contains(&item.id))
        .cloned()
        .collect();

    // 2. 每个明细被认领的总份数
    let mut claimed_quantity: HashMap<ItemId, f64> = HashMap::new();
    for claim in claims {
        *claimed_quantity.entry(claim.item_id).or_insert(0.0) += claim.quantity;
    }

    // 3. 按比例分摊
    let mut user_selections: IndexMap<U, UserSelection> = IndexMap::new();
    for claim in claims {
        let Some(item) = items_by_id.get(&claim.item_id) else {
            continue;
        };
        let claimed = claimed_quantity.get(&claim.item_id).copied().unwrap_or(0.0);
        // 只在总份数 > 0 时分摊, NaN 同样跳过
        if claimed.partial_cmp(&0.0) != Some(Ordering::Greater) {
            continue;
        }

        let proportion = claim.quantity / claimed;
        let proportional_price = item.total_cost() * proportion;

        let selection = user_selections.entry(claim.user_id.clone()).or_default();
        selection.items_with_proportion.push(ItemWithProportion {
            item: (*item).clone(),
            proportional_price,
            proportion,
        });
        selection.total += proportional_price;
    }

    SplitResult {
        user_selections,
        unvoted_items,
    }
}
