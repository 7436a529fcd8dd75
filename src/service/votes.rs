use crate::models::{Bill, ItemId, ItemVote};
use indexmap::IndexMap;

/// 解析聊天中的投票消息 ("1, 3, 3") 为 1-based 明细序号
///
/// 非数字与超出 `1..=item_count` 的序号直接丢弃。
pub fn parse_vote_message(text: &str, item_count: usize) -> Vec<usize> {
    text.split(',')
        .filter_map(|token| token.trim().parse::<usize>().ok())
        .filter(|n| (1..=item_count).contains(n))
        .collect()
}

/// 重复选择聚合为份数, 按首次出现顺序输出
pub fn aggregate_votes(item_ids: &[ItemId]) -> Vec<ItemVote> {
    let mut counts: IndexMap<ItemId, f64> = IndexMap::new();
    for &item_id in item_ids {
        *counts.entry(item_id).or_insert(0.0) += 1.0;
    }
    counts
        .into_iter()
        .map(|(item_id, quantity)| ItemVote { item_id, quantity })
        .collect()
}

/// 1-based 序号 -> 明细 id, 越界序号丢弃
pub fn item_ids_at_positions(bill: &Bill, positions: &[usize]) -> Vec<ItemId> {
    positions
        .iter()
        .filter_map(|&position| bill.item_at_position(position))
        .map(|item| item.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BillItem;
    use chrono::Utc;

    #[test]
    fn test_parse_vote_message() {
        assert_eq!(parse_vote_message("1, 3,3", 3), vec![1, 3, 3]);
        assert_eq!(parse_vote_message(" 2 ,x, 0, 4, -1,", 3), vec![2]);
        assert!(parse_vote_message("hello", 3).is_empty());
        assert!(parse_vote_message("1,2", 0).is_empty());
    }

    #[test]
    fn test_aggregate_counts_repetitions_in_first_seen_order() {
        let votes = aggregate_votes(&[3, 1, 3, 3, 2, 1]);
        assert_eq!(
            votes,
            vec![
                ItemVote { item_id: 3, quantity: 3.0 },
                ItemVote { item_id: 1, quantity: 2.0 },
                ItemVote { item_id: 2, quantity: 1.0 },
            ]
        );
        assert!(aggregate_votes(&[]).is_empty());
    }

    #[test]
    fn test_positions_map_to_item_ids() {
        let items = [(10, "Beer"), (11, "Rice"), (12, "Soup")]
            .iter()
            .map(|(id, name)| BillItem {
                id: *id,
                name_original: name.to_string(),
                name_english: name.to_string(),
                quantity: 2,
                price_per_unit: Some(1.0),
                price_total: None,
            })
            .collect();
        let bill = Bill {
            id: 1,
            currency: "EUR".to_string(),
            total: 6.0,
            subtotal: None,
            vat: None,
            service_fee: None,
            total_discount: None,
            created_at: Utc::now(),
            items,
        };

        let item_ids = item_ids_at_positions(&bill, &[1, 3, 1, 9, 0]);

        assert_eq!(item_ids, vec![10, 12, 10]);
        assert_eq!(
            aggregate_votes(&item_ids),
            vec![
                ItemVote { item_id: 10, quantity: 2.0 },
                ItemVote { item_id: 12, quantity: 1.0 },
            ]
        );
    }
}
