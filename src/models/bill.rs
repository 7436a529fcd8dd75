use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type BillId = i64;
pub type ItemId = i64;

/// 账单主表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    pub id: BillId,
    pub currency: String,
    pub total: f64,
    pub subtotal: Option<f64>,
    pub vat: Option<f64>,
    pub service_fee: Option<f64>,
    pub total_discount: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<BillItem>,
}

impl Bill {
    /// 按 id 查找明细
    pub fn item(&self, item_id: ItemId) -> Option<&BillItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    /// 1-based 序号 -> 明细 (聊天里用户按序号投票)
    pub fn item_at_position(&self, position: usize) -> Option<&BillItem> {
        position.checked_sub(1).and_then(|idx| self.items.get(idx))
    }
}

/// 账单明细
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillItem {
    pub id: ItemId,
    pub name_original: String,
    pub name_english: String,
    pub quantity: u32,
    pub price_per_unit: Option<f64>,
    pub price_total: Option<f64>,
}

impl BillItem {
    /// 明细总价: price_total 优先, 否则 单价 * 数量, 都没有则为 0
    pub fn total_cost(&self) -> f64 {
        match (self.price_total, self.price_per_unit) {
            (Some(total), _) => total,
            (None, Some(unit)) => unit * f64::from(self.quantity),
            (None, None) => 0.0,
        }
    }

    /// 单价: price_per_unit 优先, 否则 总价 / 数量
    pub fn unit_price(&self) -> f64 {
        match (self.price_per_unit, self.price_total) {
            (Some(unit), _) => unit,
            (None, Some(total)) if self.quantity > 0 => total / f64::from(self.quantity),
            _ => 0.0,
        }
    }
}

/// 识别结果 (账单录入的输入格式, 尚未分配 id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedBill {
    pub items: Vec<ParsedBillItem>,
    #[serde(default)]
    pub subtotal: Option<f64>,
    pub total: f64,
    pub currency: String,
    #[serde(default)]
    pub vat: Option<f64>,
    #[serde(default)]
    pub service_fee: Option<f64>,
    #[serde(default)]
    pub total_discount: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedBillItem {
    pub name_original: String,
    pub name_english: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub price_per_unit: Option<f64>,
    #[serde(default)]
    pub price_total: Option<f64>,
}

fn default_quantity() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: u32, per_unit: Option<f64>, total: Option<f64>) -> BillItem {
        BillItem {
            id: 1,
            name_original: "Pad Thai".to_string(),
            name_english: "Pad Thai".to_string(),
            quantity,
            price_per_unit: per_unit,
            price_total: total,
        }
    }

    #[test]
    fn test_price_total_is_authoritative() {
        assert_eq!(item(3, Some(5.0), Some(12.0)).total_cost(), 12.0);
        assert_eq!(item(3, Some(5.0), None).total_cost(), 15.0);
        assert_eq!(item(3, None, None).total_cost(), 0.0);
        // 显式的 0 也算"存在"
        assert_eq!(item(3, Some(5.0), Some(0.0)).total_cost(), 0.0);
    }

    #[test]
    fn test_unit_price_falls_back_to_total() {
        assert_eq!(item(4, None, Some(10.0)).unit_price(), 2.5);
        assert_eq!(item(4, Some(3.0), Some(10.0)).unit_price(), 3.0);
        assert_eq!(item(0, None, Some(10.0)).unit_price(), 0.0);
    }

    #[test]
    fn test_parsed_item_quantity_defaults_to_one() {
        let parsed: ParsedBillItem = serde_json::from_str(
            r#"{"nameOriginal":"ข้าว","nameEnglish":"Rice","priceTotal":40}"#,
        )
        .unwrap();
        assert_eq!(parsed.quantity, 1);
        assert_eq!(parsed.price_total, Some(40.0));
        assert_eq!(parsed.price_per_unit, None);
    }

    #[test]
    fn test_item_at_position_is_one_based() {
        let bill = Bill {
            id: 7,
            currency: "THB".to_string(),
            total: 10.0,
            subtotal: None,
            vat: None,
            service_fee: None,
            total_discount: None,
            created_at: Utc::now(),
            items: vec![item(1, None, Some(10.0))],
        };
        assert!(bill.item_at_position(0).is_none());
        assert_eq!(bill.item_at_position(1).map(|i| i.id), Some(1));
        assert!(bill.item_at_position(2).is_none());
    }
}
