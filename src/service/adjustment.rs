use crate::models::{Bill, SplitResult};
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;
use thiserror::Error;

/// 分账后的整体调整 (VAT / 服务费 / 折扣)
///
/// 只作为后处理作用在 `SplitResult` 上, 不参与比例计算。默认不调整。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Adjustment {
    #[default]
    None,
    /// total / subtotal
    TotalOverSubtotal,
    /// (subtotal + vat + service_fee - total_discount) / subtotal
    Charges,
    Coefficient(f64),
}

#[derive(Debug, Error, PartialEq)]
#[error("Invalid adjustment '{0}', expected none, total_over_subtotal, charges or a number")]
pub struct AdjustmentParseError(pub String);

impl FromStr for Adjustment {
    type Err = AdjustmentParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "none" => Ok(Self::None),
            "total_over_subtotal" => Ok(Self::TotalOverSubtotal),
            "charges" => Ok(Self::Charges),
            other => other
                .parse::<f64>()
                .ok()
                .filter(|c| c.is_finite())
                .map(Self::Coefficient)
                .ok_or_else(|| AdjustmentParseError(other.to_string())),
        }
    }
}

impl fmt::Display for Adjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::TotalOverSubtotal => write!(f, "total_over_subtotal"),
            Self::Charges => write!(f, "charges"),
            Self::Coefficient(c) => write!(f, "{}", c),
        }
    }
}

impl Adjustment {
    /// 针对某张账单得出的系数; 没有有效 subtotal 时回退为 1
    pub fn coefficient(&self, bill: &Bill) -> f64 {
        let subtotal = bill.subtotal.filter(|s| *s > 0.0);
        match (self, subtotal) {
            (Self::None, _) => 1.0,
            (Self::Coefficient(c), _) => *c,
            (Self::TotalOverSubtotal, Some(subtotal)) => bill.total / subtotal,
            (Self::Charges, Some(subtotal)) => {
                let charges = bill.vat.unwrap_or(0.0) + bill.service_fee.unwrap_or(0.0)
                    - bill.total_discount.unwrap_or(0.0);
                (subtotal + charges) / subtotal
            }
            (_, None) => 1.0,
        }
    }

    /// 按系数缩放每个用户的金额, 比例与未认领明细保持不变
    pub fn apply<U: Eq + Hash>(
        &self,
        bill: &Bill,
        mut result: SplitResult<U>,
    ) -> (f64, SplitResult<U>) {
        let coefficient = self.coefficient(bill);
        if coefficient != 1.0 {
            for selection in result.user_selections.values_mut() {
                for entry in &mut selection.items_with_proportion {
                    entry.proportional_price *= coefficient;
                }
                selection.total *= coefficient;
            }
        }
        (coefficient, result)
    }
}
