//! Telegram MarkdownV2 消息渲染

use crate::models::{Bill, BillItem, SplitResult};
use indexmap::IndexMap;
use std::fmt::Display;
use std::hash::Hash;

/// 常见币种符号, 未知币种原样返回代码
pub fn currency_symbol(currency: &str) -> &str {
    match currency.to_ascii_uppercase().as_str() {
        "USD" | "AUD" | "CAD" | "SGD" | "HKD" | "NZD" | "MXN" => "$",
        "EUR" => "€",
        "GBP" => "£",
        "JPY" | "CNY" => "¥",
        "THB" => "฿",
        "RUB" => "₽",
        "KRW" => "₩",
        "INR" => "₹",
        "VND" => "₫",
        "TRY" => "₺",
        "ILS" => "₪",
        "UAH" => "₴",
        "KZT" => "₸",
        "GEL" => "₾",
        "PHP" => "₱",
        _ => currency,
    }
}

/// 账单识别结果消息: 编号明细 + 小计/总计/系数
pub fn format_bill_analysis(bill: &Bill) -> String {
    let symbol = currency_symbol(&bill.currency);
    let items: Vec<String> = bill
        .items
        .iter()
        .enumerate()
        .map(|(idx, item)| format_item(idx + 1, item, Some(symbol)))
        .collect();

    let mut summary = Vec::new();
    if let Some(subtotal) = bill.subtotal {
        summary.push(format!("Subtotal: {}{}", symbol, monospace(&format!("{:.2}", subtotal))));
    }
    summary.push(format!("Total: {}{}", symbol, monospace(&format!("{:.2}", bill.total))));
    if let Some(subtotal) = bill.subtotal.filter(|s| *s > 0.0) {
        summary.push(format!(
            "Total / Subtotal coefficient: {}",
            monospace(&format!("{:.3}", bill.total / subtotal))
        ));
    }

    let mut lines = vec!["Reply to this message with numbers of your items:\n".to_string()];
    lines.extend(items);
    lines.push(format!(
        "\n{}",
        summary
            .iter()
            .map(|line| format!("💰 {}", line))
            .collect::<Vec<_>>()
            .join("\n")
    ));
    lines.join("\n")
}

/// 分账结果消息: 每个用户的金额与明细 (比例 < 1 时标注百分比), 以及无人认领的明细
///
/// 用户显示 `names` 中的名字, 没有名字时显示 id。
pub fn format_calculation<U>(
    bill: &Bill,
    result: &SplitResult<U>,
    names: &IndexMap<U, String>,
) -> String
where
    U: Eq + Hash + Display,
{
    let symbol = currency_symbol(&bill.currency);
    let mut msg = String::from("💰 Bill Calculation\n");

    for (user, selection) in &result.user_selections {
        let name = names.get(user).cloned().unwrap_or_else(|| user.to_string());
        msg.push_str(&format!(
            "\n{} • {}{}\n",
            bold(&name),
            symbol,
            monospace(&format!("{:.2}", selection.total))
        ));
        for entry in &selection.items_with_proportion {
            let share = if entry.proportion < 1.0 {
                escape_markdown(&format!(" [{:.0}%]", entry.proportion * 100.0))
            } else {
                String::new()
            };
            msg.push_str(&format!(
                "{}{}\n",
                format_item(position_of(bill, &entry.item), &entry.item, None),
                share
            ));
        }
    }

    if !result.unvoted_items.is_empty() {
        msg.push_str("\n⚠️ *Items without votes*\n");
        for item in &result.unvoted_items {
            msg.push_str(&format!(
                "{}\n",
                format_item(position_of(bill, item), item, Some(symbol))
            ));
        }
    }

    msg
}

fn position_of(bill: &Bill, item: &BillItem) -> usize {
    bill.items
        .iter()
        .position(|i| i.id == item.id)
        .map(|idx| idx + 1)
        .unwrap_or(0)
}

fn format_item(position: usize, item: &BillItem, price_symbol: Option<&str>) -> String {
    let index = monospace(&format!("{:02}", position));
    let url = images_url(&item.name_original);
    let line = format!("{}\\. {}", index, link(&item.name_english, &url));

    match price_symbol {
        Some(symbol) => format!(
            "{} • {}",
            line,
            escape_markdown(&format!("{} * {}{:.0}", item.quantity, symbol, item.unit_price()))
        ),
        None => line,
    }
}

fn images_url(query: &str) -> String {
    format!(
        "https://www.google.com/search?q={}&tbm=isch",
        urlencoding::encode(query)
    )
}

pub(crate) fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if "_*[]()~`>#+-=|{}.!".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn link(text: &str, url: &str) -> String {
    format!("[{}]({})", escape_markdown(text), escape_markdown(url))
}

fn monospace(text: &str) -> String {
    format!("`{}`", escape_markdown(text))
}

fn bold(text: &str) -> String {
    format!("*{}*", escape_markdown(text))
}
