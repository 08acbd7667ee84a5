use crate::CurrencyRule;

pub fn order_total(unit_price: i64, quantity: u32) -> i64 {
    unit_price.saturating_mul(i64::from(quantity))
}

/// Renders minor units as `<symbol><grouped major>.<minor>`, e.g. `₦25,000.00`.
pub fn format_price(amount: i64, currency: &CurrencyRule) -> String {
    let per_major = currency.minor_per_major.max(1);
    let digits = per_major.to_string().len().saturating_sub(1);
    let sign = if amount < 0 { "-" } else { "" };
    let magnitude = amount.unsigned_abs();
    let per_major = per_major.unsigned_abs();
    let major = group_thousands(magnitude / per_major);
    if digits == 0 {
        return format!("{sign}{}{major}", currency.symbol);
    }
    let minor = magnitude % per_major;
    format!("{sign}{}{major}.{minor:0digits$}", currency.symbol)
}

fn group_thousands(value: u64) -> String {
    let raw = value.to_string();
    let mut out = String::with_capacity(raw.len() + raw.len() / 3);
    for (idx, ch) in raw.chars().enumerate() {
        if idx > 0 && (raw.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
