//! Price formatting for chart ticks and headline values.

/// Y-axis tick label: `$` followed by the value with two decimals.
///
/// No grouping separators, so ticks stay narrow on the axis.
pub fn price_tick(value: f64) -> String {
    format!("${:.2}", value)
}

/// Headline USD value with thousands separators, e.g. `$67,412.05`.
pub fn usd(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (integer, fraction) = formatted
        .split_once('.')
        .unwrap_or((formatted.as_str(), "00"));

    let sign = if value < 0.0 && formatted != "0.00" { "-" } else { "" };
    format!("{}${}.{}", sign, group_thousands(integer), fraction)
}

/// Inserts `,` every three digits from the right of an unsigned integer string.
fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
