//! Currency display helpers shared by hosts and the demo CLI.

/// Compact money display: `$1.5K`, `$2.30M`, `$1.10B`, `$4.00T`.
///
/// The thousands tier keeps one decimal, the higher tiers two. Amounts under
/// a thousand print as plain two-decimal dollars; negative amounts never
/// reach the compact thresholds and print plainly too.
pub fn format_currency(amount: f64) -> String {
    if amount >= 1e12 {
        format!("${:.2}T", amount / 1e12)
    } else if amount >= 1e9 {
        format!("${:.2}B", amount / 1e9)
    } else if amount >= 1e6 {
        format!("${:.2}M", amount / 1e6)
    } else if amount >= 1e3 {
        format!("${:.1}K", amount / 1e3)
    } else {
        format!("${amount:.2}")
    }
}

/// Full money display with thousands separators: `$1,234,567.89`.
pub fn format_full_currency(amount: f64) -> String {
    let s = format!("{:.2}", amount.abs());
    let dot = s.len() - 3;
    let int_part = &s[..dot];
    let frac = &s[dot + 1..];
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if amount < 0.0 { "-" } else { "" };
    format!("${sign}{grouped}.{frac}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_tiers() {
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(999.0), "$999.00");
        assert_eq!(format_currency(1_000.0), "$1.0K");
        assert_eq!(format_currency(1_500.0), "$1.5K");
        assert_eq!(format_currency(12_340.0), "$12.3K");
        assert_eq!(format_currency(2_300_000.0), "$2.30M");
        assert_eq!(format_currency(1_100_000_000.0), "$1.10B");
        assert_eq!(format_currency(4e12), "$4.00T");
    }

    #[test]
    fn compact_negative_prints_plainly() {
        assert_eq!(format_currency(-12.5), "$-12.50");
    }

    #[test]
    fn full_grouping() {
        assert_eq!(format_full_currency(0.5), "$0.50");
        assert_eq!(format_full_currency(999.9), "$999.90");
        assert_eq!(format_full_currency(1_000.0), "$1,000.00");
        assert_eq!(format_full_currency(1_234_567.89), "$1,234,567.89");
        assert_eq!(format_full_currency(-1_234.5), "$-1,234.50");
    }
}
