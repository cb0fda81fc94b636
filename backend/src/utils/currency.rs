use pharmacy_shared::CURRENCY_SYMBOL;
use rust_decimal::{Decimal, RoundingStrategy};

const CRORE: i64 = 10_000_000;
const LAKH: i64 = 100_000;

/// Insert thousands separators into the integer part of a plain decimal string
fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

fn format_grouped(value: Decimal, places: u32) -> String {
    let rounded = value
        .abs()
        .round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero);
    let text = format!("{:.*}", places as usize, rounded);
    let (whole, fraction) = match text.split_once('.') {
        Some((whole, fraction)) => (whole.to_string(), Some(fraction.to_string())),
        None => (text, None),
    };

    let sign = if value.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    match fraction {
        Some(fraction) => format!("{}{}{}.{}", sign, CURRENCY_SYMBOL, group_thousands(&whole), fraction),
        None => format!("{}{}{}", sign, CURRENCY_SYMBOL, group_thousands(&whole)),
    }
}

/// `₹1,234.50`
pub fn format_rupees_simple(value: Decimal) -> String {
    format_grouped(value, 2)
}

/// Compact storefront formatting: crores and lakhs are abbreviated,
/// thousands lose their paise.
pub fn format_rupees(value: Decimal) -> String {
    if value >= Decimal::from(CRORE) {
        let crores = (value / Decimal::from(CRORE)).round_dp(1);
        format!("{}{:.1} Cr", CURRENCY_SYMBOL, crores)
    } else if value >= Decimal::from(LAKH) {
        let lakhs = (value / Decimal::from(LAKH)).round_dp(1);
        format!("{}{:.1} L", CURRENCY_SYMBOL, lakhs)
    } else if value >= Decimal::from(1000) {
        format_grouped(value, 0)
    } else {
        format_grouped(value, 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_format_keeps_paise() {
        assert_eq!(format_rupees_simple(Decimal::new(23000, 2)), "₹230.00");
        assert_eq!(format_rupees_simple(Decimal::new(123450, 2)), "₹1,234.50");
        assert_eq!(format_rupees_simple(Decimal::new(1234567891, 2)), "₹12,345,678.91");
        assert_eq!(format_rupees_simple(Decimal::ZERO), "₹0.00");
    }

    #[test]
    fn compact_format_abbreviates_large_amounts() {
        assert_eq!(format_rupees(Decimal::new(9050, 2)), "₹90.50");
        assert_eq!(format_rupees(Decimal::new(2500, 0)), "₹2,500");
        assert_eq!(format_rupees(Decimal::new(250_000, 0)), "₹2.5 L");
        assert_eq!(format_rupees(Decimal::new(32_000_000, 0)), "₹3.2 Cr");
    }
}
