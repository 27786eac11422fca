//! INR display helpers (1 Lakh = 100,000; 1 Crore = 10,000,000)

const LAKH: f64 = 100_000.0;
const CRORE: f64 = 10_000_000.0;

/// Insert thousands separators into an already formatted number
fn group_thousands(formatted: &str) -> String {
    let (sign, unsigned) = match formatted.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", formatted),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}

fn signed_currency(amount: f64, scaled: String, suffix: &str) -> String {
    if amount < 0.0 {
        format!("-₹{}{}", scaled.trim_start_matches('-'), suffix)
    } else {
        format!("₹{}{}", scaled, suffix)
    }
}

/// `₹12.5L`
pub fn lakhs(amount: f64) -> String {
    signed_currency(amount, group_thousands(&format!("{:.1}", amount / LAKH)), "L")
}

/// `₹1.25Cr`
pub fn crores(amount: f64) -> String {
    signed_currency(amount, group_thousands(&format!("{:.2}", amount / CRORE)), "Cr")
}

pub fn rupees(amount: f64) -> String {
    signed_currency(amount, format!("{:.2}", amount), "")
}

pub fn percentage(value: f64) -> String {
    format!("{:.1}%", value)
}

/// Whole count with separators, `∞` for an unreachable break-even
pub fn count(value: f64) -> String {
    if value.is_infinite() {
        return "∞".to_string();
    }
    group_thousands(&format!("{:.0}", value))
}

pub fn months(value: f64) -> String {
    if value.is_infinite() {
        return "∞".to_string();
    }
    format!("{:.1}", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_lakhs_and_crores() {
        assert_eq!(lakhs(1_250_000.0), "₹12.5L");
        assert_eq!(lakhs(12_345_600_000.0), "₹123,456.0L");
        assert_eq!(crores(125_000_000.0), "₹12.50Cr");
        assert_eq!(lakhs(-2_500_000.0), "-₹25.0L");
    }

    #[test]
    fn formats_counts() {
        assert_eq!(count(7_500_000.0), "7,500,000");
        assert_eq!(count(999.4), "999");
        assert_eq!(count(-1234.0), "-1,234");
        assert_eq!(count(f64::INFINITY), "∞");
        assert_eq!(months(f64::INFINITY), "∞");
        assert_eq!(months(7.26), "7.3");
    }

    #[test]
    fn formats_percentages() {
        assert_eq!(percentage(42.345), "42.3%");
        assert_eq!(rupees(4.0), "₹4.00");
    }
}
