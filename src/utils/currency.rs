//! Currency helpers for the payment gateway.
//!
//! Fees are held in naira; the gateway reports amounts in kobo
//! (1 Naira = 100 kobo).

pub const KOBO_PER_NAIRA: i64 = 100;

/// Convert naira to kobo. `None` on overflow.
pub fn naira_to_kobo(naira: i64) -> Option<i64> {
    naira.checked_mul(KOBO_PER_NAIRA)
}

/// Format a naira amount with thousands separators, e.g. `₦75,000`.
pub fn format_naira(naira: i64) -> String {
    let digits = naira.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if naira < 0 {
        format!("-₦{}", grouped)
    } else {
        format!("₦{}", grouped)
    }
}
