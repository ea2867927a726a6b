/// Currency utility functions for handling SUI amounts
///
/// Every amount read from the chain is an integer count of MIST
/// (1 SUI = 1_000_000_000 MIST). Conversion to a float only happens for display.

pub const MIST_PER_SUI: u64 = 1_000_000_000;

/// Convert MIST to SUI
pub fn mist_to_sui(mist: u64) -> f64 {
    mist as f64 / MIST_PER_SUI as f64
}

/// Format MIST as a SUI string, trimming trailing zeros
pub fn format_mist(mist: u64) -> String {
    let whole = mist / MIST_PER_SUI;
    let fraction = mist % MIST_PER_SUI;

    if fraction == 0 {
        return format!("{} SUI", whole);
    }

    let fraction = format!("{:09}", fraction);
    format!("{}.{} SUI", whole, fraction.trim_end_matches('0'))
}

/// Validate and parse a decimal SUI amount into MIST without going through f64
pub fn parse_sui_to_mist(amount_str: &str) -> Result<u64, String> {
    let trimmed = amount_str.trim();
    if trimmed.starts_with('-') {
        return Err("Amount cannot be negative".to_string());
    }

    let (whole, fraction) = match trimmed.split_once('.') {
        Some((w, f)) => (w, f),
        None => (trimmed, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return Err("Invalid amount format".to_string());
    }
    if fraction.len() > 9 {
        return Err("Amount has more than 9 decimal places".to_string());
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit()) {
        return Err("Invalid amount format".to_string());
    }

    let whole: u64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| "Invalid amount format".to_string())?
    };
    let fraction: u64 = format!("{:0<9}", fraction)
        .parse()
        .map_err(|_| "Invalid amount format".to_string())?;

    whole
        .checked_mul(MIST_PER_SUI)
        .and_then(|m| m.checked_add(fraction))
        .ok_or_else(|| "Amount is too large".to_string())
}
