//! Context window usage.

/// Percentage of `context_window` taken by `tokens`. Not capped.
pub fn context_usage_percent(tokens: u64, context_window: u64) -> f64 {
    if context_window == 0 {
        return 0.0;
    }
    tokens as f64 / context_window as f64 * 100.0
}

/// Fill ratio for a usage bar, clamped to `0.0..=1.0`.
pub fn context_usage_fraction(tokens: u64, context_window: u64) -> f64 {
    (context_usage_percent(tokens, context_window) / 100.0).min(1.0)
}

/// `1234567` -> `"1,234,567"`.
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// `"2 / 1,000,000 tokens (0.0002%)"`
pub fn format_usage(tokens: u64, context_window: u64) -> String {
    format!(
        "{} / {} tokens ({:.4}%)",
        format_count(tokens),
        format_count(context_window),
        context_usage_percent(tokens, context_window)
    )
}
