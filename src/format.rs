//! Money and multiplier formatting helpers

/// Round to 2 decimal places, half away from zero
///
/// Values too large to scale by 100 come back unchanged.
pub fn round2(value: f64) -> f64 {
    let scaled = value * 100.0;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / 100.0
}

/// Currency symbol plus grouping and decimal separators
fn locale_for(currency: &str) -> (&str, char, char) {
    match currency.to_ascii_uppercase().as_str() {
        "BRL" => ("R$", '.', ','),
        "EUR" => ("€", '.', ','),
        "USD" => ("$", ',', '.'),
        "GBP" => ("£", ',', '.'),
        _ => ("", ',', '.'),
    }
}

fn group_thousands(digits: &str, sep: char) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(sep);
        }
        out.push(c);
    }
    out
}

/// Format an amount for display, e.g. `R$ 1.234,56` or `$ 1,234.56`
pub fn format_money(amount: f64, currency: &str) -> String {
    if !amount.is_finite() {
        return "-".to_string();
    }

    let (symbol, group_sep, decimal_sep) = locale_for(currency);
    let symbol = if symbol.is_empty() { currency } else { symbol };

    let rounded = round2(amount);
    let fixed = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let sign = if rounded < 0.0 { "-" } else { "" };

    format!(
        "{}{} {}{}{}",
        sign,
        symbol,
        group_thousands(int_part, group_sep),
        decimal_sep,
        frac_part
    )
}

const MONEY_SYMBOLS: [&str; 4] = ["R$", "€", "$", "£"];

/// Drop one currency symbol, or a three-letter code set off by a space,
/// from either end
fn strip_currency(input: &str) -> &str {
    let s = input.trim();
    for symbol in MONEY_SYMBOLS {
        if let Some(rest) = s.strip_prefix(symbol) {
            return rest.trim();
        }
        if let Some(rest) = s.strip_suffix(symbol) {
            return rest.trim();
        }
    }

    let is_code = |code: &str| code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic());
    if s.len() > 3 && s.is_char_boundary(3) {
        let (head, rest) = s.split_at(3);
        if is_code(head) && rest.starts_with(char::is_whitespace) {
            return rest.trim();
        }
    }
    if s.len() > 3 && s.is_char_boundary(s.len() - 3) {
        let (rest, tail) = s.split_at(s.len() - 3);
        if is_code(tail) && rest.ends_with(char::is_whitespace) {
            return rest.trim();
        }
    }
    s
}

/// Parse a user-entered amount in either `1.234,56` or `1,234.56` style
///
/// The last `,` or `.` is the decimal separator when followed by one or two
/// digits; every other separator is grouping. One currency symbol or code
/// is allowed at either end; any other letter makes the input invalid.
pub fn parse_money(input: &str) -> Option<f64> {
    // "-R$ 10" and "R$ -10" are both negative
    let (outer_negative, rest) = match input.trim().strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input),
    };
    let body = strip_currency(rest);
    let (inner_negative, body) = match body.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, body),
    };
    let negative = outer_negative || inner_negative;

    if !body
        .chars()
        .all(|c| c.is_ascii_digit() || c == ',' || c == '.' || c == ' ')
    {
        return None;
    }

    let cleaned: String = body.chars().filter(|c| *c != ' ').collect();
    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let normalized = match cleaned.rfind([',', '.']) {
        Some(idx) => {
            let frac_len = cleaned.len() - idx - 1;
            if (1..=2).contains(&frac_len) {
                let int_part: String = cleaned[..idx]
                    .chars()
                    .filter(|c| c.is_ascii_digit())
                    .collect();
                format!("{}.{}", int_part, &cleaned[idx + 1..])
            } else {
                cleaned.chars().filter(|c| c.is_ascii_digit()).collect()
            }
        }
        None => cleaned,
    };

    let value: f64 = normalized.parse().ok()?;
    Some(if negative { -value } else { value })
}

/// Format a leverage multiplier, e.g. `1.50x`
pub fn format_multiplier(value: f64) -> String {
    format!("{:.2}x", value)
}

/// Parse `1.5`, `1,5`, `1.5x` or `x1.5`
pub fn parse_multiplier(input: &str) -> Option<f64> {
    let trimmed = input.trim().trim_matches(|c| c == 'x' || c == 'X').trim();
    let value: f64 = trimmed.replace(',', ".").parse().ok()?;
    value.is_finite().then_some(value)
}
