//! Amount formatting. Export uses plain two-decimal fixed point; display uses German EUR style.

/// `120` -> `120.00`. Same rounding as the export column format.
pub fn fixed2(amount: f64) -> String {
    format!("{:.2}", amount)
}

/// `1234.5` -> `1.234,50 €`.
pub fn format_eur(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (int_part, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}{},{} €", sign, grouped, frac)
}
