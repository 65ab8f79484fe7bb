//! Small text helpers shared by the renderers.

use chrono::{DateTime, Local, Utc};
use cotiza_core::Money;

/// `dd/mm/YYYY HH:MM:SS` in local time.
pub(crate) fn date_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%d/%m/%Y %H:%M:%S").to_string()
}

/// `dd/mm/YYYY` in local time.
pub(crate) fn date(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%d/%m/%Y").to_string()
}

/// Cuts `text` to at most `width` characters, ending in `...` when cut.
pub(crate) fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    if width <= 3 {
        return text.chars().take(width).collect();
    }
    let mut cut: String = text.chars().take(width - 3).collect();
    cut.push_str("...");
    cut
}

/// `$1,234.50` style amount.
pub(crate) fn grouped_money(amount: Money) -> String {
    let digits = amount.dollars().abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if amount.is_negative() { "-" } else { "" };
    format!("{}${}.{:02}", sign, grouped, amount.cents_part())
}

/// Greedy word wrap at `width` characters. Words longer than a line are
/// split.
pub(crate) fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > width {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                lines.push(word.drain(..width).collect());
            }
            if word.is_empty() {
                continue;
            }

            let needed = if current.is_empty() { word.len() } else { current.chars().count() + 1 + word.len() };
            if needed > width {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.extend(word);
        }
        lines.push(current);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Mouse", 30), "Mouse");
        assert_eq!(
            truncate("Monitor curvo de 34 pulgadas ultra ancho", 30),
            "Monitor curvo de 34 pulgada..."
        );
        assert_eq!(truncate("Teclado Mecánico", 10), "Teclado...");
        assert_eq!(truncate("abcdef", 2), "ab");
    }

    #[test]
    fn test_grouped_money() {
        assert_eq!(grouped_money(Money::from_cents(0)), "$0.00");
        assert_eq!(grouped_money(Money::from_cents(2550)), "$25.50");
        assert_eq!(grouped_money(Money::from_cents(123450)), "$1,234.50");
        assert_eq!(grouped_money(Money::from_cents(123456789)), "$1,234,567.89");
        assert_eq!(grouped_money(Money::from_cents(-100000)), "-$1,000.00");
    }

    #[test]
    fn test_wrap() {
        assert_eq!(wrap("Entrega en sucursal centro", 12), vec!["Entrega en", "sucursal", "centro"]);
        assert_eq!(wrap("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert_eq!(wrap("uno\ndos", 20), vec!["uno", "dos"]);
    }
}
