use giftshop_db::models::store::POINTS_CURRENCY;

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Provider amounts are minor units; points are whole Stars.
pub fn format_amount(amount: i64, currency: &str) -> String {
    if currency == POINTS_CURRENCY {
        return format!("{} ⭐", amount);
    }
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    format!("{}{}.{:02} {}", sign, abs / 100, abs % 100, currency)
}

/// Splits `/cmd@botname args` into (`/cmd`, `args`). The argument part keeps its newlines.
pub fn split_command(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    let (head, rest) = match text.find(char::is_whitespace) {
        Some(idx) => (&text[..idx], &text[idx..]),
        None => (text, ""),
    };
    let cmd = head.split('@').next().unwrap_or(head);
    let rest = rest.trim_start_matches([' ', '\t']);
    let rest = rest.strip_prefix('\n').unwrap_or(rest);
    (cmd, rest.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_html_specials() {
        assert_eq!(escape_html("<b>A&B</b>"), "&lt;b&gt;A&amp;B&lt;/b&gt;");
    }

    #[test]
    fn formats_minor_units_and_stars() {
        assert_eq!(format_amount(1000, "RUB"), "10.00 RUB");
        assert_eq!(format_amount(505, "USD"), "5.05 USD");
        assert_eq!(format_amount(100, "XTR"), "100 ⭐");
    }

    #[test]
    fn splits_commands() {
        assert_eq!(split_command("/start"), ("/start", ""));
        assert_eq!(split_command("/refulfill@shop_bot abc"), ("/refulfill", "abc"));
        assert_eq!(split_command("/addcodes 5\nA1\nA2"), ("/addcodes", "5\nA1\nA2"));
        assert_eq!(split_command("/addcodes\n5\nA1"), ("/addcodes", "5\nA1"));
    }
}
