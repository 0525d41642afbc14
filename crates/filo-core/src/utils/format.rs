/// Case-insensitive substring match
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// True when any of the given fields contains the query
pub fn any_contains(fields: &[&str], query: &str) -> bool {
    let query = query.to_lowercase();
    fields.iter().any(|f| f.to_lowercase().contains(&query))
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Group the integer part of a number in thousands: 45250.5 -> "45,250.5"
pub fn format_thousands(n: f64) -> String {
    let negative = n < 0.0;
    let rounded = (n.abs() * 100.0).round() / 100.0;
    let whole = rounded.trunc() as u64;
    let fraction = rounded - rounded.trunc();

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let mut out = if negative { format!("-{}", grouped) } else { grouped };
    if fraction > 0.0 {
        let cents = format!("{:.2}", fraction);
        out.push_str(cents.trim_start_matches('0').trim_end_matches('0'));
    }
    out
}

/// Format a date string to a more readable format
pub fn format_date(date: &str) -> String {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(date) {
        dt.format("%d %b %Y").to_string()
    } else if let Ok(d) = chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        d.format("%d %b %Y").to_string()
    } else {
        date.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_ignore_case() {
        assert!(contains_ignore_case("34 ABC 123", "abc"));
        assert!(contains_ignore_case("Yakıt", "YAK"));
        assert!(!contains_ignore_case("Bakım", "lastik"));
    }

    #[test]
    fn test_any_contains() {
        assert!(any_contains(&["Ahmet Yılmaz", "B123"], "b12"));
        assert!(!any_contains(&["Ahmet Yılmaz", "B123"], "mehmet"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Hello", 10), "Hello");
        assert_eq!(truncate("Hello World", 8), "Hello...");
        assert_eq!(truncate("Hi", 2), "Hi");
        assert_eq!(truncate("Görev açıklaması", 8), "Görev...");
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(0.0), "0");
        assert_eq!(format_thousands(999.0), "999");
        assert_eq!(format_thousands(45250.0), "45,250");
        assert_eq!(format_thousands(1234567.5), "1,234,567.5");
        assert_eq!(format_thousands(12.25), "12.25");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2024-03-01"), "01 Mar 2024");
        assert_eq!(format_date("2024-03-01T10:00:00Z"), "01 Mar 2024");
        assert_eq!(format_date("soon"), "soon");
    }
}
