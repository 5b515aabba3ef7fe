/// Format a price in millions for display, e.g. `$12.5M`
pub fn format_price(millions: f64) -> String {
    if millions.fract() == 0.0 {
        format!("${:.0}M", millions)
    } else {
        format!("${:.1}M", millions)
    }
}

/// Format an ownership percentage, e.g. `34.2%`
pub fn format_ownership(pct: f64) -> String {
    format!("{:.1}%", pct)
}

/// Format fantasy points, dropping the fraction when there is none
pub fn format_points(points: f64) -> String {
    if points.fract() == 0.0 {
        format!("{:.0}", points)
    } else {
        format!("{:.1}", points)
    }
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format a date string to a more readable format
pub fn format_date(date: &str) -> String {
    // Try to parse ISO format and convert to readable
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(date) {
        dt.format("%b %d, %Y").to_string()
    } else if let Ok(d) = chrono::NaiveDate::parse_from_str(date.get(..10).unwrap_or(date), "%Y-%m-%d") {
        d.format("%b %d, %Y").to_string()
    } else {
        date.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(12.5), "$12.5M");
        assert_eq!(format_price(100.0), "$100M");
        assert_eq!(format_price(0.0), "$0M");
    }

    #[test]
    fn test_format_points() {
        assert_eq!(format_points(341.0), "341");
        assert_eq!(format_points(341.5), "341.5");
        assert_eq!(format_ownership(34.24), "34.2%");
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Cedars", 10), "Cedars");
        assert_eq!(truncate_string("Beirut Cedars", 8), "Beiru...");
        assert_eq!(truncate_string("Hi", 2), "Hi");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2024-09-21T10:00:00Z"), "Sep 21, 2024");
        assert_eq!(format_date("2024-09-21T10:00:00.123"), "Sep 21, 2024");
        assert_eq!(format_date("soon"), "soon");
    }
}
