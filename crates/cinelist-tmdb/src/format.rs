use chrono::{Datelike, NaiveDate};

/// Shown when a movie has no poster or backdrop
pub const PLACEHOLDER_IMAGE: &str = "/placeholder-movie.jpg";

/// Full image URL for a TMDB image path
pub fn image_url(image_base_url: &str, path: Option<&str>) -> String {
    match path.map(str::trim) {
        Some(path) if !path.is_empty() => format!("{}{}", image_base_url.trim_end_matches('/'), path),
        _ => PLACEHOLDER_IMAGE.to_string(),
    }
}

/// Release year from an ISO date, or "Unknown".
///
/// Partial dates ("2010", "2010-07") still yield their leading year.
pub fn format_release_year(release_date: &str) -> String {
    let release_date = release_date.trim();
    if let Ok(date) = NaiveDate::parse_from_str(release_date, "%Y-%m-%d") {
        return date.year().to_string();
    }

    let year = release_date.get(..4).filter(|y| y.bytes().all(|b| b.is_ascii_digit()));
    let rest = release_date.get(4..).unwrap_or_default();
    match year {
        Some(year) if rest.is_empty() || rest.starts_with('-') => year.to_string(),
        _ => "Unknown".to_string(),
    }
}

/// "2h 16m", "45m", or "Unknown" for missing/zero runtimes
pub fn format_runtime(minutes: Option<u32>) -> String {
    match minutes {
        None | Some(0) => "Unknown".to_string(),
        Some(minutes) if minutes < 60 => format!("{}m", minutes),
        Some(minutes) => format!("{}h {}m", minutes / 60, minutes % 60),
    }
}

/// Whole US dollars with thousands separators, "Unknown" for zero
pub fn format_currency(amount: u64) -> String {
    if amount == 0 {
        return "Unknown".to_string();
    }

    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("${}", grouped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_url() {
        let base = "https://image.tmdb.org/t/p/w500";
        assert_eq!(image_url(base, Some("/abc.jpg")), "https://image.tmdb.org/t/p/w500/abc.jpg");
        assert_eq!(image_url("https://img/", Some("/abc.jpg")), "https://img/abc.jpg");
        assert_eq!(image_url(base, None), PLACEHOLDER_IMAGE);
        assert_eq!(image_url(base, Some("")), PLACEHOLDER_IMAGE);
    }

    #[test]
    fn test_format_release_year() {
        assert_eq!(format_release_year("1999-03-30"), "1999");
        assert_eq!(format_release_year(""), "Unknown");
        assert_eq!(format_release_year("soon"), "Unknown");
        assert_eq!(format_release_year("2010"), "2010");
        assert_eq!(format_release_year("2010-07"), "2010");
        assert_eq!(format_release_year(" 1984-06 "), "1984");
        assert_eq!(format_release_year("20101"), "Unknown");
        assert_eq!(format_release_year("€10-01"), "Unknown");
    }

    #[test]
    fn test_format_runtime() {
        assert_eq!(format_runtime(Some(136)), "2h 16m");
        assert_eq!(format_runtime(Some(120)), "2h 0m");
        assert_eq!(format_runtime(Some(45)), "45m");
        assert_eq!(format_runtime(Some(0)), "Unknown");
        assert_eq!(format_runtime(None), "Unknown");
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(63_000_000), "$63,000,000");
        assert_eq!(format_currency(463_517_383), "$463,517,383");
        assert_eq!(format_currency(1_000), "$1,000");
        assert_eq!(format_currency(999), "$999");
        assert_eq!(format_currency(0), "Unknown");
    }
}
