use chrono::NaiveDate;

/// Full-date layouts seen in storefront release strings.
const DAY_FORMATS: [&str; 5] = ["%B %d, %Y", "%d %B, %Y", "%d %B %Y", "%B %d %Y", "%Y-%m-%d"];

/// Month-only layouts ("Nov 2009"); resolved to the first of the month.
const MONTH_FORMATS: [&str; 2] = ["%d %B %Y", "%d %B, %Y"];

/// Parse a storefront release date string into a calendar date.
///
/// Month names may be abbreviated or spelled out (`%B` accepts both when parsing).
/// A bare year maps to January 1st.
/// Placeholders such as "Coming soon" or "Q3 2025" return None.
pub fn parse_release_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    // "%B %d %Y" would read "Nov 2009" as day 20 of year 9, so two-token
    // strings only go through the month-only layouts.
    if s.split_whitespace().count() == 2 {
        let first_of_month = format!("1 {s}");
        return MONTH_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(&first_of_month, fmt).ok());
    }
    if let Some(d) = DAY_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
    {
        return Some(d);
    }
    if s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit()) {
        return s.parse::<i32>().ok().and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1));
    }
    None
}
