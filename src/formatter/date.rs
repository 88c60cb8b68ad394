use chrono::{DateTime, Utc};

/// Single source of date rendering for every payload
///
/// Dates are rendered as IMF-fixdate, e.g. `Tue, 03 Jan 2012 10:48:22 GMT`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateFormatter;

impl DateFormatter {
    pub fn format_date(&self, date: &DateTime<Utc>) -> String {
        date.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_date() {
        let date = Utc.with_ymd_and_hms(2012, 1, 3, 10, 48, 22).unwrap();
        assert_eq!(DateFormatter.format_date(&date), "Tue, 03 Jan 2012 10:48:22 GMT");
    }
}
