// file: src/pubmed/window.rs
// description: single-day search window relative to the current date
// reference: https://docs.rs/chrono

use chrono::{DateTime, Duration, NaiveDate, TimeZone};

const DATE_FORMAT: &str = "%Y/%m/%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchWindow {
    date: NaiveDate,
}

impl SearchWindow {
    pub fn from_now<Tz: TimeZone>(now: &DateTime<Tz>, lookback_days: i64) -> Self {
        let target = now.clone() - Duration::days(lookback_days);
        Self {
            date: target.date_naive(),
        }
    }

    pub fn for_date(date: NaiveDate) -> Self {
        Self { date }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn mindate(&self) -> String {
        self.formatted()
    }

    pub fn maxdate(&self) -> String {
        self.formatted()
    }

    pub fn formatted(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_previous_day() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 8, 30, 0).unwrap();
        let window = SearchWindow::from_now(&now, 1);
        assert_eq!(window.formatted(), "2024/03/14");
        assert_eq!(window.mindate(), window.maxdate());
    }

    #[test]
    fn test_crosses_month_and_year() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 5, 0).unwrap();
        assert_eq!(SearchWindow::from_now(&now, 1).formatted(), "2023/12/31");

        let leap = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(SearchWindow::from_now(&leap, 1).formatted(), "2024/02/29");
    }

    #[test]
    fn test_explicit_date() {
        let date = NaiveDate::from_ymd_opt(2023, 7, 4).unwrap();
        let window = SearchWindow::for_date(date);
        assert_eq!(window.date(), date);
        assert_eq!(window.formatted(), "2023/07/04");
    }
}
