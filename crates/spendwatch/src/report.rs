use std::fmt;

use chrono::{Datelike, Local, NaiveDate};

pub const BILLING_DASHBOARD_URL: &str = "https://console.aws.amazon.com/billing/home#/bills";
pub const COST_EXPLORER_URL: &str =
    "https://console.aws.amazon.com/cost-management/home?#/cost-explorer";

/// Calendar range passed to the billing query. `end` never precedes `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// First day of `today`'s month through `today`.
    pub fn month_to_date(today: NaiveDate) -> Self {
        let start = today.with_day(1).unwrap_or(today);
        Self { start, end: today }
    }

    /// Month-to-date range using the local clock at invocation time.
    pub fn current() -> Self {
        Self::month_to_date(Local::now().date_naive())
    }

    pub fn start_iso(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    pub fn end_iso(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }
}

/// Monetary amount rounded to cents.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Amount(f64);

impl Amount {
    /// Round to cents from the exact binary value, ties to even. Same cent as Python's
    /// `round(x, 2)`.
    pub fn rounded(value: f64) -> Self {
        Amount(format!("{value:.2}").parse().unwrap_or(value))
    }

    pub fn zero() -> Self {
        Amount(0.0)
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

pub fn render_message(range: &DateRange, amount: Amount) -> String {
    format!(
        "AWS Billing Report:\n\
         from: {start}\n\
         to: {end}:\n\
         Estimated total cost: ${amount}\n\
         <{BILLING_DASHBOARD_URL}|View Billing Dashboard>\n\
         <{COST_EXPLORER_URL}|View Cost Explorer>",
        start = range.start_iso(),
        end = range.end_iso(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn mid_month_range() {
        let range = DateRange::month_to_date(date(2024, 3, 15));
        assert_eq!(range.start_iso(), "2024-03-01");
        assert_eq!(range.end_iso(), "2024-03-15");
    }

    #[test]
    fn first_of_month_collapses_to_one_day() {
        let range = DateRange::month_to_date(date(2024, 1, 1));
        assert_eq!(range.start, range.end);
    }

    #[test]
    fn leap_day_range() {
        let range = DateRange::month_to_date(date(2024, 2, 29));
        assert_eq!(range.start_iso(), "2024-02-01");
        assert_eq!(range.end_iso(), "2024-02-29");
    }

    #[test]
    fn current_range_starts_on_day_one() {
        let range = DateRange::current();
        assert_eq!(range.start.day(), 1);
        assert!(range.start <= range.end);
    }

    #[test]
    fn amount_rounds_to_nearest_cent() {
        assert_eq!(Amount::rounded(123.456).value(), 123.46);
        assert_eq!(Amount::rounded(0.004).value(), 0.0);
        assert_eq!(Amount::rounded(10.5).to_string(), "10.50");
        assert_eq!(Amount::rounded(99.999).to_string(), "100.00");
    }

    #[test]
    fn amount_ties_match_python_round() {
        // 1.125 and 0.125 are exact ties and go to the even cent; 2.675 is stored just below.
        assert_eq!(Amount::rounded(1.125).to_string(), "1.12");
        assert_eq!(Amount::rounded(0.125).to_string(), "0.12");
        assert_eq!(Amount::rounded(1.135).to_string(), "1.14");
        assert_eq!(Amount::rounded(2.675).to_string(), "2.67");
        assert_eq!(Amount::rounded(2.675).value(), 2.67);
    }

    #[test]
    fn message_contains_both_dashboard_links() {
        let range = DateRange::month_to_date(date(2024, 3, 15));
        let msg = render_message(&range, Amount::rounded(42.1));
        assert!(msg.contains(BILLING_DASHBOARD_URL));
        assert!(msg.contains(COST_EXPLORER_URL));
    }

    #[test]
    fn message_layout() {
        let range = DateRange::month_to_date(date(2024, 3, 15));
        let msg = render_message(&range, Amount::rounded(123.456));
        let lines: Vec<&str> = msg.lines().collect();
        assert_eq!(lines[0], "AWS Billing Report:");
        assert_eq!(lines[1], "from: 2024-03-01");
        assert_eq!(lines[2], "to: 2024-03-15:");
        assert_eq!(lines[3], "Estimated total cost: $123.46");
        assert_eq!(
            lines[4],
            "<https://console.aws.amazon.com/billing/home#/bills|View Billing Dashboard>"
        );
        assert_eq!(lines.len(), 6);
    }
}
