use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    Day,
    #[default]
    Week,
    Month,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavDirection {
    Previous,
    Next,
}

/// The date range a calendar view queries and renders.
///
/// Week windows run Sunday through Saturday around the reference date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewWindow {
    mode: ViewMode,
    reference: NaiveDate,
    start: NaiveDate,
    end: NaiveDate,
}

impl ViewWindow {
    pub fn new(reference: NaiveDate, mode: ViewMode) -> Self {
        let (start, end) = match mode {
            ViewMode::Day => (reference, reference),
            ViewMode::Week => {
                let offset = reference.weekday().num_days_from_sunday() as i64;
                let start = reference - Duration::days(offset);
                (start, start + Duration::days(6))
            }
            ViewMode::Month => month_bounds(reference),
        };

        Self {
            mode,
            reference,
            start,
            end,
        }
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn reference(&self) -> NaiveDate {
        self.reference
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end
    }

    /// Calendar columns, first to last.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.start.iter_days().take(self.len_days()).collect()
    }

    pub fn len_days(&self) -> usize {
        ((self.end - self.start).num_days() + 1) as usize
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// `start_date` / `end_date` query parameters for `GET /availability`.
    pub fn query_params(&self) -> Vec<(String, String)> {
        vec![
            ("start_date".to_string(), self.start.format("%Y-%m-%d").to_string()),
            ("end_date".to_string(), self.end.format("%Y-%m-%d").to_string()),
        ]
    }

    /// Whether a response fetched for `other` still describes this window.
    pub fn same_range(&self, other: &ViewWindow) -> bool {
        self.start == other.start && self.end == other.end
    }

    /// Moves the reference by one unit of the current mode: a day, seven days
    /// or a calendar month (clamped to the month's last day).
    pub fn shifted(&self, direction: NavDirection) -> Self {
        let reference = match (self.mode, direction) {
            (ViewMode::Day, NavDirection::Next) => self.reference + Duration::days(1),
            (ViewMode::Day, NavDirection::Previous) => self.reference - Duration::days(1),
            (ViewMode::Week, NavDirection::Next) => self.reference + Duration::days(7),
            (ViewMode::Week, NavDirection::Previous) => self.reference - Duration::days(7),
            (ViewMode::Month, NavDirection::Next) => self
                .reference
                .checked_add_months(Months::new(1))
                .unwrap_or(self.reference),
            (ViewMode::Month, NavDirection::Previous) => self
                .reference
                .checked_sub_months(Months::new(1))
                .unwrap_or(self.reference),
        };
        Self::new(reference, self.mode)
    }

    pub fn with_mode(&self, mode: ViewMode) -> Self {
        Self::new(self.reference, mode)
    }
}

fn month_bounds(reference: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = reference.with_day(1).unwrap_or(reference);
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(reference);
    (first, last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn week_of_2024_01_15_starts_on_sunday() {
        let window = ViewWindow::new(date(2024, 1, 15), ViewMode::Week);

        assert_eq!(window.start_date(), date(2024, 1, 14));
        assert_eq!(window.end_date(), date(2024, 1, 20));
        assert_eq!(
            window.query_params(),
            vec![
                ("start_date".to_string(), "2024-01-14".to_string()),
                ("end_date".to_string(), "2024-01-20".to_string()),
            ]
        );
    }

    #[test]
    fn week_window_is_seven_consecutive_days_containing_reference() {
        let mut reference = date(2023, 12, 20);
        for _ in 0..400 {
            let window = ViewWindow::new(reference, ViewMode::Week);
            let dates = window.dates();

            assert_eq!(dates.len(), 7);
            assert_eq!(dates[0].weekday(), Weekday::Sun);
            assert!(dates.windows(2).all(|pair| pair[1] == pair[0] + Duration::days(1)));
            assert!(dates.contains(&reference));

            reference = reference + Duration::days(1);
        }
    }

    #[test]
    fn sunday_reference_starts_its_own_week() {
        let window = ViewWindow::new(date(2024, 1, 14), ViewMode::Week);
        assert_eq!(window.start_date(), date(2024, 1, 14));
    }

    #[test]
    fn day_window_is_the_reference() {
        let window = ViewWindow::new(date(2024, 2, 29), ViewMode::Day);
        assert_eq!(window.dates(), vec![date(2024, 2, 29)]);
    }

    #[test]
    fn month_window_spans_whole_month() {
        let window = ViewWindow::new(date(2024, 2, 10), ViewMode::Month);
        assert_eq!(window.start_date(), date(2024, 2, 1));
        assert_eq!(window.end_date(), date(2024, 2, 29));
        assert_eq!(window.len_days(), 29);

        let december = ViewWindow::new(date(2023, 12, 31), ViewMode::Month);
        assert_eq!(december.end_date(), date(2023, 12, 31));
        assert_eq!(december.len_days(), 31);
    }

    #[test]
    fn navigation_steps_by_mode() {
        let week = ViewWindow::new(date(2024, 1, 15), ViewMode::Week);
        assert_eq!(week.shifted(NavDirection::Next).reference(), date(2024, 1, 22));
        assert_eq!(week.shifted(NavDirection::Previous).start_date(), date(2024, 1, 7));

        let day = ViewWindow::new(date(2024, 3, 1), ViewMode::Day);
        assert_eq!(day.shifted(NavDirection::Previous).reference(), date(2024, 2, 29));

        let month = ViewWindow::new(date(2024, 1, 31), ViewMode::Month);
        let next = month.shifted(NavDirection::Next);
        assert_eq!(next.reference(), date(2024, 2, 29));
        assert_eq!(next.start_date(), date(2024, 2, 1));
        assert_eq!(month.shifted(NavDirection::Previous).reference(), date(2023, 12, 31));
    }

    #[test]
    fn same_range_ignores_reference_within_window() {
        let monday = ViewWindow::new(date(2024, 1, 15), ViewMode::Week);
        let friday = ViewWindow::new(date(2024, 1, 19), ViewMode::Week);
        let next_week = monday.shifted(NavDirection::Next);

        assert!(monday.same_range(&friday));
        assert!(!monday.same_range(&next_week));
        assert!(!monday.same_range(&monday.with_mode(ViewMode::Day)));
    }
}
