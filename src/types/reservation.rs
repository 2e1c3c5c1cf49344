//! Reservation and reporting-window types

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::finance::Payment;

/// Reservation lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    #[default]
    Confirmed,
    Pending,
    Cancelled,
}

impl ReservationStatus {
    /// Parse a backend status label. Unknown labels are treated as pending.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "confirmed" => Self::Confirmed,
            "cancelled" | "canceled" => Self::Cancelled,
            _ => Self::Pending,
        }
    }

    /// Strict parse for user input; `None` for anything but the three states
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "confirmed" => Some(Self::Confirmed),
            "pending" => Some(Self::Pending),
            "cancelled" | "canceled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Pending => "pending",
            Self::Cancelled => "cancelled",
        }
    }
}

/// A booking as seen by the aggregator, already normalized at the API boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: String,
    pub guest_name: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    /// Always at least 1
    pub rooms: u32,
    /// Always finite and non-negative
    pub total_price: f64,
    #[serde(default)]
    pub deposit_amount: f64,
    pub channel: String,
    pub status: ReservationStatus,
    #[serde(default)]
    pub payments: Vec<Payment>,
}

impl Reservation {
    /// Nights used to price the stay. Zero-night and inverted stays count as one.
    pub fn nights_total(&self) -> i64 {
        (self.check_out - self.check_in).num_days().max(1)
    }

    /// Whole nights this stay shares with `window`
    pub fn overlap_nights(&self, window: ReportWindow) -> i64 {
        let start = self.check_in.max(window.start);
        let end = self.check_out.min(window.end);
        (end - start).num_days().max(0)
    }

    /// Revenue attributable to a single occupied night
    pub fn per_night(&self) -> f64 {
        self.total_price / self.nights_total() as f64
    }

    /// Share of `total_price` that falls inside `window`
    pub fn revenue_share(&self, window: ReportWindow) -> f64 {
        self.total_price * self.overlap_nights(window) as f64 / self.nights_total() as f64
    }

    /// Guest is staying over the night starting on `date`
    pub fn is_in_house(&self, date: NaiveDate) -> bool {
        self.check_in <= date && self.check_out > date
    }

    /// Outstanding amount after the deposit
    pub fn balance(&self) -> f64 {
        (self.total_price - self.deposit_amount).max(0.0)
    }
}

/// Half-open date range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportWindow {
    pub start: NaiveDate,
    /// Exclusive
    pub end: NaiveDate,
}

impl ReportWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// From an inclusive `[first, last]` pair of dates
    pub fn inclusive(first: NaiveDate, last: NaiveDate) -> Self {
        Self::new(first, last + Duration::days(1))
    }

    /// First of the month through today, inclusive
    pub fn month_to_date(today: NaiveDate) -> Self {
        let first = today.with_day(1).unwrap_or(today);
        Self::inclusive(first, today)
    }

    /// The last `days` days ending with today, inclusive
    pub fn trailing_days(today: NaiveDate, days: i64) -> Self {
        Self::inclusive(today - Duration::days(days.max(1) - 1), today)
    }

    /// A single night
    pub fn single_day(date: NaiveDate) -> Self {
        Self::new(date, date + Duration::days(1))
    }

    /// Number of days covered, never negative
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days().max(0)
    }

    /// Last day covered
    pub fn last_day(&self) -> NaiveDate {
        self.end - Duration::days(1)
    }

    /// Each day in the window, in order
    pub fn iter_days(&self) -> impl Iterator<Item = NaiveDate> {
        let start = self.start;
        (0..self.days()).map(move |i| start + Duration::days(i))
    }
}

/// Sellable room category with its physical room count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomType {
    pub id: String,
    pub name: String,
    pub code: String,
    pub total_rooms: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn stay(check_in: NaiveDate, check_out: NaiveDate, total: f64) -> Reservation {
        Reservation {
            id: "r1".into(),
            guest_name: "Guest".into(),
            check_in,
            check_out,
            rooms: 1,
            total_price: total,
            deposit_amount: 0.0,
            channel: "direct".into(),
            status: ReservationStatus::Confirmed,
            payments: Vec::new(),
        }
    }

    #[test]
    fn test_status_from_label() {
        assert_eq!(
            ReservationStatus::from_label("confirmed"),
            ReservationStatus::Confirmed
        );
        assert_eq!(
            ReservationStatus::from_label("Canceled"),
            ReservationStatus::Cancelled
        );
        assert_eq!(
            ReservationStatus::from_label("no-show"),
            ReservationStatus::Pending
        );
    }

    #[test]
    fn test_nights_total_floors_to_one() {
        let r = stay(date(2024, 5, 1), date(2024, 5, 1), 100.0);
        assert_eq!(r.nights_total(), 1);

        let inverted = stay(date(2024, 5, 3), date(2024, 5, 1), 100.0);
        assert_eq!(inverted.nights_total(), 1);
    }

    #[test]
    fn test_overlap_nights_partial() {
        let r = stay(date(2024, 5, 1), date(2024, 5, 4), 300.0);
        let window = ReportWindow::new(date(2024, 5, 1), date(2024, 5, 3));
        assert_eq!(r.overlap_nights(window), 2);
        assert_eq!(r.revenue_share(window), 200.0);
    }

    #[test]
    fn test_overlap_nights_outside() {
        let r = stay(date(2024, 4, 1), date(2024, 4, 4), 300.0);
        let window = ReportWindow::new(date(2024, 5, 1), date(2024, 5, 3));
        assert_eq!(r.overlap_nights(window), 0);
        assert_eq!(r.revenue_share(window), 0.0);
    }

    #[test]
    fn test_in_house_excludes_departure_day() {
        let r = stay(date(2024, 5, 1), date(2024, 5, 3), 200.0);
        assert!(r.is_in_house(date(2024, 5, 1)));
        assert!(r.is_in_house(date(2024, 5, 2)));
        assert!(!r.is_in_house(date(2024, 5, 3)));
    }

    #[test]
    fn test_balance_never_negative() {
        let mut r = stay(date(2024, 5, 1), date(2024, 5, 3), 200.0);
        r.deposit_amount = 250.0;
        assert_eq!(r.balance(), 0.0);
    }

    #[test]
    fn test_month_to_date_window() {
        let w = ReportWindow::month_to_date(date(2024, 5, 17));
        assert_eq!(w.start, date(2024, 5, 1));
        assert_eq!(w.end, date(2024, 5, 18));
        assert_eq!(w.days(), 17);
    }

    #[test]
    fn test_trailing_days_window() {
        let w = ReportWindow::trailing_days(date(2024, 5, 17), 7);
        assert_eq!(w.start, date(2024, 5, 11));
        assert_eq!(w.last_day(), date(2024, 5, 17));
        assert_eq!(w.iter_days().count(), 7);
    }

    #[test]
    fn test_inverted_window_is_empty() {
        let w = ReportWindow::new(date(2024, 5, 10), date(2024, 5, 1));
        assert_eq!(w.days(), 0);
        assert_eq!(w.iter_days().count(), 0);
    }

    #[test]
    fn test_status_strict_parse() {
        assert_eq!(ReservationStatus::parse("Cancelled"), Some(ReservationStatus::Cancelled));
        assert_eq!(ReservationStatus::parse(" canceled "), Some(ReservationStatus::Cancelled));
        assert_eq!(ReservationStatus::parse("pending"), Some(ReservationStatus::Pending));
        assert_eq!(ReservationStatus::parse("no-show"), None);
        assert_eq!(ReservationStatus::from_label("no-show"), ReservationStatus::Pending);
    }
}
