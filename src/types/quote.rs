//! Availability quote for a prospective stay, one allotment row per night

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Remaining allotment for a room type on one night
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayAllotment {
    pub date: NaiveDate,
    pub allotment: u32,
    pub used: u32,
    pub remaining: i64,
}

impl DayAllotment {
    /// Rooms still open for sale
    pub fn open(&self) -> u32 {
        self.allotment.saturating_sub(self.used)
    }

    pub fn fits(&self, rooms: u32) -> bool {
        self.remaining >= i64::from(rooms)
    }
}

/// Availability and suggested price for a prospective booking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityQuote {
    pub nights: i64,
    pub suggested_total_price: f64,
    pub remaining_per_day: Vec<DayAllotment>,
    pub available: bool,
}

impl AvailabilityQuote {
    /// Nights that cannot take `rooms` more rooms
    pub fn short_days(&self, rooms: u32) -> Vec<NaiveDate> {
        self.remaining_per_day
            .iter()
            .filter(|d| !d.fits(rooms))
            .map(|d| d.date)
            .collect()
    }
}
