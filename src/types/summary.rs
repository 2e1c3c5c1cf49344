//! Aggregated revenue and dashboard types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::reservation::{ReportWindow, Reservation};

/// Revenue attributed to one night, in whole currency units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NightlyRevenueShare {
    pub date: NaiveDate,
    pub amount: i64,
}

/// Revenue metrics over a report window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueSummary {
    pub window: ReportWindow,
    pub revenue: f64,
    pub room_nights_sold: u64,
    /// Average daily rate
    pub adr: f64,
    /// Revenue per available room
    pub revpar: f64,
    /// Sold share of available room nights, 0-100
    pub occupancy: f64,
    pub daily_series: Vec<NightlyRevenueShare>,
}

impl RevenueSummary {
    /// Summary for a window with nothing sold
    pub fn empty(window: ReportWindow) -> Self {
        Self {
            window,
            revenue: 0.0,
            room_nights_sold: 0,
            adr: 0.0,
            revpar: 0.0,
            occupancy: 0.0,
            daily_series: window
                .iter_days()
                .map(|date| NightlyRevenueShare { date, amount: 0 })
                .collect(),
        }
    }
}

/// Reservation count for one booking channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelShare {
    pub label: String,
    pub value: u64,
}

/// Headline numbers shown at the top of the dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardKpi {
    pub in_house: u32,
    pub arrivals: u32,
    pub departures: u32,
    pub mtd_revenue: f64,
    pub mtd_adr: f64,
    pub mtd_revpar: f64,
    /// Percent, capped at 100
    pub occupancy_today: u8,
    pub total_rooms: u32,
}

/// Where the dashboard numbers came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DashboardSource {
    /// Pre-aggregated by the backend
    Overview,
    /// Computed locally from reservation lists
    Computed,
    /// Replayed from the offline snapshot saved at `saved_at`
    Cached { saved_at: DateTime<Utc> },
}

/// Everything the dashboard screen renders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub today: NaiveDate,
    pub kpi: DashboardKpi,
    pub week_series: Vec<NightlyRevenueShare>,
    pub channels: Vec<ChannelShare>,
    pub arrivals: Vec<Reservation>,
    pub departures: Vec<Reservation>,
    pub source: DashboardSource,
}
