//! Revenue aggregation over reservation lists
//!
//! Every function here is pure: the same reservations and window always
//! produce the same numbers.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::types::{
    ChannelShare, NightlyRevenueShare, ReportWindow, Reservation, ReservationStatus,
    RevenueSummary,
};

/// Arrivals, departures and in-house rooms for one day
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontDesk {
    /// Rooms occupied tonight
    pub in_house: u32,
    /// Rooms arriving today
    pub arrival_rooms: u32,
    /// Rooms departing today
    pub departure_rooms: u32,
    pub arrivals: Vec<Reservation>,
    pub departures: Vec<Reservation>,
}

/// Round to whole currency units, ties to even
pub fn round_currency(amount: f64) -> i64 {
    amount.round_ties_even() as i64
}

pub struct Aggregator;

impl Aggregator {
    /// Prorated revenue, room nights, ADR, RevPAR and occupancy over `window`
    ///
    /// Each stay contributes `total_price × overlap / nights` where `nights`
    /// is floored to one. Cancelled stays never contribute.
    pub fn revenue(
        reservations: &[Reservation],
        window: ReportWindow,
        total_rooms: u32,
    ) -> RevenueSummary {
        let mut revenue = 0.0;
        let mut room_nights_sold: u64 = 0;

        for r in billable(reservations) {
            let overlap = r.overlap_nights(window);
            if overlap == 0 {
                continue;
            }
            revenue += r.revenue_share(window);
            room_nights_sold += u64::from(r.rooms) * overlap as u64;
        }

        let days = window.days();
        let available = u64::from(total_rooms) * days as u64;

        let adr = if room_nights_sold > 0 {
            revenue / room_nights_sold as f64
        } else {
            0.0
        };
        let revpar = if available > 0 {
            revenue / available as f64
        } else {
            0.0
        };
        let occupancy = if available > 0 {
            room_nights_sold as f64 * 100.0 / available as f64
        } else {
            0.0
        };

        RevenueSummary {
            window,
            revenue,
            room_nights_sold,
            adr,
            revpar,
            occupancy,
            daily_series: Self::daily_series(reservations, window),
        }
    }

    /// Revenue per night across `window`, one entry per day, rounded to whole
    /// currency units
    pub fn daily_series(
        reservations: &[Reservation],
        window: ReportWindow,
    ) -> Vec<NightlyRevenueShare> {
        let stays: Vec<&Reservation> = billable(reservations)
            .filter(|r| r.overlap_nights(window) > 0)
            .collect();

        window
            .iter_days()
            .map(|date| {
                let night = ReportWindow::single_day(date);
                let amount: f64 = stays
                    .iter()
                    .map(|r| r.per_night() * r.overlap_nights(night) as f64)
                    .sum();
                NightlyRevenueShare {
                    date,
                    amount: round_currency(amount),
                }
            })
            .collect()
    }

    /// Reservation count per channel, largest first, capped at `limit` entries
    pub fn channel_mix(reservations: &[Reservation], limit: usize) -> Vec<ChannelShare> {
        let mut counts: HashMap<&str, u64> = HashMap::new();
        for r in reservations {
            let label = if r.channel.is_empty() {
                "other"
            } else {
                r.channel.as_str()
            };
            *counts.entry(label).or_insert(0) += 1;
        }

        let mut shares: Vec<ChannelShare> = counts
            .into_iter()
            .map(|(label, value)| ChannelShare {
                label: label.to_string(),
                value,
            })
            .collect();
        shares.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.label.cmp(&b.label)));
        shares.truncate(limit);
        shares
    }

    /// Who is in house, arriving and departing on `today`
    pub fn front_desk(reservations: &[Reservation], today: NaiveDate) -> FrontDesk {
        let mut desk = FrontDesk::default();

        for r in billable(reservations) {
            if r.is_in_house(today) {
                desk.in_house += r.rooms;
            }
            if r.check_in == today {
                desk.arrival_rooms += r.rooms;
                desk.arrivals.push(r.clone());
            }
            if r.check_out == today {
                desk.departure_rooms += r.rooms;
                desk.departures.push(r.clone());
            }
        }

        desk
    }

    /// Occupied share of the house, as a whole percent capped at 100
    pub fn occupancy_pct(in_house: u32, total_rooms: u32) -> u8 {
        if total_rooms == 0 {
            return 0;
        }
        let pct = (f64::from(in_house) / f64::from(total_rooms) * 100.0).round();
        pct.min(100.0) as u8
    }
}

fn billable(reservations: &[Reservation]) -> impl Iterator<Item = &Reservation> {
    reservations
        .iter()
        .filter(|r| r.status != ReservationStatus::Cancelled)
}
