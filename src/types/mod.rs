//! Core domain types shared across the crate

mod channel;
mod error;
mod finance;
mod quote;
mod reservation;
mod summary;

pub use channel::{connection_board, is_valid_channel_name, ChannelConnection, KNOWN_CHANNELS};
pub use error::{ApiError, InnpulseError, Result};
pub use finance::{EntryType, LedgerEntry, Payment, PaymentMethod};
pub use quote::{AvailabilityQuote, DayAllotment};
pub use reservation::{ReportWindow, Reservation, ReservationStatus, RoomType};
pub use summary::{
    ChannelShare, Dashboard, DashboardKpi, DashboardSource, NightlyRevenueShare, RevenueSummary,
};
