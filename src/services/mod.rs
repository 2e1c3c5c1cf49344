//! Services for revenue aggregation, dashboard loading and finance sync

pub mod aggregator;
pub mod booking;
pub mod cache;
pub mod dashboard;
pub mod ledger;

pub use aggregator::{Aggregator, FrontDesk};
pub use booking::{
    change_status, submit_booking, BookingDraft, BookingRequest, NewReservation, ReservationDesk,
};
pub use cache::SnapshotCacheService;
pub use dashboard::{DashboardService, HotelBackend, LoadStage};
pub use ledger::{build_entries, LedgerOptions};
