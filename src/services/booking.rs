//! Booking assistant: price a stay from an availability quote, then create it
//!
//! Input is checked twice. [`BookingRequest::validate`] runs before anything
//! is fetched, and [`BookingDraft::validate`] runs once the quoted price has
//! been filled in.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::api::ApiClient;
use crate::types::{AvailabilityQuote, InnpulseError, Reservation, ReservationStatus, Result};

/// Default occupancy of a new reservation
pub const DEFAULT_ADULTS: u32 = 2;

/// Stay parameters as entered, before a quote is known
#[derive(Debug, Clone, PartialEq)]
pub struct BookingRequest {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub rooms: u32,
    /// `None` takes the quoted price
    pub total_price: Option<f64>,
    pub deposit: f64,
}

impl BookingRequest {
    pub fn validate(&self) -> Result<()> {
        if self.check_out <= self.check_in {
            return Err(invalid("check-out must be after check-in"));
        }
        if !self.deposit.is_finite() || self.deposit < 0.0 {
            return Err(invalid("deposit must be a non-negative amount"));
        }
        if let Some(total) = self.total_price {
            if !total.is_finite() || total < 0.0 {
                return Err(invalid("total price must be a non-negative amount"));
            }
            if self.deposit > total {
                return Err(invalid("deposit cannot exceed the total price"));
            }
        }
        Ok(())
    }

    /// Fill in the quoted price when no total was entered
    pub fn price(&self, quote: &AvailabilityQuote) -> BookingDraft {
        BookingDraft {
            check_in: self.check_in,
            check_out: self.check_out,
            rooms: self.rooms.max(1),
            total_price: self.total_price.unwrap_or(quote.suggested_total_price),
            deposit: self.deposit,
        }
    }
}

/// A reservation being priced before it is created
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingDraft {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub rooms: u32,
    pub total_price: f64,
    pub deposit: f64,
}

impl BookingDraft {
    /// Nights between check-in and check-out, at least 1
    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days().max(1)
    }

    /// Average daily rate per room
    pub fn adr(&self) -> f64 {
        self.total_price / self.nights() as f64 / self.rooms.max(1) as f64
    }

    /// Amount still due after the deposit
    pub fn balance(&self) -> f64 {
        (self.total_price - self.deposit).max(0.0)
    }

    pub fn validate(&self) -> Result<()> {
        if self.check_out <= self.check_in {
            return Err(invalid("check-out must be after check-in"));
        }
        if !self.total_price.is_finite() || self.total_price < 0.0 {
            return Err(invalid("total price must be a non-negative amount"));
        }
        if !self.deposit.is_finite() || self.deposit < 0.0 {
            return Err(invalid("deposit must be a non-negative amount"));
        }
        if self.deposit > self.total_price {
            return Err(invalid("deposit cannot exceed the total price"));
        }
        Ok(())
    }
}

/// Body of `POST /reservations`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReservation {
    pub guest_name: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub adults: u32,
    pub children: u32,
    pub rooms: u32,
    pub room_type: String,
    pub channel: String,
    pub status: ReservationStatus,
    pub total_price: f64,
    pub deposit_amount: f64,
}

impl NewReservation {
    /// Confirmed reservation for `guest_name` from a priced draft
    pub fn from_draft(draft: &BookingDraft, guest_name: &str, room_type: &str, channel: &str) -> Self {
        Self {
            guest_name: guest_name.trim().to_string(),
            check_in: draft.check_in,
            check_out: draft.check_out,
            adults: DEFAULT_ADULTS,
            children: 0,
            rooms: draft.rooms.max(1),
            room_type: room_type.trim().to_string(),
            channel: channel.trim().to_lowercase(),
            status: ReservationStatus::Confirmed,
            total_price: draft.total_price,
            deposit_amount: draft.deposit,
        }
    }

    fn draft(&self) -> BookingDraft {
        BookingDraft {
            check_in: self.check_in,
            check_out: self.check_out,
            rooms: self.rooms,
            total_price: self.total_price,
            deposit: self.deposit_amount,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.guest_name.is_empty() {
            return Err(invalid("guest name is required"));
        }
        if self.room_type.is_empty() {
            return Err(invalid("room type is required"));
        }
        if self.channel.is_empty() {
            return Err(invalid("channel is required"));
        }
        if self.adults + self.children == 0 {
            return Err(invalid("at least one guest must stay"));
        }
        self.draft().validate()
    }
}

/// Write side of the reservations API
pub trait ReservationDesk {
    fn create_reservation(&self, reservation: &NewReservation) -> Result<Reservation>;

    fn set_reservation_status(&self, id: &str, status: ReservationStatus) -> Result<()>;
}

impl ReservationDesk for ApiClient {
    fn create_reservation(&self, reservation: &NewReservation) -> Result<Reservation> {
        ApiClient::create_reservation(self, reservation)
    }

    fn set_reservation_status(&self, id: &str, status: ReservationStatus) -> Result<()> {
        ApiClient::set_reservation_status(self, id, status)
    }
}

/// Validate and create a reservation
pub fn submit_booking(desk: &impl ReservationDesk, reservation: &NewReservation) -> Result<Reservation> {
    reservation.validate()?;
    let created = desk.create_reservation(reservation)?;
    info!(id = %created.id, guest = %created.guest_name, "reservation created");
    Ok(created)
}

/// Move a reservation to `status`; cancelling is `Cancelled`
pub fn change_status(desk: &impl ReservationDesk, id: &str, status: ReservationStatus) -> Result<()> {
    let id = id.trim();
    if id.is_empty() {
        return Err(invalid("reservation id is required"));
    }
    desk.set_reservation_status(id, status)?;
    info!(id, status = status.as_str(), "reservation status changed");
    Ok(())
}

fn invalid(message: &str) -> InnpulseError {
    InnpulseError::Invalid(message.to_string())
}
