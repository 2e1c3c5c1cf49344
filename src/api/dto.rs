//! Wire formats returned by the backend and their conversion into domain types
//!
//! The backend is inconsistent about field names and value types: numbers
//! arrive as strings, `guest` is sometimes an unpopulated id, lists come back
//! as `null`. Loose fields are kept as raw JSON and coerced here, so one odd
//! record never fails a whole page and the rest of the crate only sees
//! normalized `Reservation`, `RoomType` and friends.

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::types::{
    AvailabilityQuote, ChannelConnection, ChannelShare, DayAllotment, DashboardKpi, Payment,
    Reservation, ReservationStatus, RoomType,
};

/// Coerce a JSON scalar into a finite number; anything else is `None`
pub(crate) fn number(value: Option<&Value>) -> Option<f64> {
    let n = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

/// Coerce a JSON scalar into non-empty trimmed text
pub(crate) fn text(value: Option<&Value>) -> Option<String> {
    let s = match value? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!s.is_empty()).then_some(s)
}

/// Parse an ISO date or RFC 3339 timestamp into its UTC calendar date
pub(crate) fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    raw.get(..10)
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
}

fn date_of(value: Option<&Value>) -> Option<NaiveDate> {
    text(value).as_deref().and_then(parse_date)
}

fn count(value: Option<&Value>) -> u32 {
    number(value).map(|n| n.max(0.0).round() as u32).unwrap_or(0)
}

/// Decode a JSON array element by element, skipping elements that do not fit
/// `T`. `null` or a non-array reads as empty.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items,
        _ => return Ok(Vec::new()),
    };
    let total = raw.len();
    let items: Vec<T> = raw
        .into_iter()
        .filter_map(|v| serde_json::from_value(v).ok())
        .collect();
    if items.len() < total {
        warn!(skipped = total - items.len(), "skipped undecodable list items");
    }
    Ok(items)
}

fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(number(raw.as_ref())
        .filter(|&n| n >= 0.0)
        .map(|n| n.round() as u64))
}

/// One page of a paginated list
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
pub struct Page<T> {
    #[serde(default, deserialize_with = "lenient_list")]
    pub items: Vec<T>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub total: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub pages: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDto {
    #[serde(rename = "_id")]
    pub mongo_id: Option<Value>,
    pub id: Option<Value>,
    #[serde(alias = "total")]
    pub amount: Option<Value>,
    pub currency: Option<Value>,
    #[serde(alias = "rate")]
    pub fx_rate: Option<Value>,
    #[serde(alias = "createdAt")]
    pub date: Option<Value>,
    pub method: Option<Value>,
    pub kind: Option<Value>,
    #[serde(rename = "type")]
    pub payment_type: Option<Value>,
}

impl PaymentDto {
    fn into_payment(self) -> Payment {
        let kind = [text(self.kind.as_ref()), text(self.payment_type.as_ref())]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        Payment {
            id: text(self.mongo_id.as_ref()).or_else(|| text(self.id.as_ref())),
            amount: number(self.amount.as_ref()).unwrap_or(0.0),
            currency: text(self.currency.as_ref())
                .map(|c| c.to_uppercase())
                .unwrap_or_else(|| "TRY".to_string()),
            fx_rate: number(self.fx_rate.as_ref())
                .filter(|&r| r != 0.0)
                .unwrap_or(1.0),
            date: date_of(self.date.as_ref()),
            method: text(self.method.as_ref()).unwrap_or_default(),
            kind,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationDto {
    #[serde(rename = "_id")]
    pub mongo_id: Option<Value>,
    pub id: Option<Value>,
    /// Populated guest object, or just its id when the backend skips population
    pub guest: Option<Value>,
    #[serde(alias = "primaryGuest")]
    pub guest_name: Option<Value>,
    #[serde(alias = "arrivalDate", alias = "startDate")]
    pub check_in: Option<Value>,
    #[serde(alias = "departureDate", alias = "endDate")]
    pub check_out: Option<Value>,
    pub rooms: Option<Value>,
    #[serde(alias = "total")]
    pub total_price: Option<Value>,
    pub deposit_amount: Option<Value>,
    #[serde(alias = "source")]
    pub channel: Option<Value>,
    pub status: Option<Value>,
    #[serde(
        alias = "paymentHistory",
        alias = "transactions",
        default,
        deserialize_with = "lenient_list"
    )]
    pub payments: Vec<PaymentDto>,
}

impl ReservationDto {
    /// Normalize into a domain reservation. Returns `None` when either stay
    /// date is missing or unparseable.
    pub fn into_reservation(self) -> Option<Reservation> {
        let check_in = date_of(self.check_in.as_ref())?;
        let check_out = date_of(self.check_out.as_ref())?;

        let rooms = number(self.rooms.as_ref())
            .filter(|&n| n >= 1.0)
            .map(|n| n.round() as u32)
            .unwrap_or(1);

        let populated_name = match &self.guest {
            Some(Value::Object(guest)) => text(guest.get("name")),
            _ => None,
        };
        let guest_name = populated_name
            .or_else(|| text(self.guest_name.as_ref()))
            .unwrap_or_else(|| "Guest".to_string());

        Some(Reservation {
            id: text(self.mongo_id.as_ref())
                .or_else(|| text(self.id.as_ref()))
                .unwrap_or_default(),
            guest_name,
            check_in,
            check_out,
            rooms,
            total_price: number(self.total_price.as_ref()).unwrap_or(0.0).max(0.0),
            deposit_amount: number(self.deposit_amount.as_ref())
                .unwrap_or(0.0)
                .max(0.0),
            channel: text(self.channel.as_ref()).unwrap_or_else(|| "other".to_string()),
            status: text(self.status.as_ref())
                .as_deref()
                .map(ReservationStatus::from_label)
                .unwrap_or_default(),
            payments: self
                .payments
                .into_iter()
                .map(PaymentDto::into_payment)
                .collect(),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomTypeDto {
    #[serde(rename = "_id")]
    pub mongo_id: Option<Value>,
    pub id: Option<Value>,
    pub name: Option<Value>,
    pub code: Option<Value>,
    pub total_rooms: Option<Value>,
}

impl From<RoomTypeDto> for RoomType {
    fn from(dto: RoomTypeDto) -> Self {
        Self {
            id: text(dto.mongo_id.as_ref())
                .or_else(|| text(dto.id.as_ref()))
                .unwrap_or_default(),
            name: text(dto.name.as_ref()).unwrap_or_default(),
            code: text(dto.code.as_ref()).unwrap_or_default(),
            total_rooms: count(dto.total_rooms.as_ref()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiDto {
    pub inhouse: Option<Value>,
    pub arrivals: Option<Value>,
    pub departures: Option<Value>,
    pub mtd_revenue: Option<Value>,
    #[serde(rename = "mtdADR")]
    pub mtd_adr: Option<Value>,
    #[serde(rename = "mtdRevPAR")]
    pub mtd_revpar: Option<Value>,
    pub occ_today: Option<Value>,
}

impl KpiDto {
    pub fn into_kpi(self, total_rooms: u32) -> DashboardKpi {
        DashboardKpi {
            in_house: count(self.inhouse.as_ref()),
            arrivals: count(self.arrivals.as_ref()),
            departures: count(self.departures.as_ref()),
            mtd_revenue: number(self.mtd_revenue.as_ref()).unwrap_or(0.0),
            mtd_adr: number(self.mtd_adr.as_ref()).unwrap_or(0.0),
            mtd_revpar: number(self.mtd_revpar.as_ref()).unwrap_or(0.0),
            occupancy_today: count(self.occ_today.as_ref()).min(100) as u8,
            total_rooms,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ChannelDto {
    pub label: Option<Value>,
    pub value: Option<Value>,
}

impl From<ChannelDto> for ChannelShare {
    fn from(dto: ChannelDto) -> Self {
        Self {
            label: text(dto.label.as_ref()).unwrap_or_else(|| "other".to_string()),
            value: count(dto.value.as_ref()).into(),
        }
    }
}

/// Pre-aggregated dashboard, when the backend provides one
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OverviewDto {
    pub kpi: Option<KpiDto>,
    #[serde(deserialize_with = "lenient_list")]
    pub week_series: Vec<Value>,
    #[serde(deserialize_with = "lenient_list")]
    pub channels: Vec<ChannelDto>,
    #[serde(deserialize_with = "lenient_list")]
    pub arrivals_today: Vec<ReservationDto>,
    #[serde(deserialize_with = "lenient_list")]
    pub departures_today: Vec<ReservationDto>,
}

/// Row of `GET /channels`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelConnectionDto {
    pub channel: Option<Value>,
    pub active: Option<Value>,
    pub last_sync: Option<Value>,
}

impl ChannelConnectionDto {
    /// `None` for rows without a channel name
    pub fn into_connection(self) -> Option<ChannelConnection> {
        let channel = text(self.channel.as_ref())?.to_lowercase();
        let active = match self.active {
            Some(Value::Bool(b)) => b,
            other => number(other.as_ref()).is_some_and(|n| n != 0.0),
        };
        let last_sync = text(self.last_sync.as_ref())
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc));
        Some(ChannelConnection {
            channel,
            active,
            last_sync,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DayAllotmentDto {
    pub date: Option<Value>,
    pub allotment: Option<Value>,
    pub used: Option<Value>,
    pub remaining: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuoteDto {
    pub nights: Option<Value>,
    pub suggested_total_price: Option<Value>,
    #[serde(deserialize_with = "lenient_list")]
    pub remaining_per_day: Vec<DayAllotmentDto>,
    pub available: Option<bool>,
}

impl From<QuoteDto> for AvailabilityQuote {
    fn from(dto: QuoteDto) -> Self {
        let remaining_per_day: Vec<DayAllotment> = dto
            .remaining_per_day
            .into_iter()
            .filter_map(|d| {
                let date = date_of(d.date.as_ref())?;
                let allotment = count(d.allotment.as_ref());
                let used = count(d.used.as_ref());
                let remaining = number(d.remaining.as_ref())
                    .map(|n| n.round() as i64)
                    .unwrap_or_else(|| i64::from(allotment) - i64::from(used));
                Some(DayAllotment {
                    date,
                    allotment,
                    used,
                    remaining,
                })
            })
            .collect();

        Self {
            nights: number(dto.nights.as_ref())
                .map(|n| n.round() as i64)
                .unwrap_or(remaining_per_day.len() as i64),
            suggested_total_price: number(dto.suggested_total_price.as_ref())
                .unwrap_or(0.0)
                .max(0.0),
            available: dto.available.unwrap_or(false),
            remaining_per_day,
        }
    }
}

/// Response of the bulk finance upsert
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BulkResultDto {
    pub inserted: u64,
    pub upserted: u64,
}
