//! Blocking REST client for the hotel backend

pub mod dto;

use chrono::NaiveDate;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::services::NewReservation;
use crate::types::{
    is_valid_channel_name, ApiError, AvailabilityQuote, ChannelConnection, InnpulseError,
    LedgerEntry, ReportWindow, Reservation, ReservationStatus, Result, RoomType,
};
use dto::{
    BulkResultDto, ChannelConnectionDto, OverviewDto, Page, QuoteDto, ReservationDto, RoomTypeDto,
};

/// Page size accepted by the backend's list validation
pub const PAGE_LIMIT: u32 = 100;

/// Filter for `GET /reservations`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReservationQuery {
    pub status: Option<ReservationStatus>,
    /// Inclusive first day; the backend returns stays overlapping the range
    pub start: Option<NaiveDate>,
    /// Inclusive last day
    pub end: Option<NaiveDate>,
    pub channel: Option<String>,
}

impl ReservationQuery {
    /// Confirmed stays overlapping `window`
    pub fn confirmed(window: ReportWindow) -> Self {
        Self {
            status: Some(ReservationStatus::Confirmed),
            start: Some(window.start),
            end: Some(window.last_day()),
            channel: None,
        }
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(status) = self.status {
            params.push(("status", status.as_str().to_string()));
        }
        if let Some(start) = self.start {
            params.push(("start", start.to_string()));
        }
        if let Some(end) = self.end {
            params.push(("end", end.to_string()));
        }
        if let Some(channel) = &self.channel {
            params.push(("channel", channel.clone()));
        }
        params
    }
}

/// Client bound to one backend and one set of credentials
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: Option<String>,
    hotel_id: Option<String>,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "X-Requested-With",
            HeaderValue::from_static("XMLHttpRequest"),
        );

        let http = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url: config.api_url.clone(),
            token: config.token.clone(),
            hotel_id: config.hotel_id.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        debug!(path, ?query, "GET");
        let request = self.authorize(self.http.get(self.url(path)).query(query));
        decode(request.send().map_err(ApiError::from)?)
    }

    /// `hotelId` query parameter when the client is scoped to one hotel
    fn hotel_param(&self) -> Vec<(&'static str, String)> {
        self.hotel_id
            .iter()
            .map(|id| ("hotelId", id.clone()))
            .collect()
    }

    /// Fetch a single page of reservations
    pub fn reservations_page(
        &self,
        query: &ReservationQuery,
        page: u32,
        limit: u32,
    ) -> Result<Page<ReservationDto>> {
        let mut params = query.params();
        params.extend(self.hotel_param());
        params.push(("page", page.to_string()));
        params.push(("limit", limit.to_string()));
        self.get("/reservations", &params)
    }

    /// Fetch every reservation matching `query`, walking pages until the
    /// reported total is reached
    pub fn fetch_all_reservations(&self, query: &ReservationQuery) -> Result<Vec<Reservation>> {
        let raw = collect_pages(|page| self.reservations_page(query, page, PAGE_LIMIT))?;
        let fetched = raw.len();
        let reservations: Vec<Reservation> = raw
            .into_iter()
            .filter_map(ReservationDto::into_reservation)
            .collect();

        if reservations.len() < fetched {
            warn!(
                dropped = fetched - reservations.len(),
                "skipped reservations without valid stay dates"
            );
        }
        Ok(reservations)
    }

    pub fn room_types(&self) -> Result<Vec<RoomType>> {
        let types: Vec<RoomTypeDto> = self.get("/rooms/types", &[])?;
        Ok(types.into_iter().map(RoomType::from).collect())
    }

    /// Backend-side dashboard aggregate. `None` when the endpoint is missing,
    /// fails, or answers without KPIs.
    pub fn dashboard_overview(&self, from: NaiveDate, to: NaiveDate) -> Option<OverviewDto> {
        let params = [("from", from.to_string()), ("to", to.to_string())];
        match self.get::<OverviewDto>("/dashboard/overview", &params) {
            Ok(overview) if overview.kpi.is_some() => Some(overview),
            Ok(_) => None,
            Err(e) => {
                debug!(error = %e, "dashboard overview unavailable, computing locally");
                None
            }
        }
    }

    pub fn availability_quote(
        &self,
        room_type: &str,
        check_in: NaiveDate,
        check_out: NaiveDate,
        rooms: u32,
    ) -> Result<AvailabilityQuote> {
        let params = [
            ("roomType", room_type.to_string()),
            ("start", check_in.to_string()),
            ("end", check_out.to_string()),
            ("rooms", rooms.max(1).to_string()),
        ];
        let quote: QuoteDto = self.get("/rooms/availability/quote", &params)?;
        Ok(quote.into())
    }

    /// Upsert ledger entries; returns how many rows the backend wrote
    pub fn push_ledger(&self, entries: &[LedgerEntry]) -> Result<u64> {
        debug!(count = entries.len(), "POST /finance/entries/bulk");
        let body = serde_json::json!({ "entries": entries });
        let request = self.authorize(self.http.post(self.url("/finance/entries/bulk")).json(&body));
        let result: BulkResultDto = decode(request.send().map_err(ApiError::from)?)?;
        Ok(result.inserted + result.upserted)
    }

    /// Create a reservation and return it as the backend stored it
    pub fn create_reservation(&self, reservation: &NewReservation) -> Result<Reservation> {
        debug!(guest = %reservation.guest_name, "POST /reservations");
        let request = self.authorize(
            self.http
                .post(self.url("/reservations"))
                .query(&self.hotel_param())
                .json(reservation),
        );
        let created: ReservationDto = decode(request.send().map_err(ApiError::from)?)?;
        created.into_reservation().ok_or_else(|| {
            ApiError::Decode("created reservation came back without stay dates".into()).into()
        })
    }

    pub fn set_reservation_status(&self, id: &str, status: ReservationStatus) -> Result<()> {
        let id = path_segment(id, "reservation id")?;
        debug!(id, status = status.as_str(), "PATCH /reservations/:id/status");
        let body = serde_json::json!({ "status": status.as_str() });
        let request = self.authorize(
            self.http
                .patch(self.url(&format!("/reservations/{}/status", id)))
                .json(&body),
        );
        expect_success(request.send().map_err(ApiError::from)?)
    }

    /// OTA connections for the current hotel, rows without a channel skipped
    pub fn channel_connections(&self) -> Result<Vec<ChannelConnection>> {
        let rows = match self.get::<Value>("/channels", &self.hotel_param())? {
            Value::Array(rows) => rows,
            _ => Vec::new(),
        };
        Ok(rows
            .into_iter()
            .filter_map(|row| serde_json::from_value::<ChannelConnectionDto>(row).ok())
            .filter_map(ChannelConnectionDto::into_connection)
            .collect())
    }

    /// Ask the backend to sync one channel now
    pub fn sync_channel(&self, channel: &str) -> Result<()> {
        let channel = channel.trim().to_lowercase();
        if !is_valid_channel_name(&channel) {
            return Err(InnpulseError::Invalid(format!(
                "invalid channel name: {:?}",
                channel
            )));
        }
        debug!(%channel, "POST /channels/:channel/sync");
        let request = self.authorize(
            self.http
                .post(self.url(&format!("/channels/{}/sync", channel)))
                .query(&self.hotel_param()),
        );
        expect_success(request.send().map_err(ApiError::from)?)
    }
}

/// Reject ids that would change the request path
fn path_segment<'a>(value: &'a str, what: &str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() || value.contains(['/', '?', '#']) {
        return Err(InnpulseError::Invalid(format!("invalid {}: {:?}", what, value)));
    }
    Ok(value)
}

fn expect_success(response: Response) -> Result<()> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().unwrap_or_default();
    Err(error_from_response(status.as_u16(), &body).into())
}

fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().map_err(ApiError::from)?);
    }
    let body = response.text().unwrap_or_default();
    Err(error_from_response(status.as_u16(), &body).into())
}

/// Classify a non-success response, pulling the most useful message out of
/// the body (validation details first, then `message`, then raw text)
pub fn error_from_response(status: u16, body: &str) -> ApiError {
    let json: Option<Value> = serde_json::from_str(body).ok();

    if let Some(first) = json
        .as_ref()
        .and_then(|j| j.get("errors"))
        .and_then(Value::as_array)
        .and_then(|errors| errors.first())
    {
        let path = first.get("path").and_then(Value::as_str).unwrap_or("");
        let msg = first
            .get("msg")
            .or_else(|| first.get("message"))
            .and_then(Value::as_str)
            .unwrap_or("");
        let detail = if path.is_empty() {
            msg.to_string()
        } else {
            format!("{}: {}", path, msg)
        };
        return ApiError::Validation(detail);
    }

    let message = match &json {
        Some(j) => j
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string(),
        None => body.trim().to_string(),
    };

    match status {
        // Gateway failures mean the API itself is unreachable
        502..=504 => ApiError::Network(or_default(message, "gateway unavailable")),
        401 => ApiError::Unauthorized,
        403 => ApiError::Forbidden(or_default(message, "operation not allowed")),
        409 => ApiError::Conflict(or_default(message, "conflicting change")),
        400 | 422 => ApiError::Validation(or_default(message, "invalid request")),
        _ => ApiError::Status {
            status,
            message: or_default(message, "unexpected error"),
        },
    }
}

fn or_default(message: String, fallback: &str) -> String {
    if message.is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

/// Drain a paginated endpoint. Stops once `total` items are collected, or on
/// an empty page when the backend omits `total`.
pub fn collect_pages<T>(mut fetch: impl FnMut(u32) -> Result<Page<T>>) -> Result<Vec<T>> {
    let mut out = Vec::new();
    let mut page = 1;
    loop {
        let batch = fetch(page)?;
        let received = batch.items.len();
        out.extend(batch.items);

        let total = batch.total.unwrap_or(out.len() as u64);
        if received == 0 || out.len() as u64 >= total {
            break;
        }
        page += 1;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_query_params_confirmed_window() {
        let window = ReportWindow::month_to_date(date(2024, 5, 17));
        let params = ReservationQuery::confirmed(window).params();
        assert_eq!(
            params,
            vec![
                ("status", "confirmed".to_string()),
                ("start", "2024-05-01".to_string()),
                ("end", "2024-05-17".to_string()),
            ]
        );
    }

    #[test]
    fn test_query_params_empty() {
        assert!(ReservationQuery::default().params().is_empty());
    }

    #[test]
    fn test_url_joins_paths() {
        let config = Config {
            api_url: "http://localhost:5000/api".into(),
            ..Config::default()
        };
        let client = ApiClient::new(&config).unwrap();
        assert_eq!(client.url("/rooms/types"), "http://localhost:5000/api/rooms/types");
        assert_eq!(client.url("reservations"), "http://localhost:5000/api/reservations");
    }

    #[test]
    fn test_write_calls_reject_bad_path_segments_before_sending() {
        // Nothing listens on this port; validation must fail first
        let config = Config {
            api_url: "http://127.0.0.1:9".into(),
            ..Config::default()
        };
        let client = ApiClient::new(&config).unwrap();

        assert!(matches!(
            client.sync_channel("../admin"),
            Err(InnpulseError::Invalid(_))
        ));
        assert!(matches!(
            client.sync_channel(""),
            Err(InnpulseError::Invalid(_))
        ));
        assert!(matches!(
            client.set_reservation_status("a/b", ReservationStatus::Cancelled),
            Err(InnpulseError::Invalid(_))
        ));
        assert!(matches!(
            client.set_reservation_status("  ", ReservationStatus::Cancelled),
            Err(InnpulseError::Invalid(_))
        ));
    }

    #[test]
    fn test_hotel_param_only_when_scoped() {
        let unscoped = ApiClient::new(&Config::default()).unwrap();
        assert!(unscoped.hotel_param().is_empty());

        let scoped = ApiClient::new(&Config {
            hotel_id: Some("h9".into()),
            ..Config::default()
        })
        .unwrap();
        assert_eq!(scoped.hotel_param(), vec![("hotelId", "h9".to_string())]);
    }

    #[test]
    fn test_error_validation_details_win() {
        let body = r#"{"message":"Bad","errors":[{"path":"checkOut","msg":"must be after checkIn"}]}"#;
        assert_eq!(
            error_from_response(400, body),
            ApiError::Validation("checkOut: must be after checkIn".into())
        );
        // Validation details are reported even on other statuses
        assert!(matches!(
            error_from_response(500, body),
            ApiError::Validation(_)
        ));
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(error_from_response(401, ""), ApiError::Unauthorized);
        assert_eq!(
            error_from_response(403, r#"{"message":"Master only"}"#),
            ApiError::Forbidden("Master only".into())
        );
        assert_eq!(
            error_from_response(409, "{}"),
            ApiError::Conflict("conflicting change".into())
        );
        assert_eq!(
            error_from_response(422, "plain text failure"),
            ApiError::Validation("plain text failure".into())
        );
        assert_eq!(
            error_from_response(500, ""),
            ApiError::Status {
                status: 500,
                message: "unexpected error".into()
            }
        );
    }

    #[test]
    fn test_gateway_errors_are_network() {
        for status in [502, 503, 504] {
            let err = error_from_response(status, "");
            assert!(err.is_network(), "status {status}");
        }
        assert_eq!(
            error_from_response(503, r#"{"message":"upstream down"}"#),
            ApiError::Network("upstream down".into())
        );
        assert!(!error_from_response(500, "").is_network());
    }

    fn page(items: Vec<u32>, total: Option<u64>) -> Page<u32> {
        Page {
            items,
            total,
            pages: None,
        }
    }

    #[test]
    fn test_collect_pages_until_total() {
        let mut calls = Vec::new();
        let all = collect_pages(|p| {
            calls.push(p);
            Ok(match p {
                1 => page(vec![1, 2], Some(5)),
                2 => page(vec![3, 4], Some(5)),
                _ => page(vec![5], Some(5)),
            })
        })
        .unwrap();
        assert_eq!(all, vec![1, 2, 3, 4, 5]);
        assert_eq!(calls, vec![1, 2, 3]);
    }

    #[test]
    fn test_collect_pages_without_total_stops_after_first() {
        let all = collect_pages(|_| Ok(page(vec![1, 2], None))).unwrap();
        assert_eq!(all, vec![1, 2]);
    }

    #[test]
    fn test_collect_pages_stops_on_empty_page() {
        let all = collect_pages(|p| {
            Ok(if p == 1 {
                page(vec![1], Some(10))
            } else {
                page(vec![], Some(10))
            })
        })
        .unwrap();
        assert_eq!(all, vec![1]);
    }

    #[test]
    fn test_collect_pages_propagates_error() {
        let result = collect_pages::<u32>(|_| Err(ApiError::Unauthorized.into()));
        assert!(matches!(
            result,
            Err(InnpulseError::Api(ApiError::Unauthorized))
        ));
    }
}
