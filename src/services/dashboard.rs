//! Dashboard loading: fetch room inventory and reservations, then aggregate

use std::collections::HashSet;

use chrono::{Duration, NaiveDate};
use tracing::{debug, info, warn};

use super::aggregator::{round_currency, Aggregator};
use super::cache::SnapshotCacheService;
use crate::api::dto::{number, OverviewDto, ReservationDto};
use crate::api::{ApiClient, ReservationQuery};
use crate::types::{
    Dashboard, DashboardKpi, DashboardSource, NightlyRevenueShare, ReportWindow, Reservation,
    Result, RoomType,
};

/// Channels shown in the distribution panel
pub const TOP_CHANNELS: usize = 8;
/// Rows shown in the arrival and departure lists
pub const FRONT_DESK_ROWS: usize = 6;
/// Days of history behind the channel distribution
pub const CHANNEL_LOOKBACK_DAYS: i64 = 30;

/// Read-only view of the backend the dashboard needs
pub trait HotelBackend {
    fn room_types(&self) -> Result<Vec<RoomType>>;

    fn dashboard_overview(&self, from: NaiveDate, to: NaiveDate) -> Option<OverviewDto>;

    fn fetch_all_reservations(&self, query: &ReservationQuery) -> Result<Vec<Reservation>>;
}

impl HotelBackend for ApiClient {
    fn room_types(&self) -> Result<Vec<RoomType>> {
        ApiClient::room_types(self)
    }

    fn dashboard_overview(&self, from: NaiveDate, to: NaiveDate) -> Option<OverviewDto> {
        ApiClient::dashboard_overview(self, from, to)
    }

    fn fetch_all_reservations(&self, query: &ReservationQuery) -> Result<Vec<Reservation>> {
        ApiClient::fetch_all_reservations(self, query)
    }
}

/// Progress reported while a dashboard loads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStage {
    Connecting,
    Fetching,
    Aggregating,
}

/// Confirmed reservations for each window the dashboard reads
#[derive(Debug, Default)]
pub struct WindowLists {
    pub month: Vec<Reservation>,
    pub week: Vec<Reservation>,
    pub last30: Vec<Reservation>,
    pub today: Vec<Reservation>,
}

pub struct DashboardService<'a, B> {
    backend: &'a B,
}

impl<'a, B: HotelBackend + Sync> DashboardService<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// Load the dashboard for `today`
    ///
    /// Uses the backend's pre-aggregated overview when it exists, otherwise
    /// fetches the reservation windows in parallel and aggregates locally.
    pub fn load(&self, today: NaiveDate, on_stage: impl Fn(LoadStage)) -> Result<Dashboard> {
        on_stage(LoadStage::Connecting);
        let total_rooms: u32 = self
            .backend
            .room_types()?
            .iter()
            .map(|rt| rt.total_rooms)
            .sum();
        debug!(total_rooms, "room inventory loaded");

        let month = ReportWindow::month_to_date(today);
        if let Some(overview) = self.backend.dashboard_overview(month.start, today) {
            info!("using backend dashboard overview");
            return Ok(from_overview(overview, today, total_rooms));
        }

        on_stage(LoadStage::Fetching);
        let lists = self.fetch_windows(today)?;

        on_stage(LoadStage::Aggregating);
        Ok(compose(today, total_rooms, lists))
    }

    /// Like [`load`](Self::load), but falls back to the last saved snapshot
    /// when the backend cannot be reached, and refreshes the snapshot on success
    pub fn load_or_cached(
        &self,
        today: NaiveDate,
        cache: Option<&SnapshotCacheService>,
        scope: &str,
        on_stage: impl Fn(LoadStage),
    ) -> Result<Dashboard> {
        match self.load(today, on_stage) {
            Ok(dashboard) => {
                if let Some(cache) = cache {
                    if let Err(e) = cache.save(scope, &dashboard) {
                        warn!(error = %e, "failed to save dashboard snapshot");
                    }
                }
                Ok(dashboard)
            }
            Err(e) if e.is_network() => match cache.map(|c| c.load(scope)) {
                Some(Ok(Some(snapshot))) => {
                    warn!(
                        error = %e,
                        saved_at = %snapshot.updated_at,
                        "backend unreachable, showing saved snapshot"
                    );
                    let mut dashboard = snapshot.dashboard;
                    dashboard.source = DashboardSource::Cached {
                        saved_at: snapshot.updated_at,
                    };
                    Ok(dashboard)
                }
                _ => Err(e),
            },
            Err(e) => Err(e),
        }
    }

    fn fetch_windows(&self, today: NaiveDate) -> Result<WindowLists> {
        let fetch = |window: ReportWindow| {
            self.backend
                .fetch_all_reservations(&ReservationQuery::confirmed(window))
        };

        let ((month, week), (last30, tonight)) = rayon::join(
            || {
                rayon::join(
                    || fetch(ReportWindow::month_to_date(today)),
                    || fetch(ReportWindow::trailing_days(today, 7)),
                )
            },
            || {
                rayon::join(
                    || fetch(last30_window(today)),
                    || fetch(ReportWindow::single_day(today)),
                )
            },
        );

        Ok(WindowLists {
            month: month?,
            week: week?,
            last30: last30?,
            today: tonight?,
        })
    }
}

fn last30_window(today: NaiveDate) -> ReportWindow {
    ReportWindow::inclusive(today - Duration::days(CHANNEL_LOOKBACK_DAYS), today)
}

/// Build the dashboard from already-fetched reservation windows
pub fn compose(today: NaiveDate, total_rooms: u32, lists: WindowLists) -> Dashboard {
    let mtd = Aggregator::revenue(&lists.month, ReportWindow::month_to_date(today), total_rooms);
    let week_series = Aggregator::daily_series(&lists.week, ReportWindow::trailing_days(today, 7));
    let channels = Aggregator::channel_mix(&lists.last30, TOP_CHANNELS);

    // Departures checked out today may not overlap today's night, so the
    // front desk also looks at the trailing week.
    let pool = merge_unique(lists.today, lists.week);
    let mut desk = Aggregator::front_desk(&pool, today);
    desk.arrivals.truncate(FRONT_DESK_ROWS);
    desk.departures.truncate(FRONT_DESK_ROWS);

    Dashboard {
        today,
        kpi: DashboardKpi {
            in_house: desk.in_house,
            arrivals: desk.arrival_rooms,
            departures: desk.departure_rooms,
            mtd_revenue: mtd.revenue,
            mtd_adr: mtd.adr,
            mtd_revpar: mtd.revpar,
            occupancy_today: Aggregator::occupancy_pct(desk.in_house, total_rooms),
            total_rooms,
        },
        week_series,
        channels,
        arrivals: desk.arrivals,
        departures: desk.departures,
        source: DashboardSource::Computed,
    }
}

fn from_overview(overview: OverviewDto, today: NaiveDate, total_rooms: u32) -> Dashboard {
    let week_series = ReportWindow::trailing_days(today, 7)
        .iter_days()
        .zip(overview.week_series.iter())
        .map(|(date, value)| NightlyRevenueShare {
            date,
            amount: number(Some(value))
                .map(round_currency)
                .unwrap_or(0),
        })
        .collect();

    let lines = |dtos: Vec<ReservationDto>| -> Vec<Reservation> {
        dtos.into_iter()
            .filter_map(|d| d.into_reservation())
            .take(FRONT_DESK_ROWS)
            .collect()
    };

    Dashboard {
        today,
        kpi: overview.kpi.unwrap_or_default().into_kpi(total_rooms),
        week_series,
        channels: overview
            .channels
            .into_iter()
            .map(Into::into)
            .take(TOP_CHANNELS)
            .collect(),
        arrivals: lines(overview.arrivals_today),
        departures: lines(overview.departures_today),
        source: DashboardSource::Overview,
    }
}

/// Concatenate two lists, dropping repeats of the same reservation id
fn merge_unique(first: Vec<Reservation>, second: Vec<Reservation>) -> Vec<Reservation> {
    let mut seen = HashSet::new();
    first
        .into_iter()
        .chain(second)
        .filter(|r| r.id.is_empty() || seen.insert(r.id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ApiError, ReservationStatus};
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn stay(id: &str, check_in: NaiveDate, check_out: NaiveDate, total: f64) -> Reservation {
        Reservation {
            id: id.into(),
            guest_name: format!("Guest {}", id),
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

    /// In-memory backend that filters a fixed reservation list by overlap
    struct FakeBackend {
        rooms: u32,
        overview: Option<serde_json::Value>,
        reservations: Vec<Reservation>,
        offline: bool,
        /// HTTP status every room-type request fails with
        fail_status: Option<u16>,
        queries: Mutex<Vec<ReservationQuery>>,
    }

    impl FakeBackend {
        fn new(rooms: u32, reservations: Vec<Reservation>) -> Self {
            Self {
                rooms,
                overview: None,
                reservations,
                offline: false,
                fail_status: None,
                queries: Mutex::new(Vec::new()),
            }
        }
    }

    impl HotelBackend for FakeBackend {
        fn room_types(&self) -> Result<Vec<RoomType>> {
            if self.offline {
                return Err(ApiError::Network("connection refused".into()).into());
            }
            if let Some(status) = self.fail_status {
                return Err(crate::api::error_from_response(status, "").into());
            }
            Ok(vec![RoomType {
                id: "rt".into(),
                name: "Standard".into(),
                code: "STD".into(),
                total_rooms: self.rooms,
            }])
        }

        fn dashboard_overview(&self, _from: NaiveDate, _to: NaiveDate) -> Option<OverviewDto> {
            self.overview
                .clone()
                .map(|v| serde_json::from_value(v).unwrap())
        }

        fn fetch_all_reservations(&self, query: &ReservationQuery) -> Result<Vec<Reservation>> {
            self.queries.lock().unwrap().push(query.clone());
            let (start, end) = (query.start.unwrap(), query.end.unwrap());
            Ok(self
                .reservations
                .iter()
                .filter(|r| r.check_in <= end && r.check_out > start)
                .cloned()
                .collect())
        }
    }

    #[test]
    fn test_load_computes_locally() {
        let today = date(2024, 5, 10);
        let backend = FakeBackend::new(
            10,
            vec![
                stay("a", date(2024, 5, 8), date(2024, 5, 12), 400.0), // in house
                stay("b", date(2024, 5, 10), date(2024, 5, 11), 150.0), // arriving
                stay("c", date(2024, 5, 7), date(2024, 5, 10), 300.0), // departing
            ],
        );

        let dashboard = DashboardService::new(&backend)
            .load(today, |_| {})
            .unwrap();

        assert_eq!(dashboard.source, DashboardSource::Computed);
        assert_eq!(dashboard.kpi.total_rooms, 10);
        assert_eq!(dashboard.kpi.in_house, 2);
        assert_eq!(dashboard.kpi.arrivals, 1);
        assert_eq!(dashboard.kpi.departures, 1);
        assert_eq!(dashboard.kpi.occupancy_today, 20);
        // MTD window is May 1-10: a=3 nights (300), b=1 (150), c=3 (300)
        assert_eq!(dashboard.kpi.mtd_revenue, 750.0);
        assert_eq!(dashboard.kpi.mtd_adr, 750.0 / 7.0);
        assert_eq!(dashboard.kpi.mtd_revpar, 7.5);
        assert_eq!(dashboard.week_series.len(), 7);
        assert_eq!(dashboard.week_series[6].date, today);
        assert_eq!(dashboard.week_series[6].amount, 250);
        assert_eq!(dashboard.departures[0].id, "c");
        assert_eq!(backend.queries.lock().unwrap().len(), 4);
    }

    #[test]
    fn test_load_prefers_overview() {
        let today = date(2024, 5, 10);
        let mut backend = FakeBackend::new(20, vec![]);
        backend.overview = Some(serde_json::json!({
            "kpi": { "inhouse": 7, "mtdRevenue": 1234.5, "occToday": 35 },
            "weekSeries": [10, 20, 30, 40, 50, 60, 70.5],
            "channels": [{ "label": "booking", "value": 4 }],
            "arrivalsToday": [{ "_id": "x", "checkIn": "2024-05-10", "checkOut": "2024-05-12" }]
        }));

        let dashboard = DashboardService::new(&backend)
            .load(today, |_| {})
            .unwrap();

        assert_eq!(dashboard.source, DashboardSource::Overview);
        assert_eq!(dashboard.kpi.in_house, 7);
        assert_eq!(dashboard.kpi.total_rooms, 20);
        assert_eq!(dashboard.week_series[6].amount, 70);
        assert_eq!(dashboard.channels[0].value, 4);
        assert_eq!(dashboard.arrivals.len(), 1);
        assert!(backend.queries.lock().unwrap().is_empty());
    }

    #[test]
    fn test_load_reports_stages_in_order() {
        let backend = FakeBackend::new(5, vec![]);
        let stages = Mutex::new(Vec::new());

        DashboardService::new(&backend)
            .load(date(2024, 5, 10), |s| stages.lock().unwrap().push(s))
            .unwrap();

        assert_eq!(
            stages.into_inner().unwrap(),
            vec![
                LoadStage::Connecting,
                LoadStage::Fetching,
                LoadStage::Aggregating
            ]
        );
    }

    #[test]
    fn test_offline_uses_snapshot() {
        let dir = TempDir::new().unwrap();
        let cache = SnapshotCacheService::with_cache_dir(dir.path().to_path_buf());
        let today = date(2024, 5, 10);

        let online = FakeBackend::new(4, vec![stay("a", date(2024, 5, 9), date(2024, 5, 11), 200.0)]);
        let fresh = DashboardService::new(&online)
            .load_or_cached(today, Some(&cache), "h1", |_| {})
            .unwrap();
        assert_eq!(fresh.source, DashboardSource::Computed);

        let mut offline = FakeBackend::new(4, vec![]);
        offline.offline = true;
        let replayed = DashboardService::new(&offline)
            .load_or_cached(today, Some(&cache), "h1", |_| {})
            .unwrap();

        let saved = cache.load("h1").unwrap().unwrap().updated_at;
        assert_eq!(replayed.source, DashboardSource::Cached { saved_at: saved });
        assert_eq!(replayed.kpi, fresh.kpi);
    }

    #[test]
    fn test_offline_without_snapshot_errors() {
        let dir = TempDir::new().unwrap();
        let cache = SnapshotCacheService::with_cache_dir(dir.path().to_path_buf());
        let mut offline = FakeBackend::new(4, vec![]);
        offline.offline = true;

        let result = DashboardService::new(&offline).load_or_cached(
            date(2024, 5, 10),
            Some(&cache),
            "h1",
            |_| {},
        );

        assert!(result.unwrap_err().is_network());
    }

    #[test]
    fn test_gateway_failure_uses_snapshot_but_auth_failure_does_not() {
        let dir = TempDir::new().unwrap();
        let cache = SnapshotCacheService::with_cache_dir(dir.path().to_path_buf());
        let today = date(2024, 5, 10);
        let online = FakeBackend::new(4, vec![]);
        DashboardService::new(&online)
            .load_or_cached(today, Some(&cache), "h1", |_| {})
            .unwrap();

        let mut gateway = FakeBackend::new(4, vec![]);
        gateway.fail_status = Some(503);
        let replayed = DashboardService::new(&gateway)
            .load_or_cached(today, Some(&cache), "h1", |_| {})
            .unwrap();
        assert!(matches!(replayed.source, DashboardSource::Cached { .. }));

        let mut expired = FakeBackend::new(4, vec![]);
        expired.fail_status = Some(401);
        let result = DashboardService::new(&expired).load_or_cached(today, Some(&cache), "h1", |_| {});
        assert!(matches!(
            result,
            Err(crate::types::InnpulseError::Api(ApiError::Unauthorized))
        ));
    }

    #[test]
    fn test_merge_unique_dedupes_by_id() {
        let d = date(2024, 5, 1);
        let e = date(2024, 5, 2);
        let merged = merge_unique(
            vec![stay("a", d, e, 1.0), stay("", d, e, 1.0)],
            vec![stay("a", d, e, 1.0), stay("b", d, e, 1.0), stay("", d, e, 1.0)],
        );
        let ids: Vec<&str> = merged.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "", "b", ""]);
    }

    #[test]
    fn test_compose_caps_front_desk_lists() {
        let today = date(2024, 5, 10);
        let arrivals: Vec<Reservation> = (0..9)
            .map(|i| stay(&format!("r{}", i), today, date(2024, 5, 11), 100.0))
            .collect();
        let lists = WindowLists {
            today: arrivals,
            ..Default::default()
        };

        let dashboard = compose(today, 10, lists);

        assert_eq!(dashboard.arrivals.len(), FRONT_DESK_ROWS);
        assert_eq!(dashboard.kpi.arrivals, 9);
    }
}
