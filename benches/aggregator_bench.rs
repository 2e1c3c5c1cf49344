//! Criterion benchmarks for revenue aggregation

use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use innpulse::services::Aggregator;
use innpulse::types::{ReportWindow, Reservation, ReservationStatus};

const CHANNELS: &[&str] = &["direct", "booking", "expedia", "airbnb", "phone", "walk-in"];

/// Deterministic spread of stays around the benchmark month
fn synthetic_reservations(count: usize) -> Vec<Reservation> {
    let base = NaiveDate::from_ymd_opt(2024, 4, 20).unwrap_or_default();
    (0..count)
        .map(|i| {
            let check_in = base + Duration::days((i * 7 % 45) as i64);
            let nights = (i % 9) as i64;
            Reservation {
                id: format!("r{}", i),
                guest_name: format!("Guest {}", i),
                check_in,
                check_out: check_in + Duration::days(nights),
                rooms: (i % 3) as u32 + 1,
                total_price: 450.0 + (i % 17) as f64 * 37.5,
                deposit_amount: 0.0,
                channel: CHANNELS[i % CHANNELS.len()].to_string(),
                status: if i % 11 == 0 {
                    ReservationStatus::Cancelled
                } else {
                    ReservationStatus::Confirmed
                },
                payments: Vec::new(),
            }
        })
        .collect()
}

fn bench_revenue(c: &mut Criterion) {
    let today = NaiveDate::from_ymd_opt(2024, 5, 28).unwrap_or_default();
    let window = ReportWindow::month_to_date(today);

    let mut group = c.benchmark_group("aggregator");
    for count in [1_000usize, 10_000, 100_000] {
        let reservations = synthetic_reservations(count);
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(
            BenchmarkId::new("revenue", count),
            &reservations,
            |b, res| {
                b.iter(|| Aggregator::revenue(black_box(res), window, 120));
            },
        );

        group.bench_with_input(
            BenchmarkId::new("daily_series", count),
            &reservations,
            |b, res| {
                b.iter(|| Aggregator::daily_series(black_box(res), window));
            },
        );
    }
    group.finish();
}

fn bench_channel_mix(c: &mut Criterion) {
    let reservations = synthetic_reservations(10_000);

    let mut group = c.benchmark_group("aggregator");
    group.throughput(Throughput::Elements(reservations.len() as u64));
    group.bench_function("channel_mix", |b| {
        b.iter(|| Aggregator::channel_mix(black_box(&reservations), 8));
    });
    group.finish();
}

criterion_group!(benches, bench_revenue, bench_channel_mix);
criterion_main!(benches);
