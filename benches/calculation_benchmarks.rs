//! Performance benchmarks for the travel allowance engine.
//!
//! This benchmark suite covers:
//! - Single trip calculation directly against the engine
//! - Single trip calculation through the HTTP router
//! - Period summaries of a month's worth of trips
//! - Scaling of the period summary with trip count
//!
//! Run with: `cargo bench`
//! HTML reports are generated in `target/criterion/`

use chrono::{Duration, NaiveDate};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use travel_allowance_engine::api::{AppState, create_router};
use travel_allowance_engine::calculation::{calculate_trip, submit_trip, summarize_period};
use travel_allowance_engine::config::ConfigLoader;
use travel_allowance_engine::models::{
    Destination, Meal, OvernightMode, Period, ReportingWindow, Trip, TripBuilder,
};

use axum::{body::Body, http::Request};
use rust_decimal::Decimal;
use tower::ServiceExt;

const COUNTRIES: [&str; 6] = ["Deutschland", "Schweiz", "Italien", "CZ", "Atlantis", "France"];

/// Creates a test state with loaded configuration.
fn create_test_state() -> AppState {
    let config = ConfigLoader::load("./config/at-2025").expect("Failed to load config");
    AppState::new(config)
}

/// Creates a trip; every third trip is foreign and spans several days.
fn create_trip(i: usize) -> Trip {
    let day = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap() + Duration::days((i % 28) as i64);
    let departure = day.and_hms_opt(6, 30, 0).unwrap();

    let builder = TripBuilder::new(format!("trip_{:04}", i))
        .departure(departure)
        .distance_km(Decimal::from(40 + (i % 300) as i64))
        .passengers((i % 3) as i64);

    let builder = if i % 3 == 0 {
        builder
            .destination(Destination::Foreign {
                country: COUNTRIES[i % COUNTRIES.len()].to_string(),
            })
            .return_at(departure + Duration::hours(50))
            .nights(2)
            .overnight(OvernightMode::Receipt {
                amount: Decimal::from(240),
                includes_breakfast: true,
            })
            .meal(Meal::Breakfast)
            .meal(Meal::Dinner)
    } else {
        builder.return_at(departure + Duration::hours(9 + (i % 4) as i64))
    };

    builder.build().expect("Failed to build trip")
}

fn trip_body(i: usize) -> serde_json::Value {
    serde_json::json!({
        "id": format!("trip_{:04}", i),
        "destination": { "kind": "foreign", "country": "Deutschland" },
        "departure": "2025-03-10T06:00:00",
        "return": "2025-03-12T20:00:00",
        "meals_provided": { "breakfast": true },
        "distance_km": "410",
        "passenger_count": 1,
        "nights": 2,
        "expenses": { "parking": { "amount": "24.00" } }
    })
}

/// Benchmark: Single trip through the calculators.
fn bench_single_trip(c: &mut Criterion) {
    let config = ConfigLoader::load("./config/at-2025").expect("Failed to load config");
    let trip = create_trip(0);
    let table = config.rate_table_for(trip.departure.date()).unwrap();

    c.bench_function("single_trip", |b| {
        b.iter(|| black_box(calculate_trip(black_box(&trip), table).unwrap()))
    });
}

/// Benchmark: Single trip through the HTTP router.
fn bench_single_trip_http(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let router = create_router(create_test_state());
    let body = trip_body(0).to_string();

    c.bench_function("single_trip_http", |b| {
        b.to_async(&rt).iter(|| async {
            let router = router.clone();
            let response = router
                .oneshot(
                    Request::builder()
                        .method("POST")
                        .uri("/trips/calculate")
                        .header("Content-Type", "application/json")
                        .body(Body::from(body.clone()))
                        .unwrap(),
                )
                .await
                .unwrap();
            black_box(response)
        })
    });
}

/// Benchmark: Month summary with 60 trips through the HTTP router.
fn bench_period_summary_http(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let router = create_router(create_test_state());
    let trips: Vec<serde_json::Value> = (0..60).map(trip_body).collect();
    let body = serde_json::json!({ "window": { "month": "2025-03" }, "trips": trips }).to_string();

    let mut group = c.benchmark_group("period_processing");
    group.throughput(Throughput::Elements(60));

    group.bench_function("period_summary_60", |b| {
        b.to_async(&rt).iter(|| async {
            let router = router.clone();
            let response = router
                .oneshot(
                    Request::builder()
                        .method("POST")
                        .uri("/periods/summary")
                        .header("Content-Type", "application/json")
                        .body(Body::from(body.clone()))
                        .unwrap(),
                )
                .await
                .unwrap();
            black_box(response)
        })
    });

    group.finish();
}

/// Benchmark: Various trip counts to understand scaling behavior.
fn bench_scaling(c: &mut Criterion) {
    let config = ConfigLoader::load("./config/at-2025").expect("Failed to load config");
    let window = ReportingWindow::month(2025, 3).unwrap();

    let mut group = c.benchmark_group("scaling");

    for trip_count in [1, 10, 100, 1000].iter() {
        let trips: Vec<Trip> = (0..*trip_count).map(create_trip).collect();

        group.throughput(Throughput::Elements(*trip_count as u64));
        group.bench_with_input(BenchmarkId::new("trips", trip_count), trip_count, |b, _| {
            b.iter(|| {
                let mut period = Period::new();
                for trip in &trips {
                    let table = config.rate_table_for(trip.departure.date()).unwrap();
                    submit_trip(&mut period, trip.clone(), table).unwrap();
                }
                black_box(summarize_period(&period, &window).unwrap())
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_single_trip,
    bench_single_trip_http,
    bench_period_summary_http,
    bench_scaling,
);
criterion_main!(benches);
