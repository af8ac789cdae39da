// Copyright (C) 2026 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Missing-source sweep tests: exactly-once declaration, stale-window
//! bounds, per-pass caps, and re-arming.
//!
//! Sweeps are driven through `TelemetryStore::sweep_missing` with an
//! explicit horizon so the scenarios are deterministic; the worker loop in
//! `sweeper` delegates to the same call with `Utc::now()`.

mod common;

use chrono::{Duration as ChronoDuration, Utc};
use skywatch_tracker::geo::GeoPoint;
use skywatch_tracker::persistence::TelemetryStore;
use skywatch_tracker::zones::ZoneSet;

use common::{TEST_GRACE, memory_store, pipeline};

/// A wide stale window so scenario timestamps minutes in the past are
/// still honored.
fn wide_window() -> ChronoDuration {
    ChronoDuration::hours(1)
}

#[tokio::test]
async fn test_silent_source_declared_missing_exactly_once() {
    let store = memory_store().await;
    let pipeline = pipeline(store.clone(), ZoneSet::empty(), TEST_GRACE);
    let now = Utc::now();

    // Last report three minutes ago; the two-minute grace expired one
    // minute ago.
    let reported_at = now - ChronoDuration::minutes(3);
    pipeline
        .report_at(3, GeoPoint::new(-0.2, 51.6), 5.0, reported_at)
        .await
        .unwrap();

    let declared = store.sweep_missing(now, wide_window(), 300).await.unwrap();
    assert_eq!(declared, 1);

    // Disarmed, and exactly one alert queued with the last known record.
    let source = store.get_source(3).await.unwrap().unwrap();
    assert!(source.declare_missing_at.is_none());

    let pending = store.pending_missing(10).await.unwrap();
    assert_eq!(pending.len(), 1);
    let event = &pending[0].1;
    assert_eq!(event.source_id, 3);
    assert!((event.event_timestamp - reported_at).num_milliseconds().abs() < 1);
    assert_eq!(event.longitude, -0.2);
    assert_eq!(event.speed_mps, 5.0);
}

#[tokio::test]
async fn test_immediate_second_sweep_is_a_noop() {
    let store = memory_store().await;
    let pipeline = pipeline(store.clone(), ZoneSet::empty(), TEST_GRACE);
    let now = Utc::now();

    for source_id in 1..=4 {
        pipeline
            .report_at(
                source_id,
                GeoPoint::new(0.0, 0.0),
                1.0,
                now - ChronoDuration::minutes(3),
            )
            .await
            .unwrap();
    }

    assert_eq!(store.sweep_missing(now, wide_window(), 300).await.unwrap(), 4);
    assert_eq!(store.sweep_missing(now, wide_window(), 300).await.unwrap(), 0);
    assert_eq!(store.pending_missing(10).await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_healthy_sources_are_not_swept() {
    let store = memory_store().await;
    let pipeline = pipeline(store.clone(), ZoneSet::empty(), TEST_GRACE);
    let now = Utc::now();

    // Fresh report: deadline two minutes in the future.
    pipeline
        .report_at(12, GeoPoint::new(1.0, 2.0), 1.0, now)
        .await
        .unwrap();

    assert_eq!(store.sweep_missing(now, wide_window(), 300).await.unwrap(), 0);
    assert!(store.get_source(12).await.unwrap().unwrap().declare_missing_at.is_some());
}

#[tokio::test]
async fn test_stale_window_abandons_old_expiries() {
    let store = memory_store().await;
    let pipeline = pipeline(store.clone(), ZoneSet::empty(), TEST_GRACE);
    let now = Utc::now();

    // Deadline expired eight minutes ago, far outside a 500 ms window:
    // treated as handled by a prior degraded run.
    pipeline
        .report_at(13, GeoPoint::new(0.0, 0.0), 1.0, now - ChronoDuration::minutes(10))
        .await
        .unwrap();

    let declared = store
        .sweep_missing(now, ChronoDuration::milliseconds(500), 300)
        .await
        .unwrap();
    assert_eq!(declared, 0);

    // The deadline stays armed and no alert is queued.
    assert!(store.get_source(13).await.unwrap().unwrap().declare_missing_at.is_some());
    assert!(store.pending_missing(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_max_per_pass_bounds_each_cycle() {
    let store = memory_store().await;
    let pipeline = pipeline(store.clone(), ZoneSet::empty(), TEST_GRACE);
    let now = Utc::now();

    for source_id in 1..=5 {
        pipeline
            .report_at(
                source_id,
                GeoPoint::new(0.0, 0.0),
                1.0,
                now - ChronoDuration::minutes(3),
            )
            .await
            .unwrap();
    }

    // Bounded progress: 2 + 2 + 1, then nothing left.
    assert_eq!(store.sweep_missing(now, wide_window(), 2).await.unwrap(), 2);
    assert_eq!(store.sweep_missing(now, wide_window(), 2).await.unwrap(), 2);
    assert_eq!(store.sweep_missing(now, wide_window(), 2).await.unwrap(), 1);
    assert_eq!(store.sweep_missing(now, wide_window(), 2).await.unwrap(), 0);
    assert_eq!(store.pending_missing(10).await.unwrap().len(), 5);
}

#[tokio::test]
async fn test_missing_event_carries_latest_live_record() {
    let store = memory_store().await;
    let pipeline = pipeline(store.clone(), ZoneSet::empty(), TEST_GRACE);
    let now = Utc::now();

    let first = now - ChronoDuration::minutes(5);
    let second = now - ChronoDuration::minutes(3);
    pipeline
        .report_at(5, GeoPoint::new(10.0, 10.0), 1.0, first)
        .await
        .unwrap();
    pipeline
        .report_at(5, GeoPoint::new(11.0, 11.0), 2.0, second)
        .await
        .unwrap();

    assert_eq!(store.sweep_missing(now, wide_window(), 300).await.unwrap(), 1);

    let pending = store.pending_missing(10).await.unwrap();
    let event = &pending[0].1;
    assert!((event.event_timestamp - second).num_milliseconds().abs() < 1);
    assert_eq!(event.longitude, 11.0);
    assert_eq!(event.latitude, 11.0);
    assert_eq!(event.speed_mps, 2.0);
}

#[tokio::test]
async fn test_reingest_rearms_missing_eligibility() {
    let store = memory_store().await;
    let pipeline = pipeline(store.clone(), ZoneSet::empty(), TEST_GRACE);
    let now = Utc::now();

    pipeline
        .report_at(3, GeoPoint::new(0.0, 0.0), 1.0, now - ChronoDuration::minutes(3))
        .await
        .unwrap();
    assert_eq!(store.sweep_missing(now, wide_window(), 300).await.unwrap(), 1);

    // The source comes back: its deadline is re-armed, and a later silence
    // makes it go missing again. "Missing" is recurring, not terminal.
    pipeline
        .report_at(3, GeoPoint::new(0.5, 0.5), 1.0, now)
        .await
        .unwrap();
    assert!(store.get_source(3).await.unwrap().unwrap().declare_missing_at.is_some());

    let later = now + ChronoDuration::minutes(3);
    assert_eq!(store.sweep_missing(later, wide_window(), 300).await.unwrap(), 1);
    assert_eq!(store.pending_missing(10).await.unwrap().len(), 2);
}
