// Copyright (C) 2026 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Ingest pipeline tests: bounded retention, geofence alerts, validation,
//! and all-or-nothing commits.

mod common;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use skywatch_tracker::error::Error;
use skywatch_tracker::geo::GeoPoint;
use skywatch_tracker::persistence::TelemetryStore;
use skywatch_tracker::zones::{ProtectedZone, ZoneSet};

use common::{TEST_GRACE, memory_store, pipeline};

fn close_to(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    (a - b).num_milliseconds().abs() < 1
}

#[tokio::test]
async fn test_eleventh_ingest_migrates_the_oldest_record() {
    let store = memory_store().await;
    let pipeline = pipeline(store.clone(), ZoneSet::empty(), TEST_GRACE);
    let base = Utc::now();

    for i in 0..11 {
        let outcome = pipeline
            .report_at(
                1,
                GeoPoint::new(-0.1436, 51.4997),
                3.0,
                base + ChronoDuration::seconds(i),
            )
            .await
            .unwrap();
        // The first ten ingests fit in the window; only the eleventh
        // pushes one record out.
        assert_eq!(outcome.migrated, u64::from(i == 10));
    }

    let live = store.live_history(1, 100).await.unwrap();
    assert_eq!(live.len(), 10);
    assert_eq!(store.archived_count(1).await.unwrap(), 1);

    // Newest first; the oldest surviving record is the second ingest.
    assert!(close_to(
        live[0].event_timestamp,
        base + ChronoDuration::seconds(10)
    ));
    assert!(close_to(
        live[9].event_timestamp,
        base + ChronoDuration::seconds(1)
    ));
}

#[tokio::test]
async fn test_ledger_stays_bounded_over_many_ingests() {
    let store = memory_store().await;
    let pipeline = pipeline(store.clone(), ZoneSet::empty(), TEST_GRACE);
    let base = Utc::now();

    for i in 0..25 {
        pipeline
            .report_at(
                2,
                GeoPoint::new(0.5, 42.0),
                1.0,
                base + ChronoDuration::seconds(i),
            )
            .await
            .unwrap();
    }

    // Live holds at most K records; everything older was moved, not lost.
    assert_eq!(store.live_history(2, 100).await.unwrap().len(), 10);
    assert_eq!(store.archived_count(2).await.unwrap(), 15);
}

#[tokio::test]
async fn test_no_migration_below_the_retention_window() {
    let store = memory_store().await;
    let pipeline = pipeline(store.clone(), ZoneSet::empty(), TEST_GRACE);
    let base = Utc::now();

    for i in 0..10 {
        pipeline
            .report_at(
                6,
                GeoPoint::new(1.0, 1.0),
                0.0,
                base + ChronoDuration::seconds(i),
            )
            .await
            .unwrap();
    }

    assert_eq!(store.live_history(6, 100).await.unwrap().len(), 10);
    assert_eq!(store.archived_count(6).await.unwrap(), 0);
}

#[tokio::test]
async fn test_report_outside_all_reference_zones() {
    let store = memory_store().await;
    let pipeline = pipeline(store.clone(), ZoneSet::reference(), TEST_GRACE);

    let outcome = pipeline
        .report(7, GeoPoint::new(-0.1436, 51.4997), 4.0)
        .await
        .unwrap();

    assert!(outcome.incursions.is_empty());
    assert!(store.pending_incursions(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_report_at_zone_center_emits_one_incursion() {
    let store = memory_store().await;
    let pipeline = pipeline(store.clone(), ZoneSet::reference(), TEST_GRACE);

    let outcome = pipeline
        .report(8, GeoPoint::new(-0.1436013, 51.5013606), 4.0)
        .await
        .unwrap();

    assert_eq!(outcome.incursions.len(), 1);
    let incursion = &outcome.incursions[0];
    assert_eq!(incursion.zone_name, "Buckingham Palace");
    assert!(incursion.distance_m < 1.0);

    // The alert was queued in the same transaction as the record.
    let pending = store.pending_incursions(10).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].1, *incursion);
}

#[tokio::test]
async fn test_overlapping_zones_emit_one_alert_each() {
    let center = GeoPoint::new(12.0, 47.0);
    let zones = ZoneSet::new(vec![
        ProtectedZone {
            name: "site".to_string(),
            center,
            radius_m: 300.0,
        },
        ProtectedZone {
            name: "perimeter".to_string(),
            center,
            radius_m: 2000.0,
        },
    ]);
    let store = memory_store().await;
    let pipeline = pipeline(store.clone(), zones, TEST_GRACE);

    let outcome = pipeline.report(9, center, 2.0).await.unwrap();

    assert_eq!(outcome.incursions.len(), 2);
    assert_eq!(store.pending_incursions(10).await.unwrap().len(), 2);
    for incursion in &outcome.incursions {
        assert!(incursion.distance_m < 300.0);
    }
}

#[tokio::test]
async fn test_invalid_input_leaves_no_state() {
    let store = memory_store().await;
    let pipeline = pipeline(store.clone(), ZoneSet::reference(), TEST_GRACE);

    let err = pipeline
        .report(0, GeoPoint::new(0.0, 0.0), 1.0)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput { field: "source_id", .. }));

    let err = pipeline
        .report(9, GeoPoint::new(f64::NAN, 0.0), 1.0)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput { field: "longitude", .. }));

    let err = pipeline
        .report(9, GeoPoint::new(0.0, 0.0), -1.0)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput { field: "speed_mps", .. }));

    // Rejected before any state change.
    assert!(store.get_source(9).await.unwrap().is_none());
    assert!(store.live_history(9, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_extreme_speed_is_accepted() {
    let store = memory_store().await;
    let pipeline = pipeline(store.clone(), ZoneSet::empty(), TEST_GRACE);

    let outcome = pipeline
        .report(11, GeoPoint::new(5.0, 5.0), 900_000.0)
        .await
        .unwrap();
    assert_eq!(outcome.record.speed_mps, 900_000.0);
}

#[tokio::test]
async fn test_every_ingest_refreshes_the_deadline() {
    let store = memory_store().await;
    let pipeline = pipeline(store.clone(), ZoneSet::empty(), TEST_GRACE);
    let t1 = Utc::now();

    pipeline
        .report_at(2, GeoPoint::new(0.0, 0.0), 1.0, t1)
        .await
        .unwrap();
    let source = store.get_source(2).await.unwrap().unwrap();
    assert!(close_to(
        source.declare_missing_at.unwrap(),
        t1 + ChronoDuration::seconds(120)
    ));

    let t2 = t1 + ChronoDuration::seconds(30);
    pipeline
        .report_at(2, GeoPoint::new(0.1, 0.1), 1.0, t2)
        .await
        .unwrap();
    let source = store.get_source(2).await.unwrap().unwrap();
    assert!(close_to(
        source.declare_missing_at.unwrap(),
        t2 + ChronoDuration::seconds(120)
    ));
}

#[tokio::test]
async fn test_duplicate_timestamp_rolls_back_whole_ingest() {
    let store = memory_store().await;
    let pipeline = pipeline(store.clone(), ZoneSet::empty(), TEST_GRACE);
    let t = Utc::now();

    pipeline
        .report_at(4, GeoPoint::new(0.0, 0.0), 1.0, t)
        .await
        .unwrap();

    // Same composite key again: the ledger insert fails, and the deadline
    // upsert that preceded it in the unit must roll back too.
    let err = pipeline
        .report_at(4, GeoPoint::new(9.0, 9.0), 99.0, t)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::StoreUnavailable(_)));

    let live = store.live_history(4, 10).await.unwrap();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].longitude, 0.0);

    let source = store.get_source(4).await.unwrap().unwrap();
    assert!(close_to(
        source.declare_missing_at.unwrap(),
        t + ChronoDuration::seconds(120)
    ));
}
