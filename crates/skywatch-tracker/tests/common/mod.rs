// Copyright (C) 2026 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Common test infrastructure: in-memory store and pipeline builders.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use skywatch_tracker::ingest::{IngestConfig, IngestPipeline};
use skywatch_tracker::persistence::SqliteStore;
use skywatch_tracker::zones::ZoneSet;

/// Default grace period used by tests: two minutes, as in production.
pub const TEST_GRACE: Duration = Duration::from_secs(120);

/// Fresh in-memory store with migrations applied.
pub async fn memory_store() -> Arc<SqliteStore> {
    Arc::new(SqliteStore::in_memory().await.expect("in-memory store"))
}

/// Pipeline over the given store and zones with the default retention
/// window of 10.
pub fn pipeline(store: Arc<SqliteStore>, zones: ZoneSet, grace: Duration) -> IngestPipeline {
    IngestPipeline::new(
        store,
        Arc::new(zones),
        IngestConfig {
            missing_grace: grace,
            retain_per_source: 10,
        },
    )
}
