// Copyright (C) 2026 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Alert sink backends.
//!
//! The sink owns delivery semantics once an event crosses the boundary:
//! at-least-once, unordered across sources. The relay delivers first and
//! confirms afterwards, so a sink implementation must tolerate duplicates.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::Serialize;
use tokio::io::AsyncWriteExt;

use crate::error::Result;
use crate::events::{IncursionEvent, MissingEvent};

/// Destination for geofence-incursion and missing-source events.
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Deliver one incursion event.
    async fn deliver_incursion(&self, event: &IncursionEvent) -> Result<()>;

    /// Deliver one missing-source event.
    async fn deliver_missing(&self, event: &MissingEvent) -> Result<()>;
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum AlertLine<'a> {
    Incursion(&'a IncursionEvent),
    Missing(&'a MissingEvent),
}

/// Append-only JSONL file sink: one JSON object per line, tagged by kind.
pub struct JsonlAlertSink {
    file: tokio::sync::Mutex<tokio::fs::File>,
}

impl JsonlAlertSink {
    /// Open (or create) the alert log at `path` for appending.
    ///
    /// Parent directories are created if needed.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        Ok(Self {
            file: tokio::sync::Mutex::new(file),
        })
    }

    async fn write_line(&self, line: &AlertLine<'_>) -> Result<()> {
        let mut buf = serde_json::to_vec(line)?;
        buf.push(b'\n');
        let mut file = self.file.lock().await;
        file.write_all(&buf).await?;
        file.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl AlertSink for JsonlAlertSink {
    async fn deliver_incursion(&self, event: &IncursionEvent) -> Result<()> {
        self.write_line(&AlertLine::Incursion(event)).await
    }

    async fn deliver_missing(&self, event: &MissingEvent) -> Result<()> {
        self.write_line(&AlertLine::Missing(event)).await
    }
}

/// In-memory sink for tests: records every delivered event.
#[derive(Default)]
pub struct MemoryAlertSink {
    incursions: Mutex<Vec<IncursionEvent>>,
    missing: Mutex<Vec<MissingEvent>>,
}

impl MemoryAlertSink {
    /// Create an empty memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// All incursion events delivered so far.
    pub fn incursions(&self) -> Vec<IncursionEvent> {
        self.incursions.lock().unwrap().clone()
    }

    /// All missing-source events delivered so far.
    pub fn missing(&self) -> Vec<MissingEvent> {
        self.missing.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlertSink for MemoryAlertSink {
    async fn deliver_incursion(&self, event: &IncursionEvent) -> Result<()> {
        self.incursions.lock().unwrap().push(event.clone());
        Ok(())
    }

    async fn deliver_missing(&self, event: &MissingEvent) -> Result<()> {
        self.missing.lock().unwrap().push(event.clone());
        Ok(())
    }
}
