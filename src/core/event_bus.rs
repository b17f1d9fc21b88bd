// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/greenhouse-rs

//! Event bus for handing cycle snapshots to renderers

use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;

use super::CycleReport;

/// Central event bus for pub/sub communication
pub struct EventBus {
    report_tx: broadcast::Sender<CycleReport>,
    published: AtomicU64,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (report_tx, _) = broadcast::channel(capacity);

        Self {
            report_tx,
            published: AtomicU64::new(0),
        }
    }

    /// Snapshots are dropped silently when nobody is listening
    pub fn publish_report(&self, report: CycleReport) {
        self.published.fetch_add(1, Ordering::Relaxed);
        let _ = self.report_tx.send(report);
    }

    pub fn subscribe_reports(&self) -> broadcast::Receiver<CycleReport> {
        self.report_tx.subscribe()
    }

    /// Reports published so far, listened to or not
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}
