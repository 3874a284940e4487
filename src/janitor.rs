// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Janitor
//!
//! Background task that keeps the document store and blob store in step.
//!
//! Every `interval` (default 300 s) the janitor:
//! 1. Backfills zeroed scorecards for players that lack one.
//! 2. Deletes avatar blobs that no player references and that are older than
//!    [`ORPHAN_GRACE_SECS`], so uploads still waiting for their reference swap
//!    survive. Temp files and sidecar-less bytes from interrupted uploads are
//!    removed under the same age rule.
//!
//! The startup pass is run by `main` through [`sweep`] before the listener
//! is bound; [`Janitor::run`] waits one interval before its first sweep.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken`; the loop exits at the next
//! await point after the token is cancelled.

use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::state::AppState;

/// Minimum age, in seconds, of an unreferenced blob before it is collected.
pub const ORPHAN_GRACE_SECS: i64 = 60;

/// Counts from one maintenance sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub scorecards_repaired: usize,
    pub avatars_removed: usize,
}

pub struct Janitor {
    state: AppState,
    interval: Duration,
}

impl Janitor {
    pub fn new(state: AppState, interval: Duration) -> Self {
        Self { state, interval }
    }

    /// Run until `shutdown` is cancelled.
    ///
    /// ```rust,ignore
    /// tokio::spawn(janitor.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            "Storage janitor starting"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Storage janitor shutting down");
                    return;
                }
            }

            let state = self.state.clone();
            match tokio::task::spawn_blocking(move || sweep(&state)).await {
                Ok(report) => {
                    if report != SweepReport::default() {
                        info!(
                            scorecards_repaired = report.scorecards_repaired,
                            avatars_removed = report.avatars_removed,
                            "Storage janitor: sweep finished"
                        );
                    }
                }
                Err(e) => warn!(error = %e, "Storage janitor: sweep task failed"),
            }
        }
    }
}

/// One maintenance pass. Failures are logged and the other step still runs.
pub fn sweep(state: &AppState) -> SweepReport {
    let accounts = state.accounts();
    let mut report = SweepReport::default();

    match accounts.repair_missing_scorecards() {
        Ok(n) => report.scorecards_repaired = n,
        Err(e) => warn!(error = %e, "Storage janitor: scorecard repair failed"),
    }

    let cutoff = Utc::now() - chrono::Duration::seconds(ORPHAN_GRACE_SECS);
    match accounts.sweep_orphaned_avatars(cutoff) {
        Ok(n) => report.avatars_removed = n,
        Err(e) => warn!(error = %e, "Storage janitor: avatar sweep failed"),
    }

    report
}
