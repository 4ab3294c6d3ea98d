//! Event catch-up: backfill goal/card/substitution lists for finished
//! fixtures that have none stored yet.
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::database_ops::repository;
use crate::database_ops::{mappers, Db};
use crate::error::SyncError;
use crate::progress::ProgressReporter;
use crate::provider::{delay, FootballApi};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EventSyncReport {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct EventCatchUp {
    db: Db,
    api: Arc<dyn FootballApi>,
    progress: ProgressReporter,
    delay_ms: u64,
}

impl EventCatchUp {
    pub fn new(db: Db, api: Arc<dyn FootballApi>, progress: ProgressReporter, delay_ms: u64) -> Self {
        Self {
            db,
            api,
            progress,
            delay_ms,
        }
    }

    /// Sync events for up to `limit` finished fixtures of a local league
    /// season that have no events yet. Fixtures are fetched one at a time
    /// with a pause after each success; a failing fixture is counted and
    /// skipped.
    #[instrument(skip(self))]
    pub async fn sync_league_events(
        &self,
        league_id: i64,
        season: i32,
        limit: i64,
    ) -> Result<EventSyncReport> {
        let candidates = {
            let mut conn = self.db.acquire().await?;
            repository::find_event_candidates(&mut conn, league_id, season, limit).await?
        };
        if candidates.is_empty() {
            info!(league_id, season, "no fixtures missing events");
            return Ok(EventSyncReport::default());
        }
        self.progress.info(format!(
            "Found {} finished fixtures without events",
            candidates.len()
        ));

        let mut report = EventSyncReport {
            total: candidates.len(),
            ..EventSyncReport::default()
        };
        for candidate in candidates {
            match self.fetch_and_store(candidate.fixture_id, candidate.api_id).await {
                Ok(stored) => {
                    debug!(fixture_id = candidate.fixture_id, stored, "fixture events synced");
                    report.success += 1;
                    delay(self.delay_ms).await;
                }
                Err(err) => {
                    warn!(fixture_id = candidate.fixture_id, api_id = candidate.api_id, error = %err, "fixture event sync failed");
                    report.failed += 1;
                }
            }
        }
        info!(league_id, season, total = report.total, success = report.success, failed = report.failed, "event catch-up finished");
        Ok(report)
    }

    /// Sync one fixture's events. Without an explicit provider id the local
    /// row supplies it. Returns how many events were stored; zero means the
    /// provider had none and nothing was written.
    #[instrument(skip(self))]
    pub async fn sync_fixture_events(&self, fixture_id: i64, api_id: Option<i64>) -> Result<usize> {
        let api_id = match api_id {
            Some(id) => id,
            None => {
                let mut conn = self.db.acquire().await?;
                repository::find_fixture_api_id(&mut conn, fixture_id)
                    .await?
                    .ok_or(SyncError::FixtureNotFound { fixture_id })?
            }
        };
        self.fetch_and_store(fixture_id, api_id).await
    }

    async fn fetch_and_store(&self, fixture_id: i64, api_id: i64) -> Result<usize> {
        let entries = self
            .api
            .fixture(api_id)
            .await
            .with_context(|| format!("fetch events for fixture {api_id}"))?;
        let Some(entry) = entries.into_iter().next() else {
            debug!(api_id, "provider returned no fixture");
            return Ok(0);
        };
        if entry.events.is_empty() {
            return Ok(0);
        }

        let mut tx = self.db.begin().await?;
        let mut rows = Vec::with_capacity(entry.events.len());
        for event in &entry.events {
            let team_id = match event.team.id {
                // Unknown teams keep the raw provider id rather than failing the fixture.
                Some(team_api_id) => Some(
                    repository::find_team_by_api_id(&mut tx, team_api_id)
                        .await?
                        .unwrap_or(team_api_id),
                ),
                None => None,
            };
            rows.push(mappers::event(event, team_id));
        }
        let stored = repository::replace_fixture_events(&mut tx, fixture_id, &rows)
            .await
            .with_context(|| format!("store events for fixture {fixture_id}"))?;
        tx.commit().await?;
        Ok(stored)
    }
}
