//! Player career reconciliation.
//!
//! Walks every season the provider knows for one player, newest first. Each
//! competition entry resolves (or discovers) its country, league, team and
//! season tracker, then the stored stat row is compared on appearances,
//! goals and assists. Only a missing row or a mismatch causes a write.
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::database_ops::models::{PlayerSeasonStats, StatKey, StoredPlayer};
use crate::database_ops::repository;
use crate::database_ops::{mappers, Db};
use crate::error::SyncError;
use crate::progress::{ProgressEvent, ProgressReporter, Severity};
use crate::provider::models::PlayerEntry;
use crate::provider::FootballApi;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CareerSyncSummary {
    /// Competitions that had no local row before this run.
    pub discovered: usize,
    /// Seasons inspected, newest first.
    pub years: Vec<i32>,
    pub backfilled: usize,
    pub corrected: usize,
    pub unchanged: usize,
    pub failed_years: Vec<i32>,
}

#[derive(Debug, Default)]
struct YearTally {
    discovered: usize,
    backfilled: usize,
    corrected: usize,
    unchanged: usize,
}

#[derive(Clone)]
pub struct CareerSync {
    db: Db,
    api: Arc<dyn FootballApi>,
    progress: ProgressReporter,
}

impl CareerSync {
    pub fn new(db: Db, api: Arc<dyn FootballApi>, progress: ProgressReporter) -> Self {
        Self { db, api, progress }
    }

    #[instrument(skip(self))]
    pub async fn sync_player(&self, player_id: i64) -> Result<CareerSyncSummary> {
        let player = {
            let mut conn = self.db.acquire().await?;
            repository::find_player(&mut conn, player_id).await?
        }
        .ok_or(SyncError::PlayerNotFound { player_id })?;

        self.progress
            .info(format!("Starting career sync for {}", player.name));
        let mut years = self
            .api
            .player_seasons(player.api_id)
            .await
            .with_context(|| format!("fetch seasons for player {}", player.api_id))?;
        if years.is_empty() {
            self.progress.warning("No career history found at provider");
            return Ok(CareerSyncSummary::default());
        }
        years.sort_unstable_by(|a, b| b.cmp(a));
        years.dedup();
        self.progress
            .success(format!("Found {} seasons of history", years.len()));
        self.progress.emit(ProgressEvent::Scouting {
            total: years.len(),
            years: years.clone(),
        });

        let mut summary = CareerSyncSummary {
            years: years.clone(),
            ..CareerSyncSummary::default()
        };
        for (idx, &year) in years.iter().enumerate() {
            self.progress.emit(ProgressEvent::Fetching {
                year,
                current: idx + 1,
                total: years.len(),
            });

            let bundle = match self.api.player_statistics(player.api_id, year).await {
                Ok(bundle) => bundle,
                Err(err) => {
                    self.progress
                        .error(format!("Could not fetch statistics for {year}: {err}"));
                    summary.failed_years.push(year);
                    continue;
                }
            };
            if bundle.is_empty() {
                self.progress
                    .warning(format!("No statistics returned for {year}, skipping"));
                continue;
            }

            match self.reconcile_year(&player, year, &bundle).await {
                Ok(tally) => {
                    summary.discovered += tally.discovered;
                    summary.backfilled += tally.backfilled;
                    summary.corrected += tally.corrected;
                    summary.unchanged += tally.unchanged;
                    self.progress
                        .success(format!("Year {year} reconciliation complete"));
                }
                Err(err) => {
                    self.progress
                        .error(format!("Error reconciling year {year}: {err:#}"));
                    summary.failed_years.push(year);
                }
            }
        }

        info!(
            player_id,
            discovered = summary.discovered,
            backfilled = summary.backfilled,
            corrected = summary.corrected,
            failed = summary.failed_years.len(),
            "career sync finished"
        );
        Ok(summary)
    }

    /// One transaction per season; any error rolls the whole season back.
    async fn reconcile_year(
        &self,
        player: &StoredPlayer,
        year: i32,
        bundle: &[PlayerEntry],
    ) -> Result<YearTally> {
        let mut tally = YearTally::default();
        let mut tx = self.db.begin().await?;

        for stat in bundle.iter().flat_map(|entry| entry.statistics.iter()) {
            let Some(league) = mappers::league_from_stat(&stat.league) else {
                warn!(year, "statistics entry without a league name; skipped");
                continue;
            };
            let Some(team) = mappers::team_from_ref(&stat.team) else {
                warn!(year, league = %league.name, "statistics entry without a team; skipped");
                continue;
            };

            let country = mappers::country_from_stat(&stat.league);
            let country_id = repository::get_or_insert_country(&mut tx, &country).await?;
            let resolved =
                repository::resolve_league(&mut tx, &league, Some(country_id), Some(&country.name))
                    .await?;
            if resolved.created {
                tally.discovered += 1;
                self.progress
                    .info(format!("Discovered new competition: {}", league.name));
            } else if resolved.linked {
                self.progress.info(format!(
                    "Linked existing competition {} to provider id {}",
                    league.name,
                    league.api_id.unwrap_or_default()
                ));
            }

            let team_id = repository::upsert_team(&mut tx, &team, None).await?.id();
            let tracker =
                repository::ensure_league_season(&mut tx, resolved.league_id, year, None).await?;

            let key = StatKey {
                player_id: player.player_id,
                team_id,
                league_id: resolved.league_id,
                season_year: year,
            };
            let line = mappers::stat_line(stat);
            match repository::find_stat_snapshot(&mut tx, &key).await? {
                None => {
                    repository::upsert_player_stats(&mut tx, &PlayerSeasonStats { key, line }).await?;
                    tally.backfilled += 1;
                    self.progress.log(
                        Severity::StatNew,
                        format!("Backfilled: {} - new competition found", league.name),
                    );
                }
                Some(existing) if existing.differs_from(&line) => {
                    repository::upsert_player_stats(&mut tx, &PlayerSeasonStats { key, line }).await?;
                    tally.corrected += 1;
                    self.progress.log(
                        Severity::StatUpdated,
                        format!("Overwritten: {} - data mismatch corrected", league.name),
                    );
                }
                Some(_) => tally.unchanged += 1,
            }

            repository::mark_season_partial_if_none(&mut tx, tracker.id()).await?;
        }

        tx.commit().await?;
        Ok(tally)
    }
}
