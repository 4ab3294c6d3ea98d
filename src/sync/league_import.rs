//! Full (league, season) import job plus the batch runner and the
//! available-seasons report built on top of it.
//!
//! Phases run strictly in order: resolve identity, league and season rows,
//! teams, players page by page, standings, fixtures, then promotion and
//! event catch-up. Teams are the only hard prerequisite; every later phase
//! runs in its own transaction and a failure there is logged and skipped.
use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::database_ops::models::{
    PlayerSeasonStats, SeasonTracker, StatKey, SyncStatus,
};
use crate::database_ops::repository::{self, ImportPhase};
use crate::database_ops::{mappers, Db};
use crate::error::SyncError;
use crate::progress::ProgressReporter;
use crate::provider::models::{FixtureEntry, LeagueEntry, PlayerEntry, StandingsEntry, TeamRef};
use crate::provider::FootballApi;
use crate::sync::config::SyncConfig;
use crate::sync::events::{EventCatchUp, EventSyncReport};

/// How the caller-supplied league id should be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeagueRef {
    /// Local `league_id` when such a row with a provider id exists,
    /// otherwise taken as the provider id.
    Auto(i64),
    /// Provider id, no local lookup.
    Api(i64),
}

impl LeagueRef {
    pub fn raw(&self) -> i64 {
        match self {
            LeagueRef::Auto(id) | LeagueRef::Api(id) => *id,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub league_api_id: i64,
    pub season: i32,
    pub local_league_id: i64,
    pub teams: usize,
    pub players: usize,
    pub standings: usize,
    pub fixtures: usize,
    /// `None` when the trailing catch-up failed.
    pub events: Option<EventSyncReport>,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItem {
    pub league: LeagueRef,
    pub seasons: Vec<i32>,
}

#[derive(Debug)]
pub struct BatchOutcome {
    pub league_id: i64,
    pub season: i32,
    pub result: Result<ImportSummary, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AvailabilityStatus {
    NotImported,
    PartialDiscovery,
    Partial,
    Full,
}

impl AvailabilityStatus {
    fn classify(tracker: Option<&SeasonTracker>) -> Self {
        let Some(t) = tracker else {
            return AvailabilityStatus::NotImported;
        };
        if t.imported_players && t.imported_standings && t.imported_fixtures {
            return AvailabilityStatus::Full;
        }
        match t.sync_status {
            SyncStatus::PartialDiscovery => AvailabilityStatus::PartialDiscovery,
            SyncStatus::Partial => AvailabilityStatus::Partial,
            _ if t.imported_players => AvailabilityStatus::Partial,
            _ => AvailabilityStatus::NotImported,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeagueHeader {
    pub api_id: i64,
    pub name: String,
    pub kind: Option<String>,
    pub logo: Option<String>,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeasonAvailability {
    pub year: i32,
    pub start: Option<String>,
    pub end: Option<String>,
    pub is_current: bool,
    pub status: AvailabilityStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailableSeasons {
    pub league: LeagueHeader,
    pub seasons: Vec<SeasonAvailability>,
}

/// Provider team id -> local team id, in provider order.
#[derive(Debug, Default)]
struct TeamIndex {
    order: Vec<i64>,
    local: HashMap<i64, i64>,
}

impl TeamIndex {
    fn insert(&mut self, api_id: i64, team_id: i64) {
        if self.local.insert(api_id, team_id).is_none() {
            self.order.push(api_id);
        }
    }
}

struct PageResult {
    stored: usize,
    total: u32,
    empty: bool,
}

#[derive(Clone)]
pub struct LeagueImporter {
    db: Db,
    api: Arc<dyn FootballApi>,
    progress: ProgressReporter,
    config: SyncConfig,
}

impl LeagueImporter {
    pub fn new(
        db: Db,
        api: Arc<dyn FootballApi>,
        progress: ProgressReporter,
        config: SyncConfig,
    ) -> Self {
        Self {
            db,
            api,
            progress,
            config,
        }
    }

    fn events(&self) -> EventCatchUp {
        EventCatchUp::new(
            self.db.clone(),
            self.api.clone(),
            self.progress.clone(),
            self.config.event_delay_ms,
        )
    }

    async fn resolve_api_id(&self, league: LeagueRef) -> Result<i64> {
        match league {
            LeagueRef::Api(id) => Ok(id),
            LeagueRef::Auto(id) => {
                let mut conn = self.db.acquire().await?;
                let resolved = repository::resolve_local_league_api_id(&mut conn, id).await?;
                if let Some(api_id) = resolved {
                    debug!(local_id = id, api_id, "resolved local league id");
                }
                Ok(resolved.unwrap_or(id))
            }
        }
    }

    /// Run one import job. Only an unknown league or a failed teams phase
    /// is fatal.
    #[instrument(skip(self), fields(league = league.raw()))]
    pub async fn run(&self, league: LeagueRef, season: i32) -> Result<ImportSummary> {
        let api_id = self.resolve_api_id(league).await?;
        self.progress
            .info(format!("Starting import for league {api_id}, season {season}"));

        let entry = self
            .api
            .leagues(api_id, Some(season))
            .await
            .with_context(|| format!("fetch league {api_id}"))?
            .into_iter()
            .next()
            .ok_or(SyncError::LeagueNotFound {
                league_id: api_id,
                season,
            })?;

        let league_id = self.store_league(&entry, season).await?;
        self.progress
            .success(format!("League {} ready (local id {league_id})", entry.league.name));

        let mut summary = ImportSummary {
            league_api_id: api_id,
            season,
            local_league_id: league_id,
            ..ImportSummary::default()
        };

        let teams = self
            .import_teams(api_id, season)
            .await
            .with_context(|| format!("import teams for league {api_id} season {season}"))?;
        summary.teams = teams.order.len();
        self.progress
            .success(format!("Imported {} teams", summary.teams));

        summary.players = self
            .import_players(api_id, league_id, season, &teams)
            .await?;
        self.progress
            .success(format!("Imported {} players", summary.players));

        summary.standings = self.import_standings(api_id, league_id, season, &teams).await;
        summary.fixtures = self.import_fixtures(api_id, league_id, season, &teams).await;

        {
            let mut tx = self.db.begin().await?;
            if repository::promote_league(&mut tx, league_id).await? {
                self.progress
                    .success(format!("League {} promoted to official", entry.league.name));
            }
            repository::mark_season_full(&mut tx, league_id, season).await?;
            tx.commit().await?;
        }

        self.progress.info("Syncing fixture events");
        summary.events = match self
            .events()
            .sync_league_events(league_id, season, self.config.import_event_limit)
            .await
        {
            Ok(report) => {
                self.progress.success(format!(
                    "Events synced for {}/{} fixtures",
                    report.success, report.total
                ));
                Some(report)
            }
            Err(err) => {
                self.progress
                    .warning(format!("Event sync failed: {err:#}"));
                None
            }
        };

        summary.finished_at = Utc::now();
        info!(
            league_api_id = api_id,
            season,
            teams = summary.teams,
            players = summary.players,
            standings = summary.standings,
            fixtures = summary.fixtures,
            "import finished"
        );
        self.progress
            .success(format!("Import complete for league {api_id}, season {season}"));
        Ok(summary)
    }

    async fn store_league(&self, entry: &LeagueEntry, season: i32) -> Result<i64> {
        let mut tx = self.db.begin().await?;
        let country = mappers::country(&entry.country);
        let country_id = match &country {
            Some(c) => Some(repository::get_or_insert_country(&mut tx, c).await?),
            None => None,
        };
        let resolved = repository::resolve_league(
            &mut tx,
            &mappers::league(&entry.league),
            country_id,
            country.as_ref().map(|c| c.name.as_str()),
        )
        .await?;
        let meta = entry
            .seasons
            .iter()
            .find(|s| s.year == season)
            .or_else(|| entry.seasons.first())
            .map(mappers::season_meta)
            .unwrap_or_default();
        repository::ensure_league_season(&mut tx, resolved.league_id, season, Some(&meta)).await?;
        tx.commit().await?;
        Ok(resolved.league_id)
    }

    async fn import_teams(&self, api_id: i64, season: i32) -> Result<TeamIndex> {
        let entries = self.api.teams(api_id, season).await?;
        let mut index = TeamIndex::default();
        let mut tx = self.db.begin().await?;
        for entry in &entries {
            let venue_id = match entry.venue.as_ref().and_then(mappers::venue) {
                Some(venue) => Some(repository::get_or_insert_venue(&mut tx, &venue).await?),
                None => None,
            };
            let team_id = repository::upsert_team(&mut tx, &mappers::team(&entry.team), venue_id)
                .await?
                .id();
            index.insert(entry.team.id, team_id);
        }
        tx.commit().await?;
        Ok(index)
    }

    async fn local_team(
        conn: &mut sqlx::SqliteConnection,
        teams: &TeamIndex,
        team: &TeamRef,
    ) -> Result<Option<i64>> {
        let Some(api_id) = team.id else {
            return Ok(None);
        };
        if let Some(id) = teams.local.get(&api_id) {
            return Ok(Some(*id));
        }
        repository::find_team_by_api_id(conn, api_id).await
    }

    async fn import_players(
        &self,
        api_id: i64,
        league_id: i64,
        season: i32,
        teams: &TeamIndex,
    ) -> Result<usize> {
        let mut stored = 0;
        for &team_api_id in &teams.order {
            let mut page = 1u32;
            let mut total = 1u32;
            while page <= total {
                match self
                    .import_player_page(api_id, league_id, season, team_api_id, page, teams)
                    .await
                {
                    Ok(result) => {
                        stored += result.stored;
                        total = result.total;
                        if result.empty {
                            break;
                        }
                    }
                    Err(err) => {
                        self.progress.error(format!(
                            "Error importing players page {page} for team {team_api_id}: {err:#}"
                        ));
                    }
                }
                page += 1;
            }
        }

        let mut conn = self.db.acquire().await?;
        repository::mark_phase_imported(&mut conn, league_id, season, ImportPhase::Players).await?;
        Ok(stored)
    }

    async fn import_player_page(
        &self,
        api_id: i64,
        league_id: i64,
        season: i32,
        team_api_id: i64,
        page: u32,
        teams: &TeamIndex,
    ) -> Result<PageResult> {
        let fetched = self.api.players_page(team_api_id, season, page).await?;
        if fetched.items.is_empty() {
            return Ok(PageResult {
                stored: 0,
                total: fetched.total,
                empty: true,
            });
        }

        let mut tx = self.db.begin().await?;
        for entry in &fetched.items {
            self.store_player(&mut tx, entry, api_id, league_id, season, teams)
                .await
                .with_context(|| format!("player {}", entry.player.id))?;
        }
        tx.commit().await?;
        debug!(team_api_id, page, total = fetched.total, players = fetched.items.len(), "players page stored");
        Ok(PageResult {
            stored: fetched.items.len(),
            total: fetched.total,
            empty: false,
        })
    }

    async fn store_player(
        &self,
        conn: &mut sqlx::SqliteConnection,
        entry: &PlayerEntry,
        api_id: i64,
        league_id: i64,
        season: i32,
        teams: &TeamIndex,
    ) -> Result<()> {
        let player_id = repository::upsert_player(conn, &mappers::player(&entry.player))
            .await?
            .id();
        // A player payload carries every competition of the season; keep ours.
        for stat in entry
            .statistics
            .iter()
            .filter(|s| s.league.id == Some(api_id))
        {
            let Some(team_id) = Self::local_team(conn, teams, &stat.team).await? else {
                warn!(player_id, team = ?stat.team.id, "stat line for unknown team skipped");
                continue;
            };
            let stats = PlayerSeasonStats {
                key: StatKey {
                    player_id,
                    team_id,
                    league_id,
                    season_year: season,
                },
                line: mappers::stat_line(stat),
            };
            repository::upsert_player_stats(conn, &stats).await?;
        }
        Ok(())
    }

    async fn import_standings(
        &self,
        api_id: i64,
        league_id: i64,
        season: i32,
        teams: &TeamIndex,
    ) -> usize {
        let entries = match self.api.standings(api_id, season).await {
            Ok(entries) => entries,
            Err(err) => {
                self.progress
                    .warning(format!("Could not fetch standings: {err}"));
                return 0;
            }
        };
        if entries
            .iter()
            .all(|e| e.league.standings.iter().all(|group| group.is_empty()))
        {
            self.progress.info("No standings available for this season");
            return 0;
        }
        match self.store_standings(&entries, league_id, season, teams).await {
            Ok(stored) => {
                self.progress
                    .success(format!("Imported {stored} standings rows"));
                stored
            }
            Err(err) => {
                self.progress
                    .error(format!("Error importing standings: {err:#}"));
                0
            }
        }
    }

    async fn store_standings(
        &self,
        entries: &[StandingsEntry],
        league_id: i64,
        season: i32,
        teams: &TeamIndex,
    ) -> Result<usize> {
        let mut stored = 0;
        let mut tx = self.db.begin().await?;
        let rows = entries
            .iter()
            .flat_map(|e| e.league.standings.iter())
            .flat_map(|group| group.iter());
        for info in rows {
            let Some(team_id) = Self::local_team(&mut tx, teams, &info.team).await? else {
                warn!(team = ?info.team.id, "standing for unknown team skipped");
                continue;
            };
            repository::upsert_standing(&mut tx, &mappers::standing(info, league_id, season, team_id))
                .await?;
            stored += 1;
        }
        repository::mark_phase_imported(&mut tx, league_id, season, ImportPhase::Standings).await?;
        tx.commit().await?;
        Ok(stored)
    }

    async fn import_fixtures(
        &self,
        api_id: i64,
        league_id: i64,
        season: i32,
        teams: &TeamIndex,
    ) -> usize {
        let entries = match self.api.fixtures(api_id, season).await {
            Ok(entries) => entries,
            Err(err) => {
                self.progress
                    .warning(format!("Could not fetch fixtures: {err}"));
                return 0;
            }
        };
        if entries.is_empty() {
            self.progress.info("No fixtures available for this season");
            return 0;
        }
        match self.store_fixtures(&entries, league_id, season, teams).await {
            Ok(stored) => {
                self.progress
                    .success(format!("Imported {stored} fixtures"));
                stored
            }
            Err(err) => {
                self.progress
                    .error(format!("Error importing fixtures: {err:#}"));
                0
            }
        }
    }

    async fn store_fixtures(
        &self,
        entries: &[FixtureEntry],
        league_id: i64,
        season: i32,
        teams: &TeamIndex,
    ) -> Result<usize> {
        let mut stored = 0;
        let mut tx = self.db.begin().await?;
        for entry in entries {
            let home = Self::local_team(&mut tx, teams, &entry.teams.home).await?;
            let away = Self::local_team(&mut tx, teams, &entry.teams.away).await?;
            let (Some(home), Some(away)) = (home, away) else {
                warn!(fixture = entry.fixture.id, "fixture with unknown team skipped");
                continue;
            };
            let venue_id = match mappers::venue(&entry.fixture.venue) {
                Some(venue) => Some(repository::get_or_insert_venue(&mut tx, &venue).await?),
                None => None,
            };
            let row = mappers::fixture(entry, league_id, season, venue_id, home, away);
            repository::upsert_fixture(&mut tx, &row).await?;
            stored += 1;
        }
        repository::mark_phase_imported(&mut tx, league_id, season, ImportPhase::Fixtures).await?;
        tx.commit().await?;
        Ok(stored)
    }

    /// Run every (league, season) job in order. Failures are logged and
    /// recorded in the outcome list; the batch keeps going.
    #[instrument(skip_all, fields(items = selection.len()))]
    pub async fn import_batch(&self, selection: &[BatchItem]) -> Vec<BatchOutcome> {
        let mut outcomes = Vec::new();
        for item in selection {
            for &season in &item.seasons {
                let result = self.run(item.league, season).await.map_err(|err| {
                    let message = format!("{err:#}");
                    self.progress.error(format!(
                        "Import failed for league {}, season {season}: {message}",
                        item.league.raw()
                    ));
                    message
                });
                outcomes.push(BatchOutcome {
                    league_id: item.league.raw(),
                    season,
                    result,
                });
            }
        }
        outcomes
    }

    /// Provider season list for a league, each year tagged with how much of
    /// it is stored locally. Newest first.
    #[instrument(skip(self))]
    pub async fn available_seasons(&self, league_api_id: i64) -> Result<AvailableSeasons> {
        let entry = self
            .api
            .leagues(league_api_id, None)
            .await
            .with_context(|| format!("fetch seasons for league {league_api_id}"))?
            .into_iter()
            .next()
            .ok_or(SyncError::LeagueSeasonsNotFound {
                league_id: league_api_id,
            })?;

        let trackers: HashMap<i32, SeasonTracker> = {
            let mut conn = self.db.acquire().await?;
            match repository::find_league_by_api_id(&mut conn, league_api_id).await? {
                Some(league_id) => repository::season_trackers(&mut conn, league_id)
                    .await?
                    .into_iter()
                    .map(|t| (t.season_year, t))
                    .collect(),
                None => HashMap::new(),
            }
        };

        let mut seasons: Vec<SeasonAvailability> = entry
            .seasons
            .iter()
            .map(|s| SeasonAvailability {
                year: s.year,
                start: s.start.clone(),
                end: s.end.clone(),
                is_current: s.current,
                status: AvailabilityStatus::classify(trackers.get(&s.year)),
            })
            .collect();
        seasons.sort_by(|a, b| b.year.cmp(&a.year));

        Ok(AvailableSeasons {
            league: LeagueHeader {
                api_id: entry.league.id,
                name: entry.league.name.clone(),
                kind: entry.league.kind.clone(),
                logo: entry.league.logo.clone(),
                country: entry
                    .country
                    .name
                    .clone()
                    .unwrap_or_else(|| mappers::WORLD.to_string()),
            },
            seasons,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database_ops::models::{NewLeague, SeasonMeta};
    use crate::progress::{drain, ProgressEvent, Severity};
    use crate::provider::fake::{
        event_json, fixture_json, fixture_with_events, league_json, player_json, standing_json,
        standings_json, stat_json, team_json, Script, ScriptedApi,
    };
    use serde_json::json;

    fn test_config() -> SyncConfig {
        SyncConfig {
            event_delay_ms: 0,
            ..SyncConfig::default()
        }
    }

    /// Ligue 1 2024: PSG (two player pages) and Marseille (one), one
    /// standings group, a finished and an upcoming fixture.
    fn ligue1_script() -> Script {
        let mut script = Script::default();
        script.leagues.push(league_json(61, "Ligue 1", "France", 2024));
        script.teams = vec![
            team_json(85, "Paris Saint Germain", Some(671)),
            team_json(81, "Marseille", Some(672)),
        ];
        let ligue1 = |team: i64, name: &str| stat_json(61, "Ligue 1", "France", team, name, 20, 5, 3);
        script.player_pages.insert(
            85,
            vec![
                vec![player_json(
                    276,
                    "Neymar",
                    vec![
                        ligue1(85, "Paris Saint Germain"),
                        stat_json(2, "UEFA Champions League", "World", 85, "Paris Saint Germain", 6, 2, 1),
                    ],
                )],
                vec![player_json(100, "Mbappe", vec![ligue1(85, "Paris Saint Germain")])],
            ],
        );
        script.player_pages.insert(
            81,
            vec![vec![player_json(200, "Payet", vec![ligue1(81, "Marseille")])]],
        );
        script.standings = vec![standings_json(
            61,
            2024,
            vec![vec![
                standing_json(85, 1, 70, Some("Ligue 1")),
                standing_json(81, 2, 60, Some("Ligue 1")),
            ]],
        )];
        script.fixtures = vec![
            fixture_json(1001, 85, 81, "FT", Some(671)),
            fixture_json(1002, 81, 85, "NS", Some(672)),
        ];
        script.fixture_details.insert(
            1001,
            fixture_with_events(
                1001,
                85,
                81,
                vec![
                    event_json(85, 276, "Goal", "Normal Goal"),
                    event_json(81, 200, "Card", "Yellow Card"),
                ],
            ),
        );
        script
    }

    async fn table_counts(db: &Db) -> Vec<i64> {
        let mut counts = Vec::new();
        for table in [
            "countries",
            "leagues",
            "league_seasons",
            "venues",
            "teams",
            "players",
            "player_season_stats",
            "standings",
            "fixtures",
            "fixture_events",
        ] {
            counts.push(db.count(table).await.unwrap());
        }
        counts
    }

    #[tokio::test]
    async fn full_import_runs_phases_in_order() {
        let db = Db::in_memory().await.unwrap();
        {
            // Seen earlier through a career sync, so it starts out discovered.
            let mut conn = db.acquire().await.unwrap();
            let league = NewLeague {
                api_id: Some(61),
                name: "Ligue 1".into(),
                kind: None,
                logo_url: None,
            };
            repository::resolve_league(&mut conn, &league, None, None)
                .await
                .unwrap();
        }
        let api = Arc::new(ScriptedApi::new(ligue1_script()));
        let importer = LeagueImporter::new(db.clone(), api.clone(), ProgressReporter::silent(), test_config());

        let summary = importer.run(LeagueRef::Api(61), 2024).await.unwrap();
        assert_eq!(
            api.calls(),
            vec![
                "leagues:61:Some(2024)",
                "teams:61:2024",
                "players:85:2024:1",
                "players:85:2024:2",
                "players:81:2024:1",
                "standings:61:2024",
                "fixtures:61:2024",
                "fixture:1001",
            ]
        );
        assert_eq!(summary.teams, 2);
        assert_eq!(summary.players, 3);
        assert_eq!(summary.standings, 2);
        assert_eq!(summary.fixtures, 2);
        assert_eq!(
            summary.events,
            Some(EventSyncReport {
                total: 1,
                success: 1,
                failed: 0
            })
        );
        // Champions League line was filtered out.
        assert_eq!(db.count("player_season_stats").await.unwrap(), 3);
        assert_eq!(db.count("leagues").await.unwrap(), 1);
        assert_eq!(db.count("venues").await.unwrap(), 2);

        let mut conn = db.acquire().await.unwrap();
        let tracker = repository::season_tracker(&mut conn, summary.local_league_id, 2024)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(tracker.sync_status, SyncStatus::Full);
        assert!(tracker.imported_players && tracker.imported_standings && tracker.imported_fixtures);
        assert!(tracker.last_imported_at.is_some());
        let discovered: bool = sqlx::query_scalar("SELECT is_discovered FROM leagues WHERE league_id = ?")
            .bind(summary.local_league_id)
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        assert!(!discovered);
    }

    #[tokio::test]
    async fn rerun_converges_and_accepts_local_id() {
        let db = Db::in_memory().await.unwrap();
        let api = Arc::new(ScriptedApi::new(ligue1_script()));
        let importer = LeagueImporter::new(db.clone(), api.clone(), ProgressReporter::silent(), test_config());

        let first = importer.run(LeagueRef::Api(61), 2024).await.unwrap();
        let after_first = table_counts(&db).await;

        let second = importer
            .run(LeagueRef::Auto(first.local_league_id), 2024)
            .await
            .unwrap();
        assert_eq!(second.league_api_id, 61);
        assert_eq!(second.local_league_id, first.local_league_id);
        assert_eq!(table_counts(&db).await, after_first);
        // Fixture 1001 already has events now.
        assert_eq!(second.events, Some(EventSyncReport::default()));
        assert_eq!(api.calls().iter().filter(|c| c.starts_with("fixture:")).count(), 1);
    }

    #[tokio::test]
    async fn failing_page_does_not_block_other_teams() {
        let db = Db::in_memory().await.unwrap();
        let mut script = ligue1_script();
        script.failing_pages.insert((85, 1));
        script.standings_fail = true;
        let api = Arc::new(ScriptedApi::new(script));
        let (progress, mut rx) = ProgressReporter::channel();
        let importer = LeagueImporter::new(db.clone(), api.clone(), progress, test_config());

        let summary = importer.run(LeagueRef::Api(61), 2024).await.unwrap();
        assert_eq!(summary.players, 1);
        assert_eq!(summary.standings, 0);
        assert_eq!(summary.fixtures, 2);
        assert!(api.calls().contains(&"players:81:2024:1".to_string()));
        assert!(!api.calls().contains(&"players:85:2024:2".to_string()));

        let events = drain(&mut rx);
        assert!(events.iter().any(|e| e.severity() == Some(Severity::Error)
            && e.message().is_some_and(|m| m.contains("team 85"))));
        assert!(events.iter().any(|e| e.severity() == Some(Severity::Warning)
            && e.message().is_some_and(|m| m.contains("standings"))));

        let mut conn = db.acquire().await.unwrap();
        let tracker = repository::season_tracker(&mut conn, summary.local_league_id, 2024)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(tracker.sync_status, SyncStatus::Full);
        assert!(!tracker.imported_standings);
        assert!(tracker.imported_fixtures);
    }

    #[tokio::test]
    async fn unknown_league_is_fatal_and_writes_nothing() {
        let db = Db::in_memory().await.unwrap();
        let api = Arc::new(ScriptedApi::new(Script::default()));
        let importer = LeagueImporter::new(db.clone(), api.clone(), ProgressReporter::silent(), test_config());

        let err = importer.run(LeagueRef::Auto(999), 2024).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SyncError>(),
            Some(SyncError::LeagueNotFound {
                league_id: 999,
                season: 2024
            })
        ));
        assert_eq!(api.calls(), vec!["leagues:999:Some(2024)"]);
        assert_eq!(db.count("leagues").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn batch_keeps_going_after_a_failed_job() {
        let db = Db::in_memory().await.unwrap();
        let api = Arc::new(ScriptedApi::new(ligue1_script()));
        let (progress, mut rx) = ProgressReporter::channel();
        let importer = LeagueImporter::new(db.clone(), api, progress, test_config());

        let outcomes = importer
            .import_batch(&[
                BatchItem {
                    league: LeagueRef::Api(999),
                    seasons: vec![2024],
                },
                BatchItem {
                    league: LeagueRef::Api(61),
                    seasons: vec![2024],
                },
            ])
            .await;
        assert_eq!(outcomes.len(), 2);
        assert_eq!((outcomes[0].league_id, outcomes[0].season), (999, 2024));
        assert!(outcomes[0].result.as_ref().is_err_and(|m| m.contains("999")));
        assert_eq!(outcomes[1].result.as_ref().map(|s| s.players), Ok(3));
        assert!(drain(&mut rx)
            .iter()
            .any(|e| matches!(e, ProgressEvent::Log { severity: Severity::Error, message } if message.contains("league 999"))));
    }

    #[tokio::test]
    async fn available_seasons_classifies_local_state() {
        let db = Db::in_memory().await.unwrap();
        {
            let mut conn = db.acquire().await.unwrap();
            let league_id = repository::resolve_league(
                &mut conn,
                &NewLeague {
                    api_id: Some(61),
                    name: "Ligue 1".into(),
                    kind: None,
                    logo_url: None,
                },
                None,
                None,
            )
            .await
            .unwrap()
            .league_id;
            let meta = SeasonMeta::default();
            repository::ensure_league_season(&mut conn, league_id, 2024, Some(&meta))
                .await
                .unwrap();
            for phase in [ImportPhase::Players, ImportPhase::Standings, ImportPhase::Fixtures] {
                repository::mark_phase_imported(&mut conn, league_id, 2024, phase)
                    .await
                    .unwrap();
            }
            repository::mark_season_full(&mut conn, league_id, 2024).await.unwrap();
            repository::ensure_league_season(&mut conn, league_id, 2023, None)
                .await
                .unwrap();
            repository::ensure_league_season(&mut conn, league_id, 2021, Some(&meta))
                .await
                .unwrap();
            repository::mark_phase_imported(&mut conn, league_id, 2021, ImportPhase::Players)
                .await
                .unwrap();
            repository::ensure_league_season(&mut conn, league_id, 2020, Some(&meta))
                .await
                .unwrap();
        }
        let mut league = league_json(61, "Ligue 1", "France", 2024);
        let seasons: Vec<serde_json::Value> = (2020..=2024)
            .map(|y: i32| {
                let current = y == 2024;
                json!({"year": y, "start": format!("{y}-08-01"), "end": format!("{}-05-31", y + 1), "current": current})
            })
            .collect();
        league["seasons"] = serde_json::Value::Array(seasons);
        let mut script = Script::default();
        script.leagues.push(league);
        let importer = LeagueImporter::new(
            db,
            Arc::new(ScriptedApi::new(script)),
            ProgressReporter::silent(),
            test_config(),
        );

        let report = importer.available_seasons(61).await.unwrap();
        assert_eq!(report.league.name, "Ligue 1");
        assert_eq!(report.league.country, "France");
        let statuses: Vec<(i32, AvailabilityStatus)> =
            report.seasons.iter().map(|s| (s.year, s.status)).collect();
        assert_eq!(
            statuses,
            vec![
                (2024, AvailabilityStatus::Full),
                (2023, AvailabilityStatus::PartialDiscovery),
                (2022, AvailabilityStatus::NotImported),
                (2021, AvailabilityStatus::Partial),
                (2020, AvailabilityStatus::NotImported),
            ]
        );
        assert!(report.seasons[0].is_current);

        let err = importer.available_seasons(5).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SyncError>(),
            Some(SyncError::LeagueSeasonsNotFound { league_id: 5 })
        ));
    }
    async fn tracker(db: &Db, league_id: i64) -> SeasonTracker {
        let mut conn = db.acquire().await.unwrap();
        repository::season_tracker(&mut conn, league_id, 2024)
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn failed_teams_batch_aborts_and_rolls_back() {
        let db = Db::in_memory().await.unwrap();
        sqlx::query(
            "CREATE TRIGGER reject_team BEFORE INSERT ON teams WHEN NEW.api_id = 81 BEGIN SELECT RAISE(ABORT, 'team rejected'); END",
        )
        .execute(&db.pool)
        .await
        .unwrap();
        let api = Arc::new(ScriptedApi::new(ligue1_script()));
        let importer = LeagueImporter::new(db.clone(), api.clone(), ProgressReporter::silent(), test_config());

        let err = importer.run(LeagueRef::Api(61), 2024).await.unwrap_err();
        assert!(format!("{err:#}").contains("import teams"));
        assert_eq!(db.count("teams").await.unwrap(), 0);
        assert_eq!(db.count("venues").await.unwrap(), 0);
        assert_eq!(api.calls(), vec!["leagues:61:Some(2024)", "teams:61:2024"]);
    }

    #[tokio::test]
    async fn fixtures_fetch_failure_is_a_warning() {
        let db = Db::in_memory().await.unwrap();
        let mut script = ligue1_script();
        script.fixtures_fail = true;
        let (progress, mut rx) = ProgressReporter::channel();
        let importer = LeagueImporter::new(db.clone(), Arc::new(ScriptedApi::new(script)), progress, test_config());

        let summary = importer.run(LeagueRef::Api(61), 2024).await.unwrap();
        assert_eq!(summary.fixtures, 0);
        assert_eq!(summary.events, Some(EventSyncReport::default()));
        assert!(drain(&mut rx).iter().any(|e| e.severity() == Some(Severity::Warning)
            && e.message().is_some_and(|m| m.contains("fixtures"))));
        let t = tracker(&db, summary.local_league_id).await;
        assert!(!t.imported_fixtures);
        assert!(t.imported_standings);
        assert_eq!(t.sync_status, SyncStatus::Full);
    }

    #[tokio::test]
    async fn empty_standings_are_informational() {
        let db = Db::in_memory().await.unwrap();
        let mut script = ligue1_script();
        script.standings.clear();
        let (progress, mut rx) = ProgressReporter::channel();
        let importer = LeagueImporter::new(db.clone(), Arc::new(ScriptedApi::new(script)), progress, test_config());

        let summary = importer.run(LeagueRef::Api(61), 2024).await.unwrap();
        assert_eq!(summary.standings, 0);
        let events = drain(&mut rx);
        assert!(events.iter().any(|e| e.severity() == Some(Severity::Info)
            && e.message() == Some("No standings available for this season")));
        assert!(!events.iter().any(|e| matches!(
            e.severity(),
            Some(Severity::Warning | Severity::Error)
        )));
        assert!(!tracker(&db, summary.local_league_id).await.imported_standings);
    }

    #[tokio::test]
    async fn event_catch_up_failure_does_not_fail_the_job() {
        let db = Db::in_memory().await.unwrap();
        sqlx::query("DROP TABLE fixture_events")
            .execute(&db.pool)
            .await
            .unwrap();
        let (progress, mut rx) = ProgressReporter::channel();
        let importer = LeagueImporter::new(
            db.clone(),
            Arc::new(ScriptedApi::new(ligue1_script())),
            progress,
            test_config(),
        );

        let summary = importer.run(LeagueRef::Api(61), 2024).await.unwrap();
        assert_eq!(summary.events, None);
        assert_eq!(summary.fixtures, 2);
        assert!(drain(&mut rx).iter().any(|e| e.severity() == Some(Severity::Warning)
            && e.message().is_some_and(|m| m.starts_with("Event sync failed"))));
        assert_eq!(tracker(&db, summary.local_league_id).await.sync_status, SyncStatus::Full);
    }
}
