//! Idempotent get-or-insert / upsert primitives for every stored entity.
//!
//! Every function takes a bare `&mut SqliteConnection` so callers decide the
//! transaction scope: pass `&mut tx` inside a batch, or a pooled connection
//! for one-off reads. Natural keys are the only source of identity; nullable
//! key columns are compared with `IS` so absent values still converge.
use std::collections::BTreeMap;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Row, Sqlite, SqliteConnection};
use tracing::{debug, instrument};

use crate::database_ops::models::{
    DiscoveredLeague, EventCandidate, FixtureEventRow, FixtureRow, LeagueResolution, NewCountry,
    NewLeague, NewPlayer, NewTeam, NewVenue, PlayerSeasonStats, SeasonMeta, SeasonTracker,
    StandingRow, StatKey, StatLine, StatSnapshot, StoredPlayer, SyncStatus, UpsertOutcome,
};

/// Competition names the provider reuses across countries. Stored with the
/// country appended so "Cup" in Spain and "Cup" in Wales stay distinct.
pub const GENERIC_LEAGUE_NAMES: [&str; 13] = [
    "Cup",
    "Premier League",
    "Super Cup",
    "Play-offs",
    "Championship",
    "League 1",
    "League 2",
    "Super League",
    "Challenge League",
    "First Division",
    "Second Division",
    "Serie A",
    "Serie B",
];

/// Fixture statuses that mean the match is over and its events are final.
pub const FINISHED_STATUSES: [&str; 3] = ["FT", "AET", "PEN"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportPhase {
    Players,
    Standings,
    Fixtures,
}

// ---- countries & venues ----------------------------------------------------

#[instrument(skip(conn), level = "debug")]
pub async fn get_or_insert_country(conn: &mut SqliteConnection, country: &NewCountry) -> Result<i64> {
    let existing: Option<i64> =
        sqlx::query_scalar("SELECT country_id FROM countries WHERE name = ?")
            .bind(&country.name)
            .fetch_optional(&mut *conn)
            .await?;
    if let Some(id) = existing {
        sqlx::query(
            "UPDATE countries SET code = COALESCE(code, ?), flag_url = COALESCE(flag_url, ?) WHERE country_id = ?",
        )
        .bind(country.code.as_deref())
        .bind(country.flag_url.as_deref())
        .bind(id)
        .execute(&mut *conn)
        .await?;
        return Ok(id);
    }
    let id = sqlx::query("INSERT INTO countries (name, code, flag_url) VALUES (?, ?, ?)")
        .bind(&country.name)
        .bind(country.code.as_deref())
        .bind(country.flag_url.as_deref())
        .execute(&mut *conn)
        .await
        .with_context(|| format!("insert country {}", country.name))?
        .last_insert_rowid();
    debug!(country_id = id, name = %country.name, "inserted country");
    Ok(id)
}

/// Fixture payloads carry only a sliver of venue data, so refreshes never
/// blank out fields a richer payload filled earlier.
#[instrument(skip(conn, venue), fields(api_id = venue.api_id), level = "debug")]
pub async fn get_or_insert_venue(conn: &mut SqliteConnection, venue: &NewVenue) -> Result<i64> {
    let existing: Option<i64> = sqlx::query_scalar("SELECT venue_id FROM venues WHERE api_id = ?")
        .bind(venue.api_id)
        .fetch_optional(&mut *conn)
        .await?;
    if let Some(id) = existing {
        sqlx::query(
            r#"UPDATE venues SET
                 name = COALESCE(?, name), address = COALESCE(?, address), city = COALESCE(?, city),
                 capacity = COALESCE(?, capacity), surface = COALESCE(?, surface),
                 image_url = COALESCE(?, image_url)
               WHERE venue_id = ?"#,
        )
        .bind(venue.name.as_deref())
        .bind(venue.address.as_deref())
        .bind(venue.city.as_deref())
        .bind(venue.capacity)
        .bind(venue.surface.as_deref())
        .bind(venue.image_url.as_deref())
        .bind(id)
        .execute(&mut *conn)
        .await?;
        return Ok(id);
    }
    let id = sqlx::query(
        "INSERT INTO venues (api_id, name, address, city, capacity, surface, image_url) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(venue.api_id)
    .bind(venue.name.as_deref())
    .bind(venue.address.as_deref())
    .bind(venue.city.as_deref())
    .bind(venue.capacity)
    .bind(venue.surface.as_deref())
    .bind(venue.image_url.as_deref())
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();
    Ok(id)
}

// ---- leagues ---------------------------------------------------------------

pub fn disambiguate_league_name(name: &str, country: Option<&str>) -> String {
    let name = name.trim();
    match country.map(str::trim) {
        Some(country)
            if !country.is_empty()
                && country != "World"
                && GENERIC_LEAGUE_NAMES.contains(&name) =>
        {
            format!("{name} ({country})")
        }
        _ => name.to_string(),
    }
}

pub async fn find_league_by_api_id(conn: &mut SqliteConnection, api_id: i64) -> Result<Option<i64>> {
    Ok(sqlx::query_scalar("SELECT league_id FROM leagues WHERE api_id = ?")
        .bind(api_id)
        .fetch_optional(&mut *conn)
        .await?)
}

/// Three-tier league identity: provider id, then (disambiguated name,
/// country) with the provider id backfilled, then a fresh discovered row.
#[instrument(skip(conn, league), fields(api_id = ?league.api_id, name = %league.name), level = "debug")]
pub async fn resolve_league(
    conn: &mut SqliteConnection,
    league: &NewLeague,
    country_id: Option<i64>,
    country_name: Option<&str>,
) -> Result<LeagueResolution> {
    if let Some(api_id) = league.api_id {
        if let Some(league_id) = find_league_by_api_id(conn, api_id).await? {
            refresh_league_details(conn, league_id, league).await?;
            return Ok(LeagueResolution {
                league_id,
                created: false,
                linked: false,
            });
        }
    }

    let name = disambiguate_league_name(&league.name, country_name);
    let by_identity: Option<i64> =
        sqlx::query_scalar("SELECT league_id FROM leagues WHERE name = ? AND country_id IS ?")
            .bind(&name)
            .bind(country_id)
            .fetch_optional(&mut *conn)
            .await?;
    if let Some(league_id) = by_identity {
        let linked = league.api_id.is_some();
        if let Some(api_id) = league.api_id {
            sqlx::query("UPDATE leagues SET api_id = ? WHERE league_id = ?")
                .bind(api_id)
                .bind(league_id)
                .execute(&mut *conn)
                .await?;
            debug!(league_id, api_id, "backfilled league api id");
        }
        refresh_league_details(conn, league_id, league).await?;
        return Ok(LeagueResolution {
            league_id,
            created: false,
            linked,
        });
    }

    let league_id = sqlx::query(
        "INSERT INTO leagues (api_id, name, type, logo_url, country_id, is_discovered) VALUES (?, ?, ?, ?, ?, 1)",
    )
    .bind(league.api_id)
    .bind(&name)
    .bind(league.kind.as_deref())
    .bind(league.logo_url.as_deref())
    .bind(country_id)
    .execute(&mut *conn)
    .await
    .with_context(|| format!("insert league {name}"))?
    .last_insert_rowid();
    debug!(league_id, %name, "inserted discovered league");
    Ok(LeagueResolution {
        league_id,
        created: true,
        linked: false,
    })
}

async fn refresh_league_details(
    conn: &mut SqliteConnection,
    league_id: i64,
    league: &NewLeague,
) -> Result<()> {
    sqlx::query(
        "UPDATE leagues SET type = COALESCE(?, type), logo_url = COALESCE(?, logo_url) WHERE league_id = ?",
    )
    .bind(league.kind.as_deref())
    .bind(league.logo_url.as_deref())
    .bind(league_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Clears `is_discovered`. Returns whether the league was discovered before.
pub async fn promote_league(conn: &mut SqliteConnection, league_id: i64) -> Result<bool> {
    let done = sqlx::query("UPDATE leagues SET is_discovered = 0 WHERE league_id = ? AND is_discovered = 1")
        .bind(league_id)
        .execute(&mut *conn)
        .await?;
    Ok(done.rows_affected() > 0)
}

/// Provider id stored on a local league row, if both exist.
pub async fn resolve_local_league_api_id(
    conn: &mut SqliteConnection,
    league_id: i64,
) -> Result<Option<i64>> {
    let api_id: Option<Option<i64>> =
        sqlx::query_scalar("SELECT api_id FROM leagues WHERE league_id = ?")
            .bind(league_id)
            .fetch_optional(&mut *conn)
            .await?;
    Ok(api_id.flatten())
}

pub async fn discovered_leagues(conn: &mut SqliteConnection) -> Result<Vec<DiscoveredLeague>> {
    let rows = sqlx::query(
        r#"SELECT l.league_id, l.api_id, l.name, c.name AS country, ls.season_year
           FROM leagues l
           JOIN league_seasons ls ON ls.league_id = l.league_id
           LEFT JOIN countries c ON c.country_id = l.country_id
           WHERE l.is_discovered = 1 AND ls.sync_status IN ('PARTIAL_DISCOVERY', 'PARTIAL')
           ORDER BY l.name ASC, l.league_id ASC, ls.season_year DESC"#,
    )
    .fetch_all(&mut *conn)
    .await?;

    let mut grouped: BTreeMap<(String, i64), DiscoveredLeague> = BTreeMap::new();
    for row in rows {
        let league_id: i64 = row.try_get("league_id")?;
        let name: String = row.try_get("name")?;
        let api_id: Option<i64> = row.try_get("api_id")?;
        let country: Option<String> = row.try_get("country")?;
        let season_year: i32 = row.try_get("season_year")?;
        grouped
            .entry((name.clone(), league_id))
            .or_insert_with(|| DiscoveredLeague {
                league_id,
                api_id,
                name,
                country,
                seasons: Vec::new(),
            })
            .seasons
            .push(season_year);
    }
    Ok(grouped.into_values().collect())
}

// ---- season trackers -------------------------------------------------------

/// Get-or-insert the (league, year) tracker.
///
/// With `meta` (full import) a new row starts at `NONE` carrying the declared
/// coverage, and an existing row gets its dates and coverage refreshed.
/// Without it (career discovery) a new row starts at `PARTIAL_DISCOVERY` and
/// an existing row is left alone. Status is never touched on existing rows.
#[instrument(skip(conn, meta), level = "debug")]
pub async fn ensure_league_season(
    conn: &mut SqliteConnection,
    league_id: i64,
    season_year: i32,
    meta: Option<&SeasonMeta>,
) -> Result<UpsertOutcome> {
    let existing: Option<i64> = sqlx::query_scalar(
        "SELECT league_season_id FROM league_seasons WHERE league_id = ? AND season_year = ?",
    )
    .bind(league_id)
    .bind(season_year)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(id) = existing {
        if let Some(meta) = meta {
            let c = &meta.coverage;
            sqlx::query(
                r#"UPDATE league_seasons SET
                     start_date = COALESCE(?, start_date), end_date = COALESCE(?, end_date), is_current = ?,
                     coverage_standings = ?, coverage_players = ?, coverage_top_scorers = ?,
                     coverage_top_assists = ?, coverage_top_cards = ?, coverage_injuries = ?,
                     coverage_predictions = ?, coverage_odds = ?
                   WHERE league_season_id = ?"#,
            )
            .bind(meta.start_date.as_deref())
            .bind(meta.end_date.as_deref())
            .bind(meta.is_current)
            .bind(c.standings)
            .bind(c.players)
            .bind(c.top_scorers)
            .bind(c.top_assists)
            .bind(c.top_cards)
            .bind(c.injuries)
            .bind(c.predictions)
            .bind(c.odds)
            .bind(id)
            .execute(&mut *conn)
            .await?;
        }
        return Ok(UpsertOutcome::Updated(id));
    }

    let status = if meta.is_some() {
        SyncStatus::None
    } else {
        SyncStatus::PartialDiscovery
    };
    let meta = meta.cloned().unwrap_or_default();
    let c = meta.coverage;
    let id = sqlx::query(
        r#"INSERT INTO league_seasons (
             league_id, season_year, start_date, end_date, is_current, sync_status,
             coverage_standings, coverage_players, coverage_top_scorers, coverage_top_assists,
             coverage_top_cards, coverage_injuries, coverage_predictions, coverage_odds
           ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(league_id)
    .bind(season_year)
    .bind(meta.start_date.as_deref())
    .bind(meta.end_date.as_deref())
    .bind(meta.is_current)
    .bind(status.as_str())
    .bind(c.standings)
    .bind(c.players)
    .bind(c.top_scorers)
    .bind(c.top_assists)
    .bind(c.top_cards)
    .bind(c.injuries)
    .bind(c.predictions)
    .bind(c.odds)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();
    debug!(league_season_id = id, %status, "inserted season tracker");
    Ok(UpsertOutcome::Inserted(id))
}

pub async fn mark_phase_imported(
    conn: &mut SqliteConnection,
    league_id: i64,
    season_year: i32,
    phase: ImportPhase,
) -> Result<()> {
    let sql = match phase {
        ImportPhase::Players => {
            "UPDATE league_seasons SET imported_players = 1, last_imported_at = CURRENT_TIMESTAMP WHERE league_id = ? AND season_year = ?"
        }
        ImportPhase::Standings => {
            "UPDATE league_seasons SET imported_standings = 1 WHERE league_id = ? AND season_year = ?"
        }
        ImportPhase::Fixtures => {
            "UPDATE league_seasons SET imported_fixtures = 1 WHERE league_id = ? AND season_year = ?"
        }
    };
    sqlx::query(sql)
        .bind(league_id)
        .bind(season_year)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// `NONE` -> `PARTIAL`; any other status is left as is.
pub async fn mark_season_partial_if_none(
    conn: &mut SqliteConnection,
    league_season_id: i64,
) -> Result<bool> {
    let done = sqlx::query(
        "UPDATE league_seasons SET sync_status = 'PARTIAL' WHERE league_season_id = ? AND sync_status = 'NONE'",
    )
    .bind(league_season_id)
    .execute(&mut *conn)
    .await?;
    Ok(done.rows_affected() > 0)
}

pub async fn mark_season_full(
    conn: &mut SqliteConnection,
    league_id: i64,
    season_year: i32,
) -> Result<()> {
    sqlx::query("UPDATE league_seasons SET sync_status = 'FULL' WHERE league_id = ? AND season_year = ?")
        .bind(league_id)
        .bind(season_year)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

fn tracker_from_row(row: &SqliteRow) -> Result<SeasonTracker> {
    let status: String = row.try_get("sync_status")?;
    Ok(SeasonTracker {
        league_season_id: row.try_get("league_season_id")?,
        league_id: row.try_get("league_id")?,
        season_year: row.try_get("season_year")?,
        sync_status: SyncStatus::parse(&status),
        imported_players: row.try_get("imported_players")?,
        imported_standings: row.try_get("imported_standings")?,
        imported_fixtures: row.try_get("imported_fixtures")?,
        last_imported_at: row.try_get("last_imported_at")?,
    })
}

const TRACKER_COLUMNS: &str = "league_season_id, league_id, season_year, sync_status, imported_players, imported_standings, imported_fixtures, last_imported_at";

pub async fn season_tracker(
    conn: &mut SqliteConnection,
    league_id: i64,
    season_year: i32,
) -> Result<Option<SeasonTracker>> {
    let sql = format!(
        "SELECT {TRACKER_COLUMNS} FROM league_seasons WHERE league_id = ? AND season_year = ?"
    );
    let row = sqlx::query(&sql)
        .bind(league_id)
        .bind(season_year)
        .fetch_optional(&mut *conn)
        .await?;
    row.as_ref().map(tracker_from_row).transpose()
}

pub async fn season_trackers(
    conn: &mut SqliteConnection,
    league_id: i64,
) -> Result<Vec<SeasonTracker>> {
    let sql = format!(
        "SELECT {TRACKER_COLUMNS} FROM league_seasons WHERE league_id = ? ORDER BY season_year DESC"
    );
    let rows = sqlx::query(&sql)
        .bind(league_id)
        .fetch_all(&mut *conn)
        .await?;
    rows.iter().map(tracker_from_row).collect()
}

// ---- teams & players -------------------------------------------------------

/// Updates in place on match. Fields the payload does not carry (stat entries
/// have no venue or national flag) keep their stored values.
#[instrument(skip(conn, team), fields(api_id = team.api_id), level = "debug")]
pub async fn upsert_team(
    conn: &mut SqliteConnection,
    team: &NewTeam,
    venue_id: Option<i64>,
) -> Result<UpsertOutcome> {
    if let Some(id) = find_team_by_api_id(conn, team.api_id).await? {
        sqlx::query(
            r#"UPDATE teams SET
                 name = ?, code = COALESCE(?, code), country = COALESCE(?, country),
                 founded = COALESCE(?, founded), logo_url = COALESCE(?, logo_url),
                 venue_id = COALESCE(?, venue_id), is_national_team = COALESCE(?, is_national_team)
               WHERE team_id = ?"#,
        )
        .bind(&team.name)
        .bind(team.code.as_deref())
        .bind(team.country.as_deref())
        .bind(team.founded)
        .bind(team.logo_url.as_deref())
        .bind(venue_id)
        .bind(team.is_national_team)
        .bind(id)
        .execute(&mut *conn)
        .await?;
        return Ok(UpsertOutcome::Updated(id));
    }
    let id = sqlx::query(
        r#"INSERT INTO teams (api_id, name, code, country, founded, is_national_team, logo_url, venue_id)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(team.api_id)
    .bind(&team.name)
    .bind(team.code.as_deref())
    .bind(team.country.as_deref())
    .bind(team.founded)
    .bind(team.is_national_team.unwrap_or(false))
    .bind(team.logo_url.as_deref())
    .bind(venue_id)
    .execute(&mut *conn)
    .await
    .with_context(|| format!("insert team {} ({})", team.name, team.api_id))?
    .last_insert_rowid();
    Ok(UpsertOutcome::Inserted(id))
}

pub async fn find_team_by_api_id(conn: &mut SqliteConnection, api_id: i64) -> Result<Option<i64>> {
    Ok(sqlx::query_scalar("SELECT team_id FROM teams WHERE api_id = ?")
        .bind(api_id)
        .fetch_optional(&mut *conn)
        .await?)
}

/// Biographical fields are written once; the mutable ones are refreshed.
#[instrument(skip(conn, player), fields(api_id = player.api_id), level = "debug")]
pub async fn upsert_player(conn: &mut SqliteConnection, player: &NewPlayer) -> Result<UpsertOutcome> {
    let existing: Option<i64> = sqlx::query_scalar("SELECT player_id FROM players WHERE api_id = ?")
        .bind(player.api_id)
        .fetch_optional(&mut *conn)
        .await?;
    if let Some(id) = existing {
        sqlx::query(
            r#"UPDATE players SET age = ?, height = ?, weight = ?, injured = ?, photo_url = ?, preferred_foot = ?
               WHERE player_id = ?"#,
        )
        .bind(player.age)
        .bind(player.height.as_deref())
        .bind(player.weight.as_deref())
        .bind(player.injured)
        .bind(player.photo_url.as_deref())
        .bind(player.preferred_foot.as_deref())
        .bind(id)
        .execute(&mut *conn)
        .await?;
        return Ok(UpsertOutcome::Updated(id));
    }
    let id = sqlx::query(
        r#"INSERT INTO players (
             api_id, name, firstname, lastname, age, birth_date, birth_place, birth_country,
             nationality, height, weight, injured, photo_url, preferred_foot
           ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(player.api_id)
    .bind(&player.name)
    .bind(player.firstname.as_deref())
    .bind(player.lastname.as_deref())
    .bind(player.age)
    .bind(player.birth_date.as_deref())
    .bind(player.birth_place.as_deref())
    .bind(player.birth_country.as_deref())
    .bind(player.nationality.as_deref())
    .bind(player.height.as_deref())
    .bind(player.weight.as_deref())
    .bind(player.injured)
    .bind(player.photo_url.as_deref())
    .bind(player.preferred_foot.as_deref())
    .execute(&mut *conn)
    .await
    .with_context(|| format!("insert player {} ({})", player.name, player.api_id))?
    .last_insert_rowid();
    Ok(UpsertOutcome::Inserted(id))
}

pub async fn find_player(
    conn: &mut SqliteConnection,
    player_id: i64,
) -> Result<Option<StoredPlayer>> {
    let row = sqlx::query("SELECT player_id, api_id, name FROM players WHERE player_id = ?")
        .bind(player_id)
        .fetch_optional(&mut *conn)
        .await?;
    row.map(|r| -> Result<StoredPlayer> {
        Ok(StoredPlayer {
            player_id: r.try_get("player_id")?,
            api_id: r.try_get("api_id")?,
            name: r.try_get("name")?,
        })
    })
    .transpose()
}

// ---- player season stats ---------------------------------------------------

const STAT_COLUMNS: [&str; 37] = [
    "games_appearences",
    "games_lineups",
    "games_minutes",
    "games_number",
    "games_position",
    "games_rating",
    "games_captain",
    "substitutes_in",
    "substitutes_out",
    "substitutes_bench",
    "shots_total",
    "shots_on",
    "goals_total",
    "goals_conceded",
    "goals_assists",
    "goals_saves",
    "passes_total",
    "passes_key",
    "passes_accuracy",
    "tackles_total",
    "tackles_blocks",
    "tackles_interceptions",
    "duels_total",
    "duels_won",
    "dribbles_attempts",
    "dribbles_success",
    "dribbles_past",
    "fouls_drawn",
    "fouls_committed",
    "cards_yellow",
    "cards_yellowred",
    "cards_red",
    "penalty_won",
    "penalty_commited",
    "penalty_scored",
    "penalty_missed",
    "penalty_saved",
];

static STAT_UPDATE_SQL: OnceLock<String> = OnceLock::new();
static STAT_INSERT_SQL: OnceLock<String> = OnceLock::new();

fn stat_update_sql() -> &'static str {
    STAT_UPDATE_SQL.get_or_init(|| {
        let sets = STAT_COLUMNS
            .iter()
            .map(|c| format!("{c} = ?"))
            .collect::<Vec<_>>()
            .join(", ");
        format!("UPDATE player_season_stats SET {sets}, updated_at = CURRENT_TIMESTAMP WHERE stat_id = ?")
    })
}

fn stat_insert_sql() -> &'static str {
    STAT_INSERT_SQL.get_or_init(|| {
        let placeholders = vec!["?"; STAT_COLUMNS.len() + 4].join(", ");
        format!(
            "INSERT INTO player_season_stats (player_id, team_id, league_id, season_year, {}) VALUES ({placeholders})",
            STAT_COLUMNS.join(", ")
        )
    })
}

/// Binds in `STAT_COLUMNS` order.
fn bind_stat_line<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    l: &'q StatLine,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    query
        .bind(l.games_appearences)
        .bind(l.games_lineups)
        .bind(l.games_minutes)
        .bind(l.games_number)
        .bind(l.games_position.as_deref())
        .bind(l.games_rating.as_deref())
        .bind(l.games_captain)
        .bind(l.substitutes_in)
        .bind(l.substitutes_out)
        .bind(l.substitutes_bench)
        .bind(l.shots_total)
        .bind(l.shots_on)
        .bind(l.goals_total)
        .bind(l.goals_conceded)
        .bind(l.goals_assists)
        .bind(l.goals_saves)
        .bind(l.passes_total)
        .bind(l.passes_key)
        .bind(l.passes_accuracy)
        .bind(l.tackles_total)
        .bind(l.tackles_blocks)
        .bind(l.tackles_interceptions)
        .bind(l.duels_total)
        .bind(l.duels_won)
        .bind(l.dribbles_attempts)
        .bind(l.dribbles_success)
        .bind(l.dribbles_past)
        .bind(l.fouls_drawn)
        .bind(l.fouls_committed)
        .bind(l.cards_yellow)
        .bind(l.cards_yellowred)
        .bind(l.cards_red)
        .bind(l.penalty_won)
        .bind(l.penalty_commited)
        .bind(l.penalty_scored)
        .bind(l.penalty_missed)
        .bind(l.penalty_saved)
}

pub async fn find_stat_snapshot(
    conn: &mut SqliteConnection,
    key: &StatKey,
) -> Result<Option<StatSnapshot>> {
    let row = sqlx::query(
        r#"SELECT stat_id, games_appearences, goals_total, goals_assists
           FROM player_season_stats
           WHERE player_id = ? AND team_id = ? AND league_id = ? AND season_year = ?"#,
    )
    .bind(key.player_id)
    .bind(key.team_id)
    .bind(key.league_id)
    .bind(key.season_year)
    .fetch_optional(&mut *conn)
    .await?;
    row.map(|r| -> Result<StatSnapshot> {
        Ok(StatSnapshot {
            stat_id: r.try_get("stat_id")?,
            appearances: r.try_get("games_appearences")?,
            goals: r.try_get("goals_total")?,
            assists: r.try_get("goals_assists")?,
        })
    })
    .transpose()
}

/// Full-column upsert on (player, team, league, season).
#[instrument(skip(conn, stats), fields(player_id = stats.key.player_id, league_id = stats.key.league_id, season = stats.key.season_year), level = "debug")]
pub async fn upsert_player_stats(
    conn: &mut SqliteConnection,
    stats: &PlayerSeasonStats,
) -> Result<UpsertOutcome> {
    let key = &stats.key;
    if let Some(existing) = find_stat_snapshot(conn, key).await? {
        bind_stat_line(sqlx::query(stat_update_sql()), &stats.line)
            .bind(existing.stat_id)
            .execute(&mut *conn)
            .await?;
        return Ok(UpsertOutcome::Updated(existing.stat_id));
    }
    let query = sqlx::query(stat_insert_sql())
        .bind(key.player_id)
        .bind(key.team_id)
        .bind(key.league_id)
        .bind(key.season_year);
    let id = bind_stat_line(query, &stats.line)
        .execute(&mut *conn)
        .await?
        .last_insert_rowid();
    Ok(UpsertOutcome::Inserted(id))
}

// ---- standings & fixtures --------------------------------------------------

#[instrument(skip(conn, row), fields(team_id = row.team_id, group = ?row.group_name), level = "debug")]
pub async fn upsert_standing(conn: &mut SqliteConnection, row: &StandingRow) -> Result<UpsertOutcome> {
    let existing: Option<i64> = sqlx::query_scalar(
        r#"SELECT standings_id FROM standings
           WHERE league_id = ? AND season_year = ? AND team_id = ? AND group_name IS ?"#,
    )
    .bind(row.league_id)
    .bind(row.season_year)
    .bind(row.team_id)
    .bind(row.group_name.as_deref())
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(id) = existing {
        sqlx::query(
            r#"UPDATE standings SET
                 rank = ?, points = ?, goals_diff = ?, played = ?, win = ?, draw = ?, lose = ?,
                 goals_for = ?, goals_against = ?, form = ?, status = ?, description = ?,
                 update_date = CURRENT_TIMESTAMP
               WHERE standings_id = ?"#,
        )
        .bind(row.rank)
        .bind(row.points)
        .bind(row.goals_diff)
        .bind(row.played)
        .bind(row.win)
        .bind(row.draw)
        .bind(row.lose)
        .bind(row.goals_for)
        .bind(row.goals_against)
        .bind(row.form.as_deref())
        .bind(row.status.as_deref())
        .bind(row.description.as_deref())
        .bind(id)
        .execute(&mut *conn)
        .await?;
        return Ok(UpsertOutcome::Updated(id));
    }

    let id = sqlx::query(
        r#"INSERT INTO standings (
             league_id, season_year, team_id, group_name, rank, points, goals_diff, played,
             win, draw, lose, goals_for, goals_against, form, status, description
           ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(row.league_id)
    .bind(row.season_year)
    .bind(row.team_id)
    .bind(row.group_name.as_deref())
    .bind(row.rank)
    .bind(row.points)
    .bind(row.goals_diff)
    .bind(row.played)
    .bind(row.win)
    .bind(row.draw)
    .bind(row.lose)
    .bind(row.goals_for)
    .bind(row.goals_against)
    .bind(row.form.as_deref())
    .bind(row.status.as_deref())
    .bind(row.description.as_deref())
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();
    Ok(UpsertOutcome::Inserted(id))
}

#[instrument(skip(conn, f), fields(api_id = f.api_id), level = "debug")]
pub async fn upsert_fixture(conn: &mut SqliteConnection, f: &FixtureRow) -> Result<UpsertOutcome> {
    let existing: Option<i64> = sqlx::query_scalar("SELECT fixture_id FROM fixtures WHERE api_id = ?")
        .bind(f.api_id)
        .fetch_optional(&mut *conn)
        .await?;

    if let Some(id) = existing {
        sqlx::query(
            r#"UPDATE fixtures SET
                 round = ?, date = ?, timestamp = ?, timezone = ?, venue_id = ?, status_long = ?,
                 status_short = ?, elapsed = ?, home_team_id = ?, away_team_id = ?,
                 goals_home = ?, goals_away = ?,
                 score_halftime_home = ?, score_halftime_away = ?,
                 score_fulltime_home = ?, score_fulltime_away = ?,
                 score_extratime_home = ?, score_extratime_away = ?,
                 score_penalty_home = ?, score_penalty_away = ?,
                 updated_at = CURRENT_TIMESTAMP
               WHERE fixture_id = ?"#,
        )
        .bind(f.round.as_deref())
        .bind(f.date.as_deref())
        .bind(f.timestamp)
        .bind(f.timezone.as_deref())
        .bind(f.venue_id)
        .bind(f.status_long.as_deref())
        .bind(f.status_short.as_deref())
        .bind(f.elapsed)
        .bind(f.home_team_id)
        .bind(f.away_team_id)
        .bind(f.goals_home)
        .bind(f.goals_away)
        .bind(f.score_halftime_home)
        .bind(f.score_halftime_away)
        .bind(f.score_fulltime_home)
        .bind(f.score_fulltime_away)
        .bind(f.score_extratime_home)
        .bind(f.score_extratime_away)
        .bind(f.score_penalty_home)
        .bind(f.score_penalty_away)
        .bind(id)
        .execute(&mut *conn)
        .await?;
        return Ok(UpsertOutcome::Updated(id));
    }

    let id = sqlx::query(
        r#"INSERT INTO fixtures (
             api_id, league_id, season_year, round, date, timestamp, timezone, venue_id,
             status_long, status_short, elapsed, home_team_id, away_team_id, goals_home, goals_away,
             score_halftime_home, score_halftime_away, score_fulltime_home, score_fulltime_away,
             score_extratime_home, score_extratime_away, score_penalty_home, score_penalty_away
           ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(f.api_id)
    .bind(f.league_id)
    .bind(f.season_year)
    .bind(f.round.as_deref())
    .bind(f.date.as_deref())
    .bind(f.timestamp)
    .bind(f.timezone.as_deref())
    .bind(f.venue_id)
    .bind(f.status_long.as_deref())
    .bind(f.status_short.as_deref())
    .bind(f.elapsed)
    .bind(f.home_team_id)
    .bind(f.away_team_id)
    .bind(f.goals_home)
    .bind(f.goals_away)
    .bind(f.score_halftime_home)
    .bind(f.score_halftime_away)
    .bind(f.score_fulltime_home)
    .bind(f.score_fulltime_away)
    .bind(f.score_extratime_home)
    .bind(f.score_extratime_away)
    .bind(f.score_penalty_home)
    .bind(f.score_penalty_away)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();
    Ok(UpsertOutcome::Inserted(id))
}

pub async fn find_fixture_api_id(conn: &mut SqliteConnection, fixture_id: i64) -> Result<Option<i64>> {
    Ok(sqlx::query_scalar("SELECT api_id FROM fixtures WHERE fixture_id = ?")
        .bind(fixture_id)
        .fetch_optional(&mut *conn)
        .await?)
}

// ---- fixture events --------------------------------------------------------

/// Finished fixtures of a league season with no stored events at all.
pub async fn find_event_candidates(
    conn: &mut SqliteConnection,
    league_id: i64,
    season_year: i32,
    limit: i64,
) -> Result<Vec<EventCandidate>> {
    let rows = sqlx::query(
        r#"SELECT f.fixture_id, f.api_id
           FROM fixtures f
           WHERE f.league_id = ? AND f.season_year = ?
             AND f.status_short IN (?, ?, ?)
             AND NOT EXISTS (SELECT 1 FROM fixture_events e WHERE e.fixture_id = f.fixture_id)
           ORDER BY f.fixture_id ASC
           LIMIT ?"#,
    )
    .bind(league_id)
    .bind(season_year)
    .bind(FINISHED_STATUSES[0])
    .bind(FINISHED_STATUSES[1])
    .bind(FINISHED_STATUSES[2])
    .bind(limit)
    .fetch_all(&mut *conn)
    .await?;
    rows.iter()
        .map(|r| -> Result<EventCandidate> {
            Ok(EventCandidate {
                fixture_id: r.try_get("fixture_id")?,
                api_id: r.try_get("api_id")?,
            })
        })
        .collect()
}

/// Delete-then-insert. Events have no per-row natural key, so the fixture's
/// whole list is the unit. Run inside a transaction.
#[instrument(skip(conn, events), fields(count = events.len()), level = "debug")]
pub async fn replace_fixture_events(
    conn: &mut SqliteConnection,
    fixture_id: i64,
    events: &[FixtureEventRow],
) -> Result<usize> {
    sqlx::query("DELETE FROM fixture_events WHERE fixture_id = ?")
        .bind(fixture_id)
        .execute(&mut *conn)
        .await?;
    for ev in events {
        sqlx::query(
            r#"INSERT INTO fixture_events (
                 fixture_id, time_elapsed, extra_minute, team_id, player_id, player_name,
                 assist_id, assist_name, type, detail, comments
               ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(fixture_id)
        .bind(ev.time_elapsed)
        .bind(ev.extra_minute)
        .bind(ev.team_id)
        .bind(ev.player_id)
        .bind(ev.player_name.as_deref())
        .bind(ev.assist_id)
        .bind(ev.assist_name.as_deref())
        .bind(ev.kind.as_deref())
        .bind(ev.detail.as_deref())
        .bind(ev.comments.as_deref())
        .execute(&mut *conn)
        .await?;
    }
    Ok(events.len())
}
