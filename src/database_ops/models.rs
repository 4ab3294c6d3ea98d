//! Typed row records. Optional columns are `Option` so a missing upstream
//! field is visible at the type level instead of turning into a stray NULL.
use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

/// Per-(league, season) progress marker. Ordered: a tracker only moves up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncStatus {
    None,
    PartialDiscovery,
    Partial,
    Full,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::None => "NONE",
            SyncStatus::PartialDiscovery => "PARTIAL_DISCOVERY",
            SyncStatus::Partial => "PARTIAL",
            SyncStatus::Full => "FULL",
        }
    }

    /// Unknown strings read back as `None` rather than failing the row.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "PARTIAL_DISCOVERY" => SyncStatus::PartialDiscovery,
            "PARTIAL" => SyncStatus::Partial,
            "FULL" => SyncStatus::Full,
            _ => SyncStatus::None,
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Coverage {
    pub standings: bool,
    pub players: bool,
    pub top_scorers: bool,
    pub top_assists: bool,
    pub top_cards: bool,
    pub injuries: bool,
    pub predictions: bool,
    pub odds: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCountry {
    pub name: String,
    pub code: Option<String>,
    pub flag_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLeague {
    pub api_id: Option<i64>,
    pub name: String,
    pub kind: Option<String>,
    pub logo_url: Option<String>,
}

/// Season metadata as declared by the provider for a full import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeasonMeta {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub is_current: bool,
    pub coverage: Coverage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVenue {
    pub api_id: i64,
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub capacity: Option<i64>,
    pub surface: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTeam {
    pub api_id: i64,
    pub name: String,
    pub code: Option<String>,
    pub country: Option<String>,
    pub founded: Option<i64>,
    /// `None` when the payload does not say (stat entries never do).
    pub is_national_team: Option<bool>,
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPlayer {
    pub api_id: i64,
    pub name: String,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub age: Option<i64>,
    pub birth_date: Option<String>,
    pub birth_place: Option<String>,
    pub birth_country: Option<String>,
    pub nationality: Option<String>,
    pub height: Option<String>,
    pub weight: Option<String>,
    pub injured: bool,
    pub photo_url: Option<String>,
    pub preferred_foot: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatKey {
    pub player_id: i64,
    pub team_id: i64,
    pub league_id: i64,
    pub season_year: i32,
}

/// The performance counters of one player in one competition/team/season.
/// Missing counters are stored as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatLine {
    pub games_appearences: i64,
    pub games_lineups: i64,
    pub games_minutes: i64,
    pub games_number: Option<i64>,
    pub games_position: Option<String>,
    pub games_rating: Option<String>,
    pub games_captain: bool,
    pub substitutes_in: i64,
    pub substitutes_out: i64,
    pub substitutes_bench: i64,
    pub shots_total: i64,
    pub shots_on: i64,
    pub goals_total: i64,
    pub goals_conceded: i64,
    pub goals_assists: i64,
    pub goals_saves: i64,
    pub passes_total: i64,
    pub passes_key: i64,
    pub passes_accuracy: i64,
    pub tackles_total: i64,
    pub tackles_blocks: i64,
    pub tackles_interceptions: i64,
    pub duels_total: i64,
    pub duels_won: i64,
    pub dribbles_attempts: i64,
    pub dribbles_success: i64,
    pub dribbles_past: i64,
    pub fouls_drawn: i64,
    pub fouls_committed: i64,
    pub cards_yellow: i64,
    pub cards_yellowred: i64,
    pub cards_red: i64,
    pub penalty_won: i64,
    pub penalty_commited: i64,
    pub penalty_scored: i64,
    pub penalty_missed: i64,
    pub penalty_saved: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerSeasonStats {
    pub key: StatKey,
    pub line: StatLine,
}

/// The three columns reconciliation compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatSnapshot {
    pub stat_id: i64,
    pub appearances: i64,
    pub goals: i64,
    pub assists: i64,
}

impl StatSnapshot {
    pub fn differs_from(&self, line: &StatLine) -> bool {
        self.appearances != line.games_appearences
            || self.goals != line.goals_total
            || self.assists != line.goals_assists
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandingRow {
    pub league_id: i64,
    pub season_year: i32,
    pub team_id: i64,
    pub group_name: Option<String>,
    pub rank: Option<i64>,
    pub points: Option<i64>,
    pub goals_diff: Option<i64>,
    pub played: Option<i64>,
    pub win: Option<i64>,
    pub draw: Option<i64>,
    pub lose: Option<i64>,
    pub goals_for: Option<i64>,
    pub goals_against: Option<i64>,
    pub form: Option<String>,
    pub status: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureRow {
    pub api_id: i64,
    pub league_id: i64,
    pub season_year: i32,
    pub round: Option<String>,
    pub date: Option<String>,
    pub timestamp: Option<i64>,
    pub timezone: Option<String>,
    pub venue_id: Option<i64>,
    pub status_long: Option<String>,
    pub status_short: Option<String>,
    pub elapsed: Option<i64>,
    pub home_team_id: i64,
    pub away_team_id: i64,
    pub goals_home: Option<i64>,
    pub goals_away: Option<i64>,
    pub score_halftime_home: Option<i64>,
    pub score_halftime_away: Option<i64>,
    pub score_fulltime_home: Option<i64>,
    pub score_fulltime_away: Option<i64>,
    pub score_extratime_home: Option<i64>,
    pub score_extratime_away: Option<i64>,
    pub score_penalty_home: Option<i64>,
    pub score_penalty_away: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureEventRow {
    pub time_elapsed: Option<i64>,
    pub extra_minute: Option<i64>,
    /// Local team id, or the raw provider id when the team is unknown locally.
    pub team_id: Option<i64>,
    pub player_id: Option<i64>,
    pub player_name: Option<String>,
    pub assist_id: Option<i64>,
    pub assist_name: Option<String>,
    pub kind: Option<String>,
    pub detail: Option<String>,
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted(i64),
    Updated(i64),
}

impl UpsertOutcome {
    pub fn id(&self) -> i64 {
        match self {
            UpsertOutcome::Inserted(id) | UpsertOutcome::Updated(id) => *id,
        }
    }

    pub fn was_inserted(&self) -> bool {
        matches!(self, UpsertOutcome::Inserted(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeagueResolution {
    pub league_id: i64,
    /// True when no existing row matched and a discovered league was inserted.
    pub created: bool,
    /// True when a name match had its provider id filled in.
    pub linked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPlayer {
    pub player_id: i64,
    pub api_id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventCandidate {
    pub fixture_id: i64,
    pub api_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeasonTracker {
    pub league_season_id: i64,
    pub league_id: i64,
    pub season_year: i32,
    pub sync_status: SyncStatus,
    pub imported_players: bool,
    pub imported_standings: bool,
    pub imported_fixtures: bool,
    pub last_imported_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveredLeague {
    pub league_id: i64,
    pub api_id: Option<i64>,
    pub name: String,
    pub country: Option<String>,
    pub seasons: Vec<i32>,
}
