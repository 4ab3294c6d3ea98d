//! Scripted in-memory provider for tests. Payloads are kept as JSON so they go
//! through the same serde path as real responses.
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::provider::models::{
    FixtureEntry, LeagueEntry, Page, PlayerEntry, StandingsEntry, TeamEntry,
};
use crate::provider::FootballApi;

#[derive(Debug, Default, Clone)]
pub(crate) struct Script {
    pub leagues: Vec<Value>,
    pub teams: Vec<Value>,
    /// team api id -> pages (1-based when requested)
    pub player_pages: HashMap<i64, Vec<Vec<Value>>>,
    pub failing_pages: HashSet<(i64, u32)>,
    pub standings: Vec<Value>,
    pub standings_fail: bool,
    pub fixtures: Vec<Value>,
    pub fixtures_fail: bool,
    /// fixture api id -> full fixture entry including events
    pub fixture_details: HashMap<i64, Value>,
    pub failing_fixtures: HashSet<i64>,
    pub player_seasons: HashMap<i64, Vec<i32>>,
    pub player_stats: HashMap<(i64, i32), Vec<Value>>,
    pub failing_stat_years: HashSet<i32>,
}

#[derive(Debug, Default)]
pub(crate) struct ScriptedApi {
    script: Mutex<Script>,
    calls: Mutex<Vec<String>>,
}

fn decode<T: DeserializeOwned>(values: &[Value]) -> Result<Vec<T>, ApiError> {
    values
        .iter()
        .map(|v| serde_json::from_value(v.clone()).map_err(ApiError::from))
        .collect()
}

fn server_error(what: &str) -> ApiError {
    ApiError::Status {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: format!("scripted failure: {what}"),
    }
}

impl ScriptedApi {
    pub fn new(script: Script) -> Self {
        Self {
            script: Mutex::new(script),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl FootballApi for ScriptedApi {
    async fn leagues(
        &self,
        league_id: i64,
        season: Option<i32>,
    ) -> Result<Vec<LeagueEntry>, ApiError> {
        self.record(format!("leagues:{league_id}:{season:?}"));
        let script = self.script.lock().unwrap();
        let matching: Vec<Value> = script
            .leagues
            .iter()
            .filter(|l| l["league"]["id"].as_i64() == Some(league_id))
            .cloned()
            .collect();
        decode(&matching)
    }

    async fn teams(&self, league_id: i64, season: i32) -> Result<Vec<TeamEntry>, ApiError> {
        self.record(format!("teams:{league_id}:{season}"));
        decode(&self.script.lock().unwrap().teams)
    }

    async fn players_page(
        &self,
        team_id: i64,
        season: i32,
        page: u32,
    ) -> Result<Page<PlayerEntry>, ApiError> {
        self.record(format!("players:{team_id}:{season}:{page}"));
        let script = self.script.lock().unwrap();
        if script.failing_pages.contains(&(team_id, page)) {
            return Err(server_error("players page"));
        }
        let pages = script.player_pages.get(&team_id).cloned().unwrap_or_default();
        let items = pages
            .get(page.saturating_sub(1) as usize)
            .cloned()
            .unwrap_or_default();
        Ok(Page {
            items: decode(&items)?,
            current: page,
            total: (pages.len() as u32).max(1),
        })
    }

    async fn standings(
        &self,
        league_id: i64,
        season: i32,
    ) -> Result<Vec<StandingsEntry>, ApiError> {
        self.record(format!("standings:{league_id}:{season}"));
        let script = self.script.lock().unwrap();
        if script.standings_fail {
            return Err(server_error("standings"));
        }
        decode(&script.standings)
    }

    async fn fixtures(&self, league_id: i64, season: i32) -> Result<Vec<FixtureEntry>, ApiError> {
        self.record(format!("fixtures:{league_id}:{season}"));
        let script = self.script.lock().unwrap();
        if script.fixtures_fail {
            return Err(server_error("fixtures"));
        }
        decode(&script.fixtures)
    }

    async fn fixture(&self, fixture_id: i64) -> Result<Vec<FixtureEntry>, ApiError> {
        self.record(format!("fixture:{fixture_id}"));
        let script = self.script.lock().unwrap();
        if script.failing_fixtures.contains(&fixture_id) {
            return Err(server_error("fixture"));
        }
        match script.fixture_details.get(&fixture_id) {
            Some(v) => decode(std::slice::from_ref(v)),
            None => Ok(Vec::new()),
        }
    }

    async fn player_seasons(&self, player_id: i64) -> Result<Vec<i32>, ApiError> {
        self.record(format!("player_seasons:{player_id}"));
        Ok(self
            .script
            .lock()
            .unwrap()
            .player_seasons
            .get(&player_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn player_statistics(
        &self,
        player_id: i64,
        season: i32,
    ) -> Result<Vec<PlayerEntry>, ApiError> {
        self.record(format!("player_statistics:{player_id}:{season}"));
        let script = self.script.lock().unwrap();
        if script.failing_stat_years.contains(&season) {
            return Err(server_error("player statistics"));
        }
        let entries = script
            .player_stats
            .get(&(player_id, season))
            .cloned()
            .unwrap_or_default();
        decode(&entries)
    }
}

// ---- payload builders ------------------------------------------------------

pub(crate) fn league_json(id: i64, name: &str, country: &str, year: i32) -> Value {
    json!({
        "league": {"id": id, "name": name, "type": "League", "logo": format!("https://media.test/leagues/{id}.png")},
        "country": {"name": country, "code": &country[..2].to_uppercase(), "flag": format!("https://media.test/flags/{country}.svg")},
        "seasons": [{
            "year": year, "start": format!("{year}-08-01"), "end": format!("{}-05-31", year + 1), "current": true,
            "coverage": {"standings": true, "players": true, "top_scorers": true, "top_assists": true,
                          "top_cards": false, "injuries": true, "predictions": true, "odds": false}
        }]
    })
}

pub(crate) fn team_json(id: i64, name: &str, venue_id: Option<i64>) -> Value {
    let venue = match venue_id {
        Some(v) => json!({"id": v, "name": format!("{name} Stadium"), "city": "Somewhere", "capacity": 40000}),
        None => json!({"id": null, "name": null}),
    };
    json!({
        "team": {"id": id, "name": name, "code": &name[..3].to_uppercase(), "country": "France",
                  "founded": 1900, "national": false, "logo": format!("https://media.test/teams/{id}.png")},
        "venue": venue
    })
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn stat_json(
    league_id: i64,
    league_name: &str,
    country: &str,
    team_id: i64,
    team_name: &str,
    appearances: i64,
    goals: i64,
    assists: i64,
) -> Value {
    json!({
        "team": {"id": team_id, "name": team_name, "logo": format!("https://media.test/teams/{team_id}.png")},
        "league": {"id": league_id, "name": league_name, "country": country, "logo": null, "flag": null, "season": 2023},
        "games": {"appearences": appearances, "lineups": appearances, "minutes": appearances * 80,
                   "number": null, "position": "Attacker", "rating": "7.1", "captain": false},
        "substitutes": {"in": 0, "out": 2, "bench": 1},
        "shots": {"total": 30, "on": 14},
        "goals": {"total": goals, "conceded": 0, "assists": assists, "saves": null},
        "passes": {"total": 400, "key": 20, "accuracy": 81},
        "tackles": {"total": 5, "blocks": null, "interceptions": 2},
        "duels": {"total": 100, "won": 48},
        "dribbles": {"attempts": 40, "success": 22, "past": null},
        "fouls": {"drawn": 15, "committed": 9},
        "cards": {"yellow": 2, "yellowred": 0, "red": 0},
        "penalty": {"won": null, "commited": null, "scored": 1, "missed": 0, "saved": null}
    })
}

pub(crate) fn player_json(id: i64, name: &str, statistics: Vec<Value>) -> Value {
    json!({
        "player": {"id": id, "name": name, "firstname": name, "lastname": "Test", "age": 25,
                    "birth": {"date": "1998-12-20", "place": "Paris", "country": "France"},
                    "nationality": "France", "height": "178 cm", "weight": "73 kg", "injured": false,
                    "photo": format!("https://media.test/players/{id}.png")},
        "statistics": statistics
    })
}

pub(crate) fn standings_json(league_id: i64, season: i32, groups: Vec<Vec<Value>>) -> Value {
    json!({"league": {"id": league_id, "season": season, "standings": groups}})
}

pub(crate) fn standing_json(team_id: i64, rank: i64, points: i64, group: Option<&str>) -> Value {
    json!({
        "rank": rank, "team": {"id": team_id, "name": format!("Team {team_id}")}, "points": points,
        "goalsDiff": 10 - rank, "group": group, "form": "WDLWW", "status": "same", "description": null,
        "all": {"played": 10, "win": 6, "draw": 2, "lose": 2, "goals": {"for": 20, "against": 10}}
    })
}

pub(crate) fn fixture_json(id: i64, home: i64, away: i64, status: &str, venue_id: Option<i64>) -> Value {
    json!({
        "fixture": {"id": id, "timezone": "UTC", "date": "2024-09-01T19:00:00+00:00", "timestamp": 1725217200,
                     "venue": {"id": venue_id, "name": venue_id.map(|v| format!("Venue {v}")), "city": "Paris"},
                     "status": {"long": "Match Finished", "short": status, "elapsed": 90}},
        "league": {"id": 61, "season": 2024, "round": "Regular Season - 1"},
        "teams": {"home": {"id": home, "name": format!("Team {home}")}, "away": {"id": away, "name": format!("Team {away}")}},
        "goals": {"home": 2, "away": 1},
        "score": {"halftime": {"home": 1, "away": 0}, "fulltime": {"home": 2, "away": 1},
                   "extratime": {"home": null, "away": null}, "penalty": {"home": null, "away": null}}
    })
}

pub(crate) fn event_json(team_id: i64, player_id: i64, kind: &str, detail: &str) -> Value {
    json!({
        "time": {"elapsed": 23, "extra": null},
        "team": {"id": team_id, "name": format!("Team {team_id}")},
        "player": {"id": player_id, "name": format!("Player {player_id}")},
        "assist": {"id": null, "name": null},
        "type": kind, "detail": detail, "comments": null
    })
}

pub(crate) fn fixture_with_events(id: i64, home: i64, away: i64, events: Vec<Value>) -> Value {
    let mut fixture = fixture_json(id, home, away, "FT", None);
    fixture["events"] = Value::Array(events);
    fixture
}
