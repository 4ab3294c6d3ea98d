use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::ApiError;
use crate::provider::client::{fetch_with_retry, RetryPolicy};
use crate::provider::models::{
    Envelope, FixtureEntry, LeagueEntry, Page, PlayerEntry, StandingsEntry, TeamEntry,
};
use crate::util::env::{env_opt, env_parse, env_req};

pub const DEFAULT_BASE_URL: &str = "https://v3.football.api-sports.io";

fn truncate_for_log(mut s: String, max_len: usize) -> String {
    if s.len() > max_len {
        let mut cut = max_len;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        s.truncate(cut);
        s.push('…');
    }
    s
}

/// Everything the sync engine needs from the provider. Implemented over HTTP by
/// [`ApiFootballClient`]; tests substitute a scripted fake.
#[async_trait]
pub trait FootballApi: Send + Sync {
    /// `GET /leagues?id=..[&season=..]`
    async fn leagues(&self, league_id: i64, season: Option<i32>)
        -> Result<Vec<LeagueEntry>, ApiError>;

    /// `GET /teams?league=..&season=..`
    async fn teams(&self, league_id: i64, season: i32) -> Result<Vec<TeamEntry>, ApiError>;

    /// `GET /players?team=..&season=..&page=..`
    async fn players_page(
        &self,
        team_id: i64,
        season: i32,
        page: u32,
    ) -> Result<Page<PlayerEntry>, ApiError>;

    /// `GET /standings?league=..&season=..`
    async fn standings(&self, league_id: i64, season: i32)
        -> Result<Vec<StandingsEntry>, ApiError>;

    /// `GET /fixtures?league=..&season=..`
    async fn fixtures(&self, league_id: i64, season: i32) -> Result<Vec<FixtureEntry>, ApiError>;

    /// `GET /fixtures?id=..`, the only fixture call that carries events.
    async fn fixture(&self, fixture_id: i64) -> Result<Vec<FixtureEntry>, ApiError>;

    /// `GET /players/seasons?player=..`
    async fn player_seasons(&self, player_id: i64) -> Result<Vec<i32>, ApiError>;

    /// `GET /players?id=..&season=..`
    async fn player_statistics(
        &self,
        player_id: i64,
        season: i32,
    ) -> Result<Vec<PlayerEntry>, ApiError>;
}

/// API-Football v3 over HTTP. Every request goes through [`fetch_with_retry`].
#[derive(Debug, Clone)]
pub struct ApiFootballClient {
    base_url: String,
    http: Client,
    api_key: String,
    retry: RetryPolicy,
}

impl ApiFootballClient {
    pub fn new(
        base_url: Option<&str>,
        api_key: impl Into<String>,
        timeout_secs: Option<u64>,
        retry: RetryPolicy,
    ) -> Result<Self> {
        let base_url = base_url
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();
        url::Url::parse(&base_url).with_context(|| format!("invalid provider base url {base_url}"))?;
        let http = Client::builder()
            .user_agent("pitchsync/0.1")
            .timeout(Duration::from_secs(timeout_secs.unwrap_or(15)))
            .build()?;
        Ok(Self {
            base_url,
            http,
            api_key: api_key.into(),
            retry,
        })
    }

    /// Build from `API_FOOTBALL_KEY`, `API_FOOTBALL_BASE_URL` and `API_FOOTBALL_TIMEOUT_SECS`.
    pub fn from_env(retry: RetryPolicy) -> Result<Self> {
        let key = env_req("API_FOOTBALL_KEY")?;
        let base = env_opt("API_FOOTBALL_BASE_URL");
        let timeout = env_parse("API_FOOTBALL_TIMEOUT_SECS", 15u64);
        Self::new(base.as_deref(), key, Some(timeout), retry)
    }

    #[instrument(skip(self), level = "debug")]
    async fn get<T>(&self, path: &str, query: &[(&str, String)]) -> Result<Envelope<T>, ApiError>
    where
        T: DeserializeOwned,
    {
        fetch_with_retry(&self.retry, || self.get_once::<T>(path, query)).await
    }

    async fn get_once<T>(&self, path: &str, query: &[(&str, String)]) -> Result<Envelope<T>, ApiError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .http
            .get(&url)
            .header("x-apisports-key", &self.api_key)
            .header("Accept", "application/json")
            .query(query)
            .send()
            .await?;
        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ApiError::RateLimited {
                reason: format!("status {status} for {path}"),
            });
        }
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(ApiError::Status {
                status,
                body: truncate_for_log(text, 2000),
            });
        }
        let envelope: Envelope<T> = serde_json::from_str(&text)?;
        check_envelope_errors(&envelope.errors)?;
        debug!(path, results = envelope.response.len(), "provider call ok");
        Ok(envelope)
    }
}

/// API-Football signals quota problems inside a 200 body; surface them as errors.
fn check_envelope_errors(errors: &Value) -> Result<(), ApiError> {
    let is_empty = match errors {
        Value::Null => true,
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    };
    if is_empty {
        return Ok(());
    }
    if let Some(obj) = errors.as_object() {
        if let Some(reason) = obj.get("rateLimit") {
            return Err(ApiError::RateLimited {
                reason: reason.as_str().unwrap_or("rateLimit").to_string(),
            });
        }
    }
    Err(ApiError::Provider(errors.to_string()))
}

#[async_trait]
impl FootballApi for ApiFootballClient {
    async fn leagues(
        &self,
        league_id: i64,
        season: Option<i32>,
    ) -> Result<Vec<LeagueEntry>, ApiError> {
        let mut query = vec![("id", league_id.to_string())];
        if let Some(season) = season {
            query.push(("season", season.to_string()));
        }
        Ok(self.get("/leagues", &query).await?.response)
    }

    async fn teams(&self, league_id: i64, season: i32) -> Result<Vec<TeamEntry>, ApiError> {
        let query = [("league", league_id.to_string()), ("season", season.to_string())];
        Ok(self.get("/teams", &query).await?.response)
    }

    async fn players_page(
        &self,
        team_id: i64,
        season: i32,
        page: u32,
    ) -> Result<Page<PlayerEntry>, ApiError> {
        let query = [
            ("team", team_id.to_string()),
            ("season", season.to_string()),
            ("page", page.to_string()),
        ];
        let envelope = self.get::<PlayerEntry>("/players", &query).await?;
        let paging = envelope.paging.unwrap_or_default();
        Ok(Page {
            items: envelope.response,
            current: paging.current.max(page),
            total: paging.total.max(1),
        })
    }

    async fn standings(
        &self,
        league_id: i64,
        season: i32,
    ) -> Result<Vec<StandingsEntry>, ApiError> {
        let query = [("league", league_id.to_string()), ("season", season.to_string())];
        Ok(self.get("/standings", &query).await?.response)
    }

    async fn fixtures(&self, league_id: i64, season: i32) -> Result<Vec<FixtureEntry>, ApiError> {
        let query = [("league", league_id.to_string()), ("season", season.to_string())];
        Ok(self.get("/fixtures", &query).await?.response)
    }

    async fn fixture(&self, fixture_id: i64) -> Result<Vec<FixtureEntry>, ApiError> {
        let query = [("id", fixture_id.to_string())];
        Ok(self.get("/fixtures", &query).await?.response)
    }

    async fn player_seasons(&self, player_id: i64) -> Result<Vec<i32>, ApiError> {
        let query = [("player", player_id.to_string())];
        Ok(self.get("/players/seasons", &query).await?.response)
    }

    async fn player_statistics(
        &self,
        player_id: i64,
        season: i32,
    ) -> Result<Vec<PlayerEntry>, ApiError> {
        let query = [("id", player_id.to_string()), ("season", season.to_string())];
        Ok(self.get("/players", &query).await?.response)
    }
}
