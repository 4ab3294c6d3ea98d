use reqwest::StatusCode;
use thiserror::Error;

/// Failures talking to the football data provider.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("provider rate limit hit ({reason})")]
    RateLimited { reason: String },
    #[error("provider request failed: status={status} body={body}")]
    Status { status: StatusCode, body: String },
    #[error("provider reported errors: {0}")]
    Provider(String),
    #[error("provider transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("failed to decode provider payload: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ApiError::RateLimited { .. })
    }
}

/// Fatal conditions that abort a sync job. Everything else is a per-batch
/// failure that gets logged and skipped.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("league {league_id} season {season} not found at provider")]
    LeagueNotFound { league_id: i64, season: i32 },
    #[error("league {league_id} has no seasons at provider")]
    LeagueSeasonsNotFound { league_id: i64 },
    #[error("player {player_id} not found in local database")]
    PlayerNotFound { player_id: i64 },
    #[error("fixture {fixture_id} not found in local database")]
    FixtureNotFound { fixture_id: i64 },
}
