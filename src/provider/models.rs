//! Typed payloads for the API-Football v3 endpoints we consume.
//!
//! Counters arrive as numbers, numeric strings or null depending on the
//! endpoint and the age of the record, so they go through the lenient
//! helpers below instead of plain `i64`.
use serde::{Deserialize, Deserializer};
use serde_json::Value;

fn value_as_i64(v: &Value) -> Option<i64> {
    if let Some(n) = v.as_i64() {
        return Some(n);
    }
    if let Some(f) = v.as_f64() {
        return Some(f.round() as i64);
    }
    if let Some(s) = v.as_str() {
        let trimmed = s.trim().trim_end_matches('%');
        if let Ok(n) = trimmed.parse::<i64>() {
            return Some(n);
        }
        return trimmed.parse::<f64>().ok().map(|f| f.round() as i64);
    }
    None
}

pub(crate) fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(value_as_i64))
}

pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Standard response wrapper. `errors` is `[]` when fine and an object such as
/// `{"rateLimit": "..."}` when the provider refuses the call with a 200.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    #[serde(default = "Vec::new")]
    pub response: Vec<T>,
    #[serde(default)]
    pub paging: Option<Paging>,
    #[serde(default)]
    pub errors: Value,
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
pub struct Paging {
    pub current: u32,
    pub total: u32,
}

/// One page of a paginated listing.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub current: u32,
    pub total: u32,
}

// ---- leagues ---------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct LeagueEntry {
    pub league: LeagueInfo,
    #[serde(default)]
    pub country: CountryInfo,
    #[serde(default)]
    pub seasons: Vec<SeasonInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeagueInfo {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CountryInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub flag: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeasonInfo {
    pub year: i32,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default)]
    pub current: bool,
    #[serde(default)]
    pub coverage: CoverageInfo,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct CoverageInfo {
    pub standings: bool,
    pub players: bool,
    pub top_scorers: bool,
    pub top_assists: bool,
    pub top_cards: bool,
    pub injuries: bool,
    pub predictions: bool,
    pub odds: bool,
}

// ---- teams -----------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct TeamEntry {
    pub team: TeamInfo,
    #[serde(default)]
    pub venue: Option<VenueInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TeamInfo {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub founded: Option<i64>,
    #[serde(default)]
    pub national: Option<bool>,
    #[serde(default)]
    pub logo: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct VenueInfo {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub capacity: Option<i64>,
    #[serde(default)]
    pub surface: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// Minimal team reference nested inside standings, fixtures and events.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TeamRef {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
}

// ---- players ---------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerEntry {
    pub player: PlayerInfo,
    #[serde(default)]
    pub statistics: Vec<StatisticsEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerInfo {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub firstname: Option<String>,
    #[serde(default)]
    pub lastname: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub age: Option<i64>,
    #[serde(default)]
    pub birth: Option<BirthInfo>,
    #[serde(default)]
    pub nationality: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub height: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub weight: Option<String>,
    #[serde(default)]
    pub injured: Option<bool>,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub foot: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct BirthInfo {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub place: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// One competition's worth of numbers for a player. A single player payload
/// can carry several of these (league, cup, continental).
#[derive(Debug, Clone, Deserialize)]
pub struct StatisticsEntry {
    #[serde(default)]
    pub team: TeamRef,
    pub league: StatLeague,
    #[serde(default)]
    pub games: GamesBlock,
    #[serde(default)]
    pub substitutes: SubstitutesBlock,
    #[serde(default)]
    pub shots: ShotsBlock,
    #[serde(default)]
    pub goals: GoalsBlock,
    #[serde(default)]
    pub passes: PassesBlock,
    #[serde(default)]
    pub tackles: TacklesBlock,
    #[serde(default)]
    pub duels: DuelsBlock,
    #[serde(default)]
    pub dribbles: DribblesBlock,
    #[serde(default)]
    pub fouls: FoulsBlock,
    #[serde(default)]
    pub cards: CardsBlock,
    #[serde(default)]
    pub penalty: PenaltyBlock,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct StatLeague {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub flag: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub season: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct GamesBlock {
    #[serde(deserialize_with = "lenient_i64")]
    pub appearences: Option<i64>,
    #[serde(deserialize_with = "lenient_i64")]
    pub lineups: Option<i64>,
    #[serde(deserialize_with = "lenient_i64")]
    pub minutes: Option<i64>,
    #[serde(deserialize_with = "lenient_i64")]
    pub number: Option<i64>,
    pub position: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub rating: Option<String>,
    pub captain: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SubstitutesBlock {
    #[serde(rename = "in", deserialize_with = "lenient_i64")]
    pub sub_in: Option<i64>,
    #[serde(rename = "out", deserialize_with = "lenient_i64")]
    pub sub_out: Option<i64>,
    #[serde(deserialize_with = "lenient_i64")]
    pub bench: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ShotsBlock {
    #[serde(deserialize_with = "lenient_i64")]
    pub total: Option<i64>,
    #[serde(deserialize_with = "lenient_i64")]
    pub on: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct GoalsBlock {
    #[serde(deserialize_with = "lenient_i64")]
    pub total: Option<i64>,
    #[serde(deserialize_with = "lenient_i64")]
    pub conceded: Option<i64>,
    #[serde(deserialize_with = "lenient_i64")]
    pub assists: Option<i64>,
    #[serde(deserialize_with = "lenient_i64")]
    pub saves: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PassesBlock {
    #[serde(deserialize_with = "lenient_i64")]
    pub total: Option<i64>,
    #[serde(deserialize_with = "lenient_i64")]
    pub key: Option<i64>,
    #[serde(deserialize_with = "lenient_i64")]
    pub accuracy: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TacklesBlock {
    #[serde(deserialize_with = "lenient_i64")]
    pub total: Option<i64>,
    #[serde(deserialize_with = "lenient_i64")]
    pub blocks: Option<i64>,
    #[serde(deserialize_with = "lenient_i64")]
    pub interceptions: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct DuelsBlock {
    #[serde(deserialize_with = "lenient_i64")]
    pub total: Option<i64>,
    #[serde(deserialize_with = "lenient_i64")]
    pub won: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct DribblesBlock {
    #[serde(deserialize_with = "lenient_i64")]
    pub attempts: Option<i64>,
    #[serde(deserialize_with = "lenient_i64")]
    pub success: Option<i64>,
    #[serde(deserialize_with = "lenient_i64")]
    pub past: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct FoulsBlock {
    #[serde(deserialize_with = "lenient_i64")]
    pub drawn: Option<i64>,
    #[serde(deserialize_with = "lenient_i64")]
    pub committed: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct CardsBlock {
    #[serde(deserialize_with = "lenient_i64")]
    pub yellow: Option<i64>,
    #[serde(deserialize_with = "lenient_i64")]
    pub yellowred: Option<i64>,
    #[serde(deserialize_with = "lenient_i64")]
    pub red: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PenaltyBlock {
    #[serde(deserialize_with = "lenient_i64")]
    pub won: Option<i64>,
    #[serde(deserialize_with = "lenient_i64")]
    pub commited: Option<i64>,
    #[serde(deserialize_with = "lenient_i64")]
    pub scored: Option<i64>,
    #[serde(deserialize_with = "lenient_i64")]
    pub missed: Option<i64>,
    #[serde(deserialize_with = "lenient_i64")]
    pub saved: Option<i64>,
}

// ---- standings -------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct StandingsEntry {
    pub league: StandingsLeague,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StandingsLeague {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub season: Option<i64>,
    /// One inner list per group (a plain league has exactly one).
    #[serde(default)]
    pub standings: Vec<Vec<StandingInfo>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StandingInfo {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub rank: Option<i64>,
    pub team: TeamRef,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub points: Option<i64>,
    #[serde(rename = "goalsDiff", default, deserialize_with = "lenient_i64")]
    pub goals_diff: Option<i64>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub form: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub all: StandingRecord,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct StandingRecord {
    #[serde(deserialize_with = "lenient_i64")]
    pub played: Option<i64>,
    #[serde(deserialize_with = "lenient_i64")]
    pub win: Option<i64>,
    #[serde(deserialize_with = "lenient_i64")]
    pub draw: Option<i64>,
    #[serde(deserialize_with = "lenient_i64")]
    pub lose: Option<i64>,
    pub goals: GoalsForAgainst,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct GoalsForAgainst {
    #[serde(rename = "for", deserialize_with = "lenient_i64")]
    pub scored: Option<i64>,
    #[serde(deserialize_with = "lenient_i64")]
    pub against: Option<i64>,
}

// ---- fixtures & events -----------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureEntry {
    pub fixture: FixtureInfo,
    #[serde(default)]
    pub league: FixtureLeague,
    #[serde(default)]
    pub teams: FixtureTeams,
    #[serde(default)]
    pub goals: ScorePair,
    #[serde(default)]
    pub score: ScoreBreakdown,
    /// Only populated by the single-fixture endpoint.
    #[serde(default)]
    pub events: Vec<EventInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureInfo {
    pub id: i64,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub venue: VenueInfo,
    #[serde(default)]
    pub status: FixtureStatus,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct FixtureStatus {
    pub long: Option<String>,
    pub short: Option<String>,
    #[serde(deserialize_with = "lenient_i64")]
    pub elapsed: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct FixtureLeague {
    pub id: Option<i64>,
    #[serde(deserialize_with = "lenient_i64")]
    pub season: Option<i64>,
    pub round: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct FixtureTeams {
    pub home: TeamRef,
    pub away: TeamRef,
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ScorePair {
    pub home: Option<i64>,
    pub away: Option<i64>,
}

#[derive(Debug, Clone, Copy, Deserialize, Default)]
#[serde(default)]
pub struct ScoreBreakdown {
    pub halftime: ScorePair,
    pub fulltime: ScorePair,
    pub extratime: ScorePair,
    pub penalty: ScorePair,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventInfo {
    #[serde(default)]
    pub time: EventTime,
    #[serde(default)]
    pub team: TeamRef,
    #[serde(default)]
    pub player: PersonRef,
    #[serde(default)]
    pub assist: PersonRef,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct EventTime {
    #[serde(deserialize_with = "lenient_i64")]
    pub elapsed: Option<i64>,
    #[serde(deserialize_with = "lenient_i64")]
    pub extra: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PersonRef {
    pub id: Option<i64>,
    pub name: Option<String>,
}
