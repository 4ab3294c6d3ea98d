//! Provider payload -> row record conversion. Pure functions, no I/O.
use crate::database_ops::models::{
    Coverage, FixtureEventRow, FixtureRow, NewCountry, NewLeague, NewPlayer, NewTeam, NewVenue,
    SeasonMeta, StandingRow, StatLine,
};
use crate::provider::models::{
    CountryInfo, EventInfo, FixtureEntry, LeagueInfo, PlayerInfo, SeasonInfo, StandingInfo,
    StatLeague, StatisticsEntry, TeamInfo, TeamRef, VenueInfo,
};

/// Country assumed for competitions the provider files under no nation.
pub const WORLD: &str = "World";

fn non_empty(s: &Option<String>) -> Option<String> {
    s.as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub fn country(api: &CountryInfo) -> Option<NewCountry> {
    Some(NewCountry {
        name: non_empty(&api.name)?,
        code: non_empty(&api.code),
        flag_url: api.flag.clone(),
    })
}

/// Statistics entries only name the country; code is never present there.
pub fn country_from_stat(league: &StatLeague) -> NewCountry {
    NewCountry {
        name: non_empty(&league.country).unwrap_or_else(|| WORLD.to_string()),
        code: None,
        flag_url: league.flag.clone(),
    }
}

pub fn league(api: &LeagueInfo) -> NewLeague {
    NewLeague {
        api_id: Some(api.id),
        name: api.name.trim().to_string(),
        kind: api.kind.clone(),
        logo_url: api.logo.clone(),
    }
}

pub fn league_from_stat(api: &StatLeague) -> Option<NewLeague> {
    Some(NewLeague {
        api_id: api.id,
        name: non_empty(&api.name)?,
        kind: None,
        logo_url: api.logo.clone(),
    })
}

pub fn season_meta(api: &SeasonInfo) -> SeasonMeta {
    let c = &api.coverage;
    SeasonMeta {
        start_date: api.start.clone(),
        end_date: api.end.clone(),
        is_current: api.current,
        coverage: Coverage {
            standings: c.standings,
            players: c.players,
            top_scorers: c.top_scorers,
            top_assists: c.top_assists,
            top_cards: c.top_cards,
            injuries: c.injuries,
            predictions: c.predictions,
            odds: c.odds,
        },
    }
}

/// Venues without a provider id cannot be keyed and are skipped.
pub fn venue(api: &VenueInfo) -> Option<NewVenue> {
    Some(NewVenue {
        api_id: api.id?,
        name: api.name.clone(),
        address: api.address.clone(),
        city: api.city.clone(),
        capacity: api.capacity,
        surface: api.surface.clone(),
        image_url: api.image.clone(),
    })
}

pub fn team(api: &TeamInfo) -> NewTeam {
    NewTeam {
        api_id: api.id,
        name: api.name.clone(),
        code: non_empty(&api.code),
        country: api.country.clone(),
        founded: api.founded,
        is_national_team: api.national,
        logo_url: api.logo.clone(),
    }
}

pub fn team_from_ref(api: &TeamRef) -> Option<NewTeam> {
    Some(NewTeam {
        api_id: api.id?,
        name: non_empty(&api.name)?,
        code: None,
        country: None,
        founded: None,
        is_national_team: None,
        logo_url: api.logo.clone(),
    })
}

pub fn player(api: &PlayerInfo) -> NewPlayer {
    let birth = api.birth.clone().unwrap_or_default();
    NewPlayer {
        api_id: api.id,
        name: api.name.clone(),
        firstname: api.firstname.clone(),
        lastname: api.lastname.clone(),
        age: api.age,
        birth_date: birth.date,
        birth_place: birth.place,
        birth_country: birth.country,
        nationality: api.nationality.clone(),
        height: api.height.clone(),
        weight: api.weight.clone(),
        injured: api.injured.unwrap_or(false),
        photo_url: api.photo.clone(),
        preferred_foot: api.foot.clone(),
    }
}

pub fn stat_line(s: &StatisticsEntry) -> StatLine {
    StatLine {
        games_appearences: s.games.appearences.unwrap_or(0),
        games_lineups: s.games.lineups.unwrap_or(0),
        games_minutes: s.games.minutes.unwrap_or(0),
        games_number: s.games.number,
        games_position: s.games.position.clone(),
        games_rating: s.games.rating.clone(),
        games_captain: s.games.captain.unwrap_or(false),
        substitutes_in: s.substitutes.sub_in.unwrap_or(0),
        substitutes_out: s.substitutes.sub_out.unwrap_or(0),
        substitutes_bench: s.substitutes.bench.unwrap_or(0),
        shots_total: s.shots.total.unwrap_or(0),
        shots_on: s.shots.on.unwrap_or(0),
        goals_total: s.goals.total.unwrap_or(0),
        goals_conceded: s.goals.conceded.unwrap_or(0),
        goals_assists: s.goals.assists.unwrap_or(0),
        goals_saves: s.goals.saves.unwrap_or(0),
        passes_total: s.passes.total.unwrap_or(0),
        passes_key: s.passes.key.unwrap_or(0),
        passes_accuracy: s.passes.accuracy.unwrap_or(0),
        tackles_total: s.tackles.total.unwrap_or(0),
        tackles_blocks: s.tackles.blocks.unwrap_or(0),
        tackles_interceptions: s.tackles.interceptions.unwrap_or(0),
        duels_total: s.duels.total.unwrap_or(0),
        duels_won: s.duels.won.unwrap_or(0),
        dribbles_attempts: s.dribbles.attempts.unwrap_or(0),
        dribbles_success: s.dribbles.success.unwrap_or(0),
        dribbles_past: s.dribbles.past.unwrap_or(0),
        fouls_drawn: s.fouls.drawn.unwrap_or(0),
        fouls_committed: s.fouls.committed.unwrap_or(0),
        cards_yellow: s.cards.yellow.unwrap_or(0),
        cards_yellowred: s.cards.yellowred.unwrap_or(0),
        cards_red: s.cards.red.unwrap_or(0),
        penalty_won: s.penalty.won.unwrap_or(0),
        penalty_commited: s.penalty.commited.unwrap_or(0),
        penalty_scored: s.penalty.scored.unwrap_or(0),
        penalty_missed: s.penalty.missed.unwrap_or(0),
        penalty_saved: s.penalty.saved.unwrap_or(0),
    }
}

pub fn standing(api: &StandingInfo, league_id: i64, season_year: i32, team_id: i64) -> StandingRow {
    StandingRow {
        league_id,
        season_year,
        team_id,
        group_name: non_empty(&api.group),
        rank: api.rank,
        points: api.points,
        goals_diff: api.goals_diff,
        played: api.all.played,
        win: api.all.win,
        draw: api.all.draw,
        lose: api.all.lose,
        goals_for: api.all.goals.scored,
        goals_against: api.all.goals.against,
        form: api.form.clone(),
        status: api.status.clone(),
        description: api.description.clone(),
    }
}

pub fn fixture(
    api: &FixtureEntry,
    league_id: i64,
    season_year: i32,
    venue_id: Option<i64>,
    home_team_id: i64,
    away_team_id: i64,
) -> FixtureRow {
    let score = &api.score;
    FixtureRow {
        api_id: api.fixture.id,
        league_id,
        season_year,
        round: api.league.round.clone(),
        date: api.fixture.date.clone(),
        timestamp: api.fixture.timestamp,
        timezone: api.fixture.timezone.clone(),
        venue_id,
        status_long: api.fixture.status.long.clone(),
        status_short: api.fixture.status.short.clone(),
        elapsed: api.fixture.status.elapsed,
        home_team_id,
        away_team_id,
        goals_home: api.goals.home,
        goals_away: api.goals.away,
        score_halftime_home: score.halftime.home,
        score_halftime_away: score.halftime.away,
        score_fulltime_home: score.fulltime.home,
        score_fulltime_away: score.fulltime.away,
        score_extratime_home: score.extratime.home,
        score_extratime_away: score.extratime.away,
        score_penalty_home: score.penalty.home,
        score_penalty_away: score.penalty.away,
    }
}

pub fn event(api: &EventInfo, team_id: Option<i64>) -> FixtureEventRow {
    FixtureEventRow {
        time_elapsed: api.time.elapsed,
        extra_minute: api.time.extra,
        team_id,
        player_id: api.player.id,
        player_name: api.player.name.clone(),
        assist_id: api.assist.id,
        assist_name: api.assist.name.clone(),
        kind: api.kind.clone(),
        detail: api.detail.clone(),
        comments: api.comments.clone(),
    }
}
