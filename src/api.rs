use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use serde_json::Value;
use std::sync::mpsc::Receiver;

use crate::fetch::{DegradeReason, FetchConfig, FetchOutcome, FetchService};

/// Builds a canonical endpoint key: path plus query parameters in sorted
/// order, so the same logical request always produces the same cache key.
pub fn endpoint_key(path: &str, params: &[(&str, String)]) -> String {
    if params.is_empty() {
        return path.to_string();
    }
    let mut params = params.to_vec();
    params.sort_by(|a, b| a.0.cmp(b.0));
    let query = params
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("&");
    format!("{path}?{query}")
}

pub fn live_fixtures_key() -> String {
    endpoint_key("fixtures", &[("live", "all".to_string())])
}

pub fn fixtures_by_date_key(date: NaiveDate) -> String {
    endpoint_key("fixtures", &[("date", date.format("%Y-%m-%d").to_string())])
}

pub fn standings_key(league: u32, season: u16) -> String {
    endpoint_key(
        "standings",
        &[("league", league.to_string()), ("season", season.to_string())],
    )
}

/// API-Football labels club seasons by their starting year; the European
/// season rolls over in July.
pub fn default_season(today: NaiveDate) -> u16 {
    let year = today.year() as u16;
    if today.month() >= 7 { year } else { year - 1 }
}

#[derive(Debug, Clone)]
pub struct FixtureRow {
    pub id: u64,
    pub kickoff: String,
    pub status_short: String,
    pub elapsed: Option<u16>,
    pub league_id: u32,
    pub league_name: String,
    pub home: String,
    pub away: String,
    pub goals_home: Option<u8>,
    pub goals_away: Option<u8>,
}

impl FixtureRow {
    pub fn is_live(&self) -> bool {
        matches!(
            self.status_short.as_str(),
            "1H" | "HT" | "2H" | "ET" | "BT" | "P" | "SUSP" | "INT" | "LIVE"
        )
    }
}

#[derive(Debug, Clone)]
pub struct StandingRow {
    pub rank: u16,
    pub team_id: u32,
    pub team: String,
    pub played: u8,
    pub win: u8,
    pub draw: u8,
    pub lose: u8,
    pub goals_for: u16,
    pub goals_against: u16,
    pub goal_diff: i16,
    pub points: u16,
    pub form: Option<String>,
}

/// Parsed payload plus its provenance: `degraded` carries the reason when
/// the rows came from seed data rather than the wire.
#[derive(Debug, Clone)]
pub struct Fetched<T> {
    pub data: T,
    pub degraded: Option<DegradeReason>,
}

/// Client for the API-Football v3 surface, layered over the rate-limited
/// fetch service. Fixture and standings queries go through the real
/// network path; see the stub methods for the endpoints that do not.
pub struct FootballApi {
    service: FetchService,
}

impl FootballApi {
    pub fn new(config: FetchConfig) -> Result<(Self, Receiver<String>)> {
        let (service, log_rx) = FetchService::new(config)?;
        Ok((Self { service }, log_rx))
    }

    pub fn from_service(service: FetchService) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &FetchService {
        &self.service
    }

    pub fn live_fixtures(&self) -> Result<Fetched<Vec<FixtureRow>>> {
        self.fetch_rows(&live_fixtures_key(), fixtures_from_value)
    }

    pub fn fixtures_by_date(&self, date: NaiveDate) -> Result<Fetched<Vec<FixtureRow>>> {
        self.fetch_rows(&fixtures_by_date_key(date), fixtures_from_value)
    }

    pub fn standings(&self, league: u32, season: u16) -> Result<Fetched<Vec<StandingRow>>> {
        self.fetch_rows(&standings_key(league, season), standings_from_value)
    }

    /// Not wired to the network; always resolves to an empty set.
    pub fn predictions(&self, _fixture_id: u64) -> Vec<Value> {
        Vec::new()
    }

    /// Not wired to the network; always resolves to an empty set.
    pub fn odds(&self, _fixture_id: u64) -> Vec<Value> {
        Vec::new()
    }

    /// Not wired to the network; always resolves to an empty set.
    pub fn injuries(&self, _team_id: u32, _season: u16) -> Vec<Value> {
        Vec::new()
    }

    fn fetch_rows<T>(&self, key: &str, rows: fn(&Value) -> Vec<T>) -> Result<Fetched<Vec<T>>> {
        match self.service.request(key, None).wait() {
            FetchOutcome::Ok(value) => Ok(Fetched {
                data: rows(&value),
                degraded: None,
            }),
            FetchOutcome::Degraded { value, reason } => Ok(Fetched {
                data: rows(&value),
                degraded: Some(reason),
            }),
            FetchOutcome::Failed(err) => Err(err.into()),
        }
    }
}

pub fn parse_fixtures_json(raw: &str) -> Result<Vec<FixtureRow>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    let root: Value = serde_json::from_str(trimmed).context("invalid fixtures json")?;
    Ok(fixtures_from_value(&root))
}

pub fn fixtures_from_value(root: &Value) -> Vec<FixtureRow> {
    let mut out = Vec::new();
    let Some(list) = root.get("response").and_then(|v| v.as_array()) else {
        return out;
    };
    for item in list {
        if let Some(row) = parse_fixture_row(item) {
            out.push(row);
        }
    }
    out
}

fn parse_fixture_row(v: &Value) -> Option<FixtureRow> {
    let fixture = v.get("fixture")?;
    let id = fixture.get("id")?.as_u64()?;
    let kickoff = fixture
        .get("date")
        .and_then(|x| x.as_str())
        .unwrap_or_default()
        .to_string();
    let status = fixture.get("status").unwrap_or(&Value::Null);
    let status_short = status
        .get("short")
        .and_then(|x| x.as_str())
        .unwrap_or("NS")
        .to_string();
    let elapsed = status
        .get("elapsed")
        .and_then(|x| x.as_u64())
        .map(|m| m as u16);

    let league = v.get("league").unwrap_or(&Value::Null);
    let league_id = league.get("id").and_then(|x| x.as_u64()).unwrap_or(0) as u32;
    let league_name = league
        .get("name")
        .and_then(|x| x.as_str())
        .unwrap_or_default()
        .to_string();

    let teams = v.get("teams")?;
    let home = teams
        .get("home")
        .and_then(|t| t.get("name"))
        .and_then(|x| x.as_str())?
        .to_string();
    let away = teams
        .get("away")
        .and_then(|t| t.get("name"))
        .and_then(|x| x.as_str())?
        .to_string();

    let goals = v.get("goals").unwrap_or(&Value::Null);
    let goals_home = goals.get("home").and_then(|x| x.as_u64()).map(|g| g as u8);
    let goals_away = goals.get("away").and_then(|x| x.as_u64()).map(|g| g as u8);

    Some(FixtureRow {
        id,
        kickoff,
        status_short,
        elapsed,
        league_id,
        league_name,
        home,
        away,
        goals_home,
        goals_away,
    })
}

pub fn parse_standings_json(raw: &str) -> Result<Vec<StandingRow>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    let root: Value = serde_json::from_str(trimmed).context("invalid standings json")?;
    Ok(standings_from_value(&root))
}

pub fn standings_from_value(root: &Value) -> Vec<StandingRow> {
    let mut out = Vec::new();
    let Some(list) = root.get("response").and_then(|v| v.as_array()) else {
        return out;
    };
    for entry in list {
        // standings is an array of groups (single group for a league table,
        // several for group stages); flatten them in order.
        let Some(groups) = entry
            .get("league")
            .and_then(|l| l.get("standings"))
            .and_then(|s| s.as_array())
        else {
            continue;
        };
        for group in groups {
            let Some(rows) = group.as_array() else {
                continue;
            };
            for row in rows {
                if let Some(standing) = parse_standing_row(row) {
                    out.push(standing);
                }
            }
        }
    }
    out
}

fn parse_standing_row(v: &Value) -> Option<StandingRow> {
    let rank = v.get("rank")?.as_u64()? as u16;
    let team = v.get("team")?;
    let team_id = team.get("id").and_then(|x| x.as_u64()).unwrap_or(0) as u32;
    let team_name = team.get("name").and_then(|x| x.as_str())?.to_string();
    let points = v.get("points").and_then(|x| x.as_u64()).unwrap_or(0) as u16;
    let goal_diff = v.get("goalsDiff").and_then(|x| x.as_i64()).unwrap_or(0) as i16;
    let form = v
        .get("form")
        .and_then(|x| x.as_str())
        .map(|s| s.to_string());

    let all = v.get("all").unwrap_or(&Value::Null);
    let played = all.get("played").and_then(|x| x.as_u64()).unwrap_or(0) as u8;
    let win = all.get("win").and_then(|x| x.as_u64()).unwrap_or(0) as u8;
    let draw = all.get("draw").and_then(|x| x.as_u64()).unwrap_or(0) as u8;
    let lose = all.get("lose").and_then(|x| x.as_u64()).unwrap_or(0) as u8;
    let goals = all.get("goals").unwrap_or(&Value::Null);
    let goals_for = goals.get("for").and_then(|x| x.as_u64()).unwrap_or(0) as u16;
    let goals_against = goals.get("against").and_then(|x| x.as_u64()).unwrap_or(0) as u16;

    Some(StandingRow {
        rank,
        team_id,
        team: team_name,
        played,
        win,
        draw,
        lose,
        goals_for,
        goals_against,
        goal_diff,
        points,
        form,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn endpoint_key_sorts_parameters() {
        let a = endpoint_key("standings", &[("season", "2026".into()), ("league", "39".into())]);
        let b = endpoint_key("standings", &[("league", "39".into()), ("season", "2026".into())]);
        assert_eq!(a, b);
        assert_eq!(a, "standings?league=39&season=2026");
    }

    #[test]
    fn endpoint_key_without_params_is_the_path() {
        assert_eq!(endpoint_key("timezone", &[]), "timezone");
    }

    #[test]
    fn fixture_key_builders() {
        assert_eq!(live_fixtures_key(), "fixtures?live=all");
        let date = NaiveDate::from_ymd_opt(2026, 8, 16).expect("valid date");
        assert_eq!(fixtures_by_date_key(date), "fixtures?date=2026-08-16");
    }

    #[test]
    fn season_rolls_over_in_july() {
        let june = NaiveDate::from_ymd_opt(2026, 6, 30).expect("valid date");
        let july = NaiveDate::from_ymd_opt(2026, 7, 1).expect("valid date");
        assert_eq!(default_season(june), 2025);
        assert_eq!(default_season(july), 2026);
    }

    #[test]
    fn fixture_rows_skip_entries_without_teams() {
        let root = json!({
            "response": [
                { "fixture": { "id": 7 } },
                {
                    "fixture": { "id": 8, "date": "2026-08-16T13:00:00+00:00",
                                 "status": { "short": "1H", "elapsed": 23 } },
                    "league": { "id": 39, "name": "Premier League" },
                    "teams": { "home": { "name": "Arsenal" }, "away": { "name": "Chelsea" } },
                    "goals": { "home": 1, "away": 0 }
                }
            ]
        });
        let rows = fixtures_from_value(&root);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, 8);
        assert_eq!(rows[0].home, "Arsenal");
        assert_eq!(rows[0].elapsed, Some(23));
        assert!(rows[0].is_live());
    }

    #[test]
    fn empty_or_null_bodies_parse_to_no_rows() {
        assert!(parse_fixtures_json("").expect("empty body should parse").is_empty());
        assert!(parse_fixtures_json("null").expect("null body should parse").is_empty());
        assert!(parse_standings_json("null").expect("null body should parse").is_empty());
    }

    #[test]
    fn standings_groups_flatten_in_order() {
        let root = json!({
            "response": [{
                "league": {
                    "id": 39,
                    "standings": [
                        [
                            { "rank": 1, "team": { "id": 42, "name": "Arsenal" }, "points": 9,
                              "goalsDiff": 5, "form": "WWW",
                              "all": { "played": 3, "win": 3, "draw": 0, "lose": 0,
                                       "goals": { "for": 7, "against": 2 } } },
                            { "rank": 2, "team": { "id": 40, "name": "Liverpool" }, "points": 7,
                              "goalsDiff": 4,
                              "all": { "played": 3, "win": 2, "draw": 1, "lose": 0,
                                       "goals": { "for": 6, "against": 2 } } }
                        ]
                    ]
                }
            }]
        });
        let rows = standings_from_value(&root);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].team, "Arsenal");
        assert_eq!(rows[0].points, 9);
        assert_eq!(rows[1].rank, 2);
        assert_eq!(rows[1].goal_diff, 4);
        assert_eq!(rows[1].form, None);
    }
}
