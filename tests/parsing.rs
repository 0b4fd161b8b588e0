use std::fs;
use std::path::PathBuf;

use matchday::api::{parse_fixtures_json, parse_standings_json};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn parses_live_fixtures_fixture() {
    let raw = read_fixture("fixtures_live.json");
    let rows = parse_fixtures_json(&raw).expect("fixture should parse");
    assert_eq!(rows.len(), 2);

    assert_eq!(rows[0].id, 1035045);
    assert_eq!(rows[0].home, "Bournemouth");
    assert_eq!(rows[0].away, "West Ham");
    assert_eq!(rows[0].status_short, "1H");
    assert_eq!(rows[0].elapsed, Some(31));
    assert_eq!(rows[0].goals_home, Some(2));
    assert_eq!(rows[0].goals_away, Some(0));
    assert_eq!(rows[0].league_id, 39);
    assert_eq!(rows[0].league_name, "Premier League");
    assert!(rows[0].is_live());

    assert_eq!(rows[1].league_name, "La Liga");
    assert_eq!(rows[1].status_short, "2H");
    assert!(rows[1].is_live());
}

#[test]
fn parses_scheduled_fixtures_fixture() {
    let raw = read_fixture("fixtures_date.json");
    let rows = parse_fixtures_json(&raw).expect("fixture should parse");
    assert_eq!(rows.len(), 2);
    for row in &rows {
        assert_eq!(row.status_short, "NS");
        assert_eq!(row.elapsed, None);
        assert_eq!(row.goals_home, None);
        assert!(!row.is_live());
    }
    assert_eq!(rows[0].kickoff, "2026-02-22T14:00:00+00:00");
    assert_eq!(rows[1].home, "Inter");
    assert_eq!(rows[1].away, "Juventus");
}

#[test]
fn parses_standings_fixture() {
    let raw = read_fixture("standings.json");
    let rows = parse_standings_json(&raw).expect("fixture should parse");
    assert_eq!(rows.len(), 4);

    assert_eq!(rows[0].rank, 1);
    assert_eq!(rows[0].team, "Arsenal");
    assert_eq!(rows[0].points, 59);
    assert_eq!(rows[0].played, 26);
    assert_eq!(rows[0].win, 18);
    assert_eq!(rows[0].goals_for, 56);
    assert_eq!(rows[0].goal_diff, 34);
    assert_eq!(rows[0].form.as_deref(), Some("WWDWW"));

    let wolves = rows.last().expect("rows should not be empty");
    assert_eq!(wolves.rank, 18);
    assert_eq!(wolves.goal_diff, -25);
}

#[test]
fn rows_without_required_fields_are_skipped() {
    let raw = r#"{
        "response": [
            { "fixture": { "id": 1 }, "teams": { "home": {}, "away": {} } },
            {
                "fixture": { "id": 2, "status": { "short": "FT" } },
                "teams": { "home": { "name": "Fulham" }, "away": { "name": "Everton" } },
                "goals": { "home": 0, "away": 0 }
            }
        ]
    }"#;
    let rows = parse_fixtures_json(raw).expect("should parse");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, 2);
    assert!(!rows[0].is_live());
}

#[test]
fn missing_response_array_parses_to_no_rows() {
    let rows = parse_fixtures_json(r#"{"errors": ["rate limit"]}"#).expect("should parse");
    assert!(rows.is_empty());
    let rows = parse_standings_json(r#"{"response": "nope"}"#).expect("should parse");
    assert!(rows.is_empty());
}
