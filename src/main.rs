use std::env;
use std::thread;

use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, Utc};

use matchday::api::{self, Fetched, FixtureRow, FootballApi, StandingRow};
use matchday::fetch::FetchConfig;
use matchday::prefs;

fn main() {
    dotenvy::dotenv().ok();
    let args: Vec<String> = env::args().skip(1).collect();
    if let Err(err) = run(&args) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run(args: &[String]) -> Result<()> {
    let Some(command) = args.first().map(|s| s.as_str()) else {
        print_usage();
        return Ok(());
    };

    let config = FetchConfig::from_env();
    let (api, log_rx) = FootballApi::new(config)?;
    let sweeper = api.service().spawn_sweeper();
    thread::spawn(move || {
        for line in log_rx {
            eprintln!("{line}");
        }
    });

    match command {
        "live" => {
            let fetched = api.live_fixtures()?;
            print_fixtures("Live fixtures", &fetched);
        }
        "date" => {
            let raw = args.get(1).context("usage: matchday date <YYYY-MM-DD>")?;
            let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .context("date must be YYYY-MM-DD")?;
            let fetched = api.fixtures_by_date(date)?;
            print_fixtures(&format!("Fixtures on {raw}"), &fetched);
        }
        "standings" => {
            let prefs = prefs::load();
            let league = args
                .get(1)
                .and_then(|val| val.parse::<u32>().ok())
                .or(prefs.default_league)
                .unwrap_or(39);
            let season = args
                .get(2)
                .and_then(|val| val.parse::<u16>().ok())
                .or(prefs.default_season)
                .unwrap_or_else(|| api::default_season(Utc::now().date_naive()));
            let fetched = api.standings(league, season)?;
            print_standings(league, season, &fetched);
        }
        other => {
            print_usage();
            bail!("unknown command: {other}");
        }
    }

    sweeper.stop();
    Ok(())
}

fn print_usage() {
    eprintln!("usage: matchday <command>");
    eprintln!("  live                         live fixtures across leagues");
    eprintln!("  date <YYYY-MM-DD>            fixtures on a day");
    eprintln!("  standings [league] [season]  league table (defaults from prefs)");
}

fn print_fixtures(title: &str, fetched: &Fetched<Vec<FixtureRow>>) {
    println!("{title}");
    if let Some(reason) = &fetched.degraded {
        println!("  !! fallback data ({reason})");
    }
    if fetched.data.is_empty() {
        println!("  no fixtures");
        return;
    }
    for row in &fetched.data {
        let score = match (row.goals_home, row.goals_away) {
            (Some(home), Some(away)) => format!("{home}-{away}"),
            _ => "vs".to_string(),
        };
        let clock = if row.is_live() {
            row.elapsed
                .map(|minute| format!("{minute}'"))
                .unwrap_or_else(|| row.status_short.clone())
        } else {
            row.status_short.clone()
        };
        println!(
            "  {:>4}  {:>26} {:^5} {:<26}  {}",
            clock, row.home, score, row.away, row.league_name
        );
    }
}

fn print_standings(league: u32, season: u16, fetched: &Fetched<Vec<StandingRow>>) {
    println!("Standings (league {league}, season {season})");
    if let Some(reason) = &fetched.degraded {
        println!("  !! fallback data ({reason})");
    }
    if fetched.data.is_empty() {
        println!("  no standings");
        return;
    }
    println!(
        "  {:>3}  {:<26} {:>2} {:>2} {:>2} {:>2} {:>3} {:>3} {:>4} {:>3}  {}",
        "#", "team", "P", "W", "D", "L", "GF", "GA", "GD", "Pts", "form"
    );
    for row in &fetched.data {
        println!(
            "  {:>3}  {:<26} {:>2} {:>2} {:>2} {:>2} {:>3} {:>3} {:>+4} {:>3}  {}",
            row.rank,
            row.team,
            row.played,
            row.win,
            row.draw,
            row.lose,
            row.goals_for,
            row.goals_against,
            row.goal_diff,
            row.points,
            row.form.as_deref().unwrap_or("-")
        );
    }
}
