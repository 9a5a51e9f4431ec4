#![deny(warnings)]

//! Headless CLI: builds a league, plays a double round-robin season and
//! prints the tables.

use anyhow::{bail, Context, Result};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use sim_core::{
    validate_league, validate_match_config, Match, MatchConfig, Player, Schedule, SimConfig, Team, TeamId, TeamRecord,
};
use sim_match::squad::generate_team;
use sim_match::MatchSimulator;
use sim_schedule::{generate_schedule, merge_tiers, validate_schedule};
use sim_season::{Season, Turnover};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

/// Teams swapped between the top two tiers at season end.
const RELEGATION_SPOTS: usize = 3;

#[derive(Debug, Default)]
struct Args {
    league: Option<String>,
    seed: Option<u64>,
    weeks: Option<usize>,
    config: Option<String>,
    json: bool,
    version: bool,
}

fn parse_args() -> Result<Args> {
    let mut args = Args::default();
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--league" => args.league = it.next(),
            "--config" => args.config = it.next(),
            "--seed" => {
                let v = it.next().context("--seed needs a value")?;
                args.seed = Some(v.parse().with_context(|| format!("invalid seed {v:?}"))?);
            }
            "--weeks" => {
                let v = it.next().context("--weeks needs a value")?;
                args.weeks = Some(v.parse().with_context(|| format!("invalid week count {v:?}"))?);
            }
            "--json" => args.json = true,
            "--version" => args.version = true,
            other => bail!("unknown argument {other:?}"),
        }
    }
    Ok(args)
}

/// League file layout: tiers from top to bottom.
#[derive(Debug, Deserialize)]
struct LeagueFile {
    tiers: Vec<TierFile>,
}

#[derive(Debug, Deserialize)]
struct TierFile {
    name: String,
    teams: Vec<TeamFile>,
}

#[derive(Debug, Deserialize)]
struct TeamFile {
    id: String,
    name: String,
    attack: u8,
    midfield: u8,
    defense: u8,
    players: Vec<Player>,
}

#[derive(Debug, Serialize)]
struct Report<'a> {
    seed: u64,
    tables: Vec<Table<'a>>,
    top_scorers: Vec<Scorer<'a>>,
    turnover: Option<Turnover>,
    played: &'a Schedule,
}

#[derive(Debug, Serialize)]
struct Table<'a> {
    league: &'a str,
    rows: Vec<Row<'a>>,
}

#[derive(Debug, Serialize)]
struct Row<'a> {
    team: &'a TeamId,
    name: &'a str,
    record: &'a TeamRecord,
}

#[derive(Debug, Serialize)]
struct Scorer<'a> {
    player: &'a str,
    team: &'a str,
    goals: u32,
}

fn load_league(path: &str) -> Result<(Vec<String>, Vec<Team>)> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading league file {path}"))?;
    let file: LeagueFile = serde_yaml::from_str(&raw).with_context(|| format!("parsing league file {path}"))?;
    let mut tiers = Vec::with_capacity(file.tiers.len());
    let mut teams = Vec::new();
    for tier in file.tiers {
        for t in tier.teams {
            teams.push(Team {
                id: TeamId(t.id),
                name: t.name,
                league: tier.name.clone(),
                attack: t.attack,
                midfield: t.midfield,
                defense: t.defense,
                record: TeamRecord::default(),
                players: t.players,
            });
        }
        tiers.push(tier.name);
    }
    Ok((tiers, teams))
}

/// Two generated tiers used when no league file is given.
fn demo_league(rng: &mut ChaCha8Rng) -> (Vec<String>, Vec<Team>) {
    const SERIE_A: &[(&str, &str, u8, u8, u8)] = &[
        ("INT", "Inter", 88, 86, 85),
        ("NAP", "Napoli", 86, 84, 82),
        ("MIL", "Milan", 85, 83, 82),
        ("JUV", "Juventus", 83, 84, 86),
        ("ATA", "Atalanta", 84, 82, 79),
        ("ROM", "Roma", 81, 80, 80),
        ("LAZ", "Lazio", 80, 79, 78),
        ("FIO", "Fiorentina", 79, 78, 77),
    ];
    const SERIE_B: &[(&str, &str, u8, u8, u8)] = &[
        ("PAR", "Parma", 76, 74, 73),
        ("CRE", "Cremonese", 74, 73, 73),
        ("PAL", "Palermo", 74, 72, 71),
        ("SAM", "Sampdoria", 73, 72, 72),
        ("BAR", "Bari", 72, 71, 70),
        ("SPE", "Spezia", 71, 71, 70),
        ("BRE", "Brescia", 70, 70, 69),
        ("PIS", "Pisa", 70, 69, 69),
    ];
    let mut teams = Vec::new();
    for (league, clubs) in [("Serie A", SERIE_A), ("Serie B", SERIE_B)] {
        for &(id, name, att, mid, def) in clubs {
            teams.push(generate_team(id, name, league, att, mid, def, rng));
        }
    }
    (vec!["Serie A".to_string(), "Serie B".to_string()], teams)
}

fn load_config(path: Option<&str>) -> Result<MatchConfig> {
    let config = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path).with_context(|| format!("reading config {path}"))?;
            serde_yaml::from_str(&raw).with_context(|| format!("parsing config {path}"))?
        }
        None => MatchConfig::default(),
    };
    validate_match_config(&config)?;
    Ok(config)
}

fn main() -> Result<()> {
    let args = parse_args()?;
    if args.version {
        println!("{} {} ({})", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"), env!("GIT_SHA"));
        return Ok(());
    }

    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .with_writer(std::io::stderr)
        .init();

    let cfg = SimConfig {
        rng_seed: args.seed.unwrap_or(42),
        match_config: load_config(args.config.as_deref())?,
    };
    let seed = cfg.rng_seed;
    info!(league = ?args.league, seed, weeks = ?args.weeks, "starting CLI");
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let (tiers, teams) = match args.league.as_deref() {
        Some(path) => load_league(path)?,
        None => demo_league(&mut rng),
    };
    validate_league(&teams)?;

    let mut calendars = Vec::with_capacity(tiers.len());
    for tier in &tiers {
        let ids: Vec<TeamId> = teams.iter().filter(|t| &t.league == tier).map(|t| t.id.clone()).collect();
        let schedule = generate_schedule(&ids, &mut rng);
        validate_schedule(&schedule, &ids).with_context(|| format!("schedule for {tier}"))?;
        calendars.push(schedule);
    }
    let schedule = merge_tiers(&calendars);
    let total_weeks = schedule.len();
    let weeks = args.weeks.unwrap_or(total_weeks).min(total_weeks);

    let simulator = MatchSimulator::new(cfg.match_config);
    let mut season = Season::new(teams);
    let mut played = Schedule::default();
    for fixtures in schedule.weeks.iter().take(weeks) {
        let mut results: Vec<Match> = Vec::with_capacity(fixtures.len());
        for f in fixtures {
            let home = season.team(&f.home_team_id).with_context(|| format!("unknown team {}", f.home_team_id))?;
            let away = season.team(&f.away_team_id).with_context(|| format!("unknown team {}", f.away_team_id))?;
            results.push(simulator.simulate(home, away, f.week, Some(f.id.as_str()), &mut rng));
        }
        season.apply_week(&results, &mut rng)?;
        played.weeks.push(results);
    }
    info!(weeks, matches = played.matches().count(), "season finished");

    // Snapshot the tables before turnover resets the records.
    let finished = season.clone();
    let turnover = match tiers.as_slice() {
        [top, second, ..] if weeks == total_weeks => Some(season.start_new_season(top, second, RELEGATION_SPOTS)),
        _ => None,
    };

    let tables: Vec<Table> = tiers
        .iter()
        .map(|tier| Table {
            league: tier,
            rows: finished
                .standings(tier)
                .into_iter()
                .map(|t| Row {
                    team: &t.id,
                    name: &t.name,
                    record: &t.record,
                })
                .collect(),
        })
        .collect();
    let top_scorers: Vec<Scorer> = finished
        .top_scorers(10)
        .into_iter()
        .map(|(t, p)| Scorer {
            player: &p.name,
            team: &t.name,
            goals: p.goals,
        })
        .collect();

    if args.json {
        let report = Report {
            seed,
            tables,
            top_scorers,
            turnover,
            played: &played,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for table in &tables {
        println!("{} after {} weeks", table.league, weeks);
        println!("{:>3}  {:<14} {:>3} {:>3} {:>3} {:>3} {:>4} {:>4} {:>4}", "#", "team", "P", "W", "D", "L", "GF", "GA", "Pts");
        for (pos, row) in table.rows.iter().enumerate() {
            let r = row.record;
            println!(
                "{:>3}  {:<14} {:>3} {:>3} {:>3} {:>3} {:>4} {:>4} {:>4}",
                pos + 1,
                row.name,
                r.played,
                r.won,
                r.drawn,
                r.lost,
                r.goals_for,
                r.goals_against,
                r.points
            );
        }
        println!();
    }
    println!("Top scorers");
    for s in &top_scorers {
        println!("  {:>2}  {} ({})", s.goals, s.player, s.team);
    }
    if let Some(t) = &turnover {
        let names = |ids: &[TeamId]| ids.iter().map(|id| id.0.as_str()).collect::<Vec<_>>().join(", ");
        println!();
        println!("Relegated: {} | Promoted: {}", names(&t.relegated[..]), names(&t.promoted[..]));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turnover_swaps_three_clubs_each_way() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let (tiers, teams) = demo_league(&mut rng);
        validate_league(&teams).unwrap();
        let mut season = Season::new(teams);
        let t = season.start_new_season(&tiers[0], &tiers[1], RELEGATION_SPOTS);
        assert_eq!((t.relegated.len(), t.promoted.len()), (3, 3));
        assert_eq!(season.standings(&tiers[0]).len(), 8);
        assert_eq!(season.standings(&tiers[1]).len(), 8);
    }
}
