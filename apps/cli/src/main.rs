#![deny(warnings)]

//! Headless CLI host: logs a player in, runs the clock, prints KPIs.

use anyhow::{bail, Result};
use persistence::{JsonFileStore, MemoryStore, SaveStore};
use sim_core::fmt::{format_currency, format_full_currency};
use sim_core::{Catalog, Difficulty};
use sim_econ::report;
use sim_runtime::{Command, EngineConfig, Session};
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

#[derive(Default)]
struct Args {
    player: Option<String>,
    difficulty: Option<String>,
    seconds: Option<u64>,
    taps: Option<u32>,
    saves: Option<String>,
    seed: Option<u64>,
}

fn parse_args() -> Args {
    let mut args = Args::default();
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--player" => args.player = it.next(),
            "--difficulty" => args.difficulty = it.next(),
            "--seconds" => args.seconds = it.next().and_then(|s| s.parse().ok()),
            "--taps" => args.taps = it.next().and_then(|s| s.parse().ok()),
            "--saves" => args.saves = it.next(),
            "--seed" => args.seed = it.next().and_then(|s| s.parse().ok()),
            _ => {}
        }
    }
    args
}

fn parse_difficulty(raw: &str) -> Result<Difficulty> {
    match raw.to_ascii_lowercase().as_str() {
        "easy" => Ok(Difficulty::Easy),
        "normal" => Ok(Difficulty::Normal),
        "hard" => Ok(Difficulty::Hard),
        "veryhard" | "very-hard" => Ok(Difficulty::VeryHard),
        other => bail!("unknown difficulty {:?} (easy|normal|hard|veryhard)", other),
    }
}

fn run<S: SaveStore>(store: S, catalog: Catalog, args: &Args) -> Result<()> {
    let difficulty = match args.difficulty.as_deref() {
        Some(raw) => Some(parse_difficulty(raw)?),
        None => None,
    };
    let cfg = EngineConfig {
        rng_seed: args.seed.unwrap_or(42),
        ..EngineConfig::default()
    };
    let player = args.player.as_deref().unwrap_or("player");
    let mut session = Session::login(store, catalog, player, difficulty, cfg)?;

    for _ in 0..args.taps.unwrap_or(0) {
        if let Err(e) = session.apply(Command::Tap) {
            info!("tap rejected: {}", e);
            break;
        }
    }
    session.advance(Duration::from_secs(args.seconds.unwrap_or(60)));

    let state = session.state();
    let summary = report::income_summary(session.catalog(), state);
    let valuation = report::portfolio_valuation(session.catalog(), state);
    println!(
        "Player {} | difficulty: {:?} | level: {} | xp: {:.2} | cycle: {:?}",
        state.username, state.difficulty, state.level, state.xp, state.economic_cycle
    );
    println!(
        "KPI | money: {} | net: {}/s | multiplier: x{:.2} | branches: {} | net worth: {}",
        format_full_currency(state.money),
        format_currency(summary.net),
        summary.multiplier,
        state.owned_businesses.len(),
        format_currency(valuation.net_worth()),
    );

    session.logout();
    Ok(())
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .init();

    let args = parse_args();
    info!(player = ?args.player, seconds = ?args.seconds, "starting session host");

    let catalog = Catalog::builtin();
    sim_core::validate_catalog(&catalog)?;

    match &args.saves {
        Some(dir) => run(JsonFileStore::new(dir)?, catalog, &args),
        None => run(MemoryStore::new(), catalog, &args),
    }
}
