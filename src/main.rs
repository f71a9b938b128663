//! Zooma entry point
//!
//! Runs a level headless with a simple auto-aiming turret and logs the outcome.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use zooma::sim::{GameEvent, GamePhase, GameState, LevelLayout, TickInput, tick};
use zooma::{Settings, SimError, consts::TICKS_PER_SECOND, logging};

/// Run a level headless with an auto-aiming turret
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Seed for token colours
    #[arg(long, default_value_t = 0x5EED)]
    seed: u64,

    /// Stop after this many ticks
    #[arg(long, default_value_t = 120 * u64::from(TICKS_PER_SECOND))]
    ticks: u64,

    /// Settings JSON file
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Level layout JSON file (defaults to the built-in demo track)
    #[arg(long, value_name = "FILE")]
    layout: Option<PathBuf>,
}

fn load(args: &Args) -> Result<GameState, SimError> {
    let settings = match &args.settings {
        Some(file) => Settings::from_json(&std::fs::read_to_string(file)?)?,
        None => Settings::default(),
    };
    let layout = match &args.layout {
        Some(file) => LevelLayout::from_json(&std::fs::read_to_string(file)?)?,
        None => LevelLayout::demo(),
    };
    GameState::from_layout(&layout, settings, args.seed)
}

/// Aim at the head of the chain nearest its sink and keep firing
fn autopilot(state: &GameState) -> TickInput {
    let target = state
        .chains
        .iter()
        .filter_map(|chain| {
            let path = state.path(chain.path_id)?;
            let head = chain.head()?;
            Some((path.distance_to_sink(head.pos), head.pos))
        })
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, pos)| pos);

    TickInput {
        aim: target,
        fire: target.is_some(),
        ..Default::default()
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(args.verbose);
    log::info!("Zooma (headless) starting with seed {}", args.seed);

    let mut state = match load(&args) {
        Ok(state) => state,
        Err(e) => {
            log::error!("Could not set up level: {}", e);
            return ExitCode::FAILURE;
        }
    };

    while state.time_ticks < args.ticks {
        let input = autopilot(&state);
        tick(&mut state, &input);

        for event in state.take_events() {
            match event {
                GameEvent::Matched { score, .. } | GameEvent::Combo { score, .. } => {
                    log::info!("{} (score {})", score.message(), state.scoreboard.score);
                }
                other => log::debug!("{:?}", other),
            }
        }

        if matches!(state.phase, GamePhase::LevelClear)
            || (state.phase == GamePhase::GameOver && state.chains.is_empty())
        {
            break;
        }
    }

    log::info!(
        "Finished after {} ticks: {:?}, score {}, progress {:.0}%",
        state.time_ticks,
        state.phase,
        state.scoreboard.score,
        state.scoreboard.progress * 100.0
    );
    ExitCode::SUCCESS
}
