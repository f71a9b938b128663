//! Game state and level setup
//!
//! Everything the tick driver owns lives here: paths, the live chains, free
//! projectiles, fixtures, the turret, scoring and the event queue.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::chain::Chain;
use super::emitter::Emitter;
use super::palette::Palette;
use super::path::Path;
use super::score::{ScoreEvent, Scoreboard};
use super::sink::Sink;
use super::token::{Projectile, TokenColor};
use super::turret::Turret;
use crate::{Settings, SimError};

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Playing,
    /// Game is paused
    Paused,
    /// A chain reached a sink; everything drains into it
    GameOver,
    /// Progress filled and every token cleared
    LevelClear,
}

/// Things that happened during a tick, for the UI layer
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// A fired token joined a chain without matching
    Inserted { chain_id: u32, index: usize },
    /// A fired token completed a run
    Matched { chain_id: u32, score: ScoreEvent },
    /// Two chains met head-on and matched
    Combo { chain_id: u32, score: ScoreEvent },
    Merged { kept: u32, absorbed: u32 },
    Reversed { chain_id: u32 },
    Halted { chain_id: u32 },
    /// A sink swallowed a chain's head token
    Consumed { chain_id: u32 },
    GameOver,
    /// Progress bar full: emitters stop
    Zooma,
    LevelCleared,
}

/// Hands out chain ids. Owned by the driver so ids never come from hidden
/// global counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdAllocator {
    next_chain: u32,
}

impl IdAllocator {
    pub fn starting_at(first: u32) -> Self {
        Self { next_chain: first }
    }

    pub fn next_chain_id(&mut self) -> u32 {
        let id = self.next_chain;
        self.next_chain += 1;
        id
    }
}

/// Level description: each path runs from its emitter to its sink
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelLayout {
    pub paths: Vec<Vec<Vec2>>,
    pub turret: Vec2,
    /// Overrides the difficulty's palette size
    #[serde(default)]
    pub palette_size: Option<usize>,
}

impl LevelLayout {
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        Ok(serde_json::from_str(json)?)
    }

    /// A single S-shaped track around a centred turret
    pub fn demo() -> Self {
        let mut points = Vec::new();
        for row in 0..4 {
            let y = 100.0 + row as f32 * 180.0;
            let xs: Vec<f32> = (0..=16).map(|i| 100.0 + i as f32 * 50.0).collect();
            if row % 2 == 0 {
                points.extend(xs.iter().map(|x| Vec2::new(*x, y)));
            } else {
                points.extend(xs.iter().rev().map(|x| Vec2::new(*x, y)));
            }
        }
        Self {
            paths: vec![points],
            turret: Vec2::new(500.0, 370.0),
            palette_size: None,
        }
    }
}

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct GameState {
    pub settings: Settings,
    pub paths: Vec<Path>,
    /// Live chains. Never holds an empty chain between ticks.
    pub chains: Vec<Chain>,
    /// Fired tokens in flight
    pub projectiles: Vec<Projectile>,
    pub emitters: Vec<Emitter>,
    pub sinks: Vec<Sink>,
    pub turret: Turret,
    pub palette: Palette,
    pub scoreboard: Scoreboard,
    pub phase: GamePhase,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub ids: IdAllocator,
    /// Progress has filled this level
    pub did_zooma: bool,
    events: Vec<GameEvent>,
}

impl GameState {
    /// Build a level. Fails if the settings are invalid or a path has fewer
    /// than two usable waypoints.
    pub fn from_layout(layout: &LevelLayout, settings: Settings, seed: u64) -> Result<Self, SimError> {
        settings.validate()?;

        let mut paths = Vec::with_capacity(layout.paths.len());
        let mut emitters = Vec::new();
        let mut sinks = Vec::new();
        for (path_id, points) in layout.paths.iter().enumerate() {
            let path = Path::from_points(points.iter().copied());
            let (Some(first), Some(last)) = (path.first(), path.last()) else {
                return Err(SimError::DegeneratePath { points: path.len() });
            };
            if path.len() < 2 {
                return Err(SimError::DegeneratePath { points: path.len() });
            }
            emitters.push(Emitter::new(first, path_id));
            let mut sink = Sink::new(last, path_id);
            sink.trigger_radius = settings.sink_trigger_radius;
            sinks.push(sink);
            paths.push(path);
        }

        let palette_size = layout
            .palette_size
            .unwrap_or_else(|| settings.difficulty.palette_size());
        log::info!(
            "Level with {} path(s), {} colours, seed {}",
            paths.len(),
            palette_size,
            seed
        );

        Ok(Self {
            paths,
            chains: Vec::new(),
            projectiles: Vec::new(),
            emitters,
            sinks,
            turret: Turret::new(layout.turret),
            palette: Palette::new(palette_size, seed),
            scoreboard: Scoreboard::new(settings.progress_score),
            phase: GamePhase::Playing,
            time_ticks: 0,
            ids: IdAllocator::default(),
            did_zooma: false,
            events: Vec::new(),
            settings,
        })
    }

    /// Clear the board and start the level over
    pub fn restart(&mut self) {
        self.chains.clear();
        self.projectiles.clear();
        self.events.clear();
        for emitter in &mut self.emitters {
            emitter.activate();
        }
        self.palette.reset();
        self.turret.reset();
        self.scoreboard.reset();
        self.did_zooma = false;
        self.phase = GamePhase::Playing;
        log::info!("Level restarted");
    }

    pub fn path(&self, path_id: usize) -> Option<&Path> {
        self.paths.get(path_id)
    }

    pub fn token_count(&self) -> usize {
        self.chains.iter().map(|c| c.len()).sum()
    }

    /// Distinct colours still present in chains
    pub fn colors_in_play(&self) -> Vec<TokenColor> {
        let mut colors: Vec<TokenColor> = self
            .chains
            .iter()
            .flat_map(|c| c.tokens().map(|t| t.color))
            .collect();
        colors.sort();
        colors.dedup();
        colors
    }

    pub fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    /// Hand queued events to the caller
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
