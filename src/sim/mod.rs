//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only; speeds are pixels per tick
//! - Seeded RNG only
//! - Stable iteration order (chains in insertion order, paths by index)
//! - No rendering or platform dependencies

pub mod chain;
pub mod emitter;
pub mod entity;
pub mod matching;
pub mod palette;
pub mod path;
pub mod score;
pub mod sink;
pub mod state;
pub mod tick;
pub mod token;
pub mod turret;

pub use chain::{Chain, ChainContact, ChainRecord, InsertionRecord};
pub use emitter::Emitter;
pub use entity::{Canvas, Entity, TokenRole};
pub use matching::{CascadeAction, ContactOutcome, ShotOutcome};
pub use palette::{ColorClusters, Palette};
pub use path::{Path, Projection};
pub use score::{ScoreEvent, Scoreboard};
pub use sink::Sink;
pub use state::{GameEvent, GamePhase, GameState, IdAllocator, LevelLayout};
pub use tick::{TickInput, tick};
pub use token::{PALETTE, Projectile, Token, TokenColor};
pub use turret::Turret;
