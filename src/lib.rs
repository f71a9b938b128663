//! Zooma - chain simulation and matching engine
//!
//! Core modules:
//! - `sim`: Deterministic simulation (paths, chains, matching, the tick driver)
//! - `settings`: Data-driven tuning and difficulty presets
//! - `error`: Configuration and layout errors
//! - `logging`: Logger setup for native binaries

pub mod error;
pub mod logging;
pub mod settings;
pub mod sim;

pub use error::SimError;
pub use settings::{Difficulty, Settings};

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation rate. Movement budgets are per tick, never scaled by wall time.
    pub const TICKS_PER_SECOND: u32 = 120;

    /// Token defaults
    pub const TOKEN_RADIUS: f32 = 20.0;

    /// Waypoints closer than this to the previous one are dropped
    pub const MIN_WAYPOINT_SPACING: f32 = 5.0;

    /// Speeds below this end a recursive movement step
    pub const SPEED_EPSILON: f32 = 0.00001;
    /// Distance at which a token counts as having reached its waypoint
    pub const ARRIVAL_EPSILON: f32 = 0.001;
    /// Slack allowed when deciding two tokens are merely touching
    pub const TOUCH_EPSILON: f32 = 0.01;

    /// Extra speed per pixel of gap to the token ahead
    pub const CATCH_UP_FACTOR: f32 = 0.001;

    /// Default chain speed (pixels per tick)
    pub const BASE_CHAIN_SPEED: f32 = 0.5;
    /// Multiplier applied to the base speed for a cascading chain
    pub const REVERSE_SPEED_FACTOR: f32 = 3.0;
    /// Multiplier applied to the base speed once the game is lost
    pub const GAME_OVER_SPEED_FACTOR: f32 = 10.0;
    /// Flat bonus for tokens shoved by a fresh insertion
    pub const INSERTION_PUSH_BONUS: f32 = 1.0;

    /// Minimum run length removed by a match
    pub const MATCH_THRESHOLD: usize = 3;

    /// Projectile speed (pixels per tick)
    pub const PROJECTILE_SPEED: f32 = 10.0;
    /// Ticks between shots (500 ms)
    pub const SHOT_COOLDOWN_TICKS: u32 = TICKS_PER_SECOND / 2;

    /// Turret body radius; the held token sits on its rim
    pub const TURRET_RADIUS: f32 = 40.0;

    /// A chain head this close to a sink is consumed
    pub const SINK_TRIGGER_RADIUS: f32 = 5.0;
    /// Clearance subtracted from two radii when checking whether an emitter is blocked
    pub const EMITTER_CLEARANCE: f32 = 5.0;

    /// Points awarded per matched token before multipliers
    pub const POINTS_PER_TOKEN: u64 = 10;
    /// Score needed to fill the progress bar
    pub const PROGRESS_SCORE: f32 = 1500.0;
    /// Streak length after which the chain multiplier starts growing
    pub const STREAK_GRACE: u32 = 3;

    /// Playfield dimensions
    pub const PLAYFIELD_WIDTH: f32 = 1000.0;
    pub const PLAYFIELD_HEIGHT: f32 = 800.0;
}

/// Axis-aligned playfield rectangle with its origin at (0, 0)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            width: consts::PLAYFIELD_WIDTH,
            height: consts::PLAYFIELD_HEIGHT,
        }
    }
}

impl Bounds {
    /// Strict containment, so a point on the border is already outside
    pub fn contains(&self, pos: Vec2) -> bool {
        pos.x > 0.0 && pos.x < self.width && pos.y > 0.0 && pos.y < self.height
    }
}

/// Unit vector along `v`, or zero if `v` is zero
#[inline]
pub fn to_heading(v: Vec2) -> Vec2 {
    v.normalize_or_zero()
}

/// Closest point to `p` on segment `a`-`b`, with the clamped parameter `t`
///
/// Degenerate segments return `None`.
#[inline]
pub fn closest_point_on_segment(a: Vec2, b: Vec2, p: Vec2) -> Option<(Vec2, f32)> {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < 0.0001 {
        return None;
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    Some((a + ab * t, t))
}
