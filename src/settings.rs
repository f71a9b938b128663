//! Simulation tuning and difficulty presets
//!
//! Loaded from JSON by the host; every field has a default so partial files work.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::{Bounds, SimError};

/// Difficulty preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
    Expert,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
            Difficulty::Expert => "Expert",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" | "medium" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            "expert" => Some(Difficulty::Expert),
            _ => None,
        }
    }

    /// Number of distinct token colours in play
    pub fn palette_size(&self) -> usize {
        match self {
            Difficulty::Easy => 3,
            Difficulty::Normal => 4,
            Difficulty::Hard => 5,
            Difficulty::Expert => 6,
        }
    }
}

/// Simulation tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub difficulty: Difficulty,

    // === Chains ===
    /// Speed given to the pusher chain each tick (pixels per tick)
    pub base_chain_speed: f32,
    /// Cascading chains retreat at base speed times this
    pub reverse_speed_factor: f32,
    /// After a loss every chain rushes to the sink at base speed times this
    pub game_over_speed_factor: f32,
    /// Extra speed for tokens shoved open by an insertion
    pub insertion_push_bonus: f32,
    /// Shortest run that a match removes
    pub match_threshold: usize,

    // === Turret ===
    pub projectile_speed: f32,
    pub shot_cooldown_ticks: u32,

    // === Fixtures ===
    pub sink_trigger_radius: f32,

    // === Scoring ===
    /// Score that fills the progress bar
    pub progress_score: f32,

    /// Projectiles leaving this rectangle are discarded
    pub bounds: Bounds,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Normal,

            base_chain_speed: BASE_CHAIN_SPEED,
            reverse_speed_factor: REVERSE_SPEED_FACTOR,
            game_over_speed_factor: GAME_OVER_SPEED_FACTOR,
            insertion_push_bonus: INSERTION_PUSH_BONUS,
            match_threshold: MATCH_THRESHOLD,

            projectile_speed: PROJECTILE_SPEED,
            shot_cooldown_ticks: SHOT_COOLDOWN_TICKS,

            sink_trigger_radius: SINK_TRIGGER_RADIUS,

            progress_score: PROGRESS_SCORE,

            bounds: Bounds::default(),
        }
    }
}

impl Settings {
    /// Create settings from a difficulty preset
    pub fn from_difficulty(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            ..Self::default()
        }
    }

    /// Speed of a chain retreating to meet a matching neighbour
    pub fn reverse_speed(&self) -> f32 {
        self.base_chain_speed * self.reverse_speed_factor
    }

    /// Speed of every chain once the game is lost
    pub fn game_over_speed(&self) -> f32 {
        self.base_chain_speed * self.game_over_speed_factor
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), SimError> {
        if !(self.base_chain_speed >= 0.0) {
            return Err(SimError::InvalidSettings(format!(
                "base_chain_speed must be >= 0, got {}",
                self.base_chain_speed
            )));
        }
        if !(self.reverse_speed_factor > 0.0) || !(self.game_over_speed_factor > 0.0) {
            return Err(SimError::InvalidSettings(
                "speed factors must be positive".to_string(),
            ));
        }
        if !(self.projectile_speed > 0.0) {
            return Err(SimError::InvalidSettings(format!(
                "projectile_speed must be positive, got {}",
                self.projectile_speed
            )));
        }
        if !(self.progress_score > 0.0) {
            return Err(SimError::InvalidSettings(format!(
                "progress_score must be positive, got {}",
                self.progress_score
            )));
        }
        if self.match_threshold < 2 {
            return Err(SimError::InvalidSettings(format!(
                "match_threshold must be at least 2, got {}",
                self.match_threshold
            )));
        }
        if !(self.bounds.width > 0.0 && self.bounds.height > 0.0) {
            return Err(SimError::InvalidSettings(
                "playfield bounds must be non-empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse and validate settings from JSON
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        log::info!("Loaded settings ({} difficulty)", settings.difficulty.as_str());
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SimError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse settings, falling back to defaults on any error
    pub fn from_json_or_default(json: &str) -> Self {
        match Self::from_json(json) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Using default settings: {}", e);
                Self::default()
            }
        }
    }
}
