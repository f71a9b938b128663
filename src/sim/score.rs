//! Score, multipliers and level progress

use serde::{Deserialize, Serialize};

use crate::consts::{POINTS_PER_TOKEN, STREAK_GRACE};

/// One scoring award, as handed to the UI layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreEvent {
    pub points: u64,
    pub match_count: usize,
    /// Multiplier from consecutive shot matches
    pub chain_mult: u32,
    /// Multiplier from head-on combos
    pub combo_mult: u32,
}

impl ScoreEvent {
    /// e.g. `+120 Chain x2 Combo x3`
    pub fn message(&self) -> String {
        let mut message = format!("+{}", self.points);
        if self.chain_mult > 1 {
            message.push_str(&format!(" Chain x{}", self.chain_mult));
        }
        if self.combo_mult > 1 {
            message.push_str(&format!(" Combo x{}", self.combo_mult));
        }
        message
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scoreboard {
    pub score: u64,
    /// Consecutive shots that produced a match
    pub streak: u32,
    pub combo_mult: u32,
    /// Fraction of the level's score target reached (can exceed 1)
    pub progress: f32,
    /// Score that fills the progress bar
    progress_score: f32,
}

impl Scoreboard {
    pub fn new(progress_score: f32) -> Self {
        Self {
            score: 0,
            streak: 0,
            combo_mult: 1,
            progress: 0.0,
            progress_score,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.progress_score);
    }

    pub fn reset_streak(&mut self) {
        self.streak = 0;
    }

    pub fn reset_combo(&mut self) {
        self.combo_mult = 1;
    }

    pub fn chain_mult(&self) -> u32 {
        self.streak.saturating_sub(STREAK_GRACE).max(1)
    }

    /// Award a match made by a fired token
    pub fn record_shot_match(&mut self, match_count: usize) -> ScoreEvent {
        self.streak += 1;
        self.award(match_count)
    }

    /// Award a match made by two chains meeting head-on
    pub fn record_combo(&mut self, match_count: usize) -> ScoreEvent {
        self.combo_mult += 1;
        self.award(match_count)
    }

    fn award(&mut self, match_count: usize) -> ScoreEvent {
        let combo_mult = self.combo_mult.max(1);
        let chain_mult = self.chain_mult();
        let points = match_count as u64 * POINTS_PER_TOKEN * combo_mult as u64 * chain_mult as u64;

        self.score += points;
        self.progress += points as f32 / self.progress_score;

        ScoreEvent {
            points,
            match_count,
            chain_mult,
            combo_mult,
        }
    }

    pub fn is_progress_full(&self) -> bool {
        self.progress >= 1.0
    }
}
