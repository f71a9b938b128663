//! Coloured tokens and the projectiles that carry them

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::Bounds;
use crate::consts::TOKEN_RADIUS;

/// RGB values for each palette slot
pub const PALETTE: [[u8; 3]; 8] = [
    [230, 57, 70],   // red
    [46, 196, 182],  // teal
    [255, 209, 102], // yellow
    [58, 134, 255],  // blue
    [131, 56, 236],  // purple
    [6, 214, 160],   // green
    [251, 86, 7],    // orange
    [255, 0, 110],   // pink
];

/// A palette slot. Two tokens match iff their colours are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TokenColor(pub u8);

impl TokenColor {
    pub fn rgb(&self) -> [u8; 3] {
        PALETTE[self.0 as usize % PALETTE.len()]
    }
}

/// A positioned, coloured ball.
///
/// Movement is driven entirely by whichever chain owns the token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Stable within the owning chain
    pub id: u32,
    pub pos: Vec2,
    pub color: TokenColor,
    pub radius: f32,
    /// Id of the owning chain, for labels only
    #[serde(default)]
    pub chain_tag: Option<u32>,
}

impl Token {
    pub fn new(pos: Vec2, color: TokenColor) -> Self {
        Self {
            id: 0,
            pos,
            color,
            radius: TOKEN_RADIUS,
            chain_tag: None,
        }
    }

    pub fn with_id(mut self, id: u32) -> Self {
        self.id = id;
        self
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    pub fn distance_to(&self, other: &Token) -> f32 {
        self.pos.distance(other.pos)
    }

    /// True iff the centres are closer than the sum of the radii
    pub fn overlaps(&self, other: &Token) -> bool {
        self.distance_to(other) < self.radius + other.radius
    }

    /// Short diagnostic label, e.g. `3:12` for token 12 of chain 3
    pub fn label(&self) -> String {
        match self.chain_tag {
            Some(chain) => format!("{}:{}", chain, self.id),
            None => format!("-:{}", self.id),
        }
    }
}

/// A fired token flying in a straight line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub token: Token,
    pub vel: Vec2,
}

impl Projectile {
    pub fn new(token: Token, heading: Vec2, speed: f32) -> Self {
        Self {
            token,
            vel: heading.normalize_or_zero() * speed,
        }
    }

    /// Advance one tick
    pub fn advance(&mut self) {
        self.token.pos += self.vel;
    }

    pub fn in_bounds(&self, bounds: &Bounds) -> bool {
        bounds.contains(self.token.pos)
    }
}
