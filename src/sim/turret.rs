//! The launcher that feeds projectiles into the simulation

use glam::Vec2;

use super::palette::Palette;
use super::token::{Projectile, Token, TokenColor};
use crate::consts::{TOKEN_RADIUS, TURRET_RADIUS};

#[derive(Debug, Clone)]
pub struct Turret {
    pub position: Vec2,
    /// Unit aim direction
    pub heading: Vec2,
    pub radius: f32,
    held: Option<TokenColor>,
    reserve: Option<TokenColor>,
    /// Ticks until the next shot is allowed
    cooldown: u32,
    dead: bool,
}

impl Turret {
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            heading: Vec2::X,
            radius: TURRET_RADIUS,
            held: None,
            reserve: None,
            cooldown: 0,
            dead: false,
        }
    }

    pub fn held(&self) -> Option<TokenColor> {
        self.held
    }

    pub fn reserve(&self) -> Option<TokenColor> {
        self.reserve
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    /// Where the held token sits, on the rim along the heading
    pub fn held_position(&self) -> Vec2 {
        self.position + self.heading * self.radius
    }

    /// Point the turret at `target`. Ignored when dead or when `target` is
    /// the turret's own position.
    pub fn aim_at(&mut self, target: Vec2) {
        if self.dead {
            return;
        }
        let dir = target - self.position;
        if dir.length_squared() > f32::EPSILON {
            self.heading = dir.normalize();
        }
    }

    pub fn swap(&mut self) {
        std::mem::swap(&mut self.held, &mut self.reserve);
    }

    /// Fire the held token, if loaded and off cooldown
    pub fn shoot(&mut self, speed: f32, cooldown_ticks: u32) -> Option<Projectile> {
        if self.dead || self.cooldown > 0 {
            return None;
        }
        let color = self.held.take()?;
        self.cooldown = cooldown_ticks;

        let token = Token::new(self.held_position(), color).with_radius(TOKEN_RADIUS);
        Some(Projectile::new(token, self.heading, speed))
    }

    /// Tick the cooldown, reload, and recolour ammo the palette no longer has
    pub fn update(&mut self, palette: &mut Palette) {
        self.cooldown = self.cooldown.saturating_sub(1);
        if self.dead {
            return;
        }

        if self.held.is_none() && self.reserve.is_some() {
            self.swap();
        }
        if self.reserve.is_none() {
            self.reserve = Some(palette.pick());
        }
        if self.held.is_none() {
            self.held = Some(palette.pick());
        }

        for slot in [&mut self.held, &mut self.reserve] {
            if let Some(color) = slot {
                if !palette.is_valid(*color) {
                    *color = palette.pick();
                }
            }
        }
    }

    pub fn die(&mut self) {
        self.dead = true;
    }

    pub fn reset(&mut self) {
        self.dead = false;
        self.cooldown = 0;
    }
}
