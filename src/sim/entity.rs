//! Closed set of drawable things in a level
//!
//! The simulation never draws. Hosts implement [`Canvas`] and walk
//! [`GameState::entities`] in back-to-front order.

use glam::Vec2;

use super::chain::Chain;
use super::emitter::Emitter;
use super::path::Path;
use super::sink::Sink;
use super::state::GameState;
use super::token::Token;
use super::turret::Turret;
use crate::consts::TOKEN_RADIUS;

pub type Rgb = [u8; 3];

const PATH_COLOR: Rgb = [90, 90, 110];
const EMITTER_ACTIVE: Rgb = [240, 240, 240];
const EMITTER_IDLE: Rgb = [120, 120, 120];
const SINK_COLOR: Rgb = [10, 10, 10];
const TURRET_COLOR: Rgb = [40, 160, 70];
const TURRET_DEAD: Rgb = [110, 60, 60];

/// Minimal drawing surface
pub trait Canvas {
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgb);
    fn stroke_circle(&mut self, center: Vec2, radius: f32, color: Rgb);
    fn line(&mut self, from: Vec2, to: Vec2, color: Rgb);
}

/// How a free-standing token is being shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRole {
    Projectile,
    /// Loaded on the turret rim
    Held,
}

#[derive(Debug, Clone)]
pub enum Entity<'a> {
    Path(&'a Path),
    Chain(&'a Chain),
    Token { token: Token, role: TokenRole },
    Emitter(&'a Emitter),
    Sink(&'a Sink),
    Turret(&'a Turret),
}

impl Entity<'_> {
    pub fn kind(&self) -> &'static str {
        match self {
            Entity::Path(_) => "path",
            Entity::Chain(_) => "chain",
            Entity::Token { .. } => "token",
            Entity::Emitter(_) => "emitter",
            Entity::Sink(_) => "sink",
            Entity::Turret(_) => "turret",
        }
    }

    pub fn draw(&self, canvas: &mut dyn Canvas) {
        match self {
            Entity::Path(path) => {
                for pair in path.points().windows(2) {
                    canvas.line(pair[0], pair[1], PATH_COLOR);
                }
            }
            Entity::Chain(chain) => {
                for token in chain.tokens() {
                    canvas.fill_circle(token.pos, token.radius, token.color.rgb());
                }
            }
            Entity::Token { token, .. } => {
                canvas.fill_circle(token.pos, token.radius, token.color.rgb());
            }
            Entity::Emitter(emitter) => {
                let color = if emitter.is_active() {
                    EMITTER_ACTIVE
                } else {
                    EMITTER_IDLE
                };
                canvas.stroke_circle(emitter.position, TOKEN_RADIUS, color);
            }
            Entity::Sink(sink) => {
                canvas.fill_circle(sink.position, TOKEN_RADIUS, SINK_COLOR);
            }
            Entity::Turret(turret) => {
                let color = if turret.is_dead() {
                    TURRET_DEAD
                } else {
                    TURRET_COLOR
                };
                canvas.fill_circle(turret.position, turret.radius, color);
                canvas.line(turret.position, turret.held_position(), color);
                // Reserve shown small in the middle
                if let Some(reserve) = turret.reserve() {
                    canvas.fill_circle(turret.position, TOKEN_RADIUS / 2.0, reserve.rgb());
                }
            }
        }
    }
}

impl GameState {
    /// Everything drawable, back to front
    pub fn entities(&self) -> Vec<Entity<'_>> {
        let mut entities: Vec<Entity<'_>> = Vec::new();
        entities.extend(self.paths.iter().map(Entity::Path));
        entities.extend(self.sinks.iter().map(Entity::Sink));
        entities.extend(self.emitters.iter().map(Entity::Emitter));
        entities.extend(self.chains.iter().map(Entity::Chain));
        entities.extend(self.projectiles.iter().map(|p| Entity::Token {
            token: p.token.clone(),
            role: TokenRole::Projectile,
        }));
        entities.push(Entity::Turret(&self.turret));
        if let Some(color) = self.turret.held() {
            entities.push(Entity::Token {
                token: Token::new(self.turret.held_position(), color),
                role: TokenRole::Held,
            });
        }
        entities
    }
}
