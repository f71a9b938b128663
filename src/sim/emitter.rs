//! Chain sources at the start of a path

use glam::Vec2;

use super::chain::Chain;
use super::palette::{ColorClusters, Palette};
use super::token::Token;
use crate::consts::{EMITTER_CLEARANCE, TOKEN_RADIUS};

#[derive(Debug, Clone)]
pub struct Emitter {
    pub position: Vec2,
    pub path_id: usize,
    active: bool,
    clusters: ColorClusters,
}

impl Emitter {
    pub fn new(position: Vec2, path_id: usize) -> Self {
        Self {
            position,
            path_id,
            active: true,
            clusters: ColorClusters::default(),
        }
    }

    pub fn activate(&mut self) {
        self.active = true;
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// True if `chain`'s tail still sits on the spawn point
    pub fn is_blocked_by(&self, chain: &Chain) -> bool {
        if chain.path_id != self.path_id {
            return false;
        }
        chain.tail().is_some_and(|tail| {
            self.position.distance(tail.pos) < tail.radius * 2.0 - EMITTER_CLEARANCE
        })
    }

    pub fn can_emit(&self, chains: &[Chain]) -> bool {
        self.active && !chains.iter().any(|c| self.is_blocked_by(c))
    }

    /// A fresh one-token chain at the spawn point, heading for waypoint 0
    pub fn emit(&mut self, chain_id: u32, palette: &mut Palette) -> Chain {
        let color = self.clusters.next(palette);
        let token = Token::new(self.position, color).with_radius(TOKEN_RADIUS);
        Chain::single(chain_id, self.path_id, token, 0)
    }
}
