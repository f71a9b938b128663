//! Death points at the end of a path

use glam::Vec2;

use super::chain::Chain;
use crate::consts::SINK_TRIGGER_RADIUS;

#[derive(Debug, Clone)]
pub struct Sink {
    pub position: Vec2,
    pub path_id: usize,
    pub trigger_radius: f32,
}

impl Sink {
    pub fn new(position: Vec2, path_id: usize) -> Self {
        Self {
            position,
            path_id,
            trigger_radius: SINK_TRIGGER_RADIUS,
        }
    }

    /// True if `chain`'s head has reached the sink
    pub fn reaches(&self, chain: &Chain) -> bool {
        if chain.path_id != self.path_id {
            return false;
        }
        match chain.head() {
            Some(head) => self.position.distance(head.pos) < self.trigger_radius,
            None => {
                log::warn!("Sink found empty chain {}", chain.id);
                false
            }
        }
    }
}
