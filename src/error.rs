//! Errors raised while validating settings and level layouts
//!
//! Runtime anomalies inside a tick (bad indices, degenerate geometry) are not
//! errors; they surface as `None` or a skipped step.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    /// A tuning value is out of range
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// A level path needs at least two distinct waypoints
    #[error("path has {points} usable waypoint(s), need at least 2")]
    DegeneratePath { points: usize },

    /// Settings or layout JSON could not be parsed or written
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    /// A settings or layout file could not be read
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
