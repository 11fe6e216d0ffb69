//! Quadrant Run - an arena shooter on a corridor of rotating quadrant sectors
//!
//! Core modules:
//! - `sim`: Simulation (sector window, grid addressing, entities, combat)
//! - `platform`: Frame driver, loader rendezvous and round state machine
//! - `render`: Drawing collaborator interface
//! - `audio`: Sound cue collaborator interface
//! - `input`: Held key/button/pointer state
//! - `tuning`: Data-driven game balance
//! - `settings`: Player preferences

pub mod audio;
pub mod error;
pub mod input;
pub mod platform;
pub mod render;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use error::{SectorError, TemplateError};
pub use settings::{QualityPreset, Settings};
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Milliseconds per simulation step
    pub const STEP_MS: f64 = 1000.0 / 60.0;
    /// Maximum steps per animation callback; longer stalls are not caught up
    pub const MAX_SUBSTEPS: u32 = 2;

    /// Arena radius in pixels
    pub const ARENA_RADIUS_PX: i32 = 300;
    /// Side of one wall cell in pixels
    pub const CELL_SIZE_PX: i32 = 24;
    /// Cells per side of a quadrant grid (ceil of radius / cell size)
    pub const QUADRANT_CELL_WIDTH: i32 = (ARENA_RADIUS_PX + CELL_SIZE_PX - 1) / CELL_SIZE_PX;

    pub const ARENA_RADIUS: f32 = ARENA_RADIUS_PX as f32;
    pub const CELL_SIZE: f32 = CELL_SIZE_PX as f32;

    /// Viewport the renderer draws into
    pub const SCREEN_WIDTH: f32 = 800.0;
    pub const SCREEN_HEIGHT: f32 = 600.0;

    /// Smallest active window
    pub const WINDOW_MIN_LEN: usize = 4;
    /// Player index above which the oldest sector is evicted
    pub const WINDOW_BACK_THRESHOLD: usize = 4;
    /// Sectors kept ahead of the player
    pub const WINDOW_AHEAD: usize = 4;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Signed difference `b - a`, wrapped to [-π, π)
#[inline]
pub fn angle_diff(a: f32, b: f32) -> f32 {
    normalize_angle(b - a)
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Convert cartesian (x, y) to polar (r, theta)
#[inline]
pub fn cartesian_to_polar(pos: Vec2) -> (f32, f32) {
    (pos.length(), pos.y.atan2(pos.x))
}
