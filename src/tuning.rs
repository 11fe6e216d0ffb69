//! Data-driven game balance
//!
//! Every gameplay knob the simulation reads lives here so balance passes can
//! be done from a JSON file without touching code. Missing fields fall back to
//! the defaults below.

use serde::{Deserialize, Serialize};

/// Gameplay balance values (all times in simulation ticks, distances in pixels)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Player ===
    pub player_size: f32,
    /// Velocity added per tick per held direction key
    pub player_accel: f32,
    /// Velocity multiplier applied every tick
    pub player_damping: f32,
    /// Ticks between shots
    pub player_refire_ticks: u32,
    /// Ticks between grenade throws
    pub grenade_refire_ticks: u32,
    pub shot_range: f32,
    pub shot_shake: f32,
    /// Camera kick opposite the shot direction
    pub shot_recoil: f32,

    // === Enemy ===
    pub enemy_size: f32,
    pub enemy_accel: f32,
    pub enemy_damping: f32,
    /// Chase distance
    pub enemy_sight: f32,
    /// Push-away factor applied to the offset between colliding entities
    pub enemy_knockback: f32,
    /// Stun ticks after which an enemy self-detonates
    pub stun_detonate_ticks: u32,
    /// Ticks added to a running stun countdown by each further hit
    pub stun_hit_advance: u32,

    // === Grenade ===
    pub grenade_size: f32,
    pub grenade_bounce: f32,
    pub grenade_damping: f32,
    pub grenade_throw_speed: f32,
    /// Fuse length once primed
    pub grenade_fuse_ticks: u32,
    /// Detonate regardless of priming after this many ticks
    pub grenade_timeout_ticks: u32,
    /// Explosion radius multiplier
    pub grenade_radius: f32,

    // === Explosions ===
    /// Ray length at radius multiplier 1.0
    pub explosion_radius: f32,
    /// Wall samples an explosion ray may pass through
    pub explosion_penetration: u32,
    pub explosion_shake: f32,

    // === Scoring ===
    pub streak_base: u64,
    /// Ticks a streak survives without a kill
    pub streak_window_ticks: u32,

    // === Effects ===
    pub spark_count: u32,
    /// Fraction of the distance to the player the camera target closes per tick
    pub camera_follow: f32,
    /// Per-tick decay for shake and recoil
    pub camera_damping: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            player_size: 12.0,
            player_accel: 1.0,
            player_damping: 0.8,
            player_refire_ticks: 30,
            grenade_refire_ticks: 60,
            shot_range: 600.0,
            shot_shake: 4.0,
            shot_recoil: 6.0,

            enemy_size: 16.0,
            enemy_accel: 0.12,
            enemy_damping: 0.9,
            enemy_sight: 180.0,
            enemy_knockback: 0.15,
            stun_detonate_ticks: 60,
            stun_hit_advance: 10,

            grenade_size: 6.0,
            grenade_bounce: 0.9,
            grenade_damping: 0.98,
            grenade_throw_speed: 6.0,
            grenade_fuse_ticks: 45,
            grenade_timeout_ticks: 180,
            grenade_radius: 1.5,

            explosion_radius: 60.0,
            explosion_penetration: 3,
            explosion_shake: 6.0,

            streak_base: 5,
            streak_window_ticks: 120,

            spark_count: 12,
            camera_follow: 0.1,
            camera_damping: 0.8,
        }
    }
}

impl Tuning {
    /// Parse tuning from JSON; absent fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
