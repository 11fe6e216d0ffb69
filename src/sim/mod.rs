//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID, sectors front to back)
//! - Drawing and audio only through the collaborator traits

pub mod combat;
pub mod entity;
pub mod grid;
pub mod particle;
pub mod physics;
pub mod score;
pub mod sector;
pub mod state;
pub mod template;
pub mod tick;
pub mod window;

pub use combat::{Ray, RayResult, ray_march};
pub use entity::{Action, Body, Entity, EntityId, EntityKind, EntityTag};
pub use grid::{BOUNDARY_IS_WALL, Grid, Quadrant, cell_center, cell_of};
pub use particle::{Particle, ParticleKind};
pub use score::Scoreboard;
pub use sector::{Sector, SectorId, SpawnConfig};
pub use state::{Camera, Game, RoundSummary, SimConfig};
pub use template::{CellCode, Template, TemplateSet};
pub use tick::tick;
pub use window::SectorWindow;
