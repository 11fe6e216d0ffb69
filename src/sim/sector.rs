//! Sectors: one quadrant-shaped slice of the corridor
//!
//! A sector owns its wall grid, the ids of the entities currently inside it
//! and the cosmetic particles spawned there. Sectors are generated from a
//! template rotated into the sector's quadrant.

use glam::{IVec2, Vec2};
use rand::Rng;

use super::entity::EntityId;
use super::grid::{Grid, Quadrant, cell_center};
use super::particle::{self, Particle};
use super::template::{CellCode, Template, TemplateSet};
use crate::consts::QUADRANT_CELL_WIDTH;
use crate::error::SectorError;

/// Monotonic sector id; ids in the active window are contiguous
pub type SectorId = i64;

/// Hue shift between consecutive sectors (degrees)
pub const HUE_STEP: f32 = 25.0;

/// Which spawn markers a generated sector may honour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpawnConfig {
    pub enemy: bool,
    pub player: bool,
}

impl SpawnConfig {
    pub const NONE: SpawnConfig = SpawnConfig {
        enemy: false,
        player: false,
    };
    pub const ENEMIES: SpawnConfig = SpawnConfig {
        enemy: true,
        player: false,
    };
    pub const ALL: SpawnConfig = SpawnConfig {
        enemy: true,
        player: true,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnKind {
    Enemy,
    Player,
}

/// An entity the caller should create inside the new sector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnRequest {
    pub kind: SpawnKind,
    pub pos: Vec2,
}

#[derive(Debug, Clone)]
pub struct Sector {
    pub id: SectorId,
    pub quadrant: Quadrant,
    /// Cosmetic tint in degrees
    pub hue: f32,
    pub grid: Grid,
    /// Ids of entities owned by this sector, in insertion order
    pub entities: Vec<EntityId>,
    pub particles: Vec<Particle>,
}

impl Sector {
    /// Empty sector with no walls; fails for angles outside 0..=3
    pub fn new(id: SectorId, angle: u8, hue: f32) -> Result<Self, SectorError> {
        Ok(Self::blank(id, Quadrant::try_from(angle)?, hue))
    }

    fn blank(id: SectorId, quadrant: Quadrant, hue: f32) -> Self {
        Self {
            id,
            quadrant,
            hue: hue.rem_euclid(360.0),
            grid: Grid::empty(),
            entities: Vec::new(),
            particles: Vec::new(),
        }
    }

    /// Build a sector from a random template and report the spawns it asks for
    pub fn generate<R: Rng>(
        id: SectorId,
        quadrant: Quadrant,
        hue: f32,
        templates: &TemplateSet,
        spawn: SpawnConfig,
        rng: &mut R,
    ) -> (Self, Vec<SpawnRequest>) {
        let mut sector = Self::blank(id, quadrant, hue);
        let fallback = Template::empty();
        let template = templates.pick(rng).unwrap_or(&fallback);
        let mirrored = rng.random_bool(0.5);

        let mut spawns = Vec::new();
        let mut player_placed = false;
        let offset = sector.grid_offset();

        for i in 0..QUADRANT_CELL_WIDTH {
            for j in 0..QUADRANT_CELL_WIDTH {
                let local = IVec2::new(i, j);
                let code = template.sample(local, sector.quadrant, mirrored);
                // Only fractional densities roll the RNG
                let p = code.wall_probability();
                let wall = p >= 1.0 || (p > 0.0 && rng.random::<f32>() < p);
                sector.grid.set_wall(local, wall);

                let pos = cell_center(local + offset);
                match code {
                    CellCode::EnemySpawn if spawn.enemy => spawns.push(SpawnRequest {
                        kind: SpawnKind::Enemy,
                        pos,
                    }),
                    CellCode::PlayerSpawn if spawn.player && !player_placed => {
                        player_placed = true;
                        spawns.push(SpawnRequest {
                            kind: SpawnKind::Player,
                            pos,
                        });
                    }
                    _ => {}
                }
            }
        }

        if spawn.player && !player_placed {
            let middle = IVec2::splat(QUADRANT_CELL_WIDTH / 2);
            sector.grid.set_wall(middle, false);
            log::warn!("Template has no player marker; spawning player mid-sector");
            spawns.push(SpawnRequest {
                kind: SpawnKind::Player,
                pos: cell_center(middle + offset),
            });
        }

        log::debug!(
            "Generated sector {} (quadrant {}, {} walls, {} spawns, mirrored={})",
            id,
            quadrant.index(),
            sector.grid.wall_count(),
            spawns.len(),
            mirrored
        );
        (sector, spawns)
    }

    #[inline]
    pub fn angle(&self) -> u8 {
        self.quadrant.index()
    }

    #[inline]
    pub fn grid_offset(&self) -> IVec2 {
        self.quadrant.grid_offset()
    }

    /// Whether a world position is inside this sector's angular range
    #[inline]
    pub fn contains(&self, pos: Vec2) -> bool {
        self.quadrant.contains(pos)
    }

    /// Wall lookup for an absolute cell known to be in this quadrant
    #[inline]
    pub fn own_cell(&self, cell: IVec2) -> bool {
        self.grid.is_wall(cell - self.grid_offset())
    }

    pub fn add_entity(&mut self, id: EntityId) {
        if !self.entities.contains(&id) {
            self.entities.push(id);
        }
    }

    /// Remove an entity id, keeping order; returns whether it was present
    pub fn remove_entity(&mut self, id: EntityId) -> bool {
        match self.entities.iter().position(|&e| e == id) {
            Some(i) => {
                self.entities.remove(i);
                true
            }
            None => false,
        }
    }

    /// Add particles, dropping the oldest beyond `cap`
    pub fn push_particles(&mut self, particles: impl IntoIterator<Item = Particle>, cap: usize) {
        self.particles.extend(particles);
        if self.particles.len() > cap {
            let excess = self.particles.len() - cap;
            self.particles.drain(..excess);
        }
    }

    pub fn tick_particles(&mut self) {
        particle::advance_all(&mut self.particles);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn solid_template_with(code_at: (usize, usize, f32)) -> TemplateSet {
        let w = QUADRANT_CELL_WIDTH as usize;
        let mut columns = vec![vec![1.0; w]; w];
        columns[code_at.0][code_at.1] = code_at.2;
        TemplateSet::from_templates(vec![Template::from_columns(0, columns).unwrap()])
    }

    fn q(angle: u8) -> Quadrant {
        Quadrant::try_from(angle).unwrap()
    }

    #[test]
    fn test_invalid_angle_fails_construction() {
        assert_eq!(Sector::new(0, 7, 0.0).unwrap_err(), SectorError::InvalidAngle(7));
        let sector = Sector::new(3, 1, 370.0).unwrap();
        assert_eq!(sector.angle(), 1);
        assert!((sector.hue - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_empty_template_set_falls_back_to_open_sector() {
        let mut rng = Pcg32::seed_from_u64(7);
        let (sector, spawns) = Sector::generate(0, q(2), 10.0, &TemplateSet::new(), SpawnConfig::ENEMIES, &mut rng);
        assert_eq!(sector.grid.wall_count(), 0);
        assert!(spawns.is_empty());
    }

    #[test]
    fn test_density_cells_follow_their_probability() {
        let w = QUADRANT_CELL_WIDTH as usize;
        let half = vec![vec![0.5; w]; w];
        let templates = TemplateSet::from_templates(vec![Template::from_columns(0, half).unwrap()]);
        let mut rng = Pcg32::seed_from_u64(11);
        let (sector, _) = Sector::generate(0, q(0), 0.0, &templates, SpawnConfig::NONE, &mut rng);
        let walls = sector.grid.wall_count();
        let cells = w * w;
        assert!(walls > cells / 4 && walls < cells * 3 / 4, "{walls} of {cells}");

        // Certain walls never roll, so the sequence after them is unchanged
        let mut rng = Pcg32::seed_from_u64(11);
        let (sector, _) = Sector::generate(0, q(0), 0.0, &solid_template_with((0, 0, 0.0)), SpawnConfig::NONE, &mut rng);
        assert_eq!(sector.grid.wall_count(), cells - 1);
        let mut fresh = Pcg32::seed_from_u64(11);
        let _ = fresh.random_range(0..1usize);
        let _ = fresh.random_bool(0.5);
        assert_eq!(rng.random::<u32>(), fresh.random::<u32>());
    }

    #[test]
    fn test_spawn_markers_respect_config() {
        // Marker at the template's inner corner stays at the inner corner
        // whatever rotation and mirroring was chosen.
        let templates = solid_template_with((0, 0, 2.0));
        let mut rng = Pcg32::seed_from_u64(3);
        let (_, spawns) = Sector::generate(0, q(0), 0.0, &templates, SpawnConfig::ENEMIES, &mut rng);
        assert_eq!(spawns.len(), 1);
        assert_eq!(spawns[0].kind, SpawnKind::Enemy);
        assert_eq!(spawns[0].pos, cell_center(IVec2::ZERO));

        let (_, spawns) = Sector::generate(1, q(1), 0.0, &templates, SpawnConfig::NONE, &mut rng);
        assert!(spawns.is_empty());
    }

    #[test]
    fn test_player_marker_rotates_into_quadrant() {
        let templates = solid_template_with((0, 0, 3.0));
        let mut rng = Pcg32::seed_from_u64(11);
        let (sector, spawns) = Sector::generate(0, q(2), 0.0, &templates, SpawnConfig::ALL, &mut rng);
        assert_eq!(spawns.len(), 1);
        assert_eq!(spawns[0].kind, SpawnKind::Player);
        // Inner corner of quadrant 2 is cell (-1, -1)
        assert_eq!(spawns[0].pos, cell_center(IVec2::new(-1, -1)));
        assert!(sector.contains(spawns[0].pos));
        assert!(!sector.own_cell(IVec2::new(-1, -1)));
    }

    #[test]
    fn test_player_fallback_clears_middle_cell() {
        let templates = solid_template_with((0, 0, 1.0));
        let mut rng = Pcg32::seed_from_u64(5);
        let (sector, spawns) = Sector::generate(0, q(0), 0.0, &templates, SpawnConfig::ALL, &mut rng);
        assert_eq!(spawns.len(), 1);
        let middle = IVec2::splat(QUADRANT_CELL_WIDTH / 2);
        assert!(!sector.own_cell(middle));
        assert_eq!(sector.grid.wall_count(), (QUADRANT_CELL_WIDTH * QUADRANT_CELL_WIDTH - 1) as usize);
    }

    #[test]
    fn test_entity_membership_is_unique() {
        let mut sector = Sector::new(0, 0, 0.0).unwrap();
        sector.add_entity(4);
        sector.add_entity(4);
        sector.add_entity(9);
        assert_eq!(sector.entities, vec![4, 9]);
        assert!(sector.remove_entity(4));
        assert!(!sector.remove_entity(4));
        assert_eq!(sector.entities, vec![9]);
    }

    #[test]
    fn test_particle_cap_drops_oldest() {
        let mut sector = Sector::new(0, 0, 0.0).unwrap();
        let tracers = (0..5).map(|i| Particle::tracer(Vec2::splat(i as f32), Vec2::ZERO));
        sector.push_particles(tracers, 3);
        assert_eq!(sector.particles.len(), 3);
        assert_eq!(sector.particles[0], Particle::tracer(Vec2::splat(2.0), Vec2::ZERO));
        sector.push_particles([Particle::flash(Vec2::ZERO, 1.0)], 0);
        assert!(sector.particles.is_empty());
    }
}
