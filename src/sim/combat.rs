//! Combat resolution
//!
//! Shots and explosions are hitscan rays marched through the sector window
//! in fixed steps. A ray collects every entity it passes near and stops at
//! the first wall sample it cannot penetrate.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;

use super::entity::{Entity, EntityId, find, find_mut};
use super::particle::Particle;
use super::state::Game;
use super::window::SectorWindow;
use crate::audio::{SoundCue, SoundEffect};

/// Distance between ray samples
pub const RAY_STEP: f32 = 4.0;
/// Added to an entity's radius when testing a sample against it
pub const RAY_RADIUS: f32 = 2.0;
/// Rays fired per explosion
pub const EXPLOSION_RAYS: u32 = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec2,
    pub angle: f32,
    /// Window index of the sector the origin lies in
    pub sector: usize,
    pub max_steps: u32,
    pub max_distance: Option<f32>,
    /// Wall samples the ray may pass through
    pub penetration: u32,
    /// Entity never reported as hit (the shooter)
    pub ignore: Option<EntityId>,
}

impl Ray {
    /// Shot that stops at the first wall
    pub fn shot(origin: Vec2, angle: f32, sector: usize, range: f32, shooter: EntityId) -> Self {
        Self {
            origin,
            angle,
            sector,
            max_steps: (range / RAY_STEP).ceil() as u32,
            max_distance: None,
            penetration: 0,
            ignore: Some(shooter),
        }
    }

    /// Explosion ray limited by distance rather than step count
    pub fn blast(origin: Vec2, angle: f32, sector: usize, distance: f32, penetration: u32, source: EntityId) -> Self {
        Self {
            origin,
            angle,
            sector,
            max_steps: (distance / RAY_STEP).ceil() as u32 + 1,
            max_distance: Some(distance),
            penetration,
            ignore: Some(source),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RayResult {
    /// Last sample reached
    pub end: Vec2,
    /// Entities hit, in the order they were reached
    pub hits: Vec<EntityId>,
    /// Whether a wall stopped the ray
    pub blocked: bool,
}

/// March a ray through the window, collecting entity hits
pub fn ray_march(window: &SectorWindow, entities: &[Entity], ray: &Ray) -> RayResult {
    let dir = Vec2::from_angle(ray.angle);
    let mut sector = ray.sector;
    let mut budget = ray.penetration;
    let mut result = RayResult {
        end: ray.origin,
        hits: Vec::new(),
        blocked: false,
    };
    if window.is_empty() {
        return result;
    }

    for step in 0..ray.max_steps {
        let point = ray.origin + dir * (step as f32 * RAY_STEP);
        if ray.max_distance.is_some_and(|d| point.distance(ray.origin) > d) {
            break;
        }
        result.end = point;
        sector = window.step_toward(sector, point);

        if window.is_solid_at(sector, point) {
            if budget == 0 {
                result.blocked = true;
                break;
            }
            budget -= 1;
        }

        let last = window.len() - 1;
        for index in sector.saturating_sub(1)..=(sector + 1).min(last) {
            let Some(s) = window.get(index) else {
                continue;
            };
            for &id in &s.entities {
                if ray.ignore == Some(id) || result.hits.contains(&id) {
                    continue;
                }
                let Some(entity) = find(entities, id) else {
                    continue;
                };
                if !entity.dead && entity.body.pos.distance(point) < entity.body.size / 2.0 + RAY_RADIUS {
                    result.hits.push(id);
                }
            }
        }
    }
    result
}

impl Game {
    /// Deliver ray hits to their entities
    pub fn apply_ray_hits(&mut self, hits: &[EntityId]) {
        for &id in hits {
            let Some(entity) = find_mut(&mut self.entities, id) else {
                continue;
            };
            let was_player = entity.is_player();
            if let Some(sound) = entity.on_ray_hit(&self.tuning) {
                if was_player && sound == SoundEffect::PlayerKilled {
                    log::info!("Player killed at tick {} (score {})", self.time_ticks, self.score.score);
                }
                self.cue(sound);
            }
        }
    }

    /// Hitscan shot from the sector at window index `sector`
    pub fn fire_shot(&mut self, sector: usize, shooter: EntityId, origin: Vec2, angle: f32) {
        let ray = Ray::shot(origin, angle, sector, self.tuning.shot_range, shooter);
        let result = ray_march(&self.sectors, &self.entities, &ray);
        self.apply_ray_hits(&result.hits);

        self.camera.shake += self.tuning.shot_shake;
        self.camera.recoil -= Vec2::from_angle(angle) * self.tuning.shot_recoil;

        let cap = self.settings.max_particles();
        if let Some(s) = self.sectors.get_mut(sector) {
            s.push_particles([Particle::tracer(origin, result.end)], cap);
        }
        self.cue(SoundEffect::Shot);
    }

    /// Detonate `origin` at `pos`: it dies, and random rays stun, kill or
    /// prime whatever they reach. Each entity is hit at most once.
    pub fn explode(&mut self, sector: usize, origin: EntityId, pos: Vec2, radius: f32) {
        self.camera.shake += self.tuning.explosion_shake * radius;
        if let Some(entity) = find_mut(&mut self.entities, origin) {
            entity.kill();
        }

        let distance = self.tuning.explosion_radius * radius;
        let mut hits: Vec<EntityId> = Vec::new();
        for _ in 0..EXPLOSION_RAYS {
            let angle = self.rng.random_range(0.0..TAU);
            let ray = Ray::blast(pos, angle, sector, distance, self.tuning.explosion_penetration, origin);
            for id in ray_march(&self.sectors, &self.entities, &ray).hits {
                if !hits.contains(&id) {
                    hits.push(id);
                }
            }
        }
        self.apply_ray_hits(&hits);

        let cap = self.settings.max_particles();
        if let Some(s) = self.sectors.get_mut(sector) {
            s.push_particles([Particle::flash(pos, distance / 2.0)], cap);
        }
        let rate = self.rng.random_range(0.8..1.2);
        self.cue_with(SoundCue::new(SoundEffect::Explosion).with_rate(rate));
        log::debug!("Explosion at ({:.0}, {:.0}) r={:.1}, {} hits", pos.x, pos.y, radius, hits.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::grid::{cell_center, cell_of};
    use crate::sim::sector::Sector;
    use crate::sim::state::open_game;
    use glam::IVec2;

    /// Open window of three sectors (quadrants 0, 1, 2) with one entity list
    fn setup() -> (SectorWindow, Vec<Entity>) {
        let mut window = SectorWindow::new();
        window.push_back(Sector::new(0, 0, 0.0).unwrap());
        window.push_back(Sector::new(1, 1, 0.0).unwrap());
        window.push_back(Sector::new(2, 2, 0.0).unwrap());
        (window, Vec::new())
    }

    fn place(window: &mut SectorWindow, entities: &mut Vec<Entity>, entity: Entity) {
        let index = window.index_of(entity.sector).unwrap();
        window.get_mut(index).unwrap().add_entity(entity.id);
        entities.push(entity);
        entities.sort_by_key(|e| e.id);
    }

    #[test]
    fn test_ray_starting_in_wall_without_penetration_hits_nothing() {
        let (mut window, mut entities) = setup();
        let tuning = crate::Tuning::default();
        window.get_mut(0).unwrap().grid.set_wall(IVec2::new(3, 3), true);
        let origin = cell_center(IVec2::new(3, 3));
        // Enemy right on top of the origin
        place(&mut window, &mut entities, Entity::enemy(1, origin, 0, &tuning));

        let ray = Ray {
            origin,
            angle: 0.0,
            sector: 0,
            max_steps: 50,
            max_distance: None,
            penetration: 0,
            ignore: None,
        };
        let result = ray_march(&window, &entities, &ray);
        assert!(result.blocked);
        assert!(result.hits.is_empty());
        assert_eq!(result.end, origin);

        // With one point of penetration the same ray goes through and hits
        let result = ray_march(&window, &entities, &Ray { penetration: 1, ..ray });
        assert_eq!(result.hits, vec![1]);
    }

    #[test]
    fn test_shot_follows_ray_into_next_sector() {
        let (mut window, mut entities) = setup();
        let tuning = crate::Tuning::default();
        let origin = Vec2::new(20.0, 100.0);
        let target = Vec2::new(-60.0, 100.0);
        assert_eq!(window.step_toward(0, target), 1);
        place(&mut window, &mut entities, Entity::player(1, origin, 0, &tuning));
        place(&mut window, &mut entities, Entity::enemy(2, target, 1, &tuning));

        let ray = Ray::shot(origin, std::f32::consts::PI, 0, 200.0, 1);
        let result = ray_march(&window, &entities, &ray);
        assert_eq!(result.hits, vec![2]);
        assert!(!result.blocked);
    }

    #[test]
    fn test_shot_stops_at_wall() {
        let (mut window, mut entities) = setup();
        let tuning = crate::Tuning::default();
        let origin = cell_center(IVec2::new(1, 4));
        let wall = IVec2::new(4, 4);
        window.get_mut(0).unwrap().grid.set_wall(wall, true);
        place(&mut window, &mut entities, Entity::enemy(2, cell_center(IVec2::new(7, 4)), 0, &tuning));

        let result = ray_march(&window, &entities, &Ray::shot(origin, 0.0, 0, 300.0, 1));
        assert!(result.blocked);
        assert!(result.hits.is_empty());
        assert_eq!(cell_of(result.end), wall);
    }

    #[test]
    fn test_explosion_respects_distance() {
        let (mut window, mut entities) = setup();
        let tuning = crate::Tuning::default();
        let center = Vec2::new(150.0, 150.0);
        place(&mut window, &mut entities, Entity::enemy(1, center + Vec2::new(30.0, 0.0), 0, &tuning));
        place(&mut window, &mut entities, Entity::enemy(2, center + Vec2::new(100.0, 0.0), 0, &tuning));

        let ray = Ray::blast(center, 0.0, 0, 60.0, 3, 99);
        let result = ray_march(&window, &entities, &ray);
        assert_eq!(result.hits, vec![1]);
        assert!(result.end.distance(center) <= 60.0);
    }

    #[test]
    fn test_explosion_stuns_enemies_and_kills_player() {
        let mut game = open_game(11);
        game.resize_window();
        let index = game.player_sector_index().unwrap();
        let sector_id = game.sectors.get(index).unwrap().id;
        let player_pos = game.player().unwrap().body.pos;

        // Everything within reach of the first sample is hit by every ray
        let bomb_pos = player_pos;
        let bystander_pos = player_pos - player_pos.normalize() * 5.0;
        let bomb = game.next_entity_id();
        let bystander = game.next_entity_id();
        let e = Entity::enemy(bomb, bomb_pos, sector_id, &game.tuning);
        game.spawn(e);
        let e = Entity::enemy(bystander, bystander_pos, sector_id, &game.tuning);
        game.spawn(e);

        game.explode(index, bomb, bomb_pos, 1.0);

        assert!(game.entity(bomb).unwrap().dead);
        assert_eq!(game.entity(bystander).unwrap().stun_timer(), Some(0));
        assert!(!game.player_alive());
        assert!(game.camera.shake > 0.0);

        let sounds = game.drain_sounds();
        assert!(sounds.iter().any(|c| c.effect == SoundEffect::Explosion));
        assert!(sounds.iter().any(|c| c.effect == SoundEffect::PlayerKilled));
        assert_eq!(sounds.iter().filter(|c| c.effect == SoundEffect::EnemyStunned).count(), 1);
    }

    #[test]
    fn test_fire_shot_kicks_camera_and_leaves_tracer() {
        let mut game = open_game(2);
        let index = game.player_sector_index().unwrap();
        let player = game.player().unwrap();
        let (id, pos) = (player.id, player.body.pos);

        game.fire_shot(index, id, pos, 0.0);
        assert!(game.player_alive());
        assert_eq!(game.camera.shake, game.tuning.shot_shake);
        assert!(game.camera.recoil.x < 0.0);
        assert_eq!(game.sectors.get(index).unwrap().particles.len(), 1);
        assert_eq!(game.drain_sounds(), vec![SoundCue::new(SoundEffect::Shot)]);
    }
}
