//! Game state
//!
//! One `Game` owns everything a round mutates: the sector window, the global
//! entity list (sorted by id for determinism), camera, score, RNG and the
//! sound cues waiting to be drained by the platform.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityId, find, find_mut};
use super::grid::Quadrant;
use super::score::Scoreboard;
use super::sector::{Sector, SectorId, SpawnConfig, SpawnKind, SpawnRequest};
use super::template::TemplateSet;
use super::window::SectorWindow;
use crate::audio::{SoundCue, SoundEffect};
use crate::consts::*;
use crate::settings::Settings;
use crate::tuning::Tuning;

/// Everything needed to start a reproducible round
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimConfig {
    pub seed: u64,
    #[serde(default)]
    pub tuning: Tuning,
    #[serde(default)]
    pub settings: Settings,
}

/// View state: follow target, decaying shake and shot recoil
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub shake: f32,
    /// World point the view eases toward
    pub target: Vec2,
    /// Screen kick that decays back to zero
    pub recoil: Vec2,
    /// Per-frame shake displacement (shake squared, rounded to pixels)
    pub jitter: Vec2,
    /// Last known player sector and position; the view stays anchored
    /// there after the player is gone
    pub focus: Option<(SectorId, Vec2)>,
}

impl Camera {
    /// Decay shake and recoil, ease toward `focus` and roll this frame's jitter
    pub fn update<R: Rng>(
        &mut self,
        focus: Option<(SectorId, Vec2)>,
        tuning: &Tuning,
        shake_enabled: bool,
        rng: &mut R,
    ) {
        self.shake *= tuning.camera_damping;
        if self.shake < 0.01 {
            self.shake = 0.0;
        }
        self.recoil *= tuning.camera_damping;
        if let Some((_, pos)) = focus {
            self.focus = focus;
            self.target = self.target.lerp(pos, tuning.camera_follow);
        }

        let amplitude = self.shake * self.shake;
        self.jitter = if shake_enabled && amplitude > 0.0 {
            let dx: f32 = rng.random_range(-1.0..=1.0);
            let dy: f32 = rng.random_range(-1.0..=1.0);
            (Vec2::new(dx, dy) * amplitude).round()
        } else {
            Vec2::ZERO
        };
    }

    /// Translation applied to world coordinates for drawing
    pub fn offset(&self) -> Vec2 {
        Vec2::new(SCREEN_WIDTH, SCREEN_HEIGHT) / 2.0 - self.target + self.recoil + self.jitter
    }

    #[inline]
    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        world + self.offset()
    }

    #[inline]
    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        screen - self.offset()
    }
}

/// End-of-round report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSummary {
    pub score: u64,
    pub kills: u32,
    pub best_streak: u32,
    pub ticks: u64,
}

#[derive(Debug, Clone)]
pub struct Game {
    pub seed: u64,
    pub tuning: Tuning,
    pub settings: Settings,
    pub rng: Pcg32,
    pub templates: TemplateSet,
    pub sectors: SectorWindow,
    /// Every live entity, sorted by id
    pub entities: Vec<Entity>,
    pub camera: Camera,
    pub score: Scoreboard,
    pub time_ticks: u64,
    pub player_id: Option<EntityId>,
    sounds: Vec<SoundCue>,
    next_id: EntityId,
}

impl Game {
    /// Start a round: `WINDOW_MIN_LEN` sectors, the last one holding the player
    pub fn new(config: SimConfig, templates: TemplateSet) -> Self {
        let mut game = Self {
            seed: config.seed,
            tuning: config.tuning,
            settings: config.settings,
            rng: Pcg32::seed_from_u64(config.seed),
            templates,
            sectors: SectorWindow::new(),
            entities: Vec::new(),
            camera: Camera::default(),
            score: Scoreboard::default(),
            time_ticks: 0,
            player_id: None,
            sounds: Vec::new(),
            next_id: 1,
        };

        for i in 0..WINDOW_MIN_LEN {
            let spawn = if i + 1 == WINDOW_MIN_LEN {
                SpawnConfig::ALL
            } else {
                SpawnConfig::NONE
            };
            game.append_sector(spawn);
        }
        if let Some((sector, pos)) = game.player().map(|p| (p.sector, p.body.pos)) {
            game.camera.target = pos;
            game.camera.focus = Some((sector, pos));
        }

        log::info!(
            "Game started (seed {}, {} templates)",
            config.seed,
            game.templates.len()
        );
        game
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        find(&self.entities, id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        find_mut(&mut self.entities, id)
    }

    /// Register an entity with its sector and the global list.
    /// Returns false (and drops it) when its sector is not in the window.
    pub fn spawn(&mut self, entity: Entity) -> bool {
        let Some(sector) = self
            .sectors
            .index_of(entity.sector)
            .and_then(|i| self.sectors.get_mut(i))
        else {
            log::warn!("Dropping entity {}: sector {} not active", entity.id, entity.sector);
            return false;
        };
        sector.add_entity(entity.id);
        match self.entities.binary_search_by_key(&entity.id, |e| e.id) {
            Ok(i) => self.entities[i] = entity,
            Err(i) => self.entities.insert(i, entity),
        }
        true
    }

    /// Remove an entity from its sector and from the global list
    pub fn remove_entity(&mut self, id: EntityId) -> Option<Entity> {
        let i = self.entities.binary_search_by_key(&id, |e| e.id).ok()?;
        let entity = self.entities.remove(i);
        if let Some(sector) = self
            .sectors
            .index_of(entity.sector)
            .and_then(|s| self.sectors.get_mut(s))
        {
            sector.remove_entity(id);
        }
        Some(entity)
    }

    pub fn player(&self) -> Option<&Entity> {
        self.player_id.and_then(|id| self.entity(id))
    }

    pub fn player_alive(&self) -> bool {
        self.player().is_some_and(|p| !p.dead)
    }

    /// Window index of the sector holding the player
    pub fn player_sector_index(&self) -> Option<usize> {
        self.player().and_then(|p| self.sectors.index_of(p.sector))
    }

    /// Generate the sector after the back of the window (or the first one)
    pub fn append_sector(&mut self, spawn: SpawnConfig) {
        let (id, quadrant, hue) = match self.sectors.next_params() {
            Some(params) => params,
            None => {
                let quadrant = Quadrant::ALL[self.rng.random_range(0..Quadrant::ALL.len())];
                (0, quadrant, self.rng.random_range(0.0..360.0))
            }
        };
        let (sector, spawns) = Sector::generate(id, quadrant, hue, &self.templates, spawn, &mut self.rng);
        self.sectors.push_back(sector);
        self.apply_spawns(id, spawns);
    }

    /// Generate a spawn-free sector in front of the window
    pub fn prepend_sector(&mut self) {
        let Some((id, quadrant, hue)) = self.sectors.prev_params() else {
            self.append_sector(SpawnConfig::NONE);
            return;
        };
        let (sector, _) = Sector::generate(id, quadrant, hue, &self.templates, SpawnConfig::NONE, &mut self.rng);
        self.sectors.push_front(sector);
    }

    fn apply_spawns(&mut self, sector: SectorId, spawns: Vec<SpawnRequest>) {
        for request in spawns {
            let id = self.next_entity_id();
            let entity = match request.kind {
                SpawnKind::Enemy => Entity::enemy(id, request.pos, sector, &self.tuning),
                SpawnKind::Player => {
                    self.player_id = Some(id);
                    Entity::player(id, request.pos, sector, &self.tuning)
                }
            };
            self.spawn(entity);
        }
    }

    /// Drop the front sector and every entity it owns; returns how many
    pub fn evict_front(&mut self) -> usize {
        let Some(sector) = self.sectors.pop_front() else {
            return 0;
        };
        let count = sector.entities.len();
        self.entities.retain(|e| !sector.entities.contains(&e.id));
        log::debug!("Evicted sector {} with {} entities", sector.id, count);
        count
    }

    /// Drop the back sector and every entity it owns; returns how many
    fn evict_back(&mut self) -> usize {
        let Some(sector) = self.sectors.pop_back() else {
            return 0;
        };
        let count = sector.entities.len();
        self.entities.retain(|e| !sector.entities.contains(&e.id));
        log::debug!("Evicted back sector {} with {} entities", sector.id, count);
        count
    }

    /// Re-center the window on the player's sector: grow behind while the
    /// player is at the front, grow ahead until `WINDOW_AHEAD` sectors are
    /// in reach, then evict the front down to `WINDOW_BACK_THRESHOLD`.
    pub fn resize_window(&mut self) {
        let Some(mut index) = self.player_sector_index() else {
            return;
        };
        while index < 1 {
            self.prepend_sector();
            index += 1;
        }
        while index + WINDOW_AHEAD > self.sectors.len() {
            self.append_sector(SpawnConfig::ENEMIES);
        }
        while index > WINDOW_BACK_THRESHOLD {
            self.evict_front();
            index -= 1;
        }
        // Retreating only grows the front; keep the far back bounded
        while self.sectors.len() > index + 2 * WINDOW_AHEAD {
            self.evict_back();
        }
    }

    /// Transfer membership of `id` between two window slots
    pub fn move_entity_to(&mut self, id: EntityId, from: usize, to: usize) {
        let Some(target) = self.sectors.get(to).map(|s| s.id) else {
            return;
        };
        if let Some(sector) = self.sectors.get_mut(from) {
            sector.remove_entity(id);
        }
        if let Some(sector) = self.sectors.get_mut(to) {
            sector.add_entity(id);
        }
        if let Some(entity) = self.entity_mut(id) {
            entity.sector = target;
        }
    }

    /// Queue a sound at its base volume
    pub fn cue(&mut self, effect: SoundEffect) {
        self.sounds.push(SoundCue::new(effect));
    }

    pub fn cue_with(&mut self, cue: SoundCue) {
        self.sounds.push(cue);
    }

    /// Take every queued cue
    pub fn drain_sounds(&mut self) -> Vec<SoundCue> {
        std::mem::take(&mut self.sounds)
    }

    pub fn summary(&self) -> RoundSummary {
        RoundSummary {
            score: self.score.score,
            kills: self.score.kills,
            best_streak: self.score.best_streak,
            ticks: self.time_ticks,
        }
    }
}

/// Round with wall-free sectors, for tests
#[cfg(test)]
pub(crate) fn open_game(seed: u64) -> Game {
    Game::new(
        SimConfig {
            seed,
            ..Default::default()
        },
        TemplateSet::new(),
    )
}
