//! Entities: a shared physical body plus a per-kind state variant
//!
//! Kind behaviors (`think`, `collide`, `on_ray_hit`) are plain `match`
//! dispatches. Anything that needs the wider game (firing rays, spawning,
//! exploding) is returned as an `Action` for the sector tick to resolve.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::sector::SectorId;
use crate::audio::SoundEffect;
use crate::input::{BUTTON_PRIMARY, BUTTON_SECONDARY, InputState};
use crate::tuning::Tuning;

pub type EntityId = u32;

/// Physical state shared by every kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Collision diameter
    pub size: f32,
    /// Restitution on wall impact (0 stops dead)
    pub bounce: f32,
    /// Whether the last move hit a wall on either axis
    pub hit_wall: bool,
}

impl Body {
    pub fn new(pos: Vec2, size: f32, bounce: f32) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            size,
            bounce,
            hit_wall: false,
        }
    }

    /// Pairwise overlap test: center distance below the mean diameter
    #[inline]
    pub fn touches(&self, other: &Body) -> bool {
        self.pos.distance(other.pos) < (self.size + other.size) / 2.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    /// Ticks since the last shot
    pub refire: u32,
    /// Ticks since the last grenade
    pub grenade_refire: u32,
    /// Aim angle toward the pointer (radians)
    pub aim: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnemyState {
    /// Ticks since being stunned; `None` while healthy
    pub stun: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrenadeState {
    /// Ticks left once primed
    pub fuse: Option<u32>,
    pub age: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityKind {
    Player(PlayerState),
    Enemy(EnemyState),
    Grenade(GrenadeState),
}

/// Kind tag without state, for collision partners and rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityTag {
    Player,
    Enemy,
    Grenade,
}

/// Effects an entity asks the sector tick to carry out
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Hitscan shot from `origin` along `angle`
    Fire {
        shooter: EntityId,
        origin: Vec2,
        angle: f32,
    },
    /// Spawn a grenade
    Throw { origin: Vec2, vel: Vec2 },
    /// Detonate the entity at `pos`
    Explode {
        origin: EntityId,
        pos: Vec2,
        radius: f32,
    },
}

/// What an entity may look at while deciding its move
#[derive(Debug, Clone, Copy)]
pub struct ThinkContext<'a> {
    pub input: &'a InputState,
    /// Pointer position in world space
    pub aim_target: Vec2,
    /// Player position, when the player is alive and within one sector slot
    pub player_pos: Option<Vec2>,
    pub tuning: &'a Tuning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub body: Body,
    /// Owning sector
    pub sector: SectorId,
    /// Marked for removal by the owning sector's next tick
    pub dead: bool,
    pub kind: EntityKind,
}

impl Entity {
    pub fn player(id: EntityId, pos: Vec2, sector: SectorId, tuning: &Tuning) -> Self {
        Self {
            id,
            body: Body::new(pos, tuning.player_size, 0.0),
            sector,
            dead: false,
            kind: EntityKind::Player(PlayerState::default()),
        }
    }

    pub fn enemy(id: EntityId, pos: Vec2, sector: SectorId, tuning: &Tuning) -> Self {
        Self {
            id,
            body: Body::new(pos, tuning.enemy_size, 0.0),
            sector,
            dead: false,
            kind: EntityKind::Enemy(EnemyState::default()),
        }
    }

    pub fn grenade(id: EntityId, pos: Vec2, vel: Vec2, sector: SectorId, tuning: &Tuning) -> Self {
        let mut body = Body::new(pos, tuning.grenade_size, tuning.grenade_bounce);
        body.vel = vel;
        Self {
            id,
            body,
            sector,
            dead: false,
            kind: EntityKind::Grenade(GrenadeState::default()),
        }
    }

    pub fn tag(&self) -> EntityTag {
        match self.kind {
            EntityKind::Player(_) => EntityTag::Player,
            EntityKind::Enemy(_) => EntityTag::Enemy,
            EntityKind::Grenade(_) => EntityTag::Grenade,
        }
    }

    #[inline]
    pub fn is_player(&self) -> bool {
        matches!(self.kind, EntityKind::Player(_))
    }

    /// Stun ticks for enemies, `None` when healthy or not an enemy
    pub fn stun_timer(&self) -> Option<u32> {
        match &self.kind {
            EntityKind::Enemy(state) => state.stun,
            _ => None,
        }
    }

    pub fn kill(&mut self) {
        self.dead = true;
    }

    /// Per-kind behavior before movement
    pub fn think(&mut self, ctx: &ThinkContext) -> Option<Action> {
        let tuning = ctx.tuning;
        let body = &mut self.body;
        match &mut self.kind {
            EntityKind::Player(state) => {
                body.vel *= tuning.player_damping;
                body.vel += ctx.input.move_axis() * tuning.player_accel;

                let to_aim = ctx.aim_target - body.pos;
                if to_aim.length_squared() > f32::EPSILON {
                    state.aim = to_aim.y.atan2(to_aim.x);
                }

                state.refire = state.refire.saturating_add(1);
                state.grenade_refire = state.grenade_refire.saturating_add(1);

                if state.refire > tuning.player_refire_ticks
                    && ctx.input.is_button_held(BUTTON_PRIMARY)
                {
                    state.refire = 0;
                    return Some(Action::Fire {
                        shooter: self.id,
                        origin: body.pos,
                        angle: state.aim,
                    });
                }
                let wants_grenade =
                    ctx.input.is_button_held(BUTTON_SECONDARY) || ctx.input.is_key_held("Q");
                if state.grenade_refire > tuning.grenade_refire_ticks && wants_grenade {
                    state.grenade_refire = 0;
                    let dir = Vec2::from_angle(state.aim);
                    return Some(Action::Throw {
                        origin: body.pos,
                        vel: dir * tuning.grenade_throw_speed + body.vel,
                    });
                }
                None
            }
            EntityKind::Enemy(state) => {
                body.vel *= tuning.enemy_damping;
                match state.stun.as_mut() {
                    Some(timer) => {
                        *timer += 1;
                        if *timer > tuning.stun_detonate_ticks {
                            return Some(Action::Explode {
                                origin: self.id,
                                pos: body.pos,
                                radius: 1.0,
                            });
                        }
                    }
                    None => {
                        if let Some(target) = ctx.player_pos {
                            let offset = target - body.pos;
                            if offset.length() < tuning.enemy_sight {
                                body.vel += offset.normalize_or_zero() * tuning.enemy_accel;
                            }
                        }
                    }
                }
                None
            }
            EntityKind::Grenade(state) => {
                body.vel *= tuning.grenade_damping;
                state.age += 1;
                if body.hit_wall && state.fuse.is_none() {
                    state.fuse = Some(tuning.grenade_fuse_ticks);
                }
                if let Some(fuse) = state.fuse.as_mut() {
                    *fuse = fuse.saturating_sub(1);
                }
                if state.fuse == Some(0) || state.age >= tuning.grenade_timeout_ticks {
                    return Some(Action::Explode {
                        origin: self.id,
                        pos: body.pos,
                        radius: tuning.grenade_radius,
                    });
                }
                None
            }
        }
    }

    /// React to touching `other`. Returns a sound to cue, if any.
    pub fn collide(&mut self, other: EntityTag, other_pos: Vec2, tuning: &Tuning) -> Option<SoundEffect> {
        match &mut self.kind {
            EntityKind::Enemy(state) => {
                self.body.vel += (self.body.pos - other_pos) * tuning.enemy_knockback;
                if other == EntityTag::Player && state.stun.is_none() {
                    state.stun = Some(0);
                    return Some(SoundEffect::EnemyStunned);
                }
                None
            }
            EntityKind::Grenade(state) => {
                if other == EntityTag::Enemy && state.fuse.is_none() {
                    state.fuse = Some(tuning.grenade_fuse_ticks);
                }
                None
            }
            EntityKind::Player(_) => None,
        }
    }

    /// React to a ray passing through. Returns a sound to cue, if any.
    ///
    /// Enemies start their stun countdown; a running countdown is advanced
    /// by `stun_hit_advance`, clamped to the detonation threshold.
    pub fn on_ray_hit(&mut self, tuning: &Tuning) -> Option<SoundEffect> {
        match &mut self.kind {
            EntityKind::Enemy(state) => match state.stun {
                None => {
                    state.stun = Some(0);
                    Some(SoundEffect::EnemyStunned)
                }
                Some(t) => {
                    state.stun = Some((t + tuning.stun_hit_advance).min(tuning.stun_detonate_ticks));
                    None
                }
            },
            EntityKind::Player(_) => {
                if self.dead {
                    None
                } else {
                    self.dead = true;
                    Some(SoundEffect::PlayerKilled)
                }
            }
            EntityKind::Grenade(state) => {
                if state.fuse.is_none() {
                    state.fuse = Some(tuning.grenade_fuse_ticks);
                }
                None
            }
        }
    }
}

/// Look up an entity in a slice kept sorted by id
pub fn find(entities: &[Entity], id: EntityId) -> Option<&Entity> {
    entities.binary_search_by_key(&id, |e| e.id).ok().map(|i| &entities[i])
}

pub fn find_mut(entities: &mut [Entity], id: EntityId) -> Option<&mut Entity> {
    entities
        .binary_search_by_key(&id, |e| e.id)
        .ok()
        .map(move |i| &mut entities[i])
}
