//! Cosmetic particles
//!
//! Particles are plain records owned by a sector. Each frame the sector runs
//! `advance`, which returns the next state and whether the effect is done;
//! finished particles are dropped. Nothing in the simulation reads them.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;

use crate::polar_to_cartesian;

#[derive(Debug, Clone, PartialEq)]
pub enum ParticleKind {
    /// Debris flying out of a killed enemy
    Spark { pos: Vec2, vel: Vec2, hue: f32 },
    /// Expanding ring at an explosion center
    Flash { pos: Vec2, radius: f32 },
    /// Fading line along a fired shot
    Tracer { from: Vec2, to: Vec2 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub kind: ParticleKind,
    /// Ticks remaining
    pub life: u32,
    pub max_life: u32,
}

const SPARK_LIFE: u32 = 30;
const FLASH_LIFE: u32 = 12;
const TRACER_LIFE: u32 = 8;

impl Particle {
    fn new(kind: ParticleKind, life: u32) -> Self {
        Self {
            kind,
            life,
            max_life: life,
        }
    }

    pub fn flash(pos: Vec2, radius: f32) -> Self {
        Self::new(ParticleKind::Flash { pos, radius }, FLASH_LIFE)
    }

    pub fn tracer(from: Vec2, to: Vec2) -> Self {
        Self::new(ParticleKind::Tracer { from, to }, TRACER_LIFE)
    }

    /// Sparks scattered in random directions from `pos`
    pub fn spark_burst<R: Rng>(pos: Vec2, hue: f32, count: u32, rng: &mut R) -> Vec<Self> {
        (0..count)
            .map(|_| {
                let angle = rng.random_range(0.0..TAU);
                let speed = rng.random_range(1.0..4.0);
                let life = SPARK_LIFE - rng.random_range(0..SPARK_LIFE / 2);
                Self::new(
                    ParticleKind::Spark {
                        pos,
                        vel: polar_to_cartesian(speed, angle),
                        hue,
                    },
                    life,
                )
            })
            .collect()
    }

    /// Step one frame. Returns the next state and `true` once expired.
    pub fn advance(self) -> (Self, bool) {
        let kind = match self.kind {
            ParticleKind::Spark { pos, vel, hue } => ParticleKind::Spark {
                pos: pos + vel,
                vel: vel * 0.9,
                hue,
            },
            ParticleKind::Flash { pos, radius } => ParticleKind::Flash {
                pos,
                radius: radius * 1.08,
            },
            tracer @ ParticleKind::Tracer { .. } => tracer,
        };
        let life = self.life.saturating_sub(1);
        (
            Self {
                kind,
                life,
                max_life: self.max_life,
            },
            life == 0,
        )
    }

    /// Remaining life as 0..=1, for fading
    pub fn alpha(&self) -> f32 {
        if self.max_life == 0 {
            0.0
        } else {
            self.life as f32 / self.max_life as f32
        }
    }
}

/// Advance every particle once and drop the finished ones
pub fn advance_all(particles: &mut Vec<Particle>) {
    *particles = particles
        .drain(..)
        .map(Particle::advance)
        .filter_map(|(p, done)| (!done).then_some(p))
        .collect();
}
