//! Rendering collaborator
//!
//! The simulation describes each frame as calls on a `Canvas`; turning those
//! into pixels is the host's job. `CommandCanvas` records the calls so frames
//! can be inspected headlessly.

use std::f32::consts::{FRAC_PI_2, PI};

use glam::{IVec2, Vec2};

use crate::consts::{ARENA_RADIUS, CELL_SIZE, QUADRANT_CELL_WIDTH};
use crate::sim::entity::{EntityKind, find};
use crate::sim::particle::ParticleKind;
use crate::sim::score::Scoreboard;
use crate::sim::{Entity, Sector, SectorWindow};

/// HSLA color: hue in degrees, the rest in 0..=1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub h: f32,
    pub s: f32,
    pub l: f32,
    pub a: f32,
}

impl Color {
    pub const fn hsla(h: f32, s: f32, l: f32, a: f32) -> Self {
        Self { h, s, l, a }
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }
}

const PLAYER_COLOR: Color = Color::hsla(190.0, 0.9, 0.7, 1.0);
const ENEMY_COLOR: Color = Color::hsla(330.0, 1.0, 0.45, 1.0);
const STUN_FLASH_COLOR: Color = Color::hsla(0.0, 0.0, 1.0, 1.0);
const GRENADE_COLOR: Color = Color::hsla(50.0, 1.0, 0.55, 1.0);
const HUD_COLOR: Color = Color::hsla(0.0, 0.0, 0.95, 1.0);

/// Drawing surface supplied by the host
pub trait Canvas {
    fn clear(&mut self);
    /// Translation from world to screen for subsequent world-space calls
    fn set_transform(&mut self, offset: Vec2);
    /// Restrict drawing to a wedge around the arena center
    fn clip_wedge(&mut self, radius: f32, start: f32, end: f32);
    fn reset_clip(&mut self);
    fn fill_wedge(&mut self, radius: f32, start: f32, end: f32, color: Color);
    fn fill_rect(&mut self, pos: Vec2, size: Vec2, color: Color);
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color);
    fn line(&mut self, from: Vec2, to: Vec2, width: f32, color: Color);
    fn text(&mut self, pos: Vec2, text: &str, color: Color);
}

/// Discards everything
#[derive(Debug, Default)]
pub struct NullCanvas;

impl Canvas for NullCanvas {
    fn clear(&mut self) {}
    fn set_transform(&mut self, _offset: Vec2) {}
    fn clip_wedge(&mut self, _radius: f32, _start: f32, _end: f32) {}
    fn reset_clip(&mut self) {}
    fn fill_wedge(&mut self, _radius: f32, _start: f32, _end: f32, _color: Color) {}
    fn fill_rect(&mut self, _pos: Vec2, _size: Vec2, _color: Color) {}
    fn fill_circle(&mut self, _center: Vec2, _radius: f32, _color: Color) {}
    fn line(&mut self, _from: Vec2, _to: Vec2, _width: f32, _color: Color) {}
    fn text(&mut self, _pos: Vec2, _text: &str, _color: Color) {}
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear,
    SetTransform(Vec2),
    ClipWedge { radius: f32, start: f32, end: f32 },
    ResetClip,
    FillWedge { radius: f32, start: f32, end: f32, color: Color },
    FillRect { pos: Vec2, size: Vec2, color: Color },
    FillCircle { center: Vec2, radius: f32, color: Color },
    Line { from: Vec2, to: Vec2, width: f32, color: Color },
    Text { pos: Vec2, text: String, color: Color },
}

/// Records every call, one frame at a time
#[derive(Debug, Default)]
pub struct CommandCanvas {
    pub commands: Vec<DrawCommand>,
}

impl CommandCanvas {
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

impl Canvas for CommandCanvas {
    fn clear(&mut self) {
        self.commands.clear();
        self.commands.push(DrawCommand::Clear);
    }
    fn set_transform(&mut self, offset: Vec2) {
        self.commands.push(DrawCommand::SetTransform(offset));
    }
    fn clip_wedge(&mut self, radius: f32, start: f32, end: f32) {
        self.commands.push(DrawCommand::ClipWedge { radius, start, end });
    }
    fn reset_clip(&mut self) {
        self.commands.push(DrawCommand::ResetClip);
    }
    fn fill_wedge(&mut self, radius: f32, start: f32, end: f32, color: Color) {
        self.commands.push(DrawCommand::FillWedge {
            radius,
            start,
            end,
            color,
        });
    }
    fn fill_rect(&mut self, pos: Vec2, size: Vec2, color: Color) {
        self.commands.push(DrawCommand::FillRect { pos, size, color });
    }
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color) {
        self.commands.push(DrawCommand::FillCircle { center, radius, color });
    }
    fn line(&mut self, from: Vec2, to: Vec2, width: f32, color: Color) {
        self.commands.push(DrawCommand::Line { from, to, width, color });
    }
    fn text(&mut self, pos: Vec2, text: &str, color: Color) {
        self.commands.push(DrawCommand::Text {
            pos,
            text: text.to_string(),
            color,
        });
    }
}

/// How much of a sector is drawn, given its slot offset from the player's
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Visibility {
    Full,
    /// Only the half plane between these angles
    Clipped { start: f32, end: f32 },
    Hidden,
}

/// `offset` is the player's window index minus the sector's. Both sectors
/// two slots away occupy the quadrant opposite the player, so each is
/// clipped to the half plane on its own side of the player.
pub fn visibility(offset: i64, player_angle: f32) -> Visibility {
    let cutoff = player_angle + PI;
    match offset {
        -1..=1 => Visibility::Full,
        2 => Visibility::Clipped {
            start: cutoff,
            end: cutoff + PI,
        },
        -2 => Visibility::Clipped {
            start: cutoff - PI,
            end: cutoff,
        },
        _ => Visibility::Hidden,
    }
}

/// Apply a sector's clip; returns whether anything should be drawn
pub fn begin_sector(canvas: &mut dyn Canvas, visibility: Visibility) -> bool {
    match visibility {
        Visibility::Full => true,
        Visibility::Clipped { start, end } => {
            canvas.clip_wedge(ARENA_RADIUS * 2.0, start, end);
            true
        }
        Visibility::Hidden => false,
    }
}

const NEIGHBORS: [IVec2; 8] = [
    IVec2::new(-1, 0),
    IVec2::new(0, -1),
    IVec2::new(1, 0),
    IVec2::new(0, 1),
    IVec2::new(-1, -1),
    IVec2::new(1, -1),
    IVec2::new(1, 1),
    IVec2::new(-1, 1),
];

/// Fractional (origin, size) inside a wall cell of the edge trim facing `dir`
fn trim_rect(dir: IVec2) -> (Vec2, Vec2) {
    let span = |d: i32| match d {
        -1 => (0.0, 0.25),
        1 => (0.75, 0.25),
        _ => (0.0, 1.0),
    };
    let (x, w) = span(dir.x);
    let (y, h) = span(dir.y);
    (Vec2::new(x, y), Vec2::new(w, h))
}

/// Floor wedge plus walls, with a bright trim on every wall edge that faces
/// an open cell. Cells at the hub and along the rim are not drawn.
pub fn draw_sector(canvas: &mut dyn Canvas, window: &SectorWindow, index: usize) {
    let Some(sector) = window.get(index) else {
        return;
    };
    let start = sector.quadrant.start_angle();
    canvas.fill_wedge(ARENA_RADIUS, start, start + FRAC_PI_2, Color::hsla(sector.hue, 0.35, 0.12, 1.0));

    let wall = Color::hsla(sector.hue, 0.9, 0.27, 1.0);
    let trim = Color::hsla(sector.hue, 1.0, 0.5, 1.0);
    let offset = sector.grid_offset();
    for i in 0..QUADRANT_CELL_WIDTH {
        for j in 0..QUADRANT_CELL_WIDTH {
            let cell = IVec2::new(i, j) + offset;
            let dist = cell.x.abs().max(cell.y.abs());
            if dist <= 2 || dist >= QUADRANT_CELL_WIDTH - 1 {
                continue;
            }
            if !window.cell(index, cell) {
                continue;
            }
            let corner = cell.as_vec2() * CELL_SIZE;
            canvas.fill_rect(corner, Vec2::splat(CELL_SIZE), wall);
            for dir in NEIGHBORS {
                if !window.cell(index, cell + dir) {
                    let (origin, size) = trim_rect(dir);
                    canvas.fill_rect(corner + origin * CELL_SIZE, size * CELL_SIZE, trim);
                }
            }
        }
    }
}

/// Entities owned by `sector`; stunned enemies blink
pub fn draw_entities(canvas: &mut dyn Canvas, sector: &Sector, entities: &[Entity], time_ticks: u64) {
    let blink = (time_ticks / 4) % 2 == 0;
    for &id in &sector.entities {
        let Some(entity) = find(entities, id) else {
            continue;
        };
        if entity.dead {
            continue;
        }
        let body = &entity.body;
        let radius = body.size / 2.0;
        match &entity.kind {
            EntityKind::Player(state) => {
                canvas.fill_circle(body.pos, radius, PLAYER_COLOR);
                let tip = body.pos + Vec2::from_angle(state.aim) * (radius + 8.0);
                canvas.line(body.pos, tip, 2.0, PLAYER_COLOR);
            }
            EntityKind::Enemy(state) => {
                let color = if state.stun.is_some() && blink {
                    STUN_FLASH_COLOR
                } else {
                    ENEMY_COLOR
                };
                canvas.fill_circle(body.pos, radius, color);
            }
            EntityKind::Grenade(state) => {
                let color = if state.fuse.is_some() && blink {
                    STUN_FLASH_COLOR
                } else {
                    GRENADE_COLOR
                };
                canvas.fill_circle(body.pos, radius, color);
            }
        }
    }
}

pub fn draw_particles(canvas: &mut dyn Canvas, sector: &Sector) {
    for particle in &sector.particles {
        let alpha = particle.alpha();
        match particle.kind {
            ParticleKind::Spark { pos, hue, .. } => {
                canvas.fill_circle(pos, 2.0, Color::hsla(hue, 1.0, 0.6, alpha));
            }
            ParticleKind::Flash { pos, radius } => {
                canvas.fill_circle(pos, radius, Color::hsla(40.0, 1.0, 0.75, alpha * 0.6));
            }
            ParticleKind::Tracer { from, to } => {
                canvas.line(from, to, 2.0, Color::hsla(55.0, 1.0, 0.8, alpha));
            }
        }
    }
}

/// Screen-space overlay: score, running streak and the death message
pub fn draw_hud(canvas: &mut dyn Canvas, score: &Scoreboard, player_alive: bool) {
    canvas.set_transform(Vec2::ZERO);
    canvas.text(Vec2::new(16.0, 28.0), &format!("SCORE {}", score.score), HUD_COLOR);
    if score.streak > 1 {
        // Dim once the streak is about to lapse
        let alpha = if score.streak_timer < 30 { 0.5 } else { 1.0 };
        canvas.text(
            Vec2::new(16.0, 52.0),
            &format!("STREAK x{}", score.streak),
            HUD_COLOR.with_alpha(alpha),
        );
    }
    if !player_alive {
        canvas.text(Vec2::new(320.0, 300.0), "YOU DIED - CLICK TO RESTART", HUD_COLOR);
    }
}
