//! Quadrant wall grids
//!
//! The arena is split into four quadrants around its center. Each sector owns
//! a square grid covering only its own quadrant; `grid_offset` translates the
//! absolute cell coordinate into the grid's local indices.

use std::f32::consts::FRAC_PI_2;

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

use crate::consts::{CELL_SIZE, QUADRANT_CELL_WIDTH};
use crate::error::SectorError;
use crate::{angle_diff, cartesian_to_polar};

/// Value returned for cells nobody can answer for: a missing neighbor sector,
/// the opposite quadrant, or local indices outside the grid. Solid keeps
/// entities and rays from leaking through edges that are never drawn.
pub const BOUNDARY_IS_WALL: bool = true;

/// One of the four 90° slices of the arena, clockwise in screen space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8")]
pub struct Quadrant(u8);

impl TryFrom<u8> for Quadrant {
    type Error = SectorError;

    fn try_from(angle: u8) -> Result<Self, Self::Error> {
        if angle < 4 {
            Ok(Quadrant(angle))
        } else {
            Err(SectorError::InvalidAngle(angle))
        }
    }
}

impl Quadrant {
    pub const ALL: [Quadrant; 4] = [Quadrant(0), Quadrant(1), Quadrant(2), Quadrant(3)];

    #[inline]
    pub fn index(self) -> u8 {
        self.0
    }

    #[inline]
    pub fn next(self) -> Quadrant {
        Quadrant((self.0 + 1) % 4)
    }

    #[inline]
    pub fn prev(self) -> Quadrant {
        Quadrant((self.0 + 3) % 4)
    }

    /// Quadrant an absolute cell coordinate falls in, by sign
    pub fn of_cell(cell: IVec2) -> Quadrant {
        match (cell.x >= 0, cell.y >= 0) {
            (true, true) => Quadrant(0),
            (false, true) => Quadrant(1),
            (false, false) => Quadrant(2),
            (true, false) => Quadrant(3),
        }
    }

    /// Translation from local grid indices to absolute cell coordinates
    pub fn grid_offset(self) -> IVec2 {
        let w = QUADRANT_CELL_WIDTH;
        match self.0 {
            0 => IVec2::new(0, 0),
            1 => IVec2::new(-w, 0),
            2 => IVec2::new(-w, -w),
            _ => IVec2::new(0, -w),
        }
    }

    /// Angle where the quadrant starts (radians, screen space)
    #[inline]
    pub fn start_angle(self) -> f32 {
        self.0 as f32 * FRAC_PI_2
    }

    /// Whether a world position lies strictly inside this quadrant's wedge
    pub fn contains(self, pos: Vec2) -> bool {
        let (_, theta) = cartesian_to_polar(pos);
        let diff = angle_diff(self.start_angle(), theta);
        diff > 0.0 && diff < FRAC_PI_2
    }
}

/// Cell containing a world point
#[inline]
pub fn cell_of(point: Vec2) -> IVec2 {
    (point / CELL_SIZE).floor().as_ivec2()
}

/// World position of a cell's center
#[inline]
pub fn cell_center(cell: IVec2) -> Vec2 {
    (cell.as_vec2() + Vec2::splat(0.5)) * CELL_SIZE
}

/// Square boolean wall map for one quadrant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    width: i32,
    walls: Vec<bool>,
}

impl Default for Grid {
    fn default() -> Self {
        Self::empty()
    }
}

impl Grid {
    /// An all-empty quadrant grid
    pub fn empty() -> Self {
        let w = QUADRANT_CELL_WIDTH;
        Self {
            width: w,
            walls: vec![false; (w * w) as usize],
        }
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    #[inline]
    fn slot(&self, local: IVec2) -> Option<usize> {
        let in_range = (0..self.width).contains(&local.x) && (0..self.width).contains(&local.y);
        in_range.then(|| (local.x * self.width + local.y) as usize)
    }

    /// Wall at local indices; out-of-range reads as the boundary default
    pub fn is_wall(&self, local: IVec2) -> bool {
        self.slot(local).map_or(BOUNDARY_IS_WALL, |i| self.walls[i])
    }

    /// Set a wall at local indices (ignored when out of range)
    pub fn set_wall(&mut self, local: IVec2, wall: bool) {
        if let Some(i) = self.slot(local) {
            self.walls[i] = wall;
        }
    }

    pub fn wall_count(&self) -> usize {
        self.walls.iter().filter(|w| **w).count()
    }
}
