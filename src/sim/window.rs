//! The active sector window
//!
//! An ordered deque of sectors whose ids are contiguous, so a sector's index
//! is `id - front.id` and neighbors are one slot away. Cell lookups made from
//! one sector's frame transparently read the neighboring quadrant from the
//! previous or next sector.

use std::collections::VecDeque;

use glam::{IVec2, Vec2};

use super::grid::{BOUNDARY_IS_WALL, Quadrant, cell_of};
use super::sector::{HUE_STEP, Sector, SectorId};

#[derive(Debug, Clone, Default)]
pub struct SectorWindow {
    sectors: VecDeque<Sector>,
}

impl SectorWindow {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sectors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sectors.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Sector> {
        self.sectors.get(index)
    }

    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Sector> {
        self.sectors.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sector> {
        self.sectors.iter()
    }

    pub fn front(&self) -> Option<&Sector> {
        self.sectors.front()
    }

    pub fn back(&self) -> Option<&Sector> {
        self.sectors.back()
    }

    /// Index of a sector id, if it is in the window
    pub fn index_of(&self, id: SectorId) -> Option<usize> {
        let front = self.sectors.front()?.id;
        let index = usize::try_from(id - front).ok()?;
        (index < self.sectors.len()).then_some(index)
    }

    #[inline]
    pub fn prev(&self, index: usize) -> Option<&Sector> {
        index.checked_sub(1).and_then(|i| self.sectors.get(i))
    }

    #[inline]
    pub fn next(&self, index: usize) -> Option<&Sector> {
        self.sectors.get(index + 1)
    }

    /// Id, quadrant and hue for a sector appended after the back
    pub fn next_params(&self) -> Option<(SectorId, Quadrant, f32)> {
        self.sectors
            .back()
            .map(|s| (s.id + 1, s.quadrant.next(), (s.hue + HUE_STEP).rem_euclid(360.0)))
    }

    /// Id, quadrant and hue for a sector prepended before the front
    pub fn prev_params(&self) -> Option<(SectorId, Quadrant, f32)> {
        self.sectors
            .front()
            .map(|s| (s.id - 1, s.quadrant.prev(), (s.hue - HUE_STEP).rem_euclid(360.0)))
    }

    /// Append a sector; it must continue the id and angle sequence
    pub fn push_back(&mut self, sector: Sector) {
        debug_assert!(
            self.next_params()
                .is_none_or(|(id, q, _)| id == sector.id && q == sector.quadrant)
        );
        self.sectors.push_back(sector);
    }

    /// Prepend a sector; it must continue the id and angle sequence backwards
    pub fn push_front(&mut self, sector: Sector) {
        debug_assert!(
            self.prev_params()
                .is_none_or(|(id, q, _)| id == sector.id && q == sector.quadrant)
        );
        self.sectors.push_front(sector);
    }

    pub fn pop_front(&mut self) -> Option<Sector> {
        self.sectors.pop_front()
    }

    pub fn pop_back(&mut self) -> Option<Sector> {
        self.sectors.pop_back()
    }

    /// Wall lookup for an absolute cell, as seen from sector `index`.
    ///
    /// Cells in the sector's own quadrant read its grid; the next and previous
    /// quadrants are forwarded to the neighboring sectors. The opposite
    /// quadrant, missing neighbors and a missing sector read as the boundary
    /// default.
    pub fn cell(&self, index: usize, cell: IVec2) -> bool {
        let Some(sector) = self.sectors.get(index) else {
            return BOUNDARY_IS_WALL;
        };
        let quadrant = Quadrant::of_cell(cell);
        let owner = if quadrant == sector.quadrant {
            Some(sector)
        } else if quadrant == sector.quadrant.next() {
            self.next(index)
        } else if quadrant == sector.quadrant.prev() {
            self.prev(index)
        } else {
            None
        };
        owner.map_or(BOUNDARY_IS_WALL, |s| s.own_cell(cell))
    }

    /// Wall lookup for the cell containing a world point
    #[inline]
    pub fn is_solid_at(&self, index: usize, point: Vec2) -> bool {
        self.cell(index, cell_of(point))
    }

    /// Sector index owning `pos` when starting from `index`: the same sector
    /// if it contains the point, else the previous or next one if either
    /// does, else unchanged. Never moves more than one slot.
    pub fn step_toward(&self, index: usize, pos: Vec2) -> usize {
        match self.sectors.get(index) {
            Some(s) if !s.contains(pos) => {
                if self.prev(index).is_some_and(|p| p.contains(pos)) {
                    index - 1
                } else if self.next(index).is_some_and(|n| n.contains(pos)) {
                    index + 1
                } else {
                    index
                }
            }
            _ => index,
        }
    }
}
