//! Movement and collision
//!
//! Walls are tested through a caller-supplied solidity query so the same code
//! serves the live sector window and hand-built test grids. Movement is
//! resolved one axis at a time: x first, then y.

use glam::Vec2;

use super::entity::{Body, EntityId};

/// Whether an axis-aligned box of side `size` centered at `pos` touches a wall
pub fn overlaps_wall<F>(pos: Vec2, size: f32, is_solid: &F) -> bool
where
    F: Fn(Vec2) -> bool,
{
    let half = size / 2.0;
    [
        Vec2::new(-half, -half),
        Vec2::new(half, -half),
        Vec2::new(-half, half),
        Vec2::new(half, half),
    ]
    .into_iter()
    .any(|corner| is_solid(pos + corner))
}

/// Displace a body by its velocity, one axis at a time.
///
/// An axis move that creates a wall overlap not present before it is undone
/// and that axis' velocity becomes `-bounce * v`. Bodies that start inside a
/// wall may keep moving so they can work their way out.
pub fn move_and_collide<F>(body: &mut Body, is_solid: F)
where
    F: Fn(Vec2) -> bool,
{
    body.hit_wall = false;
    for axis in 0..2 {
        let before = overlaps_wall(body.pos, body.size, &is_solid);
        let delta = body.vel[axis];
        body.pos[axis] += delta;
        if !before && overlaps_wall(body.pos, body.size, &is_solid) {
            body.pos[axis] -= delta;
            body.vel[axis] = -body.vel[axis] * body.bounce;
            body.hit_wall = true;
        }
    }
}

/// Unique touching pairs among `own`, plus every touching pair between `own`
/// and `next`. Ids `body` cannot resolve (dead or missing) are skipped.
pub fn touching_pairs<'a, F>(own: &[EntityId], next: &[EntityId], body: F) -> Vec<(EntityId, EntityId)>
where
    F: Fn(EntityId) -> Option<&'a Body>,
{
    let own: Vec<(EntityId, &Body)> = own.iter().filter_map(|&id| body(id).map(|b| (id, b))).collect();
    let next: Vec<(EntityId, &Body)> = next.iter().filter_map(|&id| body(id).map(|b| (id, b))).collect();

    let mut pairs = Vec::new();
    for (i, (a, body_a)) in own.iter().enumerate() {
        for (b, body_b) in &own[i + 1..] {
            if body_a.touches(body_b) {
                pairs.push((*a, *b));
            }
        }
        for (b, body_b) in &next {
            if body_a.touches(body_b) {
                pairs.push((*a, *b));
            }
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::CELL_SIZE;
    use crate::sim::grid::cell_of;
    use glam::IVec2;
    use std::collections::HashMap;

    /// Single wall cell at (2, 1)
    fn one_wall(p: Vec2) -> bool {
        cell_of(p) == IVec2::new(2, 1)
    }

    #[test]
    fn test_blocked_axis_stops_dead_other_axis_untouched() {
        // Center of cell (1, 1), moving right into the wall at (2, 1)
        let mut body = Body::new(Vec2::splat(1.5 * CELL_SIZE), 12.0, 0.0);
        body.vel = Vec2::new(10.0, 0.0);
        move_and_collide(&mut body, one_wall);
        assert_eq!(body.vel.x, 0.0);
        assert_eq!(body.vel.y, 0.0);
        assert_eq!(body.pos, Vec2::splat(1.5 * CELL_SIZE));
        assert!(body.hit_wall);
    }

    #[test]
    fn test_bounce_reflects_only_blocked_axis() {
        let start = Vec2::splat(1.5 * CELL_SIZE);
        let mut body = Body::new(start, 6.0, 0.9);
        body.vel = Vec2::new(20.0, 3.0);
        move_and_collide(&mut body, one_wall);
        assert!((body.vel.x + 18.0).abs() < 1e-4);
        assert_eq!(body.vel.y, 3.0);
        assert_eq!(body.pos, start + Vec2::new(0.0, 3.0));
    }

    #[test]
    fn test_free_move_clears_hit_flag() {
        let mut body = Body::new(Vec2::splat(1.5 * CELL_SIZE), 12.0, 0.0);
        body.hit_wall = true;
        body.vel = Vec2::new(0.0, -2.0);
        move_and_collide(&mut body, one_wall);
        assert!(!body.hit_wall);
        assert_eq!(body.pos.y, 1.5 * CELL_SIZE - 2.0);
    }

    #[test]
    fn test_body_inside_wall_can_escape() {
        let mut body = Body::new(Vec2::new(2.5, 1.5) * CELL_SIZE, 12.0, 0.0);
        body.vel = Vec2::new(30.0, 0.0);
        move_and_collide(&mut body, one_wall);
        assert!(!body.hit_wall);
        assert_eq!(body.vel.x, 30.0);
    }

    #[test]
    fn test_touching_pairs_once_each() {
        let bodies: HashMap<EntityId, Body> = [
            (1, Body::new(Vec2::new(0.0, 0.0), 10.0, 0.0)),
            (2, Body::new(Vec2::new(5.0, 0.0), 10.0, 0.0)),
            (3, Body::new(Vec2::new(100.0, 0.0), 10.0, 0.0)),
            (4, Body::new(Vec2::new(8.0, 0.0), 10.0, 0.0)),
        ]
        .into_iter()
        .collect();

        let pairs = touching_pairs(&[1, 2, 3], &[4], |id| bodies.get(&id));
        assert_eq!(pairs, vec![(1, 2), (1, 4), (2, 4)]);

        // Entities only in `next` are not paired with each other here
        let pairs = touching_pairs(&[3], &[1, 2, 4], |id| bodies.get(&id));
        assert!(pairs.is_empty());
    }

    #[test]
    fn test_touch_threshold_is_strict() {
        let a = Body::new(Vec2::ZERO, 10.0, 0.0);
        let b = Body::new(Vec2::new(10.0, 0.0), 10.0, 0.0);
        assert!(!a.touches(&b));
        let c = Body::new(Vec2::new(9.99, 0.0), 10.0, 0.0);
        assert!(a.touches(&c));
    }
}
