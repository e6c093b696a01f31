//! Field geometry: boundaries, goal volumes and starting disc layout

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// A static cylindrical scoring volume under a goal rim
///
/// A projectile scores when its radial distance from the zone's vertical axis
/// is within `inner_radius` and its height falls inside `[y_min, y_max]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GoalZone {
    pub center: Vec3,
    pub inner_radius: f32,
    pub y_min: f32,
    pub y_max: f32,
}

impl GoalZone {
    pub fn new(center: Vec3, inner_radius: f32, y_min: f32, y_max: f32) -> Self {
        Self {
            center,
            inner_radius,
            y_min,
            y_max,
        }
    }

    /// Whether a point lies inside the scoring volume
    pub fn contains(&self, pos: Vec3) -> bool {
        let dx = pos.x - self.center.x;
        let dz = pos.z - self.center.z;
        let radial = (dx * dx + dz * dz).sqrt();
        radial <= self.inner_radius && pos.y >= self.y_min && pos.y <= self.y_max
    }
}

/// The two corner baskets, in their fixed check order
///
/// Rim geometry mirrors the built field: the scoring cylinder sits just inside
/// the rim and reaches most of the way down to the lower basket ring.
pub fn corner_goals() -> Vec<GoalZone> {
    let inner_radius = GOAL_RIM_RADIUS - GOAL_RIM_THICKNESS * 1.4;
    let y_min = GOAL_RIM_HEIGHT - GOAL_BASKET_DEPTH * 0.95;
    let y_max = GOAL_RIM_HEIGHT + GOAL_RIM_THICKNESS;

    let corners = [
        Vec3::new(
            FIELD_HALF_WIDTH - GOAL_CORNER_OFFSET,
            GOAL_RIM_HEIGHT,
            FIELD_HALF_LENGTH - GOAL_CORNER_OFFSET,
        ),
        Vec3::new(
            -FIELD_HALF_WIDTH + GOAL_CORNER_OFFSET,
            GOAL_RIM_HEIGHT,
            -FIELD_HALF_LENGTH + GOAL_CORNER_OFFSET,
        ),
    ];

    corners
        .into_iter()
        .map(|c| GoalZone::new(c, inner_radius, y_min, y_max))
        .collect()
}

/// Scatter starting disc positions across the field at rest height
///
/// Keeps a wider margin from the walls than projectiles need so nothing spawns
/// half-buried in a wall, and leaves the near edge clear for the player spawn.
pub fn scatter_positions<R: Rng>(rng: &mut R, count: u32) -> Vec<Vec3> {
    (0..count)
        .map(|_| {
            let x = rng.random_range(-FIELD_HALF_WIDTH + 1.2..FIELD_HALF_WIDTH - 1.2);
            let z = rng.random_range(-FIELD_HALF_LENGTH + 4.0..FIELD_HALF_LENGTH - 2.0);
            Vec3::new(x, DISC_REST_HEIGHT, z)
        })
        .collect()
}
