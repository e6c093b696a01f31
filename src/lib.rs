//! Disc Shooter - a 3D field minigame plus the site services around it
//!
//! Core modules:
//! - `sim`: Deterministic simulation (player, projectiles, goals, camera)
//! - `aim`: Reflex/aim-trainer rounds and their records
//! - `leaderboard`: Run records, ranking and submission bookkeeping
//! - `session`: Cookie-backed visitor identity and preferences
//! - `functions`: Edge request handlers (credential check, stats proxy)

pub mod aim;
pub mod functions;
pub mod leaderboard;
pub mod session;
pub mod sim;

pub use leaderboard::LeaderboardStore;
pub use sim::SimState;

/// Game configuration constants
pub mod consts {
    /// Upper bound on a single frame step; longer frames are clamped so
    /// per-frame re-application of drag/friction stays well behaved.
    pub const MAX_FRAME_DT: f32 = 1.0 / 30.0;

    /// Field half-extents (square field, units are arbitrary)
    pub const FIELD_HALF_WIDTH: f32 = 6.0;
    pub const FIELD_HALF_LENGTH: f32 = 6.0;
    /// How far projectiles stay inside the walls
    pub const WALL_MARGIN: f32 = 0.4;

    /// Player defaults
    pub const PLAYER_SPEED: f32 = 8.0;
    pub const PLAYER_FRICTION: f32 = 8.0;
    /// Planar speed below which the player snaps to a full stop
    pub const PLAYER_STOP_EPSILON: f32 = 0.02;
    /// Keeps the player capsule clear of the walls
    pub const PLAYER_MARGIN: f32 = 0.6;
    pub const PLAYER_HEIGHT: f32 = 0.9;
    /// Smaller base => faster turn response
    pub const TURN_SMOOTH_BASE: f32 = 0.2;

    /// Disc defaults
    pub const DISC_RADIUS: f32 = 0.35;
    /// Rest height of a disc lying on the field
    pub const DISC_REST_HEIGHT: f32 = 0.11;
    pub const GRAVITY: f32 = 9.8;
    /// Ground bounce energy retention (less bouncy)
    pub const DISC_BOUNCE: f32 = 0.35;
    /// Wall bounce energy retention
    pub const WALL_BOUNCE: f32 = 0.6;
    /// Extra full-vector damping applied once per frame after any wall hit
    pub const WALL_HIT_DAMP: f32 = 0.9;
    /// Linear horizontal air drag
    pub const AIR_DRAG: f32 = 0.22;
    /// Rolling friction when on the ground
    pub const GROUND_FRICTION: f32 = 3.5;
    /// Horizontal friction applied on a bouncing ground contact
    pub const GROUND_CONTACT_FRICTION: f32 = 0.75;
    /// Vertical speed above which a ground contact bounces instead of settling
    pub const BOUNCE_SPEED_THRESHOLD: f32 = 0.5;
    /// Squared speed below which a grounded disc settles into a pickup
    pub const SETTLE_SPEED_SQ: f32 = 0.05;

    /// Shooting
    pub const SHOT_SPEED: f32 = 11.0;
    pub const SHOT_SPAWN_OFFSET: f32 = 0.8;
    pub const SHOT_MIN_HEIGHT: f32 = 0.9;

    /// Pickups / inventory
    pub const PICKUP_RADIUS: f32 = 1.1;
    pub const INVENTORY_CAPACITY: u32 = 3;
    /// Discs scattered at game start
    pub const SCATTER_COUNT: u32 = 12;
    /// Score that ends a run
    pub const SCORE_TARGET: u32 = 12;

    /// Chase camera
    pub const CAMERA_HEIGHT: f32 = 3.0;
    pub const CAMERA_DISTANCE: f32 = 6.0;
    /// Smaller base => faster camera follow
    pub const CAMERA_SMOOTH_BASE: f32 = 0.3;
    /// Snappier base used while the player backs toward the camera
    pub const CAMERA_REVERSE_BASE: f32 = 0.05;
    /// Yaw auto-align strength while the player is moving
    pub const CAMERA_FOLLOW_STRENGTH: f32 = 0.25;
    /// Radians per pixel for right-drag orbit
    pub const PAN_SENSITIVITY: f32 = 0.007;
    pub const CAMERA_PITCH_MIN: f32 = -0.6;
    pub const CAMERA_PITCH_MAX: f32 = 0.9;
    /// Look target sits this far ahead of the player along the view direction
    pub const CAMERA_LOOK_AHEAD: f32 = 1.5;

    /// Goal geometry (two corner baskets)
    pub const GOAL_RIM_RADIUS: f32 = 0.9;
    pub const GOAL_RIM_THICKNESS: f32 = 0.12;
    pub const GOAL_RIM_HEIGHT: f32 = 1.6;
    pub const GOAL_BASKET_DEPTH: f32 = 0.6;
    /// How far goals sit in from their corner
    pub const GOAL_CORNER_OFFSET: f32 = 0.9;
}

/// Normalize an angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Interpolate between two angles through the shortest arc
#[inline]
pub fn lerp_angle(a: f32, b: f32, t: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    let mut diff = (b - a + PI).rem_euclid(TAU);
    diff -= PI;
    a + diff * t
}

/// Frame-rate-independent smoothing factor: `1 - base^dt`
///
/// Larger `dt` moves further in one step, yet repeated small steps converge
/// to the same trajectory.
#[inline]
pub fn smooth_factor(base: f32, dt: f32) -> f32 {
    1.0 - base.powf(dt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_normalize_angle_wraps() {
        // Rounding may land a seam value on either side of ±π, so check the
        // range and congruence rather than which side of the seam it chose.
        for raw in [3.0 * PI, -3.0 * PI, 7.5, -9.2, 100.0, -0.3] {
            let n = normalize_angle(raw);
            assert!((-PI..PI).contains(&n), "{raw} -> {n}");
            assert!((n.sin() - raw.sin()).abs() < 1e-4, "{raw} -> {n}");
            assert!((n.cos() - raw.cos()).abs() < 1e-4, "{raw} -> {n}");
        }
        assert_eq!(normalize_angle(0.5), 0.5);
    }

    #[test]
    fn test_lerp_angle_shortest_arc() {
        // From just below +π to just above -π the midpoint should stay near
        // the seam, not sweep the whole circle.
        let a = PI - 0.1;
        let b = -PI + 0.1;
        let mid = lerp_angle(a, b, 0.5);
        assert!(mid > PI - 0.2 || mid < -PI + 0.2, "mid = {mid}");
    }

    #[test]
    fn test_smooth_factor_composes() {
        // Two half-steps cover the same ground as one full step.
        let base = 0.2_f32;
        let one = smooth_factor(base, 0.5);
        let half = smooth_factor(base, 0.25);
        let composed = 1.0 - (1.0 - half) * (1.0 - half);
        assert!((one - composed).abs() < 1e-5);
    }
}
