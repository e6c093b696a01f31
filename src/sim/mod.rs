//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Frame steps clamped to a maximum dt
//! - Seeded RNG only
//! - All mutation happens inside the per-frame step
//! - No rendering or platform dependencies

pub mod field;
pub mod state;
pub mod tick;

pub use field::{GoalZone, corner_goals, scatter_positions};
pub use state::{CameraState, GameEvent, Pickup, Player, Projectile, RunPhase, SimState};
pub use tick::{FrameInput, tick};
