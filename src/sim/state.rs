//! Simulation state and core types
//!
//! Everything the frame step mutates lives in [`SimState`]; event handlers
//! only write [`super::FrameInput`] flags, never these entities directly.

use glam::{Quat, Vec2, Vec3};
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::field::{self, GoalZone};
use crate::consts::*;
use crate::{lerp_angle, normalize_angle, smooth_factor};

/// Lifecycle of a single run
///
/// A run starts lazily on the first movement, shoot or pickup action and ends
/// when the score reaches [`SCORE_TARGET`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    /// Field is set up, clock not started
    NotStarted,
    /// Clock running
    Running,
    /// Target reached; elapsed time frozen
    Finished,
}

/// Events produced by one frame step, for the driver/HUD to react to
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    RunStarted,
    ShotFired { id: u32 },
    Collected { id: u32 },
    Settled { id: u32 },
    Scored { id: u32, zone: usize },
    RunFinished { elapsed_ms: u64 },
}

/// The player capsule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec3,
    /// Planar velocity (x, z); height is fixed
    pub vel: Vec2,
    /// Facing yaw in radians
    pub yaw: f32,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            pos: Vec3::new(0.0, PLAYER_HEIGHT, 4.0),
            vel: Vec2::ZERO,
            yaw: 0.0,
        }
    }
}

impl Player {
    pub fn planar_speed(&self) -> f32 {
        self.vel.length()
    }

    pub fn is_moving(&self) -> bool {
        self.planar_speed() > PLAYER_STOP_EPSILON
    }

    /// Advance the player one frame
    ///
    /// `move_dir` is the camera-relative movement direction on the ground
    /// plane (already normalized), or `None` when no directional key is held.
    /// Velocity snaps straight to the target; there is no acceleration ramp.
    pub fn update(&mut self, move_dir: Option<Vec2>, dt: f32) {
        match move_dir {
            Some(dir) => {
                self.vel = dir * PLAYER_SPEED;
            }
            None => {
                let decay = (1.0 - PLAYER_FRICTION * dt).max(0.0);
                self.vel *= decay;
                if self.vel.length() < PLAYER_STOP_EPSILON {
                    self.vel = Vec2::ZERO;
                }
            }
        }

        self.pos.x += self.vel.x * dt;
        self.pos.z += self.vel.y * dt;
        self.pos.y = PLAYER_HEIGHT;

        // Clamp to the field interior, independently per axis
        let max_x = FIELD_HALF_WIDTH - PLAYER_MARGIN;
        let max_z = FIELD_HALF_LENGTH - PLAYER_MARGIN;
        self.pos.x = self.pos.x.clamp(-max_x, max_x);
        self.pos.z = self.pos.z.clamp(-max_z, max_z);

        // Face the movement direction, smoothed to prevent jitter
        if self.vel.length_squared() > 0.001 {
            let target_yaw = self.vel.x.atan2(self.vel.y);
            let t = smooth_factor(TURN_SMOOTH_BASE, dt);
            self.yaw = lerp_angle(self.yaw, target_yaw, t);
        }
    }
}

/// An in-flight (or rolling) disc
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    pub pos: Vec3,
    pub vel: Vec3,
    /// Visual rolling rotation, no gameplay effect
    pub spin: Quat,
}

/// A stationary disc waiting to be collected
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pickup {
    pub id: u32,
    pub pos: Vec3,
}

/// Chase camera state: user-controlled orbit angles plus a smoothed position
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraState {
    pub yaw: f32,
    pub pitch: f32,
    pub pos: Vec3,
    pub look_at: Vec3,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            pos: Vec3::new(0.0, CAMERA_HEIGHT, 4.0 - CAMERA_DISTANCE),
            look_at: Vec3::ZERO,
        }
    }
}

impl CameraState {
    /// Horizontal forward direction for the current yaw
    pub fn forward(&self) -> Vec3 {
        Vec3::new(self.yaw.sin(), 0.0, self.yaw.cos())
    }

    /// Apply accumulated drag input (pixels) to the orbit angles
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        // Drag right rotates the camera right
        self.yaw -= dx * PAN_SENSITIVITY;
        self.pitch = (self.pitch + dy * PAN_SENSITIVITY).clamp(CAMERA_PITCH_MIN, CAMERA_PITCH_MAX);
    }

    /// Follow the player for one frame
    ///
    /// Two regimes: when idle the orbit angles are purely user-driven; while
    /// moving the yaw auto-aligns lightly toward the player's facing. The
    /// position snaps faster when the player backs toward the camera, so it
    /// doesn't trail behind a reversal.
    pub fn update(&mut self, player: &Player, dt: f32) {
        let base_t = smooth_factor(CAMERA_SMOOTH_BASE, dt);
        let follow_strength = if player.is_moving() {
            CAMERA_FOLLOW_STRENGTH
        } else {
            0.0
        };
        self.yaw = lerp_angle(self.yaw, player.yaw, base_t * follow_strength);
        // Prevent numeric creep
        self.yaw = normalize_angle(self.yaw);

        let forward = self.forward();
        let cos_p = self.pitch.cos();
        let sin_p = self.pitch.sin();
        let desired = player.pos - forward * (CAMERA_DISTANCE * cos_p)
            + Vec3::new(0.0, CAMERA_HEIGHT + CAMERA_DISTANCE * sin_p, 0.0);

        // Backing up relative to the camera? Snap faster so it stays put.
        let vel_dot = player.vel.x * forward.x + player.vel.y * forward.z;
        let follow_t = if vel_dot < -0.1 {
            smooth_factor(CAMERA_REVERSE_BASE, dt)
        } else {
            base_t
        };
        self.pos = self.pos.lerp(desired, follow_t);
        self.look_at = player.pos + forward * CAMERA_LOOK_AHEAD;
    }
}

/// Complete simulation state, owned by the frame driver
///
/// No globals: every update function takes this context, so multiple
/// simulations can coexist (and tests stay independent).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimState {
    /// Seed for the disc scatter, kept for restarts
    pub seed: u64,
    /// Completed restarts; salts the scatter RNG so layouts differ
    pub restarts: u32,
    /// Frames stepped so far
    pub time_ticks: u64,
    /// Run clock in seconds, accumulated while Running
    pub elapsed_secs: f32,
    pub phase: RunPhase,
    pub score: u32,
    pub inventory: u32,
    pub player: Player,
    pub projectiles: Vec<Projectile>,
    pub pickups: Vec<Pickup>,
    pub goal_zones: Vec<GoalZone>,
    pub camera: CameraState,
    next_id: u32,
}

impl SimState {
    /// Set up a fresh field: goals placed, discs scattered, clock idle
    pub fn new(seed: u64) -> Self {
        let mut state = Self {
            seed,
            restarts: 0,
            time_ticks: 0,
            elapsed_secs: 0.0,
            phase: RunPhase::NotStarted,
            score: 0,
            inventory: 0,
            player: Player::default(),
            projectiles: Vec::new(),
            pickups: Vec::new(),
            goal_zones: field::corner_goals(),
            camera: CameraState::default(),
            next_id: 1,
        };
        state.scatter_discs(SCATTER_COUNT);
        state
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Scatter `count` pickups using the run's seeded RNG
    pub fn scatter_discs(&mut self, count: u32) {
        let mut rng = Pcg32::seed_from_u64(self.seed.wrapping_add(self.restarts as u64));
        for pos in field::scatter_positions(&mut rng, count) {
            let id = self.next_entity_id();
            self.pickups.push(Pickup { id, pos });
        }
    }

    /// Reset for a new run: clear discs, re-scatter, respawn the player
    ///
    /// Goal zones are immutable for the session and stay as they are.
    pub fn restart(&mut self) {
        self.restarts += 1;
        self.projectiles.clear();
        self.pickups.clear();
        self.scatter_discs(SCATTER_COUNT);
        self.player = Player::default();
        self.inventory = 0;
        self.score = 0;
        self.elapsed_secs = 0.0;
        self.phase = RunPhase::NotStarted;
    }

    /// Run clock in whole milliseconds
    pub fn elapsed_ms(&self) -> u64 {
        (self.elapsed_secs * 1000.0).floor().max(0.0) as u64
    }

    /// Discs currently in play, in any form (for conservation checks)
    pub fn discs_in_play(&self) -> u32 {
        self.inventory + self.projectiles.len() as u32 + self.pickups.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_setup() {
        let state = SimState::new(42);
        assert_eq!(state.phase, RunPhase::NotStarted);
        assert_eq!(state.pickups.len(), SCATTER_COUNT as usize);
        assert_eq!(state.goal_zones.len(), 2);
        assert_eq!(state.inventory, 0);
        assert_eq!(state.score, 0);
    }

    #[test]
    fn test_restart_rescatters() {
        let mut state = SimState::new(42);
        let first: Vec<_> = state.pickups.iter().map(|p| p.pos).collect();
        state.score = 5;
        state.inventory = 2;
        state.phase = RunPhase::Running;
        state.restart();

        assert_eq!(state.phase, RunPhase::NotStarted);
        assert_eq!(state.score, 0);
        assert_eq!(state.inventory, 0);
        assert_eq!(state.pickups.len(), SCATTER_COUNT as usize);
        // Different salt => different layout
        let second: Vec<_> = state.pickups.iter().map(|p| p.pos).collect();
        assert_ne!(first, second);
    }

    #[test]
    fn test_player_clamped_to_field() {
        let mut player = Player::default();
        player.pos.x = 100.0;
        player.pos.z = -100.0;
        player.update(None, 1.0 / 60.0);
        assert!(player.pos.x <= FIELD_HALF_WIDTH - PLAYER_MARGIN);
        assert!(player.pos.z >= -FIELD_HALF_LENGTH + PLAYER_MARGIN);
    }

    #[test]
    fn test_player_friction_stops() {
        let mut player = Player::default();
        player.vel = Vec2::new(2.0, 0.0);
        for _ in 0..120 {
            player.update(None, 1.0 / 60.0);
        }
        assert_eq!(player.vel, Vec2::ZERO);
    }

    #[test]
    fn test_camera_pitch_clamped() {
        let mut cam = CameraState::default();
        cam.orbit(0.0, 10_000.0);
        assert!(cam.pitch <= CAMERA_PITCH_MAX);
        cam.orbit(0.0, -100_000.0);
        assert!(cam.pitch >= CAMERA_PITCH_MIN);
    }

    #[test]
    fn test_camera_idle_keeps_user_yaw() {
        let mut cam = CameraState::default();
        let player = Player::default(); // stationary
        cam.orbit(100.0, 0.0);
        let yaw = cam.yaw;
        for _ in 0..60 {
            cam.update(&player, 1.0 / 60.0);
        }
        assert!((cam.yaw - yaw).abs() < 1e-5, "idle camera must not auto-align");
    }

    #[test]
    fn test_camera_aligns_while_moving() {
        let mut cam = CameraState::default();
        cam.yaw = 1.0;
        let mut player = Player::default();
        player.vel = Vec2::new(0.0, PLAYER_SPEED); // moving toward +z, yaw 0
        player.yaw = 0.0;
        let start_err = cam.yaw.abs();
        for _ in 0..120 {
            cam.update(&player, 1.0 / 60.0);
        }
        assert!(cam.yaw.abs() < start_err, "moving camera should drift toward facing");
    }
}
