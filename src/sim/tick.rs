//! Per-frame simulation step
//!
//! One call to [`tick`] advances the whole simulation by a single clamped
//! frame: input resolution, player movement, projectile physics, goal and
//! settle bookkeeping, then the chase camera. Rendering happens elsewhere.

use glam::{Quat, Vec2, Vec3, Vec3Swizzles};

use super::state::{GameEvent, Pickup, Projectile, RunPhase, SimState};
use crate::consts::*;

/// Input for a single frame, written by event handlers and read once here
///
/// Direction flags reflect currently-held keys; `orbit_*` carry accumulated
/// mouse-drag deltas in pixels; the rest are one-shot actions the driver
/// clears after each frame.
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    /// Right-drag orbit deltas (pixels) since the last frame
    pub orbit_dx: f32,
    pub orbit_dy: f32,
    /// Throw a disc (left click)
    pub shoot: bool,
    /// Collect a nearby disc (E)
    pub pickup: bool,
    /// Restart the run (R)
    pub reset: bool,
}

impl FrameInput {
    /// Camera-relative movement direction on the ground plane, if any key is held
    pub fn move_dir(&self, cam_forward: Vec3) -> Option<Vec2> {
        let mut wish = Vec2::ZERO;
        if self.forward {
            wish.y += 1.0;
        }
        if self.back {
            wish.y -= 1.0;
        }
        if self.left {
            wish.x -= 1.0;
        }
        if self.right {
            wish.x += 1.0;
        }
        if wish == Vec2::ZERO {
            return None;
        }
        let wish = wish.normalize();

        let forward = Vec3::new(cam_forward.x, 0.0, cam_forward.z).normalize_or_zero();
        let right = forward.cross(Vec3::Y).normalize_or_zero();
        let mv = forward * wish.y + right * wish.x;
        let planar = Vec2::new(mv.x, mv.z);
        (planar.length_squared() > 1e-6).then(|| planar.normalize())
    }

    /// Whether this frame carries any run-starting action
    fn starts_run(&self) -> bool {
        self.forward || self.back || self.left || self.right || self.shoot || self.pickup
    }
}

/// Advance the simulation by one frame step
///
/// `dt` is clamped to [`MAX_FRAME_DT`] to bound integration error during
/// frame-rate drops. Returns the events this frame produced.
pub fn tick(state: &mut SimState, input: &FrameInput, dt: f32) -> Vec<GameEvent> {
    let dt = dt.min(MAX_FRAME_DT);
    let mut events = Vec::new();

    if input.reset {
        state.restart();
        return events;
    }

    state.time_ticks += 1;

    // Lazy run start: the first movement/shoot/pickup action starts the clock
    if state.phase == RunPhase::NotStarted && input.starts_run() {
        state.phase = RunPhase::Running;
        events.push(GameEvent::RunStarted);
    }
    if state.phase == RunPhase::Running {
        state.elapsed_secs += dt;
    }

    state.camera.orbit(input.orbit_dx, input.orbit_dy);

    let move_dir = input.move_dir(state.camera.forward());
    state.player.update(move_dir, dt);

    update_projectiles(state, dt, &mut events);

    if input.pickup {
        try_collect(state, &mut events);
    }
    if input.shoot {
        try_shoot(state, &mut events);
    }

    if state.phase == RunPhase::Running && state.score >= SCORE_TARGET {
        state.phase = RunPhase::Finished;
        events.push(GameEvent::RunFinished {
            elapsed_ms: state.elapsed_ms(),
        });
    }

    state.camera.update(&state.player, dt);

    events
}

/// Integrate one projectile through gravity, drag, wall and ground contact
///
/// Pure physics only; goal and settle checks live in the caller so a scored
/// disc is removed before it can also settle.
pub fn integrate_projectile(p: &mut Projectile, dt: f32) {
    // Gravity, then position
    p.vel.y -= GRAVITY * dt;
    p.pos += p.vel * dt;

    // Horizontal air drag
    let drag = (1.0 - AIR_DRAG * dt).max(0.0);
    p.vel.x *= drag;
    p.vel.z *= drag;

    // Wall collision: clamp to each boundary plane, invert and dampen the
    // crossing component; any hit applies an extra full-vector damp once.
    let max_x = FIELD_HALF_WIDTH - WALL_MARGIN;
    let max_z = FIELD_HALF_LENGTH - WALL_MARGIN;
    let mut bounced = false;
    if p.pos.x < -max_x {
        p.pos.x = -max_x;
        p.vel.x *= -WALL_BOUNCE;
        bounced = true;
    }
    if p.pos.x > max_x {
        p.pos.x = max_x;
        p.vel.x *= -WALL_BOUNCE;
        bounced = true;
    }
    if p.pos.z < -max_z {
        p.pos.z = -max_z;
        p.vel.z *= -WALL_BOUNCE;
        bounced = true;
    }
    if p.pos.z > max_z {
        p.pos.z = max_z;
        p.vel.z *= -WALL_BOUNCE;
        bounced = true;
    }
    if bounced {
        p.vel *= WALL_HIT_DAMP;
    }

    // Ground contact: bounce while still falling fast, otherwise settle
    // vertically and let rolling friction take over.
    if p.pos.y < DISC_REST_HEIGHT {
        p.pos.y = DISC_REST_HEIGHT;
        if p.vel.y.abs() > BOUNCE_SPEED_THRESHOLD {
            p.vel.y *= -DISC_BOUNCE;
            p.vel.x *= GROUND_CONTACT_FRICTION;
            p.vel.z *= GROUND_CONTACT_FRICTION;
        } else {
            p.vel.y = 0.0;
        }
    }

    // Rolling friction and visual roll while resting on the ground
    if on_ground(p) {
        let friction = (1.0 - GROUND_FRICTION * dt).max(0.0);
        p.vel.x *= friction;
        p.vel.z *= friction;

        let speed_h = p.vel.xz().length();
        if speed_h > 1e-4 {
            // Rolling without slipping: axis perpendicular to travel
            let roll = (speed_h / DISC_RADIUS) * dt;
            let axis = Vec3::new(-p.vel.z, 0.0, p.vel.x).normalize();
            p.spin = Quat::from_axis_angle(axis, roll) * p.spin;
        }
    }
}

/// Whether a projectile is resting on the field surface
pub fn on_ground(p: &Projectile) -> bool {
    p.pos.y <= DISC_REST_HEIGHT + 1e-3 && p.vel.y.abs() < 1e-3
}

fn update_projectiles(state: &mut SimState, dt: f32, events: &mut Vec<GameEvent>) {
    let SimState {
        ref mut projectiles,
        ref mut pickups,
        ref goal_zones,
        ref mut score,
        ..
    } = *state;

    let mut i = 0;
    while i < projectiles.len() {
        let p = &mut projectiles[i];
        integrate_projectile(p, dt);

        // Goal test: first matching zone wins, a scored disc never settles
        if let Some(zone) = goal_zones.iter().position(|z| z.contains(p.pos)) {
            *score += 1;
            events.push(GameEvent::Scored { id: p.id, zone });
            projectiles.remove(i);
            continue;
        }

        // Settle test: a slow grounded disc becomes collectible again
        if p.vel.length_squared() < SETTLE_SPEED_SQ && p.pos.y <= DISC_REST_HEIGHT + 0.001 {
            let id = p.id;
            let pos = Vec3::new(p.pos.x, DISC_REST_HEIGHT, p.pos.z);
            events.push(GameEvent::Settled { id });
            pickups.push(Pickup { id, pos });
            projectiles.remove(i);
            continue;
        }

        i += 1;
    }
}

/// Collect the first disc within reach, preferring settled discs over
/// in-flight ones
fn try_collect(state: &mut SimState, events: &mut Vec<GameEvent>) {
    if state.inventory >= INVENTORY_CAPACITY {
        return;
    }
    let player_pos = state.player.pos;

    if let Some(idx) = state
        .pickups
        .iter()
        .position(|d| d.pos.distance(player_pos) < PICKUP_RADIUS)
    {
        let picked = state.pickups.remove(idx);
        state.inventory += 1;
        events.push(GameEvent::Collected { id: picked.id });
        return;
    }

    if let Some(idx) = state
        .projectiles
        .iter()
        .position(|p| p.pos.distance(player_pos) < PICKUP_RADIUS)
    {
        let picked = state.projectiles.remove(idx);
        state.inventory += 1;
        events.push(GameEvent::Collected { id: picked.id });
    }
}

/// Throw a disc along a 45-degree-elevation aim aligned with the camera facing
fn try_shoot(state: &mut SimState, events: &mut Vec<GameEvent>) {
    if state.inventory == 0 {
        return;
    }

    let mut horiz = {
        let f = state.camera.forward();
        Vec3::new(f.x, 0.0, f.z)
    };
    if horiz.length_squared() < 1e-6 {
        horiz = Vec3::new(state.player.yaw.sin(), 0.0, state.player.yaw.cos());
    }
    horiz = horiz.normalize();

    let c = std::f32::consts::FRAC_1_SQRT_2;
    let dir = (horiz * c + Vec3::Y * c).normalize();

    let mut pos = state.player.pos + dir * SHOT_SPAWN_OFFSET;
    pos.y = pos.y.max(SHOT_MIN_HEIGHT);
    // The player clamp is looser than the wall margin, so a shot from the
    // edge could otherwise spawn outside the bounds the walls enforce
    let max_x = FIELD_HALF_WIDTH - WALL_MARGIN;
    let max_z = FIELD_HALF_LENGTH - WALL_MARGIN;
    pos.x = pos.x.clamp(-max_x, max_x);
    pos.z = pos.z.clamp(-max_z, max_z);

    let id = state.next_entity_id();
    state.projectiles.push(Projectile {
        id,
        pos,
        vel: dir * SHOT_SPEED,
        spin: Quat::IDENTITY,
    });
    state.inventory -= 1;
    events.push(GameEvent::ShotFired { id });
}
