//! Obstacle and log-riding physics
//!
//! Obstacles advance every fixed tick and wrap off-screen rather than being
//! destroyed, so a lane's population is stable for its whole lifetime. Logs
//! additionally carry a riding player; losing the log is fatal.

use glam::Vec2;
use rand::Rng;

use super::state::{DeathCause, GameState, ObstacleKind, Particle, ParticleShape};
use crate::config::GameConfig;

/// How far past the board edge an obstacle travels before wrapping
const WRAP_MARGIN_CELLS: f32 = 2.0;

/// Velocity damping applied to particles each tick
const PARTICLE_DRAG: f32 = 0.98;

/// Advance every obstacle and wrap the ones that fully left the board.
pub fn advance_obstacles(state: &mut GameState, config: &GameConfig, dt: f32) {
    let cell = config.cell_size;
    let board_w = config.grid_columns as f32 * cell;
    let margin = WRAP_MARGIN_CELLS * cell;

    for lane in state.lanes.values_mut() {
        for obstacle in &mut lane.obstacles {
            obstacle.x += obstacle.speed * lane.speed_scale * dt;

            if obstacle.speed > 0.0 && obstacle.left(cell) > board_w + margin {
                obstacle.x = -obstacle.width_px(cell) / 2.0 - margin;
            } else if obstacle.speed < 0.0 && obstacle.right(cell) < -margin {
                obstacle.x = board_w + obstacle.width_px(cell) / 2.0 + margin;
            }
        }
    }
}

/// Drift a riding player with their log and validate the ride.
///
/// The log is looked up by id in the player's current lane every tick; a
/// missing log means it moved on without us, which ends the ride the hard
/// way. Returns the death cause instead of applying it, so all deaths stay
/// funneled through the tick loop.
pub fn ride_log(state: &mut GameState, config: &GameConfig, dt: f32) -> Option<DeathCause> {
    let log_id = state.player.riding_log_id?;
    if !state.player.alive || state.player.is_hopping() {
        return None;
    }

    let cell = config.cell_size;
    let board_w = config.grid_columns as f32 * cell;

    let log = state.lanes.get(&state.player.row).and_then(|lane| {
        lane.obstacles
            .iter()
            .find(|o| o.id == log_id && o.kind == ObstacleKind::Log)
            .map(|o| (o.speed, o.left(cell), o.right(cell)))
    });
    let Some((speed, left, right)) = log else {
        // Dangling reference: the log is gone from under us
        return Some(DeathCause::Water);
    };

    state.player.pos.x += speed * dt;
    state.player.col = (state.player.pos.x / cell - 0.5).round() as i32;

    let x = state.player.pos.x;
    if x < left || x > right {
        return Some(DeathCause::Water);
    }
    if x < 0.0 || x > board_w {
        return Some(DeathCause::Water);
    }
    None
}

/// Smooth the camera toward its anchor point below the player.
pub fn update_camera(state: &mut GameState, config: &GameConfig) {
    let camera = &mut state.camera;
    camera.target_y = state.player.pos.y - camera.viewport_h * crate::consts::CAMERA_ANCHOR;
    camera.y += (camera.target_y - camera.y) * config.camera_smoothing;
}

/// Advance and expire particles. Runs every sub-step regardless of phase so
/// death bursts keep animating over the game-over screen.
pub fn update_particles(state: &mut GameState, dt: f32) {
    for p in &mut state.particles {
        if p.trail {
            p.prev_pos = Some(p.pos);
        }
        p.pos += p.vel * dt;
        p.vel *= PARTICLE_DRAG;
        p.rotation += p.rotation_speed * dt;
        p.life -= dt;
    }
    state.particles.retain(|p| p.life > 0.0);
}

/// Radial burst of short-lived squares, used for deaths.
pub fn spawn_burst(state: &mut GameState, at: Vec2, color: [u8; 4]) {
    let count = state.rng.random_range(8..=12);
    for _ in 0..count {
        let angle = state.rng.random_range(0.0..std::f32::consts::TAU);
        let speed = state.rng.random_range(40.0..140.0);
        let life = state.rng.random_range(0.4..0.8);
        let vel = Vec2::new(angle.cos(), angle.sin()) * speed;
        state.particles.push(Particle {
            pos: at,
            vel,
            life,
            max_life: life,
            color,
            size: state.rng.random_range(2.0..5.0),
            shape: ParticleShape::Square,
            rotation: angle,
            rotation_speed: state.rng.random_range(-6.0..6.0),
            trail: false,
            prev_pos: None,
        });
    }
}

/// Expanding ripple ring, used when landing on a log.
pub fn spawn_ripple(state: &mut GameState, at: Vec2) {
    for _ in 0..4 {
        let angle = state.rng.random_range(0.0..std::f32::consts::TAU);
        let speed = state.rng.random_range(15.0..35.0);
        state.particles.push(Particle {
            pos: at,
            vel: Vec2::new(angle.cos(), angle.sin()) * speed,
            life: 0.5,
            max_life: 0.5,
            color: [170, 215, 255, 200],
            size: 2.0,
            shape: ParticleShape::Circle,
            rotation: 0.0,
            rotation_speed: 0.0,
            trail: true,
            prev_pos: None,
        });
    }
}

/// Upward sparkle lines, used for level-ups.
pub fn spawn_sparkle(state: &mut GameState, at: Vec2) {
    for _ in 0..6 {
        let vx = state.rng.random_range(-30.0..30.0);
        let vy = state.rng.random_range(-90.0..-40.0);
        let life = state.rng.random_range(0.3..0.6);
        state.particles.push(Particle {
            pos: at,
            vel: Vec2::new(vx, vy),
            life,
            max_life: life,
            color: [255, 230, 120, 255],
            size: 4.0,
            shape: ParticleShape::Line,
            rotation: state.rng.random_range(0.0..std::f32::consts::TAU),
            rotation_speed: state.rng.random_range(-4.0..4.0),
            trail: false,
            prev_pos: None,
        });
    }
}
