//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Lanes keyed by row for stable iteration order
//! - No rendering or platform dependencies

pub mod collision;
pub mod lanes;
pub mod physics;
pub mod state;
pub mod tick;

pub use collision::{Aabb, hazard_scan, log_under, obstacle_hitbox, player_hitbox};
pub use lanes::{difficulty_multiplier, ensure_lanes_ahead, generate_range};
pub use state::{
    Action, Camera, DeathCause, Facing, GameEvent, GamePhase, GameState, Lane, LaneKind, Obstacle,
    ObstacleKind, Particle, ParticleShape, Player, PlayerAnimation,
};
pub use tick::{reset_for_new_game, tick};
