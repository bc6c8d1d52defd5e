//! Collision detection and landing resolution
//!
//! Axis-aligned box checks between the player and lane obstacles. The
//! player's box is shrunk for forgiveness; logs are never part of the
//! hazard scan (standing on one is handled by the riding physics instead).

use glam::Vec2;

use super::state::{DeathCause, GameState, Lane, Obstacle, ObstacleKind};
use crate::config::GameConfig;

/// Fraction of a cell shaved off each side of the player's box
const HITBOX_MARGIN: f32 = 0.1;

/// An axis-aligned bounding box
#[derive(Debug, Clone, Copy)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }
}

/// Forgiving player hitbox around the given center
pub fn player_hitbox(center: Vec2, cell_size: f32) -> Aabb {
    let half = cell_size * (0.5 - HITBOX_MARGIN);
    Aabb {
        min: center - Vec2::splat(half),
        max: center + Vec2::splat(half),
    }
}

/// An obstacle's box at its current position, spanning its lane's row band
pub fn obstacle_hitbox(obstacle: &Obstacle, cell_size: f32) -> Aabb {
    Aabb {
        min: Vec2::new(obstacle.left(cell_size), obstacle.lane_y as f32 * cell_size),
        max: Vec2::new(
            obstacle.right(cell_size),
            (obstacle.lane_y + 1) as f32 * cell_size,
        ),
    }
}

/// Scan the lanes the player can currently touch for a fatal overlap.
///
/// That's the lane they occupy plus, mid-hop, the destination lane, so a
/// hop that passes over a road is still caught even though the player
/// never "lands" there this tick.
pub fn hazard_scan(state: &GameState, config: &GameConfig) -> Option<DeathCause> {
    let cell = config.cell_size;
    let player_box = player_hitbox(state.player.pos, cell);

    let mut rows = [state.player.row, state.player.row];
    if let Some((_, target_row)) = state.player.hop_target {
        rows[1] = target_row;
    }

    for (i, row) in rows.iter().enumerate() {
        if i == 1 && rows[1] == rows[0] {
            break;
        }
        let Some(lane) = state.lanes.get(row) else {
            continue;
        };
        for obstacle in &lane.obstacles {
            if !obstacle.kind.is_hazard() {
                continue;
            }
            if player_box.overlaps(&obstacle_hitbox(obstacle, cell)) {
                return Some(match obstacle.kind {
                    ObstacleKind::Train => DeathCause::Train,
                    _ => DeathCause::Vehicle,
                });
            }
        }
    }
    None
}

/// Find the log covering world x in this lane, if any
pub fn log_under(lane: &Lane, x: f32, cell_size: f32) -> Option<u64> {
    lane.obstacles
        .iter()
        .find(|o| {
            o.kind == ObstacleKind::Log && x >= o.left(cell_size) && x <= o.right(cell_size)
        })
        .map(|o| o.id)
}
