//! Procedural lane generation
//!
//! New rows are produced ahead of the player from a weighted terrain draw
//! with consecutive-run caps, alternating traffic flow, and obstacle
//! spawning scaled by difficulty. Generation is lazy: it fires only when
//! the frontier falls within the configured look-ahead, never inside the
//! visible viewport.

use rand::Rng;
use rand_pcg::Pcg32;

use super::state::{GameState, Lane, LaneKind, Obstacle, ObstacleKind};
use crate::config::GameConfig;
use crate::consts::{
    DIFFICULTY_MAX, DIFFICULTY_SCORE_CAP, GENERATION_BATCH, LEVEL_SPEED_BONUS, SAFE_START_LANES,
    VIEWPORT_ROWS,
};
use crate::lerp;

/// Base weights for the terrain draw
const LANE_WEIGHTS: [(LaneKind, u32); 4] = [
    (LaneKind::Grass, 30),
    (LaneKind::Road, 50),
    (LaneKind::Water, 15),
    (LaneKind::Railroad, 5),
];

/// Longest allowed run of consecutive lanes per terrain type
fn run_cap(kind: LaneKind) -> u32 {
    match kind {
        LaneKind::Grass => 3,
        LaneKind::Road => 4,
        LaneKind::Water => 3,
        LaneKind::Railroad => 1,
    }
}

/// Base speed ranges in px/s, before difficulty scaling
const CAR_SPEED: (f32, f32) = (60.0, 110.0);
const TRUCK_SPEED: (f32, f32) = (45.0, 85.0);
const TRAIN_SPEED: (f32, f32) = (260.0, 340.0);
/// Logs are a mobility mechanic, never difficulty-scaled
const LOG_SPEED: (f32, f32) = (20.0, 45.0);

const TRAIN_WIDTH_CELLS: u32 = 4;
const LOG_WIDTH_CELLS: u32 = 3;

/// Extra eviction slack behind the furthest row the rules still observe
const EVICT_SLACK: i32 = 4;

/// Vehicle/train speed multiplier for the current progress
pub fn difficulty_multiplier(score: u32, level: u32) -> f32 {
    let t = (score as f32 / DIFFICULTY_SCORE_CAP as f32).min(1.0);
    lerp(1.0, DIFFICULTY_MAX, t) + LEVEL_SPEED_BONUS * level.saturating_sub(1) as f32
}

/// Weighted draw over the entries whose weight survived filtering
fn weighted_pick(rng: &mut Pcg32, items: &[(LaneKind, u32)]) -> LaneKind {
    let total: u32 = items.iter().map(|(_, w)| w).sum();
    let mut roll = rng.random_range(0..total);
    for &(kind, w) in items {
        if roll < w {
            return kind;
        }
        roll -= w;
    }
    items[items.len() - 1].0
}

/// Seed the consecutive-run counter from the lanes adjacent to the frontier,
/// so runs are not reset across generation batches.
fn seed_run(state: &GameState) -> (Option<LaneKind>, u32) {
    let Some(front) = state.lanes.get(&state.generated_up_to) else {
        return (None, 0);
    };
    let kind = front.kind;
    let mut len = 0;
    let mut y = state.generated_up_to;
    while let Some(lane) = state.lanes.get(&y) {
        if lane.kind != kind {
            break;
        }
        len += 1;
        y += 1;
    }
    (Some(kind), len)
}

/// Populate the board for a fresh run: a grass apron over the spawn area,
/// then the first generated stretch ahead of it.
pub fn populate_initial(state: &mut GameState, config: &GameConfig) {
    for y in 0..SAFE_START_LANES {
        let variant = state.rng.random_range(0..3) as u8;
        let flow = if state.rng.random_bool(0.5) { 1 } else { -1 };
        state.lanes.insert(
            y,
            Lane {
                y,
                kind: LaneKind::Grass,
                variant,
                obstacles: Vec::new(),
                flow,
                speed_scale: 1.0,
            },
        );
    }
    state.generated_up_to = 0;

    let to_y = state.player.row - config.generate_ahead - GENERATION_BATCH;
    generate_range(state, config, to_y);
}

/// Lazy generation trigger, run once per sub-step after movement.
/// Also prunes lanes far enough behind that no rule can observe them.
pub fn ensure_lanes_ahead(state: &mut GameState, config: &GameConfig) {
    if state.player.row - state.generated_up_to >= config.generate_ahead {
        return;
    }
    let to_y = state.player.row - config.generate_ahead - GENERATION_BATCH;
    generate_range(state, config, to_y);
    evict_behind(state, config);
}

/// Fill every row in `[to_y, generated_up_to)` with a new lane, in
/// decreasing-y order (forward from the frontier).
pub fn generate_range(state: &mut GameState, config: &GameConfig, to_y: i32) {
    if to_y >= state.generated_up_to {
        return;
    }

    let (mut run_kind, mut run_len) = seed_run(state);
    let from_y = state.generated_up_to;

    for y in (to_y..from_y).rev() {
        let kind = pick_kind(&mut state.rng, run_kind, run_len);
        if run_kind == Some(kind) {
            run_len += 1;
        } else {
            run_kind = Some(kind);
            run_len = 1;
        }

        let flow = pick_flow(state, y, kind);
        let variant = state.rng.random_range(0..3) as u8;
        let mut lane = Lane {
            y,
            kind,
            variant,
            obstacles: Vec::new(),
            flow,
            speed_scale: 1.0,
        };
        spawn_obstacles(state, config, &mut lane);
        state.lanes.insert(y, lane);
    }

    state.generated_up_to = to_y;
    log::debug!(
        "generated lanes [{}, {}), frontier now {}",
        to_y,
        from_y,
        state.generated_up_to
    );
}

/// Weighted draw excluding any type whose consecutive run hit its cap.
/// If everything is capped (can't happen with the current tables, but the
/// fallback keeps the draw total-safe), the lane is grass.
fn pick_kind(rng: &mut Pcg32, run_kind: Option<LaneKind>, run_len: u32) -> LaneKind {
    let allowed: Vec<(LaneKind, u32)> = LANE_WEIGHTS
        .iter()
        .copied()
        .filter(|&(kind, _)| run_kind != Some(kind) || run_len < run_cap(kind))
        .collect();
    if allowed.is_empty() {
        return LaneKind::Grass;
    }
    weighted_pick(rng, &allowed)
}

/// Adjacent traffic lanes alternate direction so a multi-lane road never
/// forms a same-direction wall. Grass and water drift randomly.
fn pick_flow(state: &mut GameState, y: i32, kind: LaneKind) -> i8 {
    let traffic = matches!(kind, LaneKind::Road | LaneKind::Railroad);
    if traffic {
        let prev = state
            .lanes
            .get(&(y + 1))
            .filter(|l| matches!(l.kind, LaneKind::Road | LaneKind::Railroad))
            .map(|l| l.flow);
        if let Some(prev) = prev {
            return -prev;
        }
    }
    if state.rng.random_bool(0.5) { 1 } else { -1 }
}

fn spawn_obstacles(state: &mut GameState, config: &GameConfig, lane: &mut Lane) {
    let cell = config.cell_size;
    let lane_w = config.grid_columns as f32 * cell;
    let difficulty = difficulty_multiplier(state.score, state.level);
    let dir = lane.flow as f32;

    match lane.kind {
        LaneKind::Grass => {}

        LaneKind::Road => {
            let count = state.rng.random_range(1..=3);
            let slot_w = lane_w / count as f32;
            for i in 0..count {
                let (kind, (lo, hi)) = if state.rng.random_bool(0.6) {
                    (ObstacleKind::Car, CAR_SPEED)
                } else {
                    (ObstacleKind::Truck, TRUCK_SPEED)
                };
                let speed = state.rng.random_range(lo..hi) * difficulty * dir;
                let jitter = state.rng.random_range(-0.2..0.2) * slot_w;
                let x = slot_w * (i as f32 + 0.5) + jitter;
                let id = state.next_entity_id();
                lane.obstacles.push(Obstacle {
                    id,
                    kind,
                    lane_y: lane.y,
                    x,
                    width_cells: if kind == ObstacleKind::Truck { 2 } else { 1 },
                    speed,
                });
            }
        }

        LaneKind::Railroad => {
            let speed = state.rng.random_range(TRAIN_SPEED.0..TRAIN_SPEED.1) * difficulty * dir;
            let width_px = TRAIN_WIDTH_CELLS as f32 * cell;
            // Spawn just off the edge the train approaches from
            let x = if dir > 0.0 {
                -width_px / 2.0 - cell
            } else {
                lane_w + width_px / 2.0 + cell
            };
            let id = state.next_entity_id();
            lane.obstacles.push(Obstacle {
                id,
                kind: ObstacleKind::Train,
                lane_y: lane.y,
                x,
                width_cells: TRAIN_WIDTH_CELLS,
                speed,
            });
        }

        LaneKind::Water => {
            let count = state.rng.random_range(2..=3);
            let slot_w = lane_w / count as f32;
            for i in 0..count {
                let speed = state.rng.random_range(LOG_SPEED.0..LOG_SPEED.1) * dir;
                let jitter = state.rng.random_range(-0.2..0.2) * slot_w;
                let x = slot_w * (i as f32 + 0.5) + jitter;
                let id = state.next_entity_id();
                lane.obstacles.push(Obstacle {
                    id,
                    kind: ObstacleKind::Log,
                    lane_y: lane.y,
                    x,
                    width_cells: LOG_WIDTH_CELLS,
                    speed,
                });
            }
        }
    }
}

/// Drop lanes far enough behind the furthest reached row that neither the
/// camera nor the back-death rule can still observe them.
fn evict_behind(state: &mut GameState, config: &GameConfig) {
    let keep_limit = state.furthest_row()
        + config.back_death_distance
        + VIEWPORT_ROWS as i32
        + EVICT_SLACK;
    let mut cutoff = keep_limit.max(state.player.row);
    if let Some((_, row)) = state.player.hop_target {
        cutoff = cutoff.max(row);
    }
    let dropped = state.lanes.split_off(&(cutoff + 1));
    if !dropped.is_empty() {
        log::debug!("evicted {} lanes behind row {}", dropped.len(), cutoff);
    }
}
