//! Game state and core simulation types
//!
//! Everything needed to snapshot and replay a run lives here. The engine is
//! the only writer; the renderer and host read through these fields.

use std::collections::{BTreeMap, VecDeque};

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::{col_center, row_center};

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting on the title screen; any movement starts the run
    Menu,
    /// Active gameplay
    Playing,
    /// Game is paused
    Paused,
    /// Run ended
    GameOver,
}

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathCause {
    Vehicle,
    Train,
    Water,
    IdleTimeout,
    OffScreen,
}

/// Discrete input tokens consumed by the tick loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    Pause,
}

impl Action {
    /// Grid delta for a movement action, None for Pause
    pub fn direction(self) -> Option<(i32, i32)> {
        match self {
            Action::MoveUp => Some((0, -1)),
            Action::MoveDown => Some((0, 1)),
            Action::MoveLeft => Some((-1, 0)),
            Action::MoveRight => Some((1, 0)),
            Action::Pause => None,
        }
    }
}

/// Which way the player sprite points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Facing {
    Up,
    Down,
    Left,
    Right,
}

/// Player animation tag, picked up by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerAnimation {
    Idle,
    Hop,
    Death,
}

/// Terrain type of a lane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LaneKind {
    Grass,
    Road,
    Water,
    Railroad,
}

/// Obstacle types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObstacleKind {
    Car,
    Truck,
    Train,
    Log,
}

impl ObstacleKind {
    /// Logs are a mobility mechanic; everything else kills on contact
    pub fn is_hazard(self) -> bool {
        !matches!(self, ObstacleKind::Log)
    }
}

/// A moving entity owned by a lane
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: u64,
    pub kind: ObstacleKind,
    /// Row of the owning lane
    pub lane_y: i32,
    /// World x of the obstacle's center (pixels)
    pub x: f32,
    /// Width in grid cells
    pub width_cells: u32,
    /// Signed speed in px/s; sign is the travel direction
    pub speed: f32,
}

impl Obstacle {
    pub fn width_px(&self, cell_size: f32) -> f32 {
        self.width_cells as f32 * cell_size
    }

    pub fn left(&self, cell_size: f32) -> f32 {
        self.x - self.width_px(cell_size) / 2.0
    }

    pub fn right(&self, cell_size: f32) -> f32 {
        self.x + self.width_px(cell_size) / 2.0
    }
}

/// One horizontal row of the level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lane {
    /// Row coordinate; decreasing y is forward
    pub y: i32,
    pub kind: LaneKind,
    /// Visual variant index for the renderer
    pub variant: u8,
    pub obstacles: Vec<Obstacle>,
    /// Traffic/current direction, +1 right or -1 left
    pub flow: i8,
    /// Reserved per-lane speed multiplier
    pub speed_scale: f32,
}

/// The hopping player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Grid column, clamped to the board
    pub col: i32,
    /// Grid row; decreasing row is forward
    pub row: i32,
    /// Continuous world position (pixels), interpolated during a hop
    pub pos: Vec2,
    pub facing: Facing,
    pub animation: PlayerAnimation,
    /// 0..1 while a hop is in flight
    pub hop_progress: f32,
    /// World position the current hop started from
    pub hop_from: Option<Vec2>,
    /// Target cell of the current hop, None when grounded
    pub hop_target: Option<(i32, i32)>,
    pub alive: bool,
    /// Seconds since the last successful hop while grounded
    pub idle_time: f32,
    /// Weak reference to the log currently carrying the player.
    /// A dangling id means the log moved out from under us.
    pub riding_log_id: Option<u64>,
}

impl Player {
    pub fn spawn(col: i32, row: i32, cell_size: f32) -> Self {
        Self {
            col,
            row,
            pos: Vec2::new(col_center(col, cell_size), row_center(row, cell_size)),
            facing: Facing::Up,
            animation: PlayerAnimation::Idle,
            hop_progress: 0.0,
            hop_from: None,
            hop_target: None,
            alive: true,
            idle_time: 0.0,
            riding_log_id: None,
        }
    }

    pub fn is_hopping(&self) -> bool {
        self.hop_target.is_some()
    }
}

/// Vertical scroll state; only ever follows the player forward
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Camera {
    /// World y of the viewport's top edge
    pub y: f32,
    /// Smoothing target for `y`
    pub target_y: f32,
    pub viewport_w: f32,
    pub viewport_h: f32,
}

impl Camera {
    pub fn new(viewport_w: f32, viewport_h: f32, player_y: f32) -> Self {
        let y = player_y - viewport_h * crate::consts::CAMERA_ANCHOR;
        Self {
            y,
            target_y: y,
            viewport_w,
            viewport_h,
        }
    }
}

/// Particle shapes the renderer knows how to draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticleShape {
    Square,
    Circle,
    Line,
}

/// An ephemeral visual effect; never gameplay-affecting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Remaining life in seconds
    pub life: f32,
    pub max_life: f32,
    pub color: [u8; 4],
    pub size: f32,
    pub shape: ParticleShape,
    pub rotation: f32,
    pub rotation_speed: f32,
    /// Draw a faded ghost at the previous position
    pub trail: bool,
    pub prev_pos: Option<Vec2>,
}

/// Side effects the host reacts to (sound, HUD, leaderboard).
/// Collected synchronously while ticking, drained once per frame.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    ScoreChanged { score: u32 },
    PhaseChanged { phase: GamePhase },
    Death { cause: DeathCause, score: u32 },
    Hop,
    LevelUp { level: u32 },
}

/// Complete game state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    /// Seeded generator; all gameplay randomness flows through it
    pub rng: Pcg32,
    pub phase: GamePhase,
    pub player: Player,
    /// Lanes keyed by row; the map enforces one lane per row
    pub lanes: BTreeMap<i32, Lane>,
    pub camera: Camera,
    pub particles: Vec<Particle>,
    /// Pending input, drained once per fixed tick
    pub action_queue: VecDeque<Action>,
    pub score: u32,
    pub high_score: u32,
    pub level: u32,
    /// Frontier row: lanes exist for `y >= generated_up_to`
    pub generated_up_to: i32,
    /// Set only when phase is GameOver
    pub death_cause: Option<DeathCause>,
    /// Leftover fractional time for the fixed-step loop
    pub time_accumulator: f32,
    /// Elapsed simulated time, drives render animations
    pub elapsed: f32,
    /// Row the player spawned on; score is forward distance from here
    pub start_row: i32,
    next_id: u64,
}

impl GameState {
    /// Create a fresh session. Lanes for the spawn area and the first
    /// generated stretch are populated before the first tick.
    pub fn new(seed: u64, config: &GameConfig) -> Self {
        let start_row = 0;
        let start_col = config.grid_columns as i32 / 2;
        let viewport_w = config.grid_columns as f32 * config.cell_size;
        let viewport_h = crate::consts::VIEWPORT_ROWS as f32 * config.cell_size;
        let player = Player::spawn(start_col, start_row, config.cell_size);
        let camera = Camera::new(viewport_w, viewport_h, player.pos.y);

        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: GamePhase::Menu,
            player,
            lanes: BTreeMap::new(),
            camera,
            particles: Vec::new(),
            action_queue: VecDeque::new(),
            score: 0,
            high_score: 0,
            level: 1,
            generated_up_to: start_row,
            death_cause: None,
            time_accumulator: 0.0,
            elapsed: 0.0,
            start_row,
            next_id: 1,
        };

        super::lanes::populate_initial(&mut state, config);
        state
    }

    /// Allocate a new entity ID (monotonic, never reused)
    pub fn next_entity_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Lane the player currently occupies
    pub fn player_lane(&self) -> Option<&Lane> {
        self.lanes.get(&self.player.row)
    }

    /// Furthest-forward row ever reached, derived from score
    pub fn furthest_row(&self) -> i32 {
        self.start_row - self.score as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GameConfig {
        GameConfig::default()
    }

    #[test]
    fn test_entity_ids_monotonic() {
        let mut state = GameState::new(7, &config());
        let a = state.next_entity_id();
        let b = state.next_entity_id();
        assert!(b > a);
    }

    #[test]
    fn test_initial_lanes_cover_spawn_and_lookahead() {
        let cfg = config();
        let state = GameState::new(42, &cfg);

        // Spawn area is all grass
        for y in 0..crate::consts::SAFE_START_LANES {
            let lane = state.lanes.get(&y).expect("spawn lane missing");
            assert_eq!(lane.kind, LaneKind::Grass);
        }

        // Frontier is at least generate_ahead rows out
        assert!(state.player.row - state.generated_up_to >= cfg.generate_ahead);
    }

    #[test]
    fn test_spawn_player_grounded() {
        let cfg = config();
        let state = GameState::new(1, &cfg);
        assert!(state.player.alive);
        assert!(!state.player.is_hopping());
        assert_eq!(state.player.row, 0);
        assert_eq!(state.phase, GamePhase::Menu);
    }

    #[test]
    fn test_obstacle_bounds() {
        let log = Obstacle {
            id: 1,
            kind: ObstacleKind::Log,
            lane_y: -3,
            x: 100.0,
            width_cells: 3,
            speed: 20.0,
        };
        assert_eq!(log.width_px(32.0), 96.0);
        assert_eq!(log.left(32.0), 52.0);
        assert_eq!(log.right(32.0), 148.0);
    }
}
