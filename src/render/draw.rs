//! Frame composition
//!
//! A pure consumer of [`GameState`]: lanes, obstacles, player, particles.
//! The only state kept here is decorative (prerendered sprites, the star
//! field, and per-lane fade-in timestamps); the simulation is never touched.

use std::collections::HashMap;
use std::f32::consts::PI;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::frame::Frame;
use super::sprites::{SpriteCache, player_sprite_key};
use crate::config::GameConfig;
use crate::sim::{GameState, Lane, LaneKind, ObstacleKind, ParticleShape};

/// Seconds a newly visible lane takes to fade in
const LANE_FADE_SECS: f32 = 0.3;
/// Cull margin around the viewport, in cells
const CULL_MARGIN_CELLS: f32 = 2.0;
/// Hop arc height as a fraction of a cell
const HOP_ARC: f32 = 0.3;
/// Decorative star count and seed; independent of the sim's RNG
const STAR_COUNT: usize = 48;
const STAR_SEED: u64 = 0x51A2_F00D;

const SKY: [u8; 4] = [18, 22, 38, 255];
const GRASS: [u8; 4] = [88, 160, 66, 255];
const GRASS_TUFT: [u8; 4] = [58, 118, 44, 255];
const ASPHALT: [u8; 4] = [52, 54, 60, 255];
const LANE_DASH: [u8; 4] = [200, 200, 185, 210];
const WATER: [u8; 4] = [48, 98, 180, 255];
const WATER_STRIPE: [u8; 4] = [115, 165, 225, 160];
const BALLAST: [u8; 4] = [92, 84, 74, 255];
const TIE: [u8; 4] = [64, 52, 40, 255];
const RAIL: [u8; 4] = [165, 165, 170, 255];
const SHADOW: [u8; 4] = [0, 0, 0, 90];

struct Star {
    x: f32,
    y: f32,
    phase: f32,
    size: f32,
}

/// Scale a color's alpha by `f` (0..1)
fn faded(color: [u8; 4], f: f32) -> [u8; 4] {
    [
        color[0],
        color[1],
        color[2],
        (color[3] as f32 * f.clamp(0.0, 1.0)) as u8,
    ]
}

pub struct Renderer {
    sprites: SpriteCache,
    stars: Vec<Star>,
    /// Animation time each lane first became visible, for fade-in
    lane_first_seen: HashMap<i32, f32>,
}

impl Renderer {
    pub fn new(config: &GameConfig) -> Self {
        let mut rng = Pcg32::seed_from_u64(STAR_SEED);
        let stars = (0..STAR_COUNT)
            .map(|_| Star {
                x: rng.random_range(0.0..config.board_width()),
                y: rng.random_range(0.0..config.viewport_height()),
                phase: rng.random_range(0.0..std::f32::consts::TAU),
                size: if rng.random_bool(0.25) { 2.0 } else { 1.0 },
            })
            .collect();

        Self {
            sprites: SpriteCache::build(config.cell_size),
            stars,
            lane_first_seen: HashMap::new(),
        }
    }

    /// Paint one frame of the current state.
    pub fn render(&mut self, frame: &mut Frame, state: &GameState, config: &GameConfig) {
        let cell = config.cell_size;
        let cam_y = state.camera.y;
        let margin = CULL_MARGIN_CELLS * cell;

        frame.clear(SKY);
        self.draw_stars(frame, state.elapsed);

        for (&y, lane) in state.lanes.iter() {
            let screen_y = y as f32 * cell - cam_y;
            if screen_y + cell < -margin || screen_y > frame.height() as f32 + margin {
                continue;
            }

            let first = *self.lane_first_seen.entry(y).or_insert(state.elapsed);
            let fade = ((state.elapsed - first) / LANE_FADE_SECS).clamp(0.0, 1.0);

            self.draw_terrain(frame, state, lane, screen_y, fade, config);
            self.draw_obstacles(frame, lane, screen_y, fade, config);
        }
        // Forget lanes that no longer exist so the cache can't grow forever
        self.lane_first_seen
            .retain(|y, _| state.lanes.contains_key(y));

        self.draw_player(frame, state, config);
        self.draw_particles(frame, state, cam_y);
    }

    fn draw_stars(&self, frame: &mut Frame, elapsed: f32) {
        for star in &self.stars {
            let twinkle = 0.5 + 0.5 * (elapsed * 1.7 + star.phase).sin();
            let alpha = (70.0 + 140.0 * twinkle) as u8;
            frame.fill_rect(star.x, star.y, star.size, star.size, [220, 225, 240, alpha]);
        }
    }

    fn draw_terrain(
        &self,
        frame: &mut Frame,
        state: &GameState,
        lane: &Lane,
        screen_y: f32,
        fade: f32,
        config: &GameConfig,
    ) {
        let cell = config.cell_size;
        let w = config.board_width();
        let t = state.elapsed;

        match lane.kind {
            LaneKind::Grass => {
                // Slow color shimmer, offset per row so fields don't pulse in sync
                let shimmer = ((t * 0.8 + lane.y as f32 * 1.3).sin() * 7.0) as i16;
                let base = GRASS[1] as i16 + shimmer + lane.variant as i16 * 4;
                let color = [GRASS[0], base.clamp(0, 255) as u8, GRASS[2], GRASS[3]];
                frame.fill_rect(0.0, screen_y, w, cell, faded(color, fade));

                for i in 0..5u64 {
                    let h = (lane.y as i64 as u64)
                        .wrapping_mul(0x9E37_79B9_7F4A_7C15)
                        .wrapping_add(i.wrapping_mul(0x85EB_CA6B));
                    let x = ((h >> 16) % w as u64) as f32;
                    let off = ((h >> 40) % (cell as u64 - 6)) as f32;
                    frame.fill_rect(x, screen_y + off + 3.0, 3.0, 3.0, faded(GRASS_TUFT, fade));
                }
            }

            LaneKind::Road => {
                frame.fill_rect(0.0, screen_y, w, cell, faded(ASPHALT, fade));
                // Dashed divider against the next road lane over
                let neighbor_is_road = state
                    .lanes
                    .get(&(lane.y + 1))
                    .is_some_and(|l| l.kind == LaneKind::Road);
                if neighbor_is_road {
                    let mut x = 4.0;
                    while x < w {
                        frame.fill_rect(
                            x,
                            screen_y + cell - 1.0,
                            10.0,
                            2.0,
                            faded(LANE_DASH, fade),
                        );
                        x += 24.0;
                    }
                }
            }

            LaneKind::Water => {
                frame.fill_rect(0.0, screen_y, w, cell, faded(WATER, fade));
                // Current stripes drift with the lane's flow
                let offset = (t * 18.0 * lane.flow as f32).rem_euclid(32.0);
                for row in [cell * 0.25, cell * 0.65] {
                    let shift = if row > cell * 0.5 { 16.0 } else { 0.0 };
                    let mut x = -32.0 + offset + shift;
                    while x < w {
                        frame.fill_rect(x, screen_y + row, 12.0, 2.0, faded(WATER_STRIPE, fade));
                        x += 32.0;
                    }
                }
            }

            LaneKind::Railroad => {
                frame.fill_rect(0.0, screen_y, w, cell, faded(BALLAST, fade));
                let mut x = 2.0;
                while x < w {
                    frame.fill_rect(x, screen_y + 4.0, 4.0, cell - 8.0, faded(TIE, fade));
                    x += 12.0;
                }
                for rail_y in [cell * 0.3, cell * 0.7] {
                    frame.fill_rect(0.0, screen_y + rail_y, w, 2.0, faded(RAIL, fade));
                }
            }
        }
    }

    fn draw_obstacles(
        &self,
        frame: &mut Frame,
        lane: &Lane,
        screen_y: f32,
        fade: f32,
        config: &GameConfig,
    ) {
        let cell = config.cell_size;
        for obstacle in &lane.obstacles {
            let key = match obstacle.kind {
                ObstacleKind::Car => {
                    if obstacle.id % 2 == 0 {
                        "car_0"
                    } else {
                        "car_1"
                    }
                }
                ObstacleKind::Truck => "truck",
                ObstacleKind::Train => "train",
                ObstacleKind::Log => "log",
            };
            let Some(sprite) = self.sprites.get(key) else {
                continue;
            };
            let x = (obstacle.left(cell)).round() as i32;
            let flip = obstacle.speed < 0.0;
            frame.blit(sprite, x, screen_y.round() as i32, flip, fade);
        }
    }

    fn draw_player(&self, frame: &mut Frame, state: &GameState, config: &GameConfig) {
        let cell = config.cell_size;
        let player = &state.player;
        let screen_x = player.pos.x;
        let screen_y = player.pos.y - state.camera.y;

        // The shadow stays on the ground through the whole hop arc
        frame.fill_ellipse(
            screen_x,
            screen_y + cell * 0.38,
            cell * 0.3,
            cell * 0.12,
            SHADOW,
        );

        let bob = if player.is_hopping() {
            (player.hop_progress.clamp(0.0, 1.0) * PI).sin() * cell * HOP_ARC
        } else {
            0.0
        };

        let key = player_sprite_key(player.facing, player.animation);
        if let Some(sprite) = self.sprites.get(key) {
            let x = (screen_x - cell / 2.0).round() as i32;
            let y = (screen_y - cell / 2.0 - bob).round() as i32;
            frame.blit(sprite, x, y, false, 1.0);
        }
    }

    fn draw_particles(&self, frame: &mut Frame, state: &GameState, cam_y: f32) {
        for p in &state.particles {
            let strength = (p.life / p.max_life).clamp(0.0, 1.0);
            let color = faded(p.color, strength);
            let x = p.pos.x;
            let y = p.pos.y - cam_y;

            if p.trail {
                if let Some(prev) = p.prev_pos {
                    let ghost = faded(p.color, strength * 0.4);
                    self.draw_particle_shape(frame, p.shape, prev.x, prev.y - cam_y, p, ghost);
                }
            }
            self.draw_particle_shape(frame, p.shape, x, y, p, color);
        }
    }

    fn draw_particle_shape(
        &self,
        frame: &mut Frame,
        shape: ParticleShape,
        x: f32,
        y: f32,
        p: &crate::sim::Particle,
        color: [u8; 4],
    ) {
        match shape {
            ParticleShape::Square => {
                frame.fill_rect(x - p.size / 2.0, y - p.size / 2.0, p.size, p.size, color);
            }
            ParticleShape::Circle => {
                frame.fill_circle(x, y, p.size / 2.0, color);
            }
            ParticleShape::Line => {
                let half = p.size;
                let (dx, dy) = (p.rotation.cos() * half, p.rotation.sin() * half);
                frame.draw_line(x - dx, y - dy, x + dx, y + dy, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::GameState;

    #[test]
    fn test_render_paints_the_board() {
        let config = GameConfig::default();
        let state = GameState::new(77, &config);
        let mut renderer = Renderer::new(&config);
        let mut frame = Frame::new(
            config.board_width() as u32,
            config.viewport_height() as u32,
        );

        renderer.render(&mut frame, &state, &config);

        let non_sky = frame
            .data()
            .chunks_exact(4)
            .filter(|px| px[0] != SKY[0] || px[1] != SKY[1] || px[2] != SKY[2])
            .count();
        assert!(non_sky > 0, "frame is entirely background");
    }

    #[test]
    fn test_render_does_not_mutate_state() {
        let config = GameConfig::default();
        let state = GameState::new(78, &config);
        let before = serde_json::to_string(&state).expect("serialize");

        let mut renderer = Renderer::new(&config);
        let mut frame = Frame::new(
            config.board_width() as u32,
            config.viewport_height() as u32,
        );
        renderer.render(&mut frame, &state, &config);
        renderer.render(&mut frame, &state, &config);

        let after = serde_json::to_string(&state).expect("serialize");
        assert_eq!(before, after);
    }

    #[test]
    fn test_fade_cache_tracks_live_lanes_only() {
        let config = GameConfig::default();
        let mut state = GameState::new(79, &config);
        let mut renderer = Renderer::new(&config);
        let mut frame = Frame::new(
            config.board_width() as u32,
            config.viewport_height() as u32,
        );

        renderer.render(&mut frame, &state, &config);
        assert!(!renderer.lane_first_seen.is_empty());

        // Drop a visible lane; the cache entry must go with it
        let gone = state.player.row;
        assert!(renderer.lane_first_seen.contains_key(&gone));
        state.lanes.remove(&gone);
        renderer.render(&mut frame, &state, &config);
        assert!(!renderer.lane_first_seen.contains_key(&gone));
    }
}
