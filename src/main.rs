//! Lane Hopper entry point
//!
//! Native host: opens a window, presents the CPU-rendered frame buffer,
//! and drives the simulation once per displayed frame with a clamped
//! delta. Input events only ever append to the action queue; all draining
//! happens inside the tick on this same thread.

use std::error::Error;
use std::path::Path;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use glam::Vec2;
use pixels::{Pixels, SurfaceTexture};
use winit::dpi::LogicalSize;
use winit::event::{ElementState, Event, KeyboardInput, TouchPhase, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;

use lane_hopper::consts::MAX_FRAME_DELTA;
use lane_hopper::render::{Frame, Renderer};
use lane_hopper::sim::{self, GameEvent, GamePhase, GameState};
use lane_hopper::{GameConfig, HighScores, input};

const CONFIG_PATH: &str = "lane-hopper-config.json";
const SCORES_PATH: &str = "lane-hopper-scores.json";
/// Window pixels per buffer pixel
const WINDOW_SCALE: u32 = 2;

fn unix_millis() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as f64)
        .unwrap_or(0.0)
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    log::info!("Lane Hopper starting...");

    let config = GameConfig::load(Path::new(CONFIG_PATH));
    let mut highscores = HighScores::load(Path::new(SCORES_PATH));

    let seed = unix_millis() as u64;
    let mut state = GameState::new(seed, &config);
    if let Some(best) = highscores.top_score() {
        state.high_score = best;
    }
    log::info!("Game initialized with seed: {}", seed);

    let frame_w = config.board_width() as u32;
    let frame_h = config.viewport_height() as u32;

    let event_loop = EventLoop::new();
    let window = WindowBuilder::new()
        .with_title("Lane Hopper")
        .with_inner_size(LogicalSize::new(
            frame_w * WINDOW_SCALE,
            frame_h * WINDOW_SCALE,
        ))
        .build(&event_loop)?;

    let window_size = window.inner_size();
    let surface_texture = SurfaceTexture::new(window_size.width, window_size.height, &window);
    let mut pixels = Pixels::new(frame_w, frame_h, surface_texture)?;

    let mut renderer = Renderer::new(&config);
    let mut frame = Frame::new(frame_w, frame_h);
    let mut events: Vec<GameEvent> = Vec::new();
    let mut last_time = Instant::now();
    let mut touch_start: Option<Vec2> = None;

    log::info!("Lane Hopper running!");

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => {
                    *control_flow = ControlFlow::Exit;
                }
                WindowEvent::Resized(size) => {
                    if pixels.resize_surface(size.width, size.height).is_err() {
                        log::error!("Surface resize failed");
                        *control_flow = ControlFlow::Exit;
                    }
                }
                WindowEvent::Focused(false) => {
                    // Auto-pause when the window loses focus mid-run
                    if state.phase == GamePhase::Playing {
                        state.action_queue.push_back(sim::Action::Pause);
                        log::info!("Auto-paused (focus lost)");
                    }
                }
                WindowEvent::KeyboardInput {
                    input:
                        KeyboardInput {
                            state: ElementState::Pressed,
                            virtual_keycode: Some(key),
                            ..
                        },
                    ..
                } => {
                    if let Some(action) = input::action_for_key(key) {
                        state.action_queue.push_back(action);
                    }
                }
                WindowEvent::Touch(touch) => {
                    let at = Vec2::new(touch.location.x as f32, touch.location.y as f32);
                    match touch.phase {
                        TouchPhase::Started => touch_start = Some(at),
                        TouchPhase::Ended => {
                            if let Some(start) = touch_start.take() {
                                state
                                    .action_queue
                                    .push_back(input::action_for_gesture(start, at));
                            }
                        }
                        TouchPhase::Cancelled => touch_start = None,
                        TouchPhase::Moved => {}
                    }
                }
                _ => {}
            },

            Event::MainEventsCleared => {
                let now = Instant::now();
                let dt = now.duration_since(last_time).as_secs_f32().min(MAX_FRAME_DELTA);
                last_time = now;

                events.clear();
                sim::tick(&mut state, dt, &config, &mut events);
                for event in events.drain(..) {
                    handle_event(event, &state, &mut highscores);
                }

                renderer.render(&mut frame, &state, &config);
                pixels.frame_mut().copy_from_slice(frame.data());
                if let Err(err) = pixels.render() {
                    log::error!("Render failed: {}", err);
                    *control_flow = ControlFlow::Exit;
                }
                window.request_redraw();
            }

            _ => {}
        }
    });

    #[allow(unreachable_code)]
    Ok(())
}

/// React to one simulation side effect. Persistence failures are logged
/// inside `HighScores` and never reach the simulation.
fn handle_event(event: GameEvent, state: &GameState, highscores: &mut HighScores) {
    match event {
        GameEvent::ScoreChanged { score } => {
            log::debug!("score {}", score);
        }
        GameEvent::LevelUp { level } => {
            log::info!("reached level {}", level);
        }
        GameEvent::PhaseChanged { phase } => {
            log::debug!("phase -> {:?}", phase);
        }
        GameEvent::Hop => {}
        GameEvent::Death { cause, score } => {
            if let Some(rank) = highscores.add_score(score, state.level, cause, unix_millis()) {
                log::info!("run ranked #{} ({} rows)", rank, score);
            }
            highscores.save(Path::new(SCORES_PATH));
        }
    }
}
