//! Engine configuration
//!
//! Every behavioral knob of the tick loop is parameterized through this
//! object; the balance tables (lane weights, run caps, speed ranges) are
//! compile-time constants alongside the generator.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Engine parameters, loaded once at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Size of one grid cell in pixels
    pub cell_size: f32,
    /// Board width in cells
    pub grid_columns: u32,
    /// Duration of one hop in seconds
    pub hop_duration: f32,
    /// Seconds of standing still before the run ends
    pub idle_timeout: f32,
    /// Rows the player may fall behind the furthest row reached
    pub back_death_distance: i32,
    /// Rows of look-ahead kept generated in front of the player
    pub generate_ahead: i32,
    /// Camera lerp factor per tick, 0..1
    pub camera_smoothing: f32,
    /// Simulation step in seconds
    pub fixed_timestep: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            cell_size: crate::consts::CELL_SIZE,
            grid_columns: crate::consts::GRID_COLUMNS,
            hop_duration: 0.12,
            idle_timeout: 7.0,
            back_death_distance: 5,
            generate_ahead: 14,
            camera_smoothing: 0.12,
            fixed_timestep: crate::consts::SIM_DT,
        }
    }
}

impl GameConfig {
    /// Board width in pixels
    pub fn board_width(&self) -> f32 {
        self.grid_columns as f32 * self.cell_size
    }

    /// Viewport height in pixels
    pub fn viewport_height(&self) -> f32 {
        crate::consts::VIEWPORT_ROWS as f32 * self.cell_size
    }

    /// Load from a JSON file, falling back to defaults on any failure.
    /// A missing file is the normal first-run case, not an error.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(config) => {
                    log::info!("Loaded config from {}", path.display());
                    config
                }
                Err(err) => {
                    log::warn!("Config {} is invalid ({}), using defaults", path.display(), err);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("No config at {}, using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Write the current config as pretty JSON
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)?;
        log::info!("Config saved to {}", path.display());
        Ok(())
    }
}
