//! Sprite rasterization and caching
//!
//! Sprites are authored as indexed-palette character grids and rasterized
//! once at startup into RGBA bitmaps, scaled to the configured cell size
//! with nearest-neighbor sampling. Lookups are by string key.

use std::collections::HashMap;

use crate::sim::{Facing, PlayerAnimation};

/// A rasterized RGBA sprite
#[derive(Debug, Clone)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Bitmap {
    /// Rasterize a character grid. Unknown characters are transparent.
    pub fn from_grid(rows: &[&str], palette: &[(char, [u8; 4])], scale: u32) -> Self {
        let grid_h = rows.len() as u32;
        let grid_w = rows.iter().map(|r| r.len()).max().unwrap_or(0) as u32;
        let width = grid_w * scale;
        let height = grid_h * scale;
        let mut data = vec![0u8; (width * height * 4) as usize];

        for (gy, row) in rows.iter().enumerate() {
            for (gx, ch) in row.chars().enumerate() {
                let color = palette
                    .iter()
                    .find(|(c, _)| *c == ch)
                    .map(|(_, rgba)| *rgba)
                    .unwrap_or([0, 0, 0, 0]);
                if color[3] == 0 {
                    continue;
                }
                for sy in 0..scale {
                    for sx in 0..scale {
                        let px = gx as u32 * scale + sx;
                        let py = gy as u32 * scale + sy;
                        let idx = ((py * width + px) * 4) as usize;
                        data[idx..idx + 4].copy_from_slice(&color);
                    }
                }
            }
        }

        Self {
            width,
            height,
            data,
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = ((y * self.width + x) * 4) as usize;
        [
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ]
    }

    /// Horizontally mirrored copy
    pub fn flipped_x(&self) -> Self {
        let mut flipped = self.clone();
        for y in 0..self.height {
            for x in 0..self.width {
                let src = self.pixel(self.width - 1 - x, y);
                let idx = ((y * flipped.width + x) * 4) as usize;
                flipped.data[idx..idx + 4].copy_from_slice(&src);
            }
        }
        flipped
    }
}

/// Shared palette for all sprite grids
const PALETTE: &[(char, [u8; 4])] = &[
    ('g', [96, 180, 70, 255]),   // body green
    ('G', [62, 130, 48, 255]),   // shaded green
    ('w', [240, 240, 240, 255]), // white
    ('k', [25, 25, 30, 255]),    // near-black
    ('r', [210, 60, 50, 255]),   // red paint
    ('b', [70, 110, 200, 255]),  // blue paint
    ('c', [150, 210, 235, 255]), // window glass
    ('o', [235, 160, 50, 255]),  // cab orange
    ('s', [150, 150, 160, 255]), // steel
    ('S', [95, 95, 105, 255]),   // dark steel
    ('n', [150, 105, 60, 255]),  // bark
    ('N', [110, 75, 40, 255]),   // dark bark
    ('y', [245, 215, 90, 255]),  // warning yellow
];

const HOPPER_IDLE_UP: &[&str] = &[
    ".k....k.",
    ".gggggg.",
    "gggggggg",
    "gGGggGGg",
    "gggggggg",
    ".gggggg.",
    ".gG..Gg.",
    ".gg..gg.",
];

const HOPPER_HOP_UP: &[&str] = &[
    ".k....k.",
    ".gggggg.",
    "gggggggg",
    "gGGggGGg",
    "gggggggg",
    ".gggggg.",
    "gg....gg",
    "g......g",
];

const HOPPER_IDLE_DOWN: &[&str] = &[
    ".gg..gg.",
    ".gG..Gg.",
    "gggggggg",
    "gwkggkwg",
    "gggggggg",
    "gGGGGGGg",
    ".gggggg.",
    ".gg..gg.",
];

const HOPPER_HOP_DOWN: &[&str] = &[
    ".gg..gg.",
    ".gG..Gg.",
    "gggggggg",
    "gwkggkwg",
    "gggggggg",
    "gGGGGGGg",
    "gg....gg",
    "g......g",
];

const HOPPER_IDLE_LEFT: &[&str] = &[
    "..kg....",
    ".ggggg..",
    "gwkggggg",
    "gggggggg",
    "gggggggg",
    ".gggggg.",
    ".gG..Gg.",
    ".gg..gg.",
];

const HOPPER_HOP_LEFT: &[&str] = &[
    "..kg....",
    ".ggggg..",
    "gwkggggg",
    "gggggggg",
    "gggggggg",
    ".gggggg.",
    "gg....gg",
    "g......g",
];

const HOPPER_DEATH: &[&str] = &[
    "........",
    ".S....S.",
    "..SSSS..",
    ".SwSSwS.",
    "..SSSS..",
    ".S.SS.S.",
    "..S..S..",
    "........",
];

const CAR_RED: &[&str] = &[
    "........",
    "........",
    "..rrrr..",
    ".rrccrr.",
    "rrrrrrrr",
    "rrrrrrrr",
    ".kk..kk.",
    "........",
];

const CAR_BLUE: &[&str] = &[
    "........",
    "........",
    "..bbbb..",
    ".bbccbb.",
    "bbbbbbbb",
    "bbbbbbbb",
    ".kk..kk.",
    "........",
];

const TRUCK: &[&str] = &[
    "................",
    ".sssssssssso....",
    ".swwwwwwwssoco..",
    ".sssssssssooco..",
    ".ssssssssssooo..",
    "ssssssssssssoo..",
    ".kk.......kk....",
    "................",
];

const TRAIN: &[&str] = &[
    "................................",
    "SSSSSSSSSSSSSSSSSSSSSSSSSSSSSSy.",
    "ScScScScScScScScScScScScScSSSyy.",
    "ScScScScScScScScScScScScScSSSyy.",
    "SSSSSSSSSSSSSSSSSSSSSSSSSSSSSyy.",
    "SSSSSSSSSSSSSSSSSSSSSSSSSSSSSSy.",
    ".kk...kk....kk....kk....kk..kk..",
    "................................",
];

const LOG: &[&str] = &[
    "........................",
    ".nnnnnnnnnnnnnnnnnnnnnn.",
    "nnNnnnnnNnnnnnnNnnnnnnnn",
    "nNnnnnnnnnNnnnnnnnNnnnnn",
    "nnnnnNnnnnnnnNnnnnnnnNnn",
    "nnNnnnnnnnNnnnnnnnNnnnnn",
    ".nnnnnnnnnnnnnnnnnnnnnn.",
    "........................",
];

/// Grid resolution sprites are authored at (pixels per cell)
const GRID: u32 = 8;

/// Prerendered sprites keyed by name
pub struct SpriteCache {
    sprites: HashMap<String, Bitmap>,
}

impl SpriteCache {
    /// Rasterize every sprite once, scaled so one authored cell covers one
    /// board cell.
    pub fn build(cell_size: f32) -> Self {
        let scale = (cell_size / GRID as f32).max(1.0) as u32;
        let mut sprites = HashMap::new();
        let mut put = |key: &str, rows: &[&str]| {
            sprites.insert(key.to_string(), Bitmap::from_grid(rows, PALETTE, scale));
        };

        put("player_idle_up", HOPPER_IDLE_UP);
        put("player_hop_up", HOPPER_HOP_UP);
        put("player_idle_down", HOPPER_IDLE_DOWN);
        put("player_hop_down", HOPPER_HOP_DOWN);
        put("player_idle_left", HOPPER_IDLE_LEFT);
        put("player_hop_left", HOPPER_HOP_LEFT);
        put("player_death", HOPPER_DEATH);
        put("car_0", CAR_RED);
        put("car_1", CAR_BLUE);
        put("truck", TRUCK);
        put("train", TRAIN);
        put("log", LOG);

        // Right-facing frames are mirrors of the left art
        let idle_right = sprites["player_idle_left"].flipped_x();
        let hop_right = sprites["player_hop_left"].flipped_x();
        sprites.insert("player_idle_right".to_string(), idle_right);
        sprites.insert("player_hop_right".to_string(), hop_right);

        Self { sprites }
    }

    pub fn get(&self, key: &str) -> Option<&Bitmap> {
        self.sprites.get(key)
    }
}

/// Sprite key for the player's current pose
pub fn player_sprite_key(facing: Facing, animation: PlayerAnimation) -> &'static str {
    match (animation, facing) {
        (PlayerAnimation::Death, _) => "player_death",
        (PlayerAnimation::Idle, Facing::Up) => "player_idle_up",
        (PlayerAnimation::Idle, Facing::Down) => "player_idle_down",
        (PlayerAnimation::Idle, Facing::Left) => "player_idle_left",
        (PlayerAnimation::Idle, Facing::Right) => "player_idle_right",
        (PlayerAnimation::Hop, Facing::Up) => "player_hop_up",
        (PlayerAnimation::Hop, Facing::Down) => "player_hop_down",
        (PlayerAnimation::Hop, Facing::Left) => "player_hop_left",
        (PlayerAnimation::Hop, Facing::Right) => "player_hop_right",
    }
}
