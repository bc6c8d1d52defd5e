//! CPU raster rendering
//!
//! The renderer reads `GameState` and paints into an owned RGBA frame
//! buffer that the host presents. It keeps no gameplay state of its own,
//! only prerendered sprites and decorative caches.

pub mod draw;
pub mod frame;
pub mod sprites;

pub use draw::Renderer;
pub use frame::Frame;
pub use sprites::{Bitmap, SpriteCache, player_sprite_key};
