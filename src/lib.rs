//! Monochrome fixed-point grid raycaster with billboard sprites.
//!
//! Renders a tile-grid world into a 1-bit page-packed framebuffer: DDA wall
//! casting with ordered-dither distance shading, then depth-sorted sprites
//! occluded per column against the wall distances. The frame path is
//! division-free: one reciprocal per wall column, one per visible sprite,
//! everything else fixed-point adds.
//!
//! ```no_run
//! use monoray::fixed::UFix8;
//! use monoray::render::{Framebuffer, Raycaster, RenderConfig};
//! use monoray::sprites::SpritePool;
//! use monoray::texture::Sheet;
//! use monoray::world::{Camera, Map, EMPTY_TILE};
//!
//! let map = Map::bordered(10, 1, EMPTY_TILE).unwrap();
//! let tiles = Sheet::uniform(0xAAAA);
//! let sprites = Sheet::uniform(0xFFFF);
//! let camera = Camera::new(UFix8::from_f32(5.0), UFix8::from_f32(5.0), 0.0, 1.0);
//! let mut pool = SpritePool::new(8, 8);
//!
//! let mut rc = Raycaster::new(128, 64, RenderConfig::default()).unwrap();
//! let mut fb = Framebuffer::new(128, 64).unwrap();
//! rc.render_frame(&camera, &map, &tiles, &mut pool, &sprites, &sprites, &mut fb);
//! ```

pub mod fixed;
pub mod render;
pub mod sprites;
pub mod texture;
pub mod world;
