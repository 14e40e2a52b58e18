//! Render state and the 1-bpp framebuffer.
//!
//! The engine draws into a page-packed monochrome buffer: each byte holds
//! eight vertically stacked pixels of one column (bit 0 is the topmost row
//! of the page), pages run top to bottom. Wall and sprite compositors
//! depend on this layout to write whole bytes at a time.
//!
//! [`Raycaster`] owns everything with frame-or-longer lifetime: the view
//! dimensions, the shading configuration, the memoized light-intensity
//! derivations, and the half-resolution wall-distance cache that carries
//! occlusion data from the wall pass to the sprite pass *within one frame*.

pub mod shading;

mod column;
mod sprite_pass;
mod walls;

use thiserror::Error;

use crate::fixed::UFix8;
use crate::sprites::SpritePool;
use crate::texture::ColumnStore;
use crate::world::{Camera, Map};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("framebuffer {0}x{1} invalid: width must be nonzero, height a nonzero multiple of 8")]
    BadFramebufferSize(u32, u32),

    #[error("view {0}x{1} invalid: width must be nonzero and even, height a nonzero multiple of 8")]
    BadViewSize(u32, u32),
}

/*──────────────────────────── framebuffer ───────────────────────────*/

/// Bit-packed monochrome framebuffer, 8 rows per byte.
#[derive(Debug)]
pub struct Framebuffer {
    bits: Vec<u8>,
    width: u32,
    height: u32,
}

impl Framebuffer {
    pub fn new(width: u32, height: u32) -> Result<Self, RenderError> {
        if width == 0 || height == 0 || height % 8 != 0 {
            return Err(RenderError::BadFramebufferSize(width, height));
        }
        Ok(Framebuffer {
            bits: vec![0; (width * height / 8) as usize],
            width,
            height,
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn pages(&self) -> u32 {
        self.height >> 3
    }

    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bits
    }

    #[inline]
    pub(crate) fn bits_mut(&mut self) -> &mut [u8] {
        &mut self.bits
    }

    #[inline]
    pub(crate) fn byte_index(&self, page: u32, x: u32) -> usize {
        (page * self.width + x) as usize
    }

    pub fn clear(&mut self) {
        self.bits.fill(0);
    }

    /// Zero a region in fast whole-byte strokes. `y` is rounded down and
    /// `y2` up to the nearest page boundary, so the cleared box may be
    /// slightly taller than asked. `x2`/`y2` are exclusive.
    pub fn clear_region(&mut self, x: u32, y: u32, x2: u32, y2: u32) {
        let x2 = x2.min(self.width);
        let last_page = (y2 >> 3) + if y2 & 7 != 0 { 1 } else { 0 };
        for page in (y >> 3)..last_page.min(self.pages()) {
            let start = self.byte_index(page, x);
            let end = self.byte_index(page, x2);
            self.bits[start..end].fill(0);
        }
    }

    /// Single-pixel plot; silently ignores out-of-range coordinates.
    /// Debug-view quality, not used by the render path.
    pub fn set_pixel(&mut self, x: u32, y: u32, on: bool) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = self.byte_index(y >> 3, x);
        if on {
            self.bits[idx] |= 1 << (y & 7);
        } else {
            self.bits[idx] &= !(1 << (y & 7));
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> bool {
        let idx = self.byte_index(y >> 3, x);
        self.bits[idx] & (1 << (y & 7)) != 0
    }

    /// Copy a pre-packed background image over the view area. `src` uses
    /// the same page layout with `view_w` bytes per page row; underdraws
    /// if it holds fewer pages than the buffer.
    pub fn blit_background(&mut self, src: &[u8], view_w: u32) {
        let view_w = view_w.min(self.width) as usize;
        for page in 0..self.pages() {
            let s = page as usize * view_w;
            if s + view_w > src.len() {
                break;
            }
            let d = self.byte_index(page, 0);
            self.bits[d..d + view_w].copy_from_slice(&src[s..s + view_w]);
        }
    }
}

/*──────────────────────────── configuration ─────────────────────────*/

/// How much per-column shading work the wall pass does.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WallShading {
    /// Walls draw fully lit regardless of distance.
    Off,
    /// Shade recomputed for every column.
    Full,
    /// Shade recomputed on even columns only and reused for the next
    /// column; halves the shading cost for a barely visible artifact.
    HalfRes,
}

/// Whether distance shading eats lit pixels (black fog) or fills dark
/// pixels (white fog).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShadePolarity {
    Darken,
    Lighten,
}

/// Feature selection fixed at initialization. One code path per concern;
/// nothing here is consulted more than once per column.
#[derive(Clone, Copy, Debug)]
pub struct RenderConfig {
    pub wall_shading: WallShading,
    /// Draw odd columns of Y-side hits fully dark so the two wall
    /// orientations stay distinguishable on a 1-bit screen.
    pub alt_wall_shading: bool,
    /// Force the first uncovered row under a wall column dark, separating
    /// wall from floor.
    pub corner_shadows: bool,
    pub polarity: ShadePolarity,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            wall_shading: WallShading::Full,
            alt_wall_shading: true,
            corner_shadows: true,
            polarity: ShadePolarity::Darken,
        }
    }
}

/*──────────────────────────── render state ──────────────────────────*/

/// Raycasting engine state. One instance renders one view rectangle.
pub struct Raycaster {
    view_w: u32,
    view_h: u32,
    config: RenderConfig,

    light_intensity: f32,
    view_distance: UFix8,
    darkness: UFix8,

    /// Perpendicular wall distance per *pair* of columns, written by the
    /// wall pass and consumed by sprite occlusion in the same frame.
    /// Semantically stale the moment the next frame begins.
    dist_cache: Vec<UFix8>,
}

impl Raycaster {
    pub fn new(view_w: u32, view_h: u32, config: RenderConfig) -> Result<Self, RenderError> {
        if view_w == 0 || view_w % 2 != 0 || view_h == 0 || view_h % 8 != 0 {
            return Err(RenderError::BadViewSize(view_w, view_h));
        }
        let mut rc = Raycaster {
            view_w,
            view_h,
            config,
            light_intensity: 0.0,
            view_distance: UFix8::ZERO,
            darkness: UFix8::ZERO,
            dist_cache: vec![UFix8::ZERO; (view_w / 2) as usize],
        };
        rc.set_light_intensity(1.0);
        Ok(rc)
    }

    #[inline]
    pub fn view_width(&self) -> u32 {
        self.view_w
    }

    #[inline]
    pub fn view_height(&self) -> u32 {
        self.view_h
    }

    #[inline]
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Set the light level. Derives the view-distance cutoff and the
    /// darkness factor, both of which involve float math we refuse to pay
    /// per frame; the results are memoized and recomputed only when the
    /// intensity actually changes.
    pub fn set_light_intensity(&mut self, intensity: f32) {
        debug_assert!(intensity > 0.0, "light intensity must be positive");
        if intensity == self.light_intensity {
            return;
        }
        self.light_intensity = intensity;
        self.view_distance =
            UFix8::from_f32((shading::GRADIENTS as f32 * intensity).sqrt());
        self.darkness = UFix8::from_f32(1.0 / intensity);
    }

    #[inline]
    pub fn light_intensity(&self) -> f32 {
        self.light_intensity
    }

    /// Hard render cutoff in map units; rays are abandoned past this.
    #[inline]
    pub fn view_distance(&self) -> UFix8 {
        self.view_distance
    }

    #[inline]
    pub fn darkness(&self) -> UFix8 {
        self.darkness
    }

    /// The half-resolution wall-distance cache of the most recent wall
    /// pass. Entry `i` covers columns `2i` and `2i+1`.
    #[inline]
    pub fn dist_cache(&self) -> &[UFix8] {
        &self.dist_cache
    }

    /// Clear the view rectangle ahead of a frame.
    pub fn clear_view(&self, fb: &mut Framebuffer) {
        fb.clear_region(0, 0, self.view_w, self.view_h);
    }

    /// Render one complete frame: wall pass, sprite behaviors, sprite
    /// pass. Runs to completion with exclusive access to everything it
    /// touches, so there is no partial frame to observe.
    #[allow(clippy::too_many_arguments)]
    pub fn render_frame<T, S, M>(
        &mut self,
        camera: &Camera,
        map: &Map,
        tiles: &T,
        pool: &mut SpritePool,
        sprite_pixels: &S,
        sprite_mask: &M,
        fb: &mut Framebuffer,
    ) where
        T: ColumnStore,
        S: ColumnStore,
        M: ColumnStore,
    {
        debug_assert!(fb.width() >= self.view_w && fb.height() >= self.view_h);
        self.cast_walls(camera, map, tiles, fb);
        pool.run_behaviors();
        self.draw_sprites(camera, pool, sprite_pixels, sprite_mask, fb);
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
