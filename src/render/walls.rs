//! Per-column DDA wall raycaster.
//!
//! For every screen column a ray marches the tile grid one cell boundary at
//! a time, alternating between the X and Y axis depending on which crossing
//! is nearer, until it lands in a non-empty cell or runs past the view
//! distance. The per-axis step deltas come from the reciprocal table, so
//! the whole march is fixed-point adds and compares.
//!
//! The march itself never bounds-checks cell coordinates; termination
//! inside the grid is the [`Map`] solid-border invariant, enforced at map
//! construction.

use crate::fixed::{IFix8, MAX_FIXED, NEAR_ZERO, UFix8, recip_near_unit};
use crate::texture::{ColumnStore, TILE_SIZE};
use crate::world::{Camera, EMPTY_TILE, Map};

use super::{Framebuffer, Raycaster, WallShading, column, shading};

/// Which grid-line family the DDA crossed last.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    X,
    Y,
}

/// Last texture column fetched by the wall pass. Consecutive columns very
/// often hit the same tile at the same texel, and skipping the re-read is
/// cheaper than the store access. Lives for exactly one wall pass.
struct TexCache {
    tile: u8,
    tex_x: u8,
    strip: u16,
}

impl Raycaster {
    /// Cast one wall column per view column into `fb`, filling the
    /// distance cache as a side effect. Columns whose ray exceeds the
    /// view distance draw nothing but still record their distance.
    pub fn cast_walls<T: ColumnStore>(
        &mut self,
        camera: &Camera,
        map: &Map,
        tiles: &T,
        fb: &mut Framebuffer,
    ) {
        let (pos_x, pos_y) = camera.pos();
        let pmap_x = pos_x.int_part();
        let pmap_y = pos_y.int_part();
        let ofs_x = pos_x.fract();
        let ofs_y = pos_y.fract();
        let fpos_x = pos_x.to_f32();
        let fpos_y = pos_y.to_f32();

        let dir = camera.dir();
        let plane = camera.plane();

        let darkness = self.darkness;
        let view_distance = self.view_distance;
        let inv_width2 = 2.0 / self.view_w as f32;

        let mut cache = TexCache {
            tile: EMPTY_TILE,
            tex_x: 0,
            strip: 0,
        };
        let mut shade = 0u8;

        for x in 0..self.view_w {
            // Column -> camera-space x in [-1, 1)
            let camera_x = x as f32 * inv_width2 - 1.0;
            let ray_x = dir.x + plane.x * camera_x;
            let ray_y = dir.y + plane.y * camera_x;

            let rx = IFix8::from_f32(ray_x);
            let ry = IFix8::from_f32(ray_y);

            // Step deltas: distance along the ray between two crossings of
            // the same axis. A component under NEAR_ZERO means the ray is
            // axis-aligned enough that this axis never steps, which is
            // also what keeps the reciprocal table in its legal domain.
            let mut delta_x = rx.abs_ufix();
            let mut delta_y = ry.abs_ufix();

            let mut side_x = MAX_FIXED;
            let mut side_y = MAX_FIXED;
            let mut step_x = 0i8;
            let mut step_y = 0i8;

            if delta_x > NEAR_ZERO {
                delta_x = recip_near_unit(delta_x);
                if rx.is_negative() {
                    step_x = -1;
                    side_x = ofs_x * delta_x;
                } else {
                    step_x = 1;
                    side_x = (UFix8::ONE - ofs_x) * delta_x;
                }
            }
            if delta_y > NEAR_ZERO {
                delta_y = recip_near_unit(delta_y);
                if ry.is_negative() {
                    step_y = -1;
                    side_y = ofs_y * delta_y;
                } else {
                    step_y = 1;
                    side_y = (UFix8::ONE - ofs_y) * delta_y;
                }
            }

            let mut map_x = pmap_x;
            let mut map_y = pmap_y;
            let mut side;
            let mut perp;
            let mut tile;

            // DDA march. `side_dist` already is distance along the ray,
            // so the perpendicular distance is simply the accumulator
            // value *before* the winning step; no Euclidean correction,
            // which is exactly what avoids fisheye.
            loop {
                if side_x < side_y {
                    perp = side_x;
                    side_x += delta_x;
                    map_x = map_x.wrapping_add_signed(step_x);
                    side = Side::X;
                } else {
                    perp = side_y;
                    side_y += delta_y;
                    map_y = map_y.wrapping_add_signed(step_y);
                    side = Side::Y;
                }
                tile = map.tile(map_x, map_y);
                if perp >= view_distance || tile != EMPTY_TILE {
                    break;
                }
            }

            // Half-resolution cache: one distance per column pair. Sprites
            // may clip a pixel into walls for it, but it halves the cache.
            if x & 1 == 0 {
                self.dist_cache[(x >> 1) as usize] = perp;
                if self.config.wall_shading == WallShading::HalfRes {
                    shade = shading::shade_for(perp, x, darkness);
                }
            }

            match self.config.wall_shading {
                WallShading::Full => shade = shading::shade_for(perp, x, darkness),
                WallShading::Off => shade = 0xFF,
                WallShading::HalfRes => {} // computed on even columns above
            }

            // Darken odd columns of Y-side hits so the two wall
            // orientations read differently in pure black and white.
            if self.config.alt_wall_shading && side == Side::Y && x & 1 != 0 {
                shade = 0;
            }

            // Ray gave up within view distance: nothing to draw here.
            if tile == EMPTY_TILE {
                continue;
            }

            // Texture column: fractional hit coordinate along the axis
            // that was NOT stepped, mirrored by ray sign so both faces of
            // a wall read the texture the same way.
            let perp_f = perp.to_f32();
            let mut wall_x = match side {
                Side::Y => fpos_x + perp_f * ray_x,
                Side::X => fpos_y + perp_f * ray_y,
            };
            wall_x -= wall_x.floor();
            let mut tex_x = (wall_x * TILE_SIZE as f32) as u8;
            if (side == Side::X && ray_x > 0.0) || (side == Side::Y && ray_y < 0.0) {
                tex_x = TILE_SIZE - 1 - tex_x;
            }

            if tile != cache.tile || tex_x != cache.tex_x {
                cache.strip = tiles.column(tile, tex_x);
                cache.tile = tile;
                cache.tex_x = tex_x;
            }

            column::draw_wall_column(
                fb,
                x,
                perp,
                shade,
                cache.strip,
                self.view_h,
                self.config.polarity,
                self.config.corner_shadows,
            );
        }
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RenderConfig;
    use crate::texture::Sheet;
    use std::f32::consts::TAU;

    fn room(dim: u8) -> Map {
        Map::bordered(dim, 1, EMPTY_TILE).unwrap()
    }

    fn plain_tiles() -> Sheet {
        // Frame 0 unused (EMPTY), frame 1 solid white
        Sheet::from_strips(&[[0u16; 16], [0xFFFFu16; 16]])
    }

    fn caster(w: u32, h: u32) -> (Raycaster, Framebuffer) {
        (
            Raycaster::new(w, h, RenderConfig::default()).unwrap(),
            Framebuffer::new(w, h).unwrap(),
        )
    }

    fn cam(x: f32, y: f32, angle: f32) -> Camera {
        Camera::new(UFix8::from_f32(x), UFix8::from_f32(y), angle, 1.0)
    }

    #[test]
    fn dda_terminates_from_any_pose() {
        // Sweep positions and headings over a bordered map; the march must
        // stop at the border (or the cutoff) for every single column.
        let map = room(8);
        let (mut rc, mut fb) = caster(32, 32);
        let tiles = plain_tiles();
        rc.set_light_intensity(16.0); // view distance 16: beyond the map
        for ix in 1..7 {
            for iy in 1..7 {
                for step in 0..16 {
                    let camera =
                        cam(ix as f32 + 0.5, iy as f32 + 0.5, step as f32 * TAU / 16.0);
                    rc.cast_walls(&camera, &map, &tiles, &mut fb);
                    for (i, d) in rc.dist_cache().iter().enumerate() {
                        assert!(
                            d.to_f32() <= 11.0, // 8x8 room diagonal, padded
                            "column pair {i} claims distance {}",
                            d.to_f32()
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn center_column_measures_perpendicular_distance() {
        let map = room(10);
        let (mut rc, mut fb) = caster(64, 32);
        rc.set_light_intensity(16.0);
        let tiles = plain_tiles();
        // Facing +X from (2.5, 5.0): wall plane sits at x = 9
        let camera = cam(2.5, 5.0, 0.0);
        rc.cast_walls(&camera, &map, &tiles, &mut fb);
        let mid = rc.dist_cache()[rc.dist_cache().len() / 2].to_f32();
        assert!(
            (mid - 6.5).abs() < 0.2,
            "expected ~6.5 map units, got {mid}"
        );
    }

    #[test]
    fn distance_never_decreases_moving_away() {
        let map = room(12);
        let (mut rc, mut fb) = caster(32, 32);
        rc.set_light_intensity(16.0);
        let tiles = plain_tiles();
        let mut last = 0.0f32;
        // Walk backwards from the east wall along the ray direction
        for i in 0..6 {
            let camera = cam(9.5 - i as f32 * 1.25, 6.0, 0.0);
            rc.cast_walls(&camera, &map, &tiles, &mut fb);
            let d = rc.dist_cache()[rc.dist_cache().len() / 2].to_f32();
            assert!(
                d >= last - 0.05,
                "distance shrank from {last} to {d} while retreating"
            );
            last = d;
        }
    }

    #[test]
    fn past_view_distance_draws_nothing_but_caches_distance() {
        let map = room(16);
        let (mut rc, mut fb) = caster(32, 32);
        rc.set_light_intensity(0.25); // view distance = 2 map units
        let tiles = plain_tiles();
        let camera = cam(8.0, 8.0, 0.0); // nearest wall ~7 away
        rc.cast_walls(&camera, &map, &tiles, &mut fb);
        assert!(fb.bytes().iter().all(|&b| b == 0), "no wall may be drawn");
        for d in rc.dist_cache() {
            assert!(d.to_f32() >= 2.0, "cache must hold the cutoff distance");
        }
    }

    #[test]
    fn near_wall_fills_center_of_column() {
        let map = room(8);
        let (mut rc, mut fb) = caster(32, 32);
        let tiles = plain_tiles();
        let camera = cam(5.5, 4.0, 0.0); // wall at x=7, 1.5 units out
        rc.cast_walls(&camera, &map, &tiles, &mut fb);
        // Middle rows of the center column must be lit (solid texture,
        // bright shade at 1.5 units with default light).
        let cx = 16;
        assert!(fb.pixel(cx, 15) || fb.pixel(cx, 16), "wall center missing");
    }

    #[test]
    fn half_res_shading_matches_full_on_even_columns() {
        // HalfRes computes the dither shade on even columns and reuses it
        // for the odd neighbour, so even columns must be pixel-identical
        // to Full while odd ones pick up the neighbour's Bayer phase.
        let map = room(12);
        let tiles = plain_tiles();
        let full_cfg = RenderConfig {
            alt_wall_shading: false,
            corner_shadows: false,
            ..RenderConfig::default()
        };
        let half_cfg = RenderConfig {
            wall_shading: WallShading::HalfRes,
            ..full_cfg
        };
        let mut full = Raycaster::new(32, 32, full_cfg).unwrap();
        let mut half = Raycaster::new(32, 32, half_cfg).unwrap();
        let mut fb_full = Framebuffer::new(32, 32).unwrap();
        let mut fb_half = Framebuffer::new(32, 32).unwrap();
        // Wall 3.5 units out with default light: a mid-gradient dither
        // whose four column bytes differ, so reuse is observable.
        let camera = cam(7.5, 6.0, 0.0);
        full.cast_walls(&camera, &map, &tiles, &mut fb_full);
        half.cast_walls(&camera, &map, &tiles, &mut fb_half);

        let mut odd_diffs = 0u32;
        for x in 0..32 {
            for y in 0..32 {
                if x & 1 == 0 {
                    assert_eq!(
                        fb_half.pixel(x, y),
                        fb_full.pixel(x, y),
                        "even column {x} row {y} diverged"
                    );
                } else if fb_half.pixel(x, y) != fb_full.pixel(x, y) {
                    odd_diffs += 1;
                }
            }
        }
        assert!(odd_diffs > 0, "odd columns never reused the even shade");
        assert_eq!(full.dist_cache(), half.dist_cache());
    }

    #[test]
    fn flat_wall_distances_are_symmetric() {
        // Heading exactly east at a flat wall: perpendicular distance is
        // constant across the wall, so the cache reads the same mirrored
        // around the view center (up to fixed-point error).
        let map = room(8);
        let (mut rc, mut fb) = caster(32, 32);
        rc.set_light_intensity(16.0);
        let tiles = plain_tiles();
        let camera = cam(4.5, 4.5, 0.0);
        rc.cast_walls(&camera, &map, &tiles, &mut fb);
        let cache = rc.dist_cache();
        let n = cache.len();
        for i in 0..n / 2 {
            let a = cache[i].to_f32();
            let b = cache[n - 1 - i].to_f32();
            assert!(
                (a - b).abs() < 0.35,
                "columns {i}/{} asymmetric: {a} vs {b}",
                n - 1 - i
            );
        }
    }
}
