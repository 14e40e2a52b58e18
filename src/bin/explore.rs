//! First-person walkabout demo.
//!
//! Controls  W/S = forward/back A/D = strafe ←/→ = turn
//!           M = overhead map +/- = light Esc = quit
//!
//! ```bash
//! cargo run --release --bin explore
//! ```

use clap::Parser;
use minifb::{Key, Window, WindowOptions};

use monoray::fixed::{PackFix4, UFix8};
use monoray::render::{Framebuffer, Raycaster, RenderConfig, ShadePolarity, WallShading};
use monoray::sprites::{BoundsFlags, SizeClass, SpritePool};
use monoray::texture::Sheet;
use monoray::world::{Camera, EMPTY_TILE, Map};

const MOVE_SPEED: f32 = 0.045;
const TURN_SPEED: f32 = 0.035;

#[derive(Parser)]
#[command(about = "Walk around a dithered 1-bit maze")]
struct Args {
    /// View width in pixels (must be even)
    #[arg(long, default_value_t = 128)]
    width: u32,

    /// View height in pixels (must be a multiple of 8)
    #[arg(long, default_value_t = 64)]
    height: u32,

    /// Window pixels per view pixel
    #[arg(long, default_value_t = 8)]
    scale: u32,

    /// Initial light intensity
    #[arg(long, default_value_t = 1.5)]
    light: f32,

    /// Disable distance shading entirely
    #[arg(long)]
    no_shading: bool,

    /// White-fog look: shading fills pixels instead of clearing them
    #[arg(long)]
    lighten: bool,
}

// '#' outer wall, '%' inner wall, 'o' coin, 'P' pillar sprite, '.' floor
const LEVEL: &str = "\
################
#....%.....o...#
#.%..%..%%%%%..#
#.%..%..%...%..#
#.%..%..%.o.%..#
#.%.....%...%..#
#.%%%%..%%.%%..#
#..............#
#..%%%%%..%%%..#
#..%...%.o.%.o.#
#..%.P.%...%...#
#..%...%.%%%%..#
#..%%.%%.......#
#......%...P...#
#.o....%.......#
################";

fn build_level(pool: &mut SpritePool) -> Map {
    let rows: Vec<&str> = LEVEL.lines().collect();
    let h = rows.len() as u8;
    let w = rows[0].len() as u8;
    let mut cells = vec![EMPTY_TILE; w as usize * h as usize];

    for (ry, row) in rows.iter().enumerate() {
        for (x, c) in row.bytes().enumerate() {
            // Text rows run north to south; map rows south to north
            let y = h as usize - 1 - ry;
            let cx = PackFix4::from_f32(x as f32 + 0.5);
            let cy = PackFix4::from_f32(y as f32 + 0.5);
            match c {
                b'#' => cells[y * w as usize + x] = 1,
                b'%' => cells[y * w as usize + x] = 2,
                b'o' => {
                    // Floor-level coin with a pickup trigger around it
                    if let Some(sid) = pool.add_sprite_with_bounds(
                        cx,
                        cy,
                        COIN_FRAME,
                        SizeClass::Quarter,
                        12,
                        None,
                        PackFix4::from_f32(0.75),
                        false,
                    ) {
                        let bid = pool.sprite(sid).linked_bounds().unwrap();
                        pool.bounds_mut(bid).insert_flags(BoundsFlags::USER0);
                    }
                }
                b'P' => {
                    let _ = pool.add_sprite_with_bounds(
                        cx,
                        cy,
                        PILLAR_FRAME,
                        SizeClass::Normal,
                        0,
                        None,
                        PackFix4::from_f32(0.5),
                        true,
                    );
                }
                _ => {}
            }
        }
    }

    Map::new(cells, w, h).expect("level text must keep a closed border")
}

const PILLAR_FRAME: u8 = 0;
const COIN_FRAME: u8 = 1;

/// Brick for tile 1, weave for tile 2. Frame 0 pads the empty-tile index so
/// the wall pass can use the cell value as the frame directly.
fn wall_sheet() -> Sheet {
    let mut frames = [[0u16; 16]; 3];
    for x in 0..16usize {
        // Bricks: mortar rows 0 and 8, staggered vertical joints
        let joint = if x % 8 == 3 { 0x00FE } else { 0 } | if x % 8 == 7 { 0xFE00 } else { 0 };
        frames[1][x] = !(0x0101 | joint);
        // Basket weave
        frames[2][x] = if x % 4 < 2 { 0xF0F0 } else { 0x0F0F };
    }
    Sheet::from_strips(&frames)
}

/// Pillar and coin shapes with matching opacity masks.
fn sprite_sheets() -> (Sheet, Sheet) {
    let mut pixels = [[0u16; 16]; 2];
    let mut masks = [[0u16; 16]; 2];
    for x in 0..16usize {
        let dx = x as i32 - 8;
        // Pillar: full-height column, round at the edges, striped
        let half = if dx.abs() <= 5 { 16 } else { 12 - dx.abs() };
        if half > 0 {
            let top = (8 - half.min(8)) as u32;
            let span = (half.min(8) * 2) as u32;
            let mask = if span >= 16 {
                0xFFFFu16
            } else {
                (((1u32 << span) - 1) << top) as u16
            };
            masks[0][x] = mask;
            pixels[0][x] = mask & if x % 2 == 0 { 0xFFFF } else { 0x3FFC };
        }
        // Coin: small diamond
        let r = 5 - dx.abs();
        if r > 0 {
            let span = (r * 2) as u32;
            let mask = (((1u32 << span) - 1) << (8 - r) as u32) as u16;
            masks[1][x] = mask;
            pixels[1][x] = mask & 0x5A5A;
        }
    }
    (Sheet::from_strips(&pixels), Sheet::from_strips(&masks))
}

/// Expand the 1-bpp framebuffer into a scaled ARGB window buffer.
fn upscale(fb: &Framebuffer, scale: u32, out: &mut [u32]) {
    let w = fb.width();
    let out_w = (w * scale) as usize;
    for y in 0..fb.height() {
        for x in 0..w {
            let colour = if fb.pixel(x, y) { 0x00E8_E8D0 } else { 0x0010_1018 };
            for sy in 0..scale {
                let row = ((y * scale + sy) as usize) * out_w + (x * scale) as usize;
                out[row..row + scale as usize].fill(colour);
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = RenderConfig {
        wall_shading: if args.no_shading {
            WallShading::Off
        } else {
            WallShading::Full
        },
        alt_wall_shading: true,
        corner_shadows: true,
        polarity: if args.lighten {
            ShadePolarity::Lighten
        } else {
            ShadePolarity::Darken
        },
    };

    let mut rc = Raycaster::new(args.width, args.height, config)?;
    rc.set_light_intensity(args.light);

    let mut pool = SpritePool::new(16, 16);
    let map = build_level(&mut pool);
    let tiles = wall_sheet();
    let (sprite_pixels, sprite_mask) = sprite_sheets();

    let mut camera = Camera::new(
        UFix8::from_f32(1.5),
        UFix8::from_f32(1.5),
        std::f32::consts::FRAC_PI_4,
        1.0,
    );

    let mut fb = Framebuffer::new(args.width, args.height)?;
    let win_w = (args.width * args.scale) as usize;
    let win_h = (args.height * args.scale) as usize;
    let mut window = Window::new("explore", win_w, win_h, WindowOptions::default())?;
    window.set_target_fps(60);
    let mut buffer = vec![0u32; win_w * win_h];
    let mut coins = 0u32;

    while window.is_open() && !window.is_key_down(Key::Escape) {
        let mut forward = 0.0;
        let mut strafe = 0.0;
        let mut turn = 0.0;
        if window.is_key_down(Key::W) {
            forward += MOVE_SPEED;
        }
        if window.is_key_down(Key::S) {
            forward -= MOVE_SPEED;
        }
        if window.is_key_down(Key::A) {
            strafe -= MOVE_SPEED;
        }
        if window.is_key_down(Key::D) {
            strafe += MOVE_SPEED;
        }
        if window.is_key_down(Key::Left) {
            turn += TURN_SPEED;
        }
        if window.is_key_down(Key::Right) {
            turn -= TURN_SPEED;
        }
        if window.is_key_pressed(Key::Equal, minifb::KeyRepeat::No) {
            let light = (rc.light_intensity() + 0.25).min(8.0);
            rc.set_light_intensity(light);
        }
        if window.is_key_pressed(Key::Minus, minifb::KeyRepeat::No) {
            let light = (rc.light_intensity() - 0.25).max(0.25);
            rc.set_light_intensity(light);
        }

        camera.move_and_rotate(
            forward,
            strafe,
            turn,
            |x, y| map.is_solid(x, y),
            pool.bounds_slice(),
        );

        // Walking into a coin's trigger box collects it
        let (px, py) = camera.pos();
        if let Some(bid) = pool.first_colliding(px, py, BoundsFlags::USER0) {
            if let Some(sid) = pool.bounds(bid).linked_sprite() {
                pool.delete_linked(sid);
                coins += 1;
                window.set_title(&format!("explore ({coins} coins)"));
            }
        }

        rc.clear_view(&mut fb);
        rc.render_frame(
            &camera,
            &map,
            &tiles,
            &mut pool,
            &sprite_pixels,
            &sprite_mask,
            &mut fb,
        );
        if window.is_key_down(Key::M) {
            map.draw_overhead(&mut fb, 1, 1);
        }

        upscale(&fb, args.scale, &mut buffer);
        window.update_with_buffer(&buffer, win_w, win_h)?;
    }
    Ok(())
}
