//! Sprite compositing pass: projection, ordering, occlusion.
//!
//! Runs strictly after the wall pass of the same frame, because per-column
//! occlusion reads the distance cache the walls just wrote. Sprites are
//! drawn farthest first so nearer ones overpaint, and a column is skipped
//! entirely when the wall there is closer than the sprite's depth.

use crate::sprites::{self, SpritePool};
use crate::texture::{ColumnStore, TILE_SIZE};
use crate::world::Camera;

use super::{Framebuffer, Raycaster, column};

impl Raycaster {
    /// Draw every active sprite over the walls already in `fb`.
    ///
    /// `pixels` and `mask` are parallel sheets: the mask strip selects
    /// which texels of the pixel strip are opaque. The distance cache must
    /// hold this frame's wall pass.
    pub fn draw_sprites<S, M>(
        &self,
        camera: &Camera,
        pool: &SpritePool,
        pixels: &S,
        mask: &M,
        fb: &mut Framebuffer,
    ) where
        S: ColumnStore,
        M: ColumnStore,
    {
        let (px, py) = camera.pos();

        for entry in pool.sorted_by_distance(px, py) {
            let sprite = pool.sprite(entry.id);
            let Some(proj) = sprites::project(camera, sprite, self.view_w, self.view_h)
            else {
                continue;
            };

            let mut tex_x = proj.tex_x;
            for x in proj.x_start..proj.x_end {
                // Occluded columns still advance the texel cursor.
                if proj.depth < self.dist_cache[(x >> 1) as usize] {
                    let tx = tex_x.int_part().min(TILE_SIZE - 1);
                    column::draw_sprite_column(
                        fb,
                        x,
                        proj.y_start,
                        proj.y_end,
                        pixels.column(sprite.frame, tx),
                        mask.column(sprite.frame, tx),
                        proj.tex_y,
                        proj.step,
                    );
                }
                tex_x += proj.step;
            }
        }
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
