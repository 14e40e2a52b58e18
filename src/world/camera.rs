//! Player view-point inside the grid.
//!
//! Position is fixed-point map-space; the facing is a floating direction
//! vector whose *magnitude* encodes the field of view (a longer vector means
//! a wider camera plane). The camera plane is always the −90° perpendicular
//! of the direction; it is derived, never stored, so the two can't drift.

use glam::{Vec2, vec2};

use crate::fixed::UFix8;
use crate::sprites::Bounds;

#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pos_x: UFix8,
    pos_y: UFix8,
    dir: Vec2,
}

impl Camera {
    /// Camera at `(x, y)` facing `angle` radians (0 = +X, counter-clockwise)
    /// with FOV scale `fov` (1.0 ≈ 90°).
    pub fn new(x: UFix8, y: UFix8, angle: f32, fov: f32) -> Self {
        let mut cam = Camera {
            pos_x: x,
            pos_y: y,
            dir: Vec2::X,
        };
        cam.set_direction(angle, fov);
        cam
    }

    #[inline]
    pub fn pos(&self) -> (UFix8, UFix8) {
        (self.pos_x, self.pos_y)
    }

    pub fn set_pos(&mut self, x: UFix8, y: UFix8) {
        self.pos_x = x;
        self.pos_y = y;
    }

    #[inline]
    pub fn dir(&self) -> Vec2 {
        self.dir
    }

    /// Camera plane: the direction rotated −90°. Its length tracks the
    /// direction's, which is what makes `dir`'s magnitude the FOV control.
    #[inline]
    pub fn plane(&self) -> Vec2 {
        vec2(self.dir.y, -self.dir.x)
    }

    pub fn set_direction(&mut self, angle: f32, fov: f32) {
        debug_assert!(fov > 0.0);
        let (s, c) = angle.sin_cos();
        self.dir = vec2(fov * c, fov * s);
    }

    /// Move by `forward` map-units along the facing and `strafe` along the
    /// camera plane, then rotate by `rotation` radians.
    ///
    /// Movement is validated **per axis**: the X-only candidate and the
    /// Y-only candidate are tested independently against the solidity
    /// predicate and every active solid bounds box. A blocked axis keeps
    /// its old coordinate while the other may still move, which is what
    /// lets the player slide along walls. Rotation never fails.
    pub fn move_and_rotate<F>(
        &mut self,
        forward: f32,
        strafe: f32,
        rotation: f32,
        is_solid: F,
        bounds: &[Bounds],
    ) where
        F: Fn(u8, u8) -> bool,
    {
        debug_assert!(self.dir != Vec2::ZERO, "camera direction degenerated");

        if forward != 0.0 || strafe != 0.0 {
            let plane = self.plane();
            let step = self.dir * forward + plane * strafe;

            let old_x = self.pos_x;
            let old_y = self.pos_y;
            let mut new_x = UFix8::from_f32(old_x.to_f32() + step.x);
            let mut new_y = UFix8::from_f32(old_y.to_f32() + step.y);

            if is_solid(new_x.int_part(), old_y.int_part()) {
                new_x = old_x;
            }
            if is_solid(old_x.int_part(), new_y.int_part()) {
                new_y = old_y;
            }

            for b in bounds.iter().filter(|b| b.blocks()) {
                if b.contains(new_x, old_y) {
                    new_x = old_x;
                }
                if b.contains(old_x, new_y) {
                    new_y = old_y;
                }
            }

            self.pos_x = new_x;
            self.pos_y = new_y;
        }

        if rotation != 0.0 {
            let (s, c) = rotation.sin_cos();
            self.dir = vec2(
                self.dir.x * c - self.dir.y * s,
                self.dir.x * s + self.dir.y * c,
            );
        }
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
