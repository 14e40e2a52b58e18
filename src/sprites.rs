//! Billboard sprites, collision bounds, and the pool that owns both.
//!
//! Sprites are points in map space drawn as camera-facing squares; bounds
//! are axis-aligned boxes the player cannot walk through. Both live in
//! fixed-capacity slot arrays inside [`SpritePool`]: a slot is "free" when
//! inactive, and ids are plain slot indices, stable for the lifetime of the
//! occupant. A sprite and a bounds may be linked by id so game code can hop
//! from the box it collided with to the thing it represents.

use bitflags::bitflags;
use smallvec::SmallVec;

use crate::fixed::{PackFix4, UFix8};
use crate::texture::TILE_SIZE;
use crate::world::Camera;

/// Sprites closer than this to the camera plane are not drawn. Filters out
/// both sprites behind the camera and degenerate projections.
pub const MIN_SPRITE_DISTANCE: f32 = 0.2;

/// Slot index into the pool's sprite array.
pub type SpriteId = u8;
/// Slot index into the pool's bounds array.
pub type BoundsId = u8;

/// Per-frame mutation hook. Runs between the wall and sprite passes.
pub type SpriteBehavior = fn(&mut Sprite);

/// On-screen size of a sprite relative to a wall at the same distance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SizeClass {
    /// Half again as tall as a wall.
    Large,
    #[default]
    Normal,
    Half,
    Quarter,
}

impl SizeClass {
    #[inline]
    pub fn scale(self) -> f32 {
        match self {
            SizeClass::Large => 1.5,
            SizeClass::Normal => 1.0,
            SizeClass::Half => 0.5,
            SizeClass::Quarter => 0.25,
        }
    }
}

/// One drawable thing in the world.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sprite {
    pub x: PackFix4,
    pub y: PackFix4,
    /// Texture frame in the sprite sheet.
    pub frame: u8,
    pub size: SizeClass,
    /// Vertical offset in half-pixels at distance 1; positive pushes the
    /// sprite toward the floor.
    pub v_offset: i8,
    pub behavior: Option<SpriteBehavior>,
    active: bool,
    link: Option<BoundsId>,
}

impl Sprite {
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The bounds slot this sprite was created with, if any.
    #[inline]
    pub fn linked_bounds(&self) -> Option<BoundsId> {
        self.link
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct BoundsFlags: u8 {
        const ACTIVE = 1;
        /// Blocks player movement. Non-solid boxes are pure triggers.
        const SOLID = 1 << 1;
        /// Free for game-defined trigger tagging; the engine only ever
        /// matches these against the mask given to `first_colliding`.
        const USER0 = 1 << 6;
        const USER1 = 1 << 7;
    }
}

/// Axis-aligned collision box. Not necessarily tied to a sprite.
#[derive(Clone, Copy, Debug, Default)]
pub struct Bounds {
    x1: PackFix4,
    y1: PackFix4,
    x2: PackFix4,
    y2: PackFix4,
    flags: BoundsFlags,
    link: Option<SpriteId>,
}

impl Bounds {
    pub fn new(
        x1: PackFix4,
        y1: PackFix4,
        x2: PackFix4,
        y2: PackFix4,
        solid: bool,
    ) -> Self {
        let mut flags = BoundsFlags::ACTIVE;
        if solid {
            flags |= BoundsFlags::SOLID;
        }
        Bounds {
            x1,
            y1,
            x2,
            y2,
            flags,
            link: None,
        }
    }

    pub fn new_solid(x1: PackFix4, y1: PackFix4, x2: PackFix4, y2: PackFix4) -> Self {
        Bounds::new(x1, y1, x2, y2, true)
    }

    /// Strictly inside the box. Grazing an edge does not collide, so two
    /// boxes sharing an edge leave no dead zone between them.
    #[inline]
    pub fn contains(&self, x: UFix8, y: UFix8) -> bool {
        x > self.x1.widen() && x < self.x2.widen() && y > self.y1.widen() && y < self.y2.widen()
    }

    /// True when this box should stop the player.
    #[inline]
    pub fn blocks(&self) -> bool {
        self.flags.contains(BoundsFlags::ACTIVE | BoundsFlags::SOLID)
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.flags.contains(BoundsFlags::ACTIVE)
    }

    #[inline]
    pub fn flags(&self) -> BoundsFlags {
        self.flags
    }

    /// Tag the box with extra flags (usually `USER*` trigger bits).
    #[inline]
    pub fn insert_flags(&mut self, flags: BoundsFlags) {
        self.flags |= flags;
    }

    /// The sprite slot this box was created with, if any.
    #[inline]
    pub fn linked_sprite(&self) -> Option<SpriteId> {
        self.link
    }
}

/// A sprite id paired with its squared distance to the camera, in Q16.16.
#[derive(Clone, Copy, Debug)]
pub struct SortedSprite {
    pub id: SpriteId,
    pub dist2: u32,
}

/// Fixed-capacity owner of all sprites and bounds in a level.
pub struct SpritePool {
    sprites: Vec<Sprite>,
    bounds: Vec<Bounds>,
}

impl SpritePool {
    pub fn new(sprite_slots: u8, bounds_slots: u8) -> Self {
        SpritePool {
            sprites: vec![Sprite::default(); sprite_slots as usize],
            bounds: vec![Bounds::default(); bounds_slots as usize],
        }
    }

    #[inline]
    pub fn sprite(&self, id: SpriteId) -> &Sprite {
        &self.sprites[id as usize]
    }

    #[inline]
    pub fn sprite_mut(&mut self, id: SpriteId) -> &mut Sprite {
        &mut self.sprites[id as usize]
    }

    #[inline]
    pub fn bounds(&self, id: BoundsId) -> &Bounds {
        &self.bounds[id as usize]
    }

    #[inline]
    pub fn bounds_mut(&mut self, id: BoundsId) -> &mut Bounds {
        &mut self.bounds[id as usize]
    }

    /// All bounds slots, for movement validation. Inactive slots are
    /// harmless there: they never block.
    #[inline]
    pub fn bounds_slice(&self) -> &[Bounds] {
        &self.bounds
    }

    /// Claim the first free sprite slot. `None` when the pool is full.
    pub fn add_sprite(
        &mut self,
        x: PackFix4,
        y: PackFix4,
        frame: u8,
        size: SizeClass,
        v_offset: i8,
        behavior: Option<SpriteBehavior>,
    ) -> Option<SpriteId> {
        let id = self.sprites.iter().position(|s| !s.active)?;
        self.sprites[id] = Sprite {
            x,
            y,
            frame,
            size,
            v_offset,
            behavior,
            active: true,
            link: None,
        };
        Some(id as SpriteId)
    }

    /// Claim the first free bounds slot. `None` when the pool is full.
    pub fn add_bounds(
        &mut self,
        x1: PackFix4,
        y1: PackFix4,
        x2: PackFix4,
        y2: PackFix4,
        solid: bool,
    ) -> Option<BoundsId> {
        let id = self.bounds.iter().position(|b| !b.is_active())?;
        self.bounds[id] = Bounds::new(x1, y1, x2, y2, solid);
        Some(id as BoundsId)
    }

    /// Add a sprite together with a square collision box of side `extent`
    /// centered on it, linked both ways. Rolls the sprite back if the
    /// bounds pool is full, so failure leaves the pool untouched. The box
    /// does not follow the sprite afterwards.
    #[allow(clippy::too_many_arguments)]
    pub fn add_sprite_with_bounds(
        &mut self,
        x: PackFix4,
        y: PackFix4,
        frame: u8,
        size: SizeClass,
        v_offset: i8,
        behavior: Option<SpriteBehavior>,
        extent: PackFix4,
        solid: bool,
    ) -> Option<SpriteId> {
        let sid = self.add_sprite(x, y, frame, size, v_offset, behavior)?;
        let half = extent.widen().halved();
        let bid = self.add_bounds(
            (x.widen() - half).into(),
            (y.widen() - half).into(),
            (x.widen() + half).into(),
            (y.widen() + half).into(),
            solid,
        );
        match bid {
            Some(bid) => {
                self.sprites[sid as usize].link = Some(bid);
                self.bounds[bid as usize].link = Some(sid);
                Some(sid)
            }
            None => {
                self.delete_sprite(sid);
                None
            }
        }
    }

    /// Free a sprite slot. A linked bounds stays alive but loses its
    /// back-reference.
    pub fn delete_sprite(&mut self, id: SpriteId) {
        if let Some(bid) = self.sprites[id as usize].link {
            self.bounds[bid as usize].link = None;
        }
        self.sprites[id as usize] = Sprite::default();
    }

    /// Free a bounds slot; mirror of [`SpritePool::delete_sprite`].
    pub fn delete_bounds(&mut self, id: BoundsId) {
        if let Some(sid) = self.bounds[id as usize].link {
            self.sprites[sid as usize].link = None;
        }
        self.bounds[id as usize] = Bounds::default();
    }

    /// Free a sprite and its linked bounds in one step.
    pub fn delete_linked(&mut self, id: SpriteId) {
        if let Some(bid) = self.sprites[id as usize].link {
            self.bounds[bid as usize] = Bounds::default();
        }
        self.sprites[id as usize] = Sprite::default();
    }

    pub fn reset_sprites(&mut self) {
        self.sprites.fill(Sprite::default());
    }

    pub fn reset_bounds(&mut self) {
        self.bounds.fill(Bounds::default());
    }

    pub fn reset_all(&mut self) {
        self.reset_sprites();
        self.reset_bounds();
    }

    /// Run every active sprite's behavior hook.
    pub fn run_behaviors(&mut self) {
        for sprite in self.sprites.iter_mut().filter(|s| s.active) {
            if let Some(behavior) = sprite.behavior {
                behavior(sprite);
            }
        }
    }

    /// First active bounds containing the point, in slot order. An empty
    /// `mask` matches every active box; otherwise the box must share at
    /// least one flag with it.
    pub fn first_colliding(&self, x: UFix8, y: UFix8, mask: BoundsFlags) -> Option<BoundsId> {
        self.bounds.iter().enumerate().find_map(|(i, b)| {
            if !b.is_active() {
                return None;
            }
            if !mask.is_empty() && !b.flags.intersects(mask) {
                return None;
            }
            b.contains(x, y).then_some(i as BoundsId)
        })
    }

    /// Active sprites ordered farthest first, for painter's-algorithm
    /// drawing. Insertion sort: the active set is small and usually nearly
    /// sorted from the previous frame's ordering of the same slots.
    pub fn sorted_by_distance(&self, px: UFix8, py: UFix8) -> SmallVec<[SortedSprite; 16]> {
        let mut sorted: SmallVec<[SortedSprite; 16]> = SmallVec::new();
        for (i, sprite) in self.sprites.iter().enumerate() {
            if !sprite.active {
                continue;
            }
            let dx = sprite.x.widen().to_bits() as i32 - px.to_bits() as i32;
            let dy = sprite.y.widen().to_bits() as i32 - py.to_bits() as i32;
            let dist2 = (dx * dx + dy * dy) as u32;
            let at = sorted
                .iter()
                .position(|e| e.dist2 < dist2)
                .unwrap_or(sorted.len());
            sorted.insert(at, SortedSprite {
                id: i as SpriteId,
                dist2,
            });
        }
        sorted
    }
}

/*──────────────────────────── projection ────────────────────────────*/

/// Screen-space description of one sprite, ready for column drawing.
/// All ranges are clipped to the view; `tex_x`/`tex_y` are the texel
/// coordinates at the top-left of the *clipped* region.
#[derive(Clone, Copy, Debug)]
pub struct SpriteProjection {
    pub x_start: u32,
    pub x_end: u32,
    pub y_start: u32,
    pub y_end: u32,
    pub tex_x: UFix8,
    pub tex_y: UFix8,
    /// Texels per screen pixel, both axes (sprites are square).
    pub step: UFix8,
    /// Camera-plane depth, comparable with wall-distance cache entries.
    pub depth: UFix8,
}

/// Project a sprite into screen space.
///
/// Returns `None` for sprites behind the camera, closer than
/// [`MIN_SPRITE_DISTANCE`], or entirely outside the view. Depth is the
/// camera-plane component, the same measure the wall pass caches, so
/// occlusion is a plain comparison and there is no fisheye mismatch.
pub fn project(
    camera: &Camera,
    sprite: &Sprite,
    view_w: u32,
    view_h: u32,
) -> Option<SpriteProjection> {
    let (px, py) = camera.pos();
    let rel_x = sprite.x.widen().to_f32() - px.to_f32();
    let rel_y = sprite.y.widen().to_f32() - py.to_f32();

    let dir = camera.dir();
    let inv_det = 1.0 / dir.length_squared();

    let depth = inv_det * (dir.x * rel_x + dir.y * rel_y);
    if depth < MIN_SPRITE_DISTANCE {
        return None;
    }
    let lateral = inv_det * (dir.y * rel_x - dir.x * rel_y);

    // Center column of the sprite; i32 because a far-off-axis sprite can
    // project well outside the screen.
    let screen_x = ((view_w / 2) as f32 * (1.0 + lateral / depth)) as i32;

    let height = (view_h as f32 / depth * sprite.size.scale()) as i32;
    if height == 0 {
        return None;
    }
    let width = height; // square billboards

    let ss_x = screen_x - width / 2;
    let ss_xe = ss_x + width;
    if ss_xe < 0 || ss_x > view_w as i32 {
        return None;
    }

    let y_shift = if sprite.v_offset != 0 {
        (sprite.v_offset as f32 * 2.0 / depth) as i32
    } else {
        0
    };
    let ss_y = (view_h / 2) as i32 - height / 2 + y_shift;
    let ss_ye = ss_y + height;
    if ss_ye < 0 || ss_y > view_h as i32 {
        return None;
    }

    let x_start = ss_x.max(0) as u32;
    let x_end = ss_xe.min(view_w as i32) as u32;
    let y_start = ss_y.max(0) as u32;
    let y_end = ss_ye.min(view_h as i32) as u32;

    // One float division per sprite; everything per-column is fixed adds.
    let step = TILE_SIZE as f32 / height as f32;

    Some(SpriteProjection {
        x_start,
        x_end,
        y_start,
        y_end,
        tex_x: UFix8::from_f32((x_start as i32 - ss_x) as f32 * step),
        tex_y: UFix8::from_f32((y_start as i32 - ss_y) as f32 * step),
        step: UFix8::from_f32(step),
        depth: UFix8::from_f32(depth),
    })
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;

    fn pf(v: f32) -> PackFix4 {
        PackFix4::from_f32(v)
    }

    fn cam(x: f32, y: f32, angle: f32) -> Camera {
        Camera::new(UFix8::from_f32(x), UFix8::from_f32(y), angle, 1.0)
    }

    fn sprite_at(x: f32, y: f32) -> Sprite {
        Sprite {
            x: pf(x),
            y: pf(y),
            ..Sprite::default()
        }
    }

    #[test]
    fn pool_exhaustion_and_slot_reuse() {
        let mut pool = SpritePool::new(2, 2);
        let a = pool.add_sprite(pf(1.0), pf(1.0), 0, SizeClass::Normal, 0, None);
        let b = pool.add_sprite(pf(2.0), pf(2.0), 0, SizeClass::Normal, 0, None);
        assert_eq!((a, b), (Some(0), Some(1)));
        assert!(pool.add_sprite(pf(3.0), pf(3.0), 0, SizeClass::Normal, 0, None).is_none());

        pool.delete_sprite(0);
        assert_eq!(
            pool.add_sprite(pf(3.0), pf(3.0), 0, SizeClass::Normal, 0, None),
            Some(0)
        );
    }

    #[test]
    fn linked_add_rolls_back_on_full_bounds_pool() {
        let mut pool = SpritePool::new(4, 0);
        let id = pool.add_sprite_with_bounds(
            pf(2.0),
            pf(2.0),
            0,
            SizeClass::Normal,
            0,
            None,
            pf(1.0),
            true,
        );
        assert!(id.is_none());
        // Rollback freed the sprite slot
        assert!(!pool.sprite(0).is_active());
    }

    #[test]
    fn linked_pair_deletes_together() {
        let mut pool = SpritePool::new(2, 2);
        let sid = pool
            .add_sprite_with_bounds(
                pf(4.0),
                pf(4.0),
                1,
                SizeClass::Half,
                0,
                None,
                pf(1.0),
                true,
            )
            .unwrap();
        let bid = pool.sprite(sid).linked_bounds().unwrap();
        assert_eq!(pool.bounds(bid).linked_sprite(), Some(sid));
        // The box straddles the sprite center
        assert!(pool.bounds(bid).contains(
            UFix8::from_f32(4.0),
            UFix8::from_f32(4.0)
        ));

        pool.delete_linked(sid);
        assert!(!pool.sprite(sid).is_active());
        assert!(!pool.bounds(bid).is_active());
    }

    #[test]
    fn contains_is_strict_at_edges() {
        let b = Bounds::new_solid(pf(2.0), pf(2.0), pf(4.0), pf(4.0));
        let at = |x: f32, y: f32| b.contains(UFix8::from_f32(x), UFix8::from_f32(y));
        assert!(at(3.0, 3.0));
        assert!(!at(2.0, 3.0)); // on the edge: outside
        assert!(!at(4.0, 3.0));
        assert!(!at(3.0, 4.0));
    }

    #[test]
    fn first_colliding_respects_mask_and_order() {
        let mut pool = SpritePool::new(0, 4);
        pool.add_bounds(pf(1.0), pf(1.0), pf(3.0), pf(3.0), false); // trigger
        pool.add_bounds(pf(1.5), pf(1.5), pf(2.5), pf(2.5), true); // solid
        let p = UFix8::from_f32(2.0);

        // Empty mask: first active box in slot order wins
        assert_eq!(pool.first_colliding(p, p, BoundsFlags::empty()), Some(0));
        // Solid-only mask skips the trigger
        assert_eq!(pool.first_colliding(p, p, BoundsFlags::SOLID), Some(1));
        assert_eq!(
            pool.first_colliding(UFix8::from_f32(9.0), p, BoundsFlags::empty()),
            None
        );

        // User trigger bits filter the same way
        assert_eq!(pool.first_colliding(p, p, BoundsFlags::USER0), None);
        pool.bounds_mut(0).insert_flags(BoundsFlags::USER0);
        assert_eq!(pool.first_colliding(p, p, BoundsFlags::USER0), Some(0));
    }

    #[test]
    fn sort_is_farthest_first() {
        let mut pool = SpritePool::new(4, 0);
        pool.add_sprite(pf(2.0), pf(0.5), 0, SizeClass::Normal, 0, None);
        pool.add_sprite(pf(8.0), pf(0.5), 0, SizeClass::Normal, 0, None);
        pool.add_sprite(pf(5.0), pf(0.5), 0, SizeClass::Normal, 0, None);
        let sorted = pool.sorted_by_distance(UFix8::ZERO, UFix8::from_f32(0.5));
        let ids: Vec<_> = sorted.iter().map(|e| e.id).collect();
        assert_eq!(ids, [1, 2, 0]);
        assert!(sorted[0].dist2 > sorted[1].dist2);
    }

    #[test]
    fn behaviors_run_only_on_active_sprites() {
        fn spin(s: &mut Sprite) {
            s.frame += 1;
        }
        let mut pool = SpritePool::new(2, 0);
        pool.add_sprite(pf(1.0), pf(1.0), 0, SizeClass::Normal, 0, Some(spin));
        pool.add_sprite(pf(2.0), pf(2.0), 0, SizeClass::Normal, 0, Some(spin));
        pool.delete_sprite(1);
        pool.run_behaviors();
        pool.run_behaviors();
        assert_eq!(pool.sprite(0).frame, 2);
        assert_eq!(pool.sprite(1).frame, 0);
    }

    #[test]
    fn projection_straight_ahead() {
        // Camera at (2,4) facing +X, sprite 2 ahead: depth 2, centered.
        let camera = cam(2.0, 4.0, 0.0);
        let p = project(&camera, &sprite_at(4.0, 4.0), 64, 32).unwrap();
        assert!((p.depth.to_f32() - 2.0).abs() < 0.1);
        // height = 32 / 2 = 16 px, centered both ways
        assert_eq!((p.x_start, p.x_end), (24, 40));
        assert_eq!((p.y_start, p.y_end), (8, 24));
        // 16 texels over 16 pixels: unit step, no clipping offset
        assert!((p.step.to_f32() - 1.0).abs() < 0.01);
        assert_eq!(p.tex_x, UFix8::ZERO);
        assert_eq!(p.tex_y, UFix8::ZERO);
    }

    #[test]
    fn projection_rejects_behind_and_atop() {
        let camera = cam(5.0, 5.0, 0.0);
        assert!(project(&camera, &sprite_at(3.0, 5.0), 64, 32).is_none()); // behind
        assert!(project(&camera, &sprite_at(5.0, 5.0), 64, 32).is_none()); // atop
        assert!(project(&camera, &sprite_at(5.1, 5.0), 64, 32).is_none()); // too close
    }

    #[test]
    fn projection_clips_to_view_and_offsets_texels() {
        // Large sprite very close: wider than the screen, clipped on both
        // sides, texel origin shifted past the clipped columns.
        let camera = cam(2.0, 4.0, 0.0);
        let sprite = Sprite {
            size: SizeClass::Large,
            ..sprite_at(2.5, 4.0)
        };
        let p = project(&camera, &sprite, 64, 32).unwrap();
        assert_eq!(p.x_start, 0);
        assert_eq!(p.x_end, 64);
        assert!(p.tex_x > UFix8::ZERO, "left clip must skip texels");
    }

    #[test]
    fn v_offset_moves_sprite_down() {
        let camera = cam(2.0, 4.0, 0.0);
        let level = project(&camera, &sprite_at(4.0, 4.0), 64, 32).unwrap();
        let sprite = Sprite {
            v_offset: 4,
            ..sprite_at(4.0, 4.0)
        };
        let low = project(&camera, &sprite, 64, 32).unwrap();
        assert!(low.y_start > level.y_start);
        // Shift scales inversely with depth: 4 * 2 / 2 = 4 rows
        assert_eq!(low.y_start - level.y_start, 4);
    }
}
