mod camera;
mod map;

pub use camera::Camera;
pub use map::{EMPTY_TILE, MAX_MAP_DIM, Map, MapError};
