//! Slippy-map tiles, projection and the map surface overlays render onto.

mod basemap;
mod projection;
mod tile;
mod tile_map;
mod tile_store;

pub use basemap::Basemap;
pub use projection::{MapView, MAX_ZOOM, MIN_ZOOM};
pub use tile::TileUrlTemplate;
pub use tile_map::TileMap;
