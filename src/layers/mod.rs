//! Overlay layer management.
//!
//! The analysis service describes the overlays it can render; the registry
//! tracks which of them are on the map.

mod overlay;
mod registry;

pub use overlay::{MapSurface, OverlayHandle, OverlayId};
pub use registry::{LayerRegistry, DEFAULT_OVERLAY_OPACITY};
