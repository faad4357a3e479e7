//! Overlay handles and the map surface they are attached to.

use crate::geo::TileUrlTemplate;
use std::fmt;

/// Unique identifier of one overlay instance.
///
/// Ids are never reused, so re-activating a layer yields a new id and late
/// results addressed to the old overlay can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OverlayId(pub(crate) u64);

impl fmt::Display for OverlayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "overlay#{}", self.0)
    }
}

/// A rendered tile overlay owned by the layer registry.
///
/// Not `Clone`: the registry holds the only handle for each active layer.
#[derive(Debug)]
pub struct OverlayHandle {
    id: OverlayId,
    layer_id: String,
    template: TileUrlTemplate,
    opacity: f32,
    max_zoom: u8,
    tile_errors: u32,
}

impl OverlayHandle {
    pub(crate) fn new(
        id: OverlayId,
        layer_id: impl Into<String>,
        template: TileUrlTemplate,
        opacity: f32,
        max_zoom: u8,
    ) -> Self {
        Self {
            id,
            layer_id: layer_id.into(),
            template,
            opacity,
            max_zoom,
            tile_errors: 0,
        }
    }

    pub fn id(&self) -> OverlayId {
        self.id
    }

    pub fn layer_id(&self) -> &str {
        &self.layer_id
    }

    pub fn template(&self) -> &TileUrlTemplate {
        &self.template
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn max_zoom(&self) -> u8 {
        self.max_zoom
    }

    /// Number of tiles that failed to load for this overlay.
    pub fn tile_errors(&self) -> u32 {
        self.tile_errors
    }

    pub(crate) fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity;
    }

    pub(crate) fn record_tile_error(&mut self) {
        self.tile_errors = self.tile_errors.saturating_add(1);
    }
}

/// The on-screen map that overlays are drawn onto.
///
/// The registry drives the surface through this trait only, which keeps the
/// bookkeeping independent of how tiles are fetched and painted.
pub trait MapSurface {
    /// Starts rendering an overlay.
    fn attach(&mut self, overlay: &OverlayHandle);

    /// Stops rendering an overlay and releases its tiles.
    fn detach(&mut self, overlay: OverlayId);

    /// Changes the opacity of an attached overlay.
    fn set_overlay_opacity(&mut self, overlay: OverlayId, opacity: f32);
}
