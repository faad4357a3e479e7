//! Layer registry: which server-described layers are currently drawn.
//!
//! The registry owns one [`OverlayHandle`] per active layer id. Handles are
//! created on activation and destroyed on deactivation or teardown, and every
//! change is mirrored onto the [`MapSurface`], so the active set and the
//! attached overlays always match one to one.

use super::overlay::{MapSurface, OverlayHandle, OverlayId};
use crate::api::LayerDescriptor;
use crate::geo::TileUrlTemplate;
use std::collections::{HashMap, HashSet};

/// Opacity applied to newly activated overlays.
pub const DEFAULT_OVERLAY_OPACITY: f32 = 0.7;

/// Highest zoom level overlay tiles are requested at.
pub const OVERLAY_MAX_ZOOM: u8 = 18;

/// Result of a [`LayerRegistry::toggle`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The layer was inactive and now has a live overlay.
    Activated(OverlayId),
    /// The layer was active and its overlay was destroyed.
    Deactivated(OverlayId),
    /// No descriptor exists for the id; nothing changed.
    Unknown,
    /// The descriptor's tile URL template is unusable; nothing changed.
    InvalidTemplate,
}

/// Descriptor catalog plus the overlays of the active layers.
pub struct LayerRegistry {
    /// Descriptors from the last successful fetch, in server order
    descriptors: Vec<LayerDescriptor>,
    /// Live overlays, keyed by layer id; the keys are the active set
    overlays: HashMap<String, OverlayHandle>,
    /// Next overlay id to hand out
    next_overlay_id: u64,
    /// Opacity for current and future overlays
    opacity: f32,
}

impl Default for LayerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerRegistry {
    pub fn new() -> Self {
        Self::with_opacity(DEFAULT_OVERLAY_OPACITY)
    }

    pub fn with_opacity(opacity: f32) -> Self {
        Self {
            descriptors: Vec::new(),
            overlays: HashMap::new(),
            next_overlay_id: 1,
            opacity: opacity.clamp(0.0, 1.0),
        }
    }

    /// Replaces the descriptor catalog with a freshly fetched one.
    ///
    /// Active layers missing from the new catalog are deactivated. Active
    /// layers whose tile template changed get a fresh overlay, rebuilt in
    /// their previous stacking order. Duplicate ids keep their first entry.
    pub fn set_descriptors<S: MapSurface + ?Sized>(
        &mut self,
        descriptors: Vec<LayerDescriptor>,
        surface: &mut S,
    ) {
        let mut seen = HashSet::new();
        let incoming: Vec<LayerDescriptor> = descriptors
            .into_iter()
            .filter(|descriptor| {
                let fresh = seen.insert(descriptor.id.clone());
                if !fresh {
                    log::warn!("Duplicate layer id {} in catalog, keeping the first", descriptor.id);
                }
                fresh
            })
            .collect();

        let mut stale = Vec::new();
        let mut changed = Vec::new();
        for (id, overlay) in &self.overlays {
            match incoming.iter().find(|descriptor| &descriptor.id == id) {
                None => stale.push(id.clone()),
                Some(descriptor)
                    if descriptor.tile_url_template.trim() != overlay.template().as_str() =>
                {
                    changed.push((overlay.id(), id.clone()))
                }
                Some(_) => {}
            }
        }
        changed.sort_unstable();

        self.descriptors = incoming;

        for id in stale {
            log::info!("Layer {} no longer offered, removing overlay", id);
            self.deactivate(&id, surface);
        }
        for (_, id) in changed {
            log::info!("Layer {} has a new tile template, rebuilding overlay", id);
            self.deactivate(&id, surface);
            self.activate(&id, surface);
        }

        log::info!(
            "Layer catalog updated: {} layer(s), {} active",
            self.descriptors.len(),
            self.overlays.len()
        );
    }

    /// Installs a fetched catalog and decides what is shown.
    ///
    /// With `requested` ids (restored from a shared link) exactly those that
    /// are not active yet get activated; otherwise the default layer is.
    /// Returns the requested ids that could not be activated.
    pub fn apply_catalog<S: MapSurface + ?Sized>(
        &mut self,
        descriptors: Vec<LayerDescriptor>,
        requested: Option<Vec<String>>,
        surface: &mut S,
    ) -> Vec<String> {
        self.set_descriptors(descriptors, surface);

        let Some(requested) = requested else {
            self.activate_default(surface);
            return Vec::new();
        };

        let mut rejected = Vec::new();
        for id in requested {
            if self.is_active(&id) {
                continue;
            }
            if !matches!(self.activate(&id, surface), ToggleOutcome::Activated(_)) {
                rejected.push(id);
            }
        }
        rejected
    }

    /// Flips a layer between active and inactive.
    ///
    /// Unknown ids are a no-op.
    pub fn toggle<S: MapSurface + ?Sized>(&mut self, id: &str, surface: &mut S) -> ToggleOutcome {
        if let Some(overlay_id) = self.deactivate(id, surface) {
            return ToggleOutcome::Deactivated(overlay_id);
        }
        self.activate(id, surface)
    }

    /// Activates the first layer the server listed when the catalog is
    /// non-empty and nothing is active yet.
    pub fn activate_default<S: MapSurface + ?Sized>(&mut self, surface: &mut S) -> Option<OverlayId> {
        if !self.overlays.is_empty() {
            return None;
        }
        let first = self.descriptors.first()?.id.clone();
        match self.activate(&first, surface) {
            ToggleOutcome::Activated(overlay_id) => Some(overlay_id),
            _ => None,
        }
    }

    /// Destroys every overlay and clears the active set.
    pub fn teardown<S: MapSurface + ?Sized>(&mut self, surface: &mut S) {
        let count = self.overlays.len();
        for (_, overlay) in self.overlays.drain() {
            surface.detach(overlay.id());
        }
        if count > 0 {
            log::info!("Tore down {} overlay(s)", count);
        }
    }

    /// Notes a failed tile for an overlay. The layer stays active.
    ///
    /// Returns false when the overlay is no longer live.
    pub fn record_tile_error(&mut self, overlay_id: OverlayId) -> bool {
        match self
            .overlays
            .values_mut()
            .find(|overlay| overlay.id() == overlay_id)
        {
            Some(overlay) => {
                overlay.record_tile_error();
                log::warn!(
                    "Tile failed for layer {} ({} failure(s) so far)",
                    overlay.layer_id(),
                    overlay.tile_errors()
                );
                true
            }
            None => {
                log::debug!("Ignoring tile error for detached {}", overlay_id);
                false
            }
        }
    }

    /// Sets the opacity of all current and future overlays.
    pub fn set_opacity<S: MapSurface + ?Sized>(&mut self, opacity: f32, surface: &mut S) {
        let opacity = opacity.clamp(0.0, 1.0);
        self.opacity = opacity;
        for overlay in self.overlays.values_mut() {
            overlay.set_opacity(opacity);
            surface.set_overlay_opacity(overlay.id(), opacity);
        }
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.overlays.contains_key(id)
    }

    /// Active layer ids, sorted.
    pub fn active_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.overlays.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn active_count(&self) -> usize {
        self.overlays.len()
    }

    /// All known descriptors, in the order the server listed them.
    pub fn descriptors(&self) -> impl Iterator<Item = &LayerDescriptor> {
        self.descriptors.iter()
    }

    pub fn has_descriptors(&self) -> bool {
        !self.descriptors.is_empty()
    }

    pub fn overlay(&self, id: &str) -> Option<&OverlayHandle> {
        self.overlays.get(id)
    }

    fn activate<S: MapSurface + ?Sized>(&mut self, id: &str, surface: &mut S) -> ToggleOutcome {
        let Some(descriptor) = self.descriptors.iter().find(|descriptor| descriptor.id == id) else {
            log::debug!("Toggle for unknown layer {} ignored", id);
            return ToggleOutcome::Unknown;
        };

        let template = match TileUrlTemplate::parse(&descriptor.tile_url_template) {
            Ok(template) => template,
            Err(e) => {
                log::warn!("Cannot activate layer {}: {}", id, e);
                return ToggleOutcome::InvalidTemplate;
            }
        };

        let overlay_id = OverlayId(self.next_overlay_id);
        self.next_overlay_id += 1;

        let overlay = OverlayHandle::new(overlay_id, id, template, self.opacity, OVERLAY_MAX_ZOOM);
        surface.attach(&overlay);
        self.overlays.insert(id.to_string(), overlay);

        log::info!("Added layer {} ({})", id, overlay_id);
        ToggleOutcome::Activated(overlay_id)
    }

    fn deactivate<S: MapSurface + ?Sized>(&mut self, id: &str, surface: &mut S) -> Option<OverlayId> {
        let overlay = self.overlays.remove(id)?;
        surface.detach(overlay.id());
        log::info!("Removed layer {} ({})", id, overlay.id());
        Some(overlay.id())
    }
}
