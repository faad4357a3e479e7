//! The slippy map the dashboard draws: basemap tiles plus attached overlays.
//!
//! Tiles are downloaded on the [`TaskSpawner`], decoded off the UI thread and
//! handed back over a channel. `poll()` uploads finished tiles as textures and
//! reports overlay tiles that failed so the layer registry can count them.

use super::basemap::Basemap;
use super::projection::MapView;
use super::tile::{TileUrlTemplate, TILE_SIZE};
use super::tile_store::{TileEntry, TileKey, TileSource, TileStore};
use crate::api::ApiClient;
use crate::layers::{MapSurface, OverlayHandle, OverlayId};
use crate::task::TaskSpawner;
use eframe::egui::{self, Color32, ColorImage, Painter, Pos2, Rect, Stroke, TextureHandle};
use std::sync::mpsc::{channel, Receiver, Sender};

/// Minimum number of tiles kept in memory across all layers.
const TILE_CACHE_CAPACITY: usize = 512;

/// Cached tiles per tile on screen, so panning back finds them still loaded.
const CACHE_SCREENS: usize = 2;

/// Concurrent tile downloads.
const MAX_IN_FLIGHT: usize = 16;

const BACKGROUND: Color32 = Color32::from_rgb(18, 22, 30);
const PLACEHOLDER_FILL: Color32 = Color32::from_rgb(34, 38, 48);
const HATCH_COLOR: Color32 = Color32::from_rgb(70, 74, 86);

/// An overlay attached through [`MapSurface`].
struct AttachedOverlay {
    id: OverlayId,
    template: TileUrlTemplate,
    opacity: f32,
    max_zoom: u8,
}

/// Result of one tile download.
struct TileResult {
    key: TileKey,
    image: Result<ColorImage, String>,
}

/// Cache size that keeps every visible tile of every source resident.
fn cache_capacity_for(visible_tiles: usize, sources: usize) -> usize {
    (visible_tiles * sources * CACHE_SCREENS).max(TILE_CACHE_CAPACITY)
}

/// Decodes PNG or JPEG bytes into an RGBA image.
pub fn decode_tile(bytes: &[u8]) -> Result<ColorImage, String> {
    let decoded = image::load_from_memory(bytes).map_err(|e| e.to_string())?;
    let rgba = decoded.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Ok(ColorImage::from_rgba_unmultiplied(size, rgba.as_raw()))
}

/// Host map surface: fetches, caches and paints basemap and overlay tiles.
pub struct TileMap {
    client: ApiClient,
    spawner: TaskSpawner,
    basemap: Basemap,
    /// Attached overlays in activation order (bottom to top)
    overlays: Vec<AttachedOverlay>,
    tiles: TileStore<TextureHandle>,
    sender: Sender<TileResult>,
    receiver: Receiver<TileResult>,
}

impl TileMap {
    pub fn new(client: ApiClient, spawner: TaskSpawner, basemap: Basemap) -> Self {
        let (sender, receiver) = channel();
        Self {
            client,
            spawner,
            basemap,
            overlays: Vec::new(),
            tiles: TileStore::new(TILE_CACHE_CAPACITY),
            sender,
            receiver,
        }
    }

    pub fn basemap(&self) -> Basemap {
        self.basemap
    }

    /// Switches the basemap provider and drops the old provider's tiles.
    pub fn set_basemap(&mut self, basemap: Basemap) {
        if basemap == self.basemap {
            return;
        }
        log::info!("Basemap changed to {}", basemap.label());
        self.tiles.remove_source(TileSource::Basemap(self.basemap));
        self.basemap = basemap;
    }

    /// Number of overlays currently attached.
    pub fn overlay_count(&self) -> usize {
        self.overlays.len()
    }

    /// True while any tile download is outstanding.
    pub fn is_loading(&self) -> bool {
        self.tiles.in_flight() > 0
    }

    /// Starts downloads for visible tiles that are not cached yet.
    pub fn request_visible(&mut self, ctx: &egui::Context, view: &MapView) {
        let visible = view.visible_tiles();
        self.tiles
            .ensure_capacity(cache_capacity_for(visible.len(), self.overlay_count() + 1));

        let mut in_flight = self.tiles.in_flight();
        if in_flight >= MAX_IN_FLIGHT {
            return;
        }

        let mut sources = Vec::with_capacity(self.overlay_count() + 1);
        if view.zoom <= self.basemap.max_zoom() {
            sources.push((TileSource::Basemap(self.basemap), self.basemap.template()));
        }
        for overlay in &self.overlays {
            if view.zoom <= overlay.max_zoom {
                sources.push((TileSource::Overlay(overlay.id), overlay.template.clone()));
            }
        }

        for (tile, _) in &visible {
            for (source, template) in &sources {
                let key = TileKey::new(*source, *tile);
                if !self.tiles.mark_loading(key) {
                    continue;
                }
                self.spawn_fetch(ctx, key, template.expand(*tile));
                in_flight += 1;
                if in_flight >= MAX_IN_FLIGHT {
                    return;
                }
            }
        }
    }

    fn spawn_fetch(&self, ctx: &egui::Context, key: TileKey, url: String) {
        log::debug!("Fetching tile {} from {}", key.tile, url);
        let client = self.client.clone();
        let sender = self.sender.clone();
        let ctx = ctx.clone();
        self.spawner.spawn(async move {
            let image = match client.fetch_tile(&url).await {
                Ok(bytes) => decode_tile(&bytes),
                Err(e) => Err(e.to_string()),
            };
            let _ = sender.send(TileResult { key, image });
            ctx.request_repaint();
        });
    }

    /// Uploads finished tiles and returns the overlays whose tiles failed.
    ///
    /// Results for overlays detached since the request are dropped.
    pub fn poll(&mut self, ctx: &egui::Context) -> Vec<OverlayId> {
        let mut failed_overlays = Vec::new();

        while let Ok(TileResult { key, image }) = self.receiver.try_recv() {
            if !self.tiles.contains(&key) {
                log::debug!("Discarding tile {} for detached layer", key.tile);
                continue;
            }
            match image {
                Ok(image) => {
                    let texture = ctx.load_texture(
                        format!("tile-{:?}-{}", key.source, key.tile),
                        image,
                        egui::TextureOptions::LINEAR,
                    );
                    self.tiles.complete(key, Some(texture));
                }
                Err(e) => {
                    self.tiles.complete(key, None);
                    match key.source {
                        TileSource::Overlay(id) => {
                            log::debug!("Tile {} of {} failed: {}", key.tile, id, e);
                            failed_overlays.push(id);
                        }
                        TileSource::Basemap(basemap) => {
                            log::debug!("{} tile {} failed: {}", basemap.label(), key.tile, e);
                        }
                    }
                }
            }
        }

        let evicted = self.tiles.evict();
        if evicted > 0 {
            log::debug!("Evicted {} tiles, {} cached", evicted, self.tiles.len());
        }
        failed_overlays
    }

    /// Paints the basemap and overlays into the view's screen rectangle.
    pub fn paint(&mut self, painter: &Painter, view: &MapView) {
        painter.rect_filled(view.screen_rect, 0.0, BACKGROUND);

        let uv = Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));
        let visible = view.visible_tiles();

        let basemap = TileSource::Basemap(self.basemap);
        for (tile, rect) in &visible {
            match self.tiles.get(&TileKey::new(basemap, *tile)) {
                Some(TileEntry::Ready(texture)) => {
                    painter.image(texture.id(), *rect, uv, Color32::WHITE);
                }
                Some(TileEntry::Failed) => paint_failed_tile(painter, *rect),
                _ => {
                    painter.rect_filled(*rect, 0.0, PLACEHOLDER_FILL);
                }
            }
        }

        for overlay in &self.overlays {
            if view.zoom > overlay.max_zoom {
                continue;
            }
            let alpha = (overlay.opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
            let tint = Color32::from_white_alpha(alpha);
            let source = TileSource::Overlay(overlay.id);
            for (tile, rect) in &visible {
                match self.tiles.get(&TileKey::new(source, *tile)) {
                    Some(TileEntry::Ready(texture)) => {
                        painter.image(texture.id(), *rect, uv, tint);
                    }
                    Some(TileEntry::Failed) => paint_failed_tile(painter, *rect),
                    _ => {}
                }
            }
        }
    }
}

/// Diagonal hatching over a tile that could not be loaded.
fn paint_failed_tile(painter: &Painter, rect: Rect) {
    painter.rect_filled(rect, 0.0, PLACEHOLDER_FILL.gamma_multiply(0.6));
    let stroke = Stroke::new(1.0, HATCH_COLOR);
    let painter = painter.with_clip_rect(rect.intersect(painter.clip_rect()));
    let step = 16.0;
    let size = TILE_SIZE as f32;
    let mut offset = 0.0;
    while offset < size * 2.0 {
        let start = Pos2::new(rect.left() + offset, rect.top());
        let end = Pos2::new(rect.left() + offset - size, rect.bottom());
        painter.line_segment([start, end], stroke);
        offset += step;
    }
}

impl MapSurface for TileMap {
    fn attach(&mut self, overlay: &OverlayHandle) {
        log::debug!("Attaching {} ({})", overlay.id(), overlay.layer_id());
        self.overlays.push(AttachedOverlay {
            id: overlay.id(),
            template: overlay.template().clone(),
            opacity: overlay.opacity(),
            max_zoom: overlay.max_zoom(),
        });
    }

    fn detach(&mut self, overlay: OverlayId) {
        log::debug!("Detaching {}", overlay);
        self.overlays.retain(|attached| attached.id != overlay);
        self.tiles.remove_source(TileSource::Overlay(overlay));
    }

    fn set_overlay_opacity(&mut self, overlay: OverlayId, opacity: f32) {
        if let Some(attached) = self.overlays.iter_mut().find(|a| a.id == overlay) {
            attached.opacity = opacity;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn encode_png(width: u32, height: u32) -> Vec<u8> {
        let image = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 128]));
        let mut bytes = Cursor::new(Vec::new());
        image
            .write_to(&mut bytes, image::ImageFormat::Png)
            .unwrap();
        bytes.into_inner()
    }

    #[test]
    fn test_decode_tile_png() {
        let image = decode_tile(&encode_png(4, 2)).unwrap();
        assert_eq!(image.size, [4, 2]);
        assert_eq!(image.pixels.len(), 8);
    }

    #[test]
    fn test_attach_detach_tracks_overlays() {
        let spawner = TaskSpawner::new().unwrap();
        let mut map = TileMap::new(ApiClient::new("http://localhost:8000"), spawner, Basemap::Street);
        let template = TileUrlTemplate::parse("http://tiles.test/{z}/{x}/{y}.png").unwrap();
        let first = OverlayHandle::new(OverlayId(1), "flood", template.clone(), 0.7, 18);
        let second = OverlayHandle::new(OverlayId(2), "svi", template, 0.7, 18);

        map.attach(&first);
        map.attach(&second);
        map.set_overlay_opacity(OverlayId(2), 0.25);
        assert_eq!(map.overlay_count(), 2);
        assert_eq!(map.overlays[1].opacity, 0.25);

        map.detach(OverlayId(1));
        assert_eq!(map.overlay_count(), 1);
        assert_eq!(map.overlays[0].id, OverlayId(2));
        assert!(!map.is_loading());
    }

    #[test]
    fn test_decode_tile_rejects_garbage() {
        assert!(decode_tile(b"<html>not a tile</html>").is_err());
        assert!(decode_tile(&[]).is_err());
    }

    #[test]
    fn test_cache_holds_a_full_screen_of_every_source() {
        // A 4K canvas at zoom 11 shows well over a hundred tiles
        let mut view = MapView::new(geo_types::Coord { x: 76.9558, y: 11.0168 }, 11);
        view.update(Rect::from_min_size(Pos2::ZERO, egui::vec2(3840.0, 2160.0)));
        let visible = view.visible_tiles().len();

        // Basemap plus three overlays no longer fits the minimum
        let capacity = cache_capacity_for(visible, 4);
        assert!(visible * 4 > TILE_CACHE_CAPACITY);
        assert!(capacity >= visible * 4);

        assert_eq!(cache_capacity_for(20, 2), TILE_CACHE_CAPACITY);
    }

    #[test]
    fn test_visible_tiles_are_not_evicted() {
        let spawner = TaskSpawner::new().unwrap();
        let mut map = TileMap::new(ApiClient::new("http://127.0.0.1:1"), spawner, Basemap::Street);
        let template = TileUrlTemplate::parse("http://127.0.0.1:1/{z}/{x}/{y}.png").unwrap();
        for id in 1..=3 {
            map.attach(&OverlayHandle::new(OverlayId(id), "layer", template.clone(), 0.7, 18));
        }
        let mut view = MapView::new(geo_types::Coord { x: 76.9558, y: 11.0168 }, 11);
        view.update(Rect::from_min_size(Pos2::ZERO, egui::vec2(3840.0, 2160.0)));
        let ctx = egui::Context::default();
        map.request_visible(&ctx, &view);

        let visible = view.visible_tiles();
        let sources: Vec<TileSource> = std::iter::once(TileSource::Basemap(Basemap::Street))
            .chain((1..=3).map(|id| TileSource::Overlay(OverlayId(id))))
            .collect();
        for (tile, _) in &visible {
            for source in &sources {
                let key = TileKey::new(*source, *tile);
                if map.tiles.mark_loading(key) {
                    map.tiles.complete(key, None);
                }
            }
        }

        assert_eq!(map.tiles.evict(), 0);
        for (tile, _) in &visible {
            for source in &sources {
                assert!(map.tiles.contains(&TileKey::new(*source, *tile)));
            }
        }
    }
}
