//! Map projection and coordinate transformation.
//!
//! Handles converting between geographic coordinates (lat/lon) and screen
//! coordinates using spherical Web Mercator, the projection every tile
//! server in the dashboard renders in.

use super::tile::{TileId, MAX_LATITUDE, TILE_SIZE};
use eframe::egui::{Pos2, Rect, Vec2};
use geo_types::Coord;
use std::f64::consts::PI;

/// Lowest zoom level the map allows.
pub const MIN_ZOOM: u8 = 1;
/// Highest zoom level the map allows.
pub const MAX_ZOOM: u8 = 18;

/// Width of the whole world in pixels at a zoom level.
fn world_size(zoom: u8) -> f64 {
    TILE_SIZE * f64::from(1u32 << zoom)
}

/// Projects (lon, lat) to world pixel coordinates at a zoom level.
fn project(coord: Coord<f64>, zoom: u8) -> (f64, f64) {
    let size = world_size(zoom);
    let lat = coord.y.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = (coord.x + 180.0) / 360.0 * size;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * size;
    (x, y)
}

/// Inverse of [`project`].
fn unproject(x: f64, y: f64, zoom: u8) -> Coord<f64> {
    let size = world_size(zoom);
    let lon = x / size * 360.0 - 180.0;
    let lat = (PI * (1.0 - 2.0 * y / size)).sinh().atan().to_degrees();
    Coord { x: lon, y: lat }
}

/// Normalizes a longitude into `[-180, 180)`.
fn wrap_longitude(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

/// The visible portion of the map: center, zoom and the canvas rectangle.
#[derive(Debug, Clone)]
pub struct MapView {
    /// Geographic center of the view (x = lon, y = lat)
    pub center: Coord<f64>,
    /// Integer zoom level
    pub zoom: u8,
    /// Screen rectangle for the canvas
    pub screen_rect: Rect,
}

impl MapView {
    pub fn new(center: Coord<f64>, zoom: u8) -> Self {
        Self {
            center,
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            screen_rect: Rect::from_min_size(Pos2::ZERO, Vec2::new(800.0, 600.0)),
        }
    }

    /// Updates the canvas rectangle for the current frame.
    pub fn update(&mut self, screen_rect: Rect) {
        self.screen_rect = screen_rect;
    }

    /// Moves the view to a new center and zoom.
    pub fn set_view(&mut self, center: Coord<f64>, zoom: u8) {
        self.center = center;
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Converts geographic coordinates (lon, lat) to a screen position.
    pub fn geo_to_screen(&self, coord: Coord<f64>) -> Pos2 {
        let (cx, cy) = project(self.center, self.zoom);
        let (x, y) = project(coord, self.zoom);
        let origin = self.screen_rect.center();
        Pos2::new(origin.x + (x - cx) as f32, origin.y + (y - cy) as f32)
    }

    /// Converts a screen position to geographic coordinates (lon, lat).
    pub fn screen_to_geo(&self, pos: Pos2) -> Coord<f64> {
        let (cx, cy) = project(self.center, self.zoom);
        let offset = pos - self.screen_rect.center();
        let geo = unproject(cx + offset.x as f64, cy + offset.y as f64, self.zoom);
        Coord {
            x: wrap_longitude(geo.x),
            y: geo.y,
        }
    }

    /// Returns every tile intersecting the canvas with its screen rectangle.
    ///
    /// Tiles repeat horizontally across the antimeridian, so the same
    /// [`TileId`] can appear more than once at low zoom.
    pub fn visible_tiles(&self) -> Vec<(TileId, Rect)> {
        let (cx, cy) = project(self.center, self.zoom);
        let half = self.screen_rect.size() / 2.0;
        let left = cx - half.x as f64;
        let top = cy - half.y as f64;
        let right = cx + half.x as f64;
        let bottom = cy + half.y as f64;

        let first_col = (left / TILE_SIZE).floor() as i64;
        let last_col = ((right - 1.0) / TILE_SIZE).floor() as i64;
        let first_row = (top / TILE_SIZE).floor() as i64;
        let last_row = ((bottom - 1.0) / TILE_SIZE).floor() as i64;

        let origin = self.screen_rect.center();
        let mut tiles = Vec::new();
        for row in first_row..=last_row {
            for col in first_col..=last_col {
                let Some(tile) = TileId::wrapping(self.zoom, col, row) else {
                    continue;
                };
                let min = Pos2::new(
                    origin.x + (col as f64 * TILE_SIZE - cx) as f32,
                    origin.y + (row as f64 * TILE_SIZE - cy) as f32,
                );
                let rect = Rect::from_min_size(min, Vec2::splat(TILE_SIZE as f32));
                tiles.push((tile, rect));
            }
        }
        tiles
    }

    /// Pans the map by a screen-space drag delta.
    pub fn pan_by(&mut self, delta: Vec2) {
        let size = world_size(self.zoom);
        let (cx, cy) = project(self.center, self.zoom);
        let y = (cy - delta.y as f64).clamp(0.0, size);
        let geo = unproject(cx - delta.x as f64, y, self.zoom);
        self.center = Coord {
            x: wrap_longitude(geo.x),
            y: geo.y,
        };
    }

    /// Changes zoom by `steps` levels while keeping the point under `anchor` fixed.
    pub fn zoom_at(&mut self, anchor: Pos2, steps: i32) {
        let new_zoom = (i32::from(self.zoom) + steps).clamp(MIN_ZOOM as i32, MAX_ZOOM as i32) as u8;
        if new_zoom == self.zoom {
            return;
        }

        let anchored = self.screen_to_geo(anchor);
        let offset = anchor - self.screen_rect.center();
        let (ax, ay) = project(anchored, new_zoom);
        let geo = unproject(ax - offset.x as f64, ay - offset.y as f64, new_zoom);

        self.zoom = new_zoom;
        self.center = Coord {
            x: wrap_longitude(geo.x),
            y: geo.y.clamp(-MAX_LATITUDE, MAX_LATITUDE),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view_at(lon: f64, lat: f64, zoom: u8) -> MapView {
        let mut view = MapView::new(Coord { x: lon, y: lat }, zoom);
        view.update(Rect::from_min_size(Pos2::ZERO, Vec2::new(512.0, 512.0)));
        view
    }

    #[test]
    fn test_center_maps_to_canvas_center() {
        let view = view_at(76.9558, 11.0168, 11);
        let pos = view.geo_to_screen(view.center);
        assert!((pos.x - 256.0).abs() < 1e-3);
        assert!((pos.y - 256.0).abs() < 1e-3);
    }

    #[test]
    fn test_screen_geo_round_trip() {
        let view = view_at(-80.19, 25.76, 9);
        let pos = Pos2::new(100.0, 400.0);
        let geo = view.screen_to_geo(pos);
        let back = view.geo_to_screen(geo);
        assert!((back.x - pos.x).abs() < 0.01);
        assert!((back.y - pos.y).abs() < 0.01);
    }

    #[test]
    fn test_visible_tiles_at_zoom_one() {
        let view = view_at(0.0, 0.0, 1);
        let mut tiles: Vec<TileId> = view.visible_tiles().into_iter().map(|(t, _)| t).collect();
        tiles.sort();
        assert_eq!(
            tiles,
            vec![
                TileId::new(1, 0, 0),
                TileId::new(1, 0, 1),
                TileId::new(1, 1, 0),
                TileId::new(1, 1, 1),
            ]
        );

        let (_, rect) = view
            .visible_tiles()
            .into_iter()
            .find(|(t, _)| *t == TileId::new(1, 0, 0))
            .unwrap();
        assert_eq!(rect.min, Pos2::ZERO);
        assert_eq!(rect.max, Pos2::new(256.0, 256.0));
    }

    #[test]
    fn test_visible_tiles_skip_rows_beyond_poles() {
        let view = view_at(0.0, 84.0, 1);
        assert!(view.visible_tiles().iter().all(|(t, _)| t.y < 2));
    }

    #[test]
    fn test_pan_moves_center() {
        let mut view = view_at(0.0, 0.0, 3);
        view.pan_by(Vec2::new(-256.0, 0.0));
        // One tile at zoom 3 spans 45 degrees of longitude
        assert!((view.center.x - 45.0).abs() < 1e-6);
        assert!(view.center.y.abs() < 1e-6);
    }

    #[test]
    fn test_pan_wraps_longitude() {
        let mut view = view_at(170.0, 0.0, 3);
        view.pan_by(Vec2::new(-256.0, 0.0));
        assert!((view.center.x + 145.0).abs() < 1e-6);
    }

    #[test]
    fn test_zoom_at_keeps_anchor_fixed() {
        let mut view = view_at(76.9558, 11.0168, 10);
        let anchor = Pos2::new(400.0, 120.0);
        let before = view.screen_to_geo(anchor);

        view.zoom_at(anchor, 1);
        assert_eq!(view.zoom, 11);

        let after = view.screen_to_geo(anchor);
        assert!((before.x - after.x).abs() < 1e-6);
        assert!((before.y - after.y).abs() < 1e-6);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut view = view_at(0.0, 0.0, MAX_ZOOM);
        view.zoom_at(Pos2::new(10.0, 10.0), 3);
        assert_eq!(view.zoom, MAX_ZOOM);

        view.set_view(Coord { x: 0.0, y: 0.0 }, 0);
        assert_eq!(view.zoom, MIN_ZOOM);
    }
}
