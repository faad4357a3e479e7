//! Central canvas UI: the interactive map.

use super::colors;
use crate::api::LatLng;
use crate::geo::{MapView, TileMap};
use crate::state::AppState;
use eframe::egui::{self, Align2, FontId, Painter, Pos2, Rect, RichText, Sense, Stroke, Vec2};
use geo_types::Coord;

/// Scroll distance (points) per zoom level.
const SCROLL_PER_ZOOM_STEP: f32 = 60.0;

/// Where double-click returns the view to.
pub struct HomeView {
    pub center: Coord<f64>,
    pub zoom: u8,
}

pub fn render_canvas(
    ctx: &egui::Context,
    state: &mut AppState,
    view: &mut MapView,
    tile_map: &mut TileMap,
    home: &HomeView,
) {
    egui::CentralPanel::default()
        .frame(egui::Frame::NONE)
        .show(ctx, |ui| {
            let available_size = ui.available_size();
            let (response, painter) = ui.allocate_painter(available_size, Sense::click_and_drag());
            let rect = response.rect;
            view.update(rect);

            handle_canvas_interaction(&response, state, view, home);

            tile_map.request_visible(ctx, view);
            tile_map.paint(&painter, view);

            if let Some(location) = state.selected_location {
                draw_marker(&painter, view.geo_to_screen(location.into()));
            }

            draw_overlay_info(ui, &rect, view, response.hover_pos());
            draw_attribution(&painter, &rect, tile_map);

            if tile_map.is_loading() {
                let spinner_rect =
                    Rect::from_min_size(rect.right_top() + Vec2::new(-30.0, 10.0), Vec2::splat(20.0));
                ui.put(spinner_rect, egui::Spinner::new());
            }
        });
}

fn handle_canvas_interaction(
    response: &egui::Response,
    state: &mut AppState,
    view: &mut MapView,
    home: &HomeView,
) {
    if response.dragged() {
        view.pan_by(response.drag_delta());
    }

    // Scroll zooms in whole levels around the cursor
    if response.hovered() {
        let scroll = response.ctx.input(|i| i.raw_scroll_delta.y);
        let id = response.id.with("scroll_accumulator");
        let accumulated = response.ctx.data_mut(|d| {
            let acc = d.get_temp_mut_or_default::<f32>(id);
            *acc += scroll;
            *acc
        });
        let steps = (accumulated / SCROLL_PER_ZOOM_STEP).trunc() as i32;
        if steps != 0 {
            if let Some(cursor_pos) = response.hover_pos() {
                view.zoom_at(cursor_pos, steps);
            }
            response.ctx.data_mut(|d| {
                d.insert_temp(id, accumulated - steps as f32 * SCROLL_PER_ZOOM_STEP)
            });
        }
    }

    if response.double_clicked() {
        view.set_view(home.center, home.zoom);
    } else if response.clicked() {
        if let Some(pos) = response.interact_pointer_pos() {
            let geo = view.screen_to_geo(pos);
            state.request_location_analysis(LatLng::from(geo));
        }
    }
}

fn draw_marker(painter: &Painter, pos: Pos2) {
    let tip = pos;
    let head = pos - Vec2::new(0.0, 18.0);
    painter.line_segment([head, tip], Stroke::new(2.0, colors::canvas::MARKER_OUTLINE));
    painter.circle(
        head,
        7.0,
        colors::canvas::MARKER,
        Stroke::new(2.0, colors::canvas::MARKER_OUTLINE),
    );
}

fn draw_overlay_info(ui: &mut egui::Ui, rect: &Rect, view: &MapView, hover: Option<Pos2>) {
    let overlay_pos = rect.left_top() + Vec2::new(10.0, 10.0);
    let overlay_rect = Rect::from_min_size(overlay_pos, Vec2::new(180.0, 60.0));

    ui.scope_builder(egui::UiBuilder::new().max_rect(overlay_rect), |ui| {
        egui::Frame::NONE
            .fill(colors::canvas::TEXT_BACKDROP)
            .inner_margin(6.0)
            .corner_radius(4.0)
            .show(ui, |ui| {
                ui.label(
                    RichText::new(format!("Zoom: {}", view.zoom))
                        .monospace()
                        .size(12.0)
                        .color(colors::canvas::TEXT),
                );
                if let Some(pos) = hover {
                    let geo = view.screen_to_geo(pos);
                    ui.label(
                        RichText::new(format!("{:.4}, {:.4}", geo.y, geo.x))
                            .monospace()
                            .size(12.0)
                            .color(colors::canvas::TEXT),
                    );
                }
            });
    });
}

fn draw_attribution(painter: &Painter, rect: &Rect, tile_map: &TileMap) {
    let galley = painter.layout_no_wrap(
        tile_map.basemap().attribution().to_string(),
        FontId::proportional(10.0),
        colors::canvas::TEXT,
    );
    let text_rect = Align2::RIGHT_BOTTOM.anchor_size(
        rect.right_bottom() - Vec2::new(6.0, 4.0),
        galley.size(),
    );
    painter.rect_filled(text_rect.expand(2.0), 2.0, colors::canvas::TEXT_BACKDROP);
    painter.galley(text_rect.min, galley, colors::canvas::TEXT);
}
