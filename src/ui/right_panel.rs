//! Right panel UI: overlay layers, map settings, and legend.

use super::colors;
use crate::geo::Basemap;
use crate::layers::LayerRegistry;
use crate::state::AppState;
use eframe::egui::{self, RichText, ScrollArea};
use egui_phosphor::regular as icons;

pub fn render_right_panel(
    ctx: &egui::Context,
    state: &mut AppState,
    registry: &LayerRegistry,
    layers_pending: bool,
) {
    egui::SidePanel::right("right_panel")
        .resizable(true)
        .default_width(240.0)
        .min_width(200.0)
        .max_width(360.0)
        .show(ctx, |ui| {
            ScrollArea::vertical().show(ui, |ui| {
                render_layers_section(ui, state, registry, layers_pending);
                ui.add_space(5.0);

                render_map_section(ui, state);
                ui.add_space(5.0);

                render_legend_section(ui);
            });
        });
}

fn render_layers_section(
    ui: &mut egui::Ui,
    state: &mut AppState,
    registry: &LayerRegistry,
    layers_pending: bool,
) {
    let header = format!(
        "{} Layers ({} Active)",
        icons::STACK,
        registry.active_count()
    );
    egui::CollapsingHeader::new(RichText::new(header).strong())
        .id_salt("layers_section")
        .default_open(true)
        .show(ui, |ui| {
            if !registry.has_descriptors() {
                if layers_pending {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label("Loading layers...");
                    });
                } else {
                    ui.label(
                        RichText::new("No layers available")
                            .small()
                            .color(colors::ui::LABEL),
                    );
                }
                return;
            }

            for descriptor in registry.descriptors() {
                let active = registry.is_active(&descriptor.id);
                let text = if active {
                    RichText::new(format!("{} {}", icons::CHECK_SQUARE, descriptor.name))
                        .color(colors::ui::ACTIVE)
                } else {
                    RichText::new(format!("{} {}", icons::SQUARE, descriptor.name))
                };

                let mut button = ui.add(
                    egui::Button::new(text)
                        .selected(active)
                        .min_size(egui::vec2(ui.available_width(), 0.0)),
                );
                if let Some(description) = &descriptor.description {
                    button = button.on_hover_text(description);
                }
                if button.clicked() {
                    state.request_toggle(&descriptor.id);
                }

                let tile_errors = registry
                    .overlay(&descriptor.id)
                    .map(|overlay| overlay.tile_errors())
                    .unwrap_or(0);
                if tile_errors > 0 {
                    ui.label(
                        RichText::new(format!("{} {} tiles failed", icons::WARNING, tile_errors))
                            .small()
                            .color(colors::ui::WARNING),
                    );
                }
            }
        });
}

fn render_map_section(ui: &mut egui::Ui, state: &mut AppState) {
    egui::CollapsingHeader::new(RichText::new("Map").strong())
        .default_open(true)
        .show(ui, |ui| {
            ui.add(
                egui::Slider::new(&mut state.overlay_opacity, 0.0..=1.0)
                    .text("Overlay opacity")
                    .fixed_decimals(2),
            );

            egui::ComboBox::from_id_salt("basemap_selector")
                .selected_text(state.basemap.label())
                .width(150.0)
                .show_ui(ui, |ui| {
                    for basemap in Basemap::all() {
                        ui.selectable_value(&mut state.basemap, *basemap, basemap.label());
                    }
                });
        });
}

fn render_legend_section(ui: &mut egui::Ui) {
    egui::CollapsingHeader::new(RichText::new("Flood Risk").strong())
        .default_open(true)
        .show(ui, |ui| {
            for (label, color) in colors::FLOOD_LEGEND {
                ui.horizontal(|ui| {
                    let (rect, _) =
                        ui.allocate_exact_size(egui::vec2(14.0, 14.0), egui::Sense::hover());
                    ui.painter().rect_filled(rect, 2.0, color);
                    ui.label(RichText::new(label).small());
                });
            }
        });
}
