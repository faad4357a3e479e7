//! Top bar UI: app title, connection status, and retry.

use super::colors;
use crate::state::AppState;
use eframe::egui::{self, Color32, RichText};
use egui_phosphor::regular as icons;

/// Renders the top bar. Retry is offered only while offline.
pub fn render_top_bar(ctx: &egui::Context, state: &mut AppState, layers_pending: bool) {
    egui::TopBottomPanel::top("top_bar")
        .exact_height(36.0)
        .show(ctx, |ui| {
            ui.horizontal_centered(|ui| {
                ui.label(
                    RichText::new(format!("{} Disaster Eye", icons::GLOBE_HEMISPHERE_WEST))
                        .strong()
                        .size(16.0)
                        .color(Color32::WHITE),
                );

                ui.separator();

                // Connection badge
                let status = &state.connection;
                ui.label(
                    RichText::new(format!("{} {}", icons::CIRCLE, status.label()))
                        .size(12.0)
                        .color(status.color()),
                )
                .on_hover_text(status.reason().unwrap_or("Layer service reachable"));

                if state.connection.is_offline() {
                    ui.add_enabled_ui(!layers_pending, |ui| {
                        let retry = ui.button(format!("{} Retry", icons::ARROW_CLOCKWISE));
                        if retry.clicked() {
                            state.retry_requested = true;
                        }
                    });
                }
                if layers_pending {
                    ui.spinner();
                }

                ui.separator();

                ui.label(
                    RichText::new(&state.status_message)
                        .size(13.0)
                        .color(Color32::GRAY),
                );

                if let Some(health) = &state.health {
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        let (text, color) = if health.earth_engine_initialized {
                            ("Earth Engine ready", colors::ui::LABEL)
                        } else {
                            ("Earth Engine unavailable", colors::ui::WARNING)
                        };
                        ui.label(RichText::new(text).size(11.0).color(color));
                    });
                }
            });
        });
}
