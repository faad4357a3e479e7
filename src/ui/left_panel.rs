//! Left panel UI: analysis query and results.

use super::colors;
use crate::state::{format_count, AnalysisSummary, AppState, SAMPLE_QUERIES};
use eframe::egui::{self, RichText, ScrollArea};
use egui_phosphor::regular as icons;

pub fn render_left_panel(ctx: &egui::Context, state: &mut AppState, analysis_pending: bool) {
    egui::SidePanel::left("left_panel")
        .resizable(true)
        .default_width(280.0)
        .min_width(220.0)
        .max_width(420.0)
        .show(ctx, |ui| {
            ScrollArea::vertical().show(ui, |ui| {
                render_query_section(ui, state, analysis_pending);
                ui.add_space(10.0);
                render_data_section(ui, state, analysis_pending);
            });
        });
}

fn render_query_section(ui: &mut egui::Ui, state: &mut AppState, analysis_pending: bool) {
    ui.heading("Disaster Analysis Query");
    ui.separator();

    ui.add_enabled_ui(!analysis_pending, |ui| {
        let input = ui.add(
            egui::TextEdit::multiline(&mut state.query.text)
                .hint_text("Ask about flood vulnerability, building damage, or social impact...")
                .desired_rows(2)
                .desired_width(f32::INFINITY),
        );
        let enter_pressed =
            input.has_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter) && i.modifiers.command);

        let label = if analysis_pending {
            "Analyzing...".to_string()
        } else {
            format!("{} Analyze", icons::MAGNIFYING_GLASS)
        };
        let analyze = ui.add_enabled(state.query.can_submit(), egui::Button::new(label));
        if analyze.clicked() || enter_pressed {
            state.query.submit();
        }

        ui.add_space(5.0);
        ui.label(RichText::new("Sample queries:").small().color(colors::ui::LABEL));
        for sample in SAMPLE_QUERIES {
            if ui
                .add(egui::Button::new(RichText::new(sample).small()).wrap())
                .clicked()
            {
                state.query.submit_sample(sample);
            }
        }
    });
}

fn render_data_section(ui: &mut egui::Ui, state: &AppState, analysis_pending: bool) {
    if let Some(error) = &state.analysis_error {
        ui.label(
            RichText::new(format!("{} Analysis failed: {}", icons::WARNING_CIRCLE, error))
                .small()
                .color(colors::ui::ERROR),
        );
        ui.add_space(4.0);
    }

    let Some(summary) = &state.analysis else {
        ui.group(|ui| {
            ui.set_width(ui.available_width());
            if analysis_pending {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Running analysis...");
                });
            } else {
                ui.label(
                    RichText::new("Run an analysis query or click the map to see results here")
                        .small()
                        .color(colors::ui::LABEL),
                );
            }
        });
        return;
    };

    ui.group(|ui| {
        ui.set_width(ui.available_width());
        ui.horizontal(|ui| {
            ui.label(RichText::new(&summary.title).strong());
            if analysis_pending {
                ui.spinner();
            }
        });
        ui.label(
            RichText::new(format!(
                "{} {:.4}, {:.4}",
                icons::MAP_PIN,
                summary.location.lat,
                summary.location.lng
            ))
            .small()
            .monospace()
            .color(colors::ui::LABEL),
        );
        if let Some(at) = summary.completed_at {
            ui.label(
                RichText::new(at.format("%Y-%m-%d %H:%M UTC").to_string())
                    .small()
                    .color(colors::ui::LABEL),
            );
        }
        ui.separator();

        render_damage(ui, summary);
        render_svi(ui, summary);
        render_flood(ui, summary);
        render_narrative(ui, summary);
    });
}

fn render_damage(ui: &mut egui::Ui, summary: &AnalysisSummary) {
    let Some(total) = summary.total_buildings else {
        return;
    };
    let damaged = summary.damaged_buildings.unwrap_or(0);

    stat_row(
        ui,
        "Building Damage",
        RichText::new(format!("{} / {}", format_count(damaged), format_count(total)))
            .color(colors::ui::VALUE),
    );
    let fraction = (summary.damage_percentage() / 100.0) as f32;
    ui.add(egui::ProgressBar::new(fraction).desired_height(6.0));
    ui.label(
        RichText::new(summary.damage_label())
            .small()
            .color(colors::ui::LABEL),
    );
    if let Some(built_up) = summary.built_up_percentage {
        ui.label(
            RichText::new(format!("{:.1}% built-up area", built_up))
                .small()
                .color(colors::ui::LABEL),
        );
    }
    ui.add_space(6.0);
}

fn render_svi(ui: &mut egui::Ui, summary: &AnalysisSummary) {
    let (Some(score), Some(category), Some(label)) = (
        summary.svi_score,
        summary.svi_category(),
        summary.svi_label(),
    ) else {
        return;
    };

    stat_row(
        ui,
        "Social Vulnerability",
        RichText::new(label).strong().color(category.color()),
    );
    ui.add(egui::ProgressBar::new(score.clamp(0.0, 1.0) as f32).desired_height(6.0));
    let caption = ui.label(
        RichText::new(format!("{} vulnerability", category.label()))
            .small()
            .color(colors::ui::LABEL),
    );
    if let Some(description) = &summary.svi_description {
        caption.on_hover_text(description);
    }
    ui.add_space(6.0);
}

fn render_flood(ui: &mut egui::Ui, summary: &AnalysisSummary) {
    let Some(risk) = &summary.flood_risk else {
        return;
    };
    stat_row(
        ui,
        "Flood Risk Level",
        RichText::new(risk.label()).strong().color(risk.color()),
    );
    if let Some(percentage) = summary.flood_percentage {
        ui.label(
            RichText::new(format!("{:.1}% of area flooded", percentage))
                .small()
                .color(colors::ui::LABEL),
        );
    }
    if let Some(elevation) = summary.average_elevation {
        ui.label(
            RichText::new(format!("Average elevation {:.1} m", elevation))
                .small()
                .color(colors::ui::LABEL),
        );
    }
    ui.add_space(6.0);
}

fn render_narrative(ui: &mut egui::Ui, summary: &AnalysisSummary) {
    if let Some(narrative) = &summary.narrative {
        ui.separator();
        ui.label(RichText::new("AI Analysis").small().strong());
        ui.label(RichText::new(narrative).small());
    }
    if !summary.suggested_actions.is_empty() {
        ui.add_space(4.0);
        ui.label(RichText::new("Suggested actions:").small().color(colors::ui::LABEL));
        for action in &summary.suggested_actions {
            ui.label(RichText::new(format!("• {}", action)).small());
        }
    }
}

fn stat_row(ui: &mut egui::Ui, label: &str, value: RichText) {
    ui.horizontal(|ui| {
        ui.label(RichText::new(label).color(colors::ui::LABEL));
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.label(value);
        });
    });
}
