//! Centralized color constants for the UI.

use eframe::egui::Color32;

/// General UI colors for labels and values.
pub mod ui {
    use super::Color32;

    /// Muted gray for stat labels.
    pub const LABEL: Color32 = Color32::from_rgb(130, 130, 140);
    /// Slightly brighter for stat values.
    pub const VALUE: Color32 = Color32::from_rgb(200, 200, 210);
    /// Emphasized color for active states.
    pub const ACTIVE: Color32 = Color32::from_rgb(100, 180, 255);
    pub const WARNING: Color32 = Color32::from_rgb(255, 180, 50);
    pub const ERROR: Color32 = Color32::from_rgb(235, 90, 80);
}

/// Colors for the map canvas.
pub mod canvas {
    use super::Color32;

    /// Selected location marker.
    pub const MARKER: Color32 = Color32::from_rgb(255, 90, 70);
    pub const MARKER_OUTLINE: Color32 = Color32::WHITE;
    /// Background behind text drawn over the map.
    pub const TEXT_BACKDROP: Color32 = Color32::from_rgba_premultiplied(10, 12, 18, 190);
    pub const TEXT: Color32 = Color32::from_rgb(210, 210, 225);
}

/// Flood risk legend swatches, from lowest to highest risk.
pub const FLOOD_LEGEND: [(&str, Color32); 4] = [
    ("Low", Color32::from_rgb(65, 150, 90)),
    ("Moderate", Color32::from_rgb(230, 200, 60)),
    ("High", Color32::from_rgb(235, 130, 40)),
    ("Severe", Color32::from_rgb(210, 50, 50)),
];
