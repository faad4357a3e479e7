//! UI modules for the Disaster Eye dashboard.
//!
//! The UI is split into distinct panels:
//! - Top bar: Title, connection status, and retry
//! - Left panel: Analysis query and results
//! - Central canvas: The map
//! - Right panel: Overlay layers, map settings, and legend

mod canvas;
mod colors;
mod left_panel;
mod right_panel;
mod top_bar;

pub use canvas::{render_canvas, HomeView};
pub use left_panel::render_left_panel;
pub use right_panel::render_right_panel;
pub use top_bar::render_top_bar;
