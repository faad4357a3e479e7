//! Application state management.
//!
//! This module contains the state the UI panels read and write. Panels never
//! touch the layer registry or the network directly: they record requests
//! here and the update loop acts on them.

mod analysis;
mod connection;
mod query;
pub mod url_state;

pub use analysis::{format_count, AnalysisSummary};
pub use connection::ConnectionStatus;
pub use query::SAMPLE_QUERIES;

use crate::api::{HealthResponse, LatLng};
use crate::geo::Basemap;
use query::QueryState;

/// Root application state containing all sub-states.
#[derive(Default)]
pub struct AppState {
    /// Status of the layer service
    pub connection: ConnectionStatus,

    /// Query form
    pub query: QueryState,

    /// Most recent analysis result
    pub analysis: Option<AnalysisSummary>,

    /// Why the most recent analysis failed, cleared by the next success
    pub analysis_error: Option<String>,

    /// Location of the analysis shown or running
    pub selected_location: Option<LatLng>,

    /// Latest health check, if one succeeded
    pub health: Option<HealthResponse>,

    /// Application status message displayed in top bar
    pub status_message: String,

    /// Layer ids clicked in the layer panel this frame
    pub toggle_requests: Vec<String>,

    /// Set by the Retry button
    pub retry_requested: bool,

    /// Last map click not yet sent for analysis
    pub analysis_requested: Option<LatLng>,

    /// Overlay opacity as edited in the layer panel
    pub overlay_opacity: f32,

    /// Basemap as selected in the layer panel
    pub basemap: Basemap,
}

impl AppState {
    pub fn new(overlay_opacity: f32, basemap: Basemap) -> Self {
        Self {
            status_message: "Loading layers...".to_string(),
            overlay_opacity,
            basemap,
            ..Default::default()
        }
    }

    /// Queues a layer toggle for the update loop.
    pub fn request_toggle(&mut self, id: &str) {
        self.toggle_requests.push(id.to_string());
    }

    /// Queues an analysis of a clicked location. A later click replaces an
    /// earlier one that has not been sent yet.
    pub fn request_location_analysis(&mut self, at: LatLng) {
        self.analysis_requested = Some(at);
    }

    /// Takes the queued location once no analysis is running and marks it
    /// as the selected location.
    ///
    /// While `analysis_pending` the request stays queued and the selection
    /// keeps pointing at the running analysis.
    pub fn take_location_request(&mut self, analysis_pending: bool) -> Option<LatLng> {
        if analysis_pending {
            return None;
        }
        let at = self.analysis_requested.take()?;
        self.selected_location = Some(at);
        Some(at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_click_during_analysis_waits() {
        let mut state = AppState::default();
        let first = LatLng::new(11.0, 76.9);
        state.request_location_analysis(first);
        assert_eq!(state.take_location_request(false), Some(first));
        assert_eq!(state.selected_location, Some(first));

        let second = LatLng::new(12.0, 77.5);
        state.request_location_analysis(second);
        assert_eq!(state.take_location_request(true), None);
        assert_eq!(state.selected_location, Some(first));
        assert_eq!(state.analysis_requested, Some(second));

        assert_eq!(state.take_location_request(false), Some(second));
        assert_eq!(state.selected_location, Some(second));
        assert_eq!(state.take_location_request(false), None);
    }

    #[test]
    fn test_latest_click_replaces_queued_one() {
        let mut state = AppState::default();
        state.request_location_analysis(LatLng::new(1.0, 1.0));
        state.request_location_analysis(LatLng::new(2.0, 2.0));

        assert_eq!(state.take_location_request(true), None);
        assert_eq!(state.take_location_request(false), Some(LatLng::new(2.0, 2.0)));
    }
}
