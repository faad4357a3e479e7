//! Channel bridge between async API requests and the UI loop.
//!
//! Requests run on the [`TaskSpawner`]; results come back through an mpsc
//! channel that `update()` drains every frame.

use super::client::ApiClient;
use super::types::{
    AnalysisResponse, HealthResponse, LatLng, LayerCatalog, LocationAnalysisRequest, QueryRequest,
};
use crate::task::TaskSpawner;
use eframe::egui;
use std::sync::mpsc::{channel, Receiver, Sender};

/// Radius in meters used for map-click analyses.
const LOCATION_ANALYSIS_RADIUS_M: f64 = 5000.0;

/// Completed API request.
pub enum ApiResult {
    /// Layer catalog fetch finished.
    Layers(Result<LayerCatalog, String>),
    /// Health check finished.
    Health(Result<HealthResponse, String>),
    /// Query or location analysis finished.
    Analysis {
        /// Heading for the data panel (the query text or the location)
        title: String,
        result: Result<AnalysisResponse, String>,
    },
}

/// Channel-based requester for the analysis service.
pub struct ApiChannel {
    client: ApiClient,
    spawner: TaskSpawner,
    sender: Sender<ApiResult>,
    receiver: Receiver<ApiResult>,
    layers_pending: bool,
    analysis_pending: bool,
}

impl ApiChannel {
    pub fn new(client: ApiClient, spawner: TaskSpawner) -> Self {
        let (sender, receiver) = channel();
        Self {
            client,
            spawner,
            sender,
            receiver,
            layers_pending: false,
            analysis_pending: false,
        }
    }

    /// True while a layer catalog fetch is in flight.
    pub fn is_layers_pending(&self) -> bool {
        self.layers_pending
    }

    /// True while a query or location analysis is in flight.
    pub fn is_analysis_pending(&self) -> bool {
        self.analysis_pending
    }

    /// Fetches the layer catalog for a location. Ignored while one is pending.
    pub fn fetch_layers(&mut self, ctx: &egui::Context, at: LatLng) {
        if self.layers_pending {
            return;
        }
        self.layers_pending = true;
        log::info!("Requesting layers for {:.4}, {:.4}", at.lat, at.lng);

        let client = self.client.clone();
        let sender = self.sender.clone();
        let ctx = ctx.clone();
        self.spawner.spawn(async move {
            let result = client.fetch_layers(at).await.map_err(|e| e.to_string());
            let _ = sender.send(ApiResult::Layers(result));
            ctx.request_repaint();
        });
    }

    /// Checks the service health.
    pub fn check_health(&self, ctx: &egui::Context) {
        let client = self.client.clone();
        let sender = self.sender.clone();
        let ctx = ctx.clone();
        self.spawner.spawn(async move {
            let result = client.health().await.map_err(|e| e.to_string());
            let _ = sender.send(ApiResult::Health(result));
            ctx.request_repaint();
        });
    }

    /// Submits a natural-language query, optionally tied to a location.
    ///
    /// Returns false without sending while another analysis is running.
    pub fn submit_query(&mut self, ctx: &egui::Context, query: String, at: Option<LatLng>) -> bool {
        if self.analysis_pending {
            log::debug!("Analysis already running, query not sent");
            return false;
        }
        self.analysis_pending = true;
        log::info!("Submitting query: {}", query);

        let request = QueryRequest {
            query: query.clone(),
            coordinates: at,
            analysis_type: None,
        };
        let client = self.client.clone();
        let sender = self.sender.clone();
        let ctx = ctx.clone();
        self.spawner.spawn(async move {
            let result = client.query(&request).await.map_err(|e| e.to_string());
            let _ = sender.send(ApiResult::Analysis {
                title: query,
                result,
            });
            ctx.request_repaint();
        });
        true
    }

    /// Requests a vulnerability analysis for a clicked location.
    ///
    /// Returns false without sending while another analysis is running.
    pub fn analyze_location(&mut self, ctx: &egui::Context, at: LatLng) -> bool {
        if self.analysis_pending {
            log::debug!("Analysis already running, location not sent");
            return false;
        }
        self.analysis_pending = true;
        log::info!("Analyzing location {:.4}, {:.4}", at.lat, at.lng);

        let request = LocationAnalysisRequest {
            coordinates: at,
            radius: Some(LOCATION_ANALYSIS_RADIUS_M),
            include_ai: true,
        };
        let client = self.client.clone();
        let sender = self.sender.clone();
        let ctx = ctx.clone();
        self.spawner.spawn(async move {
            let result = client
                .analyze_location(&request)
                .await
                .map_err(|e| e.to_string());
            let _ = sender.send(ApiResult::Analysis {
                title: format!("Location {:.4}, {:.4}", at.lat, at.lng),
                result,
            });
            ctx.request_repaint();
        });
        true
    }

    /// Non-blocking check for a completed request.
    pub fn try_recv(&mut self) -> Option<ApiResult> {
        let result = self.receiver.try_recv().ok()?;
        match &result {
            ApiResult::Layers(_) => self.layers_pending = false,
            ApiResult::Analysis { .. } => self.analysis_pending = false,
            ApiResult::Health(_) => {}
        }
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_channel() -> ApiChannel {
        let spawner = TaskSpawner::new().unwrap();
        ApiChannel::new(ApiClient::new("http://127.0.0.1:1"), spawner)
    }

    #[test]
    fn test_one_analysis_at_a_time() {
        let ctx = egui::Context::default();
        let mut api = offline_channel();

        assert!(api.submit_query(&ctx, "flood risk".to_string(), None));
        assert!(api.is_analysis_pending());
        assert!(!api.analyze_location(&ctx, LatLng::new(11.0, 76.9)));
        assert!(!api.submit_query(&ctx, "again".to_string(), None));
        assert!(api.is_analysis_pending());
    }

    #[test]
    fn test_analysis_result_clears_pending() {
        let ctx = egui::Context::default();
        let mut api = offline_channel();
        assert!(api.analyze_location(&ctx, LatLng::new(11.0, 76.9)));

        let mut finished = false;
        for _ in 0..200 {
            if let Some(ApiResult::Analysis { title, result }) = api.try_recv() {
                assert!(title.starts_with("Location 11.0000"));
                assert!(result.is_err());
                finished = true;
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(25));
        }

        assert!(finished, "analysis never completed");
        assert!(!api.is_analysis_pending());
        assert!(api.analyze_location(&ctx, LatLng::new(12.0, 77.0)));
    }
}
