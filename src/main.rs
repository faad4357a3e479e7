#![warn(clippy::all)]

//! Disaster Eye - an interactive map dashboard for disaster vulnerability.
//!
//! Overlays served by the analysis API (flood risk, building damage, social
//! vulnerability) are drawn over a satellite or street basemap. Clicking the
//! map or asking a question runs an analysis whose results fill the data panel.

mod api;
mod config;
mod geo;
mod layers;
mod state;
mod task;
mod ui;

use api::{AnalysisResponse, ApiChannel, ApiClient, ApiResult, LatLng, LayerCatalog};
use config::DashboardConfig;
use eframe::egui;
use geo::{MapView, TileMap};
use layers::LayerRegistry;
use state::{AnalysisSummary, AppState, ConnectionStatus};
use task::TaskSpawner;

// Native entry point
#[cfg(not(target_arch = "wasm32"))]
fn main() -> eframe::Result<()> {
    env_logger::init();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Disaster Eye")
            .with_inner_size([1280.0, 800.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Disaster Eye",
        native_options,
        Box::new(|cc| Ok(Box::new(DashboardApp::new(cc)?))),
    )
}

// WASM entry point - main is not called on wasm32
#[cfg(target_arch = "wasm32")]
fn main() {}

/// Entry point for the WASM application.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub async fn start() {
    use eframe::wasm_bindgen::JsCast as _;

    // Redirect `log` messages to `console.log`:
    eframe::WebLogger::init(log::LevelFilter::Debug).ok();

    let web_options = eframe::WebOptions::default();

    wasm_bindgen_futures::spawn_local(async {
        let document = web_sys::window()
            .expect("No window")
            .document()
            .expect("No document");

        let canvas = document
            .get_element_by_id("app_canvas")
            .expect("Failed to find app_canvas")
            .dyn_into::<web_sys::HtmlCanvasElement>()
            .expect("app_canvas was not a HtmlCanvasElement");

        let start_result = eframe::WebRunner::new()
            .start(
                canvas,
                web_options,
                Box::new(|cc| Ok(Box::new(DashboardApp::new(cc)?))),
            )
            .await;

        // Remove the loading text once the app has loaded:
        if let Some(loading_text) = document.get_element_by_id("loading_text") {
            match start_result {
                Ok(_) => {
                    loading_text.remove();
                }
                Err(e) => {
                    loading_text.set_inner_html(
                        "<p>The app has crashed. See the developer console for details.</p>",
                    );
                    panic!("Failed to start eframe: {e:?}");
                }
            }
        }
    });
}

/// Main application state and logic.
pub struct DashboardApp {
    /// Persisted settings and the initial view
    config: DashboardConfig,

    /// UI-facing state shared with the panels
    state: AppState,

    /// Active overlays and the descriptor catalog
    registry: LayerRegistry,

    /// Map surface the registry attaches overlays to
    tile_map: TileMap,

    /// Channel for async API requests
    api: ApiChannel,

    /// Current map center and zoom
    view: MapView,

    /// Where double-click resets the view
    home: ui::HomeView,

    /// Layer ids from the URL, applied once descriptors arrive
    pending_url_layers: Option<Vec<String>>,

    /// Settings changed since the last save
    settings_dirty: bool,

    last_url_push: web_time::Instant,
}

impl DashboardApp {
    /// Creates a new DashboardApp instance.
    pub fn new(cc: &eframe::CreationContext<'_>) -> std::io::Result<Self> {
        let mut fonts = egui::FontDefinitions::default();
        egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
        cc.egui_ctx.set_fonts(fonts);

        let config = DashboardConfig::load();
        log::info!("Using analysis service at {}", config.api_base_url);

        let client = ApiClient::new(config.api_base_url.clone());
        let spawner = TaskSpawner::new()?;

        let home = ui::HomeView {
            center: config.center.into(),
            zoom: config.zoom,
        };

        // Apply URL parameters (lat/lng, zoom, layers)
        let url_params = state::url_state::parse_from_url();
        let center = LatLng::new(
            url_params.lat.unwrap_or(config.center.lat),
            url_params.lng.unwrap_or(config.center.lng),
        );
        let view = MapView::new(center.into(), url_params.zoom.unwrap_or(config.zoom));

        let mut api = ApiChannel::new(client.clone(), spawner.clone());
        api.fetch_layers(&cc.egui_ctx, center);
        api.check_health(&cc.egui_ctx);

        Ok(Self {
            state: AppState::new(config.overlay_opacity, config.basemap),
            registry: LayerRegistry::with_opacity(config.overlay_opacity),
            tile_map: TileMap::new(client, spawner, config.basemap),
            api,
            view,
            home,
            pending_url_layers: url_params.layers,
            settings_dirty: false,
            last_url_push: web_time::Instant::now(),
            config,
        })
    }

    fn handle_api_result(&mut self, result: ApiResult) {
        match result {
            ApiResult::Layers(Ok(catalog)) => self.handle_catalog(catalog),
            ApiResult::Layers(Err(reason)) => {
                log::warn!("Layer service offline: {}", reason);
                self.state.status_message = "Layer service offline".to_string();
                self.state.connection = ConnectionStatus::Offline { reason };
            }
            ApiResult::Health(Ok(health)) => {
                log::info!(
                    "Service health: {} (earth engine: {}, ai: {})",
                    health.api_status,
                    health.earth_engine_initialized,
                    health.ai_service_available
                );
                self.state.health = Some(health);
            }
            ApiResult::Health(Err(e)) => {
                log::warn!("Health check failed: {}", e);
                self.state.health = None;
            }
            ApiResult::Analysis { title, result } => self.handle_analysis(title, result),
        }
    }

    fn handle_catalog(&mut self, catalog: LayerCatalog) {
        let source = catalog.source;
        let count = catalog.descriptors.len();
        let rejected = self.registry.apply_catalog(
            catalog.descriptors,
            self.pending_url_layers.take(),
            &mut self.tile_map,
        );
        for id in rejected {
            log::warn!("Layer {} from the URL cannot be shown", id);
        }

        log::info!("Loaded {} layer(s) from {}", count, source.label());
        self.state.status_message = format!("{} layers available", count);
        self.state.connection = ConnectionStatus::Connected { source };
    }

    fn handle_analysis(&mut self, title: String, result: Result<AnalysisResponse, String>) {
        match result {
            Ok(response) => {
                self.state.analysis = Some(AnalysisSummary::from_response(title, &response));
                self.state.analysis_error = None;
                self.state.status_message = "Analysis complete".to_string();
            }
            Err(e) => {
                log::warn!("Analysis failed: {}", e);
                self.state.status_message = format!("Analysis failed: {}", e);
                self.state.analysis_error = Some(e);
            }
        }
    }

    /// Acts on requests the panels recorded this frame.
    fn apply_requests(&mut self, ctx: &egui::Context) {
        let mut changed = false;

        for id in std::mem::take(&mut self.state.toggle_requests) {
            self.registry.toggle(&id, &mut self.tile_map);
            changed = true;
        }

        if std::mem::take(&mut self.state.retry_requested) {
            self.state.connection = ConnectionStatus::Connecting;
            self.state.status_message = "Retrying layer service...".to_string();
            self.api.fetch_layers(ctx, LatLng::from(self.view.center));
            self.api.check_health(ctx);
        }

        if let Some(query) = self.state.query.take_submission() {
            if self
                .api
                .submit_query(ctx, query, self.state.selected_location)
            {
                self.state.status_message = "Running analysis...".to_string();
            }
        }

        // A click during a running analysis stays queued until it finishes
        if let Some(at) = self
            .state
            .take_location_request(self.api.is_analysis_pending())
        {
            if self.api.analyze_location(ctx, at) {
                self.state.status_message = "Analyzing location...".to_string();
            }
        }

        if (self.state.overlay_opacity - self.registry.opacity()).abs() > f32::EPSILON {
            self.registry
                .set_opacity(self.state.overlay_opacity, &mut self.tile_map);
            self.config.overlay_opacity = self.registry.opacity();
            self.settings_dirty = true;
            changed = true;
        }

        if self.state.basemap != self.tile_map.basemap() {
            self.tile_map.set_basemap(self.state.basemap);
            self.config.basemap = self.state.basemap;
            self.settings_dirty = true;
            changed = true;
        }

        if changed {
            ctx.request_repaint();
        }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        while let Some(result) = self.api.try_recv() {
            self.handle_api_result(result);
        }

        for overlay_id in self.tile_map.poll(ctx) {
            self.registry.record_tile_error(overlay_id);
        }

        // Push current state to URL (throttled to once per second)
        {
            let now = web_time::Instant::now();
            if now.duration_since(self.last_url_push).as_secs_f64() >= 1.0 {
                self.last_url_push = now;
                // Until the catalog arrives the URL keeps the requested layers
                let layers: Vec<&str> = match &self.pending_url_layers {
                    Some(ids) => ids.iter().map(String::as_str).collect(),
                    None => self.registry.active_ids(),
                };
                state::url_state::push_to_url(
                    self.view.center.y,
                    self.view.center.x,
                    self.view.zoom,
                    &layers,
                );
                if std::mem::take(&mut self.settings_dirty) {
                    self.config.save();
                }
            }
        }

        // Side and top panels must be rendered before CentralPanel
        ui::render_top_bar(ctx, &mut self.state, self.api.is_layers_pending());
        ui::render_left_panel(ctx, &mut self.state, self.api.is_analysis_pending());
        ui::render_right_panel(
            ctx,
            &mut self.state,
            &self.registry,
            self.api.is_layers_pending(),
        );
        ui::render_canvas(
            ctx,
            &mut self.state,
            &mut self.view,
            &mut self.tile_map,
            &self.home,
        );

        self.apply_requests(ctx);
    }
}

impl Drop for DashboardApp {
    fn drop(&mut self) {
        self.registry.teardown(&mut self.tile_map);
        if self.settings_dirty {
            self.config.save();
        }
    }
}
