//! Dashboard configuration.
//!
//! One configurable map replaces per-page map variants: the API endpoint,
//! initial view, overlay opacity and basemap all live here. Native builds
//! read overrides from the environment; browser builds persist the user's
//! choices to localStorage so they survive page reloads.

use crate::api::LatLng;
use crate::geo::{Basemap, MAX_ZOOM, MIN_ZOOM};
use crate::layers::DEFAULT_OVERLAY_OPACITY;
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Coimbatore, the service's default analysis area.
pub const DEFAULT_CENTER: LatLng = LatLng {
    lat: 11.0168,
    lng: 76.9558,
};

pub const DEFAULT_ZOOM: u8 = 11;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Base URL of the analysis service
    pub api_base_url: String,
    /// Opacity applied to every overlay
    pub overlay_opacity: f32,
    pub basemap: Basemap,
    /// Initial map center; URL parameters take precedence
    #[serde(skip)]
    pub center: LatLng,
    #[serde(skip)]
    pub zoom: u8,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            overlay_opacity: DEFAULT_OVERLAY_OPACITY,
            basemap: Basemap::default(),
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
        }
    }
}

impl DashboardConfig {
    /// localStorage key for persisted settings.
    #[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
    const STORAGE_KEY: &'static str = "disaster_eye_settings";

    /// Loads the configuration for this platform.
    pub fn load() -> Self {
        let mut config = Self::load_persisted();
        #[cfg(not(target_arch = "wasm32"))]
        config.apply_env(|key| std::env::var(key).ok());
        config.sanitize();
        config
    }

    /// Applies `DISASTER_EYE_*` overrides. Unparseable values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DISASTER_EYE_API_URL") {
            if !url.trim().is_empty() {
                self.api_base_url = url.trim().to_string();
            }
        }
        if let Some(lat) = parse_env(&lookup, "DISASTER_EYE_LAT") {
            self.center.lat = lat;
        }
        if let Some(lng) = parse_env(&lookup, "DISASTER_EYE_LNG") {
            self.center.lng = lng;
        }
        if let Some(zoom) = parse_env(&lookup, "DISASTER_EYE_ZOOM") {
            self.zoom = zoom;
        }
    }

    /// Clamps values into their valid ranges.
    pub fn sanitize(&mut self) {
        if !self.overlay_opacity.is_finite() {
            self.overlay_opacity = DEFAULT_OVERLAY_OPACITY;
        }
        self.overlay_opacity = self.overlay_opacity.clamp(0.0, 1.0);
        self.zoom = self.zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        self.center.lat = self.center.lat.clamp(-85.0, 85.0);
        if self.api_base_url.trim().is_empty() {
            self.api_base_url = DEFAULT_API_URL.to_string();
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn load_persisted() -> Self {
        Self::default()
    }

    #[cfg(target_arch = "wasm32")]
    fn load_persisted() -> Self {
        let Some(storage) = web_sys::window().and_then(|w| w.local_storage().ok().flatten()) else {
            return Self::default();
        };

        let json = match storage.get_item(Self::STORAGE_KEY) {
            Ok(Some(s)) => s,
            _ => return Self::default(),
        };

        match serde_json::from_str(&json) {
            Ok(config) => {
                log::info!("Loaded dashboard settings from localStorage");
                config
            }
            Err(e) => {
                log::warn!("Failed to parse dashboard settings: {}", e);
                Self::default()
            }
        }
    }

    /// Persists the user-adjustable settings.
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let Some(storage) = web_sys::window().and_then(|w| w.local_storage().ok().flatten()) else {
            return;
        };

        let json = match serde_json::to_string(self) {
            Ok(s) => s,
            Err(e) => {
                log::warn!("Failed to serialize dashboard settings: {}", e);
                return;
            }
        };

        if let Err(e) = storage.set_item(Self::STORAGE_KEY, &json) {
            log::warn!("Failed to save dashboard settings: {:?}", e);
        } else {
            log::debug!("Saved dashboard settings");
        }
    }

    /// Native builds keep settings for the session only.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {}
}

fn parse_env<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Ignoring invalid {}={:?}", key, raw);
            None
        }
    }
}
