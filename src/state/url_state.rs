//! URL state encoding/decoding for shareable URLs.
//!
//! Encodes the map center, zoom and active layers in the URL query string
//! so reloading restores the view and URLs can be shared.

/// Parsed URL parameters.
#[derive(Debug, Default, PartialEq)]
pub struct UrlParams {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub zoom: Option<u8>,
    /// Layer ids to activate once descriptors arrive
    pub layers: Option<Vec<String>>,
}

/// Parses a query string such as `?lat=11.0&lng=76.9&z=11&layers=a,b`.
pub fn parse_query(query: &str) -> UrlParams {
    let mut params = UrlParams::default();

    let query = query.trim_start_matches('?');
    if query.is_empty() {
        return params;
    }

    for pair in query.split('&') {
        let mut kv = pair.splitn(2, '=');
        let key = kv.next().unwrap_or("");
        let value = kv.next().unwrap_or("");
        match key {
            "lat" => params.lat = value.parse().ok().filter(|v: &f64| v.is_finite()),
            "lng" => params.lng = value.parse().ok().filter(|v: &f64| v.is_finite()),
            "z" => params.zoom = value.parse().ok(),
            "layers" => {
                let ids: Vec<String> = value
                    .replace("%2C", ",")
                    .replace("%2c", ",")
                    .split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(str::to_string)
                    .collect();
                params.layers = Some(ids);
            }
            _ => {}
        }
    }

    params
}

/// Builds the query string for the current view.
///
/// `layers=` is always written, so an empty active set reloads as an empty
/// map rather than the default layer.
pub fn build_query(lat: f64, lng: f64, zoom: u8, layers: &[&str]) -> String {
    format!(
        "?lat={:.4}&lng={:.4}&z={}&layers={}",
        lat,
        lng,
        zoom,
        layers.join(",")
    )
}

/// Parse URL query parameters from the current browser URL.
#[cfg(target_arch = "wasm32")]
pub fn parse_from_url() -> UrlParams {
    let search = web_sys::window()
        .and_then(|w| w.location().search().ok())
        .unwrap_or_default();
    parse_query(&search)
}

/// No-op stub for native builds.
#[cfg(not(target_arch = "wasm32"))]
pub fn parse_from_url() -> UrlParams {
    UrlParams::default()
}

/// Push current state to the URL query string using `replaceState`.
#[cfg(target_arch = "wasm32")]
pub fn push_to_url(lat: f64, lng: f64, zoom: u8, layers: &[&str]) {
    let query = build_query(lat, lng, zoom, layers);

    let Some(history) = web_sys::window().and_then(|w| w.history().ok()) else {
        return;
    };
    let _ = history.replace_state_with_url(&wasm_bindgen::JsValue::NULL, "", Some(&query));
}

/// No-op stub for native builds.
#[cfg(not(target_arch = "wasm32"))]
pub fn push_to_url(_lat: f64, _lng: f64, _zoom: u8, _layers: &[&str]) {}
