//! HTTP client for the analysis service.
//!
//! The client is constructed explicitly from a base URL and passed to
//! whoever needs it; clones share one connection pool.

use super::types::{
    AnalysisResponse, HealthResponse, LatLng, LayerCatalog, LayerDescriptor, LayerSource,
    LayersResponse, LocationAnalysisRequest, QueryRequest,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Errors returned by [`ApiClient`].
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request could not be sent or its body could not be read.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The server answered with a non-success HTTP status.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },
    /// The body was not the JSON we expected.
    #[error("invalid response: {0}")]
    Decode(#[from] serde_json::Error),
    /// The server answered but reported a failure in the body.
    #[error("{0}")]
    Server(String),
}

/// Error body shapes used by the service (`HTTPException` and handlers).
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Extracts a human-readable message from an error response body.
fn error_message(body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(message) = parsed.detail.or(parsed.message).or(parsed.error) {
            return message;
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "empty response".to_string()
    } else {
        trimmed.chars().take(200).collect()
    }
}

/// Client for the disaster analysis API.
#[derive(Clone, Debug)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    /// Creates a client for the service at `base_url` (e.g. `http://localhost:8000`).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http(base_url, build_http_client())
    }

    /// Creates a client around an existing `reqwest::Client`.
    pub fn with_http(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        Self { base_url, http }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.http.get(self.endpoint(path)).send().await?;
        decode(response).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self.http.post(self.endpoint(path)).json(body).send().await?;
        decode(response).await
    }

    /// `GET /health`
    pub async fn health(&self) -> Result<HealthResponse, ApiError> {
        self.get_json("/health").await
    }

    /// `GET /api/earth-engine/live-layers?lat&lng`
    pub async fn live_layers(&self, at: LatLng) -> Result<Vec<LayerDescriptor>, ApiError> {
        let path = format!(
            "/api/earth-engine/live-layers?lat={:.4}&lng={:.4}",
            at.lat, at.lng
        );
        let response: LayersResponse = self.get_json(&path).await?;
        response.into_descriptors()
    }

    /// `GET /api/earth-engine/test-map`
    pub async fn test_map(&self) -> Result<Vec<LayerDescriptor>, ApiError> {
        let response: LayersResponse = self.get_json("/api/earth-engine/test-map").await?;
        response.into_descriptors()
    }

    /// Fetches the layer catalog, falling back to the test map once when the
    /// live endpoint fails. The live error is reported if both fail.
    pub async fn fetch_layers(&self, at: LatLng) -> Result<LayerCatalog, ApiError> {
        let live = self.live_layers(at).await;
        let test_map = match live {
            Ok(_) => None,
            Err(_) => Some(self.test_map().await),
        };
        choose_catalog(live, test_map)
    }

    /// `POST /api/earth-engine/query`
    pub async fn query(&self, request: &QueryRequest) -> Result<AnalysisResponse, ApiError> {
        let response: AnalysisResponse = self.post_json("/api/earth-engine/query", request).await?;
        check_analysis(response)
    }

    /// `POST /api/earth-engine/analyze-location`
    pub async fn analyze_location(
        &self,
        request: &LocationAnalysisRequest,
    ) -> Result<AnalysisResponse, ApiError> {
        let response: AnalysisResponse = self
            .post_json("/api/earth-engine/analyze-location", request)
            .await?;
        check_analysis(response)
    }

    /// Downloads raw tile bytes from an absolute URL.
    pub async fn fetch_tile(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: format!("tile request to {} failed", url),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

/// Reads a response body and decodes it as JSON, mapping HTTP errors.
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(ApiError::Status {
            status: status.as_u16(),
            message: error_message(&body),
        });
    }
    Ok(serde_json::from_str(&body)?)
}

/// Picks the catalog to show from the live and test-map outcomes.
///
/// `test_map` is only consulted when the live fetch failed. An empty test map
/// counts as a failure, and the live error is the one reported.
fn choose_catalog(
    live: Result<Vec<LayerDescriptor>, ApiError>,
    test_map: Option<Result<Vec<LayerDescriptor>, ApiError>>,
) -> Result<LayerCatalog, ApiError> {
    let live_error = match live {
        Ok(descriptors) => {
            return Ok(LayerCatalog {
                source: LayerSource::Live,
                descriptors,
            })
        }
        Err(e) => e,
    };
    log::warn!("Live layers unavailable ({}), trying test map", live_error);

    match test_map {
        Some(Ok(descriptors)) if !descriptors.is_empty() => Ok(LayerCatalog {
            source: LayerSource::TestMap,
            descriptors,
        }),
        Some(Ok(_)) => {
            log::warn!("Test map returned no layers");
            Err(live_error)
        }
        Some(Err(e)) => {
            log::warn!("Test map also failed: {}", e);
            Err(live_error)
        }
        None => Err(live_error),
    }
}

/// Analysis responses may report failure in an `error` field.
fn check_analysis(response: AnalysisResponse) -> Result<AnalysisResponse, ApiError> {
    match &response.error {
        Some(error) if !error.is_empty() => Err(ApiError::Server(error.clone())),
        _ => Ok(response),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn build_http_client() -> reqwest::Client {
    // Tile servers such as OpenStreetMap reject requests without a user agent
    reqwest::Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|e| {
            log::warn!("Falling back to default HTTP client: {}", e);
            reqwest::Client::new()
        })
}

#[cfg(target_arch = "wasm32")]
fn build_http_client() -> reqwest::Client {
    reqwest::Client::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_paths() {
        let client = ApiClient::new("http://localhost:8000/");
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(client.endpoint("/health"), "http://localhost:8000/health");
        assert_eq!(
            client.endpoint("api/earth-engine/test-map"),
            "http://localhost:8000/api/earth-engine/test-map"
        );
    }

    #[test]
    fn test_error_message_prefers_detail() {
        assert_eq!(
            error_message(r#"{"detail": "Failed to generate live layers: quota"}"#),
            "Failed to generate live layers: quota"
        );
        assert_eq!(
            error_message(r#"{"error": "Not found", "message": "Endpoint missing"}"#),
            "Endpoint missing"
        );
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
        assert_eq!(error_message("  "), "empty response");
    }

    #[test]
    fn test_check_analysis_error_field() {
        let failed: AnalysisResponse = serde_json::from_str(
            r#"{"coordinates": {"lat": 0.0, "lng": 0.0}, "status": "error", "error": "EE offline"}"#,
        )
        .unwrap();
        assert_eq!(check_analysis(failed).unwrap_err().to_string(), "EE offline");

        let ok: AnalysisResponse = serde_json::from_str(
            r#"{"coordinates": {"lat": 0.0, "lng": 0.0}, "status": "completed", "error": null}"#,
        )
        .unwrap();
        assert!(check_analysis(ok).is_ok());
    }

    fn layers(ids: &[&str]) -> Vec<LayerDescriptor> {
        ids.iter()
            .map(|id| LayerDescriptor {
                id: id.to_string(),
                name: id.to_string(),
                tile_url_template: format!("http://tiles.test/{id}/{{z}}/{{x}}/{{y}}"),
                description: None,
            })
            .collect()
    }

    fn unavailable(message: &str) -> ApiError {
        ApiError::Status {
            status: 503,
            message: message.to_string(),
        }
    }

    #[test]
    fn test_live_catalog_wins_without_test_map() {
        let catalog = choose_catalog(Ok(layers(&["flood", "svi"])), None).unwrap();
        assert_eq!(catalog.source, LayerSource::Live);
        assert_eq!(catalog.descriptors.len(), 2);

        // A live success ignores whatever the test map said
        let catalog =
            choose_catalog(Ok(layers(&["flood"])), Some(Ok(layers(&["elevation"])))).unwrap();
        assert_eq!(catalog.source, LayerSource::Live);
        assert_eq!(catalog.descriptors[0].id, "flood");
    }

    #[test]
    fn test_live_failure_falls_back_to_test_map() {
        let catalog = choose_catalog(
            Err(unavailable("live down")),
            Some(Ok(layers(&["elevation"]))),
        )
        .unwrap();
        assert_eq!(catalog.source, LayerSource::TestMap);
        assert_eq!(catalog.descriptors[0].id, "elevation");
    }

    #[test]
    fn test_empty_test_map_reports_live_error() {
        let err = choose_catalog(Err(unavailable("live down")), Some(Ok(Vec::new()))).unwrap_err();
        assert_eq!(err.to_string(), "HTTP 503: live down");
    }

    #[test]
    fn test_both_failing_reports_live_error() {
        let err = choose_catalog(
            Err(unavailable("live down")),
            Some(Err(ApiError::Server("test map down".to_string()))),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "HTTP 503: live down");

        let err = choose_catalog(Err(unavailable("live down")), None).unwrap_err();
        assert_eq!(err.to_string(), "HTTP 503: live down");
    }
}
