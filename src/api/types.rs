//! Wire types for the analysis service.

use geo_types::Coord;
use serde::{Deserialize, Serialize};

use super::ApiError;

/// A geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl From<LatLng> for Coord<f64> {
    fn from(value: LatLng) -> Self {
        Coord {
            x: value.lng,
            y: value.lat,
        }
    }
}

impl From<Coord<f64>> for LatLng {
    fn from(value: Coord<f64>) -> Self {
        Self {
            lat: value.y,
            lng: value.x,
        }
    }
}

/// Server-supplied description of one overlay the map can show.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerDescriptor {
    pub id: String,
    pub name: String,
    pub tile_url_template: String,
    pub description: Option<String>,
}

/// Which endpoint a layer catalog came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerSource {
    /// Live layers generated for the requested location
    Live,
    /// The static test map, used when live layers are unavailable
    TestMap,
}

impl LayerSource {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Live => "Live layers",
            Self::TestMap => "Test map",
        }
    }
}

/// Descriptors from one successful layer fetch.
#[derive(Debug, Clone)]
pub struct LayerCatalog {
    pub source: LayerSource,
    pub descriptors: Vec<LayerDescriptor>,
}

/// One entry of the `layers` object as sent by the service.
///
/// Live layers carry `tile_url`, the test map carries `url`.
#[derive(Debug, Deserialize)]
struct WireLayer {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    tile_url: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

/// Body of the live-layers and test-map endpoints.
#[derive(Debug, Deserialize)]
pub struct LayersResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    /// Kept as a JSON map so the server's ordering survives decoding
    #[serde(default)]
    layers: serde_json::Map<String, serde_json::Value>,
}

impl LayersResponse {
    /// Converts the response into descriptors, in the order the server
    /// listed them.
    ///
    /// A non-success status is an error carrying the server's message.
    /// Malformed entries and entries without any tile URL are skipped.
    pub fn into_descriptors(self) -> Result<Vec<LayerDescriptor>, ApiError> {
        if self.status != "success" {
            let message = self
                .message
                .unwrap_or_else(|| format!("layer service reported status '{}'", self.status));
            return Err(ApiError::Server(message));
        }

        let descriptors = self
            .layers
            .into_iter()
            .filter_map(|(id, value)| {
                let layer: WireLayer = match serde_json::from_value(value) {
                    Ok(layer) => layer,
                    Err(e) => {
                        log::warn!("Layer {} is malformed, skipping: {}", id, e);
                        return None;
                    }
                };
                let Some(tile_url_template) = layer.tile_url.or(layer.url) else {
                    log::warn!("Layer {} has no tile URL, skipping", id);
                    return None;
                };
                Some(LayerDescriptor {
                    name: layer.name.unwrap_or_else(|| id.clone()),
                    id,
                    tile_url_template,
                    description: layer.description,
                })
            })
            .collect();

        Ok(descriptors)
    }
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    pub api_status: String,
    #[serde(default)]
    pub earth_engine_initialized: bool,
    #[serde(default)]
    pub ai_service_available: bool,
}

/// Body of `POST /api/earth-engine/query`.
#[derive(Debug, Clone, Serialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<LatLng>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_type: Option<String>,
}

/// Body of `POST /api/earth-engine/analyze-location`.
#[derive(Debug, Clone, Serialize)]
pub struct LocationAnalysisRequest {
    pub coordinates: LatLng,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    pub include_ai: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FloodAnalysis {
    #[serde(default)]
    pub flood_percentage: f64,
    #[serde(default)]
    pub average_elevation: f64,
    pub risk_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BuildingAnalysis {
    pub total_buildings: u64,
    pub damaged_buildings: u64,
    #[serde(default)]
    pub built_up_percentage: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SocialVulnerability {
    pub score: f64,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AiAnalysis {
    pub ai_response: String,
    #[serde(default)]
    pub suggested_actions: Vec<String>,
}

/// Body returned by the query and location-analysis endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisResponse {
    pub coordinates: LatLng,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub flood_analysis: Option<FloodAnalysis>,
    #[serde(default)]
    pub building_analysis: Option<BuildingAnalysis>,
    #[serde(default)]
    pub social_vulnerability: Option<SocialVulnerability>,
    #[serde(default)]
    pub ai_analysis: Option<AiAnalysis>,
    #[serde(default)]
    pub report: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_layers_decode() {
        let body = r#"{
            "status": "success",
            "location": {"lat": 11.0168, "lng": 76.9558},
            "layers": {
                "precipitation": {
                    "name": "Recent Precipitation",
                    "tile_url": "http://localhost:8000/api/earth-engine/tiles/precipitation/{z}/{x}/{y}",
                    "map_id": "abc",
                    "token": "t1",
                    "description": "Total precipitation in last 30 days"
                },
                "elevation": {
                    "name": "Elevation (SRTM)",
                    "tile_url": "http://localhost:8000/api/earth-engine/tiles/elevation/{z}/{x}/{y}",
                    "map_id": "def",
                    "token": "t2"
                }
            },
            "timestamp": "2024-05-01T12:00:00"
        }"#;

        let response: LayersResponse = serde_json::from_str(body).unwrap();
        let descriptors = response.into_descriptors().unwrap();

        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[0].id, "precipitation");
        assert_eq!(
            descriptors[0].description.as_deref(),
            Some("Total precipitation in last 30 days")
        );
        assert!(descriptors[0].tile_url_template.ends_with("/precipitation/{z}/{x}/{y}"));
        assert_eq!(descriptors[1].id, "elevation");
        assert_eq!(descriptors[1].name, "Elevation (SRTM)");
        assert_eq!(descriptors[1].description, None);
    }

    #[test]
    fn test_layers_keep_server_order() {
        let body = r#"{
            "status": "success",
            "layers": {
                "zeta": {"tile_url": "http://t/zeta/{z}/{x}/{y}"},
                "alpha": {"tile_url": "http://t/alpha/{z}/{x}/{y}"},
                "mid": {"tile_url": "http://t/mid/{z}/{x}/{y}"}
            }
        }"#;

        let response: LayersResponse = serde_json::from_str(body).unwrap();
        let ids: Vec<String> = response
            .into_descriptors()
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_test_map_decode_uses_url_field() {
        let body = r#"{
            "status": "success",
            "earth_engine_connected": true,
            "center": {"lat": 11.0168, "lng": 76.9558},
            "zoom": 12,
            "layers": {
                "elevation": {
                    "name": "Elevation",
                    "url": "https://earthengine.googleapis.com/v1/maps/x/tiles/{z}/{x}/{y}",
                    "description": "Digital Elevation Model"
                },
                "broken": {"name": "No URL"},
                "garbled": {"name": 42, "url": "https://tiles.test/{z}/{x}/{y}"}
            }
        }"#;

        let response: LayersResponse = serde_json::from_str(body).unwrap();
        let descriptors = response.into_descriptors().unwrap();

        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].id, "elevation");
        assert!(descriptors[0].tile_url_template.starts_with("https://earthengine"));
    }

    #[test]
    fn test_error_status_surfaces_message() {
        let body = r#"{"status": "error", "message": "Earth Engine not initialized", "mock_data": true}"#;
        let response: LayersResponse = serde_json::from_str(body).unwrap();
        let err = response.into_descriptors().unwrap_err();
        assert_eq!(err.to_string(), "Earth Engine not initialized");

        let response: LayersResponse = serde_json::from_str(r#"{"layers": {}}"#).unwrap();
        assert!(response.into_descriptors().is_err());
    }

    #[test]
    fn test_analysis_response_decode() {
        let body = r#"{
            "coordinates": {"lat": 25.76, "lng": -80.19},
            "timestamp": "2024-05-01T12:00:00.123456",
            "status": "completed",
            "flood_analysis": {
                "flood_percentage": 34.5,
                "average_elevation": 2.1,
                "risk_level": "High",
                "coordinates": {"lat": 25.76, "lng": -80.19},
                "analysis_radius": 5000
            },
            "building_analysis": {
                "total_buildings": 45230,
                "damaged_buildings": 8920,
                "built_up_percentage": 61.0,
                "damage_percentage": 19.7,
                "coordinates": {"lat": 25.76, "lng": -80.19}
            },
            "social_vulnerability": {
                "score": 0.68,
                "category": "High",
                "factors": {"poverty": 0.4},
                "description": "Elevated vulnerability"
            },
            "ai_analysis": null
        }"#;

        let response: AnalysisResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.coordinates, LatLng::new(25.76, -80.19));
        assert_eq!(response.building_analysis.unwrap().damaged_buildings, 8920);
        assert_eq!(response.flood_analysis.unwrap().risk_level, "High");
        assert_eq!(
            response.social_vulnerability.unwrap().description,
            "Elevated vulnerability"
        );
        assert!(response.ai_analysis.is_none());
    }

    #[test]
    fn test_query_request_omits_missing_fields() {
        let request = QueryRequest {
            query: "flood risk".to_string(),
            coordinates: None,
            analysis_type: None,
        };
        assert_eq!(
            serde_json::to_string(&request).unwrap(),
            r#"{"query":"flood risk"}"#
        );

        let located = LocationAnalysisRequest {
            coordinates: LatLng::new(1.5, 2.5),
            radius: None,
            include_ai: true,
        };
        assert_eq!(
            serde_json::to_string(&located).unwrap(),
            r#"{"coordinates":{"lat":1.5,"lng":2.5},"include_ai":true}"#
        );
    }

    #[test]
    fn test_latlng_coord_conversion() {
        let coord: Coord<f64> = LatLng::new(11.0, 76.0).into();
        assert_eq!(coord.x, 76.0);
        assert_eq!(coord.y, 11.0);
        assert_eq!(LatLng::from(coord), LatLng::new(11.0, 76.0));
    }
}
