//! Analysis service access.
//!
//! - `client`: explicitly constructed HTTP client for the service endpoints
//! - `channel`: bridges async requests to the synchronous UI loop
//! - `types`: request and response bodies

mod channel;
mod client;
mod types;

pub use channel::{ApiChannel, ApiResult};
pub use client::{ApiClient, ApiError};
pub use types::{
    AnalysisResponse, HealthResponse, LatLng, LayerCatalog, LayerDescriptor, LayerSource,
};
