//! Connection status shown in the top bar.

use crate::api::LayerSource;
use eframe::egui::Color32;

/// Overall status of the layer service.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ConnectionStatus {
    /// A descriptor fetch is in flight and nothing has loaded yet
    #[default]
    Connecting,
    /// Layers loaded from the given endpoint
    Connected { source: LayerSource },
    /// The last descriptor fetch failed; the user may retry
    Offline { reason: String },
}

impl ConnectionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Connecting => "Connecting",
            Self::Connected {
                source: LayerSource::Live,
            } => "Live",
            Self::Connected {
                source: LayerSource::TestMap,
            } => "Test map",
            Self::Offline { .. } => "Offline",
        }
    }

    pub fn color(&self) -> Color32 {
        match self {
            Self::Connecting => Color32::from_rgb(200, 170, 60),
            Self::Connected {
                source: LayerSource::Live,
            } => Color32::from_rgb(80, 190, 110),
            Self::Connected {
                source: LayerSource::TestMap,
            } => Color32::from_rgb(90, 150, 220),
            Self::Offline { .. } => Color32::from_rgb(220, 80, 70),
        }
    }

    pub fn is_offline(&self) -> bool {
        matches!(self, Self::Offline { .. })
    }

    /// Failure reason while offline.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Offline { reason } => Some(reason),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_carries_reason() {
        let status = ConnectionStatus::Offline {
            reason: "HTTP 503: Earth Engine not initialized".to_string(),
        };
        assert!(status.is_offline());
        assert_eq!(status.label(), "Offline");
        assert_eq!(status.reason(), Some("HTTP 503: Earth Engine not initialized"));

        let fallback = ConnectionStatus::Connected {
            source: LayerSource::TestMap,
        };
        assert!(!fallback.is_offline());
        assert_eq!(fallback.reason(), None);
        assert_eq!(fallback.label(), "Test map");
    }
}
