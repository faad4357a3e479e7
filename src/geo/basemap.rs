//! Base map tile providers.

use super::tile::TileUrlTemplate;
use serde::{Deserialize, Serialize};

/// Opaque tile layer drawn below every overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Basemap {
    /// Esri World Imagery
    #[default]
    Satellite,
    /// OpenStreetMap standard tiles
    Street,
}

impl Basemap {
    pub fn all() -> &'static [Basemap] {
        &[Basemap::Satellite, Basemap::Street]
    }

    /// Display label for the basemap selector.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Satellite => "Satellite",
            Self::Street => "Street Map",
        }
    }

    /// Attribution text required by the tile provider.
    pub fn attribution(&self) -> &'static str {
        match self {
            Self::Satellite => "Tiles © Esri",
            Self::Street => "© OpenStreetMap contributors",
        }
    }

    pub fn max_zoom(&self) -> u8 {
        match self {
            Self::Satellite => 18,
            Self::Street => 19,
        }
    }

    fn template_str(&self) -> &'static str {
        match self {
            Self::Satellite => {
                "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}"
            }
            Self::Street => "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png",
        }
    }

    /// Tile URL template for this provider.
    pub fn template(&self) -> TileUrlTemplate {
        // Built-in templates always carry every placeholder
        TileUrlTemplate::parse(self.template_str())
            .unwrap_or_else(|_| unreachable!("built-in basemap template is valid"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_templates_are_valid() {
        for basemap in Basemap::all() {
            assert!(TileUrlTemplate::parse(basemap.template_str()).is_ok());
        }
    }
}
