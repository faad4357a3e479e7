//! Slippy-map tile addressing and tile URL templates.
//!
//! Tiles use the XYZ scheme shared by OpenStreetMap, Esri and the analysis
//! service's tile proxy: zoom `z` splits the Web-Mercator world into
//! `2^z × 2^z` square tiles numbered from the north-west corner.

use std::fmt;

/// Edge length of a tile in pixels.
pub const TILE_SIZE: f64 = 256.0;

/// Latitude limit of the Web-Mercator projection.
pub const MAX_LATITUDE: f64 = 85.051_128_78;

/// Subdomains substituted for `{s}`.
const SUBDOMAINS: [&str; 3] = ["a", "b", "c"];

/// Address of a single map tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

impl TileId {
    pub fn new(z: u8, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// Number of tiles along one axis at zoom `z`.
    pub fn tiles_per_axis(z: u8) -> u32 {
        1u32 << z
    }

    /// Builds a tile from unbounded grid indices.
    ///
    /// Longitude wraps around the antimeridian; rows beyond the poles do not
    /// exist and yield `None`.
    pub fn wrapping(z: u8, x: i64, y: i64) -> Option<Self> {
        let n = Self::tiles_per_axis(z) as i64;
        if y < 0 || y >= n {
            return None;
        }
        Some(Self {
            z,
            x: x.rem_euclid(n) as u32,
            y: y as u32,
        })
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// Errors produced when validating a tile URL template.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("tile URL template is empty")]
    Empty,
    #[error("tile URL template is missing the {0} placeholder")]
    MissingPlaceholder(&'static str),
}

/// A validated tile URL template such as `https://{s}.example.com/{z}/{x}/{y}.png`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TileUrlTemplate(String);

impl TileUrlTemplate {
    /// Validates a template string. `{z}`, `{x}` and `{y}` are required.
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        let template = template.trim();
        if template.is_empty() {
            return Err(TemplateError::Empty);
        }
        for placeholder in ["{z}", "{x}", "{y}"] {
            if !template.contains(placeholder) {
                return Err(TemplateError::MissingPlaceholder(placeholder));
            }
        }
        Ok(Self(template.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Expands the template for a specific tile.
    pub fn expand(&self, tile: TileId) -> String {
        let subdomain = SUBDOMAINS[((tile.x as usize) + (tile.y as usize)) % SUBDOMAINS.len()];
        self.0
            .replace("{z}", &tile.z.to_string())
            .replace("{x}", &tile.x.to_string())
            .replace("{y}", &tile.y.to_string())
            .replace("{s}", subdomain)
            .replace("{r}", "")
    }
}

impl fmt::Display for TileUrlTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapping() {
        assert_eq!(TileId::wrapping(2, -1, 1), Some(TileId::new(2, 3, 1)));
        assert_eq!(TileId::wrapping(2, 4, 0), Some(TileId::new(2, 0, 0)));
        assert_eq!(TileId::wrapping(2, 0, -1), None);
        assert_eq!(TileId::wrapping(2, 0, 4), None);
    }

    #[test]
    fn test_template_expansion() {
        let osm = TileUrlTemplate::parse("https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png")
            .unwrap();
        assert_eq!(
            osm.expand(TileId::new(3, 4, 2)),
            "https://a.tile.openstreetmap.org/3/4/2.png"
        );
        assert_eq!(
            osm.expand(TileId::new(3, 4, 3)),
            "https://b.tile.openstreetmap.org/3/4/3.png"
        );

        // Esri orders rows before columns
        let esri = TileUrlTemplate::parse(
            "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}",
        )
        .unwrap();
        assert!(esri.expand(TileId::new(5, 7, 9)).ends_with("/tile/5/9/7"));

        let retina = TileUrlTemplate::parse("http://tiles/{z}/{x}/{y}{r}.png").unwrap();
        assert_eq!(retina.expand(TileId::new(1, 0, 1)), "http://tiles/1/0/1.png");
    }

    #[test]
    fn test_template_validation() {
        assert_eq!(TileUrlTemplate::parse("   "), Err(TemplateError::Empty));
        assert_eq!(
            TileUrlTemplate::parse("http://tiles/{z}/{x}.png"),
            Err(TemplateError::MissingPlaceholder("{y}"))
        );
        assert_eq!(
            TileUrlTemplate::parse("http://tiles/{x}/{y}.png"),
            Err(TemplateError::MissingPlaceholder("{z}"))
        );
        assert!(TileUrlTemplate::parse(" http://localhost:8000/api/earth-engine/tiles/elevation/{z}/{x}/{y} ").is_ok());
    }
}
