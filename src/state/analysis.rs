//! Analysis results as shown in the data panel.

use crate::api::{AnalysisResponse, LatLng};
use chrono::NaiveDateTime;
use eframe::egui::Color32;

/// Flood risk reported by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RiskLevel {
    High,
    Medium,
    Low,
    /// Any other label, shown verbatim
    Other(String),
}

impl RiskLevel {
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "High" => Self::High,
            "Medium" => Self::Medium,
            "Low" => Self::Low,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
            Self::Other(label) => label,
        }
    }

    pub fn color(&self) -> Color32 {
        match self {
            Self::High => Color32::from_rgb(220, 70, 60),
            Self::Medium => Color32::from_rgb(230, 160, 40),
            Self::Low => Color32::from_rgb(90, 170, 110),
            Self::Other(_) => Color32::GRAY,
        }
    }
}

/// Social vulnerability bucket for a 0-1 SVI score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SviCategory {
    VeryHigh,
    High,
    Moderate,
    Low,
}

impl SviCategory {
    pub fn from_score(score: f64) -> Self {
        if score > 0.75 {
            Self::VeryHigh
        } else if score > 0.5 {
            Self::High
        } else if score > 0.25 {
            Self::Moderate
        } else {
            Self::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::VeryHigh => "Very High",
            Self::High => "High",
            Self::Moderate => "Moderate",
            Self::Low => "Low",
        }
    }

    pub fn color(&self) -> Color32 {
        match self {
            Self::VeryHigh => Color32::from_rgb(220, 70, 60),
            Self::High => Color32::from_rgb(230, 160, 40),
            Self::Moderate => Color32::from_rgb(90, 150, 220),
            Self::Low => Color32::from_rgb(120, 130, 140),
        }
    }
}

/// Data panel contents derived from one analysis response.
#[derive(Debug, Clone)]
pub struct AnalysisSummary {
    pub title: String,
    pub location: LatLng,
    pub completed_at: Option<NaiveDateTime>,
    pub total_buildings: Option<u64>,
    pub damaged_buildings: Option<u64>,
    pub built_up_percentage: Option<f64>,
    pub svi_score: Option<f64>,
    pub svi_description: Option<String>,
    pub flood_risk: Option<RiskLevel>,
    pub flood_percentage: Option<f64>,
    pub average_elevation: Option<f64>,
    pub narrative: Option<String>,
    pub suggested_actions: Vec<String>,
}

impl AnalysisSummary {
    pub fn from_response(title: impl Into<String>, response: &AnalysisResponse) -> Self {
        let buildings = response.building_analysis.as_ref();
        let flood = response.flood_analysis.as_ref();
        let ai = response.ai_analysis.as_ref();
        let svi = response.social_vulnerability.as_ref();

        let narrative = ai
            .map(|ai| ai.ai_response.trim())
            .filter(|text| !text.is_empty())
            .or_else(|| response.report.as_deref().map(str::trim))
            .filter(|text| !text.is_empty())
            .map(str::to_string);

        Self {
            title: title.into(),
            location: response.coordinates,
            completed_at: parse_timestamp(&response.timestamp),
            total_buildings: buildings.map(|b| b.total_buildings),
            damaged_buildings: buildings.map(|b| b.damaged_buildings),
            built_up_percentage: buildings.map(|b| b.built_up_percentage),
            svi_score: svi.map(|svi| svi.score),
            svi_description: svi
                .map(|svi| svi.description.trim())
                .filter(|text| !text.is_empty())
                .map(str::to_string),
            flood_risk: flood.map(|f| RiskLevel::parse(&f.risk_level)),
            flood_percentage: flood.map(|f| f.flood_percentage),
            average_elevation: flood.map(|f| f.average_elevation),
            narrative,
            suggested_actions: ai.map(|ai| ai.suggested_actions.clone()).unwrap_or_default(),
        }
    }

    /// Share of damaged buildings in percent; zero without a building count.
    pub fn damage_percentage(&self) -> f64 {
        match (self.damaged_buildings, self.total_buildings) {
            (Some(damaged), Some(total)) if total > 0 => damaged as f64 / total as f64 * 100.0,
            _ => 0.0,
        }
    }

    pub fn damage_label(&self) -> String {
        format!("{:.1}% of buildings affected", self.damage_percentage())
    }

    pub fn svi_category(&self) -> Option<SviCategory> {
        self.svi_score.map(SviCategory::from_score)
    }

    /// SVI score as a whole percentage, e.g. `68%`.
    pub fn svi_label(&self) -> Option<String> {
        self.svi_score.map(|score| format!("{:.0}%", score * 100.0))
    }
}

/// Parses the service's naive ISO-8601 timestamps.
fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            chrono::DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.naive_utc())
        })
}

/// Formats a count with thousands separators.
pub fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
