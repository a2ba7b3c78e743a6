// Card layout engine: page grid, pagination, text fitting, card composition, cut marks.
// Everything here is pure and synchronous; callers on the async runtime go through
// tokio::task::spawn_blocking (see render).

pub mod composer;
pub mod cut_marks;
pub mod font_metrics;
pub mod grid;
pub mod paginate;
pub mod text_fit;

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use composer::{compose, DrawPlan, LogoSize, Record, Rect, TextRun};
pub use cut_marks::{plan_cut_marks, CutMarkSet, Segment};
pub use font_metrics::{FontWeight, MetricsOracle};
pub use grid::{compute_grid, CardGeometry, GridPlan, PageGeometry, SlotOrigin};
pub use paginate::{page_count, paginate};
pub use text_fit::{fit, FieldFit, FitResult, TextMeasurementOracle};

/// Invalid layout configuration. Always fatal: raised before any page is drawn.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    #[error(
        "a {card_width}x{card_height} card does not fit on a {page_width}x{page_height} page with {margin} margins"
    )]
    CardDoesNotFit {
        card_width: f32,
        card_height: f32,
        page_width: f32,
        page_height: f32,
        margin: f32,
    },

    #[error("{field} font bounds invalid: min size {min_size} must be positive and not above initial size {initial_size}")]
    InvalidFontBounds {
        field: &'static str,
        initial_size: f32,
        min_size: f32,
    },

    #[error("{field} must allow at least one line")]
    InvalidMaxLines { field: &'static str },

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("slots per page must be at least 1")]
    ZeroSlots,

    #[error("unknown card preset '{0}' (expected 'standard' or 'large')")]
    UnknownPreset(String),
}

/// Named starting points for a [`LayoutConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    /// 280 × 95 cards, 2 × 7 per Letter page. Name 14pt, role 10pt.
    #[default]
    Standard,
    /// 280 × 130 cards, 2 × 5 per Letter page, bigger logo and type. Name 18pt, role 14pt.
    Large,
}

impl FromStr for Preset {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Preset::Standard),
            "large" => Ok(Preset::Large),
            other => Err(LayoutError::UnknownPreset(other.to_string())),
        }
    }
}

/// Read-only geometry and font bounds shared by every component for one run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub page: PageGeometry,
    pub card: CardGeometry,
    pub name: FieldFit,
    pub role: FieldFit,
}

impl LayoutConfig {
    pub fn preset(preset: Preset) -> Self {
        match preset {
            Preset::Standard => LayoutConfig {
                page: PageGeometry::LETTER,
                card: CardGeometry {
                    width: 280.0,
                    height: 95.0,
                    gap_x: 20.0,
                    gap_y: 15.0,
                    margin: 15.0,
                    logo_width: 80.0,
                    logo_inset: 8.0,
                    text_padding_left: 10.0,
                    text_padding_right: 8.0,
                    inter_field_spacing: 4.0,
                    cut_mark_overshoot: 5.0,
                },
                name: FieldFit::name(14.0, 6.0),
                role: FieldFit::role(10.0, 6.0),
            },
            Preset::Large => LayoutConfig {
                page: PageGeometry::LETTER,
                card: CardGeometry {
                    width: 280.0,
                    height: 130.0,
                    gap_x: 20.0,
                    gap_y: 20.0,
                    margin: 15.0,
                    logo_width: 100.0,
                    logo_inset: 8.0,
                    text_padding_left: 12.0,
                    text_padding_right: 8.0,
                    inter_field_spacing: 6.0,
                    cut_mark_overshoot: 5.0,
                },
                name: FieldFit::name(18.0, 6.0),
                role: FieldFit::role(14.0, 6.0),
            },
        }
    }

    /// Checks every bound and returns the page grid. Run once, before drawing anything.
    pub fn validate(&self) -> Result<GridPlan, LayoutError> {
        self.name.validate("name")?;
        self.role.validate("role")?;
        compute_grid(&self.page, &self.card)
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self::preset(Preset::Standard)
    }
}
