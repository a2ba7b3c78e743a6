//! Card composition: turns one record and one slot into a draw plan.
//!
//! Composition is pure: the plan says where the border, logo and both text runs go,
//! and the sink decides how to paint them.
//!
//! # Card anatomy
//! ```text
//! ┌──────────────────────────────────────────┐
//! │ inset ┌──────┐ pad ┌──────────────┐ pad  │
//! │       │ logo │     │  NAME (bold) │      │  text block vertically centred,
//! │       │      │     │  role        │      │  each line horizontally centred
//! │       └──────┘     └──────────────┘      │
//! └──────────────────────────────────────────┘
//! ```
//! With a logo the text box starts after the inset, the logo and the left padding,
//! and is `width − (logo_width + both paddings)` wide. Without a logo it spans the
//! card minus both paddings.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::layout::font_metrics::FontWeight;
use crate::layout::grid::SlotOrigin;
use crate::layout::text_fit::{fit, FitResult, TextMeasurementOracle};
use crate::layout::{LayoutConfig, LayoutError};

// ────────────────────────────────────────────────────────────────────────────
// Inputs
// ────────────────────────────────────────────────────────────────────────────

/// One card's content, already normalized by ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub name: String,
    pub role: String,
}

impl Record {
    pub fn new(name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
        }
    }
}

/// Intrinsic pixel size of the logo. All the composer needs to keep its aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogoSize {
    pub width_px: u32,
    pub height_px: u32,
}

impl LogoSize {
    fn is_drawable(&self) -> bool {
        self.width_px > 0 && self.height_px > 0
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Draw plan
// ────────────────────────────────────────────────────────────────────────────

/// Axis-aligned rectangle, top-left page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// One text field placed on a card. `x`/`width` describe the text box the lines are
/// centred in; `y` is the top of the first line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    pub weight: FontWeight,
    pub font_size: f32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub line_count: usize,
    pub height: f32,
    pub overflow: bool,
}

/// Everything the sink needs to paint one card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawPlan {
    /// Zero-based position of the record in the whole run.
    pub index: usize,
    pub border: Rect,
    pub logo: Option<Rect>,
    pub name: TextRun,
    pub role: TextRun,
}

impl DrawPlan {
    pub fn overflow_count(&self) -> usize {
        usize::from(self.name.overflow) + usize::from(self.role.overflow)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Composition
// ────────────────────────────────────────────────────────────────────────────

/// Composes the draw plan for `record` in the slot at `origin`.
///
/// A logo with a zero dimension cannot be scaled; it is dropped for this card only
/// and the text box widens to the no-logo layout.
pub fn compose<O: TextMeasurementOracle + ?Sized>(
    oracle: &O,
    index: usize,
    record: &Record,
    origin: SlotOrigin,
    layout: &LayoutConfig,
    logo: Option<LogoSize>,
) -> Result<DrawPlan, LayoutError> {
    let card = &layout.card;

    let logo = match logo {
        Some(size) if size.is_drawable() => Some(size),
        Some(size) => {
            warn!(
                card = index,
                width_px = size.width_px,
                height_px = size.height_px,
                "logo has no area, drawing card without it"
            );
            None
        }
        None => None,
    };

    let (text_x, text_width) = match logo {
        Some(_) => (
            origin.x + card.logo_inset + card.logo_width + card.text_padding_left,
            card.width - (card.logo_width + card.text_padding_left + card.text_padding_right),
        ),
        None => (
            origin.x + card.text_padding_left,
            card.width - (card.text_padding_left + card.text_padding_right),
        ),
    };
    let text_width = text_width.max(0.0);

    let name_fit = fit(oracle, &record.name, &layout.name, text_width)?;
    let role_fit = fit(oracle, &record.role, &layout.role, text_width)?;

    for (field, result) in [("name", &name_fit), ("role", &role_fit)] {
        if result.overflow {
            warn!(
                card = index,
                field,
                font_size = result.font_size,
                lines = result.line_count,
                "text still exceeds line limit at minimum size"
            );
        }
    }

    // Spacing only separates two visible fields; an empty field takes no room.
    let spacing = if name_fit.rendered_height > 0.0 && role_fit.rendered_height > 0.0 {
        card.inter_field_spacing
    } else {
        0.0
    };
    let total_height = name_fit.rendered_height + spacing + role_fit.rendered_height;
    let text_y = origin.y + (card.height - total_height) / 2.0;

    let name = text_run(&record.name, layout.name.weight, &name_fit, text_x, text_y, text_width);
    let role = text_run(
        &record.role,
        layout.role.weight,
        &role_fit,
        text_x,
        text_y + name_fit.rendered_height + spacing,
        text_width,
    );

    Ok(DrawPlan {
        index,
        border: Rect {
            x: origin.x,
            y: origin.y,
            width: card.width,
            height: card.height,
        },
        logo: logo.map(|size| logo_rect(size, origin, layout)),
        name,
        role,
    })
}

fn text_run(text: &str, weight: FontWeight, fit: &FitResult, x: f32, y: f32, width: f32) -> TextRun {
    TextRun {
        text: text.to_string(),
        weight,
        font_size: fit.font_size,
        x,
        y,
        width,
        line_count: fit.line_count,
        height: fit.rendered_height,
        overflow: fit.overflow,
    }
}

/// Logo scaled to `logo_width`, vertically centred, anchored at the left inset.
/// A tall logo is shrunk (aspect preserved) to keep `logo_inset` clear above and below.
fn logo_rect(size: LogoSize, origin: SlotOrigin, layout: &LayoutConfig) -> Rect {
    let card = &layout.card;
    let aspect = size.width_px as f32 / size.height_px as f32;
    let max_height = (card.height - 2.0 * card.logo_inset).max(0.0);

    let mut width = card.logo_width;
    let mut height = width / aspect;
    if height > max_height {
        height = max_height;
        width = height * aspect;
    }

    Rect {
        x: origin.x + card.logo_inset,
        y: origin.y + (card.height - height) / 2.0,
        width,
        height,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
