//! Page grid: how many fixed-size card slots fit on a page, and where each one sits.
//!
//! All lengths share one unit (PDF points for the shipped presets). Origins are
//! top-left with y growing downwards; the PDF sink flips to PDF space.

use serde::{Deserialize, Serialize};

use crate::layout::LayoutError;

/// Length tolerance, in the geometry's unit, for a span that holds an exact number
/// of slots up to float noise.
const FIT_TOLERANCE: f32 = 1e-3;

/// Page size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub page_width: f32,
    pub page_height: f32,
}

impl PageGeometry {
    /// US Letter, 8.5" × 11" in points.
    pub const LETTER: PageGeometry = PageGeometry {
        page_width: 612.0,
        page_height: 792.0,
    };
}

/// Fixed card dimensions and the spacing around them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CardGeometry {
    pub width: f32,
    pub height: f32,
    pub gap_x: f32,
    pub gap_y: f32,
    pub margin: f32,
    pub logo_width: f32,
    /// Left inset of the logo from the card edge (also its minimum top/bottom clearance).
    pub logo_inset: f32,
    pub text_padding_left: f32,
    pub text_padding_right: f32,
    pub inter_field_spacing: f32,
    /// How far cut marks run past the outermost card edges.
    pub cut_mark_overshoot: f32,
}

impl CardGeometry {
    /// Every length must be finite and non-negative; the card itself must have area.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let lengths = [
            ("width", self.width),
            ("height", self.height),
            ("gap_x", self.gap_x),
            ("gap_y", self.gap_y),
            ("margin", self.margin),
            ("logo_width", self.logo_width),
            ("logo_inset", self.logo_inset),
            ("text_padding_left", self.text_padding_left),
            ("text_padding_right", self.text_padding_right),
            ("inter_field_spacing", self.inter_field_spacing),
            ("cut_mark_overshoot", self.cut_mark_overshoot),
        ];
        for (name, value) in lengths {
            if !value.is_finite() || value < 0.0 {
                return Err(LayoutError::InvalidGeometry(format!(
                    "{name} must be a non-negative length, got {value}"
                )));
            }
        }
        if self.width == 0.0 || self.height == 0.0 {
            return Err(LayoutError::InvalidGeometry(
                "card width and height must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Horizontal distance between the left edges of adjacent columns.
    pub fn pitch_x(&self) -> f32 {
        self.width + self.gap_x
    }

    /// Vertical distance between the top edges of adjacent rows.
    pub fn pitch_y(&self) -> f32 {
        self.height + self.gap_y
    }
}

/// Slot grid derived from a page/card pair. `columns` and `rows` are both ≥ 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridPlan {
    pub columns: usize,
    pub rows: usize,
    pub slots_per_page: usize,
}

/// Top-left corner of a card slot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlotOrigin {
    pub x: f32,
    pub y: f32,
}

/// Computes how many cards fit across and down the page.
///
/// `n` items of size `s` separated by gap `g` fit in span `w` when
/// `n·s + (n−1)·g ≤ w`, i.e. `n = ⌊(w + g) / (s + g)⌋`. The inequality is checked in
/// length units with [`FIT_TOLERANCE`].
///
/// Fails with [`LayoutError::CardDoesNotFit`] when not even one card fits; that is a
/// caller misconfiguration and is never clamped.
pub fn compute_grid(page: &PageGeometry, card: &CardGeometry) -> Result<GridPlan, LayoutError> {
    card.validate()?;
    if !(page.page_width.is_finite() && page.page_height.is_finite()) {
        return Err(LayoutError::InvalidGeometry(
            "page size must be finite".to_string(),
        ));
    }

    let columns = slots_along(page.page_width, card.margin, card.width, card.gap_x);
    let rows = slots_along(page.page_height, card.margin, card.height, card.gap_y);

    if columns < 1 || rows < 1 {
        return Err(LayoutError::CardDoesNotFit {
            card_width: card.width,
            card_height: card.height,
            page_width: page.page_width,
            page_height: page.page_height,
            margin: card.margin,
        });
    }

    Ok(GridPlan {
        columns,
        rows,
        slots_per_page: columns * rows,
    })
}

fn slots_along(span: f32, margin: f32, size: f32, gap: f32) -> usize {
    let available = span - 2.0 * margin;
    let fits = |n: usize| {
        n as f32 * size + n.saturating_sub(1) as f32 * gap <= available + FIT_TOLERANCE
    };
    if !fits(1) {
        return 0;
    }

    let mut n = (((available + gap) / (size + gap)).floor() as usize).max(1);
    while n > 1 && !fits(n) {
        n -= 1;
    }
    while fits(n + 1) {
        n += 1;
    }
    n
}

impl GridPlan {
    /// Origin of the zero-based slot `index` on a page, filled row by row.
    pub fn slot_origin(&self, index: usize, card: &CardGeometry) -> SlotOrigin {
        let col = index % self.columns;
        let row = index / self.columns;
        SlotOrigin {
            x: card.margin + col as f32 * card.pitch_x(),
            y: card.margin + row as f32 * card.pitch_y(),
        }
    }
}
