//! Cut marks: dashed guides printed in the gutters between cards.
//!
//! Marks depend only on the grid, never on record content, so one set serves every
//! page of a run. Outer page edges get no mark: there is nothing beyond them to
//! separate from.

use serde::{Deserialize, Serialize};

use crate::layout::grid::{CardGeometry, GridPlan, PageGeometry};

/// A straight line from `(x1, y1)` to `(x2, y2)`, top-left page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CutMarkSet {
    pub vertical: Vec<Segment>,
    pub horizontal: Vec<Segment>,
}

impl CutMarkSet {
    pub fn len(&self) -> usize {
        self.vertical.len() + self.horizontal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Plans one mark down the middle of every internal column gutter and one across
/// every internal row gutter, each overshooting the margins by `cut_mark_overshoot`.
pub fn plan_cut_marks(grid: &GridPlan, card: &CardGeometry, page: &PageGeometry) -> CutMarkSet {
    let overshoot = card.cut_mark_overshoot;

    let vertical = (1..grid.columns)
        .map(|c| {
            let x = card.margin + c as f32 * card.pitch_x() - card.gap_x / 2.0;
            Segment {
                x1: x,
                y1: card.margin - overshoot,
                x2: x,
                y2: page.page_height - card.margin + overshoot,
            }
        })
        .collect();

    let horizontal = (1..grid.rows)
        .map(|r| {
            let y = card.margin + r as f32 * card.pitch_y() - card.gap_y / 2.0;
            Segment {
                x1: card.margin - overshoot,
                y1: y,
                x2: page.page_width - card.margin + overshoot,
                y2: y,
            }
        })
        .collect();

    CutMarkSet {
        vertical,
        horizontal,
    }
}
