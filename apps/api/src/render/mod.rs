//! Page rendering: the composition root of the card pipeline.
//!
//! records → paginate → slot origins → compose (fit both fields) → page plans → sink
//!
//! # Two phases
//! 1. `plan_pages` validates the layout and composes every card. It is pure, so a
//!    configuration error surfaces before the sink has seen a single page.
//! 2. `render` hands each finished page to a [`DrawingSink`].
//!
//! Everything here is CPU-bound and synchronous. Async callers run it inside
//! `tokio::task::spawn_blocking`.

pub mod logo;
pub mod pdf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::layout::{
    compose, page_count, paginate, plan_cut_marks, CutMarkSet, DrawPlan, GridPlan, LayoutConfig,
    LayoutError, LogoSize, MetricsOracle, Record, TextMeasurementOracle,
};
use crate::render::logo::LogoAsset;
use crate::render::pdf::PdfSink;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error("PDF error: {0}")]
    Pdf(String),
}

// ────────────────────────────────────────────────────────────────────────────
// Sink contract
// ────────────────────────────────────────────────────────────────────────────

/// One page worth of cards plus its cut marks, in slot order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagePlan {
    /// Zero-based page number.
    pub index: usize,
    pub cards: Vec<DrawPlan>,
    pub cut_marks: CutMarkSet,
}

/// Turns page plans into a persisted artifact. Pages arrive in order, exactly once.
pub trait DrawingSink {
    fn draw_page(&mut self, page: &PagePlan) -> Result<(), RenderError>;
}

/// What one run produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderSummary {
    pub pages: usize,
    pub cards: usize,
    pub cards_per_page: usize,
    /// Number of fields (name or role) still over the line limit at minimum size.
    pub overflows: usize,
    pub logo_used: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Planning
// ────────────────────────────────────────────────────────────────────────────

/// Validates `layout` and composes every card into page plans.
pub fn plan_pages<O: TextMeasurementOracle + ?Sized>(
    oracle: &O,
    records: &[Record],
    layout: &LayoutConfig,
    logo: Option<LogoSize>,
) -> Result<(GridPlan, Vec<PagePlan>), LayoutError> {
    let grid = layout.validate()?;
    // Page-invariant; computed once and cloned onto each page.
    let cut_marks = plan_cut_marks(&grid, &layout.card, &layout.page);

    let mut pages = Vec::with_capacity(page_count(records.len(), grid.slots_per_page));
    for (page_index, batch) in paginate(records, grid.slots_per_page)?.into_iter().enumerate() {
        let first = page_index * grid.slots_per_page;
        let cards = batch
            .iter()
            .enumerate()
            .map(|(slot, record)| {
                let origin = grid.slot_origin(slot, &layout.card);
                compose(oracle, first + slot, record, origin, layout, logo)
            })
            .collect::<Result<Vec<_>, _>>()?;

        pages.push(PagePlan {
            index: page_index,
            cards,
            cut_marks: cut_marks.clone(),
        });
    }
    Ok((grid, pages))
}

/// Plans every page, then draws them onto `sink` in order.
pub fn render<O, S>(
    oracle: &O,
    records: &[Record],
    layout: &LayoutConfig,
    logo: Option<LogoSize>,
    sink: &mut S,
) -> Result<RenderSummary, RenderError>
where
    O: TextMeasurementOracle + ?Sized,
    S: DrawingSink + ?Sized,
{
    let (grid, pages) = plan_pages(oracle, records, layout, logo)?;

    let mut overflows = 0;
    for page in &pages {
        overflows += page.cards.iter().map(DrawPlan::overflow_count).sum::<usize>();
        sink.draw_page(page)?;
    }

    let summary = RenderSummary {
        pages: pages.len(),
        cards: records.len(),
        cards_per_page: grid.slots_per_page,
        overflows,
        logo_used: logo.is_some(),
    };
    if overflows > 0 {
        warn!(overflows, "some fields exceed the line limit at minimum font size");
    }
    info!(
        pages = summary.pages,
        cards = summary.cards,
        columns = grid.columns,
        rows = grid.rows,
        cut_marks = pages.first().map_or(0, |page| page.cut_marks.len()),
        "card pages rendered"
    );
    Ok(summary)
}

/// Renders `records` to an in-memory PDF using the static Helvetica metrics.
pub fn render_pdf(
    records: &[Record],
    layout: &LayoutConfig,
    logo: Option<&LogoAsset>,
) -> Result<(Vec<u8>, RenderSummary), RenderError> {
    // Validate up front so a bad layout never allocates a document.
    layout.validate()?;
    let mut sink = PdfSink::new("Precedencias", layout.page, logo.cloned())?;
    let summary = render(&MetricsOracle, records, layout, logo.map(LogoAsset::size), &mut sink)?;
    let bytes = sink.finish()?;
    Ok((bytes, summary))
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
