//! Text-fit search: picks the largest font size at which a field wraps to at most
//! `max_lines` lines inside its text box.
//!
//! # Search
//! Linear, decreasing one unit per step from `initial_size` down to `min_size`, one
//! oracle call per step. The last step is clamped to `min_size`.
//!
//! If no size in range satisfies the line limit the field is set at `min_size` and
//! the result is flagged `overflow`. The card is still drawn.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::layout::font_metrics::FontWeight;
use crate::layout::LayoutError;

/// Size decrement per search step.
const SIZE_STEP: f32 = 1.0;

/// Cards hold at most two lines per field.
pub const MAX_LINES: usize = 2;

// ────────────────────────────────────────────────────────────────────────────
// Oracle contract
// ────────────────────────────────────────────────────────────────────────────

/// What the oracle reports for one string at one size and wrap width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub line_count: usize,
    pub height: f32,
}

/// Measures how a string renders. Must be deterministic for fixed inputs.
pub trait TextMeasurementOracle {
    fn measure(
        &self,
        text: &str,
        weight: FontWeight,
        font_size: f32,
        wrap_width: f32,
    ) -> Measurement;
}

// ────────────────────────────────────────────────────────────────────────────
// Field bounds and result
// ────────────────────────────────────────────────────────────────────────────

/// Font-size search bounds for one card field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldFit {
    pub weight: FontWeight,
    pub initial_size: f32,
    pub min_size: f32,
    pub max_lines: usize,
}

impl FieldFit {
    /// Bold name field, starting at `initial_size`.
    pub fn name(initial_size: f32, min_size: f32) -> Self {
        Self {
            weight: FontWeight::Bold,
            initial_size,
            min_size,
            max_lines: MAX_LINES,
        }
    }

    /// Regular-weight role field, starting at `initial_size`.
    pub fn role(initial_size: f32, min_size: f32) -> Self {
        Self {
            weight: FontWeight::Regular,
            initial_size,
            min_size,
            max_lines: MAX_LINES,
        }
    }

    /// Rejects bounds that no search could honour. `field` names the field in the error.
    pub fn validate(&self, field: &'static str) -> Result<(), LayoutError> {
        let finite = self.initial_size.is_finite() && self.min_size.is_finite();
        if !finite || self.min_size <= 0.0 || self.min_size > self.initial_size {
            return Err(LayoutError::InvalidFontBounds {
                field,
                initial_size: self.initial_size,
                min_size: self.min_size,
            });
        }
        if self.max_lines == 0 {
            return Err(LayoutError::InvalidMaxLines { field });
        }
        Ok(())
    }
}

/// Outcome of fitting one field on one card.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    pub font_size: f32,
    pub line_count: usize,
    pub rendered_height: f32,
    /// True when even `min_size` wraps to more than `max_lines` lines.
    pub overflow: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Search
// ────────────────────────────────────────────────────────────────────────────

/// Finds the largest size in `[min_size, initial_size]` at which `text` wraps to at
/// most `bounds.max_lines` lines within `wrap_width`.
///
/// Empty or whitespace-only text short-circuits to `initial_size` with zero lines
/// and zero height, without consulting the oracle.
pub fn fit<O: TextMeasurementOracle + ?Sized>(
    oracle: &O,
    text: &str,
    bounds: &FieldFit,
    wrap_width: f32,
) -> Result<FitResult, LayoutError> {
    bounds.validate("field")?;

    if text.trim().is_empty() {
        return Ok(FitResult {
            font_size: bounds.initial_size,
            line_count: 0,
            rendered_height: 0.0,
            overflow: false,
        });
    }

    let mut size = bounds.initial_size;
    let mut steps = 0u32;
    loop {
        let measured = oracle.measure(text, bounds.weight, size, wrap_width);
        steps += 1;
        let fits = measured.line_count <= bounds.max_lines;

        if fits || size <= bounds.min_size {
            debug!(
                font_size = size,
                lines = measured.line_count,
                steps,
                overflow = !fits,
                "text fit search finished"
            );
            return Ok(FitResult {
                font_size: size,
                line_count: measured.line_count,
                rendered_height: measured.height,
                overflow: !fits,
            });
        }

        size = (size - SIZE_STEP).max(bounds.min_size);
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::font_metrics::MetricsOracle;
    use std::cell::RefCell;

    /// Fixed-pitch oracle: every char is `0.5 × size` wide, lines are `size` tall.
    /// Records every size it was asked about.
    struct FixedPitchOracle {
        calls: RefCell<Vec<f32>>,
    }

    impl FixedPitchOracle {
        fn new() -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl TextMeasurementOracle for FixedPitchOracle {
        fn measure(&self, text: &str, _: FontWeight, font_size: f32, wrap_width: f32) -> Measurement {
            self.calls.borrow_mut().push(font_size);
            let chars_per_line = ((wrap_width / (0.5 * font_size)).floor() as usize).max(1);
            let n = text.chars().count();
            let line_count = n.div_ceil(chars_per_line);
            Measurement {
                line_count,
                height: line_count as f32 * font_size,
            }
        }
    }

    fn name_bounds() -> FieldFit {
        FieldFit::name(14.0, 6.0)
    }

    #[test]
    fn test_short_text_keeps_initial_size() {
        let oracle = FixedPitchOracle::new();
        let result = fit(&oracle, "ANA", &name_bounds(), 100.0).unwrap();
        assert_eq!(result.font_size, 14.0);
        assert_eq!(result.line_count, 1);
        assert!(!result.overflow);
        assert_eq!(*oracle.calls.borrow(), vec![14.0]);
    }

    #[test]
    fn test_empty_text_skips_oracle() {
        let oracle = FixedPitchOracle::new();
        let result = fit(&oracle, "", &name_bounds(), 100.0).unwrap();
        assert_eq!(result.font_size, 14.0);
        assert_eq!(result.line_count, 0);
        assert_eq!(result.rendered_height, 0.0);
        assert!(!result.overflow);
        assert!(oracle.calls.borrow().is_empty());
    }

    #[test]
    fn test_shrinks_to_largest_size_within_two_lines() {
        // 40 chars in a 100-wide box: size s holds floor(200/s) chars per line.
        // s=10 → 20/line → 2 lines; s=11 → 18/line → 3 lines. Answer: 10.
        let oracle = FixedPitchOracle::new();
        let text = "X".repeat(40);
        let result = fit(&oracle, &text, &name_bounds(), 100.0).unwrap();
        assert_eq!(result.font_size, 10.0);
        assert_eq!(result.line_count, 2);
        assert!(!result.overflow);
        assert_eq!(*oracle.calls.borrow(), vec![14.0, 13.0, 12.0, 11.0, 10.0]);
    }

    #[test]
    fn test_result_is_maximal_over_full_range() {
        let oracle = FixedPitchOracle::new();
        let bounds = name_bounds();
        for len in [1usize, 10, 25, 40, 55, 66, 80] {
            let text = "X".repeat(len);
            let result = fit(&oracle, &text, &bounds, 100.0).unwrap();
            assert!(result.font_size <= bounds.initial_size);
            assert!(result.font_size >= bounds.min_size);

            let best = (6..=14)
                .rev()
                .map(|s| s as f32)
                .find(|&s| oracle.measure(&text, bounds.weight, s, 100.0).line_count <= 2);
            match best {
                Some(s) => {
                    assert_eq!(result.font_size, s, "len {len}");
                    assert!(!result.overflow);
                }
                None => {
                    assert_eq!(result.font_size, bounds.min_size, "len {len}");
                    assert!(result.overflow);
                }
            }
        }
    }

    #[test]
    fn test_overflow_stops_at_min_size() {
        let oracle = FixedPitchOracle::new();
        // At size 6 a 100-wide box holds 33 chars/line; 200 chars is 7 lines.
        let text = "X".repeat(200);
        let result = fit(&oracle, &text, &name_bounds(), 100.0).unwrap();
        assert_eq!(result.font_size, 6.0);
        assert!(result.line_count > 2);
        assert!(result.overflow);
    }

    #[test]
    fn test_fractional_range_clamps_to_min() {
        let oracle = FixedPitchOracle::new();
        let bounds = FieldFit::name(7.5, 6.0);
        let text = "X".repeat(500);
        let result = fit(&oracle, &text, &bounds, 100.0).unwrap();
        assert_eq!(*oracle.calls.borrow(), vec![7.5, 6.5, 6.0]);
        assert_eq!(result.font_size, 6.0);
    }

    #[test]
    fn test_min_above_initial_is_configuration_error() {
        let oracle = FixedPitchOracle::new();
        let bounds = FieldFit::name(8.0, 10.0);
        let err = fit(&oracle, "ANA", &bounds, 100.0).unwrap_err();
        assert!(matches!(err, LayoutError::InvalidFontBounds { .. }));
    }

    #[test]
    fn test_zero_max_lines_is_configuration_error() {
        let bounds = FieldFit {
            max_lines: 0,
            ..FieldFit::role(10.0, 6.0)
        };
        assert!(matches!(
            bounds.validate("role"),
            Err(LayoutError::InvalidMaxLines { field: "role" })
        ));
    }

    #[test]
    fn test_shorter_text_never_gets_smaller_size() {
        let oracle = MetricsOracle;
        let bounds = name_bounds();
        let words = ["MARÍA", "FERNANDA", "DE", "LOS", "ÁNGELES", "GUTIÉRREZ", "VILLASEÑOR", "DE", "LA", "PEÑA"];
        let mut previous: Option<f32> = None;
        // Walk from the longest prefix to the shortest; sizes must not decrease.
        for n in (1..=words.len()).rev() {
            let text = words[..n].join(" ");
            let size = fit(&oracle, &text, &bounds, 120.0).unwrap().font_size;
            if let Some(prev) = previous {
                assert!(size >= prev, "prefix of {n} words got {size} < {prev}");
            }
            previous = Some(size);
        }
    }

    #[test]
    fn test_long_spanish_name_on_short_card() {
        // A 100pt box is a narrow card with a logo column.
        let oracle = MetricsOracle;
        let text = "JOSÉ ALBERTO RODRÍGUEZ MARTÍNEZ DE LA CRUZ";
        let result = fit(&oracle, text, &name_bounds(), 100.0).unwrap();

        assert!(result.font_size < 14.0, "name must shrink");
        assert!(result.font_size >= 6.0);
        if result.overflow {
            assert_eq!(result.font_size, 6.0);
            assert!(result.line_count >= 3);
        } else {
            assert!(result.line_count <= 2);
            let one_bigger = oracle.measure(text, FontWeight::Bold, result.font_size + 1.0, 100.0);
            assert!(one_bigger.line_count > 2, "one size up must not fit");
        }
    }

    #[test]
    fn test_long_name_overflows_in_tiny_box() {
        let oracle = MetricsOracle;
        let text = "JOSÉ ALBERTO RODRÍGUEZ MARTÍNEZ DE LA CRUZ";
        let result = fit(&oracle, text, &name_bounds(), 40.0).unwrap();
        assert_eq!(result.font_size, 6.0);
        assert!(result.line_count >= 3);
        assert!(result.overflow);
    }
}
