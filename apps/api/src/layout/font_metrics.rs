//! Static font-metric tables for the two card fonts (PDF base-14 Helvetica family).
//!
//! Character widths are in em units (relative to font size), taken from the Adobe
//! AFM files for Helvetica and Helvetica-Bold. Because the PDF sink draws with the
//! built-in fonts, these tables are exact for ASCII and for the Latin-1 accented
//! letters that share their base letter's advance width.
//!
//! All tables cover ASCII 0x20..=0x7E (95 printable characters).
//! Index = (char as usize) - 32.

use serde::{Deserialize, Serialize};

use crate::layout::text_fit::{Measurement, TextMeasurementOracle};

// ────────────────────────────────────────────────────────────────────────────
// Font weight class
// ────────────────────────────────────────────────────────────────────────────

/// Weight class of a card text field. Names are set bold, roles regular.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontWeight {
    /// Helvetica.
    Regular,
    /// Helvetica-Bold.
    Bold,
}

// ────────────────────────────────────────────────────────────────────────────
// Font metric table
// ────────────────────────────────────────────────────────────────────────────

/// Static character-width table for one weight class.
///
/// `widths[i]` = width of ASCII character `(i + 32)` at 1em, covering 0x20 (space)
/// through 0x7E (~).
///
/// Width array slot layout:
/// ```text
/// [0]=sp  [1]=!   [2]="   [3]=#   [4]=$   [5]=%   [6]=&   [7]='
/// [8]=(   [9]=)   [10]=*  [11]=+  [12]=,  [13]=-  [14]=.  [15]=/
/// [16..25]=0-9
/// [26]=:  [27]=;  [28]=<  [29]==  [30]=>  [31]=?  [32]=@
/// [33..58]=A-Z
/// [59]=[  [60]=\  [61]=]  [62]=^  [63]=_  [64]=`
/// [65..90]=a-z
/// [91]={  [92]=|  [93]=}  [94]=~
/// ```
pub struct FontMetricTable {
    pub weight: FontWeight,
    widths: [f32; 95],
    /// Fallback width for characters outside ASCII and the folded Latin-1 letters.
    pub average_char_width: f32,
    pub space_width: f32,
    /// Ascender − descender + line gap, in em. One rendered line is this tall.
    pub line_height_em: f32,
    /// Distance from the top of a line box to the baseline, in em.
    pub ascent_em: f32,
}

impl FontMetricTable {
    /// Width of a single character in em units.
    ///
    /// Accented Latin-1 letters measure as their base letter; anything else outside
    /// ASCII falls back to `average_char_width`.
    pub fn char_width(&self, c: char) -> f32 {
        let c = fold_latin1(c).unwrap_or(c);
        let code = c as usize;
        if (32..=126).contains(&code) {
            self.widths[code - 32]
        } else {
            self.average_char_width
        }
    }

    /// Measures the rendered width of a string in em units.
    pub fn measure_str(&self, s: &str) -> f32 {
        s.chars().map(|c| self.char_width(c)).sum()
    }

    /// Height of `line_count` lines at `font_size`, in the caller's length unit.
    pub fn block_height(&self, line_count: usize, font_size: f32) -> f32 {
        line_count as f32 * font_size * self.line_height_em
    }

    /// Greedy word wrap of `text` at `font_size` into lines no wider than `max_width`.
    ///
    /// A word that is wider than the box on its own is broken at character
    /// boundaries. Whitespace-only input yields no lines.
    pub fn wrap_lines(&self, text: &str, font_size: f32, max_width: f32) -> Vec<String> {
        let space_w = self.space_width * font_size;
        let mut lines = Vec::new();
        let mut current = String::new();
        let mut current_width = 0.0_f32;

        for word in text.split_whitespace() {
            let word_w = self.measure_str(word) * font_size;

            if word_w > max_width {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                    current_width = 0.0;
                }
                for ch in word.chars() {
                    let ch_w = self.char_width(ch) * font_size;
                    if !current.is_empty() && current_width + ch_w > max_width {
                        lines.push(std::mem::take(&mut current));
                        current_width = 0.0;
                    }
                    current.push(ch);
                    current_width += ch_w;
                }
                continue;
            }

            if current.is_empty() {
                current.push_str(word);
                current_width = word_w;
            } else if current_width + space_w + word_w > max_width {
                lines.push(std::mem::replace(&mut current, word.to_string()));
                current_width = word_w;
            } else {
                current.push(' ');
                current.push_str(word);
                current_width += space_w + word_w;
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
        lines
    }
}

/// Maps an accented Latin-1 letter to the ASCII letter whose glyph width it shares.
fn fold_latin1(c: char) -> Option<char> {
    let base = match c {
        'À'..='Å' => 'A',
        'Ç' => 'C',
        'È'..='Ë' => 'E',
        'Ì'..='Ï' => 'I',
        'Ñ' => 'N',
        'Ò'..='Ö' | 'Ø' => 'O',
        'Ù'..='Ü' => 'U',
        'Ý' => 'Y',
        'à'..='å' => 'a',
        'ç' => 'c',
        'è'..='ë' => 'e',
        'ì'..='ï' => 'i',
        'ñ' => 'n',
        'ò'..='ö' | 'ø' => 'o',
        'ù'..='ü' => 'u',
        'ý' | 'ÿ' => 'y',
        _ => return None,
    };
    Some(base)
}

// ────────────────────────────────────────────────────────────────────────────
// Static width tables  (95 ASCII printable characters each)
// ────────────────────────────────────────────────────────────────────────────

/// Helvetica, used for the role field.
static HELVETICA_TABLE: FontMetricTable = FontMetricTable {
    weight: FontWeight::Regular,
    #[rustfmt::skip]
    widths: [
        // sp     !      "      #      $      %      &      '      (      )      *      +      ,      -      .      /
        0.278, 0.278, 0.355, 0.556, 0.556, 0.889, 0.667, 0.191, 0.333, 0.333, 0.389, 0.584, 0.278, 0.333, 0.278, 0.278,
        // 0      1      2      3      4      5      6      7      8      9
        0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556,
        // :      ;      <      =      >      ?      @
        0.278, 0.278, 0.584, 0.584, 0.584, 0.556, 1.015,
        // A      B      C      D      E      F      G      H      I      J      K      L      M
        0.667, 0.667, 0.722, 0.722, 0.667, 0.611, 0.778, 0.722, 0.278, 0.500, 0.667, 0.556, 0.833,
        // N      O      P      Q      R      S      T      U      V      W      X      Y      Z
        0.722, 0.778, 0.667, 0.778, 0.722, 0.667, 0.611, 0.722, 0.667, 0.944, 0.667, 0.667, 0.611,
        // [      \      ]      ^      _      `
        0.278, 0.278, 0.278, 0.469, 0.556, 0.333,
        // a      b      c      d      e      f      g      h      i      j      k      l      m
        0.556, 0.556, 0.500, 0.556, 0.556, 0.278, 0.556, 0.556, 0.222, 0.222, 0.500, 0.222, 0.833,
        // n      o      p      q      r      s      t      u      v      w      x      y      z
        0.556, 0.556, 0.556, 0.556, 0.333, 0.500, 0.278, 0.556, 0.500, 0.722, 0.500, 0.500, 0.500,
        // {      |      }      ~
        0.334, 0.260, 0.334, 0.584,
    ],
    average_char_width: 0.611,
    space_width: 0.278,
    line_height_em: 1.156,
    ascent_em: 0.718,
};

/// Helvetica-Bold, used for the name field.
static HELVETICA_BOLD_TABLE: FontMetricTable = FontMetricTable {
    weight: FontWeight::Bold,
    #[rustfmt::skip]
    widths: [
        // sp     !      "      #      $      %      &      '      (      )      *      +      ,      -      .      /
        0.278, 0.333, 0.474, 0.556, 0.556, 0.889, 0.722, 0.238, 0.333, 0.333, 0.389, 0.584, 0.278, 0.333, 0.278, 0.278,
        // 0      1      2      3      4      5      6      7      8      9
        0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556,
        // :      ;      <      =      >      ?      @
        0.333, 0.333, 0.584, 0.584, 0.584, 0.611, 0.975,
        // A      B      C      D      E      F      G      H      I      J      K      L      M
        0.722, 0.722, 0.722, 0.722, 0.667, 0.611, 0.778, 0.722, 0.278, 0.556, 0.722, 0.611, 0.833,
        // N      O      P      Q      R      S      T      U      V      W      X      Y      Z
        0.722, 0.778, 0.667, 0.778, 0.722, 0.667, 0.611, 0.722, 0.667, 0.944, 0.667, 0.667, 0.611,
        // [      \      ]      ^      _      `
        0.333, 0.278, 0.333, 0.584, 0.556, 0.333,
        // a      b      c      d      e      f      g      h      i      j      k      l      m
        0.556, 0.611, 0.556, 0.611, 0.556, 0.333, 0.611, 0.611, 0.278, 0.278, 0.556, 0.278, 0.889,
        // n      o      p      q      r      s      t      u      v      w      x      y      z
        0.611, 0.611, 0.611, 0.611, 0.389, 0.556, 0.333, 0.611, 0.556, 0.778, 0.556, 0.556, 0.500,
        // {      |      }      ~
        0.389, 0.280, 0.389, 0.584,
    ],
    average_char_width: 0.667,
    space_width: 0.278,
    line_height_em: 1.19,
    ascent_em: 0.718,
};

/// Returns the static metric table for a given weight class.
pub fn get_metrics(weight: FontWeight) -> &'static FontMetricTable {
    match weight {
        FontWeight::Regular => &HELVETICA_TABLE,
        FontWeight::Bold => &HELVETICA_BOLD_TABLE,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Oracle backed by the static tables
// ────────────────────────────────────────────────────────────────────────────

/// Text-measurement oracle backed by the static Helvetica tables.
///
/// Stateless; the PDF sink wraps with the same tables, so what is measured here is
/// what ends up on the page.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsOracle;

impl TextMeasurementOracle for MetricsOracle {
    fn measure(
        &self,
        text: &str,
        weight: FontWeight,
        font_size: f32,
        wrap_width: f32,
    ) -> Measurement {
        let metrics = get_metrics(weight);
        let line_count = metrics.wrap_lines(text, font_size, wrap_width).len();
        Measurement {
            line_count,
            height: metrics.block_height(line_count, font_size),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_str_empty_returns_zero() {
        let metrics = get_metrics(FontWeight::Regular);
        assert_eq!(metrics.measure_str(""), 0.0);
    }

    #[test]
    fn test_measure_str_ascii_characters() {
        let metrics = get_metrics(FontWeight::Bold);
        // "ANA" = A(0.722) + N(0.722) + A(0.722) = 2.166
        let width = metrics.measure_str("ANA");
        assert!(
            (width - 2.166).abs() < 1e-3,
            "ANA width should be ~2.166, got {width}"
        );
    }

    #[test]
    fn test_accented_capitals_measure_as_base_letter() {
        let metrics = get_metrics(FontWeight::Bold);
        assert_eq!(metrics.measure_str("JOSÉ"), metrics.measure_str("JOSE"));
        assert_eq!(metrics.measure_str("MUÑOZ"), metrics.measure_str("MUNOZ"));
    }

    #[test]
    fn test_unknown_non_ascii_falls_back_to_average() {
        let metrics = get_metrics(FontWeight::Regular);
        let width = metrics.measure_str("€");
        assert!((width - metrics.average_char_width).abs() < 1e-4);
    }

    #[test]
    fn test_bold_is_wider_than_regular() {
        let text = "DIRECTORA GENERAL DE PLANEACIÓN";
        assert!(
            get_metrics(FontWeight::Bold).measure_str(text)
                > get_metrics(FontWeight::Regular).measure_str(text)
        );
    }

    #[test]
    fn test_wrap_whitespace_only_is_no_lines() {
        let metrics = get_metrics(FontWeight::Regular);
        assert!(metrics.wrap_lines("   ", 10.0, 100.0).is_empty());
        assert!(metrics.wrap_lines("", 10.0, 100.0).is_empty());
    }

    #[test]
    fn test_wrap_short_text_is_one_line() {
        let metrics = get_metrics(FontWeight::Bold);
        let lines = metrics.wrap_lines("ANA LÓPEZ", 14.0, 174.0);
        assert_eq!(lines, vec!["ANA LÓPEZ".to_string()]);
    }

    #[test]
    fn test_wrap_breaks_between_words() {
        let metrics = get_metrics(FontWeight::Bold);
        // Each word is ~30pt wide at 14pt; a 90pt box holds two per line.
        let lines = metrics.wrap_lines("ANA ANA ANA ANA", 14.0, 90.0);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "ANA ANA");
        assert_eq!(lines[1], "ANA ANA");
    }

    #[test]
    fn test_wrap_breaks_overlong_word_by_character() {
        let metrics = get_metrics(FontWeight::Regular);
        let lines = metrics.wrap_lines("WWWWWWWWWW", 10.0, 30.0);
        // W = 9.44pt at 10pt, so three fit per 30pt line.
        assert_eq!(lines.len(), 4);
        assert!(lines.iter().all(|l| metrics.measure_str(l) * 10.0 <= 30.0));
        assert_eq!(lines.concat(), "WWWWWWWWWW");
    }

    #[test]
    fn test_wrap_zero_width_still_terminates() {
        let metrics = get_metrics(FontWeight::Regular);
        let lines = metrics.wrap_lines("AB C", 10.0, 0.0);
        assert_eq!(lines, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_oracle_height_scales_with_lines_and_size() {
        let oracle = MetricsOracle;
        let one = oracle.measure("ANA", FontWeight::Regular, 10.0, 200.0);
        assert_eq!(one.line_count, 1);
        assert!((one.height - 11.56).abs() < 1e-3);

        let two = oracle.measure("ANA ANA ANA ANA", FontWeight::Bold, 14.0, 90.0);
        assert_eq!(two.line_count, 2);
        assert!((two.height - 2.0 * 14.0 * 1.19).abs() < 1e-3);
    }

    #[test]
    fn test_oracle_empty_text_has_zero_height() {
        let m = MetricsOracle.measure("", FontWeight::Bold, 14.0, 100.0);
        assert_eq!(m.line_count, 0);
        assert_eq!(m.height, 0.0);
    }
}
