//! PDF drawing sink built on printpdf.
//!
//! Page plans use top-left coordinates in points; PDF space is bottom-left, so every
//! y is flipped against the page height here and nowhere else. Text is set in the
//! built-in Helvetica faces and wrapped with the same metric tables the fitter
//! measured with.

use printpdf::{
    BuiltinFont, Color, ColorBits, ColorSpace, Image, ImageTransform, ImageXObject,
    IndirectFontRef, Line, LineDashPattern, Mm, PdfDocument, PdfDocumentReference, PdfLayerIndex,
    PdfLayerReference, PdfPageIndex, Point, Pt, Px, Rgb,
};

use crate::layout::font_metrics::get_metrics;
use crate::layout::{FontWeight, PageGeometry, Rect, Segment, TextRun};
use crate::render::logo::LogoAsset;
use crate::render::{DrawingSink, PagePlan, RenderError};

const BORDER_THICKNESS: f32 = 2.0;
const CUT_MARK_THICKNESS: f32 = 1.0;
const CUT_MARK_DASH: i64 = 3;
const LAYER_NAME: &str = "Cards";

fn border_color() -> Color {
    // #0737AA
    Color::Rgb(Rgb::new(7.0 / 255.0, 55.0 / 255.0, 170.0 / 255.0, None))
}

fn cut_mark_color() -> Color {
    // #999999
    Color::Rgb(Rgb::new(0.6, 0.6, 0.6, None))
}

fn text_color() -> Color {
    Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None))
}

fn mm(pt: f32) -> Mm {
    Mm::from(Pt(pt))
}

fn pdf_err(e: impl std::fmt::Display) -> RenderError {
    RenderError::Pdf(e.to_string())
}

pub struct PdfSink {
    doc: PdfDocumentReference,
    page: PageGeometry,
    font_regular: IndirectFontRef,
    font_bold: IndirectFontRef,
    logo: Option<LogoAsset>,
    /// printpdf creates the first page with the document; it is used by the first draw.
    first_page: Option<(PdfPageIndex, PdfLayerIndex)>,
}

impl PdfSink {
    pub fn new(title: &str, page: PageGeometry, logo: Option<LogoAsset>) -> Result<Self, RenderError> {
        let (doc, page1, layer1) = PdfDocument::new(
            title,
            mm(page.page_width),
            mm(page.page_height),
            LAYER_NAME,
        );
        let font_regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(pdf_err)?;
        let font_bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(pdf_err)?;

        Ok(Self {
            doc,
            page,
            font_regular,
            font_bold,
            logo,
            first_page: Some((page1, layer1)),
        })
    }

    /// Serializes the document.
    pub fn finish(self) -> Result<Vec<u8>, RenderError> {
        self.doc.save_to_bytes().map_err(pdf_err)
    }

    fn next_layer(&mut self) -> PdfLayerReference {
        let (page, layer) = match self.first_page.take() {
            Some(first) => first,
            None => self.doc.add_page(
                mm(self.page.page_width),
                mm(self.page.page_height),
                LAYER_NAME,
            ),
        };
        self.doc.get_page(page).get_layer(layer)
    }

    fn point(&self, x: f32, y: f32) -> Point {
        Point {
            x: Pt(x),
            y: Pt(self.page.page_height - y),
        }
    }

    fn draw_rect(&self, layer: &PdfLayerReference, rect: &Rect) {
        let points = vec![
            (self.point(rect.x, rect.y), false),
            (self.point(rect.x + rect.width, rect.y), false),
            (self.point(rect.x + rect.width, rect.y + rect.height), false),
            (self.point(rect.x, rect.y + rect.height), false),
        ];
        layer.add_line(Line {
            points,
            is_closed: true,
        });
    }

    fn draw_segment(&self, layer: &PdfLayerReference, segment: &Segment) {
        layer.add_line(Line {
            points: vec![
                (self.point(segment.x1, segment.y1), false),
                (self.point(segment.x2, segment.y2), false),
            ],
            is_closed: false,
        });
    }

    fn draw_text(&self, layer: &PdfLayerReference, run: &TextRun) {
        let metrics = get_metrics(run.weight);
        let font = match metrics.weight {
            FontWeight::Regular => &self.font_regular,
            FontWeight::Bold => &self.font_bold,
        };
        let line_height = run.font_size * metrics.line_height_em;

        for (i, line) in metrics
            .wrap_lines(&run.text, run.font_size, run.width)
            .iter()
            .enumerate()
        {
            let line_width = metrics.measure_str(line) * run.font_size;
            let x = run.x + (run.width - line_width) / 2.0;
            let baseline = run.y + i as f32 * line_height + metrics.ascent_em * run.font_size;
            layer.use_text(
                line.as_str(),
                run.font_size,
                mm(x),
                mm(self.page.page_height - baseline),
                font,
            );
        }
    }

    fn draw_logo(&self, layer: &PdfLayerReference, logo: &LogoAsset, rect: &Rect) {
        let image = Image::from(ImageXObject {
            width: Px(logo.width_px as usize),
            height: Px(logo.height_px as usize),
            color_space: ColorSpace::Rgb,
            bits_per_component: ColorBits::Bit8,
            interpolate: true,
            image_data: logo.rgb_pixels().to_vec(),
            image_filter: None,
            clipping_bbox: None,
            smask: None,
        });

        // printpdf sizes images by DPI: pick the one that makes it `rect.width` points wide.
        let dpi = logo.width_px as f32 / (rect.width / 72.0);
        image.add_to_layer(
            layer.clone(),
            ImageTransform {
                translate_x: Some(mm(rect.x)),
                translate_y: Some(mm(self.page.page_height - (rect.y + rect.height))),
                dpi: Some(dpi),
                ..Default::default()
            },
        );
    }
}

impl DrawingSink for PdfSink {
    fn draw_page(&mut self, page: &PagePlan) -> Result<(), RenderError> {
        let layer = self.next_layer();

        layer.set_outline_color(border_color());
        layer.set_outline_thickness(BORDER_THICKNESS);
        for card in &page.cards {
            self.draw_rect(&layer, &card.border);
        }

        for card in &page.cards {
            if let (Some(rect), Some(logo)) = (card.logo.as_ref(), self.logo.as_ref()) {
                if rect.width > 0.0 {
                    self.draw_logo(&layer, logo, rect);
                }
            }
        }

        layer.set_fill_color(text_color());
        for card in &page.cards {
            self.draw_text(&layer, &card.name);
            self.draw_text(&layer, &card.role);
        }

        if page.cut_marks.is_empty() {
            return Ok(());
        }
        layer.set_outline_color(cut_mark_color());
        layer.set_outline_thickness(CUT_MARK_THICKNESS);
        layer.set_line_dash_pattern(LineDashPattern {
            dash_1: Some(CUT_MARK_DASH),
            gap_1: Some(CUT_MARK_DASH),
            ..Default::default()
        });
        for segment in page
            .cut_marks
            .vertical
            .iter()
            .chain(&page.cut_marks.horizontal)
        {
            self.draw_segment(&layer, segment);
        }
        layer.set_line_dash_pattern(LineDashPattern::default());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{LayoutConfig, MetricsOracle, Record};
    use crate::render::logo::tests::png_bytes;
    use crate::render::render;

    fn records(n: usize) -> Vec<Record> {
        (0..n)
            .map(|i| Record::new(format!("MARÍA FERNANDA {i}"), "SECRETARIA TÉCNICA"))
            .collect()
    }

    #[test]
    fn test_pdf_with_logo_and_two_pages() {
        let layout = LayoutConfig::default();
        let logo = LogoAsset::from_bytes("logo.png", &png_bytes(40, 20)).unwrap();
        let mut sink = PdfSink::new("Test", layout.page, Some(logo.clone())).unwrap();

        let summary = render(&MetricsOracle, &records(20), &layout, Some(logo.size()), &mut sink).unwrap();
        assert_eq!(summary.pages, 2);
        assert!(summary.logo_used);

        let bytes = sink.finish().unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_logo_rect_without_asset_is_skipped() {
        let layout = LayoutConfig::default();
        let mut sink = PdfSink::new("Test", layout.page, None).unwrap();
        let size = crate::layout::LogoSize {
            width_px: 10,
            height_px: 10,
        };
        render(&MetricsOracle, &records(3), &layout, Some(size), &mut sink).unwrap();
        assert!(sink.finish().unwrap().starts_with(b"%PDF"));
    }

    #[test]
    fn test_pdf_written_to_disk() {
        let layout = LayoutConfig::default();
        let mut sink = PdfSink::new("Test", layout.page, None).unwrap();
        render(&MetricsOracle, &records(1), &layout, None, &mut sink).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("precedencias.pdf");
        std::fs::write(&path, sink.finish().unwrap()).unwrap();
        let written = std::fs::read(&path).unwrap();
        assert!(written.len() > 100);
        assert!(written.starts_with(b"%PDF"));
    }
}
