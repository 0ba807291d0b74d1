//! Analytics paginated PDF renderer.
//!
//! Deck content laid out top to bottom on A4 pages, breaking to a new page
//! when vertical space runs out. Charts are embedded as raster images.

use std::io::BufWriter;

use printpdf::{
    BuiltinFont, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument,
    PdfDocumentReference, PdfLayerReference,
};

use formex_analytics::{render_chart, Analytics, StatsDetail};
use formex_model::{Artifact, ArtifactFormat};

use crate::common::{artifact_file_name, distribution_lines, response_line};
use crate::error::{ExportError, Result};

const PAGE_WIDTH: Mm = Mm(210.0);
const PAGE_HEIGHT: Mm = Mm(297.0);
const MARGIN_LEFT: f32 = 20.0;
const TOP_Y: f32 = 277.0;
const BOTTOM_Y: f32 = 20.0;

/// Chart images are placed at this resolution; 640x400 px comes out at
/// roughly 148x92 mm.
const CHART_DPI: f32 = 110.0;
const CHART_HEIGHT_MM: f32 = 400.0 / CHART_DPI * 25.4;

/// Free-text answers quoted per open question.
const PDF_SAMPLE_LIMIT: usize = 5;

/// Render the paginated report.
pub fn export_pdf(analytics: &Analytics, form_id: &str) -> Result<Artifact> {
    let (doc, page, layer) = PdfDocument::new(
        &analytics.form_title,
        PAGE_WIDTH,
        PAGE_HEIGHT,
        "Layer 1",
    );
    let regular = builtin_font(&doc, BuiltinFont::Helvetica)?;
    let bold = builtin_font(&doc, BuiltinFont::HelveticaBold)?;

    {
        let mut cursor = PageCursor {
            doc: &doc,
            layer: doc.get_page(page).get_layer(layer),
            y: TOP_Y,
        };

        cursor.text(&analytics.form_title, 16.0, &bold, 0.0);
        cursor.gap(4.0);
        cursor.text(
            &format!(
                "Total submissions: {} ({} completed, {} partial)",
                analytics.total, analytics.completed, analytics.partial
            ),
            10.0,
            &regular,
            0.0,
        );
        cursor.gap(6.0);

        for stats in &analytics.questions {
            cursor.ensure(24.0);
            cursor.text(&stats.title, 12.0, &bold, 0.0);
            cursor.text(&response_line(stats), 9.0, &regular, 2.0);
            cursor.gap(1.0);
            for line in distribution_lines(stats) {
                for wrapped in wrap_text(&line, 100) {
                    cursor.text(&wrapped, 9.0, &regular, 4.0);
                }
            }
            if let StatsDetail::TextSamples(samples) = &stats.detail {
                for sample in samples.iter().take(PDF_SAMPLE_LIMIT) {
                    for wrapped in wrap_text(&format!("\u{201c}{sample}\u{201d}"), 100) {
                        cursor.text(&wrapped, 9.0, &regular, 4.0);
                    }
                }
            }
            if let Some(png) = render_chart(stats)? {
                cursor.image(&png)?;
            }
            cursor.gap(6.0);
        }
    }

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| ExportError::Pdf(e.to_string()))?;
    let bytes = buf
        .into_inner()
        .map_err(|e| ExportError::Pdf(e.to_string()))?;

    Ok(Artifact::new(
        bytes,
        artifact_file_name(form_id, "analytics", ArtifactFormat::Pdf),
        ArtifactFormat::Pdf,
    ))
}

fn builtin_font(doc: &PdfDocumentReference, font: BuiltinFont) -> Result<IndirectFontRef> {
    doc.add_builtin_font(font)
        .map_err(|e| ExportError::Pdf(e.to_string()))
}

/// Tracks the write position, opening a new page when a block would not fit.
struct PageCursor<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    y: f32,
}

impl PageCursor<'_> {
    fn ensure(&mut self, needed: f32) {
        if self.y - needed < BOTTOM_Y {
            let (page, layer) = self.doc.add_page(PAGE_WIDTH, PAGE_HEIGHT, "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = TOP_Y;
        }
    }

    fn text(&mut self, text: &str, size: f32, font: &IndirectFontRef, indent: f32) {
        let line_height = size * 0.5;
        self.ensure(line_height);
        self.layer.use_text(
            text,
            size,
            Mm(MARGIN_LEFT + indent),
            Mm(self.y),
            font,
        );
        self.y -= line_height;
    }

    fn image(&mut self, png: &[u8]) -> Result<()> {
        self.ensure(CHART_HEIGHT_MM + 4.0);
        let dynamic = printpdf::image_crate::load_from_memory(png)
            .map_err(|e| ExportError::Pdf(e.to_string()))?;
        let image = Image::from_dynamic_image(&dynamic);
        self.y -= CHART_HEIGHT_MM;
        image.add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(MARGIN_LEFT)),
                translate_y: Some(Mm(self.y)),
                dpi: Some(CHART_DPI),
                ..ImageTransform::default()
            },
        );
        self.y -= 4.0;
        Ok(())
    }

    fn gap(&mut self, mm: f32) {
        self.y -= mm;
    }
}

/// Greedy word wrap at a character budget.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
