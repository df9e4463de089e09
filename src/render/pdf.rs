//! Writes a [`LaidOutDocument`] as PDF bytes using the built-in base-14 fonts

use crate::error::{ExportError, Result};
use crate::render::layout::{DrawOp, LaidOutDocument, RgbColor};
use crate::render::metrics::FontFace;
use printpdf::path::PaintMode;
use printpdf::{BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference, Rect, Rgb};

const LAYER_NAME: &str = "Content";

struct Fonts {
    helvetica: IndirectFontRef,
    helvetica_bold: IndirectFontRef,
    courier: IndirectFontRef,
}

impl Fonts {
    fn load(doc: &PdfDocumentReference) -> Result<Self> {
        let builtin = |font: BuiltinFont| {
            doc.add_builtin_font(font)
                .map_err(|e| ExportError::Rendering(format!("Failed to add font {:?}: {}", font, e)))
        };

        Ok(Self {
            helvetica: builtin(BuiltinFont::Helvetica)?,
            helvetica_bold: builtin(BuiltinFont::HelveticaBold)?,
            courier: builtin(BuiltinFont::Courier)?,
        })
    }

    fn get(&self, face: FontFace) -> &IndirectFontRef {
        match face {
            FontFace::Helvetica => &self.helvetica,
            FontFace::HelveticaBold => &self.helvetica_bold,
            FontFace::Courier => &self.courier,
        }
    }
}

/// Serialize the laid out pages to a PDF file image
pub fn write_pdf(document: &LaidOutDocument) -> Result<Vec<u8>> {
    if document.pages.is_empty() {
        return Err(ExportError::Rendering("Document has no pages".to_string()));
    }

    let geometry = document.geometry;
    let (width, height) = (Mm(geometry.width), Mm(geometry.height));
    let (doc, first_page, first_layer) = PdfDocument::new(document.title.as_str(), width, height, LAYER_NAME);
    let fonts = Fonts::load(&doc)?;

    for (index, page) in document.pages.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_index, layer_index) = doc.add_page(width, height, LAYER_NAME);
            doc.get_page(page_index).get_layer(layer_index)
        };

        for op in &page.ops {
            draw(&layer, op, &fonts, geometry.height);
        }
    }

    doc.save_to_bytes()
        .map_err(|e| ExportError::Rendering(format!("Failed to serialize PDF: {}", e)))
}

fn draw(layer: &PdfLayerReference, op: &DrawOp, fonts: &Fonts, page_height: f32) {
    // Layout measures from the top edge, PDF from the bottom
    match op {
        DrawOp::Text {
            x,
            y,
            text,
            face,
            size,
            color,
        } => {
            if text.is_empty() {
                return;
            }
            layer.set_fill_color(pdf_color(*color));
            layer.use_text(text.as_str(), *size, Mm(*x), Mm(page_height - *y), fonts.get(*face));
        }
        DrawOp::Rect {
            x,
            y,
            width,
            height,
            color,
        } => {
            layer.set_fill_color(pdf_color(*color));
            let rect = Rect::new(Mm(*x), Mm(page_height - *y - *height), Mm(*x + *width), Mm(page_height - *y))
                .with_mode(PaintMode::Fill);
            layer.add_rect(rect);
        }
    }
}

fn pdf_color(color: RgbColor) -> Color {
    Color::Rgb(Rgb::new(
        f32::from(color.r) / 255.0,
        f32::from(color.g) / 255.0,
        f32::from(color.b) / 255.0,
        None,
    ))
}
