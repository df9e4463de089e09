//! PDF rendering of a [`Conversation`]
//!
//! Rendering happens in two stages:
//! - [`layout`]: paginates the transcript into positioned text and rectangles
//! - [`pdf`]: writes those pages with the base-14 PDF fonts
//!
//! [`metrics`] supplies the glyph widths both stages agree on.

pub mod layout;
pub mod metrics;
pub mod pdf;

pub use layout::{DrawOp, LaidOutDocument, Page, PageGeometry, Palette, RgbColor};
pub use metrics::{FontFace, split_text_to_size};

use crate::conversation::Conversation;
use crate::error::{ExportError, Result};
use std::fmt;

/// Body text size in points
pub const DEFAULT_FONT_SIZE: f32 = 11.0;

/// Colour scheme of the exported document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Light => f.write_str("light"),
            Theme::Dark => f.write_str("dark"),
        }
    }
}

/// Options controlling the look of the exported document
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub theme: Theme,

    /// Print the export time and source URL under the title
    pub include_metadata: bool,

    /// Body text size in points
    pub font_size: f32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            include_metadata: true,
            font_size: DEFAULT_FONT_SIZE,
        }
    }
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the theme
    pub fn theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Builder method: show or hide the metadata lines
    pub fn include_metadata(mut self, include: bool) -> Self {
        self.include_metadata = include;
        self
    }

    /// Builder method: set the body font size, in points
    pub fn font_size(mut self, size: f32) -> Self {
        self.font_size = size;
        self
    }

    fn validate(&self) -> Result<()> {
        if !self.font_size.is_finite() || !(4.0..=32.0).contains(&self.font_size) {
            return Err(ExportError::Rendering(format!(
                "Font size {} is outside the supported 4-32pt range",
                self.font_size
            )));
        }
        Ok(())
    }
}

/// A rendered document
#[derive(Debug, Clone)]
pub struct RenderedPdf {
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

/// Lay out and write a conversation as a PDF
pub fn render_pdf(conversation: &Conversation, options: &RenderOptions) -> Result<RenderedPdf> {
    options.validate()?;

    let document = layout::layout_conversation(conversation, options);
    let bytes = pdf::write_pdf(&document)?;

    log::debug!(
        "Rendered {} pages ({} bytes, {} theme)",
        document.pages.len(),
        bytes.len(),
        options.theme
    );
    Ok(RenderedPdf {
        bytes,
        page_count: document.pages.len(),
    })
}
