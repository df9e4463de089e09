//! Page layout: turns a conversation into positioned drawing operations
//!
//! All coordinates are millimetres from the top-left corner of the page, with
//! text positioned by its baseline. Layout is one forward pass with a running
//! vertical cursor; page footers are stamped in a second pass once the final
//! page count is known.

use crate::conversation::{CodeBlock, Conversation, Message};
use crate::render::metrics::{FontFace, PT_TO_MM, split_text_to_size};
use crate::render::{DEFAULT_FONT_SIZE, RenderOptions, Theme};
use crate::text::strip_html;

const TITLE_FONT_SIZE: f32 = 18.0;
const TITLE_LINE_HEIGHT: f32 = 7.0;
const TITLE_GAP: f32 = 10.0;

const META_FONT_SIZE: f32 = 9.0;
const META_LINE_GAP: f32 = 4.0;
const META_BLOCK_HEIGHT: f32 = 15.0;

const ROLE_LINE_HEIGHT: f32 = 6.0;
const MESSAGE_GAP: f32 = 10.0;
/// Body leading at the default font size; scales linearly with it
const BODY_LINE_HEIGHT: f32 = 4.5;

const CODE_FONT_SIZE: f32 = 9.0;
const CODE_LINE_HEIGHT: f32 = CODE_FONT_SIZE * 1.2 * PT_TO_MM;
const CODE_PADDING: f32 = 10.0;
const CODE_INSET: f32 = 5.0;
const CODE_SPACING: f32 = 5.0;
const CODE_TAB: &str = "    ";

const FOOTER_FONT_SIZE: f32 = 8.0;
const FOOTER_OFFSET: f32 = 5.0;

/// An sRGB colour with 8-bit channels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RgbColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn grey(level: u8) -> Self {
        Self::new(level, level, level)
    }
}

/// Colours for one theme
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    /// Full-page fill, drawn first on every page
    pub page_background: Option<RgbColor>,
    pub text: RgbColor,
    pub muted: RgbColor,
    pub code_background: RgbColor,
    pub code_text: RgbColor,
    pub accent: RgbColor,
}

impl Palette {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Self {
                page_background: None,
                text: RgbColor::grey(0),
                muted: RgbColor::grey(150),
                code_background: RgbColor::new(0x1e, 0x1e, 0x1e),
                code_text: RgbColor::new(0xd4, 0xd4, 0xd4),
                accent: RgbColor::new(0x9c, 0xdc, 0xfe),
            },
            Theme::Dark => Self {
                page_background: Some(RgbColor::new(0x20, 0x21, 0x23)),
                text: RgbColor::new(0xec, 0xec, 0xf1),
                muted: RgbColor::grey(150),
                code_background: RgbColor::grey(0),
                code_text: RgbColor::new(0xd4, 0xd4, 0xd4),
                accent: RgbColor::new(0x9c, 0xdc, 0xfe),
            },
        }
    }
}

/// Fixed page size and margins
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
}

impl PageGeometry {
    /// A4 portrait with 15mm margins
    pub const A4: PageGeometry = PageGeometry {
        width: 210.0,
        height: 297.0,
        margin: 15.0,
    };

    pub fn content_width(&self) -> f32 {
        self.width - self.margin * 2.0
    }

    /// Lowest baseline allowed for content
    pub fn bottom(&self) -> f32 {
        self.height - self.margin
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::A4
    }
}

/// A positioned drawing primitive
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        x: f32,
        /// Baseline
        y: f32,
        text: String,
        face: FontFace,
        size: f32,
        color: RgbColor,
    },
    /// Filled rectangle; `y` is the top edge
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: RgbColor,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub ops: Vec<DrawOp>,
}

impl Page {
    /// Text of every text operation on the page, in drawing order
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            DrawOp::Rect { .. } => None,
        })
    }
}

/// The fully laid out document, ready to be written
#[derive(Debug, Clone, PartialEq)]
pub struct LaidOutDocument {
    pub title: String,
    pub geometry: PageGeometry,
    pub pages: Vec<Page>,
}

/// Lay out a conversation and stamp page footers
pub fn layout_conversation(conversation: &Conversation, options: &RenderOptions) -> LaidOutDocument {
    let palette = Palette::for_theme(options.theme);
    let mut layout = Layout::new(PageGeometry::A4, palette, options);

    layout.header(conversation);
    for message in &conversation.messages {
        layout.message(message);
    }

    let mut document = LaidOutDocument {
        title: conversation.title.clone(),
        geometry: layout.geometry,
        pages: layout.pages,
    };
    stamp_footers(&mut document, palette.muted);

    log::debug!(
        "Laid out {} messages on {} pages",
        conversation.messages.len(),
        document.pages.len()
    );
    document
}

/// Second pass: add a centered `Page i of N` footer to every page
pub fn stamp_footers(document: &mut LaidOutDocument, color: RgbColor) {
    let total = document.pages.len();
    let geometry = document.geometry;

    for (index, page) in document.pages.iter_mut().enumerate() {
        let text = format!("Page {} of {}", index + 1, total);
        let width = FontFace::Helvetica.text_width(&text, FOOTER_FONT_SIZE);
        page.ops.push(DrawOp::Text {
            x: (geometry.width - width) / 2.0,
            y: geometry.height - FOOTER_OFFSET,
            text,
            face: FontFace::Helvetica,
            size: FOOTER_FONT_SIZE,
            color,
        });
    }
}

struct Layout {
    geometry: PageGeometry,
    palette: Palette,
    include_metadata: bool,
    body_size: f32,
    body_line_height: f32,
    pages: Vec<Page>,
    y: f32,
}

impl Layout {
    fn new(geometry: PageGeometry, palette: Palette, options: &RenderOptions) -> Self {
        let mut layout = Self {
            geometry,
            palette,
            include_metadata: options.include_metadata,
            body_size: options.font_size,
            body_line_height: BODY_LINE_HEIGHT * options.font_size / DEFAULT_FONT_SIZE,
            pages: Vec::new(),
            y: geometry.margin,
        };
        layout.new_page();
        layout
    }

    fn new_page(&mut self) {
        let mut page = Page::default();
        if let Some(color) = self.palette.page_background {
            page.ops.push(DrawOp::Rect {
                x: 0.0,
                y: 0.0,
                width: self.geometry.width,
                height: self.geometry.height,
                color,
            });
        }
        self.pages.push(page);
        self.y = self.geometry.margin;
    }

    fn text(&mut self, x: f32, y: f32, text: impl Into<String>, face: FontFace, size: f32, color: RgbColor) {
        let op = DrawOp::Text {
            x,
            y,
            text: text.into(),
            face,
            size,
            color,
        };
        if let Some(page) = self.pages.last_mut() {
            page.ops.push(op);
        }
    }

    fn header(&mut self, conversation: &Conversation) {
        let width = self.geometry.content_width();
        let lines = split_text_to_size(&conversation.title, FontFace::HelveticaBold, TITLE_FONT_SIZE, width);

        for (i, line) in lines.iter().enumerate() {
            let line_width = FontFace::HelveticaBold.text_width(line, TITLE_FONT_SIZE);
            let x = (self.geometry.width - line_width) / 2.0;
            let y = self.y + i as f32 * TITLE_LINE_HEIGHT;
            self.text(x, y, line.as_str(), FontFace::HelveticaBold, TITLE_FONT_SIZE, self.palette.text);
        }
        self.y += lines.len() as f32 * TITLE_LINE_HEIGHT + TITLE_GAP;

        if self.include_metadata {
            let margin = self.geometry.margin;
            let muted = self.palette.muted;
            let exported = format!("Exported on: {}", conversation.exported_at);
            let source = format!("Source: {}", conversation.source_url);

            self.text(margin, self.y, exported, FontFace::Helvetica, META_FONT_SIZE, muted);
            self.text(margin, self.y + META_LINE_GAP, source, FontFace::Helvetica, META_FONT_SIZE, muted);
            self.y += META_BLOCK_HEIGHT;
        }
    }

    fn message(&mut self, message: &Message) {
        // Only breaks once the cursor has reached the boundary; the label may still end a page
        if self.y >= self.geometry.bottom() {
            self.new_page();
        }

        let margin = self.geometry.margin;
        self.text(
            margin,
            self.y,
            message.role.display_name(),
            FontFace::HelveticaBold,
            self.body_size,
            self.palette.text,
        );
        self.y += ROLE_LINE_HEIGHT;

        let plain = strip_html(&message.content);
        let lines = split_text_to_size(&plain, FontFace::Helvetica, self.body_size, self.geometry.content_width());
        for line in lines {
            if self.y > self.geometry.bottom() {
                self.new_page();
            }
            self.text(margin, self.y, line, FontFace::Helvetica, self.body_size, self.palette.text);
            self.y += self.body_line_height;
        }

        for block in &message.code_blocks {
            self.y = self.code_block(block, self.y);
        }

        self.y += MESSAGE_GAP;
    }

    /// Lay out one code block at `y` and return the cursor below it
    fn code_block(&mut self, block: &CodeBlock, y: f32) -> f32 {
        let margin = self.geometry.margin;
        let width = self.geometry.content_width();
        let code = block.code.replace('\t', CODE_TAB);
        let lines = split_text_to_size(&code, FontFace::Courier, CODE_FONT_SIZE, width - CODE_PADDING);
        let height = lines.len() as f32 * CODE_LINE_HEIGHT + CODE_PADDING;

        let usable = self.geometry.bottom() - margin;
        if height > usable {
            log::warn!(
                "{} code block of {} lines is taller than a page and will be clipped",
                block.language,
                lines.len()
            );
        }

        let mut y = y;
        // A fresh page is pointless when the block already starts at the top
        if y + height > self.geometry.bottom() && y > margin {
            self.new_page();
            y = self.y;
        }

        if let Some(page) = self.pages.last_mut() {
            page.ops.push(DrawOp::Rect {
                x: margin,
                y,
                width,
                height,
                color: self.palette.code_background,
            });
        }

        let x = margin + CODE_INSET;
        self.text(x, y + CODE_INSET, block.language.as_str(), FontFace::Courier, CODE_FONT_SIZE, self.palette.accent);
        for (i, line) in lines.into_iter().enumerate() {
            let line_y = y + CODE_PADDING + i as f32 * CODE_LINE_HEIGHT;
            self.text(x, line_y, line, FontFace::Courier, CODE_FONT_SIZE, self.palette.code_text);
        }

        y + height + CODE_SPACING
    }
}
