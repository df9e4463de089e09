//! # chat-pdf-export
//!
//! Reads a chat conversation out of a live web page and writes it to a
//! paginated PDF, with code blocks drawn as dark, monospaced panels.
//!
//! ## Command line
//!
//! ```bash
//! # Export a shared conversation
//! cargo run --bin chat-pdf-export -- https://chatgpt.com/share/<id>
//!
//! # Private conversations need a logged-in profile
//! cargo run --bin chat-pdf-export -- --headed --user-data-dir ~/.config/chat-profile https://chatgpt.com/c/<id>
//!
//! # Re-render a saved DOM snapshot in the dark theme
//! cargo run --bin chat-pdf-export -- --snapshot page.json --theme dark
//! ```
//!
//! ## Library usage
//!
//! ```rust,no_run
//! use chat_pdf_export::{BrowserSession, LaunchOptions, extractor, render};
//!
//! # fn main() -> chat_pdf_export::Result<()> {
//! let session = BrowserSession::launch(LaunchOptions::default())?;
//! session.navigate("https://chatgpt.com/share/example")?;
//! session.wait_for_navigation()?;
//!
//! let conversation = extractor::extract_conversation(&session.snapshot_dom()?);
//! let pdf = render::render_pdf(&conversation, &render::RenderOptions::default())?;
//! std::fs::write("chat.pdf", pdf.bytes)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! - [`browser`]: Browser session management and configuration
//! - [`dom`]: DOM snapshots and the CSS selector subset used to query them
//! - [`extractor`]: Turns a snapshot into a [`Conversation`]
//! - [`render`]: Page layout and PDF output
//! - [`export`]: One-at-a-time export with status tracking (requires `runtime` feature)
//! - [`error`]: Error types and result aliases

pub mod browser;
pub mod conversation;
pub mod dom;
pub mod error;
pub mod extractor;
pub mod render;
pub mod text;

#[cfg(feature = "runtime")]
pub mod export;

pub use browser::{BrowserSession, ConnectionOptions, LaunchOptions};
pub use conversation::{CodeBlock, Conversation, Message, Role};
pub use dom::{DomTree, ElementNode, SelectorList};
pub use error::{ExportError, Result};
pub use render::{RenderOptions, RenderedPdf, Theme, render_pdf};
pub use text::{sanitize_filename, strip_html};

#[cfg(feature = "runtime")]
pub use export::{ExportControl, ExportReport, ExportState, Exporter};
