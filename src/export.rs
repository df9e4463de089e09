//! Export orchestration: extract, render and save, one export at a time
//!
//! [`ExportControl`] is the state a caller shows to the user (a button
//! label, a status line). [`Exporter`] runs the pipeline and keeps the
//! control in step with it.

use crate::conversation::Conversation;
use crate::dom::DomTree;
use crate::error::{ExportError, Result};
use crate::extractor;
use crate::render::{self, RenderOptions};
use crate::text::sanitize_filename;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How long a finished export keeps showing its outcome
pub const DEFAULT_RESET_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportState {
    Ready,
    InProgress,
    Succeeded,
    Failed,
}

impl ExportState {
    /// Short status text for a trigger button or status line
    pub fn label(&self) -> &'static str {
        match self {
            ExportState::Ready => "PDF",
            ExportState::InProgress => "Generating...",
            ExportState::Succeeded => "✓ Downloaded",
            ExportState::Failed => "Error",
        }
    }
}

impl fmt::Display for ExportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Single-flight export state owned by the caller
#[derive(Debug, Clone)]
pub struct ExportControl {
    state: ExportState,
    reset_delay: Duration,
}

impl Default for ExportControl {
    fn default() -> Self {
        Self {
            state: ExportState::Ready,
            reset_delay: DEFAULT_RESET_DELAY,
        }
    }
}

impl ExportControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set how long the outcome stays visible
    pub fn with_reset_delay(mut self, delay: Duration) -> Self {
        self.reset_delay = delay;
        self
    }

    pub fn state(&self) -> ExportState {
        self.state
    }

    pub fn is_busy(&self) -> bool {
        self.state == ExportState::InProgress
    }

    /// Claim the control for a new export
    pub fn begin(&mut self) -> Result<()> {
        if self.is_busy() {
            return Err(ExportError::ExportInProgress);
        }
        self.state = ExportState::InProgress;
        Ok(())
    }

    /// Record the outcome of the running export
    pub fn finish(&mut self, succeeded: bool) {
        self.state = if succeeded {
            ExportState::Succeeded
        } else {
            ExportState::Failed
        };
    }

    /// Wait out the reset delay, then return to `Ready`.
    ///
    /// Does nothing while an export is still running or when already ready.
    pub async fn settle(&mut self) {
        if matches!(self.state, ExportState::Ready | ExportState::InProgress) {
            return;
        }
        tokio::time::sleep(self.reset_delay).await;
        self.state = ExportState::Ready;
    }
}

/// Outcome of a successful export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub path: PathBuf,
    pub file_name: String,
    pub page_count: usize,
    pub message_count: usize,
    pub byte_len: usize,
}

/// File name a conversation is saved under
pub fn file_name_for(conversation: &Conversation) -> String {
    format!("{}.pdf", sanitize_filename(&conversation.title))
}

/// Runs extraction, rendering and saving
#[derive(Debug, Clone)]
pub struct Exporter {
    options: RenderOptions,
    output_dir: PathBuf,
    output_path: Option<PathBuf>,
}

impl Default for Exporter {
    fn default() -> Self {
        Self {
            options: RenderOptions::default(),
            output_dir: PathBuf::from("."),
            output_path: None,
        }
    }
}

impl Exporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the render options
    pub fn options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    /// Builder method: directory for files named after the conversation title
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Builder method: write to this exact path instead
    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    /// Where `conversation` would be written
    pub fn target_path(&self, conversation: &Conversation) -> PathBuf {
        match &self.output_path {
            Some(path) => path.clone(),
            None => self.output_dir.join(file_name_for(conversation)),
        }
    }

    /// Extract a conversation from `tree` and save it as a PDF
    pub async fn export(&self, control: &mut ExportControl, tree: &DomTree) -> Result<ExportReport> {
        control.begin()?;
        log::info!("Exporting conversation from {}", tree.url);

        let conversation = extractor::extract_conversation(tree);
        let result = self.save(conversation).await;
        Self::complete(control, result)
    }

    /// Save an already extracted conversation as a PDF
    pub async fn export_conversation(
        &self,
        control: &mut ExportControl,
        conversation: Conversation,
    ) -> Result<ExportReport> {
        control.begin()?;
        log::info!("Exporting conversation '{}'", conversation.title);

        let result = self.save(conversation).await;
        Self::complete(control, result)
    }

    fn complete(control: &mut ExportControl, result: Result<ExportReport>) -> Result<ExportReport> {
        match &result {
            Ok(report) => log::info!(
                "Saved {} ({} messages, {} pages, {} bytes)",
                report.path.display(),
                report.message_count,
                report.page_count,
                report.byte_len
            ),
            Err(e) => log::error!("Export failed: {}", e),
        }

        control.finish(result.is_ok());
        result
    }

    async fn save(&self, conversation: Conversation) -> Result<ExportReport> {
        if conversation.is_empty() {
            return Err(ExportError::EmptyConversation);
        }

        let path = self.target_path(&conversation);
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_name_for(&conversation));
        let message_count = conversation.messages.len();

        let options = self.options.clone();
        let rendered = tokio::task::spawn_blocking(move || render::render_pdf(&conversation, &options))
            .await
            .map_err(|e| ExportError::Rendering(format!("Render task failed: {}", e)))??;

        create_parent_dir(&path).await?;
        tokio::fs::write(&path, &rendered.bytes).await?;

        Ok(ExportReport {
            path,
            file_name,
            page_count: rendered.page_count,
            message_count,
            byte_len: rendered.bytes.len(),
        })
    }
}

async fn create_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{CodeBlock, Message, Role};
    use crate::dom::ElementNode;

    fn conversation(title: &str) -> Conversation {
        Conversation {
            title: title.to_string(),
            messages: vec![
                Message::new(Role::User, "Show me a loop"),
                Message::new(Role::Assistant, "Here:  done")
                    .with_code_block(CodeBlock::new("rust", "for i in 0..3 {\n    println!(\"{}\", i);\n}")),
            ],
            exported_at: "10/16/2026, 3:04:05 PM".to_string(),
            source_url: "https://chat.example.com/c/1".to_string(),
        }
    }

    fn chat_tree() -> DomTree {
        let message = |role: &str, text: &str| {
            ElementNode::new("div")
                .with_attribute("data-message-author-role", role)
                .with_child(ElementNode::new("div").with_attribute("class", "markdown").with_text(text))
        };

        let root = ElementNode::new("body")
            .with_child(ElementNode::new("h1").with_text("Loops"))
            .with_child(message("user", "How do loops work?"))
            .with_child(message("assistant", "Like this."));

        DomTree::new(root).with_url("https://chat.example.com/c/2")
    }

    #[test]
    fn test_control_lifecycle() {
        let mut control = ExportControl::new();
        assert_eq!(control.state(), ExportState::Ready);

        control.begin().unwrap();
        assert!(control.is_busy());
        assert!(matches!(control.begin(), Err(ExportError::ExportInProgress)));

        control.finish(true);
        assert_eq!(control.state(), ExportState::Succeeded);
        assert!(control.begin().is_ok());

        control.finish(false);
        assert_eq!(control.state(), ExportState::Failed);
    }

    #[test]
    fn test_state_labels() {
        assert_eq!(ExportState::Ready.to_string(), "PDF");
        assert_eq!(ExportState::InProgress.label(), "Generating...");
        assert_eq!(ExportState::Succeeded.label(), "✓ Downloaded");
        assert_eq!(ExportState::Failed.label(), "Error");
    }

    #[tokio::test]
    async fn test_settle_returns_to_ready() {
        let mut control = ExportControl::new().with_reset_delay(Duration::from_millis(10));

        control.begin().unwrap();
        control.settle().await;
        assert_eq!(control.state(), ExportState::InProgress);

        control.finish(false);
        control.settle().await;
        assert_eq!(control.state(), ExportState::Ready);
    }

    #[test]
    fn test_file_name_and_target_path() {
        let conversation = conversation("Rust: loops?");
        assert_eq!(file_name_for(&conversation), "Rust__loops_.pdf");

        let exporter = Exporter::new().output_dir("/tmp/out");
        assert_eq!(exporter.target_path(&conversation), PathBuf::from("/tmp/out/Rust__loops_.pdf"));

        let exporter = exporter.output_path("/tmp/explicit.pdf");
        assert_eq!(exporter.target_path(&conversation), PathBuf::from("/tmp/explicit.pdf"));
    }

    #[tokio::test]
    async fn test_export_conversation_writes_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = Exporter::new().output_dir(dir.path());
        let mut control = ExportControl::new();

        let report = exporter
            .export_conversation(&mut control, conversation("Test Chat"))
            .await
            .unwrap();

        assert_eq!(report.file_name, "Test_Chat.pdf");
        assert_eq!(report.path, dir.path().join("Test_Chat.pdf"));
        assert_eq!(report.message_count, 2);
        assert_eq!(report.page_count, 1);
        assert_eq!(control.state(), ExportState::Succeeded);

        let bytes = std::fs::read(&report.path).unwrap();
        assert_eq!(bytes.len(), report.byte_len);
        assert!(bytes.starts_with(b"%PDF-"));
    }

    #[tokio::test]
    async fn test_export_from_tree() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = Exporter::new().output_dir(dir.path().join("nested"));
        let mut control = ExportControl::new();

        let report = exporter.export(&mut control, &chat_tree()).await.unwrap();

        assert_eq!(report.file_name, "Loops.pdf");
        assert_eq!(report.message_count, 2);
        assert!(report.path.exists());
    }

    #[tokio::test]
    async fn test_empty_conversation_fails_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = Exporter::new().output_dir(dir.path());
        let mut control = ExportControl::new();

        let tree = DomTree::new(ElementNode::new("body"));
        let result = exporter.export(&mut control, &tree).await;

        assert!(matches!(result, Err(ExportError::EmptyConversation)));
        assert_eq!(control.state(), ExportState::Failed);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_render_error_is_propagated() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = Exporter::new()
            .output_dir(dir.path())
            .options(RenderOptions::new().font_size(-1.0));
        let mut control = ExportControl::new();

        let result = exporter.export_conversation(&mut control, conversation("Bad")).await;

        assert!(matches!(result, Err(ExportError::Rendering(_))));
        assert_eq!(control.state(), ExportState::Failed);
    }

    #[tokio::test]
    async fn test_busy_control_rejects_export() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = Exporter::new().output_dir(dir.path());
        let mut control = ExportControl::new();
        control.begin().unwrap();

        let result = exporter.export_conversation(&mut control, conversation("Busy")).await;

        assert!(matches!(result, Err(ExportError::ExportInProgress)));
        assert!(control.is_busy());
    }
}
