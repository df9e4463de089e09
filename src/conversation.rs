//! Conversation transcript model produced by the extractor and consumed by the renderer

use serde::{Deserialize, Serialize};
use std::fmt;

/// Title used when the page carries no recognizable title element
pub const UNTITLED: &str = "Untitled Conversation";

/// Language label used when a code block has no label element
pub const DEFAULT_LANGUAGE: &str = "text";

/// One fenced code block of a message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CodeBlock {
    /// Best-effort language label
    pub language: String,

    /// Exact source text of the block
    pub code: String,
}

impl CodeBlock {
    pub fn new(language: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            code: code.into(),
        }
    }
}

/// Author of a message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Parse the page's role attribute.
    ///
    /// Returns `None` for anything other than `user` or `assistant`; such
    /// containers are skipped rather than guessed at.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            _ => None,
        }
    }

    /// Label printed above the message in the exported document
    pub fn display_name(&self) -> &'static str {
        match self {
            Role::User => "You",
            Role::Assistant => "ChatGPT",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single turn of the conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub role: Role,

    /// Plain text of the message with its code blocks' text removed
    pub content: String,

    /// Code blocks in document order
    #[serde(default)]
    pub code_blocks: Vec<CodeBlock>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            code_blocks: Vec::new(),
        }
    }

    /// Builder method: append a code block
    pub fn with_code_block(mut self, block: CodeBlock) -> Self {
        self.code_blocks.push(block);
        self
    }
}

/// A full transcript as read from the page at export time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Conversation {
    pub title: String,

    /// Messages in on-page, top-to-bottom order
    pub messages: Vec<Message>,

    /// Local time of the export, formatted for display
    pub exported_at: String,

    /// Address of the page the conversation was read from
    pub source_url: String,
}

impl Conversation {
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Read a conversation previously written with [`Conversation::to_json`]
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Current local time in the `M/D/YYYY, h:mm:ss AM` style browsers use for display
pub fn local_timestamp() -> String {
    chrono::Local::now().format("%-m/%-d/%Y, %-I:%M:%S %p").to_string()
}
