//! Typed events streamed to chat clients.
//!
//! The pipeline produces a strictly ordered sequence of these events per
//! query; the transport serializes each one as a standalone JSON object.
//! The union is closed so both serialization and client handling stay
//! exhaustive.
//!
//! Wire shapes:
//!
//! ```json
//! {"type": "tool_call", "data": {"tool": "thinking", "status": "..."}}
//! {"type": "citation", "data": {"id": 1, "document": "a.pdf", "page": 3, "text": "..."}}
//! {"type": "text", "content": "word "}
//! {"type": "source", "data": {"id": 1, "title": "A", "document": "a.pdf", "page": 3}}
//! {"type": "done"}
//! {"type": "error", "content": "..."}
//! ```

use serde::{Deserialize, Serialize};

/// One unit of the outbound event stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Pipeline stage update, shown as progress in the client.
    ToolCall { data: StageUpdate },
    /// One retrieved match, emitted before any generated text.
    Citation { data: Citation },
    /// A fragment of generated answer text.
    Text { content: String },
    /// Source attribution for a cited match, emitted after all text.
    Source { data: SourceAttribution },
    /// Successful end of stream. Always the final event on success.
    Done,
    /// Terminal failure; no `done` follows.
    Error { content: String },
}

impl StreamEvent {
    pub fn stage(tool: &str, status: &str) -> Self {
        StreamEvent::ToolCall {
            data: StageUpdate {
                tool: tool.to_string(),
                status: status.to_string(),
            },
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        StreamEvent::Text {
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        StreamEvent::Error {
            content: content.into(),
        }
    }
}

/// Machine stage tag plus a human-readable status line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageUpdate {
    pub tool: String,
    pub status: String,
}

/// A scored match the generated text may reference by bracketed number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    /// 1-based rank, matching the `[n]` markers in the answer text.
    pub id: usize,
    pub document: String,
    pub page: u32,
    pub text: String,
}

/// Human-readable attribution resolved against citations by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceAttribution {
    pub id: usize,
    pub title: String,
    pub document: String,
    pub page: u32,
}
