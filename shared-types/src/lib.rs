//! Shared types between the session runtime and front ends
//!
//! These types are used by both:
//! - the `block` document session actor (native Rust)
//! - web front ends (through the generated TypeScript bindings)
//!
//! Serializable with serde for JSON over WebSocket/HTTP

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ============================================================================
// Documents
// ============================================================================

/// One persisted revision of a document.
///
/// All revisions of a document share `id`; they are told apart and ordered
/// by `created_at`. Snapshots are never mutated once the store hands them out.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export, export_to = "generated.ts")]
pub struct DocumentSnapshot {
    pub id: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub user_id: String,
}

/// How the document panel renders the selected revision
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "generated.ts")]
pub enum DisplayMode {
    #[default]
    Edit,
    Diff,
}

impl DisplayMode {
    pub fn toggled(self) -> Self {
        match self {
            DisplayMode::Edit => DisplayMode::Diff,
            DisplayMode::Diff => DisplayMode::Edit,
        }
    }
}

/// Version navigation commands issued by the toolbar
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "generated.ts")]
pub enum VersionCommand {
    Next,
    Prev,
    Toggle,
    Latest,
}

/// Persistence state of the editor content
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default, TS)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
#[ts(export, export_to = "generated.ts")]
pub enum SaveStatus {
    /// Editor content matches the latest snapshot
    #[default]
    Clean,
    /// Unsaved edits waiting for the quiet window or for an earlier save
    Dirty,
    /// A save request is in flight
    Saving,
    /// The last save failed; content is still unsaved
    Error(String),
}

impl SaveStatus {
    pub fn is_dirty(&self) -> bool {
        !matches!(self, SaveStatus::Clean)
    }
}

/// Old/new content pair rendered by the diff view
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export, export_to = "generated.ts")]
pub struct DiffPair {
    pub previous: String,
    pub current: String,
}

/// Read-only projection of a document session handed to the view
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "generated.ts")]
pub struct DocumentView {
    pub document_id: String,
    pub title: String,
    /// `false` until the version history has been fetched
    pub loaded: bool,
    /// Selected revision, `None` while no snapshot exists
    #[ts(type = "number | null")]
    pub cursor: Option<usize>,
    #[ts(type = "number")]
    pub version_count: usize,
    pub is_current_version: bool,
    pub mode: DisplayMode,
    /// Content on screen: the working copy on the current version,
    /// the selected snapshot otherwise
    pub content: String,
    pub diff: Option<DiffPair>,
    pub save_status: SaveStatus,
    pub updated_at: Option<DateTime<Utc>>,
    pub block_status: BlockStatus,
}

// ============================================================================
// UI State
// ============================================================================

/// Whether the assistant is still streaming into the block
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "generated.ts")]
pub enum BlockStatus {
    Streaming,
    #[default]
    Idle,
}

/// Screen rectangle the block animates from when it opens
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "generated.ts")]
pub struct BoundingBox {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

/// Document side-panel state owned by the chat view
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "generated.ts")]
pub struct UiBlock {
    pub document_id: String,
    pub title: String,
    pub content: String,
    pub is_visible: bool,
    pub status: BlockStatus,
    pub bounding_box: BoundingBox,
}

impl UiBlock {
    /// Placeholder block shown before any document is opened, anchored to
    /// the upper-left quarter of the window.
    pub fn initial(window_width: f64, window_height: f64) -> Self {
        Self {
            document_id: "init".to_string(),
            title: String::new(),
            content: String::new(),
            is_visible: false,
            status: BlockStatus::Idle,
            bounding_box: BoundingBox {
                top: window_height / 4.0,
                left: window_width / 4.0,
                width: 250.0,
                height: 50.0,
            },
        }
    }
}

/// Chat message for UI display
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "generated.ts")]
pub struct ChatMessage {
    pub id: String,
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    pub pending: bool, // True if optimistic (not confirmed yet)
}

impl ChatMessage {
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            text: text.into(),
            sender,
            timestamp: Utc::now(),
            pending: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "generated.ts")]
pub enum Sender {
    User,
    Assistant,
    System,
}

// ============================================================================
// Models
// ============================================================================

/// Chat model selectable from the header
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export, export_to = "generated.ts")]
pub struct ModelInfo {
    pub id: String,
    pub label: String,
    pub api_identifier: String,
    pub description: String,
}

struct ModelDef {
    id: &'static str,
    label: &'static str,
    api_identifier: &'static str,
    description: &'static str,
}

impl ModelDef {
    fn to_info(&self) -> ModelInfo {
        ModelInfo {
            id: self.id.to_string(),
            label: self.label.to_string(),
            api_identifier: self.api_identifier.to_string(),
            description: self.description.to_string(),
        }
    }
}

const MODEL_CATALOG: &[ModelDef] = &[
    ModelDef {
        id: "Doc",
        label: "Doc",
        api_identifier: "gpt-4o-mini",
        description: "Small model for fast, lightweight tasks",
    },
    ModelDef {
        id: "Form",
        label: "Form",
        api_identifier: "gpt-4o",
        description: "For complex, multi-step tasks",
    },
    ModelDef {
        id: "ESG",
        label: "ESG",
        api_identifier: "gpt-4o",
        description: "For complex, multi-step tasks",
    },
    ModelDef {
        id: "CRM",
        label: "CRM",
        api_identifier: "gpt-4o",
        description: "For complex, multi-step tasks",
    },
];

pub const DEFAULT_MODEL_ID: &str = "Doc";

/// All selectable models, in display order.
pub fn models() -> Vec<ModelInfo> {
    MODEL_CATALOG.iter().map(ModelDef::to_info).collect()
}

pub fn find_model(id: &str) -> Option<ModelInfo> {
    MODEL_CATALOG
        .iter()
        .find(|model| model.id == id)
        .map(ModelDef::to_info)
}

/// Look up a model, falling back to [`DEFAULT_MODEL_ID`] for unknown ids.
pub fn resolve_model(id: &str) -> ModelInfo {
    find_model(id)
        .or_else(|| find_model(DEFAULT_MODEL_ID))
        .unwrap_or_else(|| MODEL_CATALOG[0].to_info())
}

// ============================================================================
// Tests
// ============================================================================
