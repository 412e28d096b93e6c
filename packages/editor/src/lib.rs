//! # Funnel Editor
//!
//! Editing engine for funnel documents.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ model: Funnel → Section → Column → Block    │
//! │ rules: rule table + structural validator    │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor                                      │
//! │  - tree: pure nested-block operations       │
//! │  - layout: section/column/block operations  │
//! │  - document + history: dirty state, undo    │
//! │  - session: selection, batching, notices    │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ persistence: FunnelStore (memory, files)    │
//! │ autosave: periodic + idle-debounced saves   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Pure operations**: every edit builds a new section list; the old one
//!    is untouched and becomes a history snapshot
//! 2. **Refusals are values**: the rule table answers with `Err(Rejection)`,
//!    the document stays as it was
//! 3. **Missing ids are no-ops**: edits on deleted blocks change nothing
//! 4. **One entry per action**: each session operation records one undo step
//!
//! ## Usage
//!
//! ```rust,ignore
//! use funnel_editor::{EditSession, EditorConfig};
//! use funnel_model::{BlockType, Funnel, SectionLayout};
//!
//! let mut session = EditSession::new(Funnel::new("Launch"), EditorConfig::default());
//!
//! session.add_section(SectionLayout::TwoColumn, None);
//! let column = session.sections()[0].columns[0].id.clone();
//! session.add_block(&column, BlockType::Text, None)?;
//!
//! session.undo();
//! session.save(&store).await?;
//! ```

mod autosave;
mod config;
mod document;
mod errors;
mod history;
pub mod layout;
mod persistence;
mod session;
pub mod tree;

pub use autosave::{save_now, AutoSaver, SaveOutcome};
pub use config::{EditorConfig, DEFAULT_CONFIG_NAME};
pub use document::Document;
pub use errors::EditorError;
pub use history::{History, DEFAULT_HISTORY_LIMIT};
pub use layout::{BlockLocation, ColumnPatch};
pub use persistence::{FunnelStore, JsonFileStore, MemoryStore, StoreError, StoredFunnel};
pub use session::{DragState, EditSession, Notice, SaveTicket, Selection};
pub use tree::{BlockPatch, ContentUpdate, Found, MoveSkip};

// Re-export the validator for convenience
pub use funnel_rules::{validate_block_structure, validate_funnel, StructureReport, ValidateOptions};
