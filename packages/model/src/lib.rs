//! # Funnel Model
//!
//! Content model for the funnel builder.
//!
//! ```text
//! Funnel
//!  └─ Section (layout template)
//!      └─ Column (width %)
//!          └─ Block forest (text, image, container, tabs, ...)
//!              └─ Block children (container-like types only)
//! ```
//!
//! The persisted shape of the content payload is
//! `{ "sections": [ { id, type: "section", layout, settings, columns: [...] } ] }`.
//! Legacy flat-block payloads are migrated on load (see [`legacy`]).

mod block;
mod content;
mod error;
mod funnel;
mod id_generator;
mod layout;
pub mod legacy;

pub use block::{Animation, Block, BlockSettings, BlockType};
pub use content::*;
pub use error::{ModelError, ModelResult};
pub use funnel::{Funnel, FunnelContent, FunnelSettings, FunnelStatus};
pub use id_generator::{session_seed, IdGenerator};
pub use layout::{Column, ColumnSettings, Section, SectionLayout, SectionSettings, VerticalAlign};
