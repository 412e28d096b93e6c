//! # Document Handle
//!
//! Editing state of one funnel: the funnel itself plus the dirty flag,
//! the save guard and a version counter.
//!
//! ## Lifecycle
//!
//! ```text
//! Clean ──edit──▶ Dirty ──save ok──▶ Clean
//!                   │
//!                   └──save failed──▶ Dirty
//! ```
//!
//! `is_saving` is orthogonal to dirty/clean and only prevents overlapping
//! saves.

use funnel_model::{Funnel, FunnelSettings, IdGenerator, Section};
use tracing::debug;

use crate::persistence::StoredFunnel;

/// Editable funnel document
#[derive(Debug, Clone)]
pub struct Document {
    funnel: Funnel,

    /// Increments on every change to the funnel
    version: u64,

    dirty: bool,

    is_saving: bool,
}

impl Document {
    pub fn new(funnel: Funnel) -> Self {
        Self {
            funnel,
            version: 0,
            dirty: false,
            is_saving: false,
        }
    }

    /// Load from a persistence record; unreadable content yields an empty page
    pub fn from_stored(record: &StoredFunnel, ids: &mut IdGenerator) -> Self {
        Self::new(record.to_funnel(ids))
    }

    pub fn funnel(&self) -> &Funnel {
        &self.funnel
    }

    pub fn sections(&self) -> &[Section] {
        &self.funnel.content.sections
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Check if document has unsaved changes
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_saving(&self) -> bool {
        self.is_saving
    }

    /// Replace the section list. Returns false (and stays clean) if nothing changed.
    pub fn replace_sections(&mut self, sections: Vec<Section>) -> bool {
        if self.funnel.content.sections == sections {
            return false;
        }
        self.funnel.content.sections = sections;
        self.touch();
        true
    }

    /// Replace the whole funnel (undo/redo). Persistence identity and
    /// publication state are owned by the store and kept.
    pub fn restore(&mut self, snapshot: &Funnel) {
        let id = self.funnel.id;
        let status = self.funnel.status;
        let is_published = self.funnel.is_published;

        self.funnel = snapshot.clone();
        self.funnel.id = id;
        self.funnel.status = status;
        self.funnel.is_published = is_published;
        self.touch();
    }

    /// Mirror the store's publication state. Not an edit.
    pub(crate) fn sync_publication(&mut self, record: &StoredFunnel) {
        self.funnel.status = record.status;
        self.funnel.is_published = record.is_published;
    }

    pub fn set_name(&mut self, name: &str) -> bool {
        if name.trim().is_empty() || self.funnel.name == name {
            return false;
        }
        self.funnel.name = name.to_string();
        self.touch();
        true
    }

    pub fn set_description(&mut self, description: Option<String>) -> bool {
        if self.funnel.description == description {
            return false;
        }
        self.funnel.description = description;
        self.touch();
        true
    }

    pub fn set_settings(&mut self, settings: FunnelSettings) -> bool {
        if self.funnel.settings == settings {
            return false;
        }
        self.funnel.settings = settings;
        self.touch();
        true
    }

    /// Mark a save as started. Returns false if one is already in flight.
    pub(crate) fn start_save(&mut self) -> bool {
        if self.is_saving {
            return false;
        }
        self.is_saving = true;
        true
    }

    /// Record a successful save of the state at `saved_version`
    pub(crate) fn finish_save(&mut self, saved_version: u64, id: u64) {
        self.is_saving = false;
        if self.funnel.id.is_none() {
            self.funnel.id = Some(id);
        }
        if self.version == saved_version {
            self.dirty = false;
        } else {
            debug!(
                saved_version,
                current_version = self.version,
                "Edits arrived during save, document stays dirty"
            );
        }
    }

    pub(crate) fn fail_save(&mut self) {
        self.is_saving = false;
    }

    fn touch(&mut self) {
        self.version += 1;
        self.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use funnel_model::SectionLayout;

    #[test]
    fn test_new_document_is_clean() {
        let doc = Document::new(Funnel::new("Launch"));
        assert_eq!(doc.version(), 0);
        assert!(!doc.is_dirty());
        assert!(!doc.is_saving());
    }

    #[test]
    fn test_unchanged_sections_do_not_dirty() {
        let mut doc = Document::new(Funnel::new("Launch"));
        assert!(!doc.replace_sections(Vec::new()));
        assert!(!doc.is_dirty());

        assert!(doc.replace_sections(vec![Section::new("s", SectionLayout::Single)]));
        assert!(doc.is_dirty());
        assert_eq!(doc.version(), 1);
    }

    #[test]
    fn test_save_cycle() {
        let mut doc = Document::new(Funnel::new("Launch"));
        doc.set_name("Launch v2");

        assert!(doc.start_save());
        assert!(!doc.start_save());

        doc.finish_save(doc.version(), 7);
        assert!(!doc.is_dirty());
        assert!(!doc.is_saving());
        assert_eq!(doc.funnel().id, Some(7));
    }

    #[test]
    fn test_edit_during_save_keeps_dirty() {
        let mut doc = Document::new(Funnel::new("Launch"));
        doc.set_name("A");
        let saved_version = doc.version();
        doc.start_save();

        doc.set_name("B");
        doc.finish_save(saved_version, 1);

        assert!(doc.is_dirty());
    }

    #[test]
    fn test_failed_save_keeps_dirty() {
        let mut doc = Document::new(Funnel::new("Launch"));
        doc.set_name("A");
        doc.start_save();
        doc.fail_save();

        assert!(doc.is_dirty());
        assert!(!doc.is_saving());
    }

    #[test]
    fn test_restore_keeps_persisted_id() {
        let mut doc = Document::new(Funnel::new("Launch"));
        doc.set_name("A");
        doc.start_save();
        doc.finish_save(doc.version(), 42);

        doc.restore(&Funnel::new("Old"));
        assert_eq!(doc.funnel().id, Some(42));
        assert_eq!(doc.funnel().name, "Old");
        assert!(doc.is_dirty());
    }
}
