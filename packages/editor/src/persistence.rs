//! # Persistence Boundary
//!
//! The editor hands finished documents to a [`FunnelStore`] as
//! [`StoredFunnel`] records: content and settings travel as JSON strings
//! next to name, description and publication state. The store owns record
//! identity and the publish/unpublish transitions; a plain save never
//! changes publication state of an existing record.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use funnel_model::{Funnel, FunnelContent, FunnelSettings, FunnelStatus, IdGenerator, ModelError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Funnel {0} not found")]
    NotFound(u64),

    #[error("Funnel name must not be empty")]
    EmptyName,

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),
}

/// Persistence record of a funnel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFunnel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Serialized `{ "sections": [...] }` payload
    pub content: String,

    /// Serialized funnel settings
    pub settings: String,

    #[serde(default)]
    pub status: FunnelStatus,

    #[serde(default)]
    pub is_published: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl StoredFunnel {
    pub fn from_funnel(funnel: &Funnel) -> Result<Self, StoreError> {
        Ok(Self {
            id: funnel.id,
            name: funnel.name.clone(),
            description: funnel.description.clone(),
            content: funnel.content.to_json_string()?,
            settings: serde_json::to_string(&funnel.settings)?,
            status: funnel.status,
            is_published: funnel.is_published,
            updated_at: None,
        })
    }

    /// Rebuild the document. Unreadable content or settings fall back to
    /// an empty page and default settings.
    pub fn to_funnel(&self, ids: &mut IdGenerator) -> Funnel {
        let mut funnel = Funnel::new(self.name.clone());
        funnel.id = self.id;
        funnel.description = self.description.clone();
        funnel.content = FunnelContent::parse_lenient(&self.content, ids);
        funnel.settings = FunnelSettings::parse_lenient(&self.settings);
        funnel.status = self.status;
        funnel.is_published = self.is_published;
        funnel
    }

    fn set_published(&mut self, published: bool) {
        self.status = if published {
            FunnelStatus::Published
        } else {
            FunnelStatus::Draft
        };
        self.is_published = published;
        self.updated_at = Some(Utc::now());
    }
}

/// Persistence backend for funnels
#[async_trait]
pub trait FunnelStore: Send + Sync {
    /// Create (no id) or update a record. Returns the record id.
    async fn save(&self, record: &StoredFunnel) -> Result<u64, StoreError>;

    async fn load(&self, id: u64) -> Result<Option<StoredFunnel>, StoreError>;

    async fn list(&self) -> Result<Vec<StoredFunnel>, StoreError>;

    /// Returns false when the record did not exist
    async fn delete(&self, id: u64) -> Result<bool, StoreError>;

    /// Set status and published flag together
    async fn publish(&self, id: u64) -> Result<StoredFunnel, StoreError>;

    async fn unpublish(&self, id: u64) -> Result<StoredFunnel, StoreError>;
}

/// Prepare a record for writing, keeping publication state of `existing`
fn stamp(record: &StoredFunnel, id: u64, existing: Option<&StoredFunnel>) -> Result<StoredFunnel, StoreError> {
    if record.name.trim().is_empty() {
        return Err(StoreError::EmptyName);
    }

    let mut stored = record.clone();
    stored.id = Some(id);
    stored.updated_at = Some(Utc::now());
    if let Some(existing) = existing {
        stored.status = existing.status;
        stored.is_published = existing.is_published;
    }
    Ok(stored)
}

// ── MemoryStore ──

/// In-memory store for tests and previews
pub struct MemoryStore {
    inner: RwLock<HashMap<u64, StoredFunnel>>,
    next_id: AtomicU64,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            failing: AtomicBool::new(false),
        }
    }

    /// Make every save fail with [`StoreError::Unavailable`]
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FunnelStore for MemoryStore {
    async fn save(&self, record: &StoredFunnel) -> Result<u64, StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store is failing".to_string()));
        }

        let mut store = self.inner.write().await;
        let id = match record.id {
            Some(id) => id,
            None => self.next_id.fetch_add(1, Ordering::SeqCst),
        };

        let stored = stamp(record, id, store.get(&id))?;
        store.insert(id, stored);
        debug!(funnel_id = id, "Funnel stored in memory");
        Ok(id)
    }

    async fn load(&self, id: u64) -> Result<Option<StoredFunnel>, StoreError> {
        Ok(self.inner.read().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<StoredFunnel>, StoreError> {
        let store = self.inner.read().await;
        let mut records: Vec<_> = store.values().cloned().collect();
        records.sort_by_key(|record| record.id);
        Ok(records)
    }

    async fn delete(&self, id: u64) -> Result<bool, StoreError> {
        Ok(self.inner.write().await.remove(&id).is_some())
    }

    async fn publish(&self, id: u64) -> Result<StoredFunnel, StoreError> {
        let mut store = self.inner.write().await;
        let record = store.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        record.set_published(true);
        Ok(record.clone())
    }

    async fn unpublish(&self, id: u64) -> Result<StoredFunnel, StoreError> {
        let mut store = self.inner.write().await;
        let record = store.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        record.set_published(false);
        Ok(record.clone())
    }
}

// ── JsonFileStore ──

/// One `<id>.json` file per funnel in a directory
pub struct JsonFileStore {
    dir: PathBuf,

    /// Serializes writers so id allocation cannot race
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open a store directory, creating it if needed
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: u64) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    async fn ids(&self) -> Result<Vec<u64>, StoreError> {
        let mut ids = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(id) = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.parse::<u64>().ok())
            {
                ids.push(id);
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }

    async fn read(&self, id: u64) -> Result<Option<StoredFunnel>, StoreError> {
        match tokio::fs::read_to_string(self.path_for(id)).await {
            Ok(source) => Ok(Some(serde_json::from_str(&source)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, record: &StoredFunnel, id: u64) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(record)?;
        tokio::fs::write(self.path_for(id), json).await?;
        Ok(())
    }

    async fn set_published(&self, id: u64, published: bool) -> Result<StoredFunnel, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut record = self.read(id).await?.ok_or(StoreError::NotFound(id))?;
        record.set_published(published);
        self.write(&record, id).await?;
        info!(funnel_id = id, published, "Publication state changed");
        Ok(record)
    }
}

#[async_trait]
impl FunnelStore for JsonFileStore {
    async fn save(&self, record: &StoredFunnel) -> Result<u64, StoreError> {
        let _guard = self.write_lock.lock().await;

        let id = match record.id {
            Some(id) => id,
            None => self.ids().await?.last().map_or(1, |max| max + 1),
        };

        let existing = self.read(id).await?;
        let stored = stamp(record, id, existing.as_ref())?;
        self.write(&stored, id).await?;
        debug!(funnel_id = id, dir = %self.dir.display(), "Funnel written");
        Ok(id)
    }

    async fn load(&self, id: u64) -> Result<Option<StoredFunnel>, StoreError> {
        self.read(id).await
    }

    async fn list(&self) -> Result<Vec<StoredFunnel>, StoreError> {
        let mut records = Vec::new();
        for id in self.ids().await? {
            if let Some(record) = self.read(id).await? {
                records.push(record);
            }
        }
        Ok(records)
    }

    async fn delete(&self, id: u64) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock().await;
        match tokio::fs::remove_file(self.path_for(id)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn publish(&self, id: u64) -> Result<StoredFunnel, StoreError> {
        self.set_published(id, true).await
    }

    async fn unpublish(&self, id: u64) -> Result<StoredFunnel, StoreError> {
        self.set_published(id, false).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use funnel_model::{Block, BlockType, Column, Section, SectionLayout};

    fn sample() -> Funnel {
        let mut column = Column::new("c1", 100.0);
        column.blocks.push(Block::new("t1", BlockType::Text));
        let mut section = Section::new("s1", SectionLayout::Single);
        section.columns.push(column);

        let mut funnel = Funnel::new("Webinar");
        funnel.content.sections.push(section);
        funnel
    }

    #[test]
    fn test_record_round_trip() {
        let funnel = sample();
        let record = StoredFunnel::from_funnel(&funnel).unwrap();
        assert!(record.content.contains("\"sections\""));

        let restored = record.to_funnel(&mut IdGenerator::from_seed("t"));
        assert_eq!(restored, funnel);
    }

    #[test]
    fn test_malformed_content_loads_empty() {
        let mut record = StoredFunnel::from_funnel(&sample()).unwrap();
        record.content = "{not json".to_string();
        record.settings = "oops".to_string();

        let funnel = record.to_funnel(&mut IdGenerator::from_seed("t"));
        assert!(funnel.sections().is_empty());
        assert_eq!(funnel.settings, FunnelSettings::default());
    }

    #[tokio::test]
    async fn test_memory_store_assigns_ids() {
        let store = MemoryStore::new();
        let record = StoredFunnel::from_funnel(&sample()).unwrap();

        let first = store.save(&record).await.unwrap();
        let second = store.save(&record).await.unwrap();
        assert_ne!(first, second);
        assert_eq!(store.len().await, 2);
        assert!(store.load(99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_publish_sets_status_and_flag() {
        let store = MemoryStore::new();
        let id = store
            .save(&StoredFunnel::from_funnel(&sample()).unwrap())
            .await
            .unwrap();

        let published = store.publish(id).await.unwrap();
        assert_eq!(published.status, FunnelStatus::Published);
        assert!(published.is_published);

        // A later save of a draft copy keeps the record published
        let mut draft = StoredFunnel::from_funnel(&sample()).unwrap();
        draft.id = Some(id);
        store.save(&draft).await.unwrap();
        assert!(store.load(id).await.unwrap().unwrap().is_published);

        let unpublished = store.unpublish(id).await.unwrap();
        assert_eq!(unpublished.status, FunnelStatus::Draft);
        assert!(!unpublished.is_published);

        assert!(matches!(store.publish(404).await, Err(StoreError::NotFound(404))));
    }

    #[tokio::test]
    async fn test_failing_memory_store() {
        let store = MemoryStore::new();
        store.set_failing(true);
        let result = store.save(&StoredFunnel::from_funnel(&sample()).unwrap()).await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_json_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("funnels")).await.unwrap();

        let record = StoredFunnel::from_funnel(&sample()).unwrap();
        let id = store.save(&record).await.unwrap();
        assert_eq!(id, 1);
        assert!(store.dir().join("1.json").exists());

        let next = store.save(&record).await.unwrap();
        assert_eq!(next, 2);

        let loaded = store.load(id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Webinar");
        assert_eq!(loaded.content, record.content);

        assert_eq!(store.list().await.unwrap().len(), 2);
        assert!(store.delete(id).await.unwrap());
        assert!(!store.delete(id).await.unwrap());
        assert!(store.load(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_name_is_refused() {
        let store = MemoryStore::new();
        let mut record = StoredFunnel::from_funnel(&sample()).unwrap();
        record.name = "  ".to_string();
        assert!(matches!(store.save(&record).await, Err(StoreError::EmptyName)));
    }
}
