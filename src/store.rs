//! Record store
//!
//! Narrow CRUD interface the engine hands finished records to, plus an
//! in-memory implementation. Ids are assigned here, never by the engine.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::StoreError;
use crate::model::{Record, RecordDraft, RecordPatch};

/// Backend-agnostic record persistence.
pub trait RecordStore: Send + Sync {
    /// Create a record from a partial one. Assigns id and timestamps.
    fn create(&self, patch: RecordPatch) -> Result<Record, StoreError>;

    /// Apply the `Some` fields of `patch` to record `id`.
    fn update(&self, id: u64, patch: RecordPatch) -> Result<Record, StoreError>;

    /// Delete record `id`. Fails with [`StoreError::NotFound`] when absent.
    fn delete(&self, id: u64) -> Result<bool, StoreError>;

    fn get(&self, id: u64) -> Result<Record, StoreError>;

    /// All records, newest created first.
    fn list(&self) -> Result<Vec<Record>, StoreError>;

    fn clear(&self) -> Result<(), StoreError>;

    /// Record counts by verification state.
    fn stats(&self) -> Result<RecordStats, StoreError> {
        let records = self.list()?;
        let verified = records.iter().filter(|r| r.verified).count();
        Ok(RecordStats {
            total: records.len(),
            verified,
            unverified: records.len() - verified,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordStats {
    pub total: usize,
    pub verified: usize,
    pub unverified: usize,
}

/// Save a find-similar batch. Returns the created records in batch order.
pub fn persist_batch(
    store: &dyn RecordStore,
    drafts: &[RecordDraft],
) -> Result<Vec<Record>, StoreError> {
    let records = drafts
        .iter()
        .map(|draft| store.create(RecordPatch::from(draft)))
        .collect::<Result<Vec<_>, _>>()?;
    debug!(count = records.len(), "batch persisted");
    Ok(records)
}

/// In-memory store; ids are `max(id) + 1` starting at 1.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: RwLock<Vec<Record>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<Record>>, StoreError> {
        self.records
            .read()
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<Record>>, StoreError> {
        self.records
            .write()
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }
}

fn apply(record: &mut Record, patch: RecordPatch) {
    if let Some(url) = patch.url {
        record.url = url;
    }
    if let Some(title) = patch.title {
        record.title = title;
    }
    if let Some(description) = patch.description {
        record.description = description;
    }
    if let Some(image) = patch.image {
        record.image = image;
    }
    if let Some(price) = patch.price {
        record.price = price;
    }
    if patch.category.is_some() {
        record.category = patch.category;
    }
    if let Some(verified) = patch.verified {
        record.verified = verified;
    }
}

impl RecordStore for MemoryRecordStore {
    fn create(&self, patch: RecordPatch) -> Result<Record, StoreError> {
        let mut records = self.write()?;
        let id = records.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        let now = Utc::now();
        let mut record = Record {
            id,
            url: String::new(),
            title: String::new(),
            description: String::new(),
            image: String::new(),
            price: String::new(),
            category: None,
            verified: false,
            created_at: now,
            updated_at: now,
        };
        apply(&mut record, patch);
        records.push(record.clone());
        Ok(record)
    }

    fn update(&self, id: u64, patch: RecordPatch) -> Result<Record, StoreError> {
        let mut records = self.write()?;
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound(id))?;
        apply(record, patch);
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    fn delete(&self, id: u64) -> Result<bool, StoreError> {
        let mut records = self.write()?;
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Err(StoreError::NotFound(id));
        }
        Ok(true)
    }

    fn get(&self, id: u64) -> Result<Record, StoreError> {
        self.read()?
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    fn list(&self) -> Result<Vec<Record>, StoreError> {
        let mut records = self.read()?.clone();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(records)
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.write()?.clear();
        Ok(())
    }
}
