//! In-memory storage engine.
//!
//! Sealed stores live in a registry shared by every handle cloned from the
//! same engine value, keyed by normalized store name. Nothing persists;
//! this backend exists for tests and scratch pipelines.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use spoor_error::{Result, SpoorError, StoreCode};
use spoor_types::Uuid;
use tracing::debug;

use crate::data::{DataCursor, StoreBuilder, StoreData};
use crate::traits::{StorageEngine, StoreReader, StoreWriter};
use crate::STORE_EXT;

/// Normalize a store name so suffixed and bare forms collide.
fn store_key(path: &str) -> String {
    path.strip_suffix(STORE_EXT).unwrap_or(path).to_owned()
}

/// A process-local engine; clones share one registry.
#[derive(Debug, Clone, Default)]
pub struct MemoryEngine {
    stores: Arc<Mutex<HashMap<String, Arc<StoreData>>>>,
}

impl MemoryEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageEngine for MemoryEngine {
    type Writer = MemoryWriter;
    type Reader = MemoryReader;

    fn create(&self, path: &str, field_names: &[String]) -> Result<Self::Writer> {
        if path.is_empty() {
            return Err(SpoorError::schema("path is required"));
        }
        let builder = StoreBuilder::new(field_names)?;
        Ok(MemoryWriter {
            key: store_key(path),
            stores: Arc::clone(&self.stores),
            builder,
        })
    }

    fn open(&self, path: &str) -> Result<Self::Reader> {
        let key = store_key(path);
        let data = self
            .stores
            .lock()
            .get(&key)
            .cloned()
            .ok_or_else(|| SpoorError::open(path, StoreCode::Missing))?;
        Ok(MemoryReader { data })
    }
}

/// Writer that seals into the shared registry.
#[derive(Debug)]
pub struct MemoryWriter {
    key: String,
    stores: Arc<Mutex<HashMap<String, Arc<StoreData>>>>,
    builder: StoreBuilder,
}

impl StoreWriter for MemoryWriter {
    fn put(&mut self, uuid: Uuid, timestamp: u64, values: &[&str]) -> Result<()> {
        self.builder.put(uuid, timestamp, values)
    }

    fn seal(self) -> Result<()> {
        let data = self.builder.build();
        debug!(store = %self.key, events = data.num_events(), "store sealed");
        self.stores.lock().insert(self.key, Arc::new(data));
        Ok(())
    }
}

/// Read-only view of one registry entry.
#[derive(Debug, Clone)]
pub struct MemoryReader {
    data: Arc<StoreData>,
}

impl StoreReader for MemoryReader {
    type Cursor<'db> = DataCursor<'db>;

    fn num_trails(&self) -> u64 {
        self.data.num_trails()
    }

    fn num_events(&self) -> u64 {
        self.data.num_events()
    }

    fn num_fields(&self) -> u64 {
        self.data.num_fields()
    }

    fn min_timestamp(&self) -> u64 {
        self.data.min_timestamp()
    }

    fn max_timestamp(&self) -> u64 {
        self.data.max_timestamp()
    }

    fn version(&self) -> u32 {
        self.data.version()
    }

    fn field_name(&self, field: spoor_types::FieldId) -> Option<&str> {
        self.data.field_name(field)
    }

    fn lexicon_len(&self, field: spoor_types::FieldId) -> Option<u64> {
        self.data.lexicon_len(field)
    }

    fn value(&self, field: spoor_types::FieldId, value: spoor_types::ValueIndex) -> Option<&str> {
        self.data.value(field, value)
    }

    fn item(&self, field: spoor_types::FieldId, value: &str) -> Option<spoor_types::Item> {
        self.data.item(field, value)
    }

    fn uuid(&self, trail_id: spoor_types::TrailId) -> Option<Uuid> {
        self.data.uuid(trail_id)
    }

    fn trail_id(&self, uuid: &Uuid) -> Option<spoor_types::TrailId> {
        self.data.trail_id(uuid)
    }

    fn cursor(&self) -> Self::Cursor<'_> {
        DataCursor::new(&self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::StoreCursor;
    use spoor_types::TrailId;

    #[test]
    fn engine_clones_share_sealed_stores() {
        let engine = MemoryEngine::new();
        let clone = engine.clone();

        let mut writer = engine
            .create("shared", &["f".to_owned()])
            .unwrap();
        writer.put(Uuid::from_bytes([3; 16]), 9, &["x"]).unwrap();
        writer.seal().unwrap();

        let reader = clone.open("shared").unwrap();
        assert_eq!(reader.num_events(), 1);
    }

    #[test]
    fn suffix_normalization_matches_the_file_engine() {
        let engine = MemoryEngine::new();
        let mut writer = engine.create("t.sdb", &["f".to_owned()]).unwrap();
        writer.put(Uuid::from_bytes([1; 16]), 1, &["a"]).unwrap();
        writer.seal().unwrap();

        assert_eq!(engine.open("t").unwrap().num_events(), 1);
        assert_eq!(engine.open("t.sdb").unwrap().num_events(), 1);
    }

    #[test]
    fn missing_store_errors() {
        let err = MemoryEngine::new().open("ghost").unwrap_err();
        assert!(matches!(
            err,
            SpoorError::Open {
                code: StoreCode::Missing,
                ..
            }
        ));
    }

    #[test]
    fn unsealed_writer_leaves_no_store_behind() {
        let engine = MemoryEngine::new();
        {
            let mut writer = engine.create("dropped", &["f".to_owned()]).unwrap();
            writer.put(Uuid::from_bytes([2; 16]), 4, &["v"]).unwrap();
            // Dropped without seal.
        }
        assert!(engine.open("dropped").is_err());
    }

    #[test]
    fn cursor_sees_registry_data() {
        let engine = MemoryEngine::new();
        let mut writer = engine.create("c", &["f".to_owned()]).unwrap();
        writer.put(Uuid::from_bytes([5; 16]), 1, &["a"]).unwrap();
        writer.put(Uuid::from_bytes([5; 16]), 2, &["b"]).unwrap();
        writer.seal().unwrap();

        let reader = engine.open("c").unwrap();
        let mut cursor = reader.cursor();
        cursor.bind(TrailId(0)).unwrap();
        assert_eq!(cursor.next_event().unwrap().timestamp, 1);
        assert_eq!(cursor.next_event().unwrap().timestamp, 2);
        assert!(cursor.next_event().is_none());
    }
}
