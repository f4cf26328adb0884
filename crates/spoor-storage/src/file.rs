//! File-backed storage engine: one store per file.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use spoor_error::{Result, SpoorError, StoreCode};
use spoor_types::Uuid;
use tracing::debug;

use crate::data::{DataCursor, StoreBuilder, StoreData};
use crate::format;
use crate::traits::{StorageEngine, StoreReader, StoreWriter};
use crate::STORE_EXT;

/// Resolve a logical store name to its backing file.
fn backing_file(path: &str) -> PathBuf {
    if path.ends_with(STORE_EXT) {
        PathBuf::from(path)
    } else {
        PathBuf::from(format!("{path}{STORE_EXT}"))
    }
}

/// The default engine: stores live on the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileEngine;

impl FileEngine {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl StorageEngine for FileEngine {
    type Writer = FileWriter;
    type Reader = FileReader;

    fn create(&self, path: &str, field_names: &[String]) -> Result<Self::Writer> {
        if path.is_empty() {
            return Err(SpoorError::schema("path is required"));
        }
        let builder = StoreBuilder::new(field_names)?;
        let file = backing_file(path);
        debug!(path = %file.display(), fields = field_names.len(), "store created");
        Ok(FileWriter {
            path: file,
            builder,
        })
    }

    fn open(&self, path: &str) -> Result<Self::Reader> {
        let file = backing_file(path);
        let bytes = match fs::read(&file) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(SpoorError::open(file, StoreCode::Missing));
            }
            Err(e) => return Err(SpoorError::Io(e)),
        };
        let data = format::decode(&bytes).map_err(|code| SpoorError::open(file.clone(), code))?;
        debug!(
            path = %file.display(),
            trails = data.num_trails(),
            events = data.num_events(),
            "store opened"
        );
        Ok(FileReader { data })
    }
}

/// Exclusive writer for one store file. Dropping without sealing leaves
/// nothing on disk.
#[derive(Debug)]
pub struct FileWriter {
    path: PathBuf,
    builder: StoreBuilder,
}

impl StoreWriter for FileWriter {
    fn put(&mut self, uuid: Uuid, timestamp: u64, values: &[&str]) -> Result<()> {
        self.builder.put(uuid, timestamp, values)
    }

    fn seal(self) -> Result<()> {
        let data = self.builder.build();
        let bytes = format::encode(&data);

        // Write beside the target, then rename, so a torn write never
        // masquerades as a sealed store.
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, &bytes).map_err(|_| SpoorError::Finalize {
            code: StoreCode::WriteFailed,
        })?;
        fs::rename(&tmp, &self.path).map_err(|_| SpoorError::Finalize {
            code: StoreCode::WriteFailed,
        })?;
        debug!(path = %self.path.display(), events = data.num_events(), "store sealed");
        Ok(())
    }
}

/// Read-only view of one sealed store file, fully resident once opened.
#[derive(Debug)]
pub struct FileReader {
    data: StoreData,
}

impl StoreReader for FileReader {
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
