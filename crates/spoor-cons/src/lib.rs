//! Write-side construction session.
//!
//! A [`TrailConstructor`] accumulates events against a schema locked in
//! at open time, optionally absorbs the events of an already-finalized
//! store, and seals into a read-only [`TrailDb`]. The session owns its
//! write resource exclusively; `finalize` and `close` consume the
//! session, so the resource is released exactly once and use-after-seal
//! does not compile for owned sessions.

use spoor_db::TrailDb;
use spoor_error::{Result, SpoorError};
use spoor_storage::{FileEngine, StorageEngine, StoreCursor, StoreReader, StoreWriter};
use spoor_types::{EventTime, TrailId, Uuid};
use tracing::debug;

/// A schema-locked event accumulator for one store under construction.
#[derive(Debug)]
pub struct TrailConstructor<E: StorageEngine = FileEngine> {
    engine: E,
    path: String,
    fields: Vec<String>,
    writer: Option<E::Writer>,
}

impl TrailConstructor<FileEngine> {
    /// Begin constructing a store on the filesystem.
    pub fn open(path: &str, fields: &[&str]) -> Result<Self> {
        Self::open_with(FileEngine::new(), path, fields)
    }
}

impl<E: StorageEngine> TrailConstructor<E> {
    /// Begin constructing a store through an explicit engine binding.
    ///
    /// `fields` is the ordered data-field schema, immutable for the
    /// session's lifetime. An empty path is a schema error.
    pub fn open_with(engine: E, path: &str, fields: &[&str]) -> Result<Self> {
        if path.is_empty() {
            return Err(SpoorError::schema("path is required"));
        }
        let fields: Vec<String> = fields.iter().map(|s| (*s).to_owned()).collect();
        let writer = engine.create(path, &fields)?;
        debug!(path, fields = fields.len(), "construction session opened");
        Ok(Self {
            engine,
            path: path.to_owned(),
            fields,
            writer: Some(writer),
        })
    }

    /// The ordered data-field schema.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// The store path this session writes to.
    pub fn path(&self) -> &str {
        &self.path
    }

    fn writer(&mut self) -> Result<&mut E::Writer> {
        self.writer.as_mut().ok_or(SpoorError::SessionClosed)
    }

    /// Add one event to `uuid`'s trail.
    ///
    /// `time` is epoch seconds or a calendar timestamp. `values` carries
    /// at most one string per declared field, in declared order; a
    /// missing tail is stored as the absent value. A value the store
    /// cannot represent fails with `TooManyValues` carrying the value's
    /// index; earlier adds are unaffected.
    pub fn add(
        &mut self,
        uuid: Uuid,
        time: impl Into<EventTime>,
        values: &[&str],
    ) -> Result<()> {
        let timestamp = time.into().to_epoch()?;
        self.writer()?.put(uuid, timestamp, values)
    }

    /// Merge every event of a finalized store into this session.
    ///
    /// Fails with `SchemaMismatch` when the data-field counts differ.
    /// Events land after this session's own prior adds, trail by trail in
    /// `other`'s trail-id order, each trail's events in stored order.
    pub fn append<O: StorageEngine>(&mut self, other: &TrailDb<O>) -> Result<()> {
        let other_fields = other.num_fields().saturating_sub(1) as usize;
        if other_fields != self.fields.len() {
            return Err(SpoorError::SchemaMismatch {
                expected: self.fields.len(),
                actual: other_fields,
            });
        }
        self.writer.as_ref().ok_or(SpoorError::SessionClosed)?;

        let reader = other.reader();
        for trail in 0..reader.num_trails() {
            let trail_id = TrailId(trail);
            let uuid = reader
                .uuid(trail_id)
                .ok_or(SpoorError::TrailOutOfRange {
                    trail_id: trail,
                    num_trails: reader.num_trails(),
                })?;
            let mut cursor = reader.cursor();
            cursor.bind(trail_id)?;
            while let Some(event) = cursor.next_event() {
                let mut values = Vec::with_capacity(event.items.len());
                for item in event.items {
                    let value =
                        reader
                            .value(item.field(), item.value())
                            .ok_or(SpoorError::ValueLookup {
                                field: item.field().as_u32(),
                                value: item.value().as_u64(),
                            })?;
                    values.push(value);
                }
                self.writer
                    .as_mut()
                    .ok_or(SpoorError::SessionClosed)?
                    .put(uuid, event.timestamp, &values)?;
            }
        }
        debug!(path = %self.path, events = other.num_events(), "store appended");
        Ok(())
    }

    /// Seal the session and open the result read-only.
    ///
    /// The write resource is released here; the session is consumed, so
    /// further `add`/`append` calls do not compile.
    pub fn finalize(mut self) -> Result<TrailDb<E>> {
        let writer = self.writer.take().ok_or(SpoorError::SessionClosed)?;
        writer.seal()?;
        debug!(path = %self.path, "construction session finalized");
        TrailDb::open_with(&self.engine, &self.path)
    }

    /// Abandon the session, releasing the write resource without
    /// persisting anything. Dropping the session does the same; either
    /// way the release happens exactly once.
    pub fn close(mut self) {
        self.writer.take();
    }
}
