//! Read-only trail store handle.
//!
//! A [`TrailDb`] is an opened, immutable view of one sealed store:
//! metadata, field and lexicon lookups, identifier↔trail-id mapping, and
//! per-trail cursors. Cursors borrow the handle, so the compiler enforces
//! that no cursor outlives it. An optional CNF filter can be installed on
//! the handle; cursors created while it is installed yield only matching
//! events.

pub mod cursor;

use chrono::{DateTime, Utc};
use spoor_error::{Result, SpoorError};
use spoor_filter::{Clause, ClauseMember};
use spoor_storage::{FileEngine, StorageEngine, StoreCursor, StoreReader};
use spoor_types::time::epoch_to_utc;
use spoor_types::{FieldId, FieldRef, Item, TrailId, Uuid, ValueIndex};
use tracing::debug;

pub use cursor::{DecodedEvent, RawCursor, TimeCursor, TrailCursor, Trails};

/// An opened, read-only trail store.
#[derive(Debug)]
pub struct TrailDb<E: StorageEngine = FileEngine> {
    reader: E::Reader,
    /// Field names in declared order, `time` leading.
    fields: Vec<String>,
    filter: Option<Vec<u64>>,
}

impl TrailDb<FileEngine> {
    /// Open a store from the filesystem.
    pub fn open(path: &str) -> Result<Self> {
        Self::open_with(&FileEngine::new(), path)
    }
}

impl<E: StorageEngine> TrailDb<E> {
    /// Open a store through an explicit engine binding.
    pub fn open_with(engine: &E, path: &str) -> Result<Self> {
        let reader = engine.open(path)?;
        let mut fields = Vec::with_capacity(usize::try_from(reader.num_fields()).unwrap_or(0));
        for i in 0..reader.num_fields() {
            let field = FieldId(i as u32);
            let name = reader
                .field_name(field)
                .ok_or(SpoorError::InvalidField {
                    field: field.as_u32(),
                })?
                .to_owned();
            fields.push(name);
        }
        debug!(path, fields = fields.len(), "trail store opened");
        Ok(Self {
            reader,
            fields,
            filter: None,
        })
    }

    // ── Metadata ─────────────────────────────────────────────────────────

    /// Number of trails in the store.
    pub fn num_trails(&self) -> u64 {
        self.reader.num_trails()
    }

    /// Number of events across all trails.
    pub fn num_events(&self) -> u64 {
        self.reader.num_events()
    }

    /// Number of fields, the implicit leading `time` column included.
    pub fn num_fields(&self) -> u64 {
        self.reader.num_fields()
    }

    /// Store format version tag.
    pub fn version(&self) -> u32 {
        self.reader.version()
    }

    /// Ordered field names, starting with `time`.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Smallest event timestamp in the store.
    pub fn min_timestamp(&self) -> u64 {
        self.reader.min_timestamp()
    }

    /// Largest event timestamp in the store.
    pub fn max_timestamp(&self) -> u64 {
        self.reader.max_timestamp()
    }

    /// `(min, max)` event timestamps as epoch seconds.
    pub fn time_range(&self) -> (u64, u64) {
        (self.min_timestamp(), self.max_timestamp())
    }

    /// `(min, max)` event timestamps as calendar time.
    pub fn time_range_utc(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        Some((
            epoch_to_utc(self.min_timestamp())?,
            epoch_to_utc(self.max_timestamp())?,
        ))
    }

    // ── Fields and lexicons ──────────────────────────────────────────────

    /// Resolve a field reference. Names resolve by position in the
    /// field-name sequence; ids pass through unchanged.
    pub fn field<'a>(&self, field: impl Into<FieldRef<'a>>) -> Result<FieldId> {
        match field.into() {
            FieldRef::Id(id) => Ok(id),
            FieldRef::Name(name) => self
                .reader
                .field_id(name)
                .ok_or_else(|| SpoorError::unknown_field(name)),
        }
    }

    /// Name of a field id.
    pub fn field_name(&self, field: FieldId) -> Result<&str> {
        self.reader
            .field_name(field)
            .ok_or(SpoorError::InvalidField {
                field: field.as_u32(),
            })
    }

    /// Number of distinct values in a field's lexicon, the reserved
    /// absent slot excluded.
    pub fn lexicon_size<'a>(&self, field: impl Into<FieldRef<'a>>) -> Result<u64> {
        let field = self.field(field)?;
        self.reader
            .lexicon_len(field)
            .ok_or(SpoorError::InvalidField {
                field: field.as_u32(),
            })
    }

    /// All values of a field's lexicon, in index order (indices
    /// `1..=lexicon_size`), not sorted.
    pub fn lexicon<'a>(&self, field: impl Into<FieldRef<'a>>) -> Result<Vec<String>> {
        let field = self.field(field)?;
        let len = self
            .reader
            .lexicon_len(field)
            .ok_or(SpoorError::InvalidField {
                field: field.as_u32(),
            })?;
        let mut values = Vec::with_capacity(usize::try_from(len).unwrap_or(0));
        for i in 1..=len {
            values.push(self.lookup_value(field, ValueIndex(i))?.to_owned());
        }
        Ok(values)
    }

    fn lookup_value(&self, field: FieldId, value: ValueIndex) -> Result<&str> {
        self.reader
            .value(field, value)
            .ok_or(SpoorError::ValueLookup {
                field: field.as_u32(),
                value: value.as_u64(),
            })
    }

    /// Resolve `(field, value index)` to its string payload.
    pub fn value<'a>(&self, field: impl Into<FieldRef<'a>>, value: ValueIndex) -> Result<&str> {
        let field = self.field(field)?;
        // Distinguish a bad field from a bad index.
        self.field_name(field)?;
        self.lookup_value(field, value)
    }

    /// Resolve a packed item to its string payload.
    pub fn item_value(&self, item: Item) -> Result<&str> {
        self.lookup_value(item.field(), item.value())
    }

    /// Inverse lookup: the packed item for a value string.
    pub fn item<'a>(&self, field: impl Into<FieldRef<'a>>, value: &str) -> Result<Item> {
        let field = self.field(field)?;
        self.reader
            .item(field, value)
            .ok_or_else(|| SpoorError::UnknownValue {
                field: self
                    .field_name(field)
                    .unwrap_or("?")
                    .to_owned(),
                value: value.to_owned(),
            })
    }

    // ── Identifiers ──────────────────────────────────────────────────────

    /// Identifier of a trail.
    pub fn uuid(&self, trail_id: TrailId) -> Result<Uuid> {
        self.reader
            .uuid(trail_id)
            .ok_or(SpoorError::TrailOutOfRange {
                trail_id: trail_id.as_u64(),
                num_trails: self.num_trails(),
            })
    }

    /// Trail id of an identifier.
    pub fn trail_id(&self, uuid: &Uuid) -> Result<TrailId> {
        self.reader
            .trail_id(uuid)
            .ok_or_else(|| SpoorError::UuidNotFound { uuid: uuid.hex() })
    }

    /// Non-throwing membership test for an identifier.
    pub fn contains(&self, uuid: &Uuid) -> bool {
        self.reader.trail_id(uuid).is_some()
    }

    /// Non-throwing membership test for a trail id.
    pub fn contains_trail(&self, trail_id: TrailId) -> bool {
        trail_id.as_u64() < self.num_trails()
    }

    // ── Filter ───────────────────────────────────────────────────────────

    /// Compile and install a CNF filter. Cursors created while it is
    /// installed yield only events it matches.
    pub fn set_filter(&mut self, clauses: &[Clause]) -> Result<()> {
        self.filter = Some(spoor_filter::compile(&self.reader, clauses)?);
        Ok(())
    }

    /// Remove the installed filter.
    pub fn clear_filter(&mut self) {
        self.filter = None;
    }

    /// Decompile the installed filter, if any.
    pub fn get_filter(&self) -> Result<Option<Vec<Vec<ClauseMember>>>> {
        match &self.filter {
            Some(wire) => Ok(Some(spoor_filter::decompile(&self.reader, wire)?)),
            None => Ok(None),
        }
    }

    /// The installed filter's binary form, if any.
    pub fn filter_array(&self) -> Option<&[u64]> {
        self.filter.as_deref()
    }

    // ── Cursors ──────────────────────────────────────────────────────────

    fn bound_cursor(&self, trail_id: TrailId) -> Result<<E::Reader as StoreReader>::Cursor<'_>> {
        let mut cursor = self.reader.cursor();
        cursor.bind(trail_id)?;
        Ok(cursor)
    }

    /// Cursor over one trail, items resolved to their string values.
    pub fn trail(&self, trail_id: TrailId) -> Result<TrailCursor<'_, E>> {
        Ok(TrailCursor::new(self, self.bound_cursor(trail_id)?))
    }

    /// Cursor over one trail yielding raw packed items.
    pub fn trail_raw(&self, trail_id: TrailId) -> Result<RawCursor<'_, E>> {
        Ok(RawCursor::new(
            self.bound_cursor(trail_id)?,
            self.filter_array(),
        ))
    }

    /// Cursor over one trail yielding timestamps only, with item decoding
    /// skipped entirely.
    pub fn trail_times(&self, trail_id: TrailId) -> Result<TimeCursor<'_, E>> {
        Ok(TimeCursor::new(
            self.bound_cursor(trail_id)?,
            self.filter_array(),
        ))
    }

    /// Iterate every `(identifier, trail cursor)` pair in trail-id order.
    pub fn trails(&self) -> Trails<'_, E> {
        Trails::new(self)
    }

    /// Release the read resource now instead of at end of scope.
    pub fn close(self) {
        drop(self);
    }

    /// The underlying engine reader: primitive, unfiltered access for
    /// layers that consume the store wholesale (e.g. cross-store append).
    pub fn reader(&self) -> &E::Reader {
        &self.reader
    }
}
