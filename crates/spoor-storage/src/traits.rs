//! The primitive operation set every storage backend provides.
//!
//! This is the boundary the rest of the workspace is written against: an
//! engine produces writers and readers, a reader produces cursors. The
//! traits are open — tests and alternative backends implement them freely.
//! All operations are synchronous and block on the calling thread; there
//! is no cancellation hook inside a call.

use spoor_error::Result;
use spoor_types::{FieldId, Item, TrailId, Uuid, ValueIndex};

/// One raw event as stored: epoch seconds plus one packed item per
/// declared data field, in declared field order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RawEvent<'db> {
    pub timestamp: u64,
    pub items: &'db [Item],
}

/// A storage backend. Produces exclusive writers for stores under
/// construction and shared readers for sealed stores.
pub trait StorageEngine {
    type Writer: StoreWriter;
    type Reader: StoreReader;

    /// Begin a new store at `path` with the given ordered data-field
    /// names. The writer owns the path exclusively until sealed or
    /// dropped; concurrent writers on one path are the caller's fault.
    fn create(&self, path: &str, field_names: &[String]) -> Result<Self::Writer>;

    /// Open a sealed store read-only. Never creates an empty store for an
    /// unresolvable path; that is a distinguishable `Open` failure.
    fn open(&self, path: &str) -> Result<Self::Reader>;
}

/// Write half: an exclusive accumulator for one store under construction.
///
/// Dropping a writer without [`seal`](Self::seal) abandons the store; the
/// write resource is released either way, exactly once.
pub trait StoreWriter {
    /// Add one event. `values` carries at most one string per data field,
    /// in declared order; a missing tail is stored as the absent value.
    /// A value the store cannot represent fails with
    /// `TooManyValues { field }` where `field` indexes into `values`;
    /// prior puts are unaffected.
    fn put(&mut self, uuid: Uuid, timestamp: u64, values: &[&str]) -> Result<()>;

    /// Persist the store and release the write resource.
    fn seal(self) -> Result<()>;
}

/// Read half: an immutable view of one sealed store.
pub trait StoreReader {
    /// Cursor type borrowing this reader.
    type Cursor<'db>: StoreCursor<'db>
    where
        Self: 'db;

    /// Number of trails.
    fn num_trails(&self) -> u64;
    /// Number of events across all trails.
    fn num_events(&self) -> u64;
    /// Number of fields, counting the implicit leading time column.
    fn num_fields(&self) -> u64;
    /// Smallest event timestamp, 0 for an empty store.
    fn min_timestamp(&self) -> u64;
    /// Largest event timestamp, 0 for an empty store.
    fn max_timestamp(&self) -> u64;
    /// Store format version tag.
    fn version(&self) -> u32;

    /// Field name by id; `FieldId::TIME` resolves to `"time"`. `None`
    /// beyond the field range.
    fn field_name(&self, field: FieldId) -> Option<&str>;

    /// Field id by position of `name` in the field-name sequence, `None`
    /// when absent.
    fn field_id(&self, name: &str) -> Option<FieldId> {
        (0..self.num_fields()).map(|i| FieldId(i as u32)).find(|f| {
            self.field_name(*f)
                .is_some_and(|candidate| candidate == name)
        })
    }

    /// Enumerable lexicon size for a data field, excluding the reserved
    /// absent slot. `None` for the time column or an out-of-range field.
    fn lexicon_len(&self, field: FieldId) -> Option<u64>;

    /// Resolve a value index to its string. Index 0 resolves to the empty
    /// string for any valid data field.
    fn value(&self, field: FieldId, value: ValueIndex) -> Option<&str>;

    /// Inverse lookup: the packed item for a value string, `None` when the
    /// string is not in that field's lexicon (the empty string never is).
    fn item(&self, field: FieldId, value: &str) -> Option<Item>;

    /// Identifier of a trail, `None` when `trail_id >= num_trails`.
    fn uuid(&self, trail_id: TrailId) -> Option<Uuid>;

    /// Trail id of an identifier, `None` when absent.
    fn trail_id(&self, uuid: &Uuid) -> Option<TrailId>;

    /// New unbound cursor over this reader.
    fn cursor(&self) -> Self::Cursor<'_>;
}

/// A single-trail, single-pass event cursor.
///
/// `bind` positions the cursor at the start of one trail; `next_event`
/// yields events in stored order and then `None` forever. Cursor state is
/// cursor-local; one cursor must not be shared across threads without
/// external synchronization.
pub trait StoreCursor<'db> {
    /// Bind to a trail, resetting position to its first event. Fails with
    /// `TrailOutOfRange` for an id at or beyond `num_trails`.
    fn bind(&mut self, trail_id: TrailId) -> Result<()>;

    /// Next event of the bound trail, or `None` when exhausted (or never
    /// bound). Exhaustion is not an error and is permanent until rebound.
    fn next_event(&mut self) -> Option<RawEvent<'db>>;
}
