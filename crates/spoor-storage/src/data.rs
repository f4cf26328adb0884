//! In-memory model of one store, shared by every reference backend.
//!
//! A sealed store is a [`StoreData`]: the declared data fields, one
//! [`Lexicon`] per field, and the trails with their events. The file
//! backend decodes into this and the memory backend keeps it behind an
//! `Arc`; both answer reads through the lookup methods here, so the two
//! backends cannot drift apart semantically.

use std::collections::HashMap;

use spoor_error::{Result, SpoorError};
use spoor_types::{FieldId, Item, TrailId, Uuid, ValueIndex};

use crate::traits::{RawEvent, StoreCursor};

/// Current store format version.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Lexicon
// ---------------------------------------------------------------------------

/// Per-field enumeration of distinct observed values.
///
/// `values[i]` carries `ValueIndex(i + 1)`; index 0 is the reserved
/// absent slot and is never stored.
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    values: Vec<String>,
    index: HashMap<String, u64>,
}

impl Lexicon {
    /// Enumerable value count (the reserved slot excluded).
    pub fn len(&self) -> u64 {
        self.values.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value string at an enumerable index (1-based).
    pub fn get(&self, value: ValueIndex) -> Option<&str> {
        let i = usize::try_from(value.as_u64().checked_sub(1)?).ok()?;
        self.values.get(i).map(String::as_str)
    }

    /// Index of a value string, if observed.
    pub fn index_of(&self, value: &str) -> Option<ValueIndex> {
        self.index.get(value).copied().map(ValueIndex)
    }

    /// Index of `value`, observing it first if new. `None` when the next
    /// index would not be representable in an item.
    fn intern(&mut self, value: &str) -> Option<ValueIndex> {
        if let Some(existing) = self.index.get(value) {
            return Some(ValueIndex(*existing));
        }
        let next = self.values.len() as u64 + 1;
        if next > Item::MAX_VALUE {
            return None;
        }
        self.values.push(value.to_owned());
        self.index.insert(value.to_owned(), next);
        Some(ValueIndex(next))
    }

    /// Rebuild the reverse index after decoding `values` from disk.
    pub(crate) fn from_values(values: Vec<String>) -> Self {
        let index = values
            .iter()
            .enumerate()
            .map(|(i, v)| (v.clone(), i as u64 + 1))
            .collect();
        Self { values, index }
    }

    pub(crate) fn values(&self) -> &[String] {
        &self.values
    }
}

// ---------------------------------------------------------------------------
// Events and trails
// ---------------------------------------------------------------------------

/// One stored event: epoch seconds plus one packed item per data field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub timestamp: u64,
    pub items: Vec<Item>,
}

/// One trail: an identifier and its events in insertion order.
#[derive(Debug, Clone)]
pub struct Trail {
    pub uuid: Uuid,
    pub events: Vec<Event>,
}

// ---------------------------------------------------------------------------
// StoreData
// ---------------------------------------------------------------------------

/// A sealed store, fully resident.
#[derive(Debug, Clone)]
pub struct StoreData {
    version: u32,
    /// Declared data fields; the implicit time column is not stored.
    fields: Vec<String>,
    lexicons: Vec<Lexicon>,
    /// Sorted by raw identifier bytes; position is the `TrailId`.
    trails: Vec<Trail>,
    by_uuid: HashMap<Uuid, u64>,
    num_events: u64,
    min_timestamp: u64,
    max_timestamp: u64,
}

impl StoreData {
    pub(crate) fn assemble(
        version: u32,
        fields: Vec<String>,
        lexicons: Vec<Lexicon>,
        mut trails: Vec<Trail>,
    ) -> Self {
        trails.sort_by(|a, b| a.uuid.as_bytes().cmp(b.uuid.as_bytes()));
        let by_uuid = trails
            .iter()
            .enumerate()
            .map(|(i, t)| (t.uuid, i as u64))
            .collect();
        let mut num_events = 0u64;
        let mut min_timestamp = u64::MAX;
        let mut max_timestamp = 0u64;
        for trail in &trails {
            for event in &trail.events {
                num_events += 1;
                min_timestamp = min_timestamp.min(event.timestamp);
                max_timestamp = max_timestamp.max(event.timestamp);
            }
        }
        if num_events == 0 {
            min_timestamp = 0;
        }
        Self {
            version,
            fields,
            lexicons,
            trails,
            by_uuid,
            num_events,
            min_timestamp,
            max_timestamp,
        }
    }

    pub fn num_trails(&self) -> u64 {
        self.trails.len() as u64
    }

    pub fn num_events(&self) -> u64 {
        self.num_events
    }

    /// Field count including the implicit time column.
    pub fn num_fields(&self) -> u64 {
        self.fields.len() as u64 + 1
    }

    pub fn min_timestamp(&self) -> u64 {
        self.min_timestamp
    }

    pub fn max_timestamp(&self) -> u64 {
        self.max_timestamp
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn field_name(&self, field: FieldId) -> Option<&str> {
        if field == FieldId::TIME {
            return Some("time");
        }
        self.fields
            .get(field.as_u32() as usize - 1)
            .map(String::as_str)
    }

    fn lexicon(&self, field: FieldId) -> Option<&Lexicon> {
        if field == FieldId::TIME {
            return None;
        }
        self.lexicons.get(field.as_u32() as usize - 1)
    }

    pub fn lexicon_len(&self, field: FieldId) -> Option<u64> {
        self.lexicon(field).map(Lexicon::len)
    }

    pub fn value(&self, field: FieldId, value: ValueIndex) -> Option<&str> {
        let lexicon = self.lexicon(field)?;
        if value.is_absent() {
            return Some("");
        }
        lexicon.get(value)
    }

    pub fn item(&self, field: FieldId, value: &str) -> Option<Item> {
        let lexicon = self.lexicon(field)?;
        lexicon
            .index_of(value)
            .map(|index| Item::pack(field, index))
    }

    pub fn uuid(&self, trail_id: TrailId) -> Option<Uuid> {
        self.trails
            .get(usize::try_from(trail_id.as_u64()).ok()?)
            .map(|t| t.uuid)
    }

    pub fn trail_id(&self, uuid: &Uuid) -> Option<TrailId> {
        self.by_uuid.get(uuid).copied().map(TrailId)
    }

    pub fn trail_events(&self, trail_id: TrailId) -> Option<&[Event]> {
        self.trails
            .get(usize::try_from(trail_id.as_u64()).ok()?)
            .map(|t| t.events.as_slice())
    }

    pub(crate) fn data_fields(&self) -> &[String] {
        &self.fields
    }

    pub(crate) fn lexicons(&self) -> &[Lexicon] {
        &self.lexicons
    }

    pub(crate) fn trails(&self) -> &[Trail] {
        &self.trails
    }
}

// ---------------------------------------------------------------------------
// DataCursor
// ---------------------------------------------------------------------------

/// Cursor over one trail of a resident store. Plain slice walk; all state
/// is cursor-local.
#[derive(Debug)]
pub struct DataCursor<'db> {
    data: &'db StoreData,
    events: &'db [Event],
    pos: usize,
}

impl<'db> DataCursor<'db> {
    pub(crate) fn new(data: &'db StoreData) -> Self {
        Self {
            data,
            events: &[],
            pos: 0,
        }
    }
}

impl<'db> StoreCursor<'db> for DataCursor<'db> {
    fn bind(&mut self, trail_id: TrailId) -> Result<()> {
        match self.data.trail_events(trail_id) {
            Some(events) => {
                self.events = events;
                self.pos = 0;
                Ok(())
            }
            None => Err(SpoorError::TrailOutOfRange {
                trail_id: trail_id.as_u64(),
                num_trails: self.data.num_trails(),
            }),
        }
    }

    fn next_event(&mut self) -> Option<RawEvent<'db>> {
        let event = self.events.get(self.pos)?;
        self.pos += 1;
        Some(RawEvent {
            timestamp: event.timestamp,
            items: &event.items,
        })
    }
}

// ---------------------------------------------------------------------------
// StoreBuilder
// ---------------------------------------------------------------------------

/// Accumulator behind every reference writer. Schema is fixed at
/// construction; trail ids are assigned at assembly, not insertion.
#[derive(Debug)]
pub struct StoreBuilder {
    fields: Vec<String>,
    lexicons: Vec<Lexicon>,
    trails: Vec<Trail>,
    by_uuid: HashMap<Uuid, usize>,
}

impl StoreBuilder {
    pub fn new(field_names: &[String]) -> Result<Self> {
        if field_names.len() as u64 >= u64::from(Item::MAX_FIELD) {
            return Err(SpoorError::schema(format!(
                "{} fields exceed the representable field space",
                field_names.len()
            )));
        }
        let mut seen = HashMap::new();
        for (i, name) in field_names.iter().enumerate() {
            if name.is_empty() {
                return Err(SpoorError::schema(format!("field {i} has an empty name")));
            }
            if name == "time" {
                return Err(SpoorError::schema("'time' is the implicit leading field"));
            }
            if let Some(first) = seen.insert(name.as_str(), i) {
                return Err(SpoorError::schema(format!(
                    "duplicate field name '{name}' (positions {first} and {i})"
                )));
            }
        }
        Ok(Self {
            fields: field_names.to_vec(),
            lexicons: vec![Lexicon::default(); field_names.len()],
            trails: Vec::new(),
            by_uuid: HashMap::new(),
        })
    }

    /// Add one event. A missing tail of `values` is stored absent; the
    /// empty string is the absent value and never enters a lexicon.
    pub fn put(&mut self, uuid: Uuid, timestamp: u64, values: &[&str]) -> Result<()> {
        if values.len() > self.fields.len() {
            return Err(SpoorError::schema(format!(
                "{} values supplied for {} fields",
                values.len(),
                self.fields.len()
            )));
        }
        let mut items = Vec::with_capacity(self.fields.len());
        for (i, lexicon) in self.lexicons.iter_mut().enumerate() {
            let value = values.get(i).copied().unwrap_or("");
            let index = if value.is_empty() {
                ValueIndex::ABSENT
            } else {
                lexicon
                    .intern(value)
                    .ok_or(SpoorError::TooManyValues { field: i })?
            };
            items.push(Item::pack(FieldId(i as u32 + 1), index));
        }
        let slot = *self.by_uuid.entry(uuid).or_insert_with(|| {
            self.trails.push(Trail {
                uuid,
                events: Vec::new(),
            });
            self.trails.len() - 1
        });
        self.trails[slot].events.push(Event { timestamp, items });
        Ok(())
    }

    pub fn build(self) -> StoreData {
        StoreData::assemble(FORMAT_VERSION, self.fields, self.lexicons, self.trails)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uuid(fill: u8) -> Uuid {
        Uuid::from_bytes([fill; 16])
    }

    fn sample() -> StoreData {
        let mut builder =
            StoreBuilder::new(&["field1".to_owned(), "field2".to_owned()]).unwrap();
        builder.put(uuid(0x12), 1, &["a", "1"]).unwrap();
        builder.put(uuid(0x12), 2, &["b", "2"]).unwrap();
        builder.put(uuid(0x12), 3, &["a", "3"]).unwrap();
        builder.build()
    }

    #[test]
    fn builder_rejects_bad_schemas() {
        assert!(StoreBuilder::new(&["a".to_owned(), "a".to_owned()]).is_err());
        assert!(StoreBuilder::new(&[String::new()]).is_err());
        assert!(StoreBuilder::new(&["time".to_owned()]).is_err());
    }

    #[test]
    fn counts_and_time_range() {
        let data = sample();
        assert_eq!(data.num_trails(), 1);
        assert_eq!(data.num_events(), 3);
        assert_eq!(data.num_fields(), 3);
        assert_eq!(data.min_timestamp(), 1);
        assert_eq!(data.max_timestamp(), 3);
    }

    #[test]
    fn lexicons_deduplicate_and_enumerate_from_one() {
        let data = sample();
        // "a" repeats, so field1 has two distinct values.
        assert_eq!(data.lexicon_len(FieldId(1)), Some(2));
        assert_eq!(data.lexicon_len(FieldId(2)), Some(3));
        assert_eq!(data.value(FieldId(1), ValueIndex(1)), Some("a"));
        assert_eq!(data.value(FieldId(1), ValueIndex(2)), Some("b"));
        assert_eq!(data.value(FieldId(1), ValueIndex(0)), Some(""));
        assert_eq!(data.value(FieldId(1), ValueIndex(3)), None);
    }

    #[test]
    fn time_field_has_no_lexicon() {
        let data = sample();
        assert_eq!(data.lexicon_len(FieldId::TIME), None);
        assert_eq!(data.lexicon_len(FieldId(3)), None);
        assert_eq!(data.field_name(FieldId::TIME), Some("time"));
        assert_eq!(data.field_name(FieldId(1)), Some("field1"));
        assert_eq!(data.field_name(FieldId(3)), None);
    }

    #[test]
    fn item_lookup_roundtrips_through_the_codec() {
        let data = sample();
        let item = data.item(FieldId(1), "b").unwrap();
        assert_eq!(item.field(), FieldId(1));
        assert_eq!(data.value(item.field(), item.value()), Some("b"));
        assert_eq!(data.item(FieldId(1), "zzz"), None);
        assert_eq!(data.item(FieldId(1), ""), None);
    }

    #[test]
    fn trail_ids_follow_identifier_byte_order() {
        let mut builder = StoreBuilder::new(&["f".to_owned()]).unwrap();
        builder.put(uuid(0xBB), 10, &["x"]).unwrap();
        builder.put(uuid(0xAA), 20, &["y"]).unwrap();
        let data = builder.build();
        assert_eq!(data.uuid(TrailId(0)), Some(uuid(0xAA)));
        assert_eq!(data.uuid(TrailId(1)), Some(uuid(0xBB)));
        assert_eq!(data.trail_id(&uuid(0xBB)), Some(TrailId(1)));
        assert_eq!(data.trail_id(&uuid(0xCC)), None);
        assert_eq!(data.uuid(TrailId(2)), None);
    }

    #[test]
    fn short_value_slice_pads_absent() {
        let mut builder =
            StoreBuilder::new(&["field1".to_owned(), "field2".to_owned()]).unwrap();
        builder.put(uuid(1), 123, &["a"]).unwrap();
        let data = builder.build();
        let events = data.trail_events(TrailId(0)).unwrap();
        assert_eq!(events[0].items[1].value(), ValueIndex::ABSENT);
        assert_eq!(data.value(FieldId(2), events[0].items[1].value()), Some(""));
    }

    #[test]
    fn too_many_values_is_a_schema_error() {
        let mut builder = StoreBuilder::new(&["f".to_owned()]).unwrap();
        let err = builder.put(uuid(1), 1, &["a", "b"]).unwrap_err();
        assert!(matches!(err, SpoorError::Schema { .. }));
    }

    #[test]
    fn cursor_walks_one_trail_then_exhausts() {
        let data = sample();
        let mut cursor = DataCursor::new(&data);
        cursor.bind(TrailId(0)).unwrap();
        let timestamps: Vec<u64> = std::iter::from_fn(|| cursor.next_event())
            .map(|e| e.timestamp)
            .collect();
        assert_eq!(timestamps, vec![1, 2, 3]);
        assert!(cursor.next_event().is_none());
        assert!(cursor.next_event().is_none());
    }

    #[test]
    fn cursor_bind_out_of_range() {
        let data = sample();
        let mut cursor = DataCursor::new(&data);
        let err = cursor.bind(TrailId(5)).unwrap_err();
        assert!(matches!(
            err,
            SpoorError::TrailOutOfRange {
                trail_id: 5,
                num_trails: 1
            }
        ));
    }
}
