//! Single-trail, single-pass cursors.
//!
//! A cursor is bound to one trail at creation and moves through two
//! states only: Active, then Exhausted. Once the underlying event stream
//! ends, every further advance yields `None`; there is no reset, and
//! re-reading a trail means creating a new cursor. Each decoding option
//! set is its own type, fixed at creation:
//!
//! - [`TrailCursor`] — items resolved to their string values.
//! - [`RawCursor`] — raw packed items.
//! - [`TimeCursor`] — timestamps only; item decoding is skipped.
//!
//! All three apply the handle's installed filter, if any.

use chrono::{DateTime, Utc};
use spoor_error::{Result, SpoorError};
use spoor_storage::{RawEvent, StorageEngine, StoreCursor, StoreReader};
use spoor_types::time::epoch_to_utc;
use spoor_types::{TrailId, Uuid};

use crate::TrailDb;

// ---------------------------------------------------------------------------
// RawCursor
// ---------------------------------------------------------------------------

/// Cursor yielding events as `(timestamp, raw items)`.
pub struct RawCursor<'db, E: StorageEngine>
where
    E::Reader: 'db,
{
    inner: <E::Reader as StoreReader>::Cursor<'db>,
    filter: Option<&'db [u64]>,
}

impl<'db, E: StorageEngine> std::fmt::Debug for RawCursor<'db, E>
where
    E::Reader: 'db,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawCursor").finish_non_exhaustive()
    }
}

impl<'db, E: StorageEngine> RawCursor<'db, E>
where
    E::Reader: 'db,
{
    pub(crate) fn new(
        inner: <E::Reader as StoreReader>::Cursor<'db>,
        filter: Option<&'db [u64]>,
    ) -> Self {
        Self { inner, filter }
    }
}

impl<'db, E: StorageEngine> Iterator for RawCursor<'db, E>
where
    E::Reader: 'db,
{
    type Item = RawEvent<'db>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let event = self.inner.next_event()?;
            match self.filter {
                Some(wire) if !spoor_filter::matches(wire, event.items) => continue,
                _ => return Some(event),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// TrailCursor
// ---------------------------------------------------------------------------

/// One decoded event: epoch seconds plus the string value of every data
/// field, in declared field order. Absent values decode to `""`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedEvent {
    pub timestamp: u64,
    pub values: Vec<String>,
}

impl DecodedEvent {
    /// The timestamp as calendar time.
    #[must_use]
    pub fn utc(&self) -> Option<DateTime<Utc>> {
        epoch_to_utc(self.timestamp)
    }
}

/// Cursor yielding events with items resolved through the lexicon.
pub struct TrailCursor<'db, E: StorageEngine>
where
    E::Reader: 'db,
{
    db: &'db TrailDb<E>,
    inner: RawCursor<'db, E>,
}

impl<'db, E: StorageEngine> std::fmt::Debug for TrailCursor<'db, E>
where
    E::Reader: 'db,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrailCursor").finish_non_exhaustive()
    }
}

impl<'db, E: StorageEngine> TrailCursor<'db, E>
where
    E::Reader: 'db,
{
    pub(crate) fn new(
        db: &'db TrailDb<E>,
        cursor: <E::Reader as StoreReader>::Cursor<'db>,
    ) -> Self {
        Self {
            db,
            inner: RawCursor::new(cursor, db.filter_array()),
        }
    }
}

impl<'db, E: StorageEngine> Iterator for TrailCursor<'db, E>
where
    E::Reader: 'db,
{
    type Item = Result<DecodedEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        let event = self.inner.next()?;
        let mut values = Vec::with_capacity(event.items.len());
        for item in event.items {
            match self.db.reader().value(item.field(), item.value()) {
                Some(value) => values.push(value.to_owned()),
                None => {
                    return Some(Err(SpoorError::ValueLookup {
                        field: item.field().as_u32(),
                        value: item.value().as_u64(),
                    }));
                }
            }
        }
        Some(Ok(DecodedEvent {
            timestamp: event.timestamp,
            values,
        }))
    }
}

// ---------------------------------------------------------------------------
// TimeCursor
// ---------------------------------------------------------------------------

/// Cursor yielding only event timestamps, for inter-event timing work
/// such as session-boundary computations.
pub struct TimeCursor<'db, E: StorageEngine>
where
    E::Reader: 'db,
{
    inner: RawCursor<'db, E>,
}

impl<'db, E: StorageEngine> std::fmt::Debug for TimeCursor<'db, E>
where
    E::Reader: 'db,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeCursor").finish_non_exhaustive()
    }
}

impl<'db, E: StorageEngine> TimeCursor<'db, E>
where
    E::Reader: 'db,
{
    pub(crate) fn new(
        cursor: <E::Reader as StoreReader>::Cursor<'db>,
        filter: Option<&'db [u64]>,
    ) -> Self {
        Self {
            inner: RawCursor::new(cursor, filter),
        }
    }
}

impl<'db, E: StorageEngine> Iterator for TimeCursor<'db, E>
where
    E::Reader: 'db,
{
    type Item = u64;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|event| event.timestamp)
    }
}

// ---------------------------------------------------------------------------
// Trails
// ---------------------------------------------------------------------------

/// Iterator over every `(identifier, trail cursor)` pair of a store, in
/// trail-id order.
pub struct Trails<'db, E: StorageEngine> {
    db: &'db TrailDb<E>,
    next: u64,
}

impl<'db, E: StorageEngine> Trails<'db, E> {
    pub(crate) fn new(db: &'db TrailDb<E>) -> Self {
        Self { db, next: 0 }
    }
}

impl<'db, E: StorageEngine> Iterator for Trails<'db, E> {
    type Item = (Uuid, TrailCursor<'db, E>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.db.num_trails() {
            return None;
        }
        let trail_id = TrailId(self.next);
        self.next += 1;
        let uuid = self.db.uuid(trail_id).ok()?;
        let cursor = self.db.trail(trail_id).ok()?;
        Some((uuid, cursor))
    }
}
