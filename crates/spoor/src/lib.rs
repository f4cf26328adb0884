//! Public API facade for spoordb.
//!
//! Typical flow: a [`TrailConstructor`] accumulates events and
//! [`finalize`](TrailConstructor::finalize)s into a [`TrailDb`]; the
//! handle answers metadata and lexicon queries and hands out per-trail
//! cursors; [`filter`] compiles CNF predicates into the binary form the
//! cursors apply.
//!
//! ```no_run
//! use spoor::{TrailConstructor, Uuid};
//!
//! # fn main() -> spoor::Result<()> {
//! let id = Uuid::from_hex("12345678123456781234567812345678")?;
//! let mut cons = TrailConstructor::open("visits", &["page", "browser"])?;
//! cons.add(id, 1470000000u64, &["/home", "Chrome"])?;
//! let db = cons.finalize()?;
//! for event in db.trail(db.trail_id(&id)?)? {
//!     let event = event?;
//!     println!("{} {:?}", event.timestamp, event.values);
//! }
//! # Ok(())
//! # }
//! ```

pub use spoor_cons::TrailConstructor;
pub use spoor_db::{DecodedEvent, RawCursor, TimeCursor, TrailCursor, TrailDb, Trails};
pub use spoor_error::{Result, SpoorError, StoreCode};
pub use spoor_filter as filter;
pub use spoor_filter::{Clause, ClauseMember, Op, Term};
pub use spoor_storage::{
    FileEngine, MemoryEngine, RawEvent, StorageEngine, StoreCursor, StoreReader, StoreWriter,
};
pub use spoor_types::{EventTime, FieldId, FieldRef, Item, TrailId, Uuid, ValueIndex};
