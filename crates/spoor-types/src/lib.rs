//! Core value types for spoordb.
//!
//! Everything here is storage-engine-agnostic: the packed [`Item`] codec,
//! the 128-bit trail [`Uuid`], the typed ID newtypes, and the
//! [`EventTime`] ingestion type. All are cheap `Copy` values except
//! `EventTime`'s calendar arm.

pub mod ids;
pub mod item;
pub mod time;
pub mod uuid;

pub use ids::{FieldId, FieldRef, TrailId, ValueIndex};
pub use item::Item;
pub use time::EventTime;
pub use uuid::Uuid;
