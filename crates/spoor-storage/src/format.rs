//! On-disk layout of the file backend.
//!
//! One store is one file. All integers are little-endian; strings are
//! length-prefixed UTF-8. The layout, in file order:
//!
//! ```text
//! magic        8 bytes  "SPOORDB\0"
//! version      u32
//! field_count  u32                          data fields only
//! fields       field_count × (u32 len, bytes)
//! lexicons     field_count × (u64 n, n × (u32 len, bytes))   indices 1..=n
//! trail_count  u64
//! trails       trail_count × (uuid 16 bytes, u64 n_events,
//!                  n_events × (u64 timestamp, field_count × u64 item))
//! ```
//!
//! Decoding failures come back as a [`StoreCode`] so the caller can embed
//! them in its `Open` error; this module never sees the path being opened.

use spoor_error::StoreCode;
use spoor_types::{FieldId, Item, Uuid};

use crate::data::{Event, Lexicon, StoreData, Trail, FORMAT_VERSION};

const MAGIC: [u8; 8] = *b"SPOORDB\0";

// ---------------------------------------------------------------------------
// Encode
// ---------------------------------------------------------------------------

fn put_str(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(&(s.len() as u32).to_le_bytes());
    out.extend_from_slice(s.as_bytes());
}

/// Serialize a sealed store.
#[must_use]
pub fn encode(data: &StoreData) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&data.version().to_le_bytes());
    out.extend_from_slice(&(data.data_fields().len() as u32).to_le_bytes());
    for name in data.data_fields() {
        put_str(&mut out, name);
    }
    for lexicon in data.lexicons() {
        out.extend_from_slice(&lexicon.len().to_le_bytes());
        for value in lexicon.values() {
            put_str(&mut out, value);
        }
    }
    out.extend_from_slice(&(data.trails().len() as u64).to_le_bytes());
    for trail in data.trails() {
        out.extend_from_slice(trail.uuid.as_bytes());
        out.extend_from_slice(&(trail.events.len() as u64).to_le_bytes());
        for event in &trail.events {
            out.extend_from_slice(&event.timestamp.to_le_bytes());
            for item in &event.items {
                out.extend_from_slice(&item.as_u64().to_le_bytes());
            }
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Decode
// ---------------------------------------------------------------------------

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], StoreCode> {
        let end = self.pos.checked_add(n).ok_or(StoreCode::Truncated)?;
        if end > self.buf.len() {
            return Err(StoreCode::Truncated);
        }
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u32(&mut self) -> Result<u32, StoreCode> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes(bytes.try_into().expect("4-byte slice")))
    }

    fn u64(&mut self) -> Result<u64, StoreCode> {
        let bytes = self.take(8)?;
        Ok(u64::from_le_bytes(bytes.try_into().expect("8-byte slice")))
    }

    fn string(&mut self) -> Result<String, StoreCode> {
        let len = self.u32()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| StoreCode::Garbled)
    }
}

/// Deserialize a store file.
pub fn decode(bytes: &[u8]) -> Result<StoreData, StoreCode> {
    let mut r = Reader { buf: bytes, pos: 0 };

    if r.take(8)? != MAGIC {
        return Err(StoreCode::BadMagic);
    }
    let version = r.u32()?;
    if version > FORMAT_VERSION {
        return Err(StoreCode::UnsupportedVersion);
    }

    let field_count = r.u32()? as usize;
    let mut fields = Vec::with_capacity(field_count);
    for _ in 0..field_count {
        fields.push(r.string()?);
    }

    let mut lexicons = Vec::with_capacity(field_count);
    for _ in 0..field_count {
        let n = r.u64()?;
        let n = usize::try_from(n).map_err(|_| StoreCode::Garbled)?;
        let mut values = Vec::with_capacity(n);
        for _ in 0..n {
            values.push(r.string()?);
        }
        lexicons.push(Lexicon::from_values(values));
    }

    let trail_count = r.u64()?;
    let trail_count = usize::try_from(trail_count).map_err(|_| StoreCode::Garbled)?;
    let mut trails = Vec::with_capacity(trail_count);
    for _ in 0..trail_count {
        let uuid_bytes: [u8; 16] = r.take(16)?.try_into().expect("16-byte slice");
        let uuid = Uuid::from_bytes(uuid_bytes);
        let n_events = r.u64()?;
        let n_events = usize::try_from(n_events).map_err(|_| StoreCode::Garbled)?;
        let mut events = Vec::with_capacity(n_events);
        for _ in 0..n_events {
            let timestamp = r.u64()?;
            let mut items = Vec::with_capacity(field_count);
            for field in 0..field_count {
                let item = Item::from_u64(r.u64()?);
                // Every stored item carries its own field id; a mismatch
                // means the event table is shifted or overwritten.
                if item.field() != FieldId(field as u32 + 1) {
                    return Err(StoreCode::Garbled);
                }
                items.push(item);
            }
            events.push(Event { timestamp, items });
        }
        trails.push(Trail { uuid, events });
    }

    if r.pos != bytes.len() {
        return Err(StoreCode::Garbled);
    }

    Ok(StoreData::assemble(version, fields, lexicons, trails))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::StoreBuilder;
    use spoor_types::{TrailId, ValueIndex};

    fn sample() -> StoreData {
        let mut builder =
            StoreBuilder::new(&["field1".to_owned(), "field2".to_owned()]).unwrap();
        let id = Uuid::from_bytes([0x12; 16]);
        builder.put(id, 1, &["a", "1"]).unwrap();
        builder.put(id, 2, &["b", "2"]).unwrap();
        builder.put(Uuid::from_bytes([0x01; 16]), 5, &["c"]).unwrap();
        builder.build()
    }

    #[test]
    fn roundtrip_preserves_every_lookup() {
        let data = sample();
        let back = decode(&encode(&data)).unwrap();

        assert_eq!(back.num_trails(), data.num_trails());
        assert_eq!(back.num_events(), data.num_events());
        assert_eq!(back.num_fields(), data.num_fields());
        assert_eq!(back.min_timestamp(), data.min_timestamp());
        assert_eq!(back.max_timestamp(), data.max_timestamp());
        assert_eq!(back.field_name(FieldId(1)), Some("field1"));
        assert_eq!(back.lexicon_len(FieldId(1)), data.lexicon_len(FieldId(1)));
        assert_eq!(back.value(FieldId(1), ValueIndex(2)), Some("b"));
        assert_eq!(back.uuid(TrailId(0)), data.uuid(TrailId(0)));
        assert_eq!(
            back.trail_events(TrailId(1)).unwrap(),
            data.trail_events(TrailId(1)).unwrap()
        );
    }

    #[test]
    fn bad_magic_is_detected() {
        let mut bytes = encode(&sample());
        bytes[0] = b'X';
        assert!(matches!(decode(&bytes), Err(StoreCode::BadMagic)));
    }

    #[test]
    fn future_version_is_refused() {
        let mut bytes = encode(&sample());
        bytes[8..12].copy_from_slice(&99u32.to_le_bytes());
        assert!(matches!(decode(&bytes), Err(StoreCode::UnsupportedVersion)));
    }

    #[test]
    fn truncation_is_detected() {
        let bytes = encode(&sample());
        for cut in [5, 13, bytes.len() - 3] {
            assert!(matches!(decode(&bytes[..cut]), Err(StoreCode::Truncated)));
        }
    }

    #[test]
    fn trailing_garbage_is_detected() {
        let mut bytes = encode(&sample());
        bytes.extend_from_slice(&[0u8; 4]);
        assert!(matches!(decode(&bytes), Err(StoreCode::Garbled)));
    }

    #[test]
    fn shifted_item_table_is_detected() {
        let data = sample();
        let mut bytes = encode(&data);
        // Stamp an item whose embedded field id cannot belong where it sits.
        let last8 = bytes.len() - 8;
        bytes[last8..].copy_from_slice(&Item::pack(FieldId(9), ValueIndex(1)).as_u64().to_le_bytes());
        assert!(matches!(decode(&bytes), Err(StoreCode::Garbled)));
    }
}
