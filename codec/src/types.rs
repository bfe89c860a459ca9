//! Core types for the codec.

use bitstream::{Reader, Writer};

use crate::error::CodecResult;

/// A simulation tick number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Tick(u32);

impl Tick {
    /// Creates a new tick.
    #[must_use]
    pub const fn new(tick: u32) -> Self {
        Self(tick)
    }

    /// Returns the raw tick value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Returns the following tick.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    /// Returns the tick `delay` ticks later.
    #[must_use]
    pub const fn after(self, delay: u32) -> Self {
        Self(self.0.wrapping_add(delay))
    }
}

impl From<u32> for Tick {
    fn from(tick: u32) -> Self {
        Self(tick)
    }
}

impl From<Tick> for u32 {
    fn from(tick: Tick) -> Self {
        tick.0
    }
}

/// Weak reference to an entity: slot id plus the slot's generation hash.
///
/// The reference resolves only while the slot still carries the same hash.
/// Hash 0 never names a live entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct EntityRef {
    pub id: u32,
    pub hash: u32,
}

impl EntityRef {
    /// The null reference.
    pub const NULL: Self = Self { id: 0, hash: 0 };

    /// Creates a reference.
    #[must_use]
    pub const fn new(id: u32, hash: u32) -> Self {
        Self { id, hash }
    }

    /// Returns `true` for the null reference (hash 0).
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.hash == 0
    }
}

/// Writes an entity reference: a single zero byte when null, otherwise the
/// hash followed by the id.
pub fn write_entity_ref(writer: &mut Writer, entity: EntityRef) {
    if entity.is_null() {
        writer.write_u8(0);
    } else {
        writer.write_varu32(entity.hash);
        writer.write_varu32(entity.id);
    }
}

/// Reads an entity reference written by [`write_entity_ref`].
pub fn read_entity_ref(reader: &mut Reader<'_>) -> CodecResult<EntityRef> {
    let hash = reader.read_varu32()?;
    if hash == 0 {
        return Ok(EntityRef::NULL);
    }
    let id = reader.read_varu32()?;
    Ok(EntityRef { id, hash })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_next_wraps() {
        assert_eq!(Tick::new(1).next(), Tick::new(2));
        assert_eq!(Tick::new(u32::MAX).next(), Tick::new(0));
        assert_eq!(Tick::new(10).after(5).raw(), 15);
    }

    #[test]
    fn null_ref_is_one_byte() {
        let mut writer = Writer::new();
        write_entity_ref(&mut writer, EntityRef::NULL);
        assert_eq!(writer.as_bytes(), &[0]);
    }

    #[test]
    fn dead_ref_writes_as_null() {
        let mut writer = Writer::new();
        write_entity_ref(&mut writer, EntityRef::new(42, 0));
        assert_eq!(writer.as_bytes(), &[0]);
    }

    #[test]
    fn live_ref_is_hash_then_id() {
        let mut writer = Writer::new();
        write_entity_ref(&mut writer, EntityRef::new(300, 7));
        assert_eq!(writer.as_bytes(), &[7, 0xAC, 0x02]);

        let bytes = writer.finish();
        let mut reader = Reader::new(&bytes);
        assert_eq!(read_entity_ref(&mut reader).unwrap(), EntityRef::new(300, 7));
        assert!(reader.is_empty());
    }

    #[test]
    fn truncated_ref_errors() {
        let mut reader = Reader::new(&[7]);
        assert!(read_entity_ref(&mut reader).is_err());
    }
}
