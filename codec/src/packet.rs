//! Update packet encoding/decoding.

use bitstream::{Reader, Writer};
use wire::ClientBound;

use crate::error::{CodecError, CodecResult, LimitKind};
use crate::limits::CodecLimits;
use crate::record::{decode_record, CreationRecord, Record, UpdateRecord};
use crate::types::{read_entity_ref, write_entity_ref, EntityRef, Tick};

/// One tick's delta for one viewer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UpdatePacket {
    pub tick: Tick,
    /// Entities leaving the view, each carrying the hash the viewer knows.
    pub deletes: Vec<EntityRef>,
    pub updates: Vec<UpdateRecord>,
    pub creations: Vec<CreationRecord>,
}

impl UpdatePacket {
    /// Creates an empty packet for `tick`.
    #[must_use]
    pub fn new(tick: Tick) -> Self {
        Self {
            tick,
            ..Self::default()
        }
    }

    /// Number of creation plus update records.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.updates.len() + self.creations.len()
    }

    /// Returns `true` if the packet carries no deletes and no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deletes.is_empty() && self.record_count() == 0
    }
}

/// Encodes an update packet.
///
/// Layout: header `0x00`, tick, delete count and references, record count,
/// update records, then creation records.
pub fn encode_update_packet(packet: &UpdatePacket) -> CodecResult<Vec<u8>> {
    let mut writer = Writer::with_capacity(16 + packet.record_count() * 8);
    writer.write_u8(ClientBound::Update.id());
    writer.write_varu32(packet.tick.raw());

    writer.write_varu32(packet.deletes.len() as u32);
    for entity in &packet.deletes {
        write_entity_ref(&mut writer, *entity);
    }

    writer.write_varu32(packet.record_count() as u32);
    for record in &packet.updates {
        record.encode(&mut writer)?;
    }
    for record in &packet.creations {
        record.encode(&mut writer)?;
    }
    Ok(writer.finish())
}

/// Decodes an update packet, consuming every byte.
pub fn decode_update_packet(bytes: &[u8], limits: &CodecLimits) -> CodecResult<UpdatePacket> {
    let mut reader = Reader::new(bytes);
    let header = reader.read_u8()?;
    if header != ClientBound::Update.id() {
        return Err(CodecError::UnexpectedHeader { found: header });
    }
    let tick = Tick::new(reader.read_varu32()?);

    let delete_count = reader.read_varu32()? as usize;
    if delete_count > limits.max_deletes {
        return Err(CodecError::LimitsExceeded {
            kind: LimitKind::Deletes,
            limit: limits.max_deletes,
            actual: delete_count,
        });
    }
    let mut deletes = Vec::with_capacity(delete_count.min(reader.remaining()));
    for _ in 0..delete_count {
        deletes.push(read_entity_ref(&mut reader)?);
    }

    let record_count = reader.read_varu32()? as usize;
    if record_count > limits.max_records {
        return Err(CodecError::LimitsExceeded {
            kind: LimitKind::Records,
            limit: limits.max_records,
            actual: record_count,
        });
    }
    let mut updates = Vec::new();
    let mut creations = Vec::new();
    for _ in 0..record_count {
        let entity = read_entity_ref(&mut reader)?;
        match decode_record(&mut reader, entity, limits)? {
            Record::Update(record) => updates.push(record),
            Record::Creation(record) => creations.push(record),
        }
    }

    if !reader.is_empty() {
        return Err(CodecError::TrailingBytes {
            remaining: reader.remaining(),
        });
    }
    Ok(UpdatePacket {
        tick,
        deletes,
        updates,
        creations,
    })
}

#[cfg(test)]
mod tests {
    use schema::{FieldId, GroupId};

    use super::*;
    use crate::value::FieldValue;

    #[test]
    fn empty_packet_layout() {
        let bytes = encode_update_packet(&UpdatePacket::new(Tick::new(5))).unwrap();
        assert_eq!(bytes, vec![0x00, 5, 0, 0]);
        let decoded = decode_update_packet(&bytes, &CodecLimits::for_testing()).unwrap();
        assert!(decoded.is_empty());
        assert_eq!(decoded.tick, Tick::new(5));
    }

    #[test]
    fn updates_precede_creations() {
        let packet = UpdatePacket {
            tick: Tick::new(1),
            deletes: vec![EntityRef::new(4, 2)],
            updates: vec![UpdateRecord {
                entity: EntityRef::new(1, 1),
                fields: vec![(FieldId::Score, FieldValue::Float(1.0))],
            }],
            creations: vec![CreationRecord {
                entity: EntityRef::new(2, 1),
                groups: vec![GroupId::Score],
                fields: vec![(FieldId::Score, FieldValue::Float(3.0))],
            }],
        };
        let bytes = encode_update_packet(&packet).unwrap();
        // header, tick, 1 delete (hash 2, id 4), 2 records, first record ref (1, 1) + update marker
        assert_eq!(&bytes[..9], &[0x00, 1, 1, 2, 4, 2, 1, 1, 0]);
        let decoded = decode_update_packet(&bytes, &CodecLimits::for_testing()).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn wrong_header_rejected() {
        let err = decode_update_packet(&[0x07], &CodecLimits::for_testing()).unwrap_err();
        assert_eq!(err, CodecError::UnexpectedHeader { found: 0x07 });
    }

    #[test]
    fn delete_limit_enforced() {
        let err = decode_update_packet(&[0x00, 0, 200, 1], &CodecLimits::for_testing())
            .unwrap_err();
        assert!(matches!(
            err,
            CodecError::LimitsExceeded {
                kind: LimitKind::Deletes,
                ..
            }
        ));
    }

    #[test]
    fn trailing_bytes_rejected() {
        let err = decode_update_packet(&[0x00, 0, 0, 0, 9], &CodecLimits::for_testing())
            .unwrap_err();
        assert_eq!(err, CodecError::TrailingBytes { remaining: 1 });
    }
}
