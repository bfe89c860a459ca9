//! Creation and update records.

use bitstream::{Reader, Writer};
use schema::{FieldId, GroupId};

use crate::error::{CodecError, CodecResult};
use crate::limits::CodecLimits;
use crate::skip::{SkipDecoder, SkipEncoder};
use crate::types::{write_entity_ref, EntityRef};
use crate::value::{read_value, write_value, FieldValue};

const CREATION_MARKER: u8 = 1;
const UPDATE_MARKER: [u8; 2] = [0, 1];

/// Everything a viewer needs to construct an entity it has not seen.
#[derive(Debug, Clone, PartialEq)]
pub struct CreationRecord {
    pub entity: EntityRef,
    /// Present groups in ascending id order.
    pub groups: Vec<GroupId>,
    /// Every field of every present group, in ascending global index.
    pub fields: Vec<(FieldId, FieldValue)>,
}

/// Changed fields of an entity the viewer already knows.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateRecord {
    pub entity: EntityRef,
    /// Changed fields in ascending global index.
    pub fields: Vec<(FieldId, FieldValue)>,
}

/// Returns the fields of `groups` in ascending global index.
#[must_use]
pub fn creation_field_order(groups: &[GroupId]) -> Vec<FieldId> {
    let mut fields: Vec<FieldId> = groups
        .iter()
        .flat_map(|group| group.fields().iter().copied())
        .collect();
    fields.sort_unstable();
    fields
}

impl CreationRecord {
    /// Writes the record. Fields are written raw, so they must match the
    /// group table exactly.
    pub fn encode(&self, writer: &mut Writer) -> CodecResult<()> {
        write_entity_ref(writer, self.entity);
        writer.write_u8(CREATION_MARKER);

        let mut skip = SkipEncoder::new();
        let mut previous: Option<GroupId> = None;
        for &group in &self.groups {
            if previous.is_some_and(|p| p >= group) {
                return Err(CodecError::GroupsOutOfOrder { group });
            }
            previous = Some(group);
            skip.push(writer, u32::from(group.id()));
        }
        skip.finish(writer);

        let expected = creation_field_order(&self.groups);
        if expected.len() != self.fields.len() {
            let at = expected.len().min(self.fields.len());
            return Err(CodecError::CreationFieldMismatch {
                expected: expected.get(at).copied(),
                found: self.fields.get(at).map(|(field, _)| *field),
            });
        }
        for (want, (field, value)) in expected.iter().zip(&self.fields) {
            if want != field {
                return Err(CodecError::CreationFieldMismatch {
                    expected: Some(*want),
                    found: Some(*field),
                });
            }
            write_value(writer, *field, value)?;
        }
        Ok(())
    }

    pub(crate) fn decode_body(
        reader: &mut Reader<'_>,
        entity: EntityRef,
        limits: &CodecLimits,
    ) -> CodecResult<Self> {
        let mut skip = SkipDecoder::new();
        let mut groups = Vec::new();
        while let Some(id) = skip.next_index(reader)? {
            let group = u8::try_from(id)
                .ok()
                .and_then(GroupId::from_id)
                .ok_or(CodecError::UnknownGroup { id: id as u8 })?;
            groups.push(group);
        }

        let order = creation_field_order(&groups);
        let mut fields = Vec::with_capacity(order.len());
        for field in order {
            fields.push((field, read_value(reader, field, limits)?));
        }
        Ok(Self {
            entity,
            groups,
            fields,
        })
    }
}

impl UpdateRecord {
    /// Writes the record with skip-encoded field indices.
    pub fn encode(&self, writer: &mut Writer) -> CodecResult<()> {
        write_entity_ref(writer, self.entity);
        writer.write_bytes(&UPDATE_MARKER);

        let mut skip = SkipEncoder::new();
        let mut previous: Option<FieldId> = None;
        for (field, value) in &self.fields {
            if previous.is_some_and(|p| p >= *field) {
                return Err(CodecError::FieldsOutOfOrder { field: *field });
            }
            previous = Some(*field);
            skip.push(writer, u32::from(field.index()));
            write_value(writer, *field, value)?;
        }
        skip.finish(writer);
        Ok(())
    }

    pub(crate) fn decode_body(
        reader: &mut Reader<'_>,
        entity: EntityRef,
        limits: &CodecLimits,
    ) -> CodecResult<Self> {
        let mut skip = SkipDecoder::new();
        let mut fields = Vec::new();
        while let Some(index) = skip.next_index(reader)? {
            let field = u8::try_from(index)
                .ok()
                .and_then(FieldId::from_index)
                .ok_or(CodecError::UnknownField { index })?;
            fields.push((field, read_value(reader, field, limits)?));
        }
        Ok(Self { entity, fields })
    }
}

/// A decoded record of either kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Creation(CreationRecord),
    Update(UpdateRecord),
}

/// Reads the marker following an entity reference and the record body.
pub(crate) fn decode_record(
    reader: &mut Reader<'_>,
    entity: EntityRef,
    limits: &CodecLimits,
) -> CodecResult<Record> {
    match reader.read_u8()? {
        CREATION_MARKER => Ok(Record::Creation(CreationRecord::decode_body(
            reader, entity, limits,
        )?)),
        0 => {
            let second = reader.read_u8()?;
            if second != UPDATE_MARKER[1] {
                return Err(CodecError::InvalidRecordMarker { byte: second });
            }
            Ok(Record::Update(UpdateRecord::decode_body(
                reader, entity, limits,
            )?))
        }
        byte => Err(CodecError::InvalidRecordMarker { byte }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::read_entity_ref;

    fn score_record() -> CreationRecord {
        CreationRecord {
            entity: EntityRef::new(3, 1),
            groups: vec![GroupId::Score],
            fields: vec![(FieldId::Score, FieldValue::Float(2.0))],
        }
    }

    fn decode(bytes: &[u8]) -> Record {
        let mut reader = Reader::new(bytes);
        let entity = read_entity_ref(&mut reader).unwrap();
        let record = decode_record(&mut reader, entity, &CodecLimits::for_testing()).unwrap();
        assert!(reader.is_empty());
        record
    }

    #[test]
    fn creation_layout() {
        let mut writer = Writer::new();
        score_record().encode(&mut writer).unwrap();
        // ref(1, 3), marker 1, group 10 -> (10+1)^1 = 10, end 1, f32 2.0
        let mut expected = vec![1, 3, 1, 10, 1];
        expected.extend_from_slice(&2.0f32.to_le_bytes());
        assert_eq!(writer.as_bytes(), expected.as_slice());
        assert_eq!(decode(writer.as_bytes()), Record::Creation(score_record()));
    }

    #[test]
    fn update_layout() {
        let record = UpdateRecord {
            entity: EntityRef::new(3, 1),
            fields: vec![(FieldId::Sides, FieldValue::UInt(4))],
        };
        let mut writer = Writer::new();
        record.encode(&mut writer).unwrap();
        // ref, 0, 1, Sides index 7 -> 8^1 = 9, value 4, end
        assert_eq!(writer.as_bytes(), &[1, 3, 0, 1, 9, 4, 1]);
        assert_eq!(decode(writer.as_bytes()), Record::Update(record));
    }

    #[test]
    fn creation_fields_interleave_by_index() {
        let order = creation_field_order(&[GroupId::Position, GroupId::Relations]);
        assert_eq!(order[0], FieldId::Parent);
        assert_eq!(order[3], FieldId::X);
        assert_eq!(order.len(), 7);
    }

    #[test]
    fn creation_rejects_missing_field() {
        let mut record = score_record();
        record.fields.clear();
        let mut writer = Writer::new();
        let err = record.encode(&mut writer).unwrap_err();
        assert_eq!(
            err,
            CodecError::CreationFieldMismatch {
                expected: Some(FieldId::Score),
                found: None
            }
        );
    }

    #[test]
    fn creation_rejects_unsorted_groups() {
        let record = CreationRecord {
            entity: EntityRef::new(1, 1),
            groups: vec![GroupId::Score, GroupId::Name],
            fields: Vec::new(),
        };
        let mut writer = Writer::new();
        let err = record.encode(&mut writer).unwrap_err();
        assert_eq!(err, CodecError::GroupsOutOfOrder { group: GroupId::Name });
    }

    #[test]
    fn update_rejects_unsorted_fields() {
        let record = UpdateRecord {
            entity: EntityRef::new(1, 1),
            fields: vec![
                (FieldId::Y, FieldValue::Float(0.0)),
                (FieldId::X, FieldValue::Float(0.0)),
            ],
        };
        let mut writer = Writer::new();
        assert!(matches!(
            record.encode(&mut writer),
            Err(CodecError::FieldsOutOfOrder { field: FieldId::X })
        ));
    }

    #[test]
    fn bad_marker_rejected() {
        let mut reader = Reader::new(&[2]);
        let err = decode_record(&mut reader, EntityRef::new(1, 1), &CodecLimits::for_testing())
            .unwrap_err();
        assert_eq!(err, CodecError::InvalidRecordMarker { byte: 2 });

        let mut reader = Reader::new(&[0, 0]);
        let err = decode_record(&mut reader, EntityRef::new(1, 1), &CodecLimits::for_testing())
            .unwrap_err();
        assert_eq!(err, CodecError::InvalidRecordMarker { byte: 0 });
    }

    #[test]
    fn unknown_group_rejected() {
        // group 4 -> (4+1)^1 = 4
        let mut reader = Reader::new(&[4, 1]);
        let err = CreationRecord::decode_body(
            &mut reader,
            EntityRef::new(1, 1),
            &CodecLimits::for_testing(),
        )
        .unwrap_err();
        assert_eq!(err, CodecError::UnknownGroup { id: 4 });
    }
}
