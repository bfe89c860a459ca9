//! Field values and their per-encoding wire form.

use bitstream::{Reader, Writer};
use schema::{FieldCodec, FieldId, FieldShape};

use crate::error::{CodecError, CodecResult, LimitKind};
use crate::limits::CodecLimits;
use crate::skip::{SkipDecoder, SkipEncoder};
use crate::types::{read_entity_ref, write_entity_ref, EntityRef};

/// A field value in decoded form.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    UInt(u32),
    SInt(i32),
    Float(f32),
    /// Radians.
    Angle(f32),
    Str(String),
    Entity(EntityRef),
    /// Table slots in ascending slot order. Creation records carry every
    /// slot; update records carry only changed slots.
    Table(Vec<(u8, FieldValue)>),
}

impl FieldValue {
    /// Short variant name used in error messages.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::UInt(_) => "uint",
            Self::SInt(_) => "sint",
            Self::Float(_) => "float",
            Self::Angle(_) => "angle",
            Self::Str(_) => "string",
            Self::Entity(_) => "entity",
            Self::Table(_) => "table",
        }
    }
}

/// Writes `value` using `field`'s encoding.
pub fn write_value(writer: &mut Writer, field: FieldId, value: &FieldValue) -> CodecResult<()> {
    let def = field.def();
    match (def.shape, value) {
        (FieldShape::Table { capacity }, FieldValue::Table(slots)) => {
            let mut skip = SkipEncoder::new();
            let mut previous: Option<u8> = None;
            for (slot, slot_value) in slots {
                if *slot >= capacity || previous.is_some_and(|p| p >= *slot) {
                    return Err(CodecError::InvalidTableSlot {
                        field,
                        slot: u32::from(*slot),
                    });
                }
                previous = Some(*slot);
                skip.push(writer, u32::from(*slot));
                write_scalar(writer, field, def.codec, slot_value)?;
            }
            skip.finish(writer);
            Ok(())
        }
        (FieldShape::Table { .. }, other) => Err(CodecError::ValueMismatch {
            field,
            codec: def.codec,
            found: other.kind_name(),
        }),
        (FieldShape::Scalar, value) => write_scalar(writer, field, def.codec, value),
    }
}

fn write_scalar(
    writer: &mut Writer,
    field: FieldId,
    codec: FieldCodec,
    value: &FieldValue,
) -> CodecResult<()> {
    match (codec, value) {
        (FieldCodec::VarUInt, FieldValue::UInt(v)) => writer.write_varu32(*v),
        (FieldCodec::VarSInt, FieldValue::SInt(v)) => writer.write_vars32(*v),
        (FieldCodec::Float32, FieldValue::Float(v)) => writer.write_f32(*v),
        (FieldCodec::Angle, FieldValue::Angle(v)) => writer.write_angle(*v),
        (FieldCodec::String, FieldValue::Str(v)) => writer.write_string_nt(v),
        (FieldCodec::EntityRef, FieldValue::Entity(v)) => write_entity_ref(writer, *v),
        (codec, other) => {
            return Err(CodecError::ValueMismatch {
                field,
                codec,
                found: other.kind_name(),
            })
        }
    }
    Ok(())
}

/// Reads a value written with `field`'s encoding.
pub fn read_value(
    reader: &mut Reader<'_>,
    field: FieldId,
    limits: &CodecLimits,
) -> CodecResult<FieldValue> {
    let def = field.def();
    match def.shape {
        FieldShape::Scalar => read_scalar(reader, def.codec, limits),
        FieldShape::Table { capacity } => {
            let mut skip = SkipDecoder::new();
            let mut slots = Vec::new();
            while let Some(slot) = skip.next_index(reader)? {
                if slot >= u32::from(capacity) {
                    return Err(CodecError::InvalidTableSlot { field, slot });
                }
                let value = read_scalar(reader, def.codec, limits)?;
                slots.push((slot as u8, value));
            }
            Ok(FieldValue::Table(slots))
        }
    }
}

fn read_scalar(
    reader: &mut Reader<'_>,
    codec: FieldCodec,
    limits: &CodecLimits,
) -> CodecResult<FieldValue> {
    let value = match codec {
        FieldCodec::VarUInt => FieldValue::UInt(reader.read_varu32()?),
        FieldCodec::VarSInt => FieldValue::SInt(reader.read_vars32()?),
        FieldCodec::Float32 => FieldValue::Float(reader.read_f32()?),
        FieldCodec::Angle => FieldValue::Angle(reader.read_angle()?),
        FieldCodec::String => {
            let value = reader.read_string_nt()?;
            if value.len() > limits.max_string_bytes {
                return Err(CodecError::LimitsExceeded {
                    kind: LimitKind::StringBytes,
                    limit: limits.max_string_bytes,
                    actual: value.len(),
                });
            }
            FieldValue::Str(value.to_owned())
        }
        FieldCodec::EntityRef => FieldValue::Entity(read_entity_ref(reader)?),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(field: FieldId, value: &FieldValue) -> FieldValue {
        let mut writer = Writer::new();
        write_value(&mut writer, field, value).unwrap();
        let bytes = writer.finish();
        let mut reader = Reader::new(&bytes);
        let decoded = read_value(&mut reader, field, &CodecLimits::for_testing()).unwrap();
        assert!(reader.is_empty());
        decoded
    }

    #[test]
    fn scalar_roundtrips() {
        let cases = [
            (FieldId::Sides, FieldValue::UInt(4)),
            (FieldId::Tank, FieldValue::SInt(-3)),
            (FieldId::X, FieldValue::Float(12.5)),
            (FieldId::Name, FieldValue::Str("arena".into())),
            (FieldId::Owner, FieldValue::Entity(EntityRef::new(9, 2))),
            (FieldId::Owner, FieldValue::Entity(EntityRef::NULL)),
        ];
        for (field, value) in &cases {
            assert_eq!(&roundtrip(*field, value), value);
        }
    }

    #[test]
    fn angle_is_quantized() {
        let FieldValue::Angle(decoded) = roundtrip(FieldId::Angle, &FieldValue::Angle(1.0)) else {
            panic!("expected angle");
        };
        assert!((decoded - 1.0).abs() <= 1.0 / 64.0);
    }

    #[test]
    fn table_layout() {
        let value = FieldValue::Table(vec![(0, FieldValue::UInt(3)), (4, FieldValue::UInt(1))]);
        let mut writer = Writer::new();
        write_value(&mut writer, FieldId::StatLevels, &value).unwrap();
        // slot 0 -> 0, value 3, slot 4 -> (4-0)^1 = 5, value 1, end
        assert_eq!(writer.as_bytes(), &[0, 3, 5, 1, 1]);
        assert_eq!(roundtrip(FieldId::StatLevels, &value), value);
    }

    #[test]
    fn table_slot_out_of_range_rejected() {
        let value = FieldValue::Table(vec![(8, FieldValue::UInt(1))]);
        let mut writer = Writer::new();
        let err = write_value(&mut writer, FieldId::StatLevels, &value).unwrap_err();
        assert_eq!(
            err,
            CodecError::InvalidTableSlot {
                field: FieldId::StatLevels,
                slot: 8
            }
        );
    }

    #[test]
    fn table_slots_must_ascend() {
        let value = FieldValue::Table(vec![(2, FieldValue::UInt(1)), (2, FieldValue::UInt(1))]);
        let mut writer = Writer::new();
        assert!(write_value(&mut writer, FieldId::StatLevels, &value).is_err());
    }

    #[test]
    fn mismatched_value_rejected() {
        let mut writer = Writer::new();
        let err = write_value(&mut writer, FieldId::X, &FieldValue::UInt(1)).unwrap_err();
        assert!(matches!(err, CodecError::ValueMismatch { found: "uint", .. }));
        let err = write_value(&mut writer, FieldId::StatNames, &FieldValue::UInt(1)).unwrap_err();
        assert!(matches!(err, CodecError::ValueMismatch { found: "uint", .. }));
    }

    #[test]
    fn decoded_slot_past_capacity_rejected() {
        // slot 9 on an 8-slot table: (9+1)^1 = 11
        let bytes = [11, 0, 1];
        let mut reader = Reader::new(&bytes);
        let err =
            read_value(&mut reader, FieldId::StatLevels, &CodecLimits::for_testing()).unwrap_err();
        assert!(matches!(err, CodecError::InvalidTableSlot { slot: 9, .. }));
    }

    #[test]
    fn long_string_rejected_on_decode() {
        let long = "x".repeat(CodecLimits::for_testing().max_string_bytes + 1);
        let mut writer = Writer::new();
        write_value(&mut writer, FieldId::Name, &FieldValue::Str(long)).unwrap();
        let bytes = writer.finish();
        let mut reader = Reader::new(&bytes);
        let err = read_value(&mut reader, FieldId::Name, &CodecLimits::for_testing()).unwrap_err();
        assert!(matches!(err, CodecError::LimitsExceeded { .. }));
    }
}
