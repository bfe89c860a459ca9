use std::fmt::Write as _;

use codec::{decode_update_packet, CodecLimits, CodecResult, EntityRef, FieldValue};
use schema::FieldId;
use serde::Serialize;
use serde_json::{json, Value};

/// An update packet with field names resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedPacket {
    pub tick: u32,
    pub deletes: Vec<DecodedRef>,
    pub updates: Vec<DecodedRecord>,
    pub creations: Vec<DecodedRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DecodedRef {
    pub id: u32,
    pub hash: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedRecord {
    pub entity: DecodedRef,
    /// Group names; only creation records carry them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<&'static str>>,
    pub fields: Vec<DecodedField>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedField {
    pub index: u8,
    pub name: &'static str,
    pub value: Value,
}

/// Decodes an update packet into serializable form.
pub fn decode_packet_json(bytes: &[u8], limits: &CodecLimits) -> CodecResult<DecodedPacket> {
    let packet = decode_update_packet(bytes, limits)?;
    Ok(DecodedPacket {
        tick: packet.tick.raw(),
        deletes: packet.deletes.iter().copied().map(decoded_ref).collect(),
        updates: packet
            .updates
            .iter()
            .map(|record| DecodedRecord {
                entity: decoded_ref(record.entity),
                groups: None,
                fields: decoded_fields(&record.fields),
            })
            .collect(),
        creations: packet
            .creations
            .iter()
            .map(|record| DecodedRecord {
                entity: decoded_ref(record.entity),
                groups: Some(record.groups.iter().map(|group| group.def().name).collect()),
                fields: decoded_fields(&record.fields),
            })
            .collect(),
    })
}

/// Renders a decoded packet as an indented text listing.
#[must_use]
pub fn format_decode_pretty(packet: &DecodedPacket) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "tick {}", packet.tick);
    if !packet.deletes.is_empty() {
        let _ = writeln!(out, "deletes:");
        for entity in &packet.deletes {
            let _ = writeln!(out, "  #{}@{}", entity.id, entity.hash);
        }
    }
    for (label, records) in [("updates", &packet.updates), ("creations", &packet.creations)] {
        if records.is_empty() {
            continue;
        }
        let _ = writeln!(out, "{label}:");
        for record in records {
            let _ = write!(out, "  #{}@{}", record.entity.id, record.entity.hash);
            if let Some(groups) = &record.groups {
                let _ = write!(out, " [{}]", groups.join(", "));
            }
            out.push('\n');
            for field in &record.fields {
                let _ = writeln!(out, "    {:>2} {}: {}", field.index, field.name, field.value);
            }
        }
    }
    out
}

const fn decoded_ref(entity: EntityRef) -> DecodedRef {
    DecodedRef {
        id: entity.id,
        hash: entity.hash,
    }
}

fn decoded_fields(fields: &[(FieldId, FieldValue)]) -> Vec<DecodedField> {
    fields
        .iter()
        .map(|(field, value)| DecodedField {
            index: field.index(),
            name: field.def().name,
            value: value_json(value),
        })
        .collect()
}

fn value_json(value: &FieldValue) -> Value {
    match value {
        FieldValue::UInt(v) => json!(v),
        FieldValue::SInt(v) => json!(v),
        // Non-finite floats have no JSON form and come out as null.
        FieldValue::Float(v) | FieldValue::Angle(v) => Value::from(f64::from(*v)),
        FieldValue::Str(v) => json!(v),
        FieldValue::Entity(entity) if entity.is_null() => Value::Null,
        FieldValue::Entity(entity) => json!({ "id": entity.id, "hash": entity.hash }),
        FieldValue::Table(slots) => Value::Array(
            slots
                .iter()
                .map(|(slot, value)| json!({ "slot": slot, "value": value_json(value) }))
                .collect(),
        ),
    }
}
