//! Deterministic schema fingerprint.

use blake3::Hasher;

use crate::{FieldShape, GroupDef, FIELDS, GROUPS};

/// Computes the fingerprint of the compiled field table.
///
/// Clients built against a different group or field layout produce a
/// different value.
#[must_use]
pub fn schema_hash() -> u64 {
    hash_tables(&GROUPS)
}

pub(crate) fn hash_tables(groups: &[GroupDef]) -> u64 {
    let mut hasher = Hasher::new();
    write_u32(&mut hasher, FIELDS.len() as u32);
    for field in &FIELDS {
        write_u8(&mut hasher, field.id.index());
        write_u8(&mut hasher, field.group.id());
        write_u8(&mut hasher, field.codec.tag());
        match field.shape {
            FieldShape::Scalar => write_u8(&mut hasher, 0),
            FieldShape::Table { capacity } => {
                write_u8(&mut hasher, 1);
                write_u8(&mut hasher, capacity);
            }
        }
    }

    write_u32(&mut hasher, groups.len() as u32);
    for group in groups {
        write_u8(&mut hasher, group.id.id());
        write_u32(&mut hasher, group.fields.len() as u32);
        for field in group.fields {
            write_u8(&mut hasher, field.index());
        }
    }

    let hash = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}

fn write_u8(hasher: &mut Hasher, value: u8) {
    hasher.update(&[value]);
}

fn write_u32(hasher: &mut Hasher, value: u32) {
    hasher.update(&value.to_le_bytes());
}
