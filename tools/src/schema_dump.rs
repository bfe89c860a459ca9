use schema::{schema_hash, FieldCodec, FieldDef, GroupDef, GROUPS};
use serde::Serialize;

/// The compiled field table in a form clients can diff against.
#[derive(Debug, Clone, Serialize)]
pub struct SchemaDump {
    /// Hex form of [`schema_hash`].
    pub fingerprint: String,
    pub groups: Vec<GroupDump>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupDump {
    pub id: u8,
    pub name: &'static str,
    pub fields: Vec<FieldDump>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldDump {
    pub index: u8,
    pub name: &'static str,
    pub codec: FieldCodec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_capacity: Option<u8>,
}

/// Builds the schema dump from the compiled tables.
#[must_use]
pub fn schema_json() -> SchemaDump {
    SchemaDump {
        fingerprint: format!("0x{:016x}", schema_hash()),
        groups: GROUPS.iter().map(group_dump).collect(),
    }
}

fn group_dump(group: &GroupDef) -> GroupDump {
    GroupDump {
        id: group.id.id(),
        name: group.name,
        fields: group
            .fields
            .iter()
            .map(|field| field_dump(field.def()))
            .collect(),
    }
}

const fn field_dump(def: &FieldDef) -> FieldDump {
    FieldDump {
        index: def.id.index(),
        name: def.name,
        codec: def.codec,
        table_capacity: def.table_capacity(),
    }
}
