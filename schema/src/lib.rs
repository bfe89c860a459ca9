//! Field groups, field encodings, and the schema fingerprint for the arena
//! protocol.
//!
//! The layout is compiled in: every field has a fixed global index, a wire
//! encoding, and an owning group. Records emit fields in ascending index
//! order, so reordering this table is a protocol change and shows up as a
//! different [`schema_hash`].
//!
//! # Design Principles
//!
//! - **Compile-time layout** - [`FIELDS`] and [`GROUPS`] are static tables.
//! - **Validated invariants** - [`validate`] checks ordering and membership.
//! - **Deterministic hashing** - The fingerprint only depends on the tables.

mod error;
mod field;
mod hash;
mod schema;

pub use error::{SchemaError, SchemaResult};
pub use field::{FieldCodec, FieldDef, FieldId, FieldShape, FIELDS, FIELD_COUNT};
pub use hash::schema_hash;
pub use schema::{validate, GroupDef, GroupId, GROUPS};
