//! Entity references, field values, and update packets for the arena
//! protocol.
//!
//! This crate ties together bitstream, wire, and schema: it knows how a field
//! value of each encoding is laid out, how creation and update records are
//! framed, and how a viewer's per-tick update packet is assembled.
//!
//! # Features
//!
//! - Weak entity references (`hash` then `id`, or a single zero byte)
//! - Skip-encoded field and table slot lists
//! - Creation records (group table plus every field, raw)
//! - Update records (changed fields only)
//! - Update packet encoding/decoding with decode limits
//!
//! # Design Principles
//!
//! - **Correctness first** - Records are validated against the schema on
//!   both sides.
//! - **Deterministic** - Same inputs produce same bytes.

mod error;
mod limits;
mod packet;
mod record;
mod skip;
mod types;
mod value;

pub use error::{CodecError, CodecResult, LimitKind};
pub use limits::CodecLimits;
pub use packet::{decode_update_packet, encode_update_packet, UpdatePacket};
pub use record::{creation_field_order, CreationRecord, Record, UpdateRecord};
pub use skip::{SkipDecoder, SkipEncoder, SKIP_END};
pub use types::{read_entity_ref, write_entity_ref, EntityRef, Tick};
pub use value::{read_value, write_value, FieldValue};
