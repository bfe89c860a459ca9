//! Introspection and debugging tools for arena protocol captures.
//!
//! - Summarize a client-bound packet: kind, tick, record counts, and where
//!   the bytes went
//! - Decode update packets into serializable structures (JSON or a pretty
//!   text listing)
//! - Dump the compiled field table with its fingerprint
//!
//! Everything here works on raw bytes as the server writes them, so captures
//! from `demo-sim` can be fed straight in.

mod decode;
mod inspect;
mod schema_dump;

pub use decode::{
    decode_packet_json, format_decode_pretty, DecodedField, DecodedPacket, DecodedRecord,
    DecodedRef,
};
pub use inspect::{inspect_packet, InspectReport, RecordSizes};
pub use schema_dump::{schema_json, SchemaDump};
