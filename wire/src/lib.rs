//! Packet headers and inbound message handling for the arena protocol.
//!
//! This crate knows the header bytes of every packet, parses server-bound
//! messages, and buffers them per client until the simulation is ready to
//! apply them. It does not know about entities or field groups; the update
//! packet body lives in the `codec` crate.
//!
//! # Design Principles
//!
//! - **Stable header ids** - Header bytes are part of the external protocol.
//! - **Bounded decoding** - Packet and string sizes are checked against [`Limits`].
//! - **Deferred application** - Messages are cached on arrival and drained once
//!   per tick, with a merge policy chosen per header.

mod error;
mod header;
mod incoming;
mod limits;
mod message;
mod outbound;

pub use error::{WireError, WireResult};
pub use header::{ClientBound, MergePolicy, ServerBound};
pub use incoming::{IncomingCache, PendingInput};
pub use limits::Limits;
pub use message::{decode_client_message, ClientMessage, InputFlags};
pub use outbound::{
    encode_accept, encode_notification, encode_outdated_client, encode_ping, encode_player_count,
};
