//! Encoders for the small client-bound control packets.
//!
//! The update packet is produced by the view compiler; everything else the
//! server sends is built here.

use bitstream::Writer;

use crate::header::ClientBound;

/// Tells the client its init packet was accepted.
#[must_use]
pub fn encode_accept() -> Vec<u8> {
    vec![ClientBound::Accept.id()]
}

/// Reply to a server-bound ping.
#[must_use]
pub fn encode_ping() -> Vec<u8> {
    vec![ClientBound::Ping.id()]
}

/// Rejects a client whose build does not match.
#[must_use]
pub fn encode_outdated_client(build: &str) -> Vec<u8> {
    let mut writer = Writer::new();
    writer.write_u8(ClientBound::OutdatedClient.id());
    writer.write_string_nt(build);
    writer.finish()
}

/// Current number of connected players.
#[must_use]
pub fn encode_player_count(count: u32) -> Vec<u8> {
    let mut writer = Writer::with_capacity(6);
    writer.write_u8(ClientBound::PlayerCount.id());
    writer.write_varu32(count);
    writer.finish()
}

/// On-screen notification: text, packed `0xRRGGBB` color, display time in
/// milliseconds, and an identifier (empty for none).
#[must_use]
pub fn encode_notification(text: &str, color: u32, duration_ms: f32, identifier: &str) -> Vec<u8> {
    let mut writer = Writer::new();
    writer.write_u8(ClientBound::Notification.id());
    writer.write_string_nt(text);
    writer.write_u8((color >> 16) as u8);
    writer.write_u8((color >> 8) as u8);
    writer.write_u8(color as u8);
    writer.write_u8(0);
    writer.write_f32(duration_ms);
    writer.write_string_nt(identifier);
    writer.finish()
}
