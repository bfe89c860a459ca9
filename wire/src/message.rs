//! Server-bound message bodies.

use bitstream::{Reader, Writer};

use crate::error::{WireError, WireResult};
use crate::header::ServerBound;
use crate::limits::Limits;

/// Input flag bits carried by [`ClientMessage::Input`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct InputFlags(u32);

impl InputFlags {
    pub const LEFT_CLICK: u32 = 1 << 0;
    pub const UP: u32 = 1 << 1;
    pub const LEFT: u32 = 1 << 2;
    pub const DOWN: u32 = 1 << 3;
    pub const RIGHT: u32 = 1 << 4;
    pub const GOD_MODE: u32 = 1 << 5;
    pub const SUICIDE: u32 = 1 << 6;
    pub const RIGHT_CLICK: u32 = 1 << 7;
    pub const LEVEL_UP: u32 = 1 << 8;
    pub const SWITCH_TANK: u32 = 1 << 10;

    /// Creates flags from a raw value.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw flag bits.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Returns `true` if every bit in `mask` is set.
    #[must_use]
    pub const fn contains(self, mask: u32) -> bool {
        self.0 & mask == mask
    }

    /// Returns the union of both flag sets.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// A decoded server-bound message.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    Init { build: String, password: String },
    Input {
        flags: InputFlags,
        mouse_x: f32,
        mouse_y: f32,
    },
    Spawn { name: String },
    StatUpgrade { stat: i32, max: i32 },
    TankUpgrade { tank: i32 },
    Ping,
    ToRespawn,
}

impl ClientMessage {
    /// Returns the header this message is sent under.
    #[must_use]
    pub const fn header(&self) -> ServerBound {
        match self {
            Self::Init { .. } => ServerBound::Init,
            Self::Input { .. } => ServerBound::Input,
            Self::Spawn { .. } => ServerBound::Spawn,
            Self::StatUpgrade { .. } => ServerBound::StatUpgrade,
            Self::TankUpgrade { .. } => ServerBound::TankUpgrade,
            Self::Ping => ServerBound::Ping,
            Self::ToRespawn => ServerBound::ToRespawn,
        }
    }

    /// Encodes the message, header byte included.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut writer = Writer::new();
        writer.write_u8(self.header().id());
        match self {
            Self::Init { build, password } => {
                writer.write_string_nt(build);
                writer.write_string_nt(password);
            }
            Self::Input {
                flags,
                mouse_x,
                mouse_y,
            } => {
                writer.write_varu32(flags.raw());
                writer.write_f32(*mouse_x);
                writer.write_f32(*mouse_y);
            }
            Self::Spawn { name } => writer.write_string_nt(name),
            Self::StatUpgrade { stat, max } => {
                writer.write_vars32(*stat);
                writer.write_vars32(*max);
            }
            Self::TankUpgrade { tank } => writer.write_vars32(*tank),
            Self::Ping | Self::ToRespawn => {}
        }
        writer.finish()
    }
}

/// Decodes one server-bound packet.
///
/// The whole buffer must be consumed; trailing bytes are treated as a
/// malformed message.
pub fn decode_client_message(bytes: &[u8], limits: &Limits) -> WireResult<ClientMessage> {
    if bytes.len() > limits.max_packet_bytes {
        return Err(WireError::PacketTooLarge {
            limit: limits.max_packet_bytes,
            actual: bytes.len(),
        });
    }
    let mut reader = Reader::new(bytes);
    let id = reader.read_u8().map_err(|_| WireError::EmptyPacket)?;
    let header = ServerBound::from_id(id).ok_or(WireError::UnknownHeader { header: id })?;

    let message = match header {
        ServerBound::Init => ClientMessage::Init {
            build: read_bounded_string(&mut reader, limits)?,
            password: read_bounded_string(&mut reader, limits)?,
        },
        ServerBound::Input => ClientMessage::Input {
            flags: InputFlags::from_raw(reader.read_varu32()?),
            mouse_x: reader.read_f32()?,
            mouse_y: reader.read_f32()?,
        },
        ServerBound::Spawn => ClientMessage::Spawn {
            name: read_bounded_string(&mut reader, limits)?,
        },
        ServerBound::StatUpgrade => ClientMessage::StatUpgrade {
            stat: reader.read_vars32()?,
            max: reader.read_vars32()?,
        },
        ServerBound::TankUpgrade => ClientMessage::TankUpgrade {
            tank: reader.read_vars32()?,
        },
        ServerBound::Ping => ClientMessage::Ping,
        ServerBound::ToRespawn => ClientMessage::ToRespawn,
    };

    if !reader.is_empty() {
        return Err(WireError::TrailingBytes {
            remaining: reader.remaining(),
        });
    }
    Ok(message)
}

fn read_bounded_string(reader: &mut Reader<'_>, limits: &Limits) -> WireResult<String> {
    let value = reader.read_string_nt()?;
    if value.len() > limits.max_string_bytes {
        return Err(WireError::StringTooLong {
            limit: limits.max_string_bytes,
            actual: value.len(),
        });
    }
    Ok(value.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(message: &ClientMessage) -> ClientMessage {
        decode_client_message(&message.encode(), &Limits::for_testing()).unwrap()
    }

    #[test]
    fn roundtrip_every_kind() {
        let messages = [
            ClientMessage::Init {
                build: "b1".into(),
                password: String::new(),
            },
            ClientMessage::Input {
                flags: InputFlags::from_raw(InputFlags::UP | InputFlags::LEFT_CLICK),
                mouse_x: 1.5,
                mouse_y: -2.0,
            },
            ClientMessage::Spawn {
                name: "player".into(),
            },
            ClientMessage::StatUpgrade { stat: 3, max: 7 },
            ClientMessage::TankUpgrade { tank: 12 },
            ClientMessage::Ping,
            ClientMessage::ToRespawn,
        ];
        for message in &messages {
            assert_eq!(&roundtrip(message), message);
        }
    }

    #[test]
    fn empty_packet_rejected() {
        let err = decode_client_message(&[], &Limits::for_testing()).unwrap_err();
        assert_eq!(err, WireError::EmptyPacket);
    }

    #[test]
    fn unknown_header_rejected() {
        let err = decode_client_message(&[0x42], &Limits::for_testing()).unwrap_err();
        assert_eq!(err, WireError::UnknownHeader { header: 0x42 });
    }

    #[test]
    fn truncated_input_rejected() {
        let err = decode_client_message(&[0x01, 0x02, 0x00], &Limits::for_testing()).unwrap_err();
        assert!(matches!(err, WireError::Coder(_)));
    }

    #[test]
    fn trailing_bytes_rejected() {
        let err = decode_client_message(&[0x05, 0x00], &Limits::for_testing()).unwrap_err();
        assert_eq!(err, WireError::TrailingBytes { remaining: 1 });
    }

    #[test]
    fn long_name_rejected() {
        let name = "x".repeat(Limits::for_testing().max_string_bytes + 1);
        let bytes = ClientMessage::Spawn { name }.encode();
        let err = decode_client_message(&bytes, &Limits::for_testing()).unwrap_err();
        assert!(matches!(err, WireError::StringTooLong { .. }));
    }

    #[test]
    fn oversized_packet_rejected() {
        let bytes = vec![0x05; Limits::for_testing().max_packet_bytes + 1];
        let err = decode_client_message(&bytes, &Limits::for_testing()).unwrap_err();
        assert!(matches!(err, WireError::PacketTooLarge { .. }));
    }

    #[test]
    fn input_flags_union() {
        let a = InputFlags::from_raw(InputFlags::UP);
        let b = InputFlags::from_raw(InputFlags::SUICIDE);
        let merged = a.union(b);
        assert!(merged.contains(InputFlags::UP | InputFlags::SUICIDE));
        assert!(!merged.contains(InputFlags::DOWN));
    }
}
