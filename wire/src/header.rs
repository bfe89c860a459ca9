//! Packet header bytes.
//!
//! The first byte of every packet names its kind. These values are part of
//! the external protocol and must never be renumbered.

/// Packets sent from the server to a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum ClientBound {
    /// Per-tick entity delta (see `codec::encode_update_packet`).
    Update = 0x00,
    /// The client build does not match the server build.
    OutdatedClient = 0x01,
    /// On-screen notification.
    Notification = 0x03,
    /// Reply to a server-bound ping.
    Ping = 0x05,
    /// The init packet was accepted.
    Accept = 0x07,
    /// Number of connected players.
    PlayerCount = 0x0A,
}

impl ClientBound {
    /// Returns the header byte.
    #[must_use]
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Parses a header byte.
    #[must_use]
    pub const fn from_id(id: u8) -> Option<Self> {
        match id {
            0x00 => Some(Self::Update),
            0x01 => Some(Self::OutdatedClient),
            0x03 => Some(Self::Notification),
            0x05 => Some(Self::Ping),
            0x07 => Some(Self::Accept),
            0x0A => Some(Self::PlayerCount),
            _ => None,
        }
    }
}

/// Packets sent from a client to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum ServerBound {
    Init = 0x00,
    Input = 0x01,
    Spawn = 0x02,
    StatUpgrade = 0x03,
    TankUpgrade = 0x04,
    Ping = 0x05,
    ToRespawn = 0x08,
}

/// How repeated messages with the same header are merged between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// Keep only the most recent message.
    Latest,
    /// Keep every message in arrival order (bounded).
    Queue,
    /// OR flag bits into a pending mask and keep the latest cursor.
    OrFlags,
}

impl ServerBound {
    /// All server-bound headers in ascending id order.
    pub const ALL: [Self; 7] = [
        Self::Init,
        Self::Input,
        Self::Spawn,
        Self::StatUpgrade,
        Self::TankUpgrade,
        Self::Ping,
        Self::ToRespawn,
    ];

    /// Returns the header byte.
    #[must_use]
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Parses a header byte.
    #[must_use]
    pub const fn from_id(id: u8) -> Option<Self> {
        match id {
            0x00 => Some(Self::Init),
            0x01 => Some(Self::Input),
            0x02 => Some(Self::Spawn),
            0x03 => Some(Self::StatUpgrade),
            0x04 => Some(Self::TankUpgrade),
            0x05 => Some(Self::Ping),
            0x08 => Some(Self::ToRespawn),
            _ => None,
        }
    }

    /// Returns the merge policy applied in the incoming cache.
    #[must_use]
    pub const fn merge_policy(self) -> MergePolicy {
        match self {
            Self::Input => MergePolicy::OrFlags,
            Self::StatUpgrade => MergePolicy::Queue,
            Self::Init | Self::Spawn | Self::TankUpgrade | Self::Ping | Self::ToRespawn => {
                MergePolicy::Latest
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_bound_ids_roundtrip() {
        for header in ServerBound::ALL {
            assert_eq!(ServerBound::from_id(header.id()), Some(header));
        }
    }

    #[test]
    fn unknown_ids_rejected() {
        assert_eq!(ServerBound::from_id(0x06), None);
        assert_eq!(ServerBound::from_id(0xFF), None);
    }

    #[test]
    fn all_is_sorted() {
        let ids: Vec<u8> = ServerBound::ALL.iter().map(|h| h.id()).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn client_bound_ids_parse() {
        assert_eq!(ClientBound::from_id(0x07), Some(ClientBound::Accept));
        assert_eq!(ClientBound::from_id(0x0A), Some(ClientBound::PlayerCount));
        assert_eq!(ClientBound::from_id(0x02), None);
    }

    #[test]
    fn update_header_is_zero() {
        assert_eq!(ClientBound::Update.id(), 0);
        assert_eq!(ClientBound::PlayerCount.id(), 0x0A);
    }

    #[test]
    fn merge_policies() {
        assert_eq!(ServerBound::Input.merge_policy(), MergePolicy::OrFlags);
        assert_eq!(ServerBound::StatUpgrade.merge_policy(), MergePolicy::Queue);
        assert_eq!(ServerBound::Spawn.merge_policy(), MergePolicy::Latest);
    }
}
