use bitstream::{Reader, Writer};
use codec::{decode_update_packet, write_entity_ref, CodecLimits, CodecResult};
use serde::Serialize;
use wire::ClientBound;

/// Structure summary of one client-bound packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InspectReport {
    pub header: u8,
    pub kind: &'static str,
    pub total_bytes: usize,
    /// Only update packets carry a tick.
    pub tick: Option<u32>,
    pub deletes: usize,
    pub updates: usize,
    pub creations: usize,
    pub sizes: Option<RecordSizes>,
    /// Decoded body of a control packet.
    pub detail: Option<String>,
}

/// Byte breakdown of an update packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RecordSizes {
    pub delete_bytes: usize,
    pub update_bytes: usize,
    pub creation_bytes: usize,
    /// Header, tick, and the two counts.
    pub framing_bytes: usize,
}

/// Classifies `bytes` by header and summarizes the body.
///
/// Update packets are fully decoded, so a malformed update is an error.
pub fn inspect_packet(bytes: &[u8], limits: &CodecLimits) -> CodecResult<InspectReport> {
    let header = Reader::new(bytes).peek_u8()?;
    let mut report = InspectReport {
        header,
        kind: "unknown",
        total_bytes: bytes.len(),
        tick: None,
        deletes: 0,
        updates: 0,
        creations: 0,
        sizes: None,
        detail: None,
    };
    let Some(kind) = ClientBound::from_id(header) else {
        return Ok(report);
    };
    report.kind = kind_name(kind);

    let mut reader = Reader::new(&bytes[1..]);
    match kind {
        ClientBound::Update => {
            let packet = decode_update_packet(bytes, limits)?;
            let mut sizes = RecordSizes::default();
            for entity in &packet.deletes {
                let mut writer = Writer::with_capacity(8);
                write_entity_ref(&mut writer, *entity);
                sizes.delete_bytes += writer.len();
            }
            for record in &packet.updates {
                let mut writer = Writer::new();
                record.encode(&mut writer)?;
                sizes.update_bytes += writer.len();
            }
            for record in &packet.creations {
                let mut writer = Writer::new();
                record.encode(&mut writer)?;
                sizes.creation_bytes += writer.len();
            }
            sizes.framing_bytes = bytes
                .len()
                .saturating_sub(sizes.delete_bytes + sizes.update_bytes + sizes.creation_bytes);
            report.tick = Some(packet.tick.raw());
            report.deletes = packet.deletes.len();
            report.updates = packet.updates.len();
            report.creations = packet.creations.len();
            report.sizes = Some(sizes);
        }
        ClientBound::OutdatedClient => {
            report.detail = Some(format!("build {}", reader.read_string_nt()?));
        }
        ClientBound::Notification => {
            let text = reader.read_string_nt()?;
            let rgb = reader.read_bytes(4)?;
            let duration = reader.read_f32()?;
            report.detail = Some(format!(
                "\"{text}\" color #{:02x}{:02x}{:02x} for {duration}ms",
                rgb[0], rgb[1], rgb[2]
            ));
        }
        ClientBound::PlayerCount => {
            report.detail = Some(format!("players {}", reader.read_varu32()?));
        }
        ClientBound::Ping | ClientBound::Accept => {}
    }
    Ok(report)
}

const fn kind_name(kind: ClientBound) -> &'static str {
    match kind {
        ClientBound::Update => "update",
        ClientBound::OutdatedClient => "outdated_client",
        ClientBound::Notification => "notification",
        ClientBound::Ping => "ping",
        ClientBound::Accept => "accept",
        ClientBound::PlayerCount => "player_count",
    }
}
