//! Per-client buffer of decoded messages awaiting the next tick.

use std::collections::BTreeMap;

use crate::error::WireResult;
use crate::header::{MergePolicy, ServerBound};
use crate::limits::Limits;
use crate::message::{decode_client_message, ClientMessage, InputFlags};

/// Input accumulated since the last drain.
///
/// Flag bits are OR'd so a press and release inside one tick is still seen;
/// the cursor keeps only the most recent position.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PendingInput {
    pub flags: InputFlags,
    pub mouse_x: f32,
    pub mouse_y: f32,
}

impl PendingInput {
    fn merge(&mut self, flags: InputFlags, mouse_x: f32, mouse_y: f32) {
        self.flags = self.flags.union(flags);
        self.mouse_x = mouse_x;
        self.mouse_y = mouse_y;
    }

    fn into_message(self) -> ClientMessage {
        ClientMessage::Input {
            flags: self.flags,
            mouse_x: self.mouse_x,
            mouse_y: self.mouse_y,
        }
    }
}

/// Messages received from one client between two ticks.
///
/// [`drain`](Self::drain) yields messages in ascending header order, so the
/// simulation applies them in the same order regardless of arrival timing.
#[derive(Debug, Clone, Default)]
pub struct IncomingCache {
    latest: BTreeMap<ServerBound, ClientMessage>,
    queued: BTreeMap<ServerBound, Vec<ClientMessage>>,
    input: Option<PendingInput>,
    max_queued: usize,
    dropped: u64,
}

impl IncomingCache {
    /// Creates an empty cache bounded by `limits`.
    #[must_use]
    pub fn new(limits: &Limits) -> Self {
        Self {
            max_queued: limits.max_queued_per_header,
            ..Self::default()
        }
    }

    /// Decodes `bytes` and stores the message.
    ///
    /// Returns the header of the stored message. Malformed packets are
    /// rejected without touching the cache.
    pub fn receive(&mut self, bytes: &[u8], limits: &Limits) -> WireResult<ServerBound> {
        let message = decode_client_message(bytes, limits)?;
        let header = message.header();
        self.push(message);
        Ok(header)
    }

    /// Stores an already decoded message according to its merge policy.
    pub fn push(&mut self, message: ClientMessage) {
        let header = message.header();
        match header.merge_policy() {
            MergePolicy::Latest => {
                self.latest.insert(header, message);
            }
            MergePolicy::Queue => {
                let queue = self.queued.entry(header).or_default();
                if queue.len() < self.max_queued {
                    queue.push(message);
                } else {
                    self.dropped += 1;
                }
            }
            MergePolicy::OrFlags => {
                if let ClientMessage::Input {
                    flags,
                    mouse_x,
                    mouse_y,
                } = message
                {
                    self.input
                        .get_or_insert_with(PendingInput::default)
                        .merge(flags, mouse_x, mouse_y);
                }
            }
        }
    }

    /// Returns the merged input if any input arrived since the last drain.
    #[must_use]
    pub const fn pending_input(&self) -> Option<&PendingInput> {
        self.input.as_ref()
    }

    /// Returns `true` if nothing is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.latest.is_empty() && self.queued.values().all(Vec::is_empty) && self.input.is_none()
    }

    /// Number of queued messages discarded because a queue was full.
    #[must_use]
    pub const fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Removes and returns every cached message in ascending header order.
    pub fn drain(&mut self) -> Vec<ClientMessage> {
        let mut out = Vec::new();
        for header in ServerBound::ALL {
            match header.merge_policy() {
                MergePolicy::Latest => {
                    if let Some(message) = self.latest.remove(&header) {
                        out.push(message);
                    }
                }
                MergePolicy::Queue => {
                    if let Some(queue) = self.queued.get_mut(&header) {
                        out.append(queue);
                    }
                }
                MergePolicy::OrFlags => {
                    if let Some(input) = self.input.take() {
                        out.push(input.into_message());
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(flags: u32, x: f32) -> ClientMessage {
        ClientMessage::Input {
            flags: InputFlags::from_raw(flags),
            mouse_x: x,
            mouse_y: 0.0,
        }
    }

    #[test]
    fn input_flags_are_ored() {
        let mut cache = IncomingCache::new(&Limits::for_testing());
        cache.push(input(InputFlags::UP, 1.0));
        cache.push(input(InputFlags::LEFT_CLICK, 2.0));
        let drained = cache.drain();
        assert_eq!(drained, vec![input(InputFlags::UP | InputFlags::LEFT_CLICK, 2.0)]);
        assert!(cache.is_empty());
    }

    #[test]
    fn latest_wins() {
        let mut cache = IncomingCache::new(&Limits::for_testing());
        cache.push(ClientMessage::Spawn { name: "a".into() });
        cache.push(ClientMessage::Spawn { name: "b".into() });
        assert_eq!(cache.drain(), vec![ClientMessage::Spawn { name: "b".into() }]);
    }

    #[test]
    fn queue_keeps_order_and_caps() {
        let limits = Limits::for_testing();
        let mut cache = IncomingCache::new(&limits);
        for stat in 0..6 {
            cache.push(ClientMessage::StatUpgrade { stat, max: 7 });
        }
        let drained = cache.drain();
        assert_eq!(drained.len(), limits.max_queued_per_header);
        assert_eq!(drained[0], ClientMessage::StatUpgrade { stat: 0, max: 7 });
        assert_eq!(cache.dropped(), 2);
    }

    #[test]
    fn drain_is_header_ordered() {
        let mut cache = IncomingCache::new(&Limits::for_testing());
        cache.push(ClientMessage::ToRespawn);
        cache.push(ClientMessage::Ping);
        cache.push(input(InputFlags::DOWN, 0.0));
        cache.push(ClientMessage::Init {
            build: "x".into(),
            password: String::new(),
        });
        let headers: Vec<ServerBound> = cache.drain().iter().map(ClientMessage::header).collect();
        assert_eq!(
            headers,
            vec![
                ServerBound::Init,
                ServerBound::Input,
                ServerBound::Ping,
                ServerBound::ToRespawn
            ]
        );
    }

    #[test]
    fn malformed_packet_leaves_cache_untouched() {
        let limits = Limits::for_testing();
        let mut cache = IncomingCache::new(&limits);
        assert!(cache.receive(&[0x77], &limits).is_err());
        assert!(cache.is_empty());
    }
}
