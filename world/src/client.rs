use std::fmt;

use codec::EntityRef;
use repgraph::ViewState;
use wire::{IncomingCache, PendingInput};

/// Connection-local handle for a viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClientId(u32);

impl ClientId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client#{}", self.0)
    }
}

/// One viewer: its camera entity, view list, and message buffers.
#[derive(Debug)]
pub struct Client {
    pub(crate) camera: EntityRef,
    pub(crate) view: ViewState,
    pub(crate) incoming: IncomingCache,
    pub(crate) outbox: Vec<Vec<u8>>,
    pub(crate) accepted: bool,
}

impl Client {
    pub(crate) fn new(camera: EntityRef, incoming: IncomingCache) -> Self {
        Self {
            camera,
            view: ViewState::new(),
            incoming,
            outbox: Vec::new(),
            accepted: false,
        }
    }

    pub const fn camera(&self) -> EntityRef {
        self.camera
    }

    pub const fn view(&self) -> &ViewState {
        &self.view
    }

    /// `true` once an init packet with the right build was received.
    pub const fn is_accepted(&self) -> bool {
        self.accepted
    }

    pub const fn pending_input(&self) -> Option<&PendingInput> {
        self.incoming.pending_input()
    }

    /// Packets waiting to be sent.
    pub fn outbox(&self) -> &[Vec<u8>] {
        &self.outbox
    }
}
