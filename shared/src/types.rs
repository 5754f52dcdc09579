/// Identifier of one replicated server event. Wraps at 2^16; never compare
/// with `<`/`>` directly, use `sequence_more_recent`.
pub type EventId = u16;

/// Dense per-round index into the unique-event archive. Starts at 0 each
/// round; archives never grow anywhere near the wrap point within a round,
/// but ids are still compared with wrapping semantics for uniformity.
pub type ArchiveId = u16;

// ClientKey

/// Opaque handle for one connected client, assigned by the enclosing
/// connection layer.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct ClientKey(u64);

impl ClientKey {
    pub fn to_u64(&self) -> u64 {
        self.0
    }

    pub fn from_u64(value: u64) -> Self {
        ClientKey(value)
    }
}
