use riptide_shared::ClientKey;

use crate::{
    error::ApplyError,
    event::{EntityRef, EventPayload},
};

/// Snapshot of one client's controlled character, as the authoritative
/// simulation sees it. Drives the incoming-event gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacterStatus {
    /// Newest client input id the simulation has processed for this
    /// character. Wrapping 16-bit space, same semantics as event ids.
    pub processed_input_id: u16,
    /// An incapacitated character cannot act, so input-ordering gates on its
    /// events are meaningless and bypassed.
    pub incapacitated: bool,
}

/// The replication core's view of the game simulation. The core never owns
/// entity identity; it resolves refs and dispatches payloads through this
/// seam and stays agnostic to everything behind it.
pub trait EntityDirectory {
    /// Whether `entity` still resolves to a live entity. A ref whose slot
    /// was recycled must return false.
    fn entity_exists(&self, entity: EntityRef) -> bool;

    /// Applies a client-submitted event to its target entity.
    fn apply_event(
        &mut self,
        entity: EntityRef,
        payload: &EventPayload,
        origin: ClientKey,
    ) -> Result<(), ApplyError>;

    /// Status of the character `client` controls, or `None` if the client
    /// has no character in the simulation.
    fn character_status(&self, client: ClientKey) -> Option<CharacterStatus>;
}
