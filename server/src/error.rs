use riptide_shared::{RangedIntegerError, SerdeErr};
use thiserror::Error;

use crate::event::EntityRef;

/// Errors from [`ReplicationState::create_event`](crate::ReplicationState::create_event).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CreateError {
    /// The target entity was removed or its slot recycled before the event
    /// was created. A caller bug, but never fatal to the server.
    #[error("cannot create event for invalid entity {0:?}")]
    EntityInvalid(EntityRef),
}

/// Errors a dispatch target may return from
/// [`EntityDirectory::apply_event`](crate::EntityDirectory::apply_event).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    /// The target no longer exists. An expected race between removal and an
    /// in-flight event; the caller drops the event silently.
    #[error("dispatch target {0:?} no longer exists")]
    TargetMissing(EntityRef),
    /// The target exists but rejected the payload.
    #[error("dispatch target rejected payload: {0}")]
    Rejected(&'static str),
}

/// Errors while framing or parsing the event stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    #[error(transparent)]
    Serde(#[from] SerdeErr),
    #[error(transparent)]
    Ranged(#[from] RangedIntegerError),
    /// The inbound frame declared an unknown event kind index.
    #[error("unknown event kind index {0}")]
    UnknownEventKind(u32),
}
