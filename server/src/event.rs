use riptide_shared::{EventId, GameTime};

/// Stable handle for one networked entity. The generation counter changes
/// whenever an entity slot is recycled, so a stale ref held by an in-flight
/// event resolves to nothing instead of to the slot's new occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityRef {
    pub index: u16,
    pub generation: u16,
}

impl EntityRef {
    pub fn new(index: u16, generation: u16) -> Self {
        Self { index, generation }
    }
}

// EventKind

/// Semantic category of an event payload. Closed set: the wire format range-
/// encodes the kind with `COUNT`, so adding a variant means bumping `COUNT`
/// and the exhaustive matches below, which the compiler enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A component on the entity changed state.
    ComponentState,
    /// The entity's inventory contents changed.
    InventoryState,
    /// Vitals, afflictions, or other status effects changed.
    Status,
    /// Control or ownership of the entity changed.
    Control,
}

impl EventKind {
    /// Number of variants, as a compile-time constant for range encoding.
    pub const COUNT: u32 = 4;

    pub fn to_index(self) -> u32 {
        match self {
            EventKind::ComponentState => 0,
            EventKind::InventoryState => 1,
            EventKind::Status => 2,
            EventKind::Control => 3,
        }
    }

    pub fn from_index(index: u32) -> Option<Self> {
        match index {
            0 => Some(EventKind::ComponentState),
            1 => Some(EventKind::InventoryState),
            2 => Some(EventKind::Status),
            3 => Some(EventKind::Control),
            _ => None,
        }
    }
}

// EventPayload

/// Kind-tagged payload. The bytes are opaque to the replication core; only
/// the game's own serializers on either end interpret them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventPayload {
    pub kind: EventKind,
    pub bytes: Vec<u8>,
}

impl EventPayload {
    pub fn new(kind: EventKind, bytes: Vec<u8>) -> Self {
        Self { kind, bytes }
    }
}

// ServerEntityEvent

/// One discrete, replicable state change. Immutable once created; the only
/// mutation ever applied is flipping `sent` when the event first goes out.
#[derive(Debug, Clone)]
pub struct ServerEntityEvent {
    pub id: EventId,
    pub entity: EntityRef,
    pub payload: EventPayload,
    pub created_at: GameTime,
    pub sent: bool,
}

impl ServerEntityEvent {
    pub fn new(id: EventId, entity: EntityRef, payload: EventPayload, created_at: GameTime) -> Self {
        Self {
            id,
            entity,
            payload,
            created_at,
            sent: false,
        }
    }

    /// Duplicate means same target, same kind, equivalent payload bytes.
    pub fn is_duplicate_of(&self, entity: &EntityRef, payload: &EventPayload) -> bool {
        self.entity == *entity
            && self.payload.kind == payload.kind
            && self.payload.bytes == payload.bytes
    }
}
