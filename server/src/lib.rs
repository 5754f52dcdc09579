//! # Riptide Server
//! Server-authoritative entity event replication. The session server records
//! discrete state-change events for networked entities in an id-ordered log,
//! streams them to every connected client with RTT-adaptive resends, replays
//! the round's distinct events to late joiners, and defers client-submitted
//! events until the authoritative simulation has caught up to the tick the
//! client generated them at.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod config;
mod cursor;
mod desync;
mod directory;
mod error;
mod event;
mod event_log;
mod inbox;
mod manager;

pub mod wire;

pub use config::ReplicationConfig;
pub use cursor::{ClientCursor, MidRoundSync};
pub use desync::{KickCommand, KickReason};
pub use directory::{CharacterStatus, EntityDirectory};
pub use error::{ApplyError, CreateError, WireError};
pub use event::{EntityRef, EventKind, EventPayload, ServerEntityEvent};
pub use event_log::{EventLog, UniqueArchive};
pub use inbox::{BufferedEvent, EventInbox};
pub use manager::ReplicationState;

pub use riptide_shared::{
    sequence_more_recent, ArchiveId, BitReader, BitWriter, ClientKey, EventId, GameTime,
};
