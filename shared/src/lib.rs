//! # Riptide Shared
//! Sequence arithmetic and bit-level wire serialization shared between the
//! riptide server core and its hosts.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod game_time;
mod types;
mod wrapping_number;

pub mod serde;

pub use game_time::GameTime;
pub use serde::{
    BitReader, BitWriter, RangedIntegerError, SerdeErr, WriteMark, ranged_bit_width,
};
pub use types::{ArchiveId, ClientKey, EventId};
pub use wrapping_number::{
    sequence_more_recent, try_wrapping_diff, wrapping_diff, WrappingNumberError,
};
