//! Bit-level wire serialization. Hand-rolled so the event stream can pack
//! single-bit markers and range-fitted integers without byte padding.

mod bit_reader;
mod bit_writer;
mod error;
mod integer;

pub use bit_reader::BitReader;
pub use bit_writer::{BitWriter, WriteMark};
pub use error::SerdeErr;
pub use integer::{ranged_bit_width, RangedIntegerError};
