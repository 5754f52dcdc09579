use thiserror::Error;

/// Errors surfaced while reading from a bit stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerdeErr {
    /// The reader ran past the end of the incoming buffer.
    #[error("bit stream ended mid-read")]
    EndOfStream,
    /// A decoded value fell outside the range the protocol allows for it.
    #[error("decoded value {value} outside allowed range {min}..={max}")]
    OutOfRange { value: u32, min: u32, max: u32 },
    /// A length prefix claimed more payload bytes than the frame can carry.
    #[error("payload length {length} exceeds limit {limit}")]
    PayloadTooLong { length: usize, limit: usize },
}
