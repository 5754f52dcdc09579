use thiserror::Error;

/// Errors that can occur during wrapping sequence arithmetic
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WrappingNumberError {
    /// The two ids are exactly half the sequence space apart, so recency is
    /// genuinely ambiguous and the signed difference does not fit in an i16.
    #[error("wrapping_diff({a}, {b}) is ambiguous: ids are half the sequence space apart")]
    AmbiguousDistance { a: u16, b: u16 },
}

/// Returns whether `a` is more recent than `b` in the wrapping 16-bit
/// sequence space. An id is considered more recent when it lies within the
/// forward half-window of the other.
///
/// sequence_more_recent(2, 1) is true, sequence_more_recent(1, 2) is false,
/// sequence_more_recent(1, 1) is false. Wraps: sequence_more_recent(0, 65535)
/// is true.
pub fn sequence_more_recent(a: u16, b: u16) -> bool {
    a != b && a.wrapping_sub(b) <= u16::MAX / 2
}

/// Signed forward distance from `a` to `b` in the wrapping sequence space.
/// Positive when `b` is more recent than `a`.
///
/// Errors when `a` and `b` are exactly half the space apart, the one pair of
/// distances that fits neither direction.
///
/// # Examples
/// ```
/// # use riptide_shared::try_wrapping_diff;
/// assert_eq!(try_wrapping_diff(1, 2).unwrap(), 1);
/// assert_eq!(try_wrapping_diff(2, 1).unwrap(), -1);
/// assert_eq!(try_wrapping_diff(65535, 0).unwrap(), 1);
/// assert_eq!(try_wrapping_diff(0, 65535).unwrap(), -1);
/// ```
pub fn try_wrapping_diff(a: u16, b: u16) -> Result<i16, WrappingNumberError> {
    let forward = b.wrapping_sub(a);
    if forward == 32768 {
        return Err(WrappingNumberError::AmbiguousDistance { a, b });
    }
    if forward <= u16::MAX / 2 {
        Ok(forward as i16)
    } else {
        Ok(-(a.wrapping_sub(b) as i16))
    }
}

/// Signed forward distance from `a` to `b`. Panicking variant of
/// [`try_wrapping_diff`]; use that for the ambiguous half-space case.
pub fn wrapping_diff(a: u16, b: u16) -> i16 {
    try_wrapping_diff(a, b).expect("ambiguous wrapping_diff: ids half the sequence space apart")
}
