use thiserror::Error;

/// Errors that can occur when range-encoding an integer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangedIntegerError {
    /// Attempted to encode a value outside its declared range.
    #[error("value {value} not in declared range {min}..={max}")]
    ValueOutOfRange { value: u32, min: u32, max: u32 },
    /// The declared range is inverted.
    #[error("inverted range: min {min} > max {max}")]
    InvertedRange { min: u32, max: u32 },
}

/// Number of bits needed to encode any value in `min..=max`.
///
/// A single-value range still costs one bit; the decoder has no other way to
/// know the slot was consumed.
pub fn ranged_bit_width(min: u32, max: u32) -> u32 {
    debug_assert!(min <= max);
    let span = max - min;
    if span == 0 {
        return 1;
    }
    32 - span.leading_zeros()
}

pub(crate) fn check_range(value: u32, min: u32, max: u32) -> Result<(), RangedIntegerError> {
    if min > max {
        return Err(RangedIntegerError::InvertedRange { min, max });
    }
    if value < min || value > max {
        return Err(RangedIntegerError::ValueOutOfRange { value, min, max });
    }
    Ok(())
}

#[cfg(test)]
mod ranged_bit_width_tests {
    use super::ranged_bit_width;

    #[test]
    fn single_value_range_costs_one_bit() {
        assert_eq!(ranged_bit_width(4, 4), 1);
    }

    #[test]
    fn power_of_two_boundaries() {
        assert_eq!(ranged_bit_width(0, 1), 1);
        assert_eq!(ranged_bit_width(0, 2), 2);
        assert_eq!(ranged_bit_width(0, 255), 8);
        assert_eq!(ranged_bit_width(0, 256), 9);
    }

    #[test]
    fn width_depends_on_span_not_endpoints() {
        assert_eq!(ranged_bit_width(100, 103), 2);
        assert_eq!(ranged_bit_width(0, 3), 2);
    }
}
