//! Functions to construct [`Integer`]s, [`Rational`]s, [`Float`]s, and [`Complex`] numbers from
//! various types.

use rug::{Assign, Complex, Float, Integer, Rational};

/// The number of bits of precision to use when computing approximate values.
pub const PRECISION: u32 = 1 << 9;

/// Creates an [`Integer`] with the given value.
pub fn int<T>(n: T) -> Integer
where
    Integer: From<T>,
{
    Integer::from(n)
}

/// Creates a [`Rational`] with the given value.
pub fn rat<T>(n: T) -> Rational
where
    Rational: From<T>,
{
    Rational::from(n)
}

/// Creates an [`Integer`] from a [`Float`] by truncating the fractional part.
///
/// Returns [`None`] if the float is not finite.
pub fn int_from_float(f: Float) -> Option<Integer> {
    f.trunc().to_integer()
}

/// Creates a [`Float`] with the given value.
pub fn float<T>(n: T) -> Float
where
    Float: Assign<T>,
{
    Float::with_val(PRECISION, n)
}

/// Creates a [`Complex`] with the given value.
pub fn complex<T>(n: T) -> Complex
where
    Complex: Assign<T>,
{
    Complex::with_val(PRECISION, n)
}

/// The number of significant decimal digits carried by a [`Float`] with `bits` bits of mantissa.
pub fn digits_from_bits(bits: u32) -> u32 {
    // log10(2) to more places than any supported precision needs
    (bits as f64 * 0.301_029_995_663_981_2) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_truncation() {
        assert_eq!(int_from_float(float(2.9)), Some(int(2)));
        assert_eq!(int_from_float(float(-2.9)), Some(int(-2)));
        assert_eq!(int_from_float(float(f64::INFINITY)), None);
    }

    #[test]
    fn digit_estimate() {
        // 512 bits of mantissa is roughly 154 decimal digits
        assert_eq!(digits_from_bits(PRECISION), 154);
        assert_eq!(digits_from_bits(53), 15);
    }
}
