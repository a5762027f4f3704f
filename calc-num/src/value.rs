//! The [`Number`] type consumed by the reduction engine.
//!
//! A [`Number`] is either an exact rational, an approximate float, an approximate complex number,
//! a closed real interval, or a signed infinity. The engine never inspects the representation
//! directly; it works through the queries and checked operations defined here.
//!
//! Every checked operation returns [`None`] when the result cannot be produced in the requested
//! domain — an indeterminate combination (`0 * inf`, `inf - inf`, `0^0`), a complex result where
//! only reals are allowed, or an exact result that simply does not exist (`2^(1/2)` as a
//! rational). "Cannot be produced" is not an error; the caller decides whether to leave the
//! operands untouched, retry approximately, or report a diagnostic.

use rug::{ops::Pow, Complex, Float, Integer, Rational};
use std::cmp::Ordering;
use std::fmt::{self, Display, Formatter};

use crate::primitive::{digits_from_bits, float, int, rat, PRECISION};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The sign of an infinite value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum InfSign {
    Pos,
    Neg,
}

impl InfSign {
    /// Returns the opposite sign.
    pub fn flip(self) -> Self {
        match self {
            Self::Pos => Self::Neg,
            Self::Neg => Self::Pos,
        }
    }
}

/// What is known about the sign of a value.
///
/// Also used by the engine's assumption store to describe symbols, which is why the lattice is
/// richer than the three-way sign of a concrete number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Sign {
    Positive,
    NonNegative,
    Zero,
    NonPositive,
    Negative,
    /// Known not to be zero, sign otherwise unknown.
    Nonzero,
    #[default]
    Unknown,
}

impl Sign {
    /// True if the value is certainly `>= 0`.
    pub fn is_nonnegative(self) -> bool {
        matches!(self, Sign::Positive | Sign::NonNegative | Sign::Zero)
    }

    /// True if the value is certainly `<= 0`.
    pub fn is_nonpositive(self) -> bool {
        matches!(self, Sign::Negative | Sign::NonPositive | Sign::Zero)
    }

    /// True if the value is certainly not zero.
    pub fn is_nonzero(self) -> bool {
        matches!(self, Sign::Positive | Sign::Negative | Sign::Nonzero)
    }

    /// The sign of a product of two values with these signs.
    pub fn mul(self, other: Sign) -> Sign {
        use Sign::*;
        match (self, other) {
            (Zero, _) | (_, Zero) => Zero,
            (Unknown, _) | (_, Unknown) => Unknown,
            (Positive, s) | (s, Positive) => s,
            (Negative, Negative) => Positive,
            (Negative, NonNegative) | (NonNegative, Negative) => NonPositive,
            (Negative, NonPositive) | (NonPositive, Negative) => NonNegative,
            (Negative, Nonzero) | (Nonzero, Negative) => Nonzero,
            (NonNegative, NonNegative) | (NonPositive, NonPositive) => NonNegative,
            (NonNegative, NonPositive) | (NonPositive, NonNegative) => NonPositive,
            (Nonzero, Nonzero) => Nonzero,
            (Nonzero, _) | (_, Nonzero) => Unknown,
        }
    }

    /// The sign of a negated value.
    pub fn neg(self) -> Sign {
        use Sign::*;
        match self {
            Positive => Negative,
            NonNegative => NonPositive,
            Zero => Zero,
            NonPositive => NonNegative,
            Negative => Positive,
            Nonzero => Nonzero,
            Unknown => Unknown,
        }
    }
}

/// An arbitrary-precision number with explicit exact/approximate and infinite states.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Number {
    /// An exact rational number, such as `2` or `-7/3`.
    Rational(Rational),

    /// An approximate real number.
    Float(Float),

    /// An approximate complex number.
    Complex(Complex),

    /// A closed real interval `[lo, hi]`, used for uncertainty propagation.
    Interval(Float, Float),

    /// A signed infinity.
    Infinity(InfSign),
}

impl Number {
    /// Creates an exact integer number.
    pub fn int(n: impl Into<i64>) -> Self {
        Self::Rational(rat(n.into()))
    }

    /// Creates the exact number zero.
    pub fn zero() -> Self {
        Self::int(0)
    }

    /// Creates the exact number one.
    pub fn one() -> Self {
        Self::int(1)
    }

    /// Creates an exact fraction. The denominator must not be zero.
    pub fn fraction(numer: impl Into<i64>, denom: impl Into<i64>) -> Self {
        Self::Rational(rat((int(numer.into()), int(denom.into()))))
    }

    /// Creates an interval from its endpoints, swapping them if needed.
    pub fn interval(lo: Float, hi: Float) -> Self {
        if lo > hi {
            Self::Interval(hi, lo)
        } else {
            Self::Interval(lo, hi)
        }
    }

    /// Returns true if the number is exactly zero. An interval is zero only if both endpoints
    /// are.
    pub fn is_zero(&self) -> bool {
        match self {
            Self::Rational(r) => r.cmp0() == Ordering::Equal,
            Self::Float(f) => f.is_zero(),
            Self::Complex(c) => c.is_zero(),
            Self::Interval(lo, hi) => lo.is_zero() && hi.is_zero(),
            Self::Infinity(_) => false,
        }
    }

    /// Returns true if the number is one.
    pub fn is_one(&self) -> bool {
        match self {
            Self::Rational(r) => *r == 1,
            Self::Float(f) => *f == 1,
            Self::Complex(c) => *c == 1,
            Self::Interval(lo, hi) => *lo == 1 && *hi == 1,
            Self::Infinity(_) => false,
        }
    }

    /// Returns true if the number is negative one.
    pub fn is_minus_one(&self) -> bool {
        match self {
            Self::Rational(r) => *r == -1,
            Self::Float(f) => *f == -1,
            _ => false,
        }
    }

    /// Returns true if the number is an exact rational.
    pub fn is_exact(&self) -> bool {
        matches!(self, Self::Rational(_) | Self::Infinity(_))
    }

    /// Returns true if arithmetic on the number has lost (or never had) exactness.
    pub fn is_approximate(&self) -> bool {
        !self.is_exact()
    }

    /// Returns true if the number is an integer-valued real.
    pub fn is_integer(&self) -> bool {
        match self {
            Self::Rational(r) => r.is_integer(),
            Self::Float(f) => f.is_integer(),
            _ => false,
        }
    }

    /// If the number is integer-valued, returns the integer.
    pub fn as_integer(&self) -> Option<Integer> {
        match self {
            Self::Rational(r) if r.is_integer() => Some(r.numer().clone()),
            Self::Float(f) if f.is_integer() => f.to_integer(),
            _ => None,
        }
    }

    /// If the number is an exact rational, returns it.
    pub fn as_rational(&self) -> Option<&Rational> {
        match self {
            Self::Rational(r) => Some(r),
            _ => None,
        }
    }

    /// Returns true if the number is an even integer.
    pub fn is_even(&self) -> bool {
        self.as_integer().map(|n| n.is_even()).unwrap_or(false)
    }

    /// Returns true if the number is an odd integer.
    pub fn is_odd(&self) -> bool {
        self.as_integer().map(|n| n.is_odd()).unwrap_or(false)
    }

    /// Returns true if the number has a non-zero imaginary part.
    pub fn is_complex(&self) -> bool {
        match self {
            Self::Complex(c) => !c.imag().is_zero(),
            _ => false,
        }
    }

    /// Returns true if the number is a finite real (or real interval).
    pub fn is_real(&self) -> bool {
        match self {
            Self::Rational(_) | Self::Float(_) | Self::Interval(..) => true,
            Self::Complex(c) => c.imag().is_zero(),
            Self::Infinity(_) => false,
        }
    }

    /// Returns true if the number is a signed infinity.
    pub fn is_infinite(&self) -> bool {
        matches!(self, Self::Infinity(_))
    }

    /// The sign of the number.
    pub fn sign(&self) -> Sign {
        match self {
            Self::Rational(r) => match r.cmp0() {
                Ordering::Less => Sign::Negative,
                Ordering::Equal => Sign::Zero,
                Ordering::Greater => Sign::Positive,
            },
            Self::Float(f) => {
                if f.is_zero() {
                    Sign::Zero
                } else if f.is_sign_negative() {
                    Sign::Negative
                } else {
                    Sign::Positive
                }
            },
            Self::Complex(c) => {
                if c.imag().is_zero() {
                    Self::Float(c.real().clone()).sign()
                } else if c.is_zero() {
                    Sign::Zero
                } else {
                    Sign::Nonzero
                }
            },
            Self::Interval(lo, hi) => {
                if lo.is_zero() && hi.is_zero() {
                    Sign::Zero
                } else if !lo.is_sign_negative() && !lo.is_zero() {
                    Sign::Positive
                } else if hi.is_sign_negative() && !hi.is_zero() {
                    Sign::Negative
                } else if !lo.is_sign_negative() {
                    Sign::NonNegative
                } else if hi.is_sign_negative() || hi.is_zero() {
                    Sign::NonPositive
                } else {
                    Sign::Unknown
                }
            },
            Self::Infinity(InfSign::Pos) => Sign::Positive,
            Self::Infinity(InfSign::Neg) => Sign::Negative,
        }
    }

    /// The number of significant decimal digits the number carries, or [`None`] if it is exact.
    pub fn precision(&self) -> Option<u32> {
        match self {
            Self::Rational(_) | Self::Infinity(_) => None,
            Self::Float(f) => Some(digits_from_bits(f.prec())),
            Self::Complex(c) => Some(digits_from_bits(c.prec().0)),
            Self::Interval(lo, _) => Some(digits_from_bits(lo.prec())),
        }
    }

    /// Converts the number to a [`Float`], if it is a finite real. Intervals convert to their
    /// midpoint.
    pub fn to_float(&self) -> Option<Float> {
        match self {
            Self::Rational(r) => Some(float(r)),
            Self::Float(f) => Some(f.clone()),
            Self::Complex(c) if c.imag().is_zero() => Some(c.real().clone()),
            Self::Complex(_) => None,
            Self::Interval(lo, hi) => Some((float(lo) + float(hi)) / float(2)),
            Self::Infinity(_) => None,
        }
    }

    /// Converts the number to a [`Complex`], if it is finite.
    fn to_complex(&self) -> Option<Complex> {
        match self {
            Self::Complex(c) => Some(c.clone()),
            other => other.to_float().map(|f| Complex::with_val(PRECISION, (f, float(0)))),
        }
    }

    /// The endpoints of the number as a real interval, if it is a finite real.
    fn to_interval(&self) -> Option<(Float, Float)> {
        match self {
            Self::Rational(r) => Some((float(r), float(r))),
            Self::Float(f) => Some((f.clone(), f.clone())),
            Self::Interval(lo, hi) => Some((lo.clone(), hi.clone())),
            Self::Complex(c) if c.imag().is_zero() => {
                Some((c.real().clone(), c.real().clone()))
            },
            _ => None,
        }
    }

    /// Replaces an exact rational with its approximate float value. Other kinds are returned
    /// unchanged.
    pub fn approximate(&self) -> Number {
        match self {
            Self::Rational(r) => Self::Float(float(r)),
            other => other.clone(),
        }
    }

    /// The absolute value.
    pub fn abs(&self) -> Number {
        match self {
            Self::Rational(r) => Self::Rational(r.clone().abs()),
            Self::Float(f) => Self::Float(f.clone().abs()),
            Self::Complex(c) => Self::Float(c.clone().abs().into_real_imag().0),
            Self::Interval(lo, hi) => {
                let lo_abs = lo.clone().abs();
                let hi_abs = hi.clone().abs();
                if lo.is_sign_negative() && !hi.is_sign_negative() {
                    Self::interval(float(0), lo_abs.max(&hi_abs))
                } else {
                    Self::interval(lo_abs, hi_abs)
                }
            },
            Self::Infinity(_) => Self::Infinity(InfSign::Pos),
        }
    }

    /// Demotes a complex number with a zero imaginary part to a float.
    fn normalize(self) -> Number {
        match self {
            Self::Complex(c) if c.imag().is_zero() => Self::Float(c.into_real_imag().0),
            other => other,
        }
    }

    /// Wraps a float result, mapping NaN to [`None`] and infinities to [`Number::Infinity`].
    fn from_float_result(f: Float) -> Option<Number> {
        if f.is_nan() {
            None
        } else if f.is_infinite() {
            Some(Self::Infinity(if f.is_sign_negative() { InfSign::Neg } else { InfSign::Pos }))
        } else {
            Some(Self::Float(f))
        }
    }

    /// Adds two numbers. Returns [`None`] for `inf + -inf` and for infinities combined with
    /// non-real operands.
    pub fn checked_add(&self, other: &Number) -> Option<Number> {
        match (self, other) {
            (Self::Infinity(a), Self::Infinity(b)) => (a == b).then(|| Self::Infinity(*a)),
            (Self::Infinity(s), x) | (x, Self::Infinity(s)) => {
                x.is_real().then(|| Self::Infinity(*s))
            },
            (Self::Complex(_), _) | (_, Self::Complex(_)) => {
                let sum = self.to_complex()? + other.to_complex()?;
                Some(Self::Complex(sum).normalize())
            },
            (Self::Interval(..), _) | (_, Self::Interval(..)) => {
                let (alo, ahi) = self.to_interval()?;
                let (blo, bhi) = other.to_interval()?;
                Some(Self::interval(alo + blo, ahi + bhi))
            },
            (Self::Rational(a), Self::Rational(b)) => Some(Self::Rational(rat(a + b))),
            _ => Self::from_float_result(self.to_float()? + other.to_float()?),
        }
    }

    /// Multiplies two numbers. Returns [`None`] for `0 * inf` and for infinities whose resulting
    /// sign cannot be determined.
    pub fn checked_mul(&self, other: &Number) -> Option<Number> {
        match (self, other) {
            (Self::Infinity(a), Self::Infinity(b)) => {
                Some(Self::Infinity(if a == b { InfSign::Pos } else { InfSign::Neg }))
            },
            (Self::Infinity(s), x) | (x, Self::Infinity(s)) => match x.sign() {
                Sign::Positive => Some(Self::Infinity(*s)),
                Sign::Negative => Some(Self::Infinity(s.flip())),
                // includes zero: 0 * inf is indeterminate
                _ => None,
            },
            (Self::Complex(_), _) | (_, Self::Complex(_)) => {
                let product = self.to_complex()? * other.to_complex()?;
                Some(Self::Complex(product).normalize())
            },
            (Self::Interval(..), _) | (_, Self::Interval(..)) => {
                let (alo, ahi) = self.to_interval()?;
                let (blo, bhi) = other.to_interval()?;
                let products = [
                    float(&alo) * float(&blo),
                    float(&alo) * float(&bhi),
                    float(&ahi) * float(&blo),
                    float(&ahi) * float(&bhi),
                ];
                let mut lo = products[0].clone();
                let mut hi = products[0].clone();
                for p in &products[1..] {
                    lo = lo.min(p);
                    hi = hi.max(p);
                }
                Some(Self::interval(lo, hi))
            },
            (Self::Rational(a), Self::Rational(b)) => Some(Self::Rational(rat(a * b))),
            _ => Self::from_float_result(self.to_float()? * other.to_float()?),
        }
    }

    /// The reciprocal. Returns [`None`] for zero and for intervals containing zero.
    pub fn checked_recip(&self) -> Option<Number> {
        match self {
            Self::Rational(r) => {
                (r.cmp0() != Ordering::Equal).then(|| Self::Rational(r.clone().recip()))
            },
            Self::Float(f) => {
                if f.is_zero() {
                    None
                } else {
                    Self::from_float_result(float(1) / f)
                }
            },
            Self::Complex(c) => {
                (!c.is_zero()).then(|| Self::Complex(c.clone().recip()).normalize())
            },
            Self::Interval(lo, hi) => {
                if self.sign().is_nonzero() {
                    Some(Self::interval(float(1) / hi, float(1) / lo))
                } else {
                    None
                }
            },
            Self::Infinity(_) => Some(Self::zero()),
        }
    }

    /// Raises the number to a power.
    ///
    /// Exact rational inputs take the exact paths only: integer exponents, and fractional
    /// exponents whose root exists as a rational (`4^(1/2)`, `(8/27)^(1/3)`). Approximate inputs
    /// go straight to float/complex arithmetic. Indeterminate combinations (`0^0`, `inf^0`,
    /// `1^inf`) and results outside the requested domain return [`None`] — the caller can then
    /// retry with [`Number::pow_approx`] under an approximating policy, or leave the operands
    /// alone.
    pub fn checked_pow(&self, exponent: &Number, allow_complex: bool) -> Option<Number> {
        if exponent.is_zero() {
            // 0^0 and inf^0 are indeterminate
            if self.is_zero() || self.is_infinite() {
                return None;
            }
            return Some(Self::one());
        }
        if self.is_zero() {
            return match exponent.sign() {
                Sign::Positive => Some(Self::zero()),
                _ => None,
            };
        }

        match (self, exponent) {
            (Self::Infinity(s), e) => match e.sign() {
                Sign::Positive => match s {
                    InfSign::Pos => Some(Self::Infinity(InfSign::Pos)),
                    InfSign::Neg if e.is_even() => Some(Self::Infinity(InfSign::Pos)),
                    InfSign::Neg if e.is_odd() => Some(Self::Infinity(InfSign::Neg)),
                    InfSign::Neg => None,
                },
                Sign::Negative => Some(Self::zero()),
                _ => None,
            },
            (b, Self::Infinity(es)) => {
                let mag = b.abs().partial_cmp_value(&Self::one())?;
                match (mag, es, b.sign()) {
                    (Ordering::Greater, InfSign::Pos, Sign::Positive) => {
                        Some(Self::Infinity(InfSign::Pos))
                    },
                    (Ordering::Greater, InfSign::Neg, Sign::Positive) => Some(Self::zero()),
                    (Ordering::Less, InfSign::Pos, _) => Some(Self::zero()),
                    (Ordering::Less, InfSign::Neg, Sign::Positive) => {
                        Some(Self::Infinity(InfSign::Pos))
                    },
                    // 1^inf, (-1)^inf, and negative bases oscillate
                    _ => None,
                }
            },
            (Self::Rational(base), Self::Rational(exp)) => {
                if exp.is_integer() {
                    let e = exp.numer().to_i32()?;
                    // keep exact exponentiation to sizes that stay tractable
                    if e.unsigned_abs() > 1_000_000 {
                        return None;
                    }
                    Some(Self::Rational(base.clone().pow(e)))
                } else {
                    rational_root(base, exp.numer(), exp.denom()).map(Self::Rational)
                }
            },
            (Self::Interval(..), e) if e.is_integer() => {
                let n = e.as_integer()?.to_i32()?;
                let (lo, hi) = self.to_interval()?;
                if n >= 0 && !lo.is_sign_negative() {
                    Some(Self::interval(lo.pow(n), hi.pow(n)))
                } else {
                    None
                }
            },
            _ => self.pow_approx(exponent, allow_complex),
        }
    }

    /// Raises the number to a power with approximate arithmetic, promoting to complex when the
    /// real result does not exist and `allow_complex` is set.
    pub fn pow_approx(&self, exponent: &Number, allow_complex: bool) -> Option<Number> {
        if self.is_infinite() || exponent.is_infinite() {
            return self.checked_pow(exponent, allow_complex);
        }

        if self.is_complex() || exponent.is_complex() {
            if !allow_complex {
                return None;
            }
            let result = self.to_complex()?.pow(&exponent.to_complex()?);
            return Some(Self::Complex(result).normalize());
        }

        let base = self.to_float()?;
        let exp = exponent.to_float()?;
        if base.is_sign_negative() && !exp.is_integer() {
            if !allow_complex {
                return None;
            }
            let result = self.to_complex()?.pow(&exponent.to_complex()?);
            return Some(Self::Complex(result).normalize());
        }
        Self::from_float_result(base.pow(exp))
    }

    /// Bitwise AND of two integer-valued numbers.
    pub fn checked_bit_and(&self, other: &Number) -> Option<Number> {
        let (a, b) = (self.as_integer()?, other.as_integer()?);
        Some(Number::from(Integer::from(&a & &b)))
    }

    /// Bitwise OR of two integer-valued numbers.
    pub fn checked_bit_or(&self, other: &Number) -> Option<Number> {
        let (a, b) = (self.as_integer()?, other.as_integer()?);
        Some(Number::from(Integer::from(&a | &b)))
    }

    /// Bitwise XOR of two integer-valued numbers.
    pub fn checked_bit_xor(&self, other: &Number) -> Option<Number> {
        let (a, b) = (self.as_integer()?, other.as_integer()?);
        Some(Number::from(Integer::from(&a ^ &b)))
    }

    /// Bitwise NOT (two's complement) of an integer-valued number.
    pub fn checked_bit_not(&self) -> Option<Number> {
        let n = self.as_integer()?;
        Some(Number::from(Integer::from(!&n)))
    }

    /// Compares two numbers, interval-aware.
    ///
    /// Overlapping intervals and complex numbers are unordered and return [`None`]; the canonical
    /// ordering treats that as equal, merge correctness treats it as unknown.
    pub fn partial_cmp_value(&self, other: &Number) -> Option<Ordering> {
        match (self, other) {
            (Self::Infinity(a), Self::Infinity(b)) => Some(match (a, b) {
                (InfSign::Pos, InfSign::Pos) | (InfSign::Neg, InfSign::Neg) => Ordering::Equal,
                (InfSign::Pos, InfSign::Neg) => Ordering::Greater,
                (InfSign::Neg, InfSign::Pos) => Ordering::Less,
            }),
            (Self::Infinity(s), x) => x.is_real().then(|| match s {
                InfSign::Pos => Ordering::Greater,
                InfSign::Neg => Ordering::Less,
            }),
            (x, Self::Infinity(s)) => x.is_real().then(|| match s {
                InfSign::Pos => Ordering::Less,
                InfSign::Neg => Ordering::Greater,
            }),
            (Self::Complex(a), Self::Complex(b)) => (a == b).then_some(Ordering::Equal),
            (Self::Complex(_), _) | (_, Self::Complex(_)) => None,
            (Self::Rational(a), Self::Rational(b)) => Some(a.cmp(b)),
            _ => {
                let (alo, ahi) = self.to_interval()?;
                let (blo, bhi) = other.to_interval()?;
                if ahi < blo {
                    Some(Ordering::Less)
                } else if alo > bhi {
                    Some(Ordering::Greater)
                } else if alo == ahi && blo == bhi && alo == blo {
                    Some(Ordering::Equal)
                } else {
                    // overlapping intervals: unknown
                    None
                }
            },
        }
    }

    /// Returns whether two numbers are certainly equal ([`Some(true)`]), certainly unequal
    /// ([`Some(false)`]), or unknown (overlapping intervals).
    pub fn eq_value(&self, other: &Number) -> Option<bool> {
        match (self, other) {
            (Self::Complex(a), Self::Complex(b)) => Some(a == b),
            (Self::Complex(c), x) | (x, Self::Complex(c)) => {
                if c.imag().is_zero() {
                    Self::Float(c.real().clone()).eq_value(x)
                } else {
                    Some(false)
                }
            },
            _ => match self.partial_cmp_value(other) {
                Some(ord) => Some(ord == Ordering::Equal),
                None if self.is_infinite() || other.is_infinite() => Some(false),
                None => None,
            },
        }
    }
}

/// Attempts the exact rational root `base^(numer/denom)`.
///
/// Both the numerator and denominator of `base` must be perfect `denom`-th powers; a negative
/// base is allowed only for odd root orders.
fn rational_root(base: &Rational, numer: &Integer, denom: &Integer) -> Option<Rational> {
    let n = denom.to_u32()?;
    if n < 2 {
        return None;
    }

    if base.cmp0() == Ordering::Less {
        if denom.is_odd() {
            let positive = rational_root(&base.clone().abs(), numer, denom)?;
            return Some(if numer.is_odd() { -positive } else { positive });
        }
        return None;
    }

    let (p, q) = (base.numer(), base.denom());
    let (p_root, p_rem) = p.clone().root_rem(Integer::new(), n);
    if p_rem.cmp0() != Ordering::Equal {
        return None;
    }
    let (q_root, q_rem) = q.clone().root_rem(Integer::new(), n);
    if q_rem.cmp0() != Ordering::Equal {
        return None;
    }

    let root = rat((p_root, q_root));
    let e = numer.to_i32()?;
    if root.cmp0() == Ordering::Equal && e < 0 {
        return None;
    }
    Some(root.pow(e))
}

impl std::ops::Neg for Number {
    type Output = Number;

    fn neg(self) -> Number {
        match self {
            Self::Rational(r) => Self::Rational(-r),
            Self::Float(f) => Self::Float(-f),
            Self::Complex(c) => Self::Complex(-c),
            Self::Interval(lo, hi) => Self::Interval(-hi, -lo),
            Self::Infinity(s) => Self::Infinity(s.flip()),
        }
    }
}

impl From<i32> for Number {
    fn from(n: i32) -> Self {
        Self::Rational(rat(n))
    }
}

impl From<i64> for Number {
    fn from(n: i64) -> Self {
        Self::Rational(rat(n))
    }
}

impl From<Integer> for Number {
    fn from(n: Integer) -> Self {
        Self::Rational(rat(n))
    }
}

impl From<Rational> for Number {
    fn from(r: Rational) -> Self {
        Self::Rational(r)
    }
}

impl From<Float> for Number {
    fn from(f: Float) -> Self {
        Self::Float(f)
    }
}

impl From<Complex> for Number {
    fn from(c: Complex) -> Self {
        Self::Complex(c).normalize()
    }
}

impl Display for Number {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rational(r) => write!(f, "{}", r),
            Self::Float(x) => write!(f, "{}", x.to_f64()),
            Self::Complex(c) => write!(f, "({} + {}i)", c.real().to_f64(), c.imag().to_f64()),
            Self::Interval(lo, hi) => write!(f, "[{}, {}]", lo.to_f64(), hi.to_f64()),
            Self::Infinity(InfSign::Pos) => write!(f, "inf"),
            Self::Infinity(InfSign::Neg) => write!(f, "-inf"),
        }
    }
}
