//! The policy a reduction pass runs under.
//!
//! [`EvaluationOptions`] is immutable for the duration of a pass. Sub-passes that need a
//! different policy (an approximate probe before committing to an exact rewrite, a
//! combine-divisions restructuring inside the limit subsystem) clone and override locally.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How aggressively numeric results may lose exactness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ApproximationMode {
    /// Exact arithmetic only; rewrites that would introduce approximation do not fire.
    Exact,

    /// Exact arithmetic, except that known variables may substitute approximate values.
    ExactVariables,

    /// Prefer exact results, keep irrational values symbolic (`sqrt(2)` stays `sqrt(2)`).
    #[default]
    TryExact,

    /// Fold everything numeric to approximate values.
    Approximate,
}

/// Whether polynomial expansion may fire, bounded by [`MAX_EXPANDED_TERMS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ExpandMode {
    Off,
    #[default]
    SizeLimited,
}

/// How to treat rewrites that divide by a possibly-zero expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DenominatorAssumption {
    /// Never assume; the rewrite only fires when non-zeroness is proven.
    Off,

    /// Assume denominators are non-zero, silently.
    Assume,

    /// Assume denominators are non-zero and record a warning each time the assumption is used.
    #[default]
    Warn,
}

/// How interval arithmetic participates in reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum IntervalCalculation {
    None,
    #[default]
    Simple,
    Full,
}

/// The largest number of terms an expansion (binomial or distributive) may produce before it is
/// left unexpanded.
pub const MAX_EXPANDED_TERMS: usize = 120;

/// Immutable-per-pass configuration for the reduction driver and every merge operator.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EvaluationOptions {
    pub approximation: ApproximationMode,

    /// Whether complex results are allowed; when false, an operation that would produce one is a
    /// reported domain violation.
    pub allow_complex: bool,

    /// Whether infinite results are allowed.
    pub allow_infinite: bool,

    pub expand: ExpandMode,

    /// Whether sums of fractions with distinct denominators are combined over a common
    /// denominator.
    pub combine_divisions: bool,

    /// Whether terms carrying the same unit under different metric prefixes are reconciled.
    pub sync_units: bool,

    pub nonzero_denominators: DenominatorAssumption,

    /// Whether comparisons with decidable endpoints fold to the truth values 0/1.
    pub test_comparisons: bool,

    /// Whether equation-solving passes may rearrange a comparison to isolate the unknown.
    pub isolate_x: bool,

    /// A function name the pass must not unfold, preventing infinite rewrite loops through
    /// self-referential identities.
    pub protected_function: Option<String>,

    pub interval_calculation: IntervalCalculation,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        Self {
            approximation: ApproximationMode::default(),
            allow_complex: true,
            allow_infinite: true,
            expand: ExpandMode::default(),
            combine_divisions: false,
            sync_units: true,
            nonzero_denominators: DenominatorAssumption::default(),
            test_comparisons: true,
            isolate_x: false,
            protected_function: None,
            interval_calculation: IntervalCalculation::default(),
        }
    }
}

impl EvaluationOptions {
    /// A policy that refuses any loss of exactness.
    pub fn exact() -> Self {
        Self { approximation: ApproximationMode::Exact, ..Self::default() }
    }

    /// A policy that folds everything numeric to approximate values.
    pub fn approximate() -> Self {
        Self { approximation: ApproximationMode::Approximate, ..Self::default() }
    }
}
