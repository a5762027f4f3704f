//! Types for the limit subsystem.

use calc_num::Number;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Where the limit variable is headed.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LimitPoint {
    Finite(Number),
    PosInfinity,
    NegInfinity,
}

/// The side the limit variable approaches its point from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Approach {
    Below,
    Above,
    /// Both sides must agree, or the limit does not exist.
    #[default]
    Either,
}

/// One limit computation: a variable, the point it approaches, and the approach direction.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LimitQuery {
    pub variable: String,
    pub point: LimitPoint,
    pub direction: Approach,
}

impl LimitQuery {
    /// A two-sided limit at a finite point.
    pub fn at(variable: impl Into<String>, point: impl Into<Number>) -> Self {
        Self {
            variable: variable.into(),
            point: LimitPoint::Finite(point.into()),
            direction: Approach::Either,
        }
    }

    /// A limit as the variable grows towards `+inf`.
    pub fn at_pos_infinity(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            point: LimitPoint::PosInfinity,
            direction: Approach::Either,
        }
    }

    /// A limit as the variable falls towards `-inf`.
    pub fn at_neg_infinity(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            point: LimitPoint::NegInfinity,
            direction: Approach::Either,
        }
    }

    /// Restricts the approach to one side.
    pub fn from(mut self, direction: Approach) -> Self {
        self.direction = direction;
        self
    }
}
