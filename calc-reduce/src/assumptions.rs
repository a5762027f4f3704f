//! Caller-supplied knowledge about symbols, and the sign analysis built on it.
//!
//! Assumptions license rewrites that would otherwise be unsound: combining real exponents over a
//! base that must be proven non-negative, resolving a comparison against zero, folding an
//! infinity against a factor whose sign must be known. They come from two places: a
//! [`Variable`](crate::expr::Variable) node carries its own assumptions, and the
//! [`AssumptionStore`] holds facts about free symbols by name.

use calc_num::Sign;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::expr::{Expr, ExprKind};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// What is known about a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Assumptions {
    /// The sign of the symbol's value.
    pub sign: Sign,

    /// Whether the symbol's value is an integer.
    pub integer: bool,
}

impl Assumptions {
    /// A symbol known to be `> 0`.
    pub fn positive() -> Self {
        Self { sign: Sign::Positive, ..Self::default() }
    }

    /// A symbol known to be `< 0`.
    pub fn negative() -> Self {
        Self { sign: Sign::Negative, ..Self::default() }
    }

    /// A symbol known to be `>= 0`.
    pub fn nonnegative() -> Self {
        Self { sign: Sign::NonNegative, ..Self::default() }
    }

    /// A symbol known to be `!= 0`.
    pub fn nonzero() -> Self {
        Self { sign: Sign::Nonzero, ..Self::default() }
    }
}

/// Shared, mutable store of per-symbol assumptions, keyed by name.
///
/// The handle is cheap to clone; all clones share the same facts. Interior mutability is
/// single-threaded by design (the engine is a synchronous recursive-descent computation).
#[derive(Debug, Clone, Default)]
pub struct AssumptionStore {
    inner: Rc<RefCell<HashMap<String, Assumptions>>>,
}

impl AssumptionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records assumptions for a symbol, replacing any previous entry.
    pub fn assume(&self, name: impl Into<String>, assumptions: Assumptions) {
        self.inner.borrow_mut().insert(name.into(), assumptions);
    }

    /// Looks up the assumptions for a symbol.
    pub fn get(&self, name: &str) -> Option<Assumptions> {
        self.inner.borrow().get(name).copied()
    }

    /// The assumed sign of a symbol, [`Sign::Unknown`] if nothing is known.
    pub fn sign_of_symbol(&self, name: &str) -> Sign {
        self.get(name).map(|a| a.sign).unwrap_or(Sign::Unknown)
    }
}

/// Structural sign analysis: what can be said about the sign of `expr` from the signs of its
/// parts and the assumptions in `store`?
///
/// This is deliberately conservative; [`Sign::Unknown`] is always a safe answer.
pub fn sign_of(expr: &Expr, store: &AssumptionStore) -> Sign {
    match &expr.kind {
        ExprKind::Number(n) => n.sign(),
        ExprKind::Symbol(name) => store.sign_of_symbol(name),
        ExprKind::Variable(var) => {
            if var.assumptions.sign != Sign::Unknown {
                var.assumptions.sign
            } else {
                store.sign_of_symbol(&var.name)
            }
        },
        ExprKind::Unit { .. } => Sign::Positive,
        ExprKind::Add(terms) => {
            let signs = terms.iter().map(|t| sign_of(t, store)).collect::<Vec<_>>();
            if signs.iter().all(|s| *s == Sign::Zero) {
                Sign::Zero
            } else if signs.iter().all(|s| s.is_nonnegative()) {
                if signs.iter().any(|s| *s == Sign::Positive) {
                    Sign::Positive
                } else {
                    Sign::NonNegative
                }
            } else if signs.iter().all(|s| s.is_nonpositive()) {
                if signs.iter().any(|s| *s == Sign::Negative) {
                    Sign::Negative
                } else {
                    Sign::NonPositive
                }
            } else {
                Sign::Unknown
            }
        },
        ExprKind::Mul(factors) => factors
            .iter()
            .map(|f| sign_of(f, store))
            .fold(Sign::Positive, Sign::mul),
        ExprKind::Pow(base, exp) => {
            let base_sign = sign_of(base, store);
            if let Some(e) = exp.as_number() {
                if e.is_even() {
                    // u^(2k) is never negative, and positive if u is non-zero
                    return if base_sign.is_nonzero() {
                        Sign::Positive
                    } else {
                        Sign::NonNegative
                    };
                }
                if e.is_odd() {
                    return base_sign;
                }
                if !e.is_integer() && e.is_exact() {
                    // principal root of a real: non-negative where defined
                    return match base_sign {
                        Sign::Positive => Sign::Positive,
                        Sign::Zero => Sign::Zero,
                        _ => Sign::NonNegative,
                    };
                }
            }
            // symbolic exponent: u^v > 0 for u > 0
            if base_sign == Sign::Positive {
                Sign::Positive
            } else {
                Sign::Unknown
            }
        },
        ExprKind::Function(name, args) => match (name.as_str(), args.as_slice()) {
            ("abs", [arg]) => {
                if sign_of(arg, store).is_nonzero() {
                    Sign::Positive
                } else {
                    Sign::NonNegative
                }
            },
            ("sgn", [arg]) => sign_of(arg, store),
            ("cosh", _) => Sign::Positive,
            ("gamma", [arg]) => {
                if sign_of(arg, store) == Sign::Positive {
                    Sign::Positive
                } else {
                    Sign::Unknown
                }
            },
            _ => Sign::Unknown,
        },
        _ => Sign::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_lookup() {
        let store = AssumptionStore::new();
        store.assume("x", Assumptions::positive());
        assert_eq!(store.sign_of_symbol("x"), Sign::Positive);
        assert_eq!(store.sign_of_symbol("y"), Sign::Unknown);
    }

    #[test]
    fn even_powers_are_nonnegative() {
        let store = AssumptionStore::new();
        let squared = Expr::pow(Expr::symbol("x"), Expr::int(2));
        assert_eq!(sign_of(&squared, &store), Sign::NonNegative);

        store.assume("x", Assumptions::nonzero());
        assert_eq!(sign_of(&squared, &store), Sign::Positive);
    }

    #[test]
    fn products_multiply_signs() {
        let store = AssumptionStore::new();
        store.assume("a", Assumptions::positive());
        store.assume("b", Assumptions::negative());

        let product = Expr::mul(vec![Expr::symbol("a"), Expr::symbol("b")]);
        assert_eq!(sign_of(&product, &store), Sign::Negative);

        let with_square = Expr::mul(vec![
            Expr::symbol("b"),
            Expr::pow(Expr::symbol("b"), Expr::int(2)),
        ]);
        assert_eq!(sign_of(&with_square, &store), Sign::Negative);
    }

    #[test]
    fn sums_of_one_signed_terms() {
        let store = AssumptionStore::new();
        store.assume("a", Assumptions::positive());

        let sum = Expr::add(vec![
            Expr::symbol("a"),
            Expr::pow(Expr::symbol("x"), Expr::int(2)),
        ]);
        assert_eq!(sign_of(&sum, &store), Sign::Positive);

        let mixed = Expr::add(vec![Expr::symbol("a"), Expr::symbol("y")]);
        assert_eq!(sign_of(&mixed, &store), Sign::Unknown);
    }

    #[test]
    fn variable_assumptions_take_priority() {
        let store = AssumptionStore::new();
        let var = Expr::variable("h", Assumptions::negative());
        assert_eq!(sign_of(&var, &store), Sign::Negative);
    }
}
