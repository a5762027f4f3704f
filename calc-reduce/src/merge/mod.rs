//! The pairwise merge operators, one per associative/commutative family.
//!
//! A merge operator looks at two sibling operands and tries to fold them into fewer, simpler
//! operands, mutating one side in place on success. The reduction driver owns the scan order and
//! child bookkeeping; operators only ever see the pair. Every operator follows the same priority
//! order: pure-number folding through the Number capability, identity-element absorption,
//! infinity arithmetic with domain guards, then the family's algebraic identities.
//!
//! Rewrites that are only correct outside a caller-asserted domain (division by a possibly-zero
//! expression, combining real exponents over an unproven base) fire only when the options
//! license them, the operand's own analysis proves the precondition, or a warning records the
//! assumption. They never fire silently on an unproven assumption.

pub(crate) mod add;
pub(crate) mod bitwise;
pub(crate) mod comparison;
pub(crate) mod logical;
pub(crate) mod mul;
pub(crate) mod power;

use calc_num::Number;

use crate::context::ReductionContext;
use crate::expr::{AcKind, Expr, ExprKind};
use crate::options::{ApproximationMode, EvaluationOptions, IntervalCalculation};

/// The result of one pairwise merge attempt.
///
/// Matched exhaustively at every call site; there is no integer code an unhandled value could
/// hide behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MergeOutcome {
    /// The pair stays as-is. Not an error.
    NoMerge,

    /// The result was written into the left operand; the right operand is obsolete.
    MergedIntoLeft,

    /// The result was written into the right operand; the left operand is obsolete.
    MergedIntoRight,

    /// The operands were equal and the merged value is the unchanged left operand.
    MergedEqualNoChange,

    /// The operator wants another attempt with the operands swapped before giving up.
    RetryWithOperandsSwapped,
}

/// Dispatches the merge operator for an associative/commutative kind.
pub(crate) fn merge_pair(
    kind: AcKind,
    left: &mut Expr,
    right: &mut Expr,
    ctx: &ReductionContext,
    opts: &EvaluationOptions,
) -> MergeOutcome {
    match kind {
        AcKind::Add => add::merge(left, right, ctx, opts),
        AcKind::Mul => mul::merge(left, right, ctx, opts),
        AcKind::LogicalAnd | AcKind::LogicalOr | AcKind::LogicalXor => {
            logical::merge(kind, left, right, ctx, opts)
        },
        AcKind::BitAnd | AcKind::BitOr | AcKind::BitXor => {
            bitwise::merge(kind, left, right, ctx, opts)
        },
    }
}

/// Whether a folded numeric result is admissible under the options.
///
/// A fold must not launder the approximate/complex/infinite status of its operands: a complex or
/// infinite result needs the corresponding permission, and under the exact modes a result that
/// lost exactness is rejected when the inputs had it.
pub(crate) fn number_result_allowed(
    result: &Number,
    inputs: [&Number; 2],
    opts: &EvaluationOptions,
) -> bool {
    if result.is_complex() && !opts.allow_complex {
        return false;
    }
    if result.is_infinite() && !opts.allow_infinite {
        return false;
    }
    if matches!(result, Number::Interval(..))
        && opts.interval_calculation == IntervalCalculation::None
    {
        return false;
    }
    if result.is_approximate()
        && inputs.iter().all(|n| n.is_exact())
        && matches!(
            opts.approximation,
            ApproximationMode::Exact | ApproximationMode::ExactVariables,
        )
    {
        return false;
    }
    true
}

/// Splits a term into its numeric coefficient and the remaining factors.
///
/// - `5` -> `(5, 1)`
/// - `3*x` -> `(3, x)`
/// - `x` -> `(1, x)`
/// - `1/4*a*b` -> `(1/4, a*b)`
pub(crate) fn coefficient_split(expr: &Expr) -> (Number, Expr) {
    match &expr.kind {
        ExprKind::Number(n) => (n.clone(), Expr::int(1)),
        ExprKind::Mul(factors) => {
            let mut coefficient = Number::one();
            let mut rest = Vec::with_capacity(factors.len());
            for factor in factors {
                if let Some(n) = factor.as_number() {
                    if let Some(product) = coefficient.checked_mul(n) {
                        coefficient = product;
                        continue;
                    }
                }
                if let Some(n) = factor.as_number_recip() {
                    if let Some(recip) = n.checked_recip() {
                        if let Some(product) = coefficient.checked_mul(&recip) {
                            coefficient = product;
                            continue;
                        }
                    }
                }
                rest.push(factor.clone());
            }
            (coefficient, Expr::new(ExprKind::Mul(rest)).downgrade())
        },
        _ => {
            if let Some(n) = expr.as_number_recip() {
                if let Some(recip) = n.checked_recip() {
                    return (recip, Expr::int(1));
                }
            }
            (Number::one(), expr.clone())
        },
    }
}

/// Rebuilds a term from a coefficient and its factors.
pub(crate) fn coefficient_join(coefficient: Number, factors: Expr) -> Expr {
    if coefficient.is_one() {
        factors
    } else if factors.is_one_number() {
        Expr::number(coefficient)
    } else {
        Expr::mul(vec![Expr::number(coefficient), factors])
    }
}

/// Splits a factor into its base and exponent.
///
/// - `a^b` -> `(a, b)`
/// - `a` -> `(a, 1)`
pub(crate) fn base_exponent_split(expr: &Expr) -> (Expr, Expr) {
    match &expr.kind {
        ExprKind::Pow(base, exp) => ((**base).clone(), (**exp).clone()),
        _ => (expr.clone(), Expr::int(1)),
    }
}

/// True if the expression is known to represent a finite real value: the guard for absorbing it
/// into an infinity or annihilating it with zero.
pub(crate) fn represents_finite_real(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Number(n) => n.is_real(),
        ExprKind::Symbol(_) | ExprKind::Variable(_) | ExprKind::Unit { .. } => true,
        ExprKind::Add(children) | ExprKind::Mul(children) => {
            children.iter().all(represents_finite_real)
        },
        ExprKind::Pow(base, exp) => represents_finite_real(base) && represents_finite_real(exp),
        ExprKind::Function(name, args) => {
            matches!(
                name.as_str(),
                "sin" | "cos" | "tan" | "sinh" | "cosh" | "tanh" | "abs" | "sgn" | "ln"
                    | "log" | "gamma"
            ) && args.iter().all(represents_finite_real)
        },
        ExprKind::Comparison(..)
        | ExprKind::LogicalAnd(_)
        | ExprKind::LogicalOr(_)
        | ExprKind::LogicalXor(_)
        | ExprKind::LogicalNot(_) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn coefficient_split_examples() {
        let (c, rest) = coefficient_split(&Expr::int(5));
        assert_eq!(c, Number::int(5));
        assert_eq!(rest, Expr::int(1));

        let (c, rest) = coefficient_split(&Expr::mul(vec![Expr::int(3), Expr::symbol("x")]));
        assert_eq!(c, Number::int(3));
        assert_eq!(rest, Expr::symbol("x"));

        let (c, rest) = coefficient_split(&Expr::symbol("x"));
        assert_eq!(c, Number::one());
        assert_eq!(rest, Expr::symbol("x"));

        // 1/4 * a, written as 4^-1 * a
        let quarter = Expr::mul(vec![
            Expr::pow(Expr::int(4), Expr::int(-1)),
            Expr::symbol("a"),
        ]);
        let (c, rest) = coefficient_split(&quarter);
        assert_eq!(c, Number::fraction(1, 4));
        assert_eq!(rest, Expr::symbol("a"));
    }

    #[test]
    fn base_exponent_split_examples() {
        let (base, exp) = base_exponent_split(&Expr::pow(Expr::symbol("x"), Expr::int(3)));
        assert_eq!(base, Expr::symbol("x"));
        assert_eq!(exp, Expr::int(3));

        let (base, exp) = base_exponent_split(&Expr::symbol("x"));
        assert_eq!(base, Expr::symbol("x"));
        assert_eq!(exp, Expr::int(1));
    }

    #[test]
    fn finite_real_guard() {
        assert!(represents_finite_real(&Expr::symbol("x")));
        assert!(represents_finite_real(&Expr::call("sin", vec![Expr::symbol("x")])));
        assert!(!represents_finite_real(&Expr::undefined()));
        assert!(!represents_finite_real(&Expr::number(Number::Infinity(
            calc_num::InfSign::Pos
        ))));
    }
}
