//! The merge operator for the logical family.
//!
//! Truth values are the numbers 0 and 1. Besides constant folding and short-circuit absorption,
//! this operator combines comparisons that constrain the same left-hand sub-expression:
//! `x < 5 and x < 3` tightens to `x < 3`, contradictions fold to 0, tautologies to 1. The
//! composition is interval-aware through the Number comparator; endpoints that cannot be ordered
//! keep the pair apart.

use calc_num::Number;
use std::cmp::Ordering;

use crate::context::ReductionContext;
use crate::expr::{AcKind, Expr, ExprKind, Relation};
use crate::options::EvaluationOptions;
use crate::reduce::reduce;

use super::MergeOutcome;

/// Attempts to fold a pair of operands of a logical AND/OR/XOR node.
pub(crate) fn merge(
    kind: AcKind,
    left: &mut Expr,
    right: &mut Expr,
    ctx: &ReductionContext,
    opts: &EvaluationOptions,
) -> MergeOutcome {
    if left.is_undefined_like() || right.is_undefined_like() {
        return MergeOutcome::NoMerge;
    }

    // constant folding
    if let (Some(a), Some(b)) = (left.as_bool(), right.as_bool()) {
        let value = match kind {
            AcKind::LogicalAnd => a && b,
            AcKind::LogicalOr => a || b,
            AcKind::LogicalXor => a != b,
            _ => unreachable!("logical merge dispatched for a non-logical kind"),
        };
        let mut result = Expr::int(value as i64);
        result.absorb_flags(left);
        result.absorb_flags(right);
        *left = result;
        return MergeOutcome::MergedIntoLeft;
    }

    // short-circuit absorption against a constant operand
    if let Some(truth) = left.as_bool() {
        let mut result = absorbed(kind, truth, right, ctx, opts);
        result.absorb_flags(left);
        result.absorb_flags(right);
        *left = result;
        return MergeOutcome::MergedIntoLeft;
    }
    if let Some(truth) = right.as_bool() {
        let mut result = absorbed(kind, truth, left, ctx, opts);
        result.absorb_flags(left);
        result.absorb_flags(right);
        *right = result;
        return MergeOutcome::MergedIntoRight;
    }

    // idempotence and complements
    if left == right {
        return match kind {
            AcKind::LogicalAnd | AcKind::LogicalOr => MergeOutcome::MergedEqualNoChange,
            _ => {
                let mut result = Expr::int(0);
                result.absorb_flags(left);
                result.absorb_flags(right);
                *left = result;
                MergeOutcome::MergedIntoLeft
            },
        };
    }
    if is_complement(left, right) || is_complement(right, left) {
        let value = match kind {
            AcKind::LogicalAnd => 0,
            _ => 1,
        };
        let mut result = Expr::int(value);
        result.absorb_flags(left);
        result.absorb_flags(right);
        *left = result;
        return MergeOutcome::MergedIntoLeft;
    }

    if matches!(kind, AcKind::LogicalAnd | AcKind::LogicalOr) {
        if let Some(result) = combine_comparisons(kind, left, right) {
            let mut result = result;
            result.absorb_flags(left);
            result.absorb_flags(right);
            *left = result;
            return MergeOutcome::MergedIntoLeft;
        }
    }

    MergeOutcome::NoMerge
}

/// The merged value of `constant <op> other` for a known truth value of the constant.
fn absorbed(
    kind: AcKind,
    truth: bool,
    other: &Expr,
    ctx: &ReductionContext,
    opts: &EvaluationOptions,
) -> Expr {
    match (kind, truth) {
        // u and 0 = 0, u or 1 = 1
        (AcKind::LogicalAnd, false) => Expr::int(0),
        (AcKind::LogicalOr, true) => Expr::int(1),
        // u and 1 = u, u or 0 = u, u xor 0 = u
        (AcKind::LogicalAnd, true) | (AcKind::LogicalOr, false) | (AcKind::LogicalXor, false) => {
            other.clone()
        },
        // u xor 1 = not u
        (AcKind::LogicalXor, true) => {
            let mut result = Expr::new(ExprKind::LogicalNot(Box::new(other.clone())));
            reduce(&mut result, ctx, opts);
            result
        },
        _ => unreachable!("logical merge dispatched for a non-logical kind"),
    }
}

/// True if `a` is `not b`.
fn is_complement(a: &Expr, b: &Expr) -> bool {
    matches!(&a.kind, ExprKind::LogicalNot(inner) if **inner == *b)
}

/// A comparison whose right-hand side is numeric: the unit the relational composition works on.
fn comparison_parts(expr: &Expr) -> Option<(&Expr, Relation, &Number)> {
    if let ExprKind::Comparison(rel, lhs, rhs) = &expr.kind {
        if let Some(n) = rhs.as_number() {
            return Some((lhs, *rel, n));
        }
    }
    None
}

/// Combines two comparisons of the same left-hand sub-expression under AND/OR. Returns the
/// folded expression, or [`None`] when the pair constrains a genuine two-sided range (or the
/// endpoints cannot be ordered).
fn combine_comparisons(kind: AcKind, left: &Expr, right: &Expr) -> Option<Expr> {
    let (lhs1, rel1, c1) = comparison_parts(left)?;
    let (lhs2, rel2, c2) = comparison_parts(right)?;
    if lhs1 != lhs2 {
        return None;
    }
    let ord = c1.partial_cmp_value(c2)?;

    let keep_left = || Some(left.clone());
    let keep_right = || Some(right.clone());
    let truth = |value: bool| Some(Expr::int(value as i64));
    let rewrite = |rel: Relation, c: &Number| {
        Some(Expr::comparison(rel, lhs1.clone(), Expr::number(c.clone())))
    };

    use Relation::*;
    let conjunction = kind == AcKind::LogicalAnd;

    // upper bounds together, lower bounds together
    let upper = |rel: Relation| matches!(rel, Lt | Le);
    let lower = |rel: Relation| matches!(rel, Gt | Ge);

    if upper(rel1) && upper(rel2) {
        // and keeps the tighter bound, or keeps the looser one
        let left_tighter = match ord {
            Ordering::Less => true,
            Ordering::Greater => false,
            Ordering::Equal => rel1 == Lt,
        };
        return if left_tighter == conjunction { keep_left() } else { keep_right() };
    }
    if lower(rel1) && lower(rel2) {
        let left_tighter = match ord {
            Ordering::Less => false,
            Ordering::Greater => true,
            Ordering::Equal => rel1 == Gt,
        };
        return if left_tighter == conjunction { keep_left() } else { keep_right() };
    }

    // one upper and one lower bound; normalize so rel1 is the upper bound
    if upper(rel1) && lower(rel2) || lower(rel1) && upper(rel2) {
        let (urel, uc, lrel, ord) = if upper(rel1) {
            (rel1, c1, rel2, ord)
        } else {
            (rel2, c2, rel1, ord.reverse())
        };
        // ord compares the upper endpoint against the lower endpoint
        return match (kind, ord) {
            // x < a and x > b with a <= b: empty
            (AcKind::LogicalAnd, Ordering::Less) => truth(false),
            (AcKind::LogicalAnd, Ordering::Equal) => {
                if urel == Le && lrel == Ge {
                    rewrite(Eq, uc)
                } else {
                    truth(false)
                }
            },
            // a genuine range: stays as two comparisons
            (AcKind::LogicalAnd, Ordering::Greater) => None,
            // x < a or x > b with a > b: everything
            (AcKind::LogicalOr, Ordering::Greater) => truth(true),
            (AcKind::LogicalOr, Ordering::Equal) => {
                if urel == Lt && lrel == Gt {
                    rewrite(Ne, uc)
                } else {
                    truth(true)
                }
            },
            (AcKind::LogicalOr, Ordering::Less) => None,
            _ => unreachable!(),
        };
    }

    // equalities and inequalities
    match (rel1, rel2) {
        (Eq, Eq) => {
            if conjunction {
                if ord == Ordering::Equal { keep_left() } else { truth(false) }
            } else {
                None
            }
        },
        (Eq, Ne) | (Ne, Eq) => {
            let same = ord == Ordering::Equal;
            if conjunction {
                if same { truth(false) } else { if rel1 == Eq { keep_left() } else { keep_right() } }
            } else if same {
                truth(true)
            } else if rel1 == Ne {
                keep_left()
            } else {
                keep_right()
            }
        },
        (Ne, Ne) => {
            if !conjunction && ord != Ordering::Equal {
                truth(true)
            } else {
                None
            }
        },
        (Eq, rel) if conjunction => {
            if rel.test(ord) { keep_left() } else { truth(false) }
        },
        (rel, Eq) if conjunction => {
            if rel.test(ord.reverse()) { keep_right() } else { truth(false) }
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn and(left: &Expr, right: &Expr) -> Option<Expr> {
        merge_kind(AcKind::LogicalAnd, left, right)
    }

    fn or(left: &Expr, right: &Expr) -> Option<Expr> {
        merge_kind(AcKind::LogicalOr, left, right)
    }

    fn merge_kind(kind: AcKind, left: &Expr, right: &Expr) -> Option<Expr> {
        let ctx = ReductionContext::new();
        let opts = EvaluationOptions::default();
        let mut l = left.clone();
        let mut r = right.clone();
        match merge(kind, &mut l, &mut r, &ctx, &opts) {
            MergeOutcome::MergedIntoLeft => Some(l),
            MergeOutcome::MergedIntoRight => Some(r),
            MergeOutcome::MergedEqualNoChange => Some(l),
            _ => None,
        }
    }

    fn cmp(rel: Relation, c: i64) -> Expr {
        Expr::comparison(rel, Expr::symbol("x"), Expr::int(c))
    }

    #[test]
    fn constants_fold() {
        assert_eq!(and(&Expr::int(1), &Expr::int(1)), Some(Expr::int(1)));
        assert_eq!(and(&Expr::int(1), &Expr::int(0)), Some(Expr::int(0)));
        assert_eq!(or(&Expr::int(0), &Expr::int(7)), Some(Expr::int(1)));
        assert_eq!(
            merge_kind(AcKind::LogicalXor, &Expr::int(1), &Expr::int(1)),
            Some(Expr::int(0)),
        );
    }

    #[test]
    fn short_circuit_absorption() {
        let u = Expr::symbol("u");
        assert_eq!(and(&u, &Expr::int(0)), Some(Expr::int(0)));
        assert_eq!(and(&u, &Expr::int(3)), Some(u.clone()));
        assert_eq!(or(&u, &Expr::int(5)), Some(Expr::int(1)));
        assert_eq!(or(&u, &Expr::int(0)), Some(u.clone()));
    }

    #[test]
    fn idempotence_and_complements() {
        let u = Expr::symbol("u");
        assert_eq!(and(&u, &u), Some(u.clone()));
        assert_eq!(or(&u, &u), Some(u.clone()));
        assert_eq!(
            merge_kind(AcKind::LogicalXor, &u, &u),
            Some(Expr::int(0)),
        );

        let not_u = Expr::new(ExprKind::LogicalNot(Box::new(u.clone())));
        assert_eq!(and(&u, &not_u), Some(Expr::int(0)));
        assert_eq!(or(&u, &not_u), Some(Expr::int(1)));
    }

    #[test]
    fn upper_bounds_tighten_under_and() {
        assert_eq!(
            and(&cmp(Relation::Lt, 5), &cmp(Relation::Lt, 3)),
            Some(cmp(Relation::Lt, 3)),
        );
        assert_eq!(
            or(&cmp(Relation::Lt, 5), &cmp(Relation::Lt, 3)),
            Some(cmp(Relation::Lt, 5)),
        );
    }

    #[test]
    fn contradictions_and_tautologies() {
        // x < 3 and x > 5: empty
        assert_eq!(
            and(&cmp(Relation::Lt, 3), &cmp(Relation::Gt, 5)),
            Some(Expr::int(0)),
        );
        // x < 5 or x > 3: everything
        assert_eq!(
            or(&cmp(Relation::Lt, 5), &cmp(Relation::Gt, 3)),
            Some(Expr::int(1)),
        );
        // x <= 3 and x >= 3: pins the value
        assert_eq!(
            and(&cmp(Relation::Le, 3), &cmp(Relation::Ge, 3)),
            Some(cmp(Relation::Eq, 3)),
        );
        // x < 3 or x > 3
        assert_eq!(
            or(&cmp(Relation::Lt, 3), &cmp(Relation::Gt, 3)),
            Some(cmp(Relation::Ne, 3)),
        );
    }

    #[test]
    fn genuine_ranges_stay() {
        // x > 3 and x < 5 is a range, not a single comparison
        assert_eq!(and(&cmp(Relation::Gt, 3), &cmp(Relation::Lt, 5)), None);
    }

    #[test]
    fn equalities_test_against_bounds() {
        // x == 2 and x < 5 keeps the equality
        assert_eq!(
            and(&cmp(Relation::Eq, 2), &cmp(Relation::Lt, 5)),
            Some(cmp(Relation::Eq, 2)),
        );
        // x == 7 and x < 5 is empty
        assert_eq!(
            and(&cmp(Relation::Eq, 7), &cmp(Relation::Lt, 5)),
            Some(Expr::int(0)),
        );
    }

    #[test]
    fn different_subjects_stay_apart() {
        let a = Expr::comparison(Relation::Lt, Expr::symbol("x"), Expr::int(3));
        let b = Expr::comparison(Relation::Lt, Expr::symbol("y"), Expr::int(5));
        assert_eq!(and(&a, &b), None);
    }
}
