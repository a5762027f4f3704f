//! Resolution of comparison nodes.
//!
//! A comparison folds to the truth values 0/1 when its endpoints decide it: numeric endpoints go
//! through the Number capability's interval-aware comparator, symbolic ones through the
//! assumption-aware sign analysis of the difference. Overlapping intervals are genuinely
//! unresolved and record a warning, since the caller asked for a verdict.

use calc_num::Sign;
use std::cmp::Ordering;

use crate::assumptions::sign_of;
use crate::context::ReductionContext;
use crate::expr::{Expr, Relation};
use crate::options::EvaluationOptions;
use crate::reduce::reduce;

use super::MergeOutcome;

/// Attempts to resolve `left <rel> right`, writing the truth value into the left slot.
pub(crate) fn merge(
    relation: Relation,
    left: &mut Expr,
    right: &mut Expr,
    ctx: &ReductionContext,
    opts: &EvaluationOptions,
) -> MergeOutcome {
    if !opts.test_comparisons {
        return MergeOutcome::NoMerge;
    }
    if left.is_undefined_like() || right.is_undefined_like() {
        return MergeOutcome::NoMerge;
    }

    if let Some(verdict) = resolve(relation, left, right, ctx, opts) {
        let mut result = Expr::int(verdict as i64);
        result.absorb_flags(left);
        result.absorb_flags(right);
        *left = result;
        return MergeOutcome::MergedIntoLeft;
    }
    MergeOutcome::NoMerge
}

fn resolve(
    relation: Relation,
    left: &Expr,
    right: &Expr,
    ctx: &ReductionContext,
    opts: &EvaluationOptions,
) -> Option<bool> {
    // numeric endpoints
    if let (Some(a), Some(b)) = (left.as_number(), right.as_number()) {
        if matches!(relation, Relation::Eq | Relation::Ne) {
            if let Some(equal) = a.eq_value(b) {
                return Some(if relation == Relation::Eq { equal } else { !equal });
            }
        }
        return match a.partial_cmp_value(b) {
            Some(ord) => Some(relation.test(ord)),
            None => {
                ctx.reporter.warn(format!(
                    "cannot resolve {} {} {}: the values overlap",
                    a,
                    match relation {
                        Relation::Eq => "==",
                        Relation::Ne => "!=",
                        Relation::Lt => "<",
                        Relation::Le => "<=",
                        Relation::Gt => ">",
                        Relation::Ge => ">=",
                    },
                    b,
                ));
                None
            },
        };
    }

    // equal structure decides equality-flavored relations outright
    if left == right {
        return match relation {
            Relation::Eq | Relation::Le | Relation::Ge => Some(true),
            Relation::Ne | Relation::Lt | Relation::Gt => Some(false),
        };
    }

    // assumption-aware fallback: the sign of (left - right)
    let mut difference = Expr::add(vec![left.clone(), right.clone().neg()]);
    reduce(&mut difference, ctx, opts);
    let ord = match sign_of(&difference, &ctx.assumptions) {
        Sign::Positive => Some(Ordering::Greater),
        Sign::Negative => Some(Ordering::Less),
        Sign::Zero => Some(Ordering::Equal),
        Sign::NonNegative => {
            return match relation {
                Relation::Ge => Some(true),
                Relation::Lt => Some(false),
                _ => None,
            };
        },
        Sign::NonPositive => {
            return match relation {
                Relation::Le => Some(true),
                Relation::Gt => Some(false),
                _ => None,
            };
        },
        Sign::Nonzero => {
            return match relation {
                Relation::Ne => Some(true),
                Relation::Eq => Some(false),
                _ => None,
            };
        },
        Sign::Unknown => None,
    };
    ord.map(|ord| relation.test(ord))
}
