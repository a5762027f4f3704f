//! The reduction driver: bottom-up recursion, fixpoint pair scanning, canonical ordering, and
//! collapse.
//!
//! For every commutative node the driver repeatedly scans sibling pairs with the kind's merge
//! operator, restarting from the merge point after each successful fold until a fixpoint, then
//! sorts the survivors into canonical order and collapses single-child and empty nodes. Power
//! and comparison nodes have fixed arity and get a single merge attempt. Every scan step polls
//! the context's abort flag; an aborted pass stops early, leaving a valid (if only partially
//! reduced) tree.

use calc_num::{InfSign, Number, Sign};
use rug::Integer;

use crate::context::ReductionContext;
use crate::expr::{AcKind, Expr, ExprKind};
use crate::merge::{self, MergeOutcome};
use crate::options::{ApproximationMode, EvaluationOptions};
use crate::ordering;
use crate::sample;

/// Reduces an expression to its canonical form under the given policy.
///
/// The tree is mutated in place; the return value reports whether anything changed, so callers
/// can detect that a pass did work.
pub fn reduce(expr: &mut Expr, ctx: &ReductionContext, opts: &EvaluationOptions) -> bool {
    reduce_inner(expr, ctx, opts, true)
}

/// Reduces only the top-level node, without first recursing into children. For partial passes
/// over trees whose children are already reduced.
pub fn reduce_shallow(expr: &mut Expr, ctx: &ReductionContext, opts: &EvaluationOptions) -> bool {
    reduce_inner(expr, ctx, opts, false)
}

pub(crate) fn reduce_inner(
    expr: &mut Expr,
    ctx: &ReductionContext,
    opts: &EvaluationOptions,
    recurse: bool,
) -> bool {
    if ctx.is_aborted() {
        return false;
    }

    let mut changed = false;
    if recurse {
        expr.for_each_child_mut(&mut |child| {
            changed |= reduce_inner(child, ctx, opts, true);
        });
    }

    changed |= match expr.ac_kind() {
        Some(kind) => reduce_ac(expr, kind, ctx, opts),
        None => reduce_fixed(expr, ctx, opts),
    };

    expr.update_flags();
    changed
}

fn pair_mut(children: &mut [Expr], i: usize, j: usize) -> (&mut Expr, &mut Expr) {
    debug_assert!(i < j);
    let (head, tail) = children.split_at_mut(j);
    (&mut head[i], &mut tail[0])
}

/// Hoists nested same-kind children into this node's child list.
fn flatten(kind: AcKind, children: &mut Vec<Expr>) -> bool {
    let mut changed = false;
    let mut i = 0;
    while i < children.len() {
        if children[i].ac_kind() == Some(kind) {
            let nested = children.remove(i);
            let inner = match nested.kind {
                ExprKind::Add(c)
                | ExprKind::Mul(c)
                | ExprKind::LogicalAnd(c)
                | ExprKind::LogicalOr(c)
                | ExprKind::LogicalXor(c)
                | ExprKind::BitAnd(c)
                | ExprKind::BitOr(c)
                | ExprKind::BitXor(c) => c,
                _ => unreachable!(),
            };
            for (offset, child) in inner.into_iter().enumerate() {
                children.insert(i + offset, child);
            }
            changed = true;
        } else {
            i += 1;
        }
    }
    changed
}

/// The fixpoint pair scan. Every unordered pair is offered to the merge operator; a successful
/// fold removes the absorbed child and restarts the scan from the merge point.
fn scan_pairs(
    kind: AcKind,
    children: &mut Vec<Expr>,
    ctx: &ReductionContext,
    opts: &EvaluationOptions,
) -> bool {
    let mut changed = false;
    loop {
        let mut merged_this_sweep = false;
        let mut i = 0;
        while i < children.len() {
            let mut j = i + 1;
            while j < children.len() {
                if ctx.is_aborted() {
                    return changed;
                }
                let (a, b) = pair_mut(children, i, j);
                match merge::merge_pair(kind, a, b, ctx, opts) {
                    MergeOutcome::NoMerge => j += 1,
                    MergeOutcome::MergedIntoLeft => {
                        children.remove(j);
                        merged_this_sweep = true;
                        changed = true;
                        j = i + 1;
                    },
                    MergeOutcome::MergedIntoRight => {
                        children.remove(i);
                        merged_this_sweep = true;
                        changed = true;
                        j = i + 1;
                    },
                    MergeOutcome::MergedEqualNoChange => {
                        children.remove(j);
                        merged_this_sweep = true;
                        changed = true;
                    },
                    MergeOutcome::RetryWithOperandsSwapped => {
                        children.swap(i, j);
                        let (a, b) = pair_mut(children, i, j);
                        match merge::merge_pair(kind, a, b, ctx, opts) {
                            MergeOutcome::MergedIntoLeft => {
                                children.remove(j);
                                merged_this_sweep = true;
                                changed = true;
                                j = i + 1;
                            },
                            MergeOutcome::MergedIntoRight => {
                                children.remove(i);
                                merged_this_sweep = true;
                                changed = true;
                                j = i + 1;
                            },
                            MergeOutcome::MergedEqualNoChange => {
                                children.remove(j);
                                merged_this_sweep = true;
                                changed = true;
                            },
                            _ => {
                                // give up on this pair, restore the original order
                                children.swap(i, j);
                                j += 1;
                            },
                        }
                    },
                }
            }
            i += 1;
        }
        if !merged_this_sweep {
            break;
        }
    }
    changed
}

/// Number-only indeterminate combinations that survived the scan must surface as reported
/// undefineds, never silently fold.
fn indeterminate_message(kind: AcKind, children: &[Expr]) -> Option<&'static str> {
    match kind {
        AcKind::Add => {
            let mut pos = false;
            let mut neg = false;
            for child in children {
                match child.as_number() {
                    Some(Number::Infinity(InfSign::Pos)) => pos = true,
                    Some(Number::Infinity(InfSign::Neg)) => neg = true,
                    _ => {},
                }
            }
            (pos && neg).then_some("indeterminate form: inf - inf")
        },
        AcKind::Mul => {
            let zero = children.iter().any(Expr::is_zero_number);
            let infinite = children
                .iter()
                .any(|c| c.as_number().map(Number::is_infinite).unwrap_or(false));
            (zero && infinite).then_some("indeterminate form: 0 * inf")
        },
        _ => None,
    }
}

fn reduce_ac(
    expr: &mut Expr,
    kind: AcKind,
    ctx: &ReductionContext,
    opts: &EvaluationOptions,
) -> bool {
    let mut changed = false;
    {
        let children = expr.ac_children_mut().expect("ac kind has children");
        changed |= flatten(kind, children);
        changed |= scan_pairs(kind, children, ctx, opts);
    }

    if matches!(kind, AcKind::Add | AcKind::Mul) {
        let children = expr.ac_children().expect("ac kind has children");
        if let Some(message) = indeterminate_message(kind, children) {
            ctx.reporter.error(message);
            expr.replace_with(Expr::undefined());
            return true;
        }
        if children.iter().any(|c| matches!(c.kind, ExprKind::Undefined)) {
            expr.replace_with(Expr::undefined());
            return true;
        }
    }

    {
        let children = expr.ac_children_mut().expect("ac kind has children");
        changed |= ordering::sort_children(children, kind);
    }
    expr.collapse();
    changed
}

fn reduce_fixed(expr: &mut Expr, ctx: &ReductionContext, opts: &EvaluationOptions) -> bool {
    match &expr.kind {
        ExprKind::Pow(..) => reduce_pow(expr, ctx, opts),
        ExprKind::Comparison(..) => reduce_comparison(expr, ctx, opts),
        ExprKind::LogicalNot(_) => reduce_logical_not(expr),
        ExprKind::BitNot(_) => reduce_bit_not(expr),
        ExprKind::Function(..) => reduce_function(expr, ctx, opts),
        _ => false,
    }
}

fn reduce_pow(expr: &mut Expr, ctx: &ReductionContext, opts: &EvaluationOptions) -> bool {
    let poisoned = matches!(
        &expr.kind,
        ExprKind::Pow(base, exponent)
            if base.kind == ExprKind::Undefined || exponent.kind == ExprKind::Undefined
    );
    if poisoned {
        expr.replace_with(Expr::undefined());
        return true;
    }

    let ExprKind::Pow(base, exponent) = &mut expr.kind else { return false };
    let result = match merge::power::merge(base, exponent, ctx, opts) {
        MergeOutcome::MergedIntoLeft => Some(base.take()),
        _ => None,
    };
    match result {
        Some(result) => {
            expr.replace_with(result);
            true
        },
        None => false,
    }
}

fn reduce_comparison(expr: &mut Expr, ctx: &ReductionContext, opts: &EvaluationOptions) -> bool {
    let ExprKind::Comparison(relation, left, right) = &mut expr.kind else { return false };
    let relation = *relation;
    let result = match merge::comparison::merge(relation, left, right, ctx, opts) {
        MergeOutcome::MergedIntoLeft => Some(left.take()),
        _ => None,
    };
    match result {
        Some(result) => {
            expr.replace_with(result);
            true
        },
        None => false,
    }
}

fn reduce_logical_not(expr: &mut Expr) -> bool {
    let ExprKind::LogicalNot(inner) = &mut expr.kind else { return false };
    let replacement = if let Some(truth) = inner.as_bool() {
        Some(Expr::int(!truth as i64))
    } else if let ExprKind::Comparison(relation, ..) = &mut inner.kind {
        // not (a < b) = a >= b
        *relation = relation.negate();
        Some(inner.take())
    } else {
        None
    };

    match replacement {
        Some(mut result) => {
            result.absorb_flags(expr);
            expr.replace_with(result);
            true
        },
        None => false,
    }
}

fn reduce_bit_not(expr: &mut Expr) -> bool {
    let ExprKind::BitNot(inner) = &mut expr.kind else { return false };
    let replacement = if let Some(n) = inner.as_number() {
        n.checked_bit_not().map(Expr::number)
    } else if let ExprKind::BitNot(innermost) = &mut inner.kind {
        // ~~u = u
        Some(innermost.take())
    } else {
        None
    };

    match replacement {
        Some(mut result) => {
            result.absorb_flags(expr);
            expr.replace_with(result);
            true
        },
        None => false,
    }
}

/// Exact special values of the built-in single-argument functions.
fn exact_function_value(name: &str, arg: &Expr) -> Option<Expr> {
    if let Some(n) = arg.as_number() {
        if n.is_zero() {
            return match name {
                "sin" | "tan" | "sinh" | "tanh" | "asin" | "atan" | "sgn" | "abs" => {
                    Some(Expr::int(0))
                },
                "cos" | "cosh" => Some(Expr::int(1)),
                _ => None,
            };
        }
        return match name {
            "abs" => Some(Expr::number(n.abs())),
            "sgn" => match n.sign() {
                Sign::Positive => Some(Expr::int(1)),
                Sign::Negative => Some(Expr::int(-1)),
                _ => None,
            },
            "ln" if n.is_one() => Some(Expr::int(0)),
            "ln" if matches!(n, Number::Infinity(InfSign::Pos)) => {
                Some(Expr::number(Number::Infinity(InfSign::Pos)))
            },
            "cosh" if n.is_infinite() => Some(Expr::number(Number::Infinity(InfSign::Pos))),
            "sinh" => match n {
                Number::Infinity(sign) => Some(Expr::number(Number::Infinity(*sign))),
                _ => None,
            },
            "tanh" => match n {
                Number::Infinity(InfSign::Pos) => Some(Expr::int(1)),
                Number::Infinity(InfSign::Neg) => Some(Expr::int(-1)),
                _ => None,
            },
            "gamma" => {
                if matches!(n, Number::Infinity(InfSign::Pos)) {
                    return Some(Expr::number(Number::Infinity(InfSign::Pos)));
                }
                let k = n.as_integer()?.to_u32()?;
                if (1..=34).contains(&k) {
                    Some(Expr::number(Number::from(Integer::from(
                        Integer::factorial(k - 1),
                    ))))
                } else {
                    None
                }
            },
            _ => None,
        };
    }

    // ln of Euler's constant
    if name == "ln" && arg.as_symbol() == Some("e") {
        return Some(Expr::int(1));
    }
    None
}

/// Rewrites `sqrt`/`root`/`exp` calls onto the power node, where the power rules apply.
fn normalized_power(expr: &mut Expr) -> Option<Expr> {
    let ExprKind::Function(name, args) = &mut expr.kind else { return None };
    match (name.as_str(), args.as_mut_slice()) {
        ("sqrt", [arg]) => Some(Expr::pow(arg.take(), Expr::number(Number::fraction(1, 2)))),
        ("root", [arg, degree]) => {
            let n = degree.as_integer()?.to_i64()?;
            if n == 0 {
                return None;
            }
            Some(Expr::pow(arg.take(), Expr::number(Number::fraction(1, n))))
        },
        ("exp", [arg]) => Some(Expr::pow(Expr::symbol("e"), arg.take())),
        _ => None,
    }
}

fn reduce_function(expr: &mut Expr, ctx: &ReductionContext, opts: &EvaluationOptions) -> bool {
    let (protected, poisoned) = match &expr.kind {
        ExprKind::Function(name, args) => (
            opts.protected_function.as_deref() == Some(name.as_str()),
            args.iter().any(|a| a.kind == ExprKind::Undefined),
        ),
        _ => return false,
    };
    if protected {
        return false;
    }
    if poisoned {
        expr.replace_with(Expr::undefined());
        return true;
    }

    if let Some(power) = normalized_power(expr) {
        expr.replace_with(power);
        reduce_inner(expr, ctx, opts, false);
        return true;
    }

    let folded = match &expr.kind {
        ExprKind::Function(name, args) => match args.as_slice() {
            [arg] => exact_function_value(name, arg).or_else(|| {
                // approximate folding under the approximating policy
                if opts.approximation != ApproximationMode::Approximate {
                    return None;
                }
                let x = arg.as_number()?.to_float()?;
                sample::apply_fn(name, x).map(|value| Expr::number(Number::Float(value)))
            }),
            _ => None,
        },
        _ => None,
    };

    match folded {
        Some(mut result) => {
            result.absorb_flags(expr);
            expr.replace_with(result);
            true
        },
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn reduced(mut expr: Expr) -> Expr {
        let ctx = ReductionContext::new();
        let opts = EvaluationOptions::default();
        reduce(&mut expr, &ctx, &opts);
        expr
    }

    #[test]
    fn numeric_sums_fold_completely() {
        let expr = Expr::add(vec![Expr::int(1), Expr::int(2), Expr::int(3)]);
        assert_eq!(reduced(expr), Expr::int(6));
    }

    #[test]
    fn like_terms_across_the_child_list() {
        // x + y + x = 2x + y
        let expr = Expr::add(vec![Expr::symbol("x"), Expr::symbol("y"), Expr::symbol("x")]);
        assert_eq!(
            reduced(expr),
            Expr::add(vec![
                Expr::mul(vec![Expr::int(2), Expr::symbol("x")]),
                Expr::symbol("y"),
            ]),
        );
    }

    #[test]
    fn nested_sums_flatten() {
        let expr = Expr::new(ExprKind::Add(vec![
            Expr::symbol("x"),
            Expr::new(ExprKind::Add(vec![Expr::symbol("x"), Expr::int(1)])),
        ]));
        assert_eq!(
            reduced(expr),
            Expr::add(vec![
                Expr::mul(vec![Expr::int(2), Expr::symbol("x")]),
                Expr::int(1),
            ]),
        );
    }

    #[test]
    fn single_child_collapses_into_parent_slot() {
        // x * 1 reduces to x, not to Mul([x])
        let expr = Expr::new(ExprKind::Mul(vec![Expr::symbol("x"), Expr::int(1)]));
        assert_eq!(reduced(expr), Expr::symbol("x"));
    }

    #[test]
    fn opposite_infinities_surface_as_undefined() {
        let ctx = ReductionContext::new();
        let opts = EvaluationOptions::default();
        let mut expr = Expr::new(ExprKind::Add(vec![
            Expr::number(Number::Infinity(InfSign::Pos)),
            Expr::number(Number::Infinity(InfSign::Neg)),
        ]));
        reduce(&mut expr, &ctx, &opts);
        assert_eq!(expr.kind, ExprKind::Undefined);
        assert!(ctx.reporter.has_errors());
    }

    #[test]
    fn zero_times_infinity_surfaces_as_undefined() {
        let ctx = ReductionContext::new();
        let opts = EvaluationOptions::default();
        let mut expr = Expr::new(ExprKind::Mul(vec![
            Expr::int(0),
            Expr::number(Number::Infinity(InfSign::Pos)),
        ]));
        reduce(&mut expr, &ctx, &opts);
        assert_eq!(expr.kind, ExprKind::Undefined);
        assert!(ctx.reporter.has_errors());
    }

    #[test]
    fn comparison_folds_to_truth_value() {
        let expr = Expr::comparison(crate::expr::Relation::Lt, Expr::int(2), Expr::int(3));
        assert_eq!(reduced(expr), Expr::int(1));
    }

    #[test]
    fn not_of_comparison_flips_the_relation() {
        let cmp = Expr::comparison(crate::expr::Relation::Lt, Expr::symbol("x"), Expr::int(3));
        let expr = Expr::new(ExprKind::LogicalNot(Box::new(cmp)));
        assert_eq!(
            reduced(expr),
            Expr::comparison(crate::expr::Relation::Ge, Expr::symbol("x"), Expr::int(3)),
        );
    }

    #[test]
    fn sqrt_normalizes_to_a_power() {
        let expr = Expr::call("sqrt", vec![Expr::int(4)]);
        assert_eq!(reduced(expr), Expr::int(2));
    }

    #[test]
    fn functions_fold_exact_special_values() {
        assert_eq!(reduced(Expr::call("sin", vec![Expr::int(0)])), Expr::int(0));
        assert_eq!(reduced(Expr::call("cos", vec![Expr::int(0)])), Expr::int(1));
        assert_eq!(reduced(Expr::call("abs", vec![Expr::int(-7)])), Expr::int(7));
        assert_eq!(reduced(Expr::call("gamma", vec![Expr::int(5)])), Expr::int(24));
        assert_eq!(reduced(Expr::call("ln", vec![Expr::symbol("e")])), Expr::int(1));
    }

    #[test]
    fn protected_functions_are_left_alone() {
        let ctx = ReductionContext::new();
        let opts = EvaluationOptions {
            protected_function: Some("sin".into()),
            ..EvaluationOptions::default()
        };
        let mut expr = Expr::call("sin", vec![Expr::int(0)]);
        reduce(&mut expr, &ctx, &opts);
        assert_eq!(expr, Expr::call("sin", vec![Expr::int(0)]));
    }

    #[test]
    fn changed_flag_reports_work() {
        let ctx = ReductionContext::new();
        let opts = EvaluationOptions::default();

        let mut expr = Expr::add(vec![Expr::symbol("x"), Expr::int(0)]);
        assert!(reduce(&mut expr, &ctx, &opts));

        let mut settled = Expr::symbol("x");
        assert!(!reduce(&mut settled, &ctx, &opts));
    }

    #[test]
    fn abort_leaves_a_valid_tree() {
        let ctx = ReductionContext::new();
        ctx.abort_handle().store(true, std::sync::atomic::Ordering::Relaxed);
        let opts = EvaluationOptions::default();

        let mut expr = Expr::add(vec![Expr::int(1), Expr::int(2), Expr::symbol("x")]);
        let before = expr.clone();
        reduce(&mut expr, &ctx, &opts);
        // nothing was reduced, but the tree is intact
        assert_eq!(expr, before);
        assert_eq!(expr.node_count(), 4);
    }
}
