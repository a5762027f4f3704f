//! The merge operator for multiplication: numeric folding, exponent merging under domain
//! guards, trig-product reduction, sgn/abs absorption, polynomial cancellation, and matrix
//! products.

use calc_num::{Number, Sign};

use crate::assumptions::sign_of;
use crate::context::ReductionContext;
use crate::expr::{Expr, ExprKind};
use crate::options::{DenominatorAssumption, EvaluationOptions};
use crate::polynomial::Poly;
use crate::reduce::reduce;
use crate::sample::probe_sign;

use super::{
    base_exponent_split, number_result_allowed, represents_finite_real, MergeOutcome,
};

/// Attempts to fold `left * right` into a single operand.
pub(crate) fn merge(
    left: &mut Expr,
    right: &mut Expr,
    ctx: &ReductionContext,
    opts: &EvaluationOptions,
) -> MergeOutcome {
    if left.is_undefined_like() || right.is_undefined_like() {
        return MergeOutcome::NoMerge;
    }

    // pure-number folding; 0 * inf comes back None and stays unmerged
    if let (Some(a), Some(b)) = (left.as_number(), right.as_number()) {
        return match a.checked_mul(b) {
            Some(product) if number_result_allowed(&product, [a, b], opts) => {
                let mut result = Expr::number(product);
                result.absorb_flags(left);
                result.absorb_flags(right);
                *left = result;
                MergeOutcome::MergedIntoLeft
            },
            _ => MergeOutcome::NoMerge,
        };
    }

    // identity absorption
    if right.is_one_number() {
        left.absorb_flags(right);
        return MergeOutcome::MergedIntoLeft;
    }
    if left.is_one_number() {
        right.absorb_flags(left);
        return MergeOutcome::MergedIntoRight;
    }

    // annihilation: 0 * u = 0 for finite real u
    if left.is_zero_number() && represents_finite_real(right) {
        left.absorb_flags(right);
        return MergeOutcome::MergedIntoLeft;
    }
    if right.is_zero_number() && represents_finite_real(left) {
        right.absorb_flags(left);
        return MergeOutcome::MergedIntoRight;
    }

    // inf * u for u of proven sign
    if let Some(outcome) = merge_infinity(left, right, ctx) {
        return outcome;
    }

    if let Some(outcome) = merge_matrix(left, right, ctx, opts) {
        return outcome;
    }

    if let Some(result) = trig_product(left, right) {
        return store(left, right, result);
    }

    if let Some(result) = merge_exponents(left, right, ctx, opts) {
        return store(left, right, result);
    }

    if let Some(result) = cancel_polynomials(left, right, ctx, opts) {
        return store(left, right, result);
    }

    MergeOutcome::NoMerge
}

fn store(left: &mut Expr, right: &mut Expr, mut result: Expr) -> MergeOutcome {
    result.absorb_flags(left);
    result.absorb_flags(right);
    *left = result;
    MergeOutcome::MergedIntoLeft
}

/// Folds an infinity against a factor whose sign is proven by assumptions. An unknown sign, or a
/// possible zero, keeps the pair apart.
fn merge_infinity(
    left: &mut Expr,
    right: &mut Expr,
    ctx: &ReductionContext,
) -> Option<MergeOutcome> {
    let (infinite, other, into_left) = if let Some(n) = left.as_number() {
        if !n.is_infinite() {
            return None;
        }
        (n.clone(), &*right, true)
    } else if let Some(n) = right.as_number() {
        if !n.is_infinite() {
            return None;
        }
        (n.clone(), &*left, false)
    } else {
        return None;
    };

    if !represents_finite_real(other) {
        return None;
    }
    let result = match sign_of(other, &ctx.assumptions) {
        Sign::Positive => infinite,
        Sign::Negative => -infinite,
        _ => return None,
    };

    Some(if into_left {
        store(left, right, Expr::number(result))
    } else {
        let mut merged = Expr::number(result);
        merged.absorb_flags(left);
        merged.absorb_flags(right);
        *right = merged;
        MergeOutcome::MergedIntoRight
    })
}

/// If the factor is a single-argument function call, its name and argument.
fn call_name(expr: &Expr) -> Option<(&str, &Expr)> {
    if let ExprKind::Function(name, args) = &expr.kind {
        if let [arg] = args.as_slice() {
            return Some((name, arg));
        }
    }
    None
}

/// If the factor is a single-argument function call raised to −1, its name and argument.
fn recip_call(expr: &Expr) -> Option<(&str, &Expr)> {
    if let ExprKind::Pow(base, exp) = &expr.kind {
        if exp.as_number().map(Number::is_minus_one).unwrap_or(false) {
            return call_name(base);
        }
    }
    None
}

/// Trig quotient/product reduction and sgn/abs absorption.
fn trig_product(left: &Expr, right: &Expr) -> Option<Expr> {
    let ordered = [(left, right), (right, left)];
    for (a, b) in ordered {
        if let (Some((fa, ua)), Some((fb, ub))) = (call_name(a), call_name(b)) {
            if ua == ub {
                match (fa, fb) {
                    // tan u * cos u = sin u
                    ("tan", "cos") => return Some(Expr::call("sin", vec![ua.clone()])),
                    // sgn u * abs u = u
                    ("sgn", "abs") => return Some(ua.clone()),
                    _ => {},
                }
            }
        }
        if let (Some((fa, ua)), Some((fb, ub))) = (call_name(a), recip_call(b)) {
            if ua == ub {
                match (fa, fb) {
                    // sin u / cos u = tan u
                    ("sin", "cos") => return Some(Expr::call("tan", vec![ua.clone()])),
                    // sin u / tan u = cos u
                    ("sin", "tan") => return Some(Expr::call("cos", vec![ua.clone()])),
                    _ => {},
                }
            }
        }
    }
    None
}

/// Whether `u^a * u^b` may combine exponents: unconditionally for integer exponents, otherwise
/// the base must be proven non-negative — by assumption-aware sign analysis, or by the numeric
/// sampling heuristic, which records a warning because it is not a proof.
fn exponent_merge_allowed(
    base: &Expr,
    e1: &Expr,
    e2: &Expr,
    ctx: &ReductionContext,
    opts: &EvaluationOptions,
) -> bool {
    let integer_exponent =
        |e: &Expr| e.as_number().map(Number::is_integer).unwrap_or(false);
    if integer_exponent(e1) && integer_exponent(e2) {
        return true;
    }
    if sign_of(base, &ctx.assumptions).is_nonnegative() {
        return true;
    }
    if opts.nonzero_denominators != DenominatorAssumption::Off {
        if let Some(var) = base.free_symbol() {
            if probe_sign(base, &var).is_nonnegative() {
                ctx.reporter.warn(format!("assuming {} is non-negative", base));
                return true;
            }
        }
    }
    false
}

/// `u^a * u^b = u^(a+b)` under the domain gate, plus `a^c * b^c = (a*b)^c` for numeric bases.
fn merge_exponents(
    left: &Expr,
    right: &Expr,
    ctx: &ReductionContext,
    opts: &EvaluationOptions,
) -> Option<Expr> {
    let (b1, e1) = base_exponent_split(left);
    let (b2, e2) = base_exponent_split(right);

    if b1 == b2 {
        if !exponent_merge_allowed(&b1, &e1, &e2, ctx, opts) {
            return None;
        }
        let mut exponent = Expr::add(vec![e1, e2]);
        reduce(&mut exponent, ctx, opts);

        if exponent.is_zero_number() {
            // u^0 = 1 only holds for non-zero u
            if !sign_of(&b1, &ctx.assumptions).is_nonzero() {
                match opts.nonzero_denominators {
                    DenominatorAssumption::Off => return None,
                    DenominatorAssumption::Assume => {},
                    DenominatorAssumption::Warn => {
                        ctx.reporter.warn(format!("assuming {} is non-zero", b1));
                    },
                }
            }
            return Some(Expr::int(1));
        }
        if exponent.is_one_number() {
            return Some(b1);
        }
        let mut result = Expr::pow(b1, exponent);
        reduce(&mut result, ctx, opts);
        return Some(result);
    }

    // a^c * b^c = (a*b)^c for numbers a, b when valid
    if e1 == e2 && !e1.is_one_number() {
        if let (Some(a), Some(b)) = (b1.as_number(), b2.as_number()) {
            let integer_exp = e1.as_integer().is_some();
            let nonneg_bases = a.sign().is_nonnegative() && b.sign().is_nonnegative();
            if integer_exp || nonneg_bases {
                let product = a.checked_mul(b)?;
                if !number_result_allowed(&product, [a, b], opts) {
                    return None;
                }
                let mut result = Expr::pow(Expr::number(product), e1);
                reduce(&mut result, ctx, opts);
                return Some(result);
            }
        }
    }

    None
}

/// Cancels a polynomial factor against a reciprocal polynomial: exact long division when the
/// remainder vanishes, common-factor removal via the GCD otherwise. Division by the cancelled
/// factor is licensed by the denominator assumption policy.
fn cancel_polynomials(
    left: &Expr,
    right: &Expr,
    ctx: &ReductionContext,
    opts: &EvaluationOptions,
) -> Option<Expr> {
    fn reciprocal_base(expr: &Expr) -> Option<&Expr> {
        if let ExprKind::Pow(base, exp) = &expr.kind {
            if exp.as_number().map(Number::is_minus_one).unwrap_or(false) {
                return Some(base);
            }
        }
        None
    }

    let (numerator, denominator) = if let Some(d) = reciprocal_base(right) {
        (left, d)
    } else if let Some(d) = reciprocal_base(left) {
        (right, d)
    } else {
        return None;
    };

    let var = denominator.free_symbol()?;
    let num_poly = Poly::from_expr(numerator, &var)?;
    let den_poly = Poly::from_expr(denominator, &var)?;
    if den_poly.degree() < 1 || num_poly.is_zero() {
        return None;
    }

    if opts.nonzero_denominators == DenominatorAssumption::Off {
        return None;
    }

    let (quotient, remainder) = num_poly.div_rem(&den_poly)?;
    let result = if remainder.is_zero() {
        quotient.to_expr()
    } else {
        let gcd = Poly::gcd(&num_poly, &den_poly)?;
        if gcd.degree() < 1 {
            return None;
        }
        let (reduced_num, _) = num_poly.div_rem(&gcd)?;
        let (reduced_den, _) = den_poly.div_rem(&gcd)?;
        let mut fraction = Expr::fraction(reduced_num.to_expr(), reduced_den.to_expr());
        reduce(&mut fraction, ctx, opts);
        fraction
    };

    if opts.nonzero_denominators == DenominatorAssumption::Warn {
        ctx.reporter.warn(format!("assuming {} is non-zero", denominator));
    }
    Some(result)
}

/// The shape of a matrix node.
fn matrix_shape(expr: &Expr) -> Option<(usize, usize)> {
    if let ExprKind::Matrix(rows) = &expr.kind {
        let cols = rows.first().map(Vec::len).unwrap_or(0);
        return Some((rows.len(), cols));
    }
    None
}

/// Matrix-by-matrix and matrix-by-scalar products. A dimension mismatch is reported, never
/// silently dropped.
fn merge_matrix(
    left: &mut Expr,
    right: &mut Expr,
    ctx: &ReductionContext,
    opts: &EvaluationOptions,
) -> Option<MergeOutcome> {
    let (left_shape, right_shape) = (matrix_shape(left), matrix_shape(right));

    match (left_shape, right_shape) {
        (Some((m, n)), Some((n2, p))) => {
            if n != n2 {
                ctx.reporter.error(format!(
                    "cannot multiply a {}x{} matrix by a {}x{} matrix",
                    m, n, n2, p,
                ));
                return Some(MergeOutcome::NoMerge);
            }
            let (ExprKind::Matrix(a), ExprKind::Matrix(b)) = (&left.kind, &right.kind) else {
                return None;
            };
            let mut rows = Vec::with_capacity(m);
            for i in 0..m {
                let mut row = Vec::with_capacity(p);
                for j in 0..p {
                    let mut entry = Expr::add(
                        (0..n)
                            .map(|k| Expr::mul(vec![a[i][k].clone(), b[k][j].clone()]))
                            .collect(),
                    );
                    reduce(&mut entry, ctx, opts);
                    row.push(entry);
                }
                rows.push(row);
            }
            Some(store(left, right, Expr::new(ExprKind::Matrix(rows))))
        },
        (Some(_), None) | (None, Some(_)) => {
            let (matrix, scalar, into_left) = if left_shape.is_some() {
                (&*left, &*right, true)
            } else {
                (&*right, &*left, false)
            };
            if !represents_finite_real(scalar) {
                return None;
            }
            let ExprKind::Matrix(rows) = &matrix.kind else { return None };
            let scaled = rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|entry| {
                            let mut e = Expr::mul(vec![scalar.clone(), entry.clone()]);
                            reduce(&mut e, ctx, opts);
                            e
                        })
                        .collect()
                })
                .collect();
            let result = Expr::new(ExprKind::Matrix(scaled));
            Some(if into_left {
                store(left, right, result)
            } else {
                let mut merged = result;
                merged.absorb_flags(left);
                merged.absorb_flags(right);
                *right = merged;
                MergeOutcome::MergedIntoRight
            })
        },
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::Assumptions;
    use pretty_assertions::assert_eq;

    fn merge_with(left: &Expr, right: &Expr, ctx: &ReductionContext) -> Option<Expr> {
        let opts = EvaluationOptions::default();
        let mut l = left.clone();
        let mut r = right.clone();
        match merge(&mut l, &mut r, ctx, &opts) {
            MergeOutcome::MergedIntoLeft | MergeOutcome::MergedEqualNoChange => Some(l),
            MergeOutcome::MergedIntoRight => Some(r),
            _ => None,
        }
    }

    fn merge_pair(left: &Expr, right: &Expr) -> Option<Expr> {
        merge_with(left, right, &ReductionContext::new())
    }

    #[test]
    fn integer_exponents_always_merge() {
        let x2 = Expr::pow(Expr::symbol("x"), Expr::int(2));
        let x3 = Expr::pow(Expr::symbol("x"), Expr::int(3));
        assert_eq!(
            merge_pair(&x2, &x3),
            Some(Expr::pow(Expr::symbol("x"), Expr::int(5))),
        );

        // x * x = x^2
        assert_eq!(
            merge_pair(&Expr::symbol("x"), &Expr::symbol("x")),
            Some(Expr::pow(Expr::symbol("x"), Expr::int(2))),
        );
    }

    #[test]
    fn fractional_exponents_need_a_nonnegative_base() {
        let half = Expr::number(Number::fraction(1, 2));
        let sqrt_x = Expr::pow(Expr::symbol("x"), half.clone());

        // unconstrained x: sqrt(x)*sqrt(x) must not fold to x
        assert_eq!(merge_pair(&sqrt_x.clone(), &sqrt_x.clone()), None);

        // x assumed non-negative: the fold is licensed
        let ctx = ReductionContext::new();
        ctx.assumptions.assume("x", Assumptions::nonnegative());
        assert_eq!(
            merge_with(&sqrt_x.clone(), &sqrt_x, &ctx),
            Some(Expr::symbol("x")),
        );
    }

    #[test]
    fn sampling_gate_warns() {
        // (x - 1)^2 expanded: non-negative, but only the sampling heuristic can see it
        let base = Expr::add(vec![
            Expr::pow(Expr::symbol("x"), Expr::int(2)),
            Expr::mul(vec![Expr::int(-2), Expr::symbol("x")]),
            Expr::int(1),
        ]);
        let half = Expr::number(Number::fraction(1, 2));
        let sqrt = Expr::pow(base.clone(), half.clone());

        let ctx = ReductionContext::new();
        let result = merge_with(&sqrt.clone(), &sqrt, &ctx);
        assert_eq!(result, Some(base));
        assert!(!ctx.reporter.is_empty(), "the sampling gate must record a warning");
    }

    #[test]
    fn reciprocal_cancellation_respects_the_zero_gate() {
        // x * x^-1 = 1 only under the denominator assumption
        let x = Expr::symbol("x");
        let x_inv = Expr::pow(Expr::symbol("x"), Expr::int(-1));

        let ctx = ReductionContext::new();
        let result = merge_with(&x, &x_inv, &ctx).unwrap();
        assert_eq!(result, Expr::int(1));
        assert!(!ctx.reporter.is_empty(), "warn policy must record the assumption");

        let mut l = x.clone();
        let mut r = x_inv.clone();
        let strict = EvaluationOptions {
            nonzero_denominators: DenominatorAssumption::Off,
            ..EvaluationOptions::default()
        };
        assert_eq!(
            merge(&mut l, &mut r, &ReductionContext::new(), &strict),
            MergeOutcome::NoMerge,
        );
    }

    #[test]
    fn tan_times_cos_is_sin() {
        let tan = Expr::call("tan", vec![Expr::symbol("x")]);
        let cos = Expr::call("cos", vec![Expr::symbol("x")]);
        assert_eq!(
            merge_pair(&tan, &cos),
            Some(Expr::call("sin", vec![Expr::symbol("x")])),
        );
    }

    #[test]
    fn sgn_abs_absorption() {
        let sgn = Expr::call("sgn", vec![Expr::symbol("x")]);
        let abs = Expr::call("abs", vec![Expr::symbol("x")]);
        assert_eq!(merge_pair(&sgn, &abs), Some(Expr::symbol("x")));
    }

    #[test]
    fn polynomial_quotient_cancels() {
        // (x^2 - 1) * (x - 1)^-1 = x + 1
        let numerator = Expr::add(vec![
            Expr::pow(Expr::symbol("x"), Expr::int(2)),
            Expr::int(-1),
        ]);
        let denominator = Expr::pow(
            Expr::add(vec![Expr::symbol("x"), Expr::int(-1)]),
            Expr::int(-1),
        );
        let result = merge_pair(&numerator, &denominator).unwrap();
        assert_eq!(result, Expr::add(vec![Expr::int(1), Expr::symbol("x")]));
    }

    #[test]
    fn matrix_dimension_mismatch_is_reported() {
        let a = Expr::new(ExprKind::Matrix(vec![
            vec![Expr::int(1), Expr::int(2)],
        ]));
        let b = Expr::new(ExprKind::Matrix(vec![
            vec![Expr::int(3), Expr::int(4)],
        ]));

        let ctx = ReductionContext::new();
        assert_eq!(merge_with(&a, &b, &ctx), None);
        assert!(ctx.reporter.has_errors());
    }

    #[test]
    fn matrix_product() {
        // [[1, 2]] * [[3], [4]] = [[11]]
        let a = Expr::new(ExprKind::Matrix(vec![vec![Expr::int(1), Expr::int(2)]]));
        let b = Expr::new(ExprKind::Matrix(vec![vec![Expr::int(3)], vec![Expr::int(4)]]));
        let result = merge_pair(&a, &b).unwrap();
        assert_eq!(result, Expr::new(ExprKind::Matrix(vec![vec![Expr::int(11)]])));
    }

    #[test]
    fn zero_annihilates_finite_factors() {
        let result = merge_pair(&Expr::int(0), &Expr::symbol("x")).unwrap();
        assert_eq!(result, Expr::int(0));

        // but not infinity
        let inf = Expr::number(Number::Infinity(calc_num::InfSign::Pos));
        assert_eq!(merge_pair(&Expr::int(0), &inf), None);
    }

    #[test]
    fn infinity_needs_a_proven_sign() {
        let inf = Expr::number(Number::Infinity(calc_num::InfSign::Pos));
        assert_eq!(merge_pair(&inf, &Expr::symbol("x")), None);

        let ctx = ReductionContext::new();
        ctx.assumptions.assume("x", Assumptions::negative());
        assert_eq!(
            merge_with(&inf, &Expr::symbol("x"), &ctx),
            Some(Expr::number(Number::Infinity(calc_num::InfSign::Neg))),
        );
    }
}
