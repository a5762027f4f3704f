//! The merge operator for powers.
//!
//! A power node always has exactly two operands. On a successful merge the result is written
//! into the base slot and the driver collapses the node onto it. Numeric bases go through the
//! Number capability first, then a ladder of retry strategies: exact fractional roots, bounded
//! small-prime partial root extraction (`12^(1/2) = 2 * 3^(1/2)`), and finally approximation
//! when the policy allows it.

use calc_num::primitive::{int, rat};
use calc_num::{Number, Sign};
use rug::ops::Pow;
use rug::Integer;

use crate::assumptions::sign_of;
use crate::context::ReductionContext;
use crate::expr::{Expr, ExprKind};
use crate::options::{
    ApproximationMode, EvaluationOptions, ExpandMode, MAX_EXPANDED_TERMS,
};
use crate::polynomial::binomial_expand;
use crate::reduce::reduce;

use super::{number_result_allowed, represents_finite_real, MergeOutcome};

/// Attempts to fold `base ^ exponent`, writing the result into the base slot.
pub(crate) fn merge(
    base: &mut Expr,
    exponent: &mut Expr,
    ctx: &ReductionContext,
    opts: &EvaluationOptions,
) -> MergeOutcome {
    if base.is_undefined_like() || exponent.is_undefined_like() {
        return MergeOutcome::NoMerge;
    }

    if let Some(e) = exponent.as_number() {
        // u^1 = u
        if e.is_one() {
            base.absorb_flags(exponent);
            return MergeOutcome::MergedIntoLeft;
        }

        // u^0: 1, except for the indeterminate bases
        if e.is_zero() {
            if let Some(b) = base.as_number() {
                if b.is_zero() || b.is_infinite() {
                    ctx.reporter.error(format!("{}^0 is undefined", base));
                    return store(base, exponent, Expr::undefined());
                }
            }
            return store(base, exponent, Expr::int(1));
        }
    }

    // 1^u = 1 for finite real u
    if base.is_one_number() && represents_finite_real(exponent) {
        return store(base, exponent, Expr::int(1));
    }

    if let (Some(b), Some(e)) = (base.as_number(), exponent.as_number()) {
        return merge_numbers(b.clone(), e.clone(), base, exponent, ctx, opts);
    }

    if let Some(result) = merge_structural(base, exponent, ctx, opts) {
        return store(base, exponent, result);
    }

    MergeOutcome::NoMerge
}

fn store(base: &mut Expr, exponent: &mut Expr, mut result: Expr) -> MergeOutcome {
    result.absorb_flags(base);
    result.absorb_flags(exponent);
    *base = result;
    MergeOutcome::MergedIntoLeft
}

/// Number base and exponent: the capability's pow, then the retry ladder.
fn merge_numbers(
    b: Number,
    e: Number,
    base: &mut Expr,
    exponent: &mut Expr,
    ctx: &ReductionContext,
    opts: &EvaluationOptions,
) -> MergeOutcome {
    // 0^negative divides by zero
    if b.is_zero() && matches!(e.sign(), Sign::Negative) {
        ctx.reporter.error("division by zero");
        return store(base, exponent, Expr::undefined());
    }

    if let Some(result) = b.checked_pow(&e, opts.allow_complex) {
        if number_result_allowed(&result, [&b, &e], opts) {
            return store(base, exponent, Expr::number(result));
        }
        return MergeOutcome::NoMerge;
    }

    // retry: pull perfect powers out of a fractional root
    if let Some(result) = partial_root(&b, &e) {
        let mut reduced = result;
        reduce(&mut reduced, ctx, opts);
        return store(base, exponent, reduced);
    }

    // retry: approximate when the policy allows it
    if opts.approximation == ApproximationMode::Approximate {
        if let Some(result) = b.pow_approx(&e, opts.allow_complex) {
            if number_result_allowed(&result, [&b, &e], opts) {
                return store(base, exponent, Expr::number(result));
            }
        }
    }

    // a real result does not exist and complex ones are not allowed
    if matches!(b.sign(), Sign::Negative) && !e.is_integer() && !opts.allow_complex {
        ctx.reporter.error(format!(
            "{}^{} has no real value and complex results are not allowed",
            b, e,
        ));
    }

    MergeOutcome::NoMerge
}

/// Bounded trial division; any residue above the bound stays as a single factor.
fn prime_factorization(mut n: Integer) -> Vec<(Integer, u32)> {
    const TRIAL_LIMIT: u32 = 1000;

    let mut factors = Vec::new();
    let mut i = int(2);
    while int(&i * &i) <= n && i <= TRIAL_LIMIT {
        let mut count = 0u32;
        while n.is_divisible(&i) {
            n /= &i;
            count += 1;
        }
        if count > 0 {
            factors.push((i.clone(), count));
        }
        i += 1;
    }
    if n != 1 {
        factors.push((n, 1));
    }
    factors
}

/// `12^(1/2) = 2 * 3^(1/2)`: extracts the perfect-power part of a positive rational base under
/// a fractional exponent. Returns [`None`] when nothing moves outside the root.
fn partial_root(b: &Number, e: &Number) -> Option<Expr> {
    let base = b.as_rational()?;
    let exp = e.as_rational()?;
    if exp.is_integer() || base.cmp0() != std::cmp::Ordering::Greater {
        return None;
    }
    let p = exp.numer().to_i64()?;
    let q = exp.denom().to_u32()?;
    if p < 1 || p > 64 || q < 2 {
        return None;
    }

    let mut outside = rat(1);
    let mut inside = rat(1);
    let mut split = |value: &Integer, invert: bool| {
        for (factor, count) in prime_factorization(value.clone()) {
            let total = count as i64 * p;
            let (whole, part) = (total / q as i64, (total % q as i64) as u32);
            let f = rat(factor);
            if whole > 0 {
                let piece = f.clone().pow(whole as u32);
                if invert {
                    outside /= piece;
                } else {
                    outside *= piece;
                }
            }
            if part > 0 {
                let piece = f.pow(part);
                if invert {
                    inside /= piece;
                } else {
                    inside *= piece;
                }
            }
        }
    };
    split(base.numer(), false);
    split(base.denom(), true);

    if outside == 1 {
        return None;
    }
    let root_exp = Expr::number(Number::Rational(rat((int(1), int(q)))));
    let outside = Expr::number(Number::Rational(outside));
    if inside == 1 {
        Some(outside)
    } else {
        Some(Expr::mul(vec![
            outside,
            Expr::pow(Expr::number(Number::Rational(inside)), root_exp),
        ]))
    }
}

/// The structural power rules: nested powers, distribution over products, binomial expansion,
/// addition-exponent splitting, and abs absorption.
fn merge_structural(
    base: &Expr,
    exponent: &Expr,
    ctx: &ReductionContext,
    opts: &EvaluationOptions,
) -> Option<Expr> {
    let integer_exp = exponent.as_integer();

    // (u^a)^b = u^(a*b) for integer b, or for u proven non-negative
    if let ExprKind::Pow(inner_base, inner_exp) = &base.kind {
        let licensed = integer_exp.is_some()
            || sign_of(inner_base, &ctx.assumptions).is_nonnegative();
        if licensed {
            let mut combined = Expr::mul(vec![(**inner_exp).clone(), exponent.clone()]);
            reduce(&mut combined, ctx, opts);
            let mut result = Expr::pow((**inner_base).clone(), combined);
            reduce(&mut result, ctx, opts);
            return Some(result);
        }
        return None;
    }

    // abs(u)^(2k) = u^(2k)
    if let ExprKind::Function(name, args) = &base.kind {
        if name == "abs" && args.len() == 1 {
            if let Some(n) = exponent.as_number() {
                if n.is_even() {
                    return Some(Expr::pow(args[0].clone(), exponent.clone()));
                }
            }
        }
        return None;
    }

    if opts.expand == ExpandMode::Off {
        return None;
    }

    // (a*b)^n = a^n * b^n for integer n
    if let (ExprKind::Mul(factors), Some(_)) = (&base.kind, &integer_exp) {
        let distributed = factors
            .iter()
            .map(|factor| Expr::pow(factor.clone(), exponent.clone()))
            .collect::<Vec<_>>();
        let mut result = Expr::mul(distributed);
        reduce(&mut result, ctx, opts);
        return Some(result);
    }

    // (a + b)^n by the binomial theorem, within the term budget
    if let ExprKind::Add(terms) = &base.kind {
        let n = integer_exp?.to_u32()?;
        if n < 2 || !expansion_fits(n, terms.len()) {
            return None;
        }
        let mut result = if terms.len() == 2 {
            binomial_expand(&terms[0], &terms[1], n)
        } else {
            // multinomial via repeated distribution
            let mut acc = terms.clone();
            for _ in 1..n {
                acc = distribute_product(&acc, terms);
            }
            Expr::add(acc)
        };
        reduce(&mut result, ctx, opts);
        return Some(result);
    }

    // u^(a + n) = u^n * u^a during expansion, for non-negative u
    if let ExprKind::Add(parts) = &exponent.kind {
        if sign_of(base, &ctx.assumptions).is_nonnegative() {
            if let Some(idx) = parts.iter().position(|p| p.as_integer().is_some()) {
                let numeric = parts[idx].clone();
                let rest = parts
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != idx)
                    .map(|(_, p)| p.clone())
                    .collect::<Vec<_>>();
                let mut result = Expr::mul(vec![
                    Expr::pow(base.clone(), numeric),
                    Expr::pow(base.clone(), Expr::new(ExprKind::Add(rest)).downgrade()),
                ]);
                reduce(&mut result, ctx, opts);
                return Some(result);
            }
        }
    }

    None
}

/// Whether expanding a `k`-term sum to the `n`-th power stays within the term budget.
fn expansion_fits(n: u32, k: usize) -> bool {
    int(n as usize + k - 1)
        .binomial(k as u32 - 1)
        .to_usize()
        .map(|terms| terms <= MAX_EXPANDED_TERMS)
        .unwrap_or(false)
}

/// Multiplies out two sums into a flat list of product terms.
fn distribute_product(lhs: &[Expr], rhs: &[Expr]) -> Vec<Expr> {
    let mut terms = Vec::with_capacity(lhs.len() * rhs.len());
    for a in lhs {
        for b in rhs {
            terms.push(Expr::mul(vec![a.clone(), b.clone()]));
        }
    }
    terms
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn merge_pow(base: &Expr, exponent: &Expr) -> (Option<Expr>, ReductionContext) {
        let ctx = ReductionContext::new();
        let opts = EvaluationOptions::default();
        let mut b = base.clone();
        let mut e = exponent.clone();
        let result = match merge(&mut b, &mut e, &ctx, &opts) {
            MergeOutcome::MergedIntoLeft | MergeOutcome::MergedEqualNoChange => Some(b),
            MergeOutcome::MergedIntoRight => Some(e),
            _ => None,
        };
        (result, ctx)
    }

    #[test]
    fn exponent_one_and_zero() {
        let (result, _) = merge_pow(&Expr::symbol("x"), &Expr::int(1));
        assert_eq!(result, Some(Expr::symbol("x")));

        let (result, _) = merge_pow(&Expr::symbol("x"), &Expr::int(0));
        assert_eq!(result, Some(Expr::int(1)));
    }

    #[test]
    fn zero_to_the_zero_is_reported() {
        let (result, ctx) = merge_pow(&Expr::int(0), &Expr::int(0));
        assert_eq!(result, Some(Expr::undefined()));
        assert!(ctx.reporter.has_errors());
    }

    #[test]
    fn exact_integer_powers() {
        let (result, _) = merge_pow(&Expr::int(2), &Expr::int(10));
        assert_eq!(result, Some(Expr::int(1024)));

        let (result, _) = merge_pow(&Expr::int(2), &Expr::int(-2));
        assert_eq!(result, Some(Expr::number(Number::fraction(1, 4))));
    }

    #[test]
    fn exact_roots_fold() {
        let half = Expr::number(Number::fraction(1, 2));
        let (result, _) = merge_pow(&Expr::int(4), &half);
        assert_eq!(result, Some(Expr::int(2)));
    }

    #[test]
    fn partial_roots_extract_the_square_part() {
        // sqrt(12) = 2 * sqrt(3)
        let half = Expr::number(Number::fraction(1, 2));
        let (result, _) = merge_pow(&Expr::int(12), &half.clone());
        assert_eq!(
            result,
            Some(Expr::mul(vec![
                Expr::int(2),
                Expr::pow(Expr::int(3), half.clone()),
            ])),
        );

        // sqrt(2) stays symbolic under the exact-preferring default
        let (result, _) = merge_pow(&Expr::int(2), &half);
        assert_eq!(result, None);
    }

    #[test]
    fn nested_integer_powers_combine() {
        // (x^2)^3 = x^6
        let inner = Expr::pow(Expr::symbol("x"), Expr::int(2));
        let (result, _) = merge_pow(&inner, &Expr::int(3));
        assert_eq!(result, Some(Expr::pow(Expr::symbol("x"), Expr::int(6))));
    }

    #[test]
    fn nested_fractional_powers_are_gated() {
        // (x^2)^(1/2) must not fold to x for unconstrained x
        let inner = Expr::pow(Expr::symbol("x"), Expr::int(2));
        let half = Expr::number(Number::fraction(1, 2));
        let (result, _) = merge_pow(&inner, &half);
        assert_eq!(result, None);
    }

    #[test]
    fn binomial_expansion_within_budget() {
        // (x + 1)^2 = x^2 + 2x + 1
        let base = Expr::add(vec![Expr::symbol("x"), Expr::int(1)]);
        let (result, _) = merge_pow(&base, &Expr::int(2));
        let expanded = result.unwrap();
        assert_eq!(
            expanded,
            Expr::add(vec![
                Expr::pow(Expr::symbol("x"), Expr::int(2)),
                Expr::mul(vec![Expr::int(2), Expr::symbol("x")]),
                Expr::int(1),
            ]),
        );
    }

    #[test]
    fn oversized_expansions_stay_folded() {
        let base = Expr::add(vec![Expr::symbol("x"), Expr::int(1)]);
        let (result, _) = merge_pow(&base, &Expr::int(500));
        assert_eq!(result, None);
    }

    #[test]
    fn abs_of_even_power() {
        let base = Expr::call("abs", vec![Expr::symbol("x")]);
        let (result, _) = merge_pow(&base, &Expr::int(2));
        assert_eq!(result, Some(Expr::pow(Expr::symbol("x"), Expr::int(2))));
    }
}
