//! Numeric point evaluation and randomized sign probing.
//!
//! Some rewrite gates need a sign fact that symbolic analysis cannot supply (is `x^2 - 2x + 1`
//! non-negative?). The probing here evaluates the expression at a fixed set of test points plus
//! a few seeded random ones and reports the sign pattern it saw. This is a heuristic, not a
//! proof: every rewrite it licenses also records a warning, and [`calc_num::Sign::Unknown`] is
//! returned at the first inconsistency or failed evaluation.

use calc_num::consts::{E, PI};
use calc_num::primitive::float;
use calc_num::Sign;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rug::{ops::Pow, Float};

use crate::expr::{Expr, ExprKind};

/// Fixed probe points, chosen away from common roots and poles.
const TEST_POINTS: [f64; 10] = [0.371, -0.371, 1.23, -1.23, 2.9, -2.9, 5.07, -5.07, 11.3, -11.3];

/// How many extra random probe points to draw.
const RANDOM_POINTS: usize = 6;

/// Seed for the probe-point generator; probing must be deterministic run to run.
const PROBE_SEED: u64 = 0x00ca1c;

/// Applies a named single-argument function numerically.
pub(crate) fn apply_fn(name: &str, x: Float) -> Option<Float> {
    let result = match name {
        "sin" => x.sin(),
        "cos" => x.cos(),
        "tan" => x.tan(),
        "sinh" => x.sinh(),
        "cosh" => x.cosh(),
        "tanh" => x.tanh(),
        "asin" => x.asin(),
        "acos" => x.acos(),
        "atan" => x.atan(),
        "ln" => x.ln(),
        "log" => x.log10(),
        "exp" => x.exp(),
        "sqrt" => x.sqrt(),
        "abs" => x.abs(),
        "gamma" => x.gamma(),
        "sgn" => {
            return Some(if x.is_zero() {
                float(0)
            } else if x.is_sign_negative() {
                float(-1)
            } else {
                float(1)
            });
        },
        _ => return None,
    };
    finite(result)
}

fn finite(f: Float) -> Option<Float> {
    (!f.is_nan() && !f.is_infinite()).then_some(f)
}

/// Evaluates the expression at `var = x`, returning [`None`] when any sub-expression cannot be
/// evaluated numerically (unknown symbols, non-arithmetic kinds, domain errors).
pub(crate) fn eval_point(expr: &Expr, var: &str, x: &Float) -> Option<Float> {
    match &expr.kind {
        ExprKind::Number(n) => n.to_float(),
        ExprKind::Symbol(name) => match name.as_str() {
            _ if name == var => Some(x.clone()),
            "pi" => Some(PI.clone()),
            "e" => Some(E.clone()),
            _ => None,
        },
        ExprKind::Variable(v) if v.name == var => Some(x.clone()),
        ExprKind::Add(terms) => {
            let mut sum = float(0);
            for term in terms {
                sum += eval_point(term, var, x)?;
            }
            finite(sum)
        },
        ExprKind::Mul(factors) => {
            let mut product = float(1);
            for factor in factors {
                product *= eval_point(factor, var, x)?;
            }
            finite(product)
        },
        ExprKind::Pow(base, exp) => {
            let b = eval_point(base, var, x)?;
            let e = eval_point(exp, var, x)?;
            finite(b.pow(e))
        },
        ExprKind::Function(name, args) => {
            if args.len() != 1 {
                return None;
            }
            apply_fn(name, eval_point(&args[0], var, x)?)
        },
        _ => None,
    }
}

/// Folds a sequence of observed sample values into a sign verdict.
fn observe(samples: impl Iterator<Item = Option<Float>>) -> Sign {
    let mut any = false;
    let mut saw_zero = false;
    let mut all_nonneg = true;
    let mut all_nonpos = true;

    for sample in samples {
        let Some(value) = sample else { return Sign::Unknown };
        any = true;
        if value.is_zero() {
            saw_zero = true;
        } else if value.is_sign_negative() {
            all_nonneg = false;
        } else {
            all_nonpos = false;
        }
    }

    match (any, all_nonneg, all_nonpos) {
        (false, ..) => Sign::Unknown,
        (true, true, true) => Sign::Zero,
        (true, true, false) if saw_zero => Sign::NonNegative,
        (true, true, false) => Sign::Positive,
        (true, false, true) if saw_zero => Sign::NonPositive,
        (true, false, true) => Sign::Negative,
        _ => Sign::Unknown,
    }
}

/// Probes the sign of `expr` as a function of `var` across the default sample domain.
pub(crate) fn probe_sign(expr: &Expr, var: &str) -> Sign {
    let mut rng = StdRng::seed_from_u64(PROBE_SEED);
    let points = TEST_POINTS
        .iter()
        .copied()
        .chain((0..RANDOM_POINTS).map(|_| rng.gen_range(-40.0..40.0)))
        .collect::<Vec<_>>();

    observe(points.into_iter().map(|p| eval_point(expr, var, &float(p))))
}

/// Probes the sign of `expr` as `var` approaches `point` from one side.
pub(crate) fn probe_sign_near(expr: &Expr, var: &str, point: &Float, from_above: bool) -> Sign {
    let steps = [1e-2, 1e-4, 1e-6, 1e-8];
    observe(steps.iter().map(|eps| {
        let offset = if from_above { float(*eps) } else { float(-*eps) };
        eval_point(expr, var, &(float(point) + offset))
    }))
}

/// Probes the sign of `expr` as `var` grows towards plus or minus infinity.
pub(crate) fn probe_sign_at_infinity(expr: &Expr, var: &str, positive: bool) -> Sign {
    let magnitudes = [1e2, 1e4, 1e6, 1e8];
    observe(magnitudes.iter().map(|m| {
        let x = if positive { float(*m) } else { float(-*m) };
        eval_point(expr, var, &x)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluates_polynomials() {
        // x^2 + 1 at x = 3
        let expr = Expr::add(vec![
            Expr::pow(Expr::symbol("x"), Expr::int(2)),
            Expr::int(1),
        ]);
        let value = eval_point(&expr, "x", &float(3)).unwrap();
        assert_eq!(value, 10);
    }

    #[test]
    fn square_probes_nonnegative() {
        let squared = Expr::pow(Expr::symbol("x"), Expr::int(2));
        assert_eq!(probe_sign(&squared, "x"), Sign::Positive);

        // x^2 + 1 > 0 everywhere
        let shifted = Expr::add(vec![
            Expr::pow(Expr::symbol("x"), Expr::int(2)),
            Expr::int(1),
        ]);
        assert_eq!(probe_sign(&shifted, "x"), Sign::Positive);
    }

    #[test]
    fn odd_powers_probe_unknown() {
        let cubed = Expr::pow(Expr::symbol("x"), Expr::int(3));
        assert_eq!(probe_sign(&cubed, "x"), Sign::Unknown);
    }

    #[test]
    fn one_sided_probe_sees_the_side() {
        // 1/x near 0
        let recip = Expr::pow(Expr::symbol("x"), Expr::int(-1));
        assert_eq!(probe_sign_near(&recip, "x", &float(0), true), Sign::Positive);
        assert_eq!(probe_sign_near(&recip, "x", &float(0), false), Sign::Negative);
    }

    #[test]
    fn unknown_symbols_fail_cleanly() {
        let expr = Expr::mul(vec![Expr::symbol("x"), Expr::symbol("y")]);
        assert_eq!(eval_point(&expr, "x", &float(1)), None);
        assert_eq!(probe_sign(&expr, "x"), Sign::Unknown);
    }
}
