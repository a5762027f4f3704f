//! The merge operator for addition: numeric folding, like-term combining, Pythagorean
//! identities, date-time arithmetic, unit reconciliation, and fraction combination.

use calc_num::primitive::rat;
use calc_num::Number;
use once_cell::sync::Lazy;
use rug::ops::Pow;
use rug::Rational;
use std::collections::HashMap;

use crate::context::ReductionContext;
use crate::expr::{Expr, ExprKind};
use crate::options::EvaluationOptions;
use crate::reduce::reduce;

use super::{
    coefficient_join, coefficient_split, number_result_allowed, represents_finite_real,
    MergeOutcome,
};

/// Attempts to fold `left + right` into a single operand.
pub(crate) fn merge(
    left: &mut Expr,
    right: &mut Expr,
    ctx: &ReductionContext,
    opts: &EvaluationOptions,
) -> MergeOutcome {
    if left.is_undefined_like() || right.is_undefined_like() {
        return MergeOutcome::NoMerge;
    }

    // pure-number folding
    if let (Some(a), Some(b)) = (left.as_number(), right.as_number()) {
        return match a.checked_add(b) {
            Some(sum) if number_result_allowed(&sum, [a, b], opts) => {
                let mut result = Expr::number(sum);
                result.absorb_flags(left);
                result.absorb_flags(right);
                *left = result;
                MergeOutcome::MergedIntoLeft
            },
            // includes inf - inf, which must surface unmerged
            _ => MergeOutcome::NoMerge,
        };
    }

    // identity absorption
    if right.is_zero_number() {
        left.absorb_flags(right);
        return MergeOutcome::MergedIntoLeft;
    }
    if left.is_zero_number() {
        right.absorb_flags(left);
        return MergeOutcome::MergedIntoRight;
    }

    // inf + finite real = inf
    if left.as_number().map(Number::is_infinite).unwrap_or(false)
        && represents_finite_real(right)
    {
        left.absorb_flags(right);
        return MergeOutcome::MergedIntoLeft;
    }
    if right.as_number().map(Number::is_infinite).unwrap_or(false)
        && represents_finite_real(left)
    {
        right.absorb_flags(left);
        return MergeOutcome::MergedIntoRight;
    }

    if let Some(outcome) = merge_datetime(left, right) {
        return outcome;
    }

    if opts.sync_units {
        if let Some(result) = merge_units(left, right) {
            return store(left, right, result);
        }
    }

    // like terms: a*u + b*u = (a+b)*u
    let (c1, f1) = coefficient_split(left);
    let (c2, f2) = coefficient_split(right);
    if !f1.is_one_number() && f1 == f2 {
        if let Some(sum) = c1.checked_add(&c2) {
            let result = if sum.is_zero() {
                Expr::number(sum)
            } else {
                coefficient_join(sum, f1)
            };
            return store(left, right, result);
        }
    }

    if let Some(result) = pythagorean(left, right) {
        return store(left, right, result);
    }

    if let Some(result) = combine_fractions(left, right, ctx, opts) {
        return store(left, right, result);
    }

    MergeOutcome::NoMerge
}

/// Writes a merged result into the left operand, keeping both operands' attributes.
fn store(left: &mut Expr, right: &mut Expr, mut result: Expr) -> MergeOutcome {
    result.absorb_flags(left);
    result.absorb_flags(right);
    *left = result;
    MergeOutcome::MergedIntoLeft
}

/// Seconds per time unit, for date-time arithmetic.
static SECONDS_PER_UNIT: Lazy<HashMap<&'static str, Rational>> = Lazy::new(|| {
    HashMap::from([
        ("ms", rat((1, 1000))),
        ("s", rat(1)),
        ("min", rat(60)),
        ("h", rat(3600)),
        ("d", rat(86400)),
    ])
});

fn unit_seconds(name: &str) -> Option<Rational> {
    SECONDS_PER_UNIT.get(name).cloned()
}

/// If the term is a unit-typed duration (`Number * Unit` or a bare time unit), its length in
/// seconds.
fn duration_seconds(expr: &Expr) -> Option<Rational> {
    match &expr.kind {
        ExprKind::Unit { name, prefix: None } => unit_seconds(name),
        ExprKind::Mul(factors) if factors.len() == 2 => {
            let (scale, unit) = match (&factors[0].kind, &factors[1].kind) {
                (ExprKind::Number(n), ExprKind::Unit { name, prefix: None }) => (n, name),
                (ExprKind::Unit { name, prefix: None }, ExprKind::Number(n)) => (n, name),
                _ => return None,
            };
            Some(rat(scale.as_rational()? * &unit_seconds(unit)?))
        },
        _ => None,
    }
}

/// If the term is `-1 * DateTime`, the timestamp being subtracted.
fn negated_datetime(expr: &Expr) -> Option<i64> {
    if let ExprKind::Mul(factors) = &expr.kind {
        if let [a, b] = factors.as_slice() {
            if a.as_number().map(Number::is_minus_one).unwrap_or(false) {
                if let ExprKind::DateTime(t) = b.kind {
                    return Some(t);
                }
            }
        }
    }
    None
}

/// Date-time plus a duration shifts the timestamp; date-time minus date-time becomes a duration
/// in seconds.
fn merge_datetime(left: &mut Expr, right: &mut Expr) -> Option<MergeOutcome> {
    let ExprKind::DateTime(t) = &left.kind else {
        // the driver retries with the operands swapped
        if matches!(right.kind, ExprKind::DateTime(_)) {
            return Some(MergeOutcome::RetryWithOperandsSwapped);
        }
        return None;
    };
    let t = *t;

    if let Some(seconds) = duration_seconds(right) {
        // only merge shifts that land on a whole second
        if seconds.is_integer() {
            let shift = seconds.numer().to_i64()?;
            let result = Expr::new(ExprKind::DateTime(t.checked_add(shift)?));
            return Some(store(left, right, result));
        }
        return None;
    }

    if let Some(t2) = negated_datetime(right) {
        let delta = t.checked_sub(t2)?;
        let result = Expr::mul(vec![Expr::int(delta), Expr::unit("s")]);
        return Some(store(left, right, result));
    }

    None
}

/// Combines terms carrying the same unit under different metric prefixes, scaling to the smaller
/// prefix: `2 m + 3 10^-2 m = 203 10^-2 m`.
fn merge_units(left: &Expr, right: &Expr) -> Option<Expr> {
    let (c1, u1) = coefficient_split(left);
    let (c2, u2) = coefficient_split(right);
    let (ExprKind::Unit { name: n1, prefix: p1 }, ExprKind::Unit { name: n2, prefix: p2 }) =
        (&u1.kind, &u2.kind)
    else {
        return None;
    };
    if n1 != n2 {
        return None;
    }

    let (p1, p2) = (p1.unwrap_or(0), p2.unwrap_or(0));
    let target = p1.min(p2);
    let scaled = |c: Number, p: i32| -> Option<Number> {
        if p == target {
            Some(c)
        } else {
            c.checked_mul(&Number::Rational(rat(10).pow(p - target)))
        }
    };
    let sum = scaled(c1, p1)?.checked_add(&scaled(c2, p2)?)?;

    let unit = Expr::new(ExprKind::Unit {
        name: n1.clone(),
        prefix: (target != 0).then_some(target),
    });
    Some(coefficient_join(sum, unit))
}

/// If the term is `c * f(u)^2` for a trigonometric or hyperbolic `f`, returns the coefficient,
/// the function name, and the argument.
fn trig_square(expr: &Expr) -> Option<(Number, String, Expr)> {
    let (coefficient, rest) = coefficient_split(expr);
    let ExprKind::Pow(base, exp) = &rest.kind else { return None };
    if exp.as_integer()? != 2 {
        return None;
    }
    let ExprKind::Function(name, args) = &base.kind else { return None };
    if !matches!(name.as_str(), "sin" | "cos" | "sinh" | "cosh") {
        return None;
    }
    let [arg] = args.as_slice() else { return None };
    Some((coefficient, name.clone(), arg.clone()))
}

/// Pythagorean folding: `sin^2 u + cos^2 u = 1`, `sinh^2 u - cosh^2 u = -1`, and the
/// single-term variants `n - n*sin^2 u = n*cos^2 u` (and friends).
fn pythagorean(left: &Expr, right: &Expr) -> Option<Expr> {
    // two squared terms
    if let (Some((c1, f1, u1)), Some((c2, f2, u2))) = (trig_square(left), trig_square(right)) {
        if u1 != u2 {
            return None;
        }
        let (c1, f1, c2, f2) = if f1 <= f2 { (c1, f1, c2, f2) } else { (c2, f2, c1, f1) };
        return match (f1.as_str(), f2.as_str()) {
            // a*sin^2 + a*cos^2 = a
            ("cos", "sin") if c1 == c2 => Some(Expr::number(c1)),
            // a*sinh^2 - a*cosh^2 = -a
            ("cosh", "sinh") if c2 == -c1.clone() => Some(Expr::number(c2)),
            _ => None,
        };
    }

    // a number plus one squared term
    let (n, square) = if let Some(n) = left.as_number() {
        (n.clone(), trig_square(right)?)
    } else if let Some(n) = right.as_number() {
        (n.clone(), trig_square(left)?)
    } else {
        return None;
    };
    let (c, f, u) = square;

    let squared = |name: &str| Expr::pow(Expr::call(name, vec![u.clone()]), Expr::int(2));
    match f.as_str() {
        // n - n*sin^2 u = n*cos^2 u
        "sin" if c == -n.clone() => Some(coefficient_join(n, squared("cos"))),
        // n - n*cos^2 u = n*sin^2 u
        "cos" if c == -n.clone() => Some(coefficient_join(n, squared("sin"))),
        // n + n*sinh^2 u = n*cosh^2 u
        "sinh" if c == n => Some(coefficient_join(n, squared("cosh"))),
        // n - n*cosh^2 u = -n*sinh^2 u
        "cosh" if c == -n.clone() => Some(coefficient_join(-n, squared("sinh"))),
        _ => None,
    }
}

/// If the term divides by something, returns `(numerator part, divisor)`.
fn split_divisor(expr: &Expr) -> Option<(Expr, Expr)> {
    fn divisor_of(expr: &Expr) -> Option<Expr> {
        let ExprKind::Pow(base, exp) = &expr.kind else { return None };
        let e = exp.as_number()?;
        if !e.is_integer() || !matches!(e.sign(), calc_num::Sign::Negative) {
            return None;
        }
        Some(if e.is_minus_one() {
            (**base).clone()
        } else {
            Expr::pow((**base).clone(), Expr::number(-e.clone()))
        })
    }

    match &expr.kind {
        ExprKind::Pow(..) => divisor_of(expr).map(|d| (Expr::int(1), d)),
        ExprKind::Mul(factors) => {
            let idx = factors.iter().position(|f| divisor_of(f).is_some())?;
            let divisor = divisor_of(&factors[idx]).unwrap();
            let rest = factors
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != idx)
                .map(|(_, f)| f.clone())
                .collect::<Vec<_>>();
            Some((Expr::new(ExprKind::Mul(rest)).downgrade(), divisor))
        },
        _ => None,
    }
}

/// Combines reciprocal terms: always over a shared divisor (`a/c + b/c = (a+b)/c`), and across
/// distinct denominators when `combine_divisions` is set.
fn combine_fractions(
    left: &Expr,
    right: &Expr,
    ctx: &ReductionContext,
    opts: &EvaluationOptions,
) -> Option<Expr> {
    let (r1, d1) = split_divisor(left)?;
    let (r2, d2) = split_divisor(right)?;

    if d1 == d2 {
        let mut combined = Expr::fraction(Expr::add(vec![r1, r2]), d1);
        reduce(&mut combined, ctx, opts);
        return Some(combined);
    }

    if !opts.combine_divisions {
        return None;
    }

    // (r1/d1) + (r2/d2) = (r1*d2 + r2*d1) / (d1*d2)
    let numerator = Expr::add(vec![
        Expr::mul(vec![r1, d2.clone()]),
        Expr::mul(vec![r2, d1.clone()]),
    ]);
    let mut combined = Expr::fraction(numerator, Expr::mul(vec![d1, d2]));
    reduce(&mut combined, ctx, opts);

    // refuse combinations that ballooned instead of simplifying
    if combined.node_count() > left.node_count() + right.node_count() + 8 {
        return None;
    }
    Some(combined)
}
