//! The limit engine: substitution, indeterminate-form resolution, growth comparison, and
//! L'Hôpital's rule.
//!
//! The entry point substitutes an approach marker (a variable carrying sign assumptions derived
//! from the limit point and direction) for the target variable, reduces, and then resolves the
//! tree structurally: sums and products evaluate their parts' limits, ratios classify into the
//! indeterminate forms, and the forms fall back to algebraic restructuring, growth comparison,
//! and finally differentiation — depth-limited and node-budgeted. An unresolvable limit is a
//! plain [`None`]; the caller keeps its original expression.

use calc_num::{InfSign, Number, Sign};

use crate::assumptions::{sign_of, Assumptions};
use crate::context::ReductionContext;
use crate::derivative::derivative;
use crate::expr::{Expr, ExprKind};
use crate::options::{EvaluationOptions, ExpandMode};
use crate::polynomial::Poly;
use crate::reduce::reduce;
use crate::sample::{probe_sign_at_infinity, probe_sign_near};

use super::growth::growth;
use super::types::{Approach, LimitPoint, LimitQuery};

/// How many times L'Hôpital's rule may recurse before the computation reports failure.
const LHOPITAL_DEPTH: usize = 5;

/// The node-count budget guarding against runaway expression growth during resolution.
const NODE_BUDGET: usize = 512;

/// Computes the limit of `expr` as the query's variable approaches its point.
///
/// On success the returned tree is the limit value (the variable is gone). On failure the
/// caller keeps the original unevaluated expression; diagnostics recorded during the
/// speculative work are discarded.
pub fn limit(
    expr: &Expr,
    query: &LimitQuery,
    ctx: &ReductionContext,
    opts: &EvaluationOptions,
) -> Option<Expr> {
    // speculative sub-evaluation: probe outcomes without recording intermediate noise
    let _silence = ctx.reporter.silence();

    let mut scoped = opts.clone();
    scoped.allow_infinite = true;

    let marker = Expr::variable(query.variable.as_str(), approach_assumptions(query));
    let mut work = expr.clone();
    work.substitute_symbol(&query.variable, &marker);
    reduce(&mut work, ctx, &scoped);

    let result = limit_rec(&work, query, ctx, &scoped, 0)?;
    if result.contains_symbol(&query.variable) || !is_clean_limit(&result) {
        return None;
    }
    Some(result)
}

/// What is known about the marker variable near the limit point.
fn approach_assumptions(query: &LimitQuery) -> Assumptions {
    match &query.point {
        LimitPoint::PosInfinity => Assumptions::positive(),
        LimitPoint::NegInfinity => Assumptions::negative(),
        LimitPoint::Finite(n) => match n.sign() {
            Sign::Positive => Assumptions::positive(),
            Sign::Negative => Assumptions::negative(),
            _ => match query.direction {
                Approach::Above => Assumptions::positive(),
                Approach::Below => Assumptions::negative(),
                Approach::Either => Assumptions::nonzero(),
            },
        },
    }
}

/// The value the variable is substituted with once a determinate result is reached.
fn point_expr(query: &LimitQuery) -> Expr {
    match &query.point {
        LimitPoint::Finite(n) => Expr::number(n.clone()),
        LimitPoint::PosInfinity => Expr::number(Number::Infinity(InfSign::Pos)),
        LimitPoint::NegInfinity => Expr::number(Number::Infinity(InfSign::Neg)),
    }
}

fn contains_undefined(expr: &Expr) -> bool {
    expr.post_order_iter().any(Expr::is_undefined_like)
}

/// A usable limit value: a plain number (finite or infinite), or a symbolic tree with no
/// infinity or undefined node buried inside it.
fn is_clean_limit(expr: &Expr) -> bool {
    if contains_undefined(expr) {
        return false;
    }
    if expr.is_number() {
        return true;
    }
    !expr
        .post_order_iter()
        .any(|node| node.as_number().map(Number::is_infinite).unwrap_or(false))
}

/// A classified limit value.
#[derive(Debug, Clone, PartialEq)]
enum Lim {
    Zero,
    Finite(Expr),
    PosInf,
    NegInf,
}

impl Lim {
    fn to_expr(&self) -> Expr {
        match self {
            Lim::Zero => Expr::int(0),
            Lim::Finite(e) => e.clone(),
            Lim::PosInf => Expr::number(Number::Infinity(InfSign::Pos)),
            Lim::NegInf => Expr::number(Number::Infinity(InfSign::Neg)),
        }
    }

    fn is_infinite(&self) -> bool {
        matches!(self, Lim::PosInf | Lim::NegInf)
    }
}

fn classify(value: Expr) -> Option<Lim> {
    if !is_clean_limit(&value) {
        return None;
    }
    if let Some(n) = value.as_number() {
        return Some(match n {
            Number::Infinity(InfSign::Pos) => Lim::PosInf,
            Number::Infinity(InfSign::Neg) => Lim::NegInf,
            n if n.is_zero() => Lim::Zero,
            _ => Lim::Finite(value.clone()),
        });
    }
    Some(Lim::Finite(value))
}

fn eval_limit(
    expr: &Expr,
    query: &LimitQuery,
    ctx: &ReductionContext,
    opts: &EvaluationOptions,
    depth: usize,
) -> Option<Lim> {
    limit_rec(expr, query, ctx, opts, depth).and_then(classify)
}

fn limit_rec(
    expr: &Expr,
    query: &LimitQuery,
    ctx: &ReductionContext,
    opts: &EvaluationOptions,
    depth: usize,
) -> Option<Expr> {
    if depth > LHOPITAL_DEPTH || expr.node_count() > NODE_BUDGET || ctx.is_aborted() {
        return None;
    }

    let var = query.variable.as_str();
    if !expr.contains_symbol(var) {
        return Some(expr.clone());
    }

    match &expr.kind {
        ExprKind::Symbol(_) | ExprKind::Variable(_) => Some(point_expr(query)),
        ExprKind::Add(terms) => limit_add(expr, terms, query, ctx, opts, depth),
        ExprKind::Mul(factors) => limit_mul(factors, query, ctx, opts, depth),
        ExprKind::Pow(base, exponent) => limit_pow(base, exponent, query, ctx, opts, depth),
        ExprKind::Function(name, args) => match args.as_slice() {
            [arg] => limit_function(name, arg, query, ctx, opts, depth),
            _ => substitute_and_reduce(expr, query, ctx, opts),
        },
        _ => substitute_and_reduce(expr, query, ctx, opts),
    }
}

/// Plain substitution of the limit point, for shapes with no indeterminate structure of their
/// own.
fn substitute_and_reduce(
    expr: &Expr,
    query: &LimitQuery,
    ctx: &ReductionContext,
    opts: &EvaluationOptions,
) -> Option<Expr> {
    let mut work = expr.clone();
    work.substitute_symbol(&query.variable, &point_expr(query));
    reduce(&mut work, ctx, opts);
    is_clean_limit(&work).then_some(work)
}

/// The sign of `expr` as the variable approaches the limit point from the queried side.
fn side_sign(expr: &Expr, query: &LimitQuery, ctx: &ReductionContext) -> Sign {
    // proven facts beat sampling
    let assumed = sign_of(expr, &ctx.assumptions);
    if assumed.is_nonzero() {
        return assumed;
    }

    let var = query.variable.as_str();
    match &query.point {
        LimitPoint::PosInfinity => probe_sign_at_infinity(expr, var, true),
        LimitPoint::NegInfinity => probe_sign_at_infinity(expr, var, false),
        LimitPoint::Finite(n) => {
            let Some(point) = n.to_float() else { return Sign::Unknown };
            match query.direction {
                Approach::Above => probe_sign_near(expr, var, &point, true),
                Approach::Below => probe_sign_near(expr, var, &point, false),
                Approach::Either => {
                    let above = probe_sign_near(expr, var, &point, true);
                    let below = probe_sign_near(expr, var, &point, false);
                    if above == below {
                        above
                    } else {
                        Sign::Unknown
                    }
                },
            }
        },
    }
}

fn infinity_with_sign(sign: Sign) -> Option<Expr> {
    match sign {
        Sign::Positive => Some(Expr::number(Number::Infinity(InfSign::Pos))),
        Sign::Negative => Some(Expr::number(Number::Infinity(InfSign::Neg))),
        _ => None,
    }
}

fn limit_add(
    whole: &Expr,
    terms: &[Expr],
    query: &LimitQuery,
    ctx: &ReductionContext,
    opts: &EvaluationOptions,
    depth: usize,
) -> Option<Expr> {
    let limits = terms
        .iter()
        .map(|term| eval_limit(term, query, ctx, opts, depth))
        .collect::<Vec<_>>();

    if limits.iter().all(Option::is_some) {
        let limits = limits.into_iter().map(Option::unwrap).collect::<Vec<_>>();
        let pos = limits.iter().filter(|l| **l == Lim::PosInf).count();
        let neg = limits.iter().filter(|l| **l == Lim::NegInf).count();

        if pos > 0 && neg == 0 {
            return Some(Expr::number(Number::Infinity(InfSign::Pos)));
        }
        if neg > 0 && pos == 0 {
            return Some(Expr::number(Number::Infinity(InfSign::Neg)));
        }
        if pos == 0 && neg == 0 {
            let mut sum = Expr::add(limits.iter().map(Lim::to_expr).collect());
            reduce(&mut sum, ctx, opts);
            return is_clean_limit(&sum).then_some(sum);
        }
        // inf - inf: fall through to restructuring
    }

    // a polynomial cannot oscillate: its leading term decides the sign at infinity
    if let Some(poly) = Poly::from_expr(whole, query.variable.as_str()) {
        if matches!(query.point, LimitPoint::PosInfinity | LimitPoint::NegInfinity) {
            if poly.degree() == 0 || poly.is_zero() {
                return Some(poly.to_expr());
            }
            let leading_negative =
                poly.leading().map(|c| c.cmp0() == std::cmp::Ordering::Less)?;
            let odd_degree = poly.degree() % 2 == 1;
            let from_below = matches!(query.point, LimitPoint::NegInfinity);
            let negative = leading_negative ^ (from_below && odd_degree);
            return Some(Expr::number(Number::Infinity(if negative {
                InfSign::Neg
            } else {
                InfSign::Pos
            })));
        }
    }

    // common-denominator restructuring for reciprocal terms
    let mut restructured = whole.clone();
    let combine_opts = EvaluationOptions {
        combine_divisions: true,
        expand: ExpandMode::SizeLimited,
        ..opts.clone()
    };
    reduce(&mut restructured, ctx, &combine_opts);
    if restructured != *whole {
        return limit_rec(&restructured, query, ctx, opts, depth + 1);
    }

    None
}

fn limit_mul(
    factors: &[Expr],
    query: &LimitQuery,
    ctx: &ReductionContext,
    opts: &EvaluationOptions,
    depth: usize,
) -> Option<Expr> {
    // split off reciprocal factors into an explicit denominator
    let mut numerator = Vec::new();
    let mut denominator = Vec::new();
    for factor in factors {
        let mut placed = false;
        if let ExprKind::Pow(base, exponent) = &factor.kind {
            if let Some(e) = exponent.as_number() {
                if e.is_integer() && e.sign() == Sign::Negative {
                    denominator.push(if e.is_minus_one() {
                        (**base).clone()
                    } else {
                        Expr::pow((**base).clone(), Expr::number(-e.clone()))
                    });
                    placed = true;
                }
            }
        }
        if !placed {
            numerator.push(factor.clone());
        }
    }

    if !denominator.is_empty() {
        let num = Expr::mul(numerator).downgrade();
        let den = Expr::mul(denominator).downgrade();
        return resolve_ratio(&num, &den, query, ctx, opts, depth);
    }

    // a plain product: combine the factor limits
    let mut zero_factors = Vec::new();
    let mut inf_factors = Vec::new();
    let mut finite_values = Vec::new();
    let mut inf_sign = InfSign::Pos;
    for factor in factors {
        match eval_limit(factor, query, ctx, opts, depth)? {
            Lim::Zero => zero_factors.push(factor.clone()),
            Lim::PosInf => inf_factors.push(factor.clone()),
            Lim::NegInf => {
                inf_factors.push(factor.clone());
                inf_sign = inf_sign.flip();
            },
            Lim::Finite(value) => finite_values.push(value),
        }
    }

    if !inf_factors.is_empty() && !zero_factors.is_empty() {
        // 0 * inf: move the vanishing factor below the line, turning the product into an
        // inf/inf ratio that growth comparison or one L'Hopital step can settle
        let num = Expr::mul(inf_factors.into_iter().chain(finite_values).collect());
        let den = Expr::pow(Expr::mul(zero_factors), Expr::int(-1));
        return resolve_ratio(&num, &den, query, ctx, opts, depth);
    }

    if !inf_factors.is_empty() {
        // the finite factors' signs orient the infinity
        let mut sign = match inf_sign {
            InfSign::Pos => Sign::Positive,
            InfSign::Neg => Sign::Negative,
        };
        for value in &finite_values {
            sign = sign.mul(sign_of(value, &ctx.assumptions));
        }
        return infinity_with_sign(sign);
    }

    let mut product = Expr::mul(
        zero_factors
            .iter()
            .map(|_| Expr::int(0))
            .chain(finite_values.into_iter())
            .collect(),
    );
    reduce(&mut product, ctx, opts);
    is_clean_limit(&product).then_some(product)
}

/// The classified indeterminate ratio forms.
fn resolve_ratio(
    num: &Expr,
    den: &Expr,
    query: &LimitQuery,
    ctx: &ReductionContext,
    opts: &EvaluationOptions,
    depth: usize,
) -> Option<Expr> {
    let ln = eval_limit(num, query, ctx, opts, depth)?;
    let ld = eval_limit(den, query, ctx, opts, depth)?;

    match (&ln, &ld) {
        // the two genuinely indeterminate quotients
        (Lim::Zero, Lim::Zero) => indeterminate_ratio(num, den, query, ctx, opts, depth),
        (a, b) if a.is_infinite() && b.is_infinite() => {
            indeterminate_ratio(num, den, query, ctx, opts, depth)
        },

        // finite / 0 diverges with the denominator's approach sign
        (Lim::Finite(value), Lim::Zero) => {
            let value_sign = sign_of(value, &ctx.assumptions);
            let den_sign = side_sign(den, query, ctx);
            infinity_with_sign(value_sign.mul(den_sign))
        },
        (inf, Lim::Zero) => {
            let den_sign = side_sign(den, query, ctx);
            let inf_sign = if *inf == Lim::PosInf { Sign::Positive } else { Sign::Negative };
            infinity_with_sign(inf_sign.mul(den_sign))
        },

        // a vanishing or finite numerator over an infinite denominator
        (Lim::Zero, _) | (Lim::Finite(_), _) if ld.is_infinite() => Some(Expr::int(0)),
        (Lim::Zero, Lim::Finite(_)) => {
            // 0 over a finite value; the value may still be symbolic, in which case the
            // quotient only vanishes if the denominator is non-zero
            let value = ld.to_expr();
            if sign_of(&value, &ctx.assumptions).is_nonzero() || value.is_number() {
                Some(Expr::int(0))
            } else {
                None
            }
        },
        (inf, Lim::Finite(value)) if inf.is_infinite() => {
            let inf_sign = if *inf == Lim::PosInf { Sign::Positive } else { Sign::Negative };
            infinity_with_sign(inf_sign.mul(sign_of(value, &ctx.assumptions)))
        },

        (Lim::Finite(a), Lim::Finite(b)) => {
            let mut quotient = Expr::fraction(a.clone(), b.clone());
            reduce(&mut quotient, ctx, opts);
            is_clean_limit(&quotient).then_some(quotient)
        },
        _ => None,
    }
}

/// Resolves `0/0` and `inf/inf`: growth comparison at an infinite point, then L'Hôpital.
fn indeterminate_ratio(
    num: &Expr,
    den: &Expr,
    query: &LimitQuery,
    ctx: &ReductionContext,
    opts: &EvaluationOptions,
    depth: usize,
) -> Option<Expr> {
    let var = query.variable.as_str();

    if matches!(query.point, LimitPoint::PosInfinity | LimitPoint::NegInfinity) {
        let positive = matches!(query.point, LimitPoint::PosInfinity);
        if let (Some(gn), Some(gd)) = (growth(num, var, positive), growth(den, var, positive)) {
            match gn.dominance(&gd) {
                std::cmp::Ordering::Less => return Some(Expr::int(0)),
                std::cmp::Ordering::Greater => {
                    let ratio = Expr::fraction(num.clone(), den.clone());
                    return infinity_with_sign(side_sign(&ratio, query, ctx));
                },
                std::cmp::Ordering::Equal => {},
            }
        }
    }

    // L'Hôpital: differentiate the dominant pair and recurse
    let num_derivative = derivative(num, var).ok()?;
    let den_derivative = derivative(den, var).ok()?;
    let mut ratio = Expr::fraction(num_derivative, den_derivative);
    reduce(&mut ratio, ctx, opts);
    limit_rec(&ratio, query, ctx, opts, depth + 1)
}

fn limit_pow(
    base: &Expr,
    exponent: &Expr,
    query: &LimitQuery,
    ctx: &ReductionContext,
    opts: &EvaluationOptions,
    depth: usize,
) -> Option<Expr> {
    let lb = eval_limit(base, query, ctx, opts, depth)?;
    let le = eval_limit(exponent, query, ctx, opts, depth)?;

    // 0^negative: the reciprocal diverges with the base's approach sign
    if lb == Lim::Zero {
        if let Lim::Finite(value) = &le {
            if let Some(e) = value.as_number() {
                if e.sign() == Sign::Negative {
                    let base_sign = side_sign(base, query, ctx);
                    if e.is_odd() {
                        return infinity_with_sign(base_sign);
                    }
                    if e.is_even() {
                        // an even reciprocal power diverges upward from either side
                        return match base_sign {
                            Sign::Zero | Sign::Unknown => None,
                            _ => infinity_with_sign(Sign::Positive),
                        };
                    }
                    // fractional: only a positive approach has a real value
                    return match base_sign {
                        Sign::Positive => infinity_with_sign(Sign::Positive),
                        _ => None,
                    };
                }
            }
        }
    }

    // 0^0, inf^0, 1^inf: resolve through exp(exponent * ln(base))
    let one = |l: &Lim| matches!(l, Lim::Finite(v) if v.is_one_number());
    let indeterminate = matches!((&lb, &le), (Lim::Zero, Lim::Zero))
        || (lb.is_infinite() && le == Lim::Zero)
        || (one(&lb) && le.is_infinite());
    if indeterminate {
        let log_limit = Expr::mul(vec![
            exponent.clone(),
            Expr::call("ln", vec![base.clone()]),
        ]);
        return match eval_limit(&log_limit, query, ctx, opts, depth + 1)? {
            Lim::Zero => Some(Expr::int(1)),
            Lim::PosInf => Some(Expr::number(Number::Infinity(InfSign::Pos))),
            Lim::NegInf => Some(Expr::int(0)),
            Lim::Finite(value) => {
                let mut result = Expr::pow(Expr::symbol("e"), value);
                reduce(&mut result, ctx, opts);
                is_clean_limit(&result).then_some(result)
            },
        };
    }

    let mut combined = Expr::pow(lb.to_expr(), le.to_expr());
    reduce(&mut combined, ctx, opts);
    is_clean_limit(&combined).then_some(combined)
}

fn limit_function(
    name: &str,
    arg: &Expr,
    query: &LimitQuery,
    ctx: &ReductionContext,
    opts: &EvaluationOptions,
    depth: usize,
) -> Option<Expr> {
    let la = eval_limit(arg, query, ctx, opts, depth)?;

    // oscillating functions have no limit at infinity
    if la.is_infinite() && matches!(name, "sin" | "cos" | "tan") {
        return None;
    }

    // ln towards zero falls off the left edge of the domain
    if name == "ln" && la == Lim::Zero {
        return match side_sign(arg, query, ctx) {
            Sign::Positive => Some(Expr::number(Number::Infinity(InfSign::Neg))),
            _ => None,
        };
    }

    // continuity elsewhere: apply the function to the argument's limit
    let mut result = Expr::call(name, vec![la.to_expr()]);
    reduce(&mut result, ctx, opts);
    is_clean_limit(&result).then_some(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run_limit(expr: &Expr, query: &LimitQuery) -> Option<Expr> {
        let ctx = ReductionContext::new();
        let opts = EvaluationOptions::default();
        limit(expr, query, &ctx, &opts)
    }

    fn x() -> Expr {
        Expr::symbol("x")
    }

    #[test]
    fn one_over_x_at_infinity_vanishes() {
        let expr = Expr::fraction(Expr::int(1), x());
        let result = run_limit(&expr, &LimitQuery::at_pos_infinity("x"));
        assert_eq!(result, Some(Expr::int(0)));
    }

    #[test]
    fn polynomials_diverge_with_their_leading_term() {
        // x^2 - x at +inf
        let expr = Expr::add(vec![
            Expr::pow(x(), Expr::int(2)),
            Expr::mul(vec![Expr::int(-1), x()]),
        ]);
        let result = run_limit(&expr, &LimitQuery::at_pos_infinity("x"));
        assert_eq!(result, Some(Expr::number(Number::Infinity(InfSign::Pos))));

        // x^3 at -inf
        let cubic = Expr::pow(x(), Expr::int(3));
        let result = run_limit(&cubic, &LimitQuery::at_neg_infinity("x"));
        assert_eq!(result, Some(Expr::number(Number::Infinity(InfSign::Neg))));
    }

    #[test]
    fn rational_function_at_a_shared_root() {
        // (x - 1)/(x^2 - 1) at x = 1 is 1/2
        let expr = Expr::fraction(
            Expr::add(vec![x(), Expr::int(-1)]),
            Expr::add(vec![Expr::pow(x(), Expr::int(2)), Expr::int(-1)]),
        );
        let result = run_limit(&expr, &LimitQuery::at("x", 1));
        assert_eq!(result, Some(Expr::number(Number::fraction(1, 2))));
    }

    #[test]
    fn sin_x_over_x_is_one() {
        let expr = Expr::fraction(Expr::call("sin", vec![x()]), x());
        let result = run_limit(&expr, &LimitQuery::at("x", 0));
        assert_eq!(result, Some(Expr::int(1)));
    }

    #[test]
    fn one_over_x_at_zero_two_sided_fails() {
        let expr = Expr::fraction(Expr::int(1), x());
        assert_eq!(run_limit(&expr, &LimitQuery::at("x", 0)), None);
    }

    #[test]
    fn one_over_x_from_above_diverges_positively() {
        let expr = Expr::fraction(Expr::int(1), x());
        let result = run_limit(&expr, &LimitQuery::at("x", 0).from(Approach::Above));
        assert_eq!(result, Some(Expr::number(Number::Infinity(InfSign::Pos))));

        let result = run_limit(&expr, &LimitQuery::at("x", 0).from(Approach::Below));
        assert_eq!(result, Some(Expr::number(Number::Infinity(InfSign::Neg))));
    }

    #[test]
    fn log_over_linear_uses_growth_comparison() {
        // ln(x)/x at +inf
        let expr = Expr::fraction(Expr::call("ln", vec![x()]), x());
        let result = run_limit(&expr, &LimitQuery::at_pos_infinity("x"));
        assert_eq!(result, Some(Expr::int(0)));
    }

    #[test]
    fn exponential_dominates_powers() {
        // x^10 / 2^x at +inf
        let expr = Expr::fraction(
            Expr::pow(x(), Expr::int(10)),
            Expr::pow(Expr::int(2), x()),
        );
        let result = run_limit(&expr, &LimitQuery::at_pos_infinity("x"));
        assert_eq!(result, Some(Expr::int(0)));
    }

    #[test]
    fn oscillation_at_infinity_fails() {
        let expr = Expr::call("sin", vec![x()]);
        assert_eq!(run_limit(&expr, &LimitQuery::at_pos_infinity("x")), None);
    }

    #[test]
    fn continuity_substitutes_the_point() {
        // sin(x) at pi/2's rational stand-in: just check continuity at 0 and a constant
        let expr = Expr::call("cos", vec![x()]);
        let result = run_limit(&expr, &LimitQuery::at("x", 0));
        assert_eq!(result, Some(Expr::int(1)));
    }

    #[test]
    fn ln_towards_zero_from_above() {
        let expr = Expr::call("ln", vec![x()]);
        let result = run_limit(&expr, &LimitQuery::at("x", 0).from(Approach::Above));
        assert_eq!(result, Some(Expr::number(Number::Infinity(InfSign::Neg))));
    }

    #[test]
    fn zero_to_the_zero_form_resolves_to_one() {
        // x^x at 0+ is 1
        let expr = Expr::pow(x(), x());
        let result = run_limit(&expr, &LimitQuery::at("x", 0).from(Approach::Above));
        assert_eq!(result, Some(Expr::int(1)));
    }

    #[test]
    fn failure_keeps_nothing() {
        // sin(x)/cos(x) at infinity: no limit, plain None
        let expr = Expr::fraction(
            Expr::call("sin", vec![x()]),
            Expr::call("cos", vec![x()]),
        );
        assert_eq!(run_limit(&expr, &LimitQuery::at_pos_infinity("x")), None);
    }
}
