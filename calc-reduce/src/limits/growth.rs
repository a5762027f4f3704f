//! Asymptotic growth comparison.
//!
//! When two competing factors both run off to infinity (or collapse to zero), their *growth
//! classes* decide which one dominates without differentiating anything: logarithms grow slower
//! than powers of the variable, powers slower than exponentials whose exponent depends on the
//! variable, and everything slower than the Gamma function. A product's class accumulates the
//! classes of its factors, so `x^2 * ln x` sits strictly between `x^2` and `x^3`. Counts are
//! signed: `2^(-x)` is an exponential *decay*, dominated by any growing power.

use calc_num::primitive::rat;
use calc_num::Sign;
use rug::Rational;
use std::cmp::Ordering;

use crate::expr::{Expr, ExprKind};
use crate::polynomial::Poly;
use crate::sample::probe_sign_at_infinity;

/// The accumulated growth of an expression in one variable, as that variable runs to plus or
/// minus infinity.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Growth {
    /// Gamma-function factors; dominates everything below.
    pub gamma: i32,

    /// Exponential factors whose exponent depends on the variable (negative for decay).
    pub var_exponent: i32,

    /// Total degree of the power-of-the-variable factors.
    pub degree: Rational,

    /// Logarithmic factors; the slowest growing class.
    pub logs: i32,
}

impl Growth {
    fn constant() -> Self {
        Self { gamma: 0, var_exponent: 0, degree: rat(0), logs: 0 }
    }

    fn degree(degree: Rational) -> Self {
        Self { degree, ..Self::constant() }
    }

    fn combine(mut self, other: Growth) -> Growth {
        self.gamma += other.gamma;
        self.var_exponent += other.var_exponent;
        self.degree += other.degree;
        self.logs += other.logs;
        self
    }

    /// The partial order of domination: Gamma factors first, then exponentials, then power
    /// degree, then logarithms.
    pub fn dominance(&self, other: &Growth) -> Ordering {
        self.gamma
            .cmp(&other.gamma)
            .then(self.var_exponent.cmp(&other.var_exponent))
            .then(self.degree.cmp(&other.degree))
            .then(self.logs.cmp(&other.logs))
    }
}

/// Classifies the asymptotic growth of `expr` in `var` as `var` tends to `+inf` (or `-inf` when
/// `positive` is false), or [`None`] for shapes the comparison does not understand (oscillating
/// factors, unknown symbols).
pub(crate) fn growth(expr: &Expr, var: &str, positive: bool) -> Option<Growth> {
    if !expr.contains_symbol(var) {
        return Some(Growth::constant());
    }

    // whole polynomials in one step
    if let Some(poly) = Poly::from_expr(expr, var) {
        return Some(Growth::degree(rat(poly.degree() as u64)));
    }

    match &expr.kind {
        ExprKind::Symbol(_) | ExprKind::Variable(_) => Some(Growth::degree(rat(1))),
        ExprKind::Mul(factors) => {
            let mut total = Growth::constant();
            for factor in factors {
                total = total.combine(growth(factor, var, positive)?);
            }
            Some(total)
        },
        ExprKind::Add(terms) => {
            // a sum grows like its fastest term
            let mut best: Option<Growth> = None;
            for term in terms {
                let g = growth(term, var, positive)?;
                best = Some(match best {
                    Some(current) if current.dominance(&g) == Ordering::Less => g,
                    Some(current) => current,
                    None => g,
                });
            }
            best
        },
        ExprKind::Pow(base, exponent) => {
            if exponent.contains_symbol(var) {
                // exponential growth or decay, depending on where the exponent is headed
                let exponent_sign = match probe_sign_at_infinity(exponent, var, positive) {
                    Sign::Positive => 1,
                    Sign::Negative => -1,
                    _ => return None,
                };
                let base_grows = if base.contains_symbol(var) {
                    // u^u-style towers outgrow fixed-base exponentials anyway; one class is
                    // close enough for domination
                    true
                } else if base.as_symbol() == Some("e") {
                    true
                } else {
                    let b = base.as_number()?;
                    match b.abs().partial_cmp_value(&calc_num::Number::one())? {
                        Ordering::Greater => true,
                        Ordering::Less => false,
                        Ordering::Equal => return None,
                    }
                };
                let direction = if base_grows { exponent_sign } else { -exponent_sign };
                return Some(Growth {
                    var_exponent: direction,
                    ..Growth::constant()
                });
            }

            let e = exponent.as_number()?.as_rational()?.clone();
            let inner = growth(base, var, positive)?;
            if inner.gamma != 0 || inner.var_exponent != 0 || inner.logs != 0 {
                if !e.is_integer() {
                    return None;
                }
                let scale = e.numer().to_i32()?;
                return Some(Growth {
                    gamma: inner.gamma * scale,
                    var_exponent: inner.var_exponent * scale,
                    degree: inner.degree * &e,
                    logs: inner.logs * scale,
                });
            }
            Some(Growth {
                gamma: 0,
                var_exponent: 0,
                degree: inner.degree * &e,
                logs: 0,
            })
        },
        ExprKind::Function(name, args) => {
            let [arg] = args.as_slice() else { return None };
            match name.as_str() {
                "ln" | "log" => {
                    // the log of anything growing polynomially is one log class
                    let inner = growth(arg, var, positive)?;
                    (inner.dominance(&Growth::constant()) == Ordering::Greater).then(|| {
                        Growth { logs: 1, ..Growth::constant() }
                    })
                },
                "gamma" => {
                    let inner = growth(arg, var, positive)?;
                    (inner.dominance(&Growth::constant()) == Ordering::Greater).then(|| {
                        Growth { gamma: 1, ..Growth::constant() }
                    })
                },
                _ => None,
            }
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x() -> Expr {
        Expr::symbol("x")
    }

    fn classify(expr: &Expr) -> Growth {
        growth(expr, "x", true).unwrap()
    }

    #[test]
    fn logs_grow_slower_than_powers() {
        let log = classify(&Expr::call("ln", vec![x()]));
        let linear = classify(&x());
        assert_eq!(log.dominance(&linear), Ordering::Less);
    }

    #[test]
    fn powers_order_by_degree() {
        let square = classify(&Expr::pow(x(), Expr::int(2)));
        let cube = classify(&Expr::pow(x(), Expr::int(3)));
        assert_eq!(square.dominance(&cube), Ordering::Less);
    }

    #[test]
    fn exponentials_beat_any_power() {
        let exponential = classify(&Expr::pow(Expr::int(2), x()));
        let big_power = classify(&Expr::pow(x(), Expr::int(50)));
        assert_eq!(exponential.dominance(&big_power), Ordering::Greater);
    }

    #[test]
    fn exponential_decay_loses_to_powers() {
        // 2^(-x) decays; even a constant outgrows it
        let decay = classify(&Expr::pow(
            Expr::int(2),
            Expr::mul(vec![Expr::int(-1), x()]),
        ));
        let constant = Growth::constant();
        assert_eq!(decay.dominance(&constant), Ordering::Less);

        // and (2^(-x))^-1 grows like 2^x again
        let regrown = classify(&Expr::pow(
            Expr::pow(Expr::int(2), Expr::mul(vec![Expr::int(-1), x()])),
            Expr::int(-1),
        ));
        let linear = classify(&x());
        assert_eq!(regrown.dominance(&linear), Ordering::Greater);
    }

    #[test]
    fn gamma_beats_exponentials() {
        let gamma = classify(&Expr::call("gamma", vec![x()]));
        let exponential = classify(&Expr::pow(Expr::int(2), x()));
        assert_eq!(gamma.dominance(&exponential), Ordering::Greater);
    }

    #[test]
    fn products_accumulate() {
        // x^2 * ln x sits between x^2 and x^3
        let mixed = classify(&Expr::mul(vec![
            Expr::pow(x(), Expr::int(2)),
            Expr::call("ln", vec![x()]),
        ]));
        let square = classify(&Expr::pow(x(), Expr::int(2)));
        let cube = classify(&Expr::pow(x(), Expr::int(3)));
        assert_eq!(mixed.dominance(&square), Ordering::Greater);
        assert_eq!(mixed.dominance(&cube), Ordering::Less);
    }

    #[test]
    fn sums_take_the_fastest_term() {
        // x + ln x grows like x
        let sum = classify(&Expr::add(vec![x(), Expr::call("ln", vec![x()])]));
        let linear = classify(&x());
        assert_eq!(sum.dominance(&linear), Ordering::Equal);
    }

    #[test]
    fn oscillating_shapes_are_unclassified() {
        assert_eq!(growth(&Expr::call("sin", vec![x()]), "x", true), None);
    }
}
