//! Symbolic differentiation, used by the limit subsystem for L'Hôpital's rule.

use calc_num::Number;

use crate::expr::{Expr, ExprKind};

/// Returns `true` if the given [`Expr`] is "clearly" zero. This is intended to clean up the
/// produced trees and is not mathematically rigorous.
fn is_trivially_zero(e: &Expr) -> bool {
    match &e.kind {
        ExprKind::Number(n) => n.is_zero(),
        ExprKind::Add(terms) => terms.iter().all(is_trivially_zero),
        ExprKind::Mul(factors) => factors.iter().any(is_trivially_zero),
        ExprKind::Pow(base, exponent) => {
            is_trivially_zero(base) && !is_trivially_zero(exponent)
        },
        _ => false,
    }
}

/// Returns `true` if the given [`Expr`] is "clearly" one. This is intended to clean up the
/// produced trees and is not mathematically rigorous.
fn is_trivially_unity(e: &Expr) -> bool {
    match &e.kind {
        ExprKind::Number(n) => n.is_one(),
        ExprKind::Mul(factors) => factors.iter().all(is_trivially_unity),
        ExprKind::Pow(base, exponent) => {
            is_trivially_zero(exponent) || is_trivially_unity(base)
        },
        _ => false,
    }
}

/// Helper struct to build a product of expressions while applying basic cleanup rules. If any
/// of the expressions are zero, the product is reduced to zero.
#[derive(Default)]
struct MultBuilder(Vec<Expr>);

impl From<MultBuilder> for Expr {
    fn from(value: MultBuilder) -> Self {
        Expr::new(ExprKind::Mul(value.0)).downgrade()
    }
}

impl MultBuilder {
    fn mult(&mut self, e: Expr) {
        if is_trivially_zero(&e) || self.0.first().map(is_trivially_zero).unwrap_or(false) {
            self.0 = vec![Expr::int(0)];
            return;
        }
        if !is_trivially_unity(&e) {
            self.0.push(e);
        }
    }
}

/// Helper struct to build a sum of expressions; only non-zero expressions are added.
#[derive(Default)]
struct SumBuilder(Vec<Expr>);

impl From<SumBuilder> for Expr {
    fn from(value: SumBuilder) -> Self {
        Expr::new(ExprKind::Add(value.0)).downgrade()
    }
}

impl SumBuilder {
    fn add(&mut self, e: Expr) {
        if !is_trivially_zero(&e) {
            self.0.push(e);
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum DerivativeError {
    /// The expression may be differentiable, but computing its derivative symbolically is not
    /// supported.
    Unsupported,

    /// The expression is not a differentiable real function.
    Undifferentiable,
}

/// `(f + g)' = f' + g'`
fn sum_rule(terms: &[Expr], var: &str) -> Result<Expr, DerivativeError> {
    let mut sum = SumBuilder::default();
    for term in terms {
        sum.add(derivative(term, var)?);
    }
    Ok(sum.into())
}

/// `(f * g * h)' = f' * g * h + f * g' * h + f * g * h'`
fn product_rule(factors: &[Expr], var: &str) -> Result<Expr, DerivativeError> {
    let mut outer_sum = SumBuilder::default();
    for derivative_index in 0..factors.len() {
        let mut inner_mult = MultBuilder::default();
        for factor_index in 0..factors.len() {
            let factor = if derivative_index == factor_index {
                derivative(&factors[derivative_index], var)?
            } else {
                factors[factor_index].clone()
            };
            inner_mult.mult(factor);
        }
        outer_sum.add(inner_mult.into());
    }
    Ok(outer_sum.into())
}

/// The derivative of `f(u)` with respect to `u`, for the supported function table.
fn function_derivative(name: &str, u: &Expr) -> Result<Expr, DerivativeError> {
    let call = |f: &str| Expr::call(f, vec![u.clone()]);
    Ok(match name {
        "sin" => call("cos"),
        "cos" => Expr::mul(vec![Expr::int(-1), call("sin")]),
        // 1 + tan^2 u
        "tan" => Expr::add(vec![
            Expr::int(1),
            Expr::pow(call("tan"), Expr::int(2)),
        ]),
        "sinh" => call("cosh"),
        "cosh" => call("sinh"),
        "tanh" => Expr::add(vec![
            Expr::int(1),
            Expr::mul(vec![Expr::int(-1), Expr::pow(call("tanh"), Expr::int(2))]),
        ]),
        "ln" => Expr::pow(u.clone(), Expr::int(-1)),
        "abs" => call("sgn"),
        "sgn" => Expr::int(0),
        // (1 + u^2)^-1
        "atan" => Expr::pow(
            Expr::add(vec![Expr::int(1), Expr::pow(u.clone(), Expr::int(2))]),
            Expr::int(-1),
        ),
        // (1 - u^2)^(-1/2)
        "asin" => Expr::pow(
            Expr::add(vec![
                Expr::int(1),
                Expr::mul(vec![Expr::int(-1), Expr::pow(u.clone(), Expr::int(2))]),
            ]),
            Expr::number(Number::fraction(-1, 2)),
        ),
        _ => return Err(DerivativeError::Unsupported),
    })
}

/// Computes the derivative of the given expression with respect to `var`. Returns [`Err`] if
/// the derivative could not be symbolically computed.
pub fn derivative(f: &Expr, var: &str) -> Result<Expr, DerivativeError> {
    if is_trivially_zero(f) {
        return Ok(Expr::int(0));
    }

    match &f.kind {
        ExprKind::Number(_) | ExprKind::Unit { .. } | ExprKind::DateTime(_) => Ok(Expr::int(0)),
        ExprKind::Symbol(_) | ExprKind::Variable(_) => {
            if f.as_symbol() == Some(var) {
                Ok(Expr::int(1))
            } else {
                Ok(Expr::int(0))
            }
        },
        ExprKind::Add(terms) => sum_rule(terms, var),
        ExprKind::Mul(factors) => product_rule(factors, var),
        ExprKind::Pow(base, exponent) => {
            let base_has_var = base.contains_symbol(var);
            let exp_has_var = exponent.contains_symbol(var);

            if !exp_has_var {
                // power rule with the chain rule: g * f^(g-1) * f'
                let mut mult = MultBuilder::default();
                mult.mult(derivative(base, var)?);
                mult.mult((**exponent).clone());
                let reduced_exponent = match exponent.as_number() {
                    Some(n) => n
                        .checked_add(&Number::int(-1))
                        .map(Expr::number)
                        .unwrap_or_else(|| {
                            Expr::add(vec![(**exponent).clone(), Expr::int(-1)])
                        }),
                    None => Expr::add(vec![(**exponent).clone(), Expr::int(-1)]),
                };
                mult.mult(Expr::pow((**base).clone(), reduced_exponent));
                Ok(mult.into())
            } else if !base_has_var {
                // a^g: a^g * ln(a) * g', where ln(e) vanishes
                let mut mult = MultBuilder::default();
                mult.mult(derivative(exponent, var)?);
                if base.as_symbol() != Some("e") {
                    mult.mult(Expr::call("ln", vec![(**base).clone()]));
                }
                mult.mult(f.clone());
                Ok(mult.into())
            } else {
                // f^g: f^g * (g' * ln f + g * f' / f)
                let mut left = MultBuilder::default();
                left.mult(derivative(exponent, var)?);
                left.mult(Expr::call("ln", vec![(**base).clone()]));

                let mut right = MultBuilder::default();
                right.mult((**exponent).clone());
                right.mult(derivative(base, var)?);
                right.mult(Expr::pow((**base).clone(), Expr::int(-1)));

                let mut sum = SumBuilder::default();
                sum.add(left.into());
                sum.add(right.into());

                let mut mult = MultBuilder::default();
                mult.mult(f.clone());
                mult.mult(sum.into());
                Ok(mult.into())
            }
        },
        ExprKind::Function(name, args) => {
            let [u] = args.as_slice() else {
                return Err(DerivativeError::Unsupported);
            };
            // chain rule
            let mut mult = MultBuilder::default();
            mult.mult(derivative(u, var)?);
            mult.mult(function_derivative(name, u)?);
            Ok(mult.into())
        },
        _ => Err(DerivativeError::Undifferentiable),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ReductionContext;
    use crate::options::EvaluationOptions;
    use crate::reduce::reduce;
    use crate::sample::eval_point;
    use calc_num::primitive::float;

    /// Compares the symbolic derivative against a finite difference at several points.
    fn check_derivative(expr: &Expr, points: &[f64]) {
        const DX: f64 = 1e-5;
        const TOL: f64 = 1e-3;

        let mut symbolic = derivative(expr, "x").expect("derivative must exist");
        reduce(&mut symbolic, &ReductionContext::new(), &EvaluationOptions::default());

        for &point in points {
            let exact = eval_point(&symbolic, "x", &float(point)).unwrap().to_f64();
            let above = eval_point(expr, "x", &float(point + DX)).unwrap().to_f64();
            let below = eval_point(expr, "x", &float(point)).unwrap().to_f64();
            let numeric = (above - below) / DX;
            assert!(
                (exact - numeric).abs() < TOL,
                "at x={}: symbolic {} vs numeric {}",
                point,
                exact,
                numeric,
            );
        }
    }

    #[test]
    fn power_rule() {
        // x^2 + x + 1
        let expr = Expr::add(vec![
            Expr::pow(Expr::symbol("x"), Expr::int(2)),
            Expr::symbol("x"),
            Expr::int(1),
        ]);
        check_derivative(&expr, &[0.0, 1.0, 2.0, 5.0]);
    }

    #[test]
    fn product_rule_with_functions() {
        // x * sin(x)
        let expr = Expr::mul(vec![
            Expr::symbol("x"),
            Expr::call("sin", vec![Expr::symbol("x")]),
        ]);
        check_derivative(&expr, &[0.3, 1.1, 2.7]);
    }

    #[test]
    fn chain_rule() {
        // cos(x^2)
        let expr = Expr::call("cos", vec![Expr::pow(Expr::symbol("x"), Expr::int(2))]);
        check_derivative(&expr, &[0.2, 0.9, 1.5]);
    }

    #[test]
    fn exponentials() {
        // e^x differentiates to itself
        let expr = Expr::pow(Expr::symbol("e"), Expr::symbol("x"));
        let result = derivative(&expr, "x").unwrap();
        assert_eq!(result, expr);

        check_derivative(&Expr::pow(Expr::int(2), Expr::symbol("x")), &[0.5, 1.5]);
    }

    #[test]
    fn sin_derivative_is_cos() {
        let expr = Expr::call("sin", vec![Expr::symbol("x")]);
        let result = derivative(&expr, "x").unwrap();
        assert_eq!(result, Expr::call("cos", vec![Expr::symbol("x")]));
    }

    #[test]
    fn constants_vanish() {
        assert_eq!(derivative(&Expr::int(42), "x").unwrap(), Expr::int(0));
        assert_eq!(derivative(&Expr::symbol("y"), "x").unwrap(), Expr::int(0));
    }

    #[test]
    fn unsupported_shapes_are_reported() {
        let cmp = Expr::comparison(crate::expr::Relation::Lt, Expr::symbol("x"), Expr::int(1));
        assert_eq!(derivative(&cmp, "x"), Err(DerivativeError::Undifferentiable));
    }
}
