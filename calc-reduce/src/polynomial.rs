//! Univariate polynomial helpers: extraction, long division, GCD, binomial expansion.
//!
//! These are the targeted algorithms behind fraction cancellation (`(x^2-1)/(x-1) = x+1`),
//! common-denominator combination, the rational-function fast path of the limit subsystem, and
//! binomial expansion of addition bases. Extraction works over exact rational coefficients only;
//! anything approximate or multivariate falls out as [`None`] and the caller leaves the
//! expression alone.

use calc_num::primitive::{int, rat};
use calc_num::Number;
use rug::{Integer, Rational};
use std::cmp::Ordering;

use crate::expr::{Expr, ExprKind};

/// The largest degree an extracted polynomial may have. Guards against hidden blowup in products
/// and powers.
const MAX_DEGREE: usize = 64;

/// A univariate polynomial over the rationals, coefficients in ascending degree order with no
/// trailing zeros.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Poly {
    pub var: String,
    pub coeffs: Vec<Rational>,
}

impl Poly {
    fn new(var: &str, mut coeffs: Vec<Rational>) -> Self {
        while coeffs.last().map(|c| c.cmp0() == Ordering::Equal).unwrap_or(false) {
            coeffs.pop();
        }
        Self { var: var.to_string(), coeffs }
    }

    fn constant(var: &str, value: Rational) -> Self {
        Self::new(var, vec![value])
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.is_empty()
    }

    pub fn degree(&self) -> usize {
        self.coeffs.len().saturating_sub(1)
    }

    pub fn leading(&self) -> Option<&Rational> {
        self.coeffs.last()
    }

    fn add(&self, other: &Poly) -> Poly {
        let mut coeffs = vec![rat(0); self.coeffs.len().max(other.coeffs.len())];
        for (i, c) in self.coeffs.iter().enumerate() {
            coeffs[i] += c;
        }
        for (i, c) in other.coeffs.iter().enumerate() {
            coeffs[i] += c;
        }
        Poly::new(&self.var, coeffs)
    }

    fn mul(&self, other: &Poly) -> Option<Poly> {
        if self.is_zero() || other.is_zero() {
            return Some(Poly::new(&self.var, Vec::new()));
        }
        if self.degree() + other.degree() > MAX_DEGREE {
            return None;
        }
        let mut coeffs = vec![rat(0); self.coeffs.len() + other.coeffs.len() - 1];
        for (i, a) in self.coeffs.iter().enumerate() {
            for (j, b) in other.coeffs.iter().enumerate() {
                coeffs[i + j] += rat(a * b);
            }
        }
        Some(Poly::new(&self.var, coeffs))
    }

    fn scale(&self, factor: &Rational) -> Poly {
        Poly::new(
            &self.var,
            self.coeffs.iter().map(|c| rat(c * factor)).collect(),
        )
    }

    /// Polynomial long division. Returns `(quotient, remainder)`, or [`None`] when the divisor
    /// is zero.
    pub fn div_rem(&self, divisor: &Poly) -> Option<(Poly, Poly)> {
        let lead = divisor.leading()?;
        let mut remainder = self.coeffs.clone();
        let mut quotient = vec![rat(0); self.coeffs.len().saturating_sub(divisor.degree())];

        while remainder.len() >= divisor.coeffs.len() {
            let last = remainder.last().unwrap();
            if last.cmp0() == Ordering::Equal {
                remainder.pop();
                continue;
            }
            let shift = remainder.len() - divisor.coeffs.len();
            let factor = rat(last / lead);
            for (i, c) in divisor.coeffs.iter().enumerate() {
                let sub = rat(c * &factor);
                remainder[shift + i] -= sub;
            }
            quotient[shift] = factor;
            remainder.pop();
        }

        Some((Poly::new(&self.var, quotient), Poly::new(&self.var, remainder)))
    }

    /// Monic greatest common divisor by the Euclidean algorithm.
    pub fn gcd(a: &Poly, b: &Poly) -> Option<Poly> {
        let (mut a, mut b) = (a.clone(), b.clone());
        while !b.is_zero() {
            let (_, r) = a.div_rem(&b)?;
            a = b;
            b = r;
        }
        let lead = a.leading().cloned();
        Some(match lead {
            Some(lead) if lead != 1 => a.scale(&lead.recip()),
            _ => a,
        })
    }

    /// Extracts a polynomial in `var` from an expression tree, or [`None`] when the expression
    /// is not an exact univariate polynomial.
    pub fn from_expr(expr: &Expr, var: &str) -> Option<Poly> {
        match &expr.kind {
            ExprKind::Number(Number::Rational(r)) => Some(Poly::constant(var, r.clone())),
            ExprKind::Symbol(_) | ExprKind::Variable(_) if expr.as_symbol() == Some(var) => {
                Some(Poly::new(var, vec![rat(0), rat(1)]))
            },
            ExprKind::Add(terms) => {
                let mut sum = Poly::new(var, Vec::new());
                for term in terms {
                    sum = sum.add(&Poly::from_expr(term, var)?);
                }
                Some(sum)
            },
            ExprKind::Mul(factors) => {
                let mut product = Poly::constant(var, rat(1));
                for factor in factors {
                    product = product.mul(&Poly::from_expr(factor, var)?)?;
                }
                Some(product)
            },
            ExprKind::Pow(base, exp) => {
                let n = exp.as_integer()?.to_usize()?;
                if n > MAX_DEGREE {
                    return None;
                }
                let base = Poly::from_expr(base, var)?;
                let mut power = Poly::constant(var, rat(1));
                for _ in 0..n {
                    power = power.mul(&base)?;
                }
                Some(power)
            },
            _ => None,
        }
    }

    /// Rebuilds an expression from the polynomial.
    pub fn to_expr(&self) -> Expr {
        let mut terms = Vec::new();
        for (degree, coeff) in self.coeffs.iter().enumerate() {
            if coeff.cmp0() == Ordering::Equal {
                continue;
            }
            let coeff_expr = Expr::number(Number::Rational(coeff.clone()));
            let term = match degree {
                0 => coeff_expr,
                1 if *coeff == 1 => Expr::symbol(self.var.as_str()),
                1 => Expr::mul(vec![coeff_expr, Expr::symbol(self.var.as_str())]),
                _ => {
                    let power =
                        Expr::pow(Expr::symbol(self.var.as_str()), Expr::int(degree as i64));
                    if *coeff == 1 {
                        power
                    } else {
                        Expr::mul(vec![coeff_expr, power])
                    }
                },
            };
            terms.push(term);
        }
        Expr::add(terms)
    }
}

/// Expands `(a + b)^n` by the binomial theorem.
pub(crate) fn binomial_expand(a: &Expr, b: &Expr, n: u32) -> Expr {
    let mut terms = Vec::with_capacity(n as usize + 1);
    for k in 0..=n {
        let coeff: Integer = int(n).binomial(k);
        let mut factors = Vec::new();
        if coeff != 1 {
            factors.push(Expr::number(Number::from(coeff)));
        }
        match n - k {
            0 => {},
            1 => factors.push(a.clone()),
            e => factors.push(Expr::pow(a.clone(), Expr::int(e as i64))),
        }
        match k {
            0 => {},
            1 => factors.push(b.clone()),
            e => factors.push(Expr::pow(b.clone(), Expr::int(e as i64))),
        }
        terms.push(Expr::mul(factors).downgrade());
    }
    Expr::add(terms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn x_squared_minus_one() -> Expr {
        Expr::add(vec![
            Expr::pow(Expr::symbol("x"), Expr::int(2)),
            Expr::int(-1),
        ])
    }

    #[test]
    fn extraction_round_trips() {
        let poly = Poly::from_expr(&x_squared_minus_one(), "x").unwrap();
        assert_eq!(poly.degree(), 2);
        assert_eq!(poly.coeffs, vec![rat(-1), rat(0), rat(1)]);
        assert_eq!(Poly::from_expr(&poly.to_expr(), "x").unwrap(), poly);
    }

    #[test]
    fn rejects_multivariate_and_approximate() {
        let multivariate = Expr::mul(vec![Expr::symbol("x"), Expr::symbol("y")]);
        assert_eq!(Poly::from_expr(&multivariate, "x"), None);

        let approximate = Expr::number(Number::Float(calc_num::primitive::float(1.5)));
        assert_eq!(Poly::from_expr(&approximate, "x"), None);
    }

    #[test]
    fn long_division_cancels_a_root() {
        // (x^2 - 1) / (x - 1) = x + 1 exactly
        let numerator = Poly::from_expr(&x_squared_minus_one(), "x").unwrap();
        let denominator = Poly::from_expr(
            &Expr::add(vec![Expr::symbol("x"), Expr::int(-1)]),
            "x",
        )
        .unwrap();

        let (quotient, remainder) = numerator.div_rem(&denominator).unwrap();
        assert!(remainder.is_zero());
        assert_eq!(quotient.coeffs, vec![rat(1), rat(1)]);
    }

    #[test]
    fn gcd_finds_the_common_factor() {
        // gcd(x^2 - 1, x^2 - 2x + 1) = x - 1
        let a = Poly::from_expr(&x_squared_minus_one(), "x").unwrap();
        let b = Poly::new("x", vec![rat(1), rat(-2), rat(1)]);
        let gcd = Poly::gcd(&a, &b).unwrap();
        assert_eq!(gcd.coeffs, vec![rat(-1), rat(1)]);
    }

    #[test]
    fn binomial_expansion_has_the_right_terms() {
        // (x + 1)^3 = x^3 + 3x^2 + 3x + 1
        let expanded = binomial_expand(&Expr::symbol("x"), &Expr::int(1), 3);
        let poly = Poly::from_expr(&expanded, "x").unwrap();
        assert_eq!(poly.coeffs, vec![rat(1), rat(3), rat(3), rat(1)]);
    }
}
