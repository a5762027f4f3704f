//! Canonical ordering of commutative children.
//!
//! Every commutative node gets one deterministic child order, which serves two purposes: merge
//! candidates end up adjacent (so `3*x` sorts next to `x` in a sum), and structurally equal
//! expressions become identical node-for-node. Numbers compare by value — interval-aware, with
//! overlapping intervals treated as equal *for ordering only* — and sort first inside a product
//! (the coefficient position) but last inside a sum (the constant term position). Everything
//! else compares by a fixed kind-priority table, then recursively by children.
//!
//! The sort is a stable insertion sort over the existing child list: a list that is already
//! sorted except for one displaced child costs O(n) amortized.

use std::cmp::Ordering;

use crate::expr::{AcKind, Expr, ExprKind};

/// The fixed priority of each node kind.
fn kind_rank(kind: &ExprKind) -> u8 {
    match kind {
        ExprKind::Undefined | ExprKind::Aborted => 0,
        ExprKind::Function(..) => 1,
        ExprKind::Add(_) => 2,
        ExprKind::Mul(_) => 3,
        ExprKind::Pow(..) => 4,
        ExprKind::Unit { .. } => 5,
        ExprKind::Symbol(_) => 6,
        ExprKind::Variable(_) => 7,
        ExprKind::DateTime(_) => 8,
        ExprKind::Comparison(..) => 9,
        ExprKind::LogicalNot(_) => 10,
        ExprKind::LogicalAnd(_) => 11,
        ExprKind::LogicalOr(_) => 12,
        ExprKind::LogicalXor(_) => 13,
        ExprKind::BitNot(_) => 14,
        ExprKind::BitAnd(_) => 15,
        ExprKind::BitOr(_) => 16,
        ExprKind::BitXor(_) => 17,
        ExprKind::Vector(_) => 18,
        ExprKind::Matrix(_) => 19,
        ExprKind::Number(_) => 20,
    }
}

/// Recursive structural comparison, used below the number-placement rule.
fn compare_structure(a: &Expr, b: &Expr) -> Ordering {
    let (rank_a, rank_b) = (kind_rank(&a.kind), kind_rank(&b.kind));
    if rank_a != rank_b {
        return rank_a.cmp(&rank_b);
    }

    fn compare_lists(a: &[Expr], b: &[Expr]) -> Ordering {
        for (x, y) in a.iter().zip(b.iter()) {
            match compare_structure(x, y) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        a.len().cmp(&b.len())
    }

    match (&a.kind, &b.kind) {
        (ExprKind::Number(x), ExprKind::Number(y)) => {
            // overlap is "unknown", treated as equal for ordering purposes only
            x.partial_cmp_value(y).unwrap_or(Ordering::Equal)
        },
        (ExprKind::Symbol(x), ExprKind::Symbol(y)) => x.cmp(y),
        (ExprKind::Variable(x), ExprKind::Variable(y)) => x.name.cmp(&y.name),
        (ExprKind::Unit { name: nx, prefix: px }, ExprKind::Unit { name: ny, prefix: py }) => {
            nx.cmp(ny).then(px.unwrap_or(0).cmp(&py.unwrap_or(0)))
        },
        (ExprKind::DateTime(x), ExprKind::DateTime(y)) => x.cmp(y),
        (ExprKind::Function(nx, ax), ExprKind::Function(ny, ay)) => {
            nx.cmp(ny).then_with(|| compare_lists(ax, ay))
        },
        (ExprKind::Pow(bx, ex), ExprKind::Pow(by, ey)) => {
            compare_structure(bx, by).then_with(|| compare_structure(ex, ey))
        },
        (ExprKind::Comparison(rx, lx, rhx), ExprKind::Comparison(ry, ly, rhy)) => {
            (*rx as u8)
                .cmp(&(*ry as u8))
                .then_with(|| compare_structure(lx, ly))
                .then_with(|| compare_structure(rhx, rhy))
        },
        (ExprKind::LogicalNot(x), ExprKind::LogicalNot(y))
        | (ExprKind::BitNot(x), ExprKind::BitNot(y)) => compare_structure(x, y),
        (ExprKind::Vector(x), ExprKind::Vector(y)) => compare_lists(x, y),
        (ExprKind::Matrix(x), ExprKind::Matrix(y)) => {
            for (rx, ry) in x.iter().zip(y.iter()) {
                match compare_lists(rx, ry) {
                    Ordering::Equal => continue,
                    ord => return ord,
                }
            }
            x.len().cmp(&y.len())
        },
        (ExprKind::Add(x), ExprKind::Add(y))
        | (ExprKind::Mul(x), ExprKind::Mul(y))
        | (ExprKind::LogicalAnd(x), ExprKind::LogicalAnd(y))
        | (ExprKind::LogicalOr(x), ExprKind::LogicalOr(y))
        | (ExprKind::LogicalXor(x), ExprKind::LogicalXor(y))
        | (ExprKind::BitAnd(x), ExprKind::BitAnd(y))
        | (ExprKind::BitOr(x), ExprKind::BitOr(y))
        | (ExprKind::BitXor(x), ExprKind::BitXor(y)) => compare_lists(x, y),
        _ => Ordering::Equal,
    }
}

/// The factor/term that decides where a product sorts inside a sum: its greatest non-numeric
/// child. `3*x` is represented by `x`, so it lands next to a bare `x` term.
fn dominant(expr: &Expr) -> &Expr {
    if let ExprKind::Mul(factors) = &expr.kind {
        factors
            .iter()
            .filter(|f| !f.is_number())
            .max_by(|a, b| compare_structure(a, b))
            .unwrap_or(expr)
    } else {
        expr
    }
}

/// The total order used for the children of the commutative node kind `parent`.
pub(crate) fn compare_terms(a: &Expr, b: &Expr, parent: AcKind) -> Ordering {
    match (a.is_number(), b.is_number()) {
        (true, true) => a
            .as_number()
            .unwrap()
            .partial_cmp_value(b.as_number().unwrap())
            .unwrap_or(Ordering::Equal),
        // numbers first in a product, last in a sum
        (true, false) => {
            if parent == AcKind::Mul {
                Ordering::Less
            } else {
                Ordering::Greater
            }
        },
        (false, true) => {
            if parent == AcKind::Mul {
                Ordering::Greater
            } else {
                Ordering::Less
            }
        },
        (false, false) => {
            if parent == AcKind::Add {
                compare_structure(dominant(a), dominant(b))
                    .then_with(|| compare_structure(a, b))
            } else {
                compare_structure(a, b)
            }
        },
    }
}

/// Stable insertion sort of a commutative node's children. Returns true if any child moved.
pub(crate) fn sort_children(children: &mut [Expr], parent: AcKind) -> bool {
    let mut changed = false;
    for i in 1..children.len() {
        let mut j = i;
        while j > 0 && compare_terms(&children[j - 1], &children[j], parent) == Ordering::Greater
        {
            children.swap(j - 1, j);
            j -= 1;
            changed = true;
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn numbers_first_in_products_last_in_sums() {
        let mut product = vec![Expr::symbol("x"), Expr::int(3)];
        sort_children(&mut product, AcKind::Mul);
        assert_eq!(product, vec![Expr::int(3), Expr::symbol("x")]);

        let mut sum = vec![Expr::int(3), Expr::symbol("x")];
        sort_children(&mut sum, AcKind::Add);
        assert_eq!(sum, vec![Expr::symbol("x"), Expr::int(3)]);
    }

    #[test]
    fn coefficient_terms_sort_next_to_their_factor() {
        // x^2, 3*x, x, 5 in a sum: powers, then the x-terms adjacent, then the constant
        let mut sum = vec![
            Expr::int(5),
            Expr::symbol("x"),
            Expr::pow(Expr::symbol("x"), Expr::int(2)),
            Expr::mul(vec![Expr::int(3), Expr::symbol("x")]),
        ];
        sort_children(&mut sum, AcKind::Add);
        assert_eq!(
            sum,
            vec![
                Expr::pow(Expr::symbol("x"), Expr::int(2)),
                Expr::mul(vec![Expr::int(3), Expr::symbol("x")]),
                Expr::symbol("x"),
                Expr::int(5),
            ],
        );
    }

    #[test]
    fn sorting_is_deterministic_across_inputs() {
        let mut a = vec![Expr::symbol("y"), Expr::symbol("x"), Expr::int(2)];
        let mut b = vec![Expr::int(2), Expr::symbol("x"), Expr::symbol("y")];
        sort_children(&mut a, AcKind::Add);
        sort_children(&mut b, AcKind::Add);
        assert_eq!(a, b);
    }

    #[test]
    fn already_sorted_lists_report_no_change() {
        let mut sum = vec![Expr::symbol("x"), Expr::symbol("y"), Expr::int(1)];
        assert!(!sort_children(&mut sum, AcKind::Add));
    }

    #[test]
    fn numbers_order_by_value() {
        let mut product = vec![
            Expr::int(5),
            Expr::number(calc_num::Number::fraction(1, 2)),
            Expr::int(-3),
        ];
        sort_children(&mut product, AcKind::Mul);
        assert_eq!(
            product,
            vec![
                Expr::int(-3),
                Expr::number(calc_num::Number::fraction(1, 2)),
                Expr::int(5),
            ],
        );
    }
}
