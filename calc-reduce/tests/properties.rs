//! End-to-end properties of the reduction driver.

use calc_num::primitive::float;
use calc_num::{InfSign, Number};
use calc_reduce::{reduce, EvaluationOptions, Expr, ExprKind, ReductionContext};
use pretty_assertions::assert_eq;

fn reduced(mut expr: Expr) -> Expr {
    let ctx = ReductionContext::new();
    let opts = EvaluationOptions::default();
    reduce(&mut expr, &ctx, &opts);
    expr
}

fn x() -> Expr {
    Expr::symbol("x")
}

fn sample_expressions() -> Vec<Expr> {
    vec![
        Expr::add(vec![x(), Expr::int(2), Expr::mul(vec![Expr::int(3), x()])]),
        Expr::mul(vec![
            Expr::pow(x(), Expr::int(2)),
            Expr::symbol("y"),
            Expr::number(Number::fraction(2, 3)),
        ]),
        Expr::pow(Expr::add(vec![x(), Expr::int(1)]), Expr::int(2)),
        Expr::add(vec![
            Expr::pow(Expr::call("sin", vec![x()]), Expr::int(2)),
            Expr::pow(Expr::call("cos", vec![x()]), Expr::int(2)),
            Expr::symbol("y"),
        ]),
        Expr::fraction(Expr::add(vec![x(), Expr::int(1)]), Expr::symbol("y")),
        Expr::new(ExprKind::LogicalAnd(vec![
            Expr::comparison(calc_reduce::Relation::Lt, x(), Expr::int(5)),
            Expr::comparison(calc_reduce::Relation::Lt, x(), Expr::int(3)),
        ])),
    ]
}

#[test]
fn reduction_is_idempotent() {
    for expr in sample_expressions() {
        let once = reduced(expr);
        let twice = reduced(once.clone());
        assert_eq!(once, twice, "a second pass must change nothing");
    }
}

#[test]
fn second_pass_reports_no_change() {
    let ctx = ReductionContext::new();
    let opts = EvaluationOptions::default();
    for mut expr in sample_expressions() {
        reduce(&mut expr, &ctx, &opts);
        assert!(!reduce(&mut expr, &ctx, &opts), "{} was not settled", expr);
    }
}

#[test]
fn commutative_canonicalization() {
    let a = reduced(Expr::add(vec![x(), Expr::symbol("y")]));
    let b = reduced(Expr::add(vec![Expr::symbol("y"), x()]));
    assert_eq!(a, b);

    let a = reduced(Expr::mul(vec![Expr::int(3), x(), Expr::symbol("y")]));
    let b = reduced(Expr::mul(vec![Expr::symbol("y"), Expr::int(3), x()]));
    assert_eq!(a, b);

    let a = reduced(Expr::new(ExprKind::BitOr(vec![x(), Expr::int(12)])));
    let b = reduced(Expr::new(ExprKind::BitOr(vec![Expr::int(12), x()])));
    assert_eq!(a, b);
}

#[test]
fn identity_laws() {
    assert_eq!(reduced(Expr::add(vec![x(), Expr::int(0)])), x());
    assert_eq!(reduced(Expr::mul(vec![x(), Expr::int(1)])), x());
    assert_eq!(reduced(Expr::pow(x(), Expr::int(1))), x());
    assert_eq!(reduced(Expr::pow(x(), Expr::int(0))), Expr::int(1));
}

#[test]
fn exact_numeric_folding() {
    let sum = reduced(Expr::add(vec![
        Expr::number(Number::fraction(1, 3)),
        Expr::number(Number::fraction(1, 6)),
    ]));
    assert_eq!(sum, Expr::number(Number::fraction(1, 2)));
    assert!(!sum.is_approximate());

    let product = reduced(Expr::mul(vec![
        Expr::number(Number::fraction(2, 3)),
        Expr::number(Number::fraction(3, 4)),
    ]));
    assert_eq!(product, Expr::number(Number::fraction(1, 2)));
    assert!(!product.is_approximate());
}

#[test]
fn exponent_merge_domain_guard() {
    // sqrt(x) * sqrt(x) must not fold to x for unconstrained real x
    let sqrt_x = Expr::pow(x(), Expr::number(Number::fraction(1, 2)));
    let result = reduced(Expr::mul(vec![sqrt_x.clone(), sqrt_x.clone()]));
    assert_ne!(result, x());
    assert_eq!(result, Expr::mul(vec![sqrt_x.clone(), sqrt_x]));

    // integer exponents need no proof
    let squared = reduced(Expr::mul(vec![x(), x()]));
    assert_eq!(squared, Expr::pow(x(), Expr::int(2)));
}

#[test]
fn pythagorean_identity() {
    let expr = Expr::add(vec![
        Expr::pow(Expr::call("sin", vec![x()]), Expr::int(2)),
        Expr::pow(Expr::call("cos", vec![x()]), Expr::int(2)),
    ]);
    assert_eq!(reduced(expr), Expr::int(1));

    // the argument can be any sub-expression
    let arg = Expr::add(vec![x(), Expr::int(1)]);
    let expr = Expr::add(vec![
        Expr::pow(Expr::call("cos", vec![arg.clone()]), Expr::int(2)),
        Expr::pow(Expr::call("sin", vec![arg]), Expr::int(2)),
    ]);
    assert_eq!(reduced(expr), Expr::int(1));
}

#[test]
fn approximate_propagation() {
    let expr = Expr::add(vec![
        x(),
        Expr::mul(vec![
            Expr::number(Number::Float(float(1.5))),
            Expr::symbol("y"),
        ]),
    ]);
    let result = reduced(expr);
    assert!(result.is_approximate());
    assert!(result.precision().is_some());
}

#[test]
fn comparisons_fold_when_decidable() {
    let expr = Expr::comparison(calc_reduce::Relation::Le, Expr::int(2), Expr::int(2));
    assert_eq!(reduced(expr), Expr::int(1));

    let expr = Expr::new(ExprKind::LogicalAnd(vec![
        Expr::comparison(calc_reduce::Relation::Lt, x(), Expr::int(5)),
        Expr::comparison(calc_reduce::Relation::Lt, x(), Expr::int(3)),
    ]));
    assert_eq!(
        reduced(expr),
        Expr::comparison(calc_reduce::Relation::Lt, x(), Expr::int(3)),
    );
}

#[test]
fn disallowed_infinities_stay_unfolded() {
    let opts = EvaluationOptions {
        allow_infinite: false,
        ..EvaluationOptions::default()
    };
    let ctx = ReductionContext::new();

    let mut expr = Expr::add(vec![
        Expr::number(Number::Infinity(InfSign::Pos)),
        Expr::number(Number::Infinity(InfSign::Pos)),
    ]);
    reduce(&mut expr, &ctx, &opts);
    // the fold would produce an infinity, which this policy forbids
    assert_eq!(expr.ac_children().map(Vec::len), Some(2));
}

#[test]
fn cancellation_leaves_a_valid_tree() {
    let ctx = ReductionContext::new();
    let opts = EvaluationOptions::default();

    // a wide sum with plenty of merge work
    let terms = (0..200)
        .map(|i| {
            Expr::mul(vec![
                Expr::int(i % 7),
                Expr::pow(x(), Expr::int(i % 5)),
            ])
        })
        .collect::<Vec<_>>();
    let mut expr = Expr::add(terms);
    let before_count = expr.node_count();

    ctx.abort_handle().store(true, std::sync::atomic::Ordering::Relaxed);
    reduce(&mut expr, &ctx, &opts);

    // nothing merged, nothing torn: every node is still reachable and well-formed
    assert_eq!(expr.node_count(), before_count);
    assert!(expr.ac_children().is_some());

    // releasing the abort lets the same tree reduce normally
    ctx.abort_handle().store(false, std::sync::atomic::Ordering::Relaxed);
    assert!(reduce(&mut expr, &ctx, &opts));
}

#[test]
fn reduction_is_deterministic() {
    let build = || {
        Expr::add(vec![
            Expr::mul(vec![Expr::int(2), x(), Expr::symbol("y")]),
            Expr::pow(x(), Expr::int(2)),
            Expr::mul(vec![Expr::symbol("y"), x(), Expr::int(3)]),
            Expr::int(4),
        ])
    };
    let first = reduced(build());
    let second = reduced(build());
    assert_eq!(first, second);
    assert_eq!(first.to_string(), second.to_string());
}
