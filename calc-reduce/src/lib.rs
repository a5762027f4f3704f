//! Symbolic-expression reduction: the rewriting core of the calc calculator library.
//!
//! # Expression representation
//!
//! Expressions are trees of [`Expr`] nodes. Associative/commutative operations — addition,
//! multiplication, the logical and bitwise families — are **flattened**: `x + (y + z)` is a
//! single addition node with three children. Power and comparison nodes always have exactly two
//! operands. Every node carries derived exactness attributes (`approx`, `precision`) that
//! reductions propagate, never drop.
//!
//! # Reduction
//!
//! [`reduce`] rewrites a tree to a canonical form under an [`EvaluationOptions`] policy: each
//! commutative node's sibling pairs are repeatedly offered to the kind's merge operator until a
//! fixpoint, the survivors are sorted into canonical order, and degenerate nodes collapse. The
//! result is deterministic for a given input and policy, and the returned flag tells the caller
//! whether anything changed.
//!
//! ```
//! use calc_reduce::{reduce, Expr, EvaluationOptions, ReductionContext};
//!
//! let ctx = ReductionContext::new();
//! let opts = EvaluationOptions::default();
//!
//! // x + x + x = 3x
//! let mut expr = Expr::add(vec![
//!     Expr::symbol("x"),
//!     Expr::symbol("x"),
//!     Expr::symbol("x"),
//! ]);
//! reduce(&mut expr, &ctx, &opts);
//! assert_eq!(expr, Expr::mul(vec![Expr::int(3), Expr::symbol("x")]));
//! ```
//!
//! Long-running reductions are cancelled cooperatively through the context's abort flag; an
//! aborted pass leaves a structurally valid, partially reduced tree. Non-fatal findings
//! (assumption-licensed rewrites, unresolved comparisons, domain violations) accumulate in the
//! context's [`calc_error::Reporter`].
//!
//! # Limits
//!
//! The [`limits`] module computes symbolic limits on top of the same driver:
//!
//! ```
//! use calc_reduce::limits::{limit, LimitQuery};
//! use calc_reduce::{Expr, EvaluationOptions, ReductionContext};
//!
//! // sin(x)/x as x approaches 0
//! let expr = Expr::fraction(
//!     Expr::call("sin", vec![Expr::symbol("x")]),
//!     Expr::symbol("x"),
//! );
//! let result = limit(
//!     &expr,
//!     &LimitQuery::at("x", 0),
//!     &ReductionContext::new(),
//!     &EvaluationOptions::default(),
//! );
//! assert_eq!(result, Some(Expr::int(1)));
//! ```

pub mod assumptions;
pub mod context;
pub mod derivative;
pub mod expr;
pub mod limits;
pub mod options;
pub mod ordering;
pub mod reduce;

mod merge;
mod polynomial;
mod sample;

pub use assumptions::{AssumptionStore, Assumptions};
pub use context::ReductionContext;
pub use expr::{AcKind, Expr, ExprKind, Relation, Variable};
pub use options::{
    ApproximationMode, DenominatorAssumption, EvaluationOptions, ExpandMode,
    IntervalCalculation,
};
pub use reduce::{reduce, reduce_shallow};
