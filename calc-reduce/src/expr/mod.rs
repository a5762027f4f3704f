//! A representation of mathematical expressions that is easy to rewrite in place.
//!
//! Expressions are trees of [`Expr`] nodes. Associative/commutative operations (addition,
//! multiplication, the logical and bitwise families) are **flattened**: `x + (y + z)` is a single
//! [`ExprKind::Add`] node with three children. Flattening puts every sibling of a commutative
//! operation at the same level, which is what allows the merge operators to scan unordered pairs
//! of operands.
//!
//! # Strict equality
//!
//! Determining whether two expressions are *semantically* equal is intractable in general, so
//! this module implements **strict equality**: two nodes are equal if they have the same kind and
//! strictly equal children, in any order for the commutative kinds. Strict equality never reports
//! false positives, and once a reduction pass has applied [canonical
//! ordering](crate::ordering), strictly equal expressions are identical node-for-node.
//!
//! # Attributes
//!
//! Every node carries two derived attributes: `approx`, true if any descendant's arithmetic lost
//! exactness, and `precision`, the tightest significant-digit bound contributed by any
//! descendant. Constructors compute them; in-place mutations must finish with
//! [`Expr::update_flags`] so the markers are never silently dropped.

mod iter;

use calc_num::{Number, Sign};
use std::cmp::Ordering;
use std::fmt::{self, Display, Formatter};
use std::rc::Rc;

use crate::assumptions::Assumptions;
pub use iter::ExprIter;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A named unknown with caller-supplied assumptions attached.
///
/// Variables are shared between the caller and every node that references them, which is the one
/// place the engine uses a reference-counted handle instead of exclusive ownership.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Variable {
    pub name: String,
    pub assumptions: Assumptions,
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Variable {}

/// The relation of a [`ExprKind::Comparison`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Relation {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Relation {
    /// The logical negation of the relation.
    pub fn negate(self) -> Self {
        match self {
            Self::Eq => Self::Ne,
            Self::Ne => Self::Eq,
            Self::Lt => Self::Ge,
            Self::Le => Self::Gt,
            Self::Gt => Self::Le,
            Self::Ge => Self::Lt,
        }
    }

    /// The relation with its operands swapped.
    pub fn flip(self) -> Self {
        match self {
            Self::Lt => Self::Gt,
            Self::Le => Self::Ge,
            Self::Gt => Self::Lt,
            Self::Ge => Self::Le,
            rel => rel,
        }
    }

    /// Whether the relation holds for the given ordering of its operands.
    pub fn test(self, ord: Ordering) -> bool {
        match self {
            Self::Eq => ord == Ordering::Equal,
            Self::Ne => ord != Ordering::Equal,
            Self::Lt => ord == Ordering::Less,
            Self::Le => ord != Ordering::Greater,
            Self::Gt => ord == Ordering::Greater,
            Self::Ge => ord != Ordering::Less,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

/// The associative/commutative node kinds, used to dispatch merge operators and identity
/// elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AcKind {
    Add,
    Mul,
    LogicalAnd,
    LogicalOr,
    LogicalXor,
    BitAnd,
    BitOr,
    BitXor,
}

impl AcKind {
    /// The identity element an empty node of this kind collapses to.
    ///
    /// Bitwise AND collapses to −1, the all-ones value in two's complement.
    pub fn identity(self) -> Expr {
        match self {
            Self::Add | Self::LogicalOr | Self::LogicalXor | Self::BitOr | Self::BitXor => {
                Expr::int(0)
            },
            Self::Mul | Self::LogicalAnd => Expr::int(1),
            Self::BitAnd => Expr::int(-1),
        }
    }
}

/// A node in an expression tree.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ExprKind {
    /// A numeric value.
    Number(Number),

    /// Multiple terms added together.
    Add(Vec<Expr>),

    /// Multiple factors multiplied together.
    Mul(Vec<Expr>),

    /// A base raised to an exponent. Always exactly two operands.
    Pow(Box<Expr>, Box<Expr>),

    LogicalAnd(Vec<Expr>),
    LogicalOr(Vec<Expr>),
    LogicalXor(Vec<Expr>),
    LogicalNot(Box<Expr>),

    BitAnd(Vec<Expr>),
    BitOr(Vec<Expr>),
    BitXor(Vec<Expr>),
    BitNot(Box<Expr>),

    /// A relation between exactly two operands.
    Comparison(Relation, Box<Expr>, Box<Expr>),

    /// A function call, such as `sin(x)`.
    Function(String, Vec<Expr>),

    /// A named unknown carrying assumptions.
    Variable(Rc<Variable>),

    /// A free symbol with no attached knowledge.
    Symbol(String),

    /// A measurement unit, optionally scaled by a metric power-of-ten prefix.
    Unit { name: String, prefix: Option<i32> },

    /// A row of expressions.
    Vector(Vec<Expr>),

    /// Rows of rows.
    Matrix(Vec<Vec<Expr>>),

    /// A point in time, in seconds since the Unix epoch.
    DateTime(i64),

    /// A value that is known not to exist.
    Undefined,

    /// The leftover of a cancelled computation.
    Aborted,
}

/// A mathematical expression together with its derived exactness attributes.
#[derive(Debug, Clone, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Expr {
    /// The node itself. Code that mutates this in place must call [`Expr::update_flags`]
    /// afterwards.
    pub kind: ExprKind,

    approx: bool,
    precision: Option<u32>,
}

impl Expr {
    /// Creates an expression from a node, computing its attributes from the children.
    pub fn new(kind: ExprKind) -> Self {
        let (approx, precision) = compute_flags(&kind);
        Self { kind, approx, precision }
    }

    /// Creates a numeric leaf.
    pub fn number(n: impl Into<Number>) -> Self {
        Self::new(ExprKind::Number(n.into()))
    }

    /// Creates an exact integer leaf.
    pub fn int(n: i64) -> Self {
        Self::number(Number::int(n))
    }

    /// Creates a free symbol leaf.
    pub fn symbol(name: impl Into<String>) -> Self {
        Self::new(ExprKind::Symbol(name.into()))
    }

    /// Creates a variable leaf with the given assumptions.
    pub fn variable(name: impl Into<String>, assumptions: Assumptions) -> Self {
        Self::new(ExprKind::Variable(Rc::new(Variable { name: name.into(), assumptions })))
    }

    /// Creates a unit leaf.
    pub fn unit(name: impl Into<String>) -> Self {
        Self::new(ExprKind::Unit { name: name.into(), prefix: None })
    }

    /// Creates a function call.
    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::new(ExprKind::Function(name.into(), args))
    }

    /// Creates an undefined leaf.
    pub fn undefined() -> Self {
        Self::new(ExprKind::Undefined)
    }

    /// Creates a sum, flattening nested sums one level.
    pub fn add(terms: Vec<Expr>) -> Self {
        let mut flat = Vec::with_capacity(terms.len());
        for term in terms {
            match term.kind {
                ExprKind::Add(inner) => flat.extend(inner),
                _ => flat.push(term),
            }
        }
        Self::new(ExprKind::Add(flat)).downgrade()
    }

    /// Creates a product, flattening nested products one level.
    pub fn mul(factors: Vec<Expr>) -> Self {
        let mut flat = Vec::with_capacity(factors.len());
        for factor in factors {
            match factor.kind {
                ExprKind::Mul(inner) => flat.extend(inner),
                _ => flat.push(factor),
            }
        }
        Self::new(ExprKind::Mul(flat)).downgrade()
    }

    /// Creates a power.
    pub fn pow(base: Expr, exponent: Expr) -> Self {
        Self::new(ExprKind::Pow(Box::new(base), Box::new(exponent)))
    }

    /// Creates a comparison.
    pub fn comparison(relation: Relation, left: Expr, right: Expr) -> Self {
        Self::new(ExprKind::Comparison(relation, Box::new(left), Box::new(right)))
    }

    /// Creates a fraction: a product of the numerator and the denominator raised to the power
    /// of −1.
    pub fn fraction(numerator: Expr, denominator: Expr) -> Self {
        Self::mul(vec![numerator, Self::pow(denominator, Self::int(-1))])
    }

    /// Returns the square root of this expression. No simplification is done.
    pub fn sqrt(self) -> Self {
        Self::pow(self, Self::number(Number::fraction(1, 2)))
    }

    /// Multiplies this expression by −1, negating numeric leaves directly.
    pub fn neg(self) -> Self {
        match self.kind {
            ExprKind::Number(n) => Self::number(-n),
            _ => Self::mul(vec![Self::int(-1), self]),
        }
    }

    /// True if any descendant's arithmetic lost exactness.
    pub fn is_approximate(&self) -> bool {
        self.approx
    }

    /// The tightest significant-digit bound contributed by any descendant, if any arithmetic was
    /// approximate.
    pub fn precision(&self) -> Option<u32> {
        self.precision
    }

    /// Recomputes `approx`/`precision` from the node's payload and its direct children. The
    /// children's own attributes must already be correct.
    pub fn update_flags(&mut self) {
        let (approx, precision) = compute_flags(&self.kind);
        self.approx = approx;
        self.precision = precision;
    }

    /// Merges another node's attributes into this one, used when an operand is absorbed.
    pub fn absorb_flags(&mut self, other: &Expr) {
        self.approx |= other.approx;
        self.precision = min_precision(self.precision, other.precision);
    }

    /// If the node is a number, returns it.
    pub fn as_number(&self) -> Option<&Number> {
        match &self.kind {
            ExprKind::Number(n) => Some(n),
            _ => None,
        }
    }

    /// True if the node is a number.
    pub fn is_number(&self) -> bool {
        matches!(self.kind, ExprKind::Number(_))
    }

    /// True if the node is the number zero.
    pub fn is_zero_number(&self) -> bool {
        self.as_number().map(Number::is_zero).unwrap_or(false)
    }

    /// True if the node is the number one.
    pub fn is_one_number(&self) -> bool {
        self.as_number().map(Number::is_one).unwrap_or(false)
    }

    /// If the node is an integer-valued number, returns the integer.
    pub fn as_integer(&self) -> Option<rug::Integer> {
        self.as_number().and_then(Number::as_integer)
    }

    /// If the node is a symbol or variable, returns its name.
    pub fn as_symbol(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Symbol(name) => Some(name),
            ExprKind::Variable(var) => Some(&var.name),
            _ => None,
        }
    }

    /// If the node is `n^-1` with a numeric `n`, returns `n` (the denominator of a fraction).
    pub fn as_number_recip(&self) -> Option<&Number> {
        if let ExprKind::Pow(base, exp) = &self.kind {
            if exp.as_number().map(Number::is_minus_one).unwrap_or(false) {
                return base.as_number();
            }
        }
        None
    }

    /// True if the node is [`ExprKind::Undefined`] or [`ExprKind::Aborted`].
    pub fn is_undefined_like(&self) -> bool {
        matches!(self.kind, ExprKind::Undefined | ExprKind::Aborted)
    }

    /// The associative/commutative kind of the node, if it has one.
    pub fn ac_kind(&self) -> Option<AcKind> {
        match self.kind {
            ExprKind::Add(_) => Some(AcKind::Add),
            ExprKind::Mul(_) => Some(AcKind::Mul),
            ExprKind::LogicalAnd(_) => Some(AcKind::LogicalAnd),
            ExprKind::LogicalOr(_) => Some(AcKind::LogicalOr),
            ExprKind::LogicalXor(_) => Some(AcKind::LogicalXor),
            ExprKind::BitAnd(_) => Some(AcKind::BitAnd),
            ExprKind::BitOr(_) => Some(AcKind::BitOr),
            ExprKind::BitXor(_) => Some(AcKind::BitXor),
            _ => None,
        }
    }

    /// The children of an associative/commutative node.
    pub fn ac_children(&self) -> Option<&Vec<Expr>> {
        match &self.kind {
            ExprKind::Add(c)
            | ExprKind::Mul(c)
            | ExprKind::LogicalAnd(c)
            | ExprKind::LogicalOr(c)
            | ExprKind::LogicalXor(c)
            | ExprKind::BitAnd(c)
            | ExprKind::BitOr(c)
            | ExprKind::BitXor(c) => Some(c),
            _ => None,
        }
    }

    /// The children of an associative/commutative node, mutably.
    pub fn ac_children_mut(&mut self) -> Option<&mut Vec<Expr>> {
        match &mut self.kind {
            ExprKind::Add(c)
            | ExprKind::Mul(c)
            | ExprKind::LogicalAnd(c)
            | ExprKind::LogicalOr(c)
            | ExprKind::LogicalXor(c)
            | ExprKind::BitAnd(c)
            | ExprKind::BitOr(c)
            | ExprKind::BitXor(c) => Some(c),
            _ => None,
        }
    }

    /// Builds an associative/commutative node of the given kind.
    pub fn from_ac(kind: AcKind, children: Vec<Expr>) -> Expr {
        let kind = match kind {
            AcKind::Add => ExprKind::Add(children),
            AcKind::Mul => ExprKind::Mul(children),
            AcKind::LogicalAnd => ExprKind::LogicalAnd(children),
            AcKind::LogicalOr => ExprKind::LogicalOr(children),
            AcKind::LogicalXor => ExprKind::LogicalXor(children),
            AcKind::BitAnd => ExprKind::BitAnd(children),
            AcKind::BitOr => ExprKind::BitOr(children),
            AcKind::BitXor => ExprKind::BitXor(children),
        };
        Expr::new(kind)
    }

    /// Takes the expression out of the slot, leaving [`ExprKind::Undefined`] behind. The caller
    /// is expected to overwrite the slot.
    pub fn take(&mut self) -> Expr {
        std::mem::replace(self, Expr::undefined())
    }

    /// Replaces this node with another, keeping the slot identity.
    pub fn replace_with(&mut self, other: Expr) {
        *self = other;
    }

    /// Inserts a child at `index` in an associative node. Returns false if the node has no child
    /// list.
    pub fn insert_child(&mut self, index: usize, child: Expr) -> bool {
        match self.ac_children_mut() {
            Some(children) => {
                children.insert(index, child);
                self.update_flags();
                true
            },
            None => false,
        }
    }

    /// Removes and returns the child at `index` of an associative node.
    pub fn remove_child(&mut self, index: usize) -> Option<Expr> {
        let children = self.ac_children_mut()?;
        if index >= children.len() {
            return None;
        }
        let child = children.remove(index);
        self.update_flags();
        Some(child)
    }

    /// Swaps two children of an associative node.
    pub fn swap_children(&mut self, a: usize, b: usize) -> bool {
        match self.ac_children_mut() {
            Some(children) if a < children.len() && b < children.len() => {
                children.swap(a, b);
                true
            },
            _ => false,
        }
    }

    /// Trivially downgrades the expression into a simpler form.
    ///
    /// An associative node with a single child becomes that child; one with no children becomes
    /// the kind's identity element. The absorbed node's attributes are kept.
    pub fn downgrade(self) -> Self {
        let Some(kind) = self.ac_kind() else { return self };
        let approx = self.approx;
        let precision = self.precision;
        let children = match self.kind {
            ExprKind::Add(c)
            | ExprKind::Mul(c)
            | ExprKind::LogicalAnd(c)
            | ExprKind::LogicalOr(c)
            | ExprKind::LogicalXor(c)
            | ExprKind::BitAnd(c)
            | ExprKind::BitOr(c)
            | ExprKind::BitXor(c) => c,
            _ => unreachable!(),
        };

        let mut result = match children.len() {
            0 => kind.identity(),
            1 => children.into_iter().next().unwrap(),
            _ => Expr::from_ac(kind, children),
        };
        result.approx |= approx;
        result.precision = min_precision(result.precision, precision);
        result
    }

    /// In-place version of [`Expr::downgrade`].
    pub fn collapse(&mut self) {
        if self.ac_children().map(|c| c.len() < 2).unwrap_or(false) {
            let taken = self.take();
            *self = taken.downgrade();
        }
    }

    /// Converts an associative node from one kind to another, keeping its children.
    pub fn morph_ac(&mut self, kind: AcKind) -> bool {
        let Some(children) = self.ac_children_mut() else { return false };
        let children = std::mem::take(children);
        *self = Expr::from_ac(kind, children);
        true
    }

    /// Calls `f` with each direct child.
    pub fn for_each_child<'a>(&'a self, f: &mut impl FnMut(&'a Expr)) {
        match &self.kind {
            ExprKind::Add(c)
            | ExprKind::Mul(c)
            | ExprKind::LogicalAnd(c)
            | ExprKind::LogicalOr(c)
            | ExprKind::LogicalXor(c)
            | ExprKind::BitAnd(c)
            | ExprKind::BitOr(c)
            | ExprKind::BitXor(c)
            | ExprKind::Function(_, c)
            | ExprKind::Vector(c) => c.iter().for_each(f),
            ExprKind::Pow(a, b) | ExprKind::Comparison(_, a, b) => {
                f(a);
                f(b);
            },
            ExprKind::LogicalNot(a) | ExprKind::BitNot(a) => f(a),
            ExprKind::Matrix(rows) => rows.iter().flatten().for_each(f),
            ExprKind::Number(_)
            | ExprKind::Variable(_)
            | ExprKind::Symbol(_)
            | ExprKind::Unit { .. }
            | ExprKind::DateTime(_)
            | ExprKind::Undefined
            | ExprKind::Aborted => {},
        }
    }

    /// Calls `f` with each direct child, mutably.
    pub fn for_each_child_mut(&mut self, f: &mut impl FnMut(&mut Expr)) {
        match &mut self.kind {
            ExprKind::Add(c)
            | ExprKind::Mul(c)
            | ExprKind::LogicalAnd(c)
            | ExprKind::LogicalOr(c)
            | ExprKind::LogicalXor(c)
            | ExprKind::BitAnd(c)
            | ExprKind::BitOr(c)
            | ExprKind::BitXor(c)
            | ExprKind::Function(_, c)
            | ExprKind::Vector(c) => c.iter_mut().for_each(f),
            ExprKind::Pow(a, b) | ExprKind::Comparison(_, a, b) => {
                f(a);
                f(b);
            },
            ExprKind::LogicalNot(a) | ExprKind::BitNot(a) => f(a),
            ExprKind::Matrix(rows) => rows.iter_mut().flatten().for_each(f),
            ExprKind::Number(_)
            | ExprKind::Variable(_)
            | ExprKind::Symbol(_)
            | ExprKind::Unit { .. }
            | ExprKind::DateTime(_)
            | ExprKind::Undefined
            | ExprKind::Aborted => {},
        }
    }

    /// Replaces every occurrence of the named symbol or variable with `replacement`. Returns
    /// true if anything changed.
    pub fn substitute_symbol(&mut self, name: &str, replacement: &Expr) -> bool {
        if self.as_symbol() == Some(name) {
            *self = replacement.clone();
            return true;
        }
        let mut changed = false;
        self.for_each_child_mut(&mut |child| {
            changed |= child.substitute_symbol(name, replacement);
        });
        if changed {
            self.update_flags();
        }
        changed
    }

    /// True if the named symbol or variable occurs anywhere in the tree.
    pub fn contains_symbol(&self, name: &str) -> bool {
        if self.as_symbol() == Some(name) {
            return true;
        }
        let mut found = false;
        self.for_each_child(&mut |child| {
            found |= child.contains_symbol(name);
        });
        found
    }

    /// The single free symbol of the tree, if there is exactly one distinct name.
    pub fn free_symbol(&self) -> Option<String> {
        fn walk<'a>(expr: &'a Expr, found: &mut Result<Option<&'a str>, ()>) {
            if found.is_err() {
                return;
            }
            if let Some(name) = expr.as_symbol() {
                match found {
                    Ok(Some(existing)) if *existing != name => *found = Err(()),
                    Ok(None) => *found = Ok(Some(name)),
                    _ => {},
                }
                return;
            }
            expr.for_each_child(&mut |child| walk(child, found));
        }

        let mut found = Ok(None);
        walk(self, &mut found);
        found.ok().flatten().map(str::to_string)
    }

    /// The number of nodes in the tree, including this one.
    pub fn node_count(&self) -> usize {
        let mut count = 1;
        self.for_each_child(&mut |child| count += child.node_count());
        count
    }

    /// Returns an iterator that traverses the tree in left-to-right post-order.
    pub fn post_order_iter(&self) -> ExprIter {
        ExprIter::new(self)
    }

    /// If the node is a number, its truth value (non-zero is true).
    pub fn as_bool(&self) -> Option<bool> {
        self.as_number().map(|n| !n.is_zero())
    }

    /// The sign of the variable's assumptions, if the node is a variable.
    pub fn assumed_sign(&self) -> Option<Sign> {
        match &self.kind {
            ExprKind::Variable(var) => Some(var.assumptions.sign),
            _ => None,
        }
    }
}

/// Computes the derived attributes of a node from its payload and its children's attributes.
fn compute_flags(kind: &ExprKind) -> (bool, Option<u32>) {
    use ExprKind::*;

    let mut approx = false;
    let mut precision = None;
    let mut visit = |child: &Expr| {
        approx |= child.approx;
        precision = min_precision(precision, child.precision);
    };

    match kind {
        Number(n) => return (n.is_approximate(), n.precision()),
        Add(c) | Mul(c) | LogicalAnd(c) | LogicalOr(c) | LogicalXor(c) | BitAnd(c)
        | BitOr(c) | BitXor(c) | Function(_, c) | Vector(c) => c.iter().for_each(&mut visit),
        Pow(a, b) | Comparison(_, a, b) => {
            visit(a);
            visit(b);
        },
        LogicalNot(a) | BitNot(a) => visit(a),
        Matrix(rows) => rows.iter().flatten().for_each(&mut visit),
        Variable(_) | Symbol(_) | Unit { .. } | DateTime(_) | Undefined | Aborted => {},
    }

    (approx, precision)
}

fn min_precision(a: Option<u32>, b: Option<u32>) -> Option<u32> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (Some(a), None) | (None, Some(a)) => Some(a),
        (None, None) => None,
    }
}

/// Checks if two expressions are **strictly** equal.
///
/// Commutative children may appear in any order; [`ExprKind::Pow`] and
/// [`ExprKind::Comparison`] operands have fixed roles. The derived attributes do not
/// participate: they are a property of the arithmetic, not the shape.
impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        /// The binding strength of a node, used to decide where parentheses are needed.
        fn precedence(expr: &Expr) -> u8 {
            match expr.kind {
                ExprKind::LogicalAnd(_)
                | ExprKind::LogicalOr(_)
                | ExprKind::LogicalXor(_)
                | ExprKind::LogicalNot(_)
                | ExprKind::BitAnd(_)
                | ExprKind::BitOr(_)
                | ExprKind::BitXor(_)
                | ExprKind::BitNot(_) => 0,
                ExprKind::Comparison(..) => 1,
                ExprKind::Add(_) => 2,
                ExprKind::Mul(_) => 3,
                ExprKind::Pow(..) => 4,
                _ => 5,
            }
        }

        fn write_child(f: &mut Formatter<'_>, child: &Expr, min: u8) -> fmt::Result {
            if precedence(child) >= min {
                write!(f, "{}", child)
            } else {
                write!(f, "({})", child)
            }
        }

        fn write_joined(
            f: &mut Formatter<'_>,
            children: &[Expr],
            separator: &str,
            min: u8,
        ) -> fmt::Result {
            let mut iter = children.iter();
            if let Some(first) = iter.next() {
                write_child(f, first, min)?;
                for child in iter {
                    write!(f, "{}", separator)?;
                    write_child(f, child, min)?;
                }
            }
            Ok(())
        }

        match &self.kind {
            ExprKind::Number(n) => write!(f, "{}", n),
            ExprKind::Symbol(name) => write!(f, "{}", name),
            ExprKind::Variable(var) => write!(f, "{}", var.name),
            ExprKind::Unit { name, prefix: None } => write!(f, "{}", name),
            ExprKind::Unit { name, prefix: Some(p) } => write!(f, "10^{} {}", p, name),
            ExprKind::DateTime(t) => write!(f, "@{}", t),
            ExprKind::Undefined => write!(f, "undefined"),
            ExprKind::Aborted => write!(f, "aborted"),
            ExprKind::Function(name, args) => {
                write!(f, "{}(", name)?;
                write_joined(f, args, ", ", 0)?;
                write!(f, ")")
            },
            ExprKind::Add(terms) => write_joined(f, terms, " + ", 3),
            ExprKind::Mul(factors) => write_joined(f, factors, " * ", 4),
            ExprKind::Pow(base, exp) => {
                write_child(f, base, 5)?;
                write!(f, "^")?;
                write_child(f, exp, 5)
            },
            ExprKind::LogicalAnd(c) => write_joined(f, c, " and ", 1),
            ExprKind::LogicalOr(c) => write_joined(f, c, " or ", 1),
            ExprKind::LogicalXor(c) => write_joined(f, c, " xor ", 1),
            ExprKind::LogicalNot(c) => {
                write!(f, "not ")?;
                write_child(f, c, 1)
            },
            ExprKind::BitAnd(c) => write_joined(f, c, " & ", 1),
            ExprKind::BitOr(c) => write_joined(f, c, " | ", 1),
            ExprKind::BitXor(c) => write_joined(f, c, " >< ", 1),
            ExprKind::BitNot(c) => {
                write!(f, "~")?;
                write_child(f, c, 1)
            },
            ExprKind::Comparison(rel, left, right) => {
                write_child(f, left, 2)?;
                write!(f, " {} ", rel.symbol())?;
                write_child(f, right, 2)
            },
            ExprKind::Vector(elements) => {
                write!(f, "[")?;
                write_joined(f, elements, ", ", 0)?;
                write!(f, "]")
            },
            ExprKind::Matrix(rows) => {
                write!(f, "[")?;
                let mut first = true;
                for row in rows {
                    if !first {
                        write!(f, "; ")?;
                    }
                    first = false;
                    write_joined(f, row, ", ", 0)?;
                }
                write!(f, "]")
            },
        }
    }
}

impl PartialEq for ExprKind {
    fn eq(&self, other: &Self) -> bool {
        use ExprKind::*;

        fn multiset_eq(lhs: &[Expr], rhs: &[Expr]) -> bool {
            lhs.len() == rhs.len() && {
                let mut used = vec![false; rhs.len()];
                lhs.iter().all(|item| {
                    rhs.iter().enumerate().any(|(i, candidate)| {
                        if !used[i] && item == candidate {
                            used[i] = true;
                            true
                        } else {
                            false
                        }
                    })
                })
            }
        }

        match (self, other) {
            (Number(a), Number(b)) => a == b,
            (Add(a), Add(b))
            | (Mul(a), Mul(b))
            | (LogicalAnd(a), LogicalAnd(b))
            | (LogicalOr(a), LogicalOr(b))
            | (LogicalXor(a), LogicalXor(b))
            | (BitAnd(a), BitAnd(b))
            | (BitOr(a), BitOr(b))
            | (BitXor(a), BitXor(b)) => multiset_eq(a, b),
            (Pow(a1, a2), Pow(b1, b2)) => a1 == b1 && a2 == b2,
            (LogicalNot(a), LogicalNot(b)) | (BitNot(a), BitNot(b)) => a == b,
            (Comparison(ra, a1, a2), Comparison(rb, b1, b2)) => {
                ra == rb && a1 == b1 && a2 == b2
            },
            (Function(na, aa), Function(nb, ab)) => na == nb && aa == ab,
            (Variable(a), Variable(b)) => a == b,
            (Symbol(a), Symbol(b)) => a == b,
            (Unit { name: na, prefix: pa }, Unit { name: nb, prefix: pb }) => {
                na == nb && pa == pb
            },
            (Vector(a), Vector(b)) => a == b,
            (Matrix(a), Matrix(b)) => a == b,
            (DateTime(a), DateTime(b)) => a == b,
            (Undefined, Undefined) | (Aborted, Aborted) => true,
            _ => false,
        }
    }
}

impl Eq for ExprKind {}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn strict_equality_ignores_order() {
        let a = Expr::add(vec![Expr::symbol("x"), Expr::symbol("y"), Expr::int(2)]);
        let b = Expr::add(vec![Expr::int(2), Expr::symbol("y"), Expr::symbol("x")]);
        assert_eq!(a, b);
    }

    #[test]
    fn strict_equality_respects_power_roles() {
        let a = Expr::pow(Expr::symbol("x"), Expr::int(2));
        let b = Expr::pow(Expr::int(2), Expr::symbol("x"));
        assert_ne!(a, b);
    }

    #[test]
    fn constructors_flatten_one_level() {
        let nested = Expr::add(vec![
            Expr::symbol("x"),
            Expr::add(vec![Expr::symbol("y"), Expr::symbol("z")]),
        ]);
        assert_eq!(nested.ac_children().unwrap().len(), 3);
    }

    #[test]
    fn downgrade_collapses_to_identity() {
        let empty = Expr::new(ExprKind::Add(Vec::new())).downgrade();
        assert_eq!(empty, Expr::int(0));

        let empty_mul = Expr::new(ExprKind::Mul(Vec::new())).downgrade();
        assert_eq!(empty_mul, Expr::int(1));

        let single = Expr::new(ExprKind::Mul(vec![Expr::symbol("x")])).downgrade();
        assert_eq!(single, Expr::symbol("x"));
    }

    #[test]
    fn approx_propagates_through_constructors() {
        let approximate = Expr::number(Number::Float(calc_num::primitive::float(1.5)));
        assert!(approximate.is_approximate());
        assert!(approximate.precision().is_some());

        let sum = Expr::add(vec![Expr::symbol("x"), approximate]);
        assert!(sum.is_approximate());
        assert!(sum.precision().is_some());

        let exact = Expr::add(vec![Expr::symbol("x"), Expr::int(3)]);
        assert!(!exact.is_approximate());
        assert_eq!(exact.precision(), None);
    }

    #[test]
    fn substitution_replaces_all_occurrences() {
        let mut expr = Expr::add(vec![
            Expr::symbol("x"),
            Expr::mul(vec![Expr::int(2), Expr::symbol("x")]),
            Expr::symbol("y"),
        ]);
        assert!(expr.substitute_symbol("x", &Expr::int(3)));
        assert!(!expr.contains_symbol("x"));
        assert!(expr.contains_symbol("y"));
    }

    #[test]
    fn free_symbol_detection() {
        let one = Expr::mul(vec![Expr::int(2), Expr::symbol("x")]);
        assert_eq!(one.free_symbol().as_deref(), Some("x"));

        let two = Expr::add(vec![Expr::symbol("x"), Expr::symbol("y")]);
        assert_eq!(two.free_symbol(), None);

        let none = Expr::int(5);
        assert_eq!(none.free_symbol(), None);
    }

    #[test]
    fn node_count_counts_all_nodes() {
        let expr = Expr::pow(
            Expr::add(vec![Expr::symbol("x"), Expr::int(1)]),
            Expr::int(2),
        );
        assert_eq!(expr.node_count(), 5);
    }

    #[test]
    fn display_is_readable() {
        let expr = Expr::add(vec![
            Expr::pow(Expr::symbol("x"), Expr::int(2)),
            Expr::mul(vec![Expr::int(3), Expr::symbol("x")]),
        ]);
        assert_eq!(expr.to_string(), "x^2 + 3 * x");
    }
}
