use super::Expr;

/// An iterator that traverses the tree of expressions in left-to-right post-order
/// (i.e. depth-first).
///
/// This iterator is created by [`Expr::post_order_iter`].
pub struct ExprIter<'a> {
    stack: Vec<(&'a Expr, bool)>,
}

impl<'a> ExprIter<'a> {
    /// Creates a new iterator over the given expression.
    pub fn new(expr: &'a Expr) -> Self {
        Self { stack: vec![(expr, false)] }
    }
}

impl<'a> Iterator for ExprIter<'a> {
    type Item = &'a Expr;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (expr, expanded) = self.stack.pop()?;
            if expanded {
                return Some(expr);
            }

            self.stack.push((expr, true));
            let mut children = Vec::new();
            expr.for_each_child(&mut |child| children.push(child));
            for child in children.into_iter().rev() {
                self.stack.push((child, false));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_order_visits_children_first() {
        let expr = Expr::pow(
            Expr::add(vec![Expr::symbol("x"), Expr::int(1)]),
            Expr::int(2),
        );

        let order = expr
            .post_order_iter()
            .map(|node| node.to_string())
            .collect::<Vec<_>>();
        assert_eq!(order, ["x", "1", "x + 1", "2", "(x + 1)^2"]);
    }
}
