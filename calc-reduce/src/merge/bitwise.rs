//! The merge operator for the bitwise family. Operands fold through the Number capability's
//! integer bit operations; non-integers never merge.

use crate::context::ReductionContext;
use crate::expr::{AcKind, Expr, ExprKind};
use crate::options::EvaluationOptions;

use super::MergeOutcome;

/// Attempts to fold a pair of operands of a bitwise AND/OR/XOR node.
pub(crate) fn merge(
    kind: AcKind,
    left: &mut Expr,
    right: &mut Expr,
    _ctx: &ReductionContext,
    _opts: &EvaluationOptions,
) -> MergeOutcome {
    if left.is_undefined_like() || right.is_undefined_like() {
        return MergeOutcome::NoMerge;
    }

    // integer folding
    if let (Some(a), Some(b)) = (left.as_number(), right.as_number()) {
        let folded = match kind {
            AcKind::BitAnd => a.checked_bit_and(b),
            AcKind::BitOr => a.checked_bit_or(b),
            AcKind::BitXor => a.checked_bit_xor(b),
            _ => unreachable!("bitwise merge dispatched for a non-bitwise kind"),
        };
        if let Some(n) = folded {
            let mut result = Expr::number(n);
            result.absorb_flags(left);
            result.absorb_flags(right);
            *left = result;
            return MergeOutcome::MergedIntoLeft;
        }
        return MergeOutcome::NoMerge;
    }

    // absorption against the annihilator / identity constants
    if let Some(outcome) = absorb_constant(kind, left, right) {
        return outcome;
    }

    // idempotence and self-cancellation
    if left == right {
        return match kind {
            AcKind::BitAnd | AcKind::BitOr => MergeOutcome::MergedEqualNoChange,
            _ => {
                let mut result = Expr::int(0);
                result.absorb_flags(left);
                result.absorb_flags(right);
                *left = result;
                MergeOutcome::MergedIntoLeft
            },
        };
    }

    // u op ~u
    if is_complement(left, right) || is_complement(right, left) {
        let value = match kind {
            AcKind::BitAnd => 0,
            // all ones
            _ => -1,
        };
        let mut result = Expr::int(value);
        result.absorb_flags(left);
        result.absorb_flags(right);
        *left = result;
        return MergeOutcome::MergedIntoLeft;
    }

    MergeOutcome::NoMerge
}

fn is_complement(a: &Expr, b: &Expr) -> bool {
    matches!(&a.kind, ExprKind::BitNot(inner) if **inner == *b)
}

/// `u & 0 = 0`, `u & -1 = u`, `u | 0 = u`, `u ^ 0 = u`.
fn absorb_constant(kind: AcKind, left: &mut Expr, right: &mut Expr) -> Option<MergeOutcome> {
    fn absorbed(kind: AcKind, constant: &Expr, other: &Expr) -> Option<Expr> {
        let n = constant.as_number()?;
        if !n.is_integer() {
            return None;
        }
        match kind {
            AcKind::BitAnd if n.is_zero() => Some(Expr::int(0)),
            AcKind::BitAnd if n.is_minus_one() => Some(other.clone()),
            AcKind::BitOr | AcKind::BitXor if n.is_zero() => Some(other.clone()),
            _ => None,
        }
    }

    if let Some(mut result) = absorbed(kind, left, right) {
        result.absorb_flags(left);
        result.absorb_flags(right);
        *left = result;
        return Some(MergeOutcome::MergedIntoLeft);
    }
    if let Some(mut result) = absorbed(kind, right, left) {
        result.absorb_flags(left);
        result.absorb_flags(right);
        *right = result;
        return Some(MergeOutcome::MergedIntoRight);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn merge_kind(kind: AcKind, left: &Expr, right: &Expr) -> Option<Expr> {
        let ctx = ReductionContext::new();
        let opts = EvaluationOptions::default();
        let mut l = left.clone();
        let mut r = right.clone();
        match merge(kind, &mut l, &mut r, &ctx, &opts) {
            MergeOutcome::MergedIntoLeft | MergeOutcome::MergedEqualNoChange => Some(l),
            MergeOutcome::MergedIntoRight => Some(r),
            _ => None,
        }
    }

    #[test]
    fn integers_fold() {
        assert_eq!(
            merge_kind(AcKind::BitAnd, &Expr::int(12), &Expr::int(10)),
            Some(Expr::int(8)),
        );
        assert_eq!(
            merge_kind(AcKind::BitOr, &Expr::int(12), &Expr::int(10)),
            Some(Expr::int(14)),
        );
        assert_eq!(
            merge_kind(AcKind::BitXor, &Expr::int(12), &Expr::int(10)),
            Some(Expr::int(6)),
        );
    }

    #[test]
    fn non_integers_stay() {
        let half = Expr::number(calc_num::Number::fraction(1, 2));
        assert_eq!(merge_kind(AcKind::BitAnd, &half, &Expr::int(3)), None);
    }

    #[test]
    fn absorption() {
        let u = Expr::symbol("u");
        assert_eq!(merge_kind(AcKind::BitAnd, &u, &Expr::int(0)), Some(Expr::int(0)));
        assert_eq!(merge_kind(AcKind::BitAnd, &u, &Expr::int(-1)), Some(u.clone()));
        assert_eq!(merge_kind(AcKind::BitOr, &u, &Expr::int(0)), Some(u.clone()));
        assert_eq!(merge_kind(AcKind::BitXor, &Expr::int(0), &u), Some(u.clone()));
    }

    #[test]
    fn xor_cancels_itself() {
        let u = Expr::symbol("u");
        assert_eq!(merge_kind(AcKind::BitXor, &u, &u), Some(Expr::int(0)));
        assert_eq!(merge_kind(AcKind::BitAnd, &u, &u), Some(u.clone()));
    }

    #[test]
    fn complement_rules() {
        let u = Expr::symbol("u");
        let not_u = Expr::new(ExprKind::BitNot(Box::new(u.clone())));
        assert_eq!(merge_kind(AcKind::BitAnd, &u, &not_u), Some(Expr::int(0)));
        assert_eq!(merge_kind(AcKind::BitOr, &u, &not_u), Some(Expr::int(-1)));
        assert_eq!(merge_kind(AcKind::BitXor, &u, &not_u), Some(Expr::int(-1)));
    }
}
