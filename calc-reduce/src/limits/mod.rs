//! Symbolic limits, built on the reduction driver.
//!
//! [`limit`] substitutes an approach marker for the target variable, reduces, and resolves
//! indeterminate forms via algebraic restructuring, asymptotic growth comparison, and
//! L'Hôpital's rule. See [`engine`] for the algorithm and [`types`] for the query vocabulary.

mod engine;
mod growth;
mod types;

pub use engine::limit;
pub use types::{Approach, LimitPoint, LimitQuery};
