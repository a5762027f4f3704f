//! Arbitrary-precision numeric tower for the calc reduction engine.
//!
//! The engine treats numbers as an opaque capability: an exact rational, an approximate real or
//! complex value, a real interval, or a signed infinity, with checked arithmetic that refuses to
//! produce indeterminate or out-of-domain results. The representation is built on [`rug`]
//! (`Integer`, `Rational`, `Float`, `Complex`); nothing outside this crate touches rug types for
//! arithmetic.
//!
//! See [`Number`] for the operations the engine consumes.

pub mod consts;
pub mod primitive;
pub mod value;

pub use value::{InfSign, Number, Sign};
