//! Shared numeric helpers

pub mod linalg;

pub use linalg::{cholesky_solve, ridge_fit};
