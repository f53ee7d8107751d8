//! Rule evaluation: AND-combined conditions over indicator snapshots.

pub mod condition;
pub mod evaluator;

pub use condition::{Comparand, Condition, Operator};
pub use evaluator::{evaluate, matches_all, EQUALITY_EPSILON};
