//! Checks shared by every [`crate::PriorityQueue`] implementation.

pub mod stress;
