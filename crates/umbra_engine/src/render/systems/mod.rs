//! Active rendering systems
//!
//! Stateful runtime systems driven once per frame.

pub mod lighting;
