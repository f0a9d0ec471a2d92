//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Math types and light-space projection helpers
//! - Handle-based collections
//! - Time management (scheduling, stopwatch, frame clock)
//! - Logging utilities

pub mod math;
pub mod collections;
pub mod time;
pub mod logging;
