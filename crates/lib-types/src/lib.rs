//! # lib-types
//!
//! Core type definitions for the chip bead selector.
//!
//! This crate provides foundational types used throughout the workspace:
//! - Physical units with compile-time safety
//! - Inclusive acceptance windows for impedance and inductance filters
//! - Touchstone option keywords and per-sample S-parameter sets

pub mod units;
pub mod sparams;

pub use units::*;
pub use sparams::*;

/// Re-export num_complex for convenience
pub use num_complex::Complex64;
