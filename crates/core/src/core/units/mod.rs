//! Functional units.
//!
//! Each unit is single-slot and double-buffered: an operation latched in one
//! cycle is visible at the unit's broadcast port two ticks later, so readers
//! within a cycle always observe a stable value.

/// Arithmetic logic unit.
pub mod alu;
/// Branch/jump unit with the dynamic predictor.
pub mod predictor;
