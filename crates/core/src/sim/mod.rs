//! Simulation entry points: image loading, the run loop, and trace sinks.

/// Per-commit register dump sink.
pub mod dump;
/// Hex memory image loader.
pub mod loader;
/// Run loop and cycle-cap policy.
pub mod simulator;

pub use simulator::Simulator;
