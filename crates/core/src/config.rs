//! Configuration for the simulator.
//!
//! Defines the sizing and behavioral knobs of the out-of-order core. It
//! provides:
//! 1. **Defaults:** baseline structure capacities and latencies.
//! 2. **Structure:** a flat, deserializable [`Config`] consumed by the CLI
//!    and by tests.

use serde::Deserialize;

/// Default configuration constants for the simulator.
mod defaults {
    /// Reorder buffer capacity in entries.
    pub const ROB_CAPACITY: usize = 32;

    /// Reservation station capacity in entries.
    pub const RS_CAPACITY: usize = 32;

    /// Load/store buffer capacity in entries.
    pub const LSB_CAPACITY: usize = 32;

    /// Memory access latency in cycles (applies to loads and stores).
    pub const MEM_LATENCY: u32 = 3;

    /// Safety cap on simulated cycles before giving up on termination.
    pub const CYCLE_LIMIT: u64 = 2_000_000_000;
}

/// Simulator configuration.
///
/// Use [`Config::default`] for the standard core, or deserialize one to
/// override individual fields.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Reorder buffer capacity in entries.
    pub rob_capacity: usize,
    /// Reservation station capacity in entries.
    pub rs_capacity: usize,
    /// Load/store buffer capacity in entries.
    pub lsb_capacity: usize,
    /// Memory access latency in cycles.
    pub mem_latency: u32,
    /// Safety cap on simulated cycles.
    pub cycle_limit: u64,
    /// Optional path of the per-commit register dump file.
    pub dump_registers: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rob_capacity: defaults::ROB_CAPACITY,
            rs_capacity: defaults::RS_CAPACITY,
            lsb_capacity: defaults::LSB_CAPACITY,
            mem_latency: defaults::MEM_LATENCY,
            cycle_limit: defaults::CYCLE_LIMIT,
            dump_registers: None,
        }
    }
}
