//! Simulator: owns the core and drives it to completion.

use std::path::Path;

use tracing::{debug, warn};

use crate::common::SimError;
use crate::config::Config;
use crate::core::Cpu;
use crate::isa::abi;
use crate::mem::SparseMemory;
use crate::sim::dump::RegisterDumper;

/// Top-level simulator: the core plus run-loop policy.
pub struct Simulator {
    cpu: Cpu,
    cycle_limit: u64,
    cycles: u64,
}

impl Simulator {
    /// Creates a simulator over a loaded image, attaching the register dump
    /// sink if one is configured.
    pub fn new(image: SparseMemory, config: &Config) -> Result<Self, SimError> {
        let mut cpu = Cpu::new(image, config);
        if let Some(path) = &config.dump_registers {
            cpu.attach_dumper(RegisterDumper::create(Path::new(path))?);
        }
        Ok(Self {
            cpu,
            cycle_limit: config.cycle_limit,
            cycles: 0,
        })
    }

    /// Returns the core, for inspection.
    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    /// Returns the number of simulated cycles so far.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Runs until the program terminates, returning its exit code.
    ///
    /// Hitting the cycle cap is not an error: a warning is emitted and the
    /// low 8 bits of `a0` are returned, the same register the termination
    /// trap would have reported.
    pub fn run(&mut self) -> Result<u8, SimError> {
        loop {
            self.cycles += 1;
            if let Some(code) = self.cpu.tick()? {
                debug!(cycles = self.cycles, code, "program terminated");
                return Ok(code);
            }
            if self.cycles >= self.cycle_limit {
                warn!(limit = self.cycle_limit, "cycle limit reached, giving up");
                return Ok((self.cpu.register(abi::REG_A0) & 0xFF) as u8);
            }
        }
    }
}
