//! Simulator error definitions.
//!
//! This module defines the error type surfaced by the loader and the
//! execution engine. Structural stalls (full ROB/RS/LSB) are *not* errors;
//! components report those through `is_full`-style predicates and the
//! front-end simply retries. Normal program termination is not an error
//! either — it is reported through the tick return value.

use std::fmt;
use std::io;

/// Errors that abort a simulation.
#[derive(Debug)]
pub enum SimError {
    /// An I/O failure while reading the memory image.
    Io(io::Error),

    /// A malformed line in the hex memory image.
    ///
    /// Carries the 1-based line number and a description of the problem.
    Image { line: usize, reason: String },

    /// An instruction fetch outside the loaded image with no instructions in
    /// flight, so no pending flush can ever redirect the program counter.
    /// The associated value is the faulting address.
    FetchOutOfBounds(u32),

    /// A fetched word that does not decode to any RV32I instruction, reached
    /// with no instructions in flight.
    IllegalInstruction { pc: u32, word: u32 },
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::Io(e) => write!(f, "i/o error: {}", e),
            SimError::Image { line, reason } => {
                write!(f, "malformed memory image at line {}: {}", line, reason)
            }
            SimError::FetchOutOfBounds(addr) => {
                write!(f, "instruction fetch outside loaded image at {:#010x}", addr)
            }
            SimError::IllegalInstruction { pc, word } => {
                write!(f, "illegal instruction {:#010x} at {:#010x}", word, pc)
            }
        }
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for SimError {
    fn from(e: io::Error) -> Self {
        SimError::Io(e)
    }
}
