//! Per-commit register dump sink.
//!
//! Observational trace of architectural state: one line per retired
//! instruction, carrying the commit index, the instruction's PC, and all 32
//! register values. Not required for correctness; useful for diffing runs
//! against a sequential reference implementation.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Streams per-commit register snapshots to a file.
pub struct RegisterDumper {
    out: BufWriter<File>,
}

impl RegisterDumper {
    /// Creates (truncating) the dump file.
    pub fn create(path: &Path) -> io::Result<Self> {
        Ok(Self {
            out: BufWriter::new(File::create(path)?),
        })
    }

    /// Appends one commit record.
    ///
    /// Zero registers are printed compactly; non-zero values carry both
    /// decimal and hex forms.
    pub fn record(&mut self, commit_index: u64, pc: u32, regs: &[i32; 32]) -> io::Result<()> {
        write!(self.out, "[{:04}] {:#010x} |", commit_index, pc)?;
        for (i, &value) in regs.iter().enumerate() {
            if value == 0 {
                write!(self.out, " R{}(0)", i)?;
            } else {
                write!(self.out, " R{}({}={:#010x})", i, value as u32, value as u32)?;
            }
        }
        writeln!(self.out)?;
        self.out.flush()
    }
}
