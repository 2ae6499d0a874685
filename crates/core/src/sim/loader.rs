//! Memory image loader.
//!
//! Parses the text hex image format into a [`SparseMemory`]:
//! 1. A line starting with `@` followed by a hex number moves the load
//!    cursor to that address.
//! 2. Any other non-blank line is whitespace-separated two-digit hex bytes,
//!    written to consecutive addresses.
//! 3. Blank lines are ignored.
//!
//! Images come from a file path or from any reader (the CLI uses stdin when
//! no path is given).

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::common::SimError;
use crate::mem::SparseMemory;

/// Parses a hex image from a reader.
pub fn load_image<R: BufRead>(reader: R) -> Result<SparseMemory, SimError> {
    let mut mem = SparseMemory::new();
    let mut cursor: u32 = 0;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(addr) = line.strip_prefix('@') {
            cursor = u32::from_str_radix(addr.trim(), 16).map_err(|e| SimError::Image {
                line: idx + 1,
                reason: format!("bad load address '{}': {}", addr.trim(), e),
            })?;
        } else {
            for token in line.split_whitespace() {
                let byte = u8::from_str_radix(token, 16).map_err(|e| SimError::Image {
                    line: idx + 1,
                    reason: format!("bad byte '{}': {}", token, e),
                })?;
                mem.write_u8(cursor, byte);
                cursor = cursor.wrapping_add(1);
            }
        }
    }

    Ok(mem)
}

/// Parses a hex image from a file.
pub fn load_image_file(path: &Path) -> Result<SparseMemory, SimError> {
    let file = File::open(path)?;
    load_image(BufReader::new(file))
}
