//! Instruction Set Architecture (ISA) Definitions.
//!
//! Contains opcode and function-code tables, the typed instruction
//! representation, the decoder, and a disassembler for the 32-bit base
//! integer set.

/// Application Binary Interface (ABI) register name mappings.
pub mod abi;

/// Instruction decoding logic for all RV32I instruction formats.
pub mod decode;

/// Instruction disassembler for debug tracing and diagnostics.
pub mod disasm;

/// Typed instruction representation and bit extraction utilities.
pub mod instruction;

/// Base integer instruction set (32-bit RISC-V core instructions).
pub mod rv32i;
