//! Out-of-order pipeline structures.
//!
//! The three bookkeeping structures of the Tomasulo engine: the reorder
//! buffer that retires in program order, the reservation station that holds
//! issued work until its operands arrive, and the load/store buffer that
//! serializes memory traffic.

/// Load/store buffer and its fixed-latency memory port.
pub mod lsb;
/// Reorder buffer for in-order retirement.
pub mod rob;
/// Reservation station for operand wait and dispatch.
pub mod station;
