//! SPI types and command structures
//!
//! This module provides the single-transaction command type handed to the
//! bus primitive, and the JEDEC opcodes used by the lock routine.

mod address;
mod command;
pub mod opcodes;

pub use address::AddressWidth;
pub use command::SpiCommand;
pub use opcodes::*;
