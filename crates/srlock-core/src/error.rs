//! Error types for srlock-core
//!
//! This module provides a no_std compatible error type. The lock routine
//! itself never fails on a decision: unsupported chips and already locked
//! status registers are outcomes, not errors. Only the bus can fail.

use core::fmt;

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // SPI errors
    /// SPI transfer failed
    SpiTransferFailed,
    /// Opcode is not supported by the programmer
    OpcodeNotSupported,

    // Operation errors
    /// Waiting for the flash to become idle exceeded the configured bound
    Timeout,

    // Programmer errors
    /// General programmer error
    ProgrammerError,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SpiTransferFailed => write!(f, "SPI transfer failed"),
            Self::OpcodeNotSupported => write!(f, "SPI opcode not supported by programmer"),
            Self::Timeout => write!(f, "timed out waiting for flash to become idle"),
            Self::ProgrammerError => write!(f, "programmer error"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
