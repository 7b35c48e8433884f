//! Protocol implementations
//!
//! This module contains the SPI25 command sequences used to identify the
//! chip and to access its status registers.

mod spi25;

pub use spi25::*;
