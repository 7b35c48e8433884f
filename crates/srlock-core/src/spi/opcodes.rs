//! SPI flash opcodes and status register bits
//!
//! Opcodes follow JEDEC JESD216 and the common Winbond-style conventions
//! implemented by XMC parts.

// ============================================================================
// Write control
// ============================================================================

/// Write Enable - non-volatile status register writes follow
pub const WREN: u8 = 0x06;
/// Write Disable - clears WEL bit in status register
pub const WRDI: u8 = 0x04;
/// Write Enable for Volatile Status Register - the next status write is
/// lost on power cycle
pub const EWSR: u8 = 0x50;

// ============================================================================
// Status register operations
// ============================================================================

/// Read Status Register 1
pub const RDSR: u8 = 0x05;
/// Read Status Register 2
pub const RDSR2: u8 = 0x35;
/// Read Status Register 3
pub const RDSR3: u8 = 0x15;
/// Write Status Register 1 (and 2, when given two data bytes)
pub const WRSR: u8 = 0x01;
/// Write Status Register 3
pub const WRSR3: u8 = 0x11;

// ============================================================================
// Identification
// ============================================================================

/// Read JEDEC ID (manufacturer + memory type + capacity)
pub const RDID: u8 = 0x9F;
/// Read SFDP (JEDEC JESD216)
pub const RDSFDP: u8 = 0x5A;

/// Dummy cycles between address and data for RDSFDP
pub const RDSFDP_DUMMY_CYCLES: u8 = 8;

// ============================================================================
// Status register bit definitions
// ============================================================================

/// Status Register 1: Write In Progress / Busy
pub const SR1_WIP: u8 = 0x01;
/// Status Register 1: Write Enable Latch
pub const SR1_WEL: u8 = 0x02;
/// Status Register 1: Status Register Protect 0
pub const SR1_SRP0: u8 = 0x80;

/// Status Register 2: Status Register Protect 1
pub const SR2_SRP1: u8 = 0x01;
