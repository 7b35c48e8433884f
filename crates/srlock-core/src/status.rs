//! Status register composite
//!
//! XMC chips expose three 8-bit status registers. The lock routine treats
//! them as one 24-bit value: SR1 in bits 7-0, SR2 in bits 15-8 and SR3 in
//! bits 23-16. SR1 and SR2 are written together by one 16-bit WRSR, SR3 is
//! written on its own.

use bitflags::bitflags;
use core::fmt;

bitflags! {
    /// Bits of the 24-bit status register composite
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StatusBits: u32 {
        /// Write In Progress (SR1 bit 0)
        const WIP  = 1 << 0;
        /// Write Enable Latch (SR1 bit 1)
        const WEL  = 1 << 1;
        /// Block Protect 0 (SR1 bit 2)
        const BP0  = 1 << 2;
        /// Block Protect 1 (SR1 bit 3)
        const BP1  = 1 << 3;
        /// Block Protect 2 (SR1 bit 4)
        const BP2  = 1 << 4;
        /// Top/Bottom protect (SR1 bit 5)
        const TB   = 1 << 5;
        /// Sector/Block protect (SR1 bit 6)
        const SEC  = 1 << 6;
        /// Status Register Protect 0 (SR1 bit 7)
        const SRP0 = 1 << 7;
        /// Status Register Protect 1 (SR2 bit 0)
        const SRP1 = 1 << 8;
        /// Quad Enable (SR2 bit 1)
        const QE   = 1 << 9;
        /// Security register lock 1 (SR2 bit 3)
        const LB1  = 1 << 11;
        /// Security register lock 2 (SR2 bit 4)
        const LB2  = 1 << 12;
        /// Security register lock 3 (SR2 bit 5)
        const LB3  = 1 << 13;
        /// Complement protect (SR2 bit 6)
        const CMP  = 1 << 14;
        /// Erase/program suspended (SR2 bit 7)
        const SUS  = 1 << 15;
        /// Dummy cycle configuration 0 (SR3 bit 0)
        const DC0  = 1 << 16;
        /// Dummy cycle configuration 1 (SR3 bit 1)
        const DC1  = 1 << 17;
        /// Output driver strength 0 (SR3 bit 5)
        const DRV0 = 1 << 21;
        /// Output driver strength 1 (SR3 bit 6)
        const DRV1 = 1 << 22;

        /// Bits reserved for the lock routine; never part of a target value
        const SRP = Self::SRP0.bits() | Self::SRP1.bits();
    }
}

/// Mask of the SR1/SR2 half of the composite
pub const SR12_MASK: u32 = 0x00_FFFF;
/// Mask of the SR3 byte of the composite
pub const SR3_MASK: u32 = 0xFF_0000;
/// Mask of the whole 24-bit composite
pub const COMPOSITE_MASK: u32 = SR12_MASK | SR3_MASK;

/// Status register protection mode, decoded from SRP1/SRP0
///
/// Mirrors the JEDEC status register protect scheme: SRP1 alone locks the
/// registers until power is removed, SRP1 with SRP0 locks them for good.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProtectionMode {
    /// Status registers can be written freely (SRP1=0, SRP0=0)
    #[default]
    Software,
    /// Writes are blocked while the WP# pin is low (SRP1=0, SRP0=1)
    Hardware,
    /// Writes are blocked until the next power cycle (SRP1=1, SRP0=0)
    PowerCycle,
    /// Writes are blocked forever (SRP1=1, SRP0=1)
    Permanent,
}

impl ProtectionMode {
    /// Decode the mode from the SRP bits of a composite value
    pub fn from_bits(bits: StatusBits) -> Self {
        match (bits.contains(StatusBits::SRP1), bits.contains(StatusBits::SRP0)) {
            (false, false) => Self::Software,
            (false, true) => Self::Hardware,
            (true, false) => Self::PowerCycle,
            (true, true) => Self::Permanent,
        }
    }

    /// True if status register writes are rejected regardless of WP#
    pub fn is_locked(&self) -> bool {
        matches!(self, Self::PowerCycle | Self::Permanent)
    }
}

impl fmt::Display for ProtectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Software => write!(f, "software"),
            Self::Hardware => write!(f, "hardware"),
            Self::PowerCycle => write!(f, "power-cycle"),
            Self::Permanent => write!(f, "permanent"),
        }
    }
}

/// The three status registers as one 24-bit value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct StatusComposite(u32);

impl StatusComposite {
    /// Build the composite from the individual registers
    pub const fn from_regs(sr1: u8, sr2: u8, sr3: u8) -> Self {
        Self(((sr3 as u32) << 16) | ((sr2 as u32) << 8) | (sr1 as u32))
    }

    /// Build the composite from a raw value, dropping bits 31-24
    pub const fn from_raw(value: u32) -> Self {
        Self(value & COMPOSITE_MASK)
    }

    /// Raw 24-bit value
    pub const fn raw(&self) -> u32 {
        self.0
    }

    /// Status register 1
    pub const fn sr1(&self) -> u8 {
        self.0 as u8
    }

    /// Status register 2
    pub const fn sr2(&self) -> u8 {
        (self.0 >> 8) as u8
    }

    /// Status register 3
    pub const fn sr3(&self) -> u8 {
        ((self.0 & SR3_MASK) >> 16) as u8
    }

    /// SR1 and SR2 as written by one WRSR (SR2 in the high byte)
    pub const fn sr12(&self) -> u16 {
        (self.0 & SR12_MASK) as u16
    }

    /// Named bits of the composite
    pub fn bits(&self) -> StatusBits {
        StatusBits::from_bits_retain(self.0)
    }

    /// Protection mode encoded in SRP1/SRP0
    pub fn protection_mode(&self) -> ProtectionMode {
        ProtectionMode::from_bits(self.bits())
    }
}

impl fmt::Display for StatusComposite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:06X}", self.0)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::string::ToString;

    #[test]
    fn test_composite_split() {
        let sr = StatusComposite::from_regs(0x80, 0x03, 0x60);
        assert_eq!(sr.raw(), 0x60_0380);
        assert_eq!(sr.sr1(), 0x80);
        assert_eq!(sr.sr2(), 0x03);
        assert_eq!(sr.sr3(), 0x60);
        assert_eq!(sr.sr12(), 0x0380);
    }

    #[test]
    fn test_from_raw_drops_high_byte() {
        let sr = StatusComposite::from_raw(0xAB60_0200);
        assert_eq!(sr.raw(), 0x60_0200);
    }

    #[test]
    fn test_bit_positions() {
        let sr = StatusComposite::from_raw(0x60_0200);
        let bits = sr.bits();
        assert!(bits.contains(StatusBits::QE));
        assert!(bits.contains(StatusBits::DRV0 | StatusBits::DRV1));
        assert!(!bits.intersects(StatusBits::SRP));
        assert_eq!(StatusBits::SRP.bits(), 0x180);
    }

    #[test]
    fn test_mode_from_bits() {
        assert_eq!(
            StatusComposite::from_regs(0x00, 0x00, 0).protection_mode(),
            ProtectionMode::Software
        );
        assert_eq!(
            StatusComposite::from_regs(0x80, 0x00, 0).protection_mode(),
            ProtectionMode::Hardware
        );
        assert_eq!(
            StatusComposite::from_regs(0x00, 0x01, 0).protection_mode(),
            ProtectionMode::PowerCycle
        );
        assert_eq!(
            StatusComposite::from_regs(0x80, 0x01, 0).protection_mode(),
            ProtectionMode::Permanent
        );
        assert!(ProtectionMode::PowerCycle.is_locked());
        assert!(!ProtectionMode::Hardware.is_locked());
    }

    #[test]
    fn test_display() {
        let sr = StatusComposite::from_regs(0x00, 0x02, 0x60);
        assert_eq!(sr.to_string(), "600200");
        assert_eq!(ProtectionMode::PowerCycle.to_string(), "power-cycle");
    }
}
