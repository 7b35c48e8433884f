//! Address width types

/// Address width for SPI commands
///
/// Status register commands carry no address. SFDP reads always use a
/// 3-byte address regardless of the chip's addressing mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AddressWidth {
    /// No address phase
    #[default]
    None,
    /// 3-byte (24-bit) address
    ThreeByte,
}

impl AddressWidth {
    /// Returns the number of address bytes
    pub const fn bytes(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::ThreeByte => 3,
        }
    }

    /// Encode an address into bytes, most significant byte first
    pub fn encode(&self, address: u32, buf: &mut [u8]) {
        match self {
            Self::None => {}
            Self::ThreeByte => {
                buf[0] = (address >> 16) as u8;
                buf[1] = (address >> 8) as u8;
                buf[2] = address as u8;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_three_byte() {
        let mut buf = [0u8; 3];
        AddressWidth::ThreeByte.encode(0x0000F4, &mut buf);
        assert_eq!(buf, [0x00, 0x00, 0xF4]);
        assert_eq!(AddressWidth::None.bytes(), 0);
    }
}
