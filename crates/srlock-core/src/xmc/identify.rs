//! Chip identification by JEDEC ID and SFDP probing

use core::fmt;

use super::context::FlashContext;
use super::policy::XMC_MANUFACTURER_ID;
use crate::error::Result;
use crate::programmer::{BusSuspend, SpiMaster, SuspendGuard};
use crate::protocol;
use maybe_async::maybe_async;

/// SFDP value reported for bytes that were not read
pub const SFDP_NOT_PROBED: u8 = 0xCC;

/// SFDP address of the first revision byte
pub const SFDP_ADDR_06: u32 = 0x06;
/// SFDP address of the second revision byte
pub const SFDP_ADDR_F4: u32 = 0xF4;

/// What the chip reported about itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChipIdentity {
    /// 24-bit JEDEC ID: manufacturer, memory type, capacity
    pub flash_id: u32,
    /// SFDP byte at 0x06, or [`SFDP_NOT_PROBED`]
    pub sfdp_06: u8,
    /// SFDP byte at 0xF4, or [`SFDP_NOT_PROBED`]
    pub sfdp_f4: u8,
}

impl ChipIdentity {
    /// Create an identity from raw values
    pub const fn new(flash_id: u32, sfdp_06: u8, sfdp_f4: u8) -> Self {
        Self {
            flash_id,
            sfdp_06,
            sfdp_f4,
        }
    }

    /// Identity of a chip whose SFDP was not read
    pub const fn unprobed(flash_id: u32) -> Self {
        Self::new(flash_id, SFDP_NOT_PROBED, SFDP_NOT_PROBED)
    }

    /// JEDEC manufacturer code (bits 23-16 of the ID)
    pub const fn manufacturer(&self) -> u8 {
        (self.flash_id >> 16) as u8
    }

    /// True if the manufacturer code is XMC's
    pub const fn is_xmc(&self) -> bool {
        self.manufacturer() == XMC_MANUFACTURER_ID
    }
}

impl fmt::Display for ChipIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:06X} (SFDP 06h={:02X}, F4h={:02X})",
            self.flash_id, self.sfdp_06, self.sfdp_f4
        )
    }
}

/// Read the JEDEC ID and, for XMC chips only, the two SFDP revision bytes
///
/// SFDP is only probed on XMC chips because other chips may not implement
/// it. Unknown chips are not an error; they come back with both SFDP bytes
/// set to [`SFDP_NOT_PROBED`].
///
/// The bus is suspended for the whole sequence.
#[maybe_async]
pub async fn identify<M, S>(ctx: &mut FlashContext<'_, M, S>) -> Result<ChipIdentity>
where
    M: SpiMaster + ?Sized,
    S: BusSuspend + ?Sized,
{
    let _bus = SuspendGuard::new(&mut *ctx.suspend);
    let master = &mut *ctx.master;

    master.wait_idle(&ctx.wait).await?;
    let flash_id = protocol::read_jedec_id(master).await?;

    let mut identity = ChipIdentity::unprobed(flash_id);
    if identity.is_xmc() {
        identity.sfdp_06 = protocol::read_sfdp_byte(master, SFDP_ADDR_06).await?;
        identity.sfdp_f4 = protocol::read_sfdp_byte(master, SFDP_ADDR_F4).await?;
    }

    log::debug!(target: super::LOG_TARGET, "Flash identity: {}", identity);
    Ok(identity)
}
