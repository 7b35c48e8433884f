//! Status register access used by the lock routine
//!
//! The routine never talks to the status registers directly. It goes
//! through [`StatusRegisterIo`], whose provided methods issue the standard
//! RDSR/RDSR2/RDSR3/WRSR/WRSR3 commands. A platform with different bus
//! plumbing implements the trait on its own type and overrides the methods
//! it needs.

use crate::error::Result;
use crate::programmer::SpiMaster;
use crate::protocol;
use maybe_async::maybe_async;

/// Status register read/write helpers
#[maybe_async(AFIT)]
pub trait StatusRegisterIo {
    /// Read status register 1
    async fn read_sr1<M: SpiMaster + ?Sized>(&mut self, master: &mut M) -> Result<u8> {
        protocol::read_status1(master).await
    }

    /// Read status register 2
    async fn read_sr2<M: SpiMaster + ?Sized>(&mut self, master: &mut M) -> Result<u8> {
        protocol::read_status2(master).await
    }

    /// Read status register 3
    async fn read_sr3<M: SpiMaster + ?Sized>(&mut self, master: &mut M) -> Result<u8> {
        protocol::read_status3(master).await
    }

    /// Write SR1 (bits 7-0) and SR2 (bits 15-8) in one command
    async fn write_sr12<M: SpiMaster + ?Sized>(
        &mut self,
        master: &mut M,
        value: u16,
    ) -> Result<()> {
        protocol::write_status12(master, value).await
    }

    /// Write status register 3
    async fn write_sr3<M: SpiMaster + ?Sized>(&mut self, master: &mut M, value: u8) -> Result<()> {
        protocol::write_status3(master, value).await
    }
}

/// Standard JEDEC status register commands
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardStatusIo;

impl StatusRegisterIo for StandardStatusIo {}
