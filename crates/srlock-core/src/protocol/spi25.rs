//! SPI25 protocol implementation
//!
//! This module implements the JEDEC command sequences the lock routine needs:
//! identification, SFDP reads, status register access and write latch
//! control.
//!
//! Uses `maybe_async` to support both sync and async modes:
//! - With `is_sync` feature: blocking/synchronous
//! - Without `is_sync` feature: async (for Embassy, tokio)
//!
//! Unlike a general purpose flash driver, the write helpers here do not send
//! a write enable first. The caller picks the enable opcode, because the
//! choice between [`WREN`](opcodes::WREN) and [`EWSR`](opcodes::EWSR)
//! decides whether the write survives a power cycle.

use crate::error::{Error, Result};
use crate::programmer::{SpiMaster, WaitPolicy};
use crate::spi::{opcodes, SpiCommand};
use maybe_async::maybe_async;

/// Read the JEDEC ID from a flash chip
///
/// Returns the 24-bit identifier in transmission order: manufacturer in bits
/// 23-16, memory type in bits 15-8, capacity in bits 7-0.
#[maybe_async]
pub async fn read_jedec_id<M: SpiMaster + ?Sized>(master: &mut M) -> Result<u32> {
    let mut buf = [0u8; 3];
    let mut cmd = SpiCommand::read_reg(opcodes::RDID, &mut buf);
    master.execute(&mut cmd).await?;

    Ok(((buf[0] as u32) << 16) | ((buf[1] as u32) << 8) | (buf[2] as u32))
}

/// Read a single SFDP byte at `addr`
///
/// RDSFDP always takes a 3-byte address followed by 8 dummy cycles.
#[maybe_async]
pub async fn read_sfdp_byte<M: SpiMaster + ?Sized>(master: &mut M, addr: u32) -> Result<u8> {
    let mut buf = [0u8; 1];
    let mut cmd = SpiCommand::read_3b(opcodes::RDSFDP, addr, &mut buf)
        .with_dummy_cycles(opcodes::RDSFDP_DUMMY_CYCLES);
    master.execute(&mut cmd).await?;
    Ok(buf[0])
}

/// Read the status register 1
#[maybe_async]
pub async fn read_status1<M: SpiMaster + ?Sized>(master: &mut M) -> Result<u8> {
    read_status(master, opcodes::RDSR).await
}

/// Read the status register 2
#[maybe_async]
pub async fn read_status2<M: SpiMaster + ?Sized>(master: &mut M) -> Result<u8> {
    read_status(master, opcodes::RDSR2).await
}

/// Read the status register 3
#[maybe_async]
pub async fn read_status3<M: SpiMaster + ?Sized>(master: &mut M) -> Result<u8> {
    read_status(master, opcodes::RDSR3).await
}

#[maybe_async]
async fn read_status<M: SpiMaster + ?Sized>(master: &mut M, opcode: u8) -> Result<u8> {
    let mut buf = [0u8; 1];
    let mut cmd = SpiCommand::read_reg(opcode, &mut buf);
    master.execute(&mut cmd).await?;
    Ok(buf[0])
}

/// Send the Write Disable command
#[maybe_async]
pub async fn write_disable<M: SpiMaster + ?Sized>(master: &mut M) -> Result<()> {
    send_simple(master, opcodes::WRDI).await
}

/// Send a command that has no address and no data phase (WREN, EWSR, WRDI)
#[maybe_async]
pub async fn send_simple<M: SpiMaster + ?Sized>(master: &mut M, opcode: u8) -> Result<()> {
    let mut cmd = SpiCommand::simple(opcode);
    master.execute(&mut cmd).await
}

/// Write status registers 1 and 2 with one 16-bit WRSR
///
/// SR1 is bits 7-0 of `value` and is clocked out first. No write enable is
/// sent and completion is not awaited.
#[maybe_async]
pub async fn write_status12<M: SpiMaster + ?Sized>(master: &mut M, value: u16) -> Result<()> {
    let data = [value as u8, (value >> 8) as u8];
    let mut cmd = SpiCommand::write_reg(opcodes::WRSR, &data);
    master.execute(&mut cmd).await
}

/// Write status register 3
///
/// No write enable is sent and completion is not awaited.
#[maybe_async]
pub async fn write_status3<M: SpiMaster + ?Sized>(master: &mut M, value: u8) -> Result<()> {
    let data = [value];
    let mut cmd = SpiCommand::write_reg(opcodes::WRSR3, &data);
    master.execute(&mut cmd).await
}

/// Poll the WIP (Write In Progress) bit until it clears
///
/// With an unbounded policy this spins until the chip reports idle. With a
/// bounded policy the elapsed time is estimated from the poll delay, counting
/// a busy poll as one microsecond.
#[maybe_async]
pub async fn poll_wip<M: SpiMaster + ?Sized>(master: &mut M, policy: &WaitPolicy) -> Result<()> {
    let mut waited_us: u32 = 0;

    loop {
        let status = read_status1(master).await?;
        if status & opcodes::SR1_WIP == 0 {
            return Ok(());
        }

        if let Some(timeout_us) = policy.timeout_us {
            if waited_us >= timeout_us {
                log::debug!("Flash still busy after {} us, giving up", waited_us);
                return Err(Error::Timeout);
            }
        }

        if policy.poll_delay_us > 0 {
            master.delay_us(policy.poll_delay_us).await;
        }
        waited_us = waited_us.saturating_add(policy.poll_delay_us.max(1));
    }
}
