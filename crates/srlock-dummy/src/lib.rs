//! srlock-dummy - In-memory XMC flash emulator for testing
//!
//! This crate provides a dummy programmer that emulates the status register
//! side of an SPI NOR flash chip: JEDEC ID, a small SFDP table, three status
//! registers with volatile and non-volatile copies, the write enable latch
//! and SRP0/SRP1 protection. It is useful for testing the lock routine
//! without real hardware.
//!
//! Every command is recorded together with whether the bus was suspended
//! at the time, see [`DummyFlash::transactions`] and [`DummySuspend`].

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "alloc")]
use alloc::sync::Arc;
#[cfg(feature = "alloc")]
use alloc::vec::Vec;
#[cfg(feature = "alloc")]
use core::sync::atomic::{AtomicU32, Ordering};

#[cfg(feature = "alloc")]
use srlock_core::error::{Error, Result};
#[cfg(feature = "alloc")]
use srlock_core::programmer::{BusSuspend, SpiMaster};
#[cfg(feature = "alloc")]
use srlock_core::spi::{opcodes, SpiCommand};
#[cfg(feature = "alloc")]
use srlock_core::status::StatusComposite;

/// Size of the emulated SFDP table
pub const SFDP_TABLE_SIZE: usize = 256;

/// Configuration for the dummy flash
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// 24-bit JEDEC ID
    pub jedec_id: u32,
    /// SFDP byte at 0x06
    pub sfdp_06: u8,
    /// SFDP byte at 0xF4
    pub sfdp_f4: u8,
    /// Non-volatile status registers at power-up (SR3 in bits 23-16)
    pub status: u32,
    /// WP# pin driven low
    pub wp_low: bool,
    /// Number of RDSR polls that report WIP after each status write
    pub busy_polls: u32,
    /// Never finish a status write (WIP stays set)
    pub stuck_busy: bool,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self::affected(0x204018) // XM25QH128C
    }
}

impl DummyConfig {
    /// Affected XMC revision (SFDP 0x02/0xFF) with clear status registers
    pub fn affected(jedec_id: u32) -> Self {
        Self {
            jedec_id,
            sfdp_06: 0x02,
            sfdp_f4: 0xFF,
            status: 0,
            wp_low: false,
            busy_polls: 0,
            stuck_busy: false,
        }
    }

    /// Chip with the given ID and SFDP revision bytes
    pub fn with_sfdp(jedec_id: u32, sfdp_06: u8, sfdp_f4: u8) -> Self {
        Self {
            sfdp_06,
            sfdp_f4,
            ..Self::affected(jedec_id)
        }
    }

    /// Set the power-up status register value
    pub fn status(mut self, status: u32) -> Self {
        self.status = status;
        self
    }

    /// Report WIP for `polls` reads after each status write
    pub fn busy_polls(mut self, polls: u32) -> Self {
        self.busy_polls = polls;
        self
    }

    fn sfdp_table(&self) -> [u8; SFDP_TABLE_SIZE] {
        let mut table = [0xFF; SFDP_TABLE_SIZE];
        table[..4].copy_from_slice(b"SFDP");
        table[0x06] = self.sfdp_06;
        table[0xF4] = self.sfdp_f4;
        table
    }
}

/// One command seen on the bus
#[cfg(feature = "alloc")]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Opcode
    pub opcode: u8,
    /// Address, if the command had one
    pub address: Option<u32>,
    /// Bytes written after the header
    pub write_data: Vec<u8>,
    /// Bus was suspended while the command ran
    pub suspended: bool,
}

#[cfg(feature = "alloc")]
impl Transaction {
    /// True for WRSR and WRSR3
    pub fn is_status_write(&self) -> bool {
        matches!(self.opcode, opcodes::WRSR | opcodes::WRSR3)
    }
}

/// Suspension handle sharing its state with a [`DummyFlash`]
#[cfg(feature = "alloc")]
#[derive(Debug, Clone)]
pub struct DummySuspend {
    depth: Arc<AtomicU32>,
}

#[cfg(feature = "alloc")]
impl DummySuspend {
    /// Current nesting depth (0 = bus not suspended)
    pub fn depth(&self) -> u32 {
        self.depth.load(Ordering::Relaxed)
    }
}

#[cfg(feature = "alloc")]
impl BusSuspend for DummySuspend {
    fn suspend(&mut self) {
        self.depth.fetch_add(1, Ordering::Relaxed);
    }

    fn resume(&mut self) {
        self.depth.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Dummy flash programmer
///
/// Status writes follow the usual JEDEC rules:
///
/// - WREN enables one non-volatile write, EWSR one volatile write; either
///   latch is cleared when the write completes or on WRDI;
/// - with SRP1 set, or SRP0 set while WP# is low, status writes are
///   silently ignored;
/// - a power cycle reloads the non-volatile values, and drops a
///   non-volatile SRP1 unless SRP0 is set too.
#[cfg(feature = "alloc")]
pub struct DummyFlash {
    config: DummyConfig,
    sfdp: [u8; SFDP_TABLE_SIZE],
    /// Non-volatile SR1..SR3
    nv_status: [u8; 3],
    /// Active SR1..SR3
    status: [u8; 3],
    wel: bool,
    volatile_wel: bool,
    busy: u32,
    bus_depth: Arc<AtomicU32>,
    log: Vec<Transaction>,
}

#[cfg(feature = "alloc")]
impl DummyFlash {
    /// Create a new dummy flash with the given configuration
    pub fn new(config: DummyConfig) -> Self {
        let sfdp = config.sfdp_table();
        let nv = StatusComposite::from_raw(config.status);
        let nv_status = [
            nv.sr1() & !(opcodes::SR1_WIP | opcodes::SR1_WEL),
            nv.sr2(),
            nv.sr3(),
        ];
        Self {
            config,
            sfdp,
            nv_status,
            status: nv_status,
            wel: false,
            volatile_wel: false,
            busy: 0,
            bus_depth: Arc::new(AtomicU32::new(0)),
            log: Vec::new(),
        }
    }

    /// Create a new dummy flash with the default configuration (XM25QH128C)
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Get the configuration
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// Suspension handle tied to this flash
    pub fn suspend_handle(&self) -> DummySuspend {
        DummySuspend {
            depth: Arc::clone(&self.bus_depth),
        }
    }

    /// Active status registers
    pub fn status(&self) -> StatusComposite {
        StatusComposite::from_regs(self.status[0], self.status[1], self.status[2])
    }

    /// Non-volatile status registers
    pub fn nv_status(&self) -> StatusComposite {
        StatusComposite::from_regs(self.nv_status[0], self.nv_status[1], self.nv_status[2])
    }

    /// Write Enable Latch state
    pub fn wel(&self) -> bool {
        self.wel || self.volatile_wel
    }

    /// Remove and restore power
    pub fn power_cycle(&mut self) {
        let srp1 = self.nv_status[1] & opcodes::SR2_SRP1 != 0;
        let srp0 = self.nv_status[0] & opcodes::SR1_SRP0 != 0;
        if srp1 && !srp0 {
            self.nv_status[1] &= !opcodes::SR2_SRP1;
        }
        self.status = self.nv_status;
        self.wel = false;
        self.volatile_wel = false;
        self.busy = 0;
    }

    /// Every command executed so far
    pub fn transactions(&self) -> &[Transaction] {
        &self.log
    }

    /// Opcodes executed so far, in order
    pub fn opcodes(&self) -> Vec<u8> {
        self.log.iter().map(|t| t.opcode).collect()
    }

    /// WRSR/WRSR3 commands executed so far
    pub fn status_writes(&self) -> Vec<&Transaction> {
        self.log.iter().filter(|t| t.is_status_write()).collect()
    }

    /// Forget recorded transactions
    pub fn clear_transactions(&mut self) {
        self.log.clear();
    }

    fn status_locked(&self) -> bool {
        let srp0 = self.status[0] & opcodes::SR1_SRP0 != 0;
        let srp1 = self.status[1] & opcodes::SR2_SRP1 != 0;
        srp1 || (srp0 && self.config.wp_low)
    }

    fn read_status(&mut self, cmd: &mut SpiCommand<'_>, index: usize) {
        let mut value = self.status[index];
        if index == 0 {
            if self.busy > 0 {
                value |= opcodes::SR1_WIP;
                if !self.config.stuck_busy {
                    self.busy -= 1;
                }
            }
            if self.wel() {
                value |= opcodes::SR1_WEL;
            }
        }
        cmd.read_buf.fill(value);
    }

    fn handle_status_write(&mut self, first: usize, data: &[u8]) {
        let non_volatile = self.wel;
        let volatile = self.volatile_wel;
        if !non_volatile && !volatile {
            log::debug!("dummy: status write {:02X?} without write enable", data);
            return;
        }
        self.wel = false;
        self.volatile_wel = false;

        if self.status_locked() {
            log::debug!("dummy: status write {:02X?} ignored, registers locked", data);
            return;
        }

        for (offset, &byte) in data.iter().take(3 - first).enumerate() {
            let index = first + offset;
            let byte = if index == 0 {
                byte & !(opcodes::SR1_WIP | opcodes::SR1_WEL)
            } else {
                byte
            };
            self.status[index] = byte;
            if non_volatile {
                self.nv_status[index] = byte;
            }
        }

        self.busy = self.config.busy_polls.max(u32::from(self.config.stuck_busy));
    }

    fn handle_sfdp(&self, cmd: &mut SpiCommand<'_>) -> Result<()> {
        if cmd.dummy_cycles != opcodes::RDSFDP_DUMMY_CYCLES {
            return Err(Error::SpiTransferFailed);
        }

        let start = cmd.address.unwrap_or(0) as usize;
        for (i, byte) in cmd.read_buf.iter_mut().enumerate() {
            *byte = self.sfdp[(start + i) % SFDP_TABLE_SIZE];
        }
        Ok(())
    }

    fn record(&mut self, cmd: &SpiCommand<'_>) {
        log::trace!(
            "dummy: op {:02X} addr {:?} data {:02X?}",
            cmd.opcode,
            cmd.address,
            cmd.write_data
        );
        self.log.push(Transaction {
            opcode: cmd.opcode,
            address: cmd.address,
            write_data: cmd.write_data.to_vec(),
            suspended: self.bus_depth.load(Ordering::Relaxed) > 0,
        });
    }
}

#[cfg(feature = "alloc")]
impl SpiMaster for DummyFlash {
    fn execute(&mut self, cmd: &mut SpiCommand<'_>) -> Result<()> {
        self.record(cmd);

        match cmd.opcode {
            // JEDEC ID
            opcodes::RDID => {
                let id = self.config.jedec_id;
                let bytes = [(id >> 16) as u8, (id >> 8) as u8, id as u8];
                for (dst, src) in cmd.read_buf.iter_mut().zip(bytes) {
                    *dst = src;
                }
                Ok(())
            }

            // SFDP
            opcodes::RDSFDP => self.handle_sfdp(cmd),

            // Status register read
            opcodes::RDSR => {
                self.read_status(cmd, 0);
                Ok(())
            }
            opcodes::RDSR2 => {
                self.read_status(cmd, 1);
                Ok(())
            }
            opcodes::RDSR3 => {
                self.read_status(cmd, 2);
                Ok(())
            }

            // Status register write
            opcodes::WRSR => {
                self.handle_status_write(0, cmd.write_data);
                Ok(())
            }
            opcodes::WRSR3 => {
                self.handle_status_write(2, cmd.write_data);
                Ok(())
            }

            // Write enable/disable
            opcodes::WREN => {
                self.wel = true;
                Ok(())
            }
            opcodes::EWSR => {
                self.volatile_wel = true;
                Ok(())
            }
            opcodes::WRDI => {
                self.wel = false;
                self.volatile_wel = false;
                Ok(())
            }

            // Unknown opcode
            _ => Err(Error::OpcodeNotSupported),
        }
    }

    fn delay_us(&mut self, _us: u32) {
        // No delay needed for in-memory operations
    }
}

#[cfg(test)]
mod scenarios;
