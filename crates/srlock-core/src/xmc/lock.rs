//! Guarded status register write and lock

use core::fmt;

use super::context::FlashContext;
use super::io::{StandardStatusIo, StatusRegisterIo};
use super::LOG_TARGET;
use crate::error::Result;
use crate::programmer::{BusSuspend, SpiMaster, SuspendGuard, WaitPolicy};
use crate::protocol;
use crate::spi::opcodes;
use crate::status::{StatusBits, StatusComposite, COMPOSITE_MASK, SR12_MASK};
use maybe_async::maybe_async;

/// How long the lock holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockMode {
    /// SRP1 only, written through the volatile status register enable.
    /// Everything written reverts on the next power cycle.
    #[default]
    PowerCycle,
    /// SRP1 and SRP0, written through the standard write enable.
    /// Irreversible.
    Permanent,
}

impl LockMode {
    /// Pick the mode from a `permanent` flag
    pub const fn from_permanent(permanent: bool) -> Self {
        if permanent {
            Self::Permanent
        } else {
            Self::PowerCycle
        }
    }

    /// True for [`LockMode::Permanent`]
    pub const fn is_permanent(&self) -> bool {
        matches!(self, Self::Permanent)
    }

    /// Write enable opcode sent before each status register write
    pub const fn write_enable_opcode(&self) -> u8 {
        match self {
            Self::PowerCycle => opcodes::EWSR,
            Self::Permanent => opcodes::WREN,
        }
    }
}

impl fmt::Display for LockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PowerCycle => write!(f, "until power cycle"),
            Self::Permanent => write!(f, "permanently"),
        }
    }
}

/// Register values the lock routine writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockTargets {
    /// SR1 (bits 7-0) and SR2 (bits 15-8), with SRP bits applied
    pub sr12: u16,
    /// SR3
    pub sr3: u8,
}

impl LockTargets {
    /// Derive the targets from a good value
    ///
    /// Caller supplied SRP0/SRP1 and bits 31-24 are discarded. SRP1 is always
    /// set; SRP0 only for a permanent lock.
    pub fn derive(good_value: u32, mode: LockMode) -> Self {
        let good = good_value & COMPOSITE_MASK & !StatusBits::SRP.bits();

        let mut sr12 = (good & SR12_MASK) | StatusBits::SRP1.bits();
        if mode.is_permanent() {
            sr12 |= StatusBits::SRP0.bits();
        }

        Self {
            sr12: sr12 as u16,
            sr3: (good >> 16) as u8,
        }
    }

    /// Targets as a 24-bit composite
    pub fn composite(&self) -> StatusComposite {
        StatusComposite::from_raw(((self.sr3 as u32) << 16) | self.sr12 as u32)
    }
}

/// Which branch the lock routine took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockPath {
    /// SRP1 was already set; nothing was written
    AlreadyLocked,
    /// Locked until the next power cycle
    LockedUntilPowerCycle,
    /// Locked permanently
    LockedPermanent,
}

impl fmt::Display for LockPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyLocked => write!(f, "skipped, already locked"),
            Self::LockedUntilPowerCycle => write!(f, "locked until power cycle"),
            Self::LockedPermanent => write!(f, "locked permanently"),
        }
    }
}

/// Before/after record of one lock attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockReport {
    /// Branch taken
    pub path: LockPath,
    /// Requested mode
    pub mode: LockMode,
    /// Values the routine aimed for
    pub targets: LockTargets,
    /// Status registers before the attempt
    pub before: StatusComposite,
    /// Status registers after the attempt (re-read only where written)
    pub after: StatusComposite,
    /// SR3 was written
    pub sr3_written: bool,
    /// SR1/SR2 were written
    pub sr12_written: bool,
}

impl LockReport {
    /// True if any status register write was issued
    pub fn wrote(&self) -> bool {
        self.sr3_written || self.sr12_written
    }

    /// True if the registers read back as the targets
    pub fn matches_targets(&self) -> bool {
        self.after.sr3() == self.targets.sr3 && self.after.sr12() == self.targets.sr12
    }

    fn log(&self) {
        let before = self.before;
        let after = self.after;

        if self.path == LockPath::AlreadyLocked {
            log::info!(
                target: LOG_TARGET,
                "SRP1 already set ({:02X}{:02X}{:02X}), skip SR lock.",
                before.sr3(),
                before.sr2(),
                before.sr1()
            );
            return;
        }

        if self.mode.is_permanent() {
            log::info!(target: LOG_TARGET, "Try lock SR permanently.");
        } else {
            log::info!(target: LOG_TARGET, "Try lock SR until power cycle.");
        }
        log::info!(
            target: LOG_TARGET,
            "SR3 update: {:02X} -> {:02X} ({:02X}).",
            before.sr3(),
            after.sr3(),
            self.targets.sr3
        );
        log::info!(
            target: LOG_TARGET,
            "SR1 & SR2 update: {:02X}{:02X} -> {:02X}{:02X} ({:04X}).",
            before.sr2(),
            before.sr1(),
            after.sr2(),
            after.sr1(),
            self.targets.sr12
        );

        if !self.matches_targets() {
            log::warn!(
                target: LOG_TARGET,
                "SR read back {} after lock, expected {}",
                after,
                self.targets.composite()
            );
        }
    }
}

/// Status register writes issued so far
#[derive(Debug, Default)]
struct WriteProgress {
    /// A write enable went out, so WRDI is owed
    enabled: bool,
    sr3_written: bool,
    sr12_written: bool,
}

/// Write the registers that differ from their targets, reading back `regs`
/// (SR1, SR2, SR3) after each write
#[maybe_async]
async fn write_targets<M, R>(
    master: &mut M,
    io: &mut R,
    wait: &WaitPolicy,
    targets: &LockTargets,
    mode: LockMode,
    regs: &mut [u8; 3],
    progress: &mut WriteProgress,
) -> Result<()>
where
    M: SpiMaster + ?Sized,
    R: StatusRegisterIo + ?Sized,
{
    let sr12_before = u16::from_le_bytes([regs[0], regs[1]]);

    if targets.sr3 != regs[2] {
        progress.enabled = true;
        protocol::send_simple(master, mode.write_enable_opcode()).await?;
        io.write_sr3(master, targets.sr3).await?;
        progress.sr3_written = true;

        master.wait_idle(wait).await?;
        regs[2] = io.read_sr3(master).await?;
    }

    if targets.sr12 != sr12_before {
        progress.enabled = true;
        protocol::send_simple(master, mode.write_enable_opcode()).await?;
        io.write_sr12(master, targets.sr12).await?;
        progress.sr12_written = true;

        master.wait_idle(wait).await?;
        regs[1] = io.read_sr2(master).await?;
        regs[0] = io.read_sr1(master).await?;
    }

    Ok(())
}

/// Write `good_value` to the status registers and lock them
///
/// Uses the standard status register commands. See [`lock_with`].
#[maybe_async]
pub async fn lock<M, S>(
    ctx: &mut FlashContext<'_, M, S>,
    good_value: u32,
    mode: LockMode,
) -> Result<LockReport>
where
    M: SpiMaster + ?Sized,
    S: BusSuspend + ?Sized,
{
    lock_with(ctx, &mut StandardStatusIo, good_value, mode).await
}

/// Write `good_value` to the status registers and lock them, using `io` for
/// register access
///
/// `good_value` holds SR3 in bits 23-16, SR2 in bits 15-8 and SR1 in bits
/// 7-0. SRP0/SRP1 are managed here and must not be set by the caller.
///
/// The sequence runs with the bus suspended:
/// 1. read SR1, SR2, SR3;
/// 2. if SRP1 is already set, stop: the registers cannot be changed;
/// 3. if SR3 differs from the target, enable and write SR3 (SR3 becomes
///    read-only once SRP bits are set, so it goes first);
/// 4. if SR1/SR2 differ from the target, enable and write them together,
///    raising the SRP bits;
/// 5. if any write enable was sent, send WRDI so the write enable latch is
///    not left set. This also happens when a write fails, before the error
///    is returned.
///
/// Registers that already hold their target are not written.
#[maybe_async]
pub async fn lock_with<M, S, R>(
    ctx: &mut FlashContext<'_, M, S>,
    io: &mut R,
    good_value: u32,
    mode: LockMode,
) -> Result<LockReport>
where
    M: SpiMaster + ?Sized,
    S: BusSuspend + ?Sized,
    R: StatusRegisterIo + ?Sized,
{
    let targets = LockTargets::derive(good_value, mode);

    let report = {
        let _bus = SuspendGuard::new(&mut *ctx.suspend);
        let master = &mut *ctx.master;

        master.wait_idle(&ctx.wait).await?;
        let sr1_before = io.read_sr1(master).await?;
        let sr2_before = io.read_sr2(master).await?;
        let sr3_before = io.read_sr3(master).await?;
        let before = StatusComposite::from_regs(sr1_before, sr2_before, sr3_before);

        let locked = before.bits().contains(StatusBits::SRP1);

        let mut regs = [sr1_before, sr2_before, sr3_before];
        let mut progress = WriteProgress::default();
        let written = if locked {
            Ok(())
        } else {
            write_targets(master, io, &ctx.wait, &targets, mode, &mut regs, &mut progress).await
        };

        // The latch is cleared even when a write failed halfway
        let disabled = if progress.enabled {
            protocol::write_disable(master).await
        } else {
            Ok(())
        };
        if let Err(e) = written {
            log::error!(target: LOG_TARGET, "SR lock aborted: {}", e);
            return Err(e);
        }
        disabled?;

        let path = if locked {
            LockPath::AlreadyLocked
        } else if mode.is_permanent() {
            LockPath::LockedPermanent
        } else {
            LockPath::LockedUntilPowerCycle
        };

        LockReport {
            path,
            mode,
            targets,
            before,
            after: StatusComposite::from_regs(regs[0], regs[1], regs[2]),
            sr3_written: progress.sr3_written,
            sr12_written: progress.sr12_written,
        }
    };

    report.log();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_targets_power_cycle() {
        let targets = LockTargets::derive(0x600200, LockMode::PowerCycle);
        assert_eq!(targets.sr3, 0x60);
        assert_eq!(targets.sr12, 0x0300);
    }

    #[test]
    fn test_targets_permanent() {
        let targets = LockTargets::derive(0x200200, LockMode::Permanent);
        assert_eq!(targets.sr3, 0x20);
        assert_eq!(targets.sr12, 0x0380);
        assert_eq!(targets.composite().raw(), 0x200380);
    }

    #[test]
    fn test_targets_strip_caller_srp_bits() {
        // SRP0 supplied by the caller is dropped for a power-cycle lock
        let targets = LockTargets::derive(0xFF60_0380, LockMode::PowerCycle);
        assert_eq!(targets.sr12, 0x0300);
        assert_eq!(targets.sr3, 0x60);
    }

    #[test]
    fn test_write_enable_opcode() {
        assert_eq!(LockMode::PowerCycle.write_enable_opcode(), 0x50);
        assert_eq!(LockMode::Permanent.write_enable_opcode(), 0x06);
        assert_eq!(LockMode::from_permanent(true), LockMode::Permanent);
        assert_eq!(LockMode::from_permanent(false), LockMode::PowerCycle);
    }

    #[test]
    fn test_report_matches_targets() {
        let targets = LockTargets::derive(0x600200, LockMode::PowerCycle);
        let report = LockReport {
            path: LockPath::LockedUntilPowerCycle,
            mode: LockMode::PowerCycle,
            targets,
            before: StatusComposite::from_raw(0),
            after: StatusComposite::from_raw(0x600300),
            sr3_written: true,
            sr12_written: true,
        };
        assert!(report.wrote());
        assert!(report.matches_targets());
    }
}
