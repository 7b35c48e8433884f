//! End-to-end runs of the XMC status register lock against the emulator

use alloc::vec::Vec;

use crate::{DummyConfig, DummyFlash};

use srlock_core::programmer::{SpiMaster, WaitPolicy};
use srlock_core::protocol;
use srlock_core::spi::{opcodes, SpiCommand};
use srlock_core::xmc::{
    self, CheckOutcome, FlashContext, LockMode, LockPath, StatusRegisterIo, SFDP_NOT_PROBED,
};
use srlock_core::Error;

fn run_check(config: DummyConfig, mode: LockMode) -> (DummyFlash, CheckOutcome) {
    let mut flash = DummyFlash::new(config);
    let mut suspend = flash.suspend_handle();
    let outcome = {
        let mut ctx = FlashContext::new(&mut flash, &mut suspend);
        xmc::check_and_lock(&mut ctx, mode).unwrap()
    };
    assert_eq!(suspend.depth(), 0);
    (flash, outcome)
}

fn run_lock(flash: &mut DummyFlash, good_value: u32, mode: LockMode) -> xmc::LockReport {
    let mut suspend = flash.suspend_handle();
    let mut ctx = FlashContext::new(flash, &mut suspend);
    xmc::lock(&mut ctx, good_value, mode).unwrap()
}

fn count(flash: &DummyFlash, opcode: u8) -> usize {
    flash.opcodes().iter().filter(|&&op| op == opcode).count()
}

#[test]
fn test_power_cycle_lock_xm25qh32c() {
    let (mut flash, outcome) = run_check(DummyConfig::affected(0x204016), LockMode::PowerCycle);

    let CheckOutcome::Locked { model, report } = outcome else {
        panic!("unexpected outcome: {}", outcome);
    };
    assert_eq!(model.good_value, 0x600200);
    assert_eq!(report.path, LockPath::LockedUntilPowerCycle);
    assert_eq!(report.before.raw(), 0x000000);
    assert_eq!(report.after.raw(), 0x600300);
    assert!(report.matches_targets());

    assert_eq!(
        flash.opcodes(),
        [
            opcodes::RDSR, // wait idle
            opcodes::RDID,
            opcodes::RDSFDP,
            opcodes::RDSFDP,
            opcodes::RDSR, // wait idle
            opcodes::RDSR,
            opcodes::RDSR2,
            opcodes::RDSR3,
            opcodes::EWSR,
            opcodes::WRSR3,
            opcodes::RDSR, // wait idle
            opcodes::RDSR3,
            opcodes::EWSR,
            opcodes::WRSR,
            opcodes::RDSR, // wait idle
            opcodes::RDSR2,
            opcodes::RDSR,
            opcodes::WRDI,
        ]
    );

    let writes = flash.status_writes();
    assert_eq!(writes[0].write_data, [0x60]);
    assert_eq!(writes[1].write_data, [0x00, 0x03]);
    assert!(!flash.wel());

    // volatile only
    assert_eq!(flash.nv_status().raw(), 0x000000);
    flash.power_cycle();
    assert_eq!(flash.status().raw(), 0x000000);
}

#[test]
fn test_unsupported_model_is_not_written() {
    let (flash, outcome) = run_check(DummyConfig::affected(0x204099), LockMode::PowerCycle);

    assert!(outcome.is_error());
    assert!(matches!(outcome, CheckOutcome::UnsupportedModel { .. }));
    assert!(flash.status_writes().is_empty());
    assert_eq!(count(&flash, opcodes::WREN), 0);
    assert_eq!(count(&flash, opcodes::EWSR), 0);
    assert_eq!(count(&flash, opcodes::WRDI), 0);
}

#[test]
fn test_permanent_lock_xm25qh64c() {
    let (mut flash, outcome) = run_check(DummyConfig::affected(0x204017), LockMode::Permanent);

    let report = *outcome.report().unwrap();
    assert_eq!(report.path, LockPath::LockedPermanent);
    assert_eq!(report.after.raw(), 0x200380);

    let writes = flash.status_writes();
    assert_eq!(writes[0].write_data, [0x20]);
    assert_eq!(writes[1].write_data, [0x80, 0x03]);
    assert_eq!(count(&flash, opcodes::WREN), 2);
    assert_eq!(count(&flash, opcodes::EWSR), 0);

    flash.power_cycle();
    assert_eq!(flash.status().raw(), 0x200380);
}

#[test]
fn test_all_models_set_srp1_and_srp0_only_when_permanent() {
    for flash_id in [0x204016, 0x204017, 0x204018] {
        for mode in [LockMode::PowerCycle, LockMode::Permanent] {
            let (flash, _) = run_check(DummyConfig::affected(flash_id), mode);
            let wrsr = flash
                .status_writes()
                .into_iter()
                .find(|t| t.opcode == opcodes::WRSR)
                .cloned()
                .unwrap();
            assert_eq!(wrsr.write_data[1] & opcodes::SR2_SRP1, opcodes::SR2_SRP1);
            assert_eq!(
                wrsr.write_data[0] & opcodes::SR1_SRP0 != 0,
                mode.is_permanent(),
                "{:06X} {:?}",
                flash_id,
                mode
            );
        }
    }
}

#[test]
fn test_non_xmc_skips_sfdp() {
    let (flash, outcome) = run_check(DummyConfig::affected(0xEF4018), LockMode::PowerCycle);

    let CheckOutcome::NotXmc { identity } = outcome else {
        panic!("unexpected outcome: {}", outcome);
    };
    assert_eq!(identity.sfdp_06, SFDP_NOT_PROBED);
    assert_eq!(identity.sfdp_f4, SFDP_NOT_PROBED);
    assert_eq!(flash.opcodes(), [opcodes::RDSR, opcodes::RDID]);
}

#[test]
fn test_unaffected_revisions_are_not_written() {
    for (sfdp_06, sfdp_f4) in [(0x02, 0xFE), (0x01, 0xFF), (0x03, 0x00)] {
        let config = DummyConfig::with_sfdp(0x204016, sfdp_06, sfdp_f4);
        let (flash, outcome) = run_check(config, LockMode::Permanent);

        assert!(matches!(outcome, CheckOutcome::UnaffectedRevision { .. }));
        assert!(flash.status_writes().is_empty());
        assert_eq!(count(&flash, opcodes::RDSFDP), 2);
    }
}

#[test]
fn test_identify_reports_sfdp_bytes() {
    let mut flash = DummyFlash::new(DummyConfig::with_sfdp(0x204017, 0x02, 0xFF));
    let mut suspend = flash.suspend_handle();
    let mut ctx = FlashContext::new(&mut flash, &mut suspend);

    let identity = xmc::identify(&mut ctx).unwrap();
    assert_eq!(identity.flash_id, 0x204017);
    assert_eq!((identity.sfdp_06, identity.sfdp_f4), (0x02, 0xFF));
}

#[test]
fn test_guard_when_already_locked() {
    let mut flash = DummyFlash::new(DummyConfig::default().status(0x000100));
    let report = run_lock(&mut flash, 0x600200, LockMode::Permanent);

    assert_eq!(report.path, LockPath::AlreadyLocked);
    assert!(!report.wrote());
    assert_eq!(report.after, report.before);
    assert_eq!(
        flash.opcodes(),
        [opcodes::RDSR, opcodes::RDSR, opcodes::RDSR2, opcodes::RDSR3]
    );
}

#[test]
fn test_second_lock_writes_nothing() {
    let mut flash = DummyFlash::new(DummyConfig::default());
    let first = run_lock(&mut flash, 0x600200, LockMode::PowerCycle);
    assert!(first.wrote());

    flash.clear_transactions();
    let second = run_lock(&mut flash, 0x600200, LockMode::PowerCycle);
    assert!(!second.wrote());
    assert!(flash.status_writes().is_empty());
    assert_eq!(count(&flash, opcodes::WRDI), 0);
    assert_eq!(flash.status().raw(), 0x600300);
}

#[test]
fn test_register_at_target_is_not_rewritten() {
    let mut flash = DummyFlash::new(DummyConfig::default().status(0x600200));
    let report = run_lock(&mut flash, 0x600200, LockMode::PowerCycle);

    assert!(!report.sr3_written);
    assert!(report.sr12_written);
    assert_eq!(count(&flash, opcodes::WRSR3), 0);
    assert_eq!(count(&flash, opcodes::EWSR), 1);
    assert_eq!(count(&flash, opcodes::WRDI), 1);
    assert_eq!(report.after.raw(), 0x600300);
}

/// Passes everything to the emulator except the SR1/SR2 write, which fails
/// on the bus
struct FailingWrsr {
    flash: DummyFlash,
}

impl SpiMaster for FailingWrsr {
    fn execute(&mut self, cmd: &mut SpiCommand<'_>) -> srlock_core::Result<()> {
        if cmd.opcode == opcodes::WRSR {
            return Err(Error::SpiTransferFailed);
        }
        self.flash.execute(cmd)
    }

    fn delay_us(&mut self, us: u32) {
        self.flash.delay_us(us);
    }
}

#[test]
fn test_failed_write_still_clears_latch() {
    let mut master = FailingWrsr {
        flash: DummyFlash::new(DummyConfig::default()),
    };
    let mut suspend = master.flash.suspend_handle();

    let result = {
        let mut ctx = FlashContext::new(&mut master, &mut suspend);
        xmc::lock(&mut ctx, 0x600200, LockMode::Permanent)
    };
    assert_eq!(result, Err(Error::SpiTransferFailed));
    assert_eq!(suspend.depth(), 0);

    let flash = &master.flash;
    assert!(!flash.wel());
    assert_eq!(flash.opcodes().last(), Some(&opcodes::WRDI));
    assert_eq!(count(flash, opcodes::WRDI), 1);
    // SR3 went through before the failure
    assert_eq!(flash.nv_status().sr3(), 0x60);
}

#[test]
fn test_sr3_written_before_sr12() {
    let mut flash = DummyFlash::new(DummyConfig::default().status(0x000004));
    run_lock(&mut flash, 0x200200, LockMode::Permanent);

    let ops = flash.opcodes();
    let sr3 = ops.iter().position(|&op| op == opcodes::WRSR3).unwrap();
    let sr12 = ops.iter().position(|&op| op == opcodes::WRSR).unwrap();
    assert!(sr3 < sr12);
    // SR3 re-read completes before the SR1/SR2 write enable
    assert_eq!(ops[sr3 + 2], opcodes::RDSR3);
}

#[test]
fn test_caller_srp_bits_are_ignored() {
    let mut flash = DummyFlash::new(DummyConfig::default());
    let report = run_lock(&mut flash, 0x600380, LockMode::PowerCycle);
    assert_eq!(report.targets.sr12, 0x0300);
    assert_eq!(flash.status().raw(), 0x600300);
}

#[test]
fn test_every_command_runs_suspended() {
    let (flash, _) = run_check(DummyConfig::affected(0x204018), LockMode::PowerCycle);
    assert!(!flash.transactions().is_empty());
    assert!(flash.transactions().iter().all(|t| t.suspended));
}

#[test]
fn test_busy_chip_is_waited_for() {
    let config = DummyConfig::affected(0x204016).busy_polls(5);
    let (flash, outcome) = run_check(config, LockMode::PowerCycle);

    assert!(outcome.report().unwrap().matches_targets());
    assert_eq!(flash.status().raw(), 0x600300);
}

#[test]
fn test_bounded_wait_times_out() {
    let mut config = DummyConfig::affected(0x204016);
    config.stuck_busy = true;
    let mut flash = DummyFlash::new(config);
    let mut suspend = flash.suspend_handle();

    let result = {
        let mut ctx = FlashContext::new(&mut flash, &mut suspend)
            .with_wait_policy(WaitPolicy::bounded(10, 1000));
        xmc::check_and_lock(&mut ctx, LockMode::PowerCycle)
    };
    assert_eq!(result, Err(Error::Timeout));
    assert_eq!(suspend.depth(), 0);
}

#[derive(Default)]
struct RecordingIo {
    sr12: Vec<u16>,
    sr3: Vec<u8>,
}

impl StatusRegisterIo for RecordingIo {
    fn write_sr12<M: SpiMaster + ?Sized>(
        &mut self,
        master: &mut M,
        value: u16,
    ) -> srlock_core::Result<()> {
        self.sr12.push(value);
        protocol::write_status12(master, value)
    }

    fn write_sr3<M: SpiMaster + ?Sized>(
        &mut self,
        master: &mut M,
        value: u8,
    ) -> srlock_core::Result<()> {
        self.sr3.push(value);
        protocol::write_status3(master, value)
    }
}

#[test]
fn test_custom_status_io() {
    let mut flash = DummyFlash::new(DummyConfig::affected(0x204018));
    let mut suspend = flash.suspend_handle();
    let mut io = RecordingIo::default();

    let outcome = {
        let mut ctx = FlashContext::new(&mut flash, &mut suspend);
        xmc::check_and_lock_with(&mut ctx, &mut io, LockMode::Permanent).unwrap()
    };

    assert!(outcome.report().is_some());
    assert_eq!(io.sr3, [0x60]);
    assert_eq!(io.sr12, [0x0380]);
    assert_eq!(flash.nv_status().raw(), 0x600380);
}
