//! Lock command implementations

use srlock_flash::{CheckOutcome, FlashHandle, LockMode, LockPath, LockReport};
use std::error::Error;

const HFM_CAUTION: &str = "Locking may prevent later use of HFM mode (> 80 MHz).";

/// True if the check actually changed the status registers
fn needs_hfm_caution(outcome: &CheckOutcome) -> bool {
    outcome.report().is_some_and(LockReport::wrote)
}

fn warn_permanent(mode: LockMode) {
    if mode == LockMode::Permanent {
        log::warn!("Permanent lock requested: locked status registers can never change again.");
    }
}

fn print_report(report: &LockReport) {
    println!("Result: {}", report.path);
    if report.path == LockPath::AlreadyLocked {
        println!("Status: {} (unchanged)", report.before);
        return;
    }
    println!(
        "SR3:     {:02X} -> {:02X} (target {:02X}){}",
        report.before.sr3(),
        report.after.sr3(),
        report.targets.sr3,
        if report.sr3_written { "" } else { ", not written" }
    );
    println!(
        "SR1/SR2: {:04X} -> {:04X} (target {:04X}){}",
        report.before.sr12(),
        report.after.sr12(),
        report.targets.sr12,
        if report.sr12_written { "" } else { ", not written" }
    );
    if !report.matches_targets() {
        println!("Warning: read back does not match the target");
    }
}

/// Identify the chip and lock it if it is an affected model
///
/// An affected revision of an unknown model is reported as an error, so the
/// process exits non-zero.
pub fn cmd_check(handle: &mut FlashHandle, mode: LockMode) -> Result<(), Box<dyn Error>> {
    warn_permanent(mode);

    let outcome = handle
        .check_and_lock(mode)
        .map_err(|e| format!("Status register check failed: {}", e))?;

    if needs_hfm_caution(&outcome) {
        log::warn!("{}", HFM_CAUTION);
    }

    println!("{}", outcome);
    match outcome {
        CheckOutcome::Locked { report, .. } => {
            print_report(&report);
            Ok(())
        }
        CheckOutcome::UnsupportedModel { identity } => Err(format!(
            "Unsupported XMC model {:06X}, status registers left untouched",
            identity.flash_id
        )
        .into()),
        CheckOutcome::NotXmc { .. } | CheckOutcome::UnaffectedRevision { .. } => Ok(()),
    }
}

/// Write `value` and lock, without checking the chip model
pub fn cmd_lock(
    handle: &mut FlashHandle,
    value: u32,
    mode: LockMode,
) -> Result<(), Box<dyn Error>> {
    log::warn!("{}", HFM_CAUTION);
    warn_permanent(mode);

    let report = handle
        .lock(value, mode)
        .map_err(|e| format!("Status register lock failed: {}", e))?;

    print_report(&report);
    Ok(())
}
