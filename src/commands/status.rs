//! Status register command implementation

use srlock_flash::{FlashHandle, StatusBits};
use std::error::Error;

/// Names of the set status bits, e.g. "QE | DRV0 | DRV1"
fn format_flags(bits: StatusBits) -> String {
    let names: Vec<&str> = bits.iter_names().map(|(name, _)| name).collect();
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(" | ")
    }
}

/// Show the status registers and protection mode
pub fn cmd_status(handle: &mut FlashHandle) -> Result<(), Box<dyn Error>> {
    let status = handle
        .read_status()
        .map_err(|e| format!("Failed to read status registers: {}", e))?;

    println!(
        "SR1: {:02X}  SR2: {:02X}  SR3: {:02X}",
        status.sr1(),
        status.sr2(),
        status.sr3()
    );
    println!("Composite: {}", status);
    println!("Flags: {}", format_flags(status.bits()));
    println!("Protection mode: {}", status.protection_mode());

    Ok(())
}
