//! Identify command implementation

use srlock_flash::{classify, Classification, FlashHandle};
use std::error::Error;

/// Print the chip identity and what the lock routine would do with it
pub fn cmd_identify(handle: &mut FlashHandle) -> Result<(), Box<dyn Error>> {
    let identity = handle
        .identify()
        .map_err(|e| format!("Failed to identify flash: {}", e))?;
    let classification = classify(&identity);

    println!("JEDEC ID:  {:06X}", identity.flash_id);
    if identity.is_xmc() {
        println!("SFDP 06h:  {:02X}", identity.sfdp_06);
        println!("SFDP F4h:  {:02X}", identity.sfdp_f4);
    } else {
        println!("SFDP:      not probed (not an XMC chip)");
    }
    if let Classification::Remediate(model) = classification {
        println!("Model:     {}", model.name);
    }
    println!("Verdict:   {}", classification);

    Ok(())
}
