//! List commands implementation

use srlock_flash::{available_programmers, AFFECTED_MODELS};

/// List all programmers compiled into this build
pub fn list_programmers() {
    println!("Supported programmers:");
    println!();
    for info in available_programmers() {
        println!("  {:<10} - {}", info.name, info.description);
        if !info.aliases.is_empty() {
            println!("  {:<10}   aliases: {}", "", info.aliases.join(", "));
        }
    }
}

/// List the XMC models that get locked
pub fn list_models() {
    println!("Affected XMC models (SFDP 06h=02, F4h=FF):");
    println!();
    println!("{:<12} {:>8} {:>12}", "Name", "JEDEC ID", "Good value");
    println!("{}", "-".repeat(34));

    for model in AFFECTED_MODELS {
        println!(
            "{:<12} {:>8} {:>12}",
            model.name,
            format!("{:06X}", model.flash_id),
            format!("{:06X}", model.good_value)
        );
    }
}
