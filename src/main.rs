//! srlock - XMC SPI NOR flash status register lock
//!
//! Some XMC XM25QHxxC revisions can corrupt their status registers when
//! power drops during a status register write. srlock identifies such a
//! chip through any supported programmer, writes its known good status
//! register value and locks the registers, either until the next power
//! cycle or permanently.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands, ProgrammerArgs};
use srlock_flash::{open_flash, FlashHandle};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    match cli.command {
        Commands::Identify { programmer } => {
            let mut handle = open_handle(&programmer)?;
            commands::cmd_identify(&mut handle)
        }
        Commands::Status { programmer } => {
            let mut handle = open_handle(&programmer)?;
            commands::cmd_status(&mut handle)
        }
        Commands::Check { programmer, lock } => {
            let mut handle = open_handle(&programmer)?;
            commands::cmd_check(&mut handle, lock.mode())
        }
        Commands::Lock {
            programmer,
            lock,
            value,
        } => {
            let mut handle = open_handle(&programmer)?;
            commands::cmd_lock(&mut handle, value, lock.mode())
        }
        Commands::ListModels => {
            commands::list_models();
            Ok(())
        }
        Commands::ListProgrammers => {
            commands::list_programmers();
            Ok(())
        }
    }
}

/// Open the programmer and apply the wait policy from the command line
fn open_handle(args: &ProgrammerArgs) -> Result<FlashHandle, Box<dyn std::error::Error>> {
    let mut handle = open_flash(&args.programmer)?;
    let wait = args.wait_policy();
    if let Some(timeout_us) = wait.timeout_us {
        log::debug!(
            "Busy wait bounded to {} us (poll every {} us)",
            timeout_us,
            wait.poll_delay_us
        );
    }
    handle.set_wait_policy(wait);
    Ok(handle)
}
