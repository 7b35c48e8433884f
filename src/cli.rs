//! CLI argument parsing

use clap::{Parser, Subcommand};
use srlock_flash::{LockMode, WaitPolicy};

/// Parse a string as a hex or decimal u32
pub fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

/// Parse a 24-bit status register value; bare digits are taken as hex
fn parse_status_value(s: &str) -> Result<u32, String> {
    let hex = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    let value = u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))?;
    if value > 0xFF_FFFF {
        return Err(format!("{:X} does not fit in SR3:SR2:SR1 (24 bits)", value));
    }
    Ok(value)
}

/// Generate dynamic help text for the programmer argument
fn programmer_help() -> String {
    format!(
        "Programmer to use [available: {}]",
        srlock_flash::programmer_names_short()
    )
}

#[derive(Parser)]
#[command(name = "srlock")]
#[command(author, version, about = "XMC SPI NOR flash status register lock", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Programmer selection and bus timing shared across commands
#[derive(clap::Args, Debug, Clone)]
pub struct ProgrammerArgs {
    /// Programmer to use
    #[arg(short, long, help = programmer_help())]
    pub programmer: String,

    /// Give up waiting for the flash to become idle after this many microseconds
    #[arg(long, value_parser = parse_hex_u32)]
    pub wait_timeout_us: Option<u32>,

    /// Delay between busy polls in microseconds
    #[arg(long, default_value_t = 0, value_parser = parse_hex_u32)]
    pub poll_delay_us: u32,
}

impl ProgrammerArgs {
    /// Wait-for-idle policy selected on the command line
    pub fn wait_policy(&self) -> WaitPolicy {
        WaitPolicy {
            poll_delay_us: self.poll_delay_us,
            timeout_us: self.wait_timeout_us,
        }
    }
}

/// Lock mode selection shared by `check` and `lock`
#[derive(clap::Args, Debug, Clone, Copy)]
pub struct LockArgs {
    /// Lock permanently (SRP0 + SRP1) instead of until the next power cycle
    #[arg(long, requires = "yes")]
    pub permanent: bool,

    /// Confirm an irreversible operation
    #[arg(long)]
    pub yes: bool,
}

impl LockArgs {
    /// Requested lock mode
    pub fn mode(&self) -> LockMode {
        LockMode::from_permanent(self.permanent)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read the JEDEC ID and SFDP revision bytes and classify the chip
    Identify {
        #[command(flatten)]
        programmer: ProgrammerArgs,
    },

    /// Show the status registers and protection mode
    Status {
        #[command(flatten)]
        programmer: ProgrammerArgs,
    },

    /// Lock the status registers if the chip is an affected XMC model
    Check {
        #[command(flatten)]
        programmer: ProgrammerArgs,

        #[command(flatten)]
        lock: LockArgs,
    },

    /// Write a status register value and lock, regardless of the chip model
    Lock {
        #[command(flatten)]
        programmer: ProgrammerArgs,

        #[command(flatten)]
        lock: LockArgs,

        /// Value to write, SR3:SR2:SR1 in hex (e.g. 600200); SRP bits are ignored
        #[arg(long, value_parser = parse_status_value)]
        value: u32,
    },

    /// List XMC models that get locked and their status register values
    ListModels,

    /// List available programmers
    ListProgrammers,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_hex_u32() {
        assert_eq!(parse_hex_u32("0x10"), Ok(16));
        assert_eq!(parse_hex_u32("10"), Ok(10));
        assert!(parse_hex_u32("0xG").is_err());
    }

    #[test]
    fn test_parse_status_value() {
        assert_eq!(parse_status_value("600200"), Ok(0x600200));
        assert_eq!(parse_status_value("0x200200"), Ok(0x200200));
        assert!(parse_status_value("1000000").is_err());
    }

    #[test]
    fn test_permanent_requires_yes() {
        let err = Cli::try_parse_from(["srlock", "check", "-p", "dummy", "--permanent"]);
        assert!(err.is_err());

        let cli = Cli::try_parse_from(["srlock", "check", "-p", "dummy", "--permanent", "--yes"])
            .unwrap();
        let Commands::Check { lock, .. } = cli.command else {
            panic!("expected check");
        };
        assert_eq!(lock.mode(), LockMode::Permanent);
    }

    #[test]
    fn test_wait_policy() {
        let cli = Cli::try_parse_from([
            "srlock",
            "status",
            "-p",
            "dummy",
            "--wait-timeout-us",
            "5000",
            "--poll-delay-us",
            "10",
        ])
        .unwrap();
        let Commands::Status { programmer } = cli.command else {
            panic!("expected status");
        };
        assert_eq!(programmer.wait_policy(), WaitPolicy::bounded(10, 5000));
    }
}
