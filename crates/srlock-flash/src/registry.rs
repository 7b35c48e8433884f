//! Programmer registry and initialization
//!
//! This module handles opening programmers by name and wrapping them in a
//! [`FlashHandle`].

use crate::handle::FlashHandle;
use std::collections::HashMap;

/// Boxed SPI master as stored in a [`FlashHandle`]
pub type BoxedSpiMaster = Box<dyn srlock_core::programmer::SpiMaster + Send>;

/// Parsed programmer parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgrammerParams {
    /// Programmer name as given
    pub name: String,
    /// Key-value parameters
    pub params: HashMap<String, String>,
}

impl ProgrammerParams {
    /// Parameters as (key, value) pairs, in no particular order
    pub fn options(&self) -> Vec<(&str, &str)> {
        self.params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }
}

/// Parse a programmer string into name and parameters
///
/// Format: "name" or "name:key1=value1,key2=value2"
///
/// # Example
/// ```ignore
/// let params = parse_programmer_params("linux_spi:dev=/dev/spidev0.0")?;
/// assert_eq!(params.name, "linux_spi");
/// assert_eq!(params.params.get("dev"), Some(&"/dev/spidev0.0".to_string()));
/// ```
pub fn parse_programmer_params(s: &str) -> Result<ProgrammerParams, Box<dyn std::error::Error>> {
    let (name, opts_str) = s.split_once(':').unwrap_or((s, ""));

    if name.is_empty() {
        return Err("Empty programmer name".into());
    }

    let mut params = HashMap::new();
    if !opts_str.is_empty() {
        for opt in opts_str.split(',') {
            if let Some((key, value)) = opt.split_once('=') {
                params.insert(key.to_string(), value.to_string());
            } else {
                return Err(
                    format!("Invalid parameter format: '{}' (expected key=value)", opt).into(),
                );
            }
        }
    }

    Ok(ProgrammerParams {
        name: name.to_string(),
        params,
    })
}

/// Parse a number given as decimal or `0x`-prefixed hex
pub fn parse_number(s: &str) -> Result<u32, Box<dyn std::error::Error>> {
    let value = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    value.map_err(|_| format!("Invalid number: '{}'", s).into())
}

/// Open the SPI master for a programmer string
pub fn open_spi_programmer(
    programmer: &str,
) -> Result<(BoxedSpiMaster, ProgrammerParams), Box<dyn std::error::Error>> {
    let params = parse_programmer_params(programmer)?;

    let master: BoxedSpiMaster = match params.name.as_str() {
        #[cfg(feature = "dummy")]
        "dummy" => open_dummy(&params)?,

        #[cfg(feature = "linux-spi")]
        "linux_spi" | "linux-spi" | "spidev" => open_linux_spi(&params)?,

        _ => {
            return Err(format!(
                "Unknown programmer: {} (available: {})",
                params.name,
                programmer_names_short()
            )
            .into())
        }
    };

    Ok((master, params))
}

/// Open a programmer and wrap it in a [`FlashHandle`]
///
/// # Arguments
/// * `programmer` - Programmer specification (e.g., "dummy" or "linux_spi:dev=/dev/spidev0.0")
pub fn open_flash(programmer: &str) -> Result<FlashHandle, Box<dyn std::error::Error>> {
    let (master, params) = open_spi_programmer(programmer)?;
    Ok(FlashHandle::new(master, &params.name))
}

#[cfg(feature = "dummy")]
fn dummy_config(
    params: &ProgrammerParams,
) -> Result<srlock_dummy::DummyConfig, Box<dyn std::error::Error>> {
    let mut config = srlock_dummy::DummyConfig::default();

    for (key, value) in &params.params {
        match key.as_str() {
            "id" => config.jedec_id = parse_number(value)? & 0xFF_FFFF,
            "sfdp06" => config.sfdp_06 = parse_byte(value)?,
            "sfdpf4" => config.sfdp_f4 = parse_byte(value)?,
            "sr" => config.status = parse_number(value)?,
            "busy" => config.busy_polls = parse_number(value)?,
            "wp" => config.wp_low = parse_number(value)? != 0,
            _ => log::warn!("dummy: Unknown option: {}={}", key, value),
        }
    }

    Ok(config)
}

#[cfg(feature = "dummy")]
fn parse_byte(s: &str) -> Result<u8, Box<dyn std::error::Error>> {
    let value = parse_number(s)?;
    u8::try_from(value).map_err(|_| format!("Value out of range for a byte: '{}'", s).into())
}

#[cfg(feature = "dummy")]
fn open_dummy(params: &ProgrammerParams) -> Result<BoxedSpiMaster, Box<dyn std::error::Error>> {
    let config = dummy_config(params)?;
    log::info!(
        "Opening dummy programmer (id {:06X}, SFDP {:02X}/{:02X}, SR {:06X})",
        config.jedec_id,
        config.sfdp_06,
        config.sfdp_f4,
        config.status
    );
    Ok(Box::new(srlock_dummy::DummyFlash::new(config)))
}

#[cfg(feature = "linux-spi")]
fn open_linux_spi(params: &ProgrammerParams) -> Result<BoxedSpiMaster, Box<dyn std::error::Error>> {
    use srlock_linux_spi::{parse_options, LinuxSpi};

    log::info!("Opening Linux SPI programmer...");

    let config = parse_options(&params.options())
        .map_err(|e| format!("Invalid linux_spi parameters: {}", e))?;

    let master = LinuxSpi::open(&config).map_err(|e| {
        format!(
            "Failed to open Linux SPI device: {}\n\
             Make sure the device exists and you have read/write permissions.\n\
             You may need to: sudo usermod -aG spi $USER",
            e
        )
    })?;

    Ok(Box::new(master))
}

/// Information about a programmer
pub struct ProgrammerInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Alternative names/aliases
    pub aliases: &'static [&'static str],
    /// Short description
    pub description: &'static str,
}

/// Get information about all available programmers (enabled at compile time)
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_programmers() -> Vec<ProgrammerInfo> {
    let mut programmers = Vec::new();

    #[cfg(feature = "dummy")]
    programmers.push(ProgrammerInfo {
        name: "dummy",
        aliases: &[],
        description: "XMC flash emulator (id=<hex>,sfdp06=<hex>,sfdpf4=<hex>,sr=<hex>,busy=<n>,wp=<0|1>)",
    });

    #[cfg(feature = "linux-spi")]
    programmers.push(ProgrammerInfo {
        name: "linux_spi",
        aliases: &["linux-spi", "spidev"],
        description: "Linux SPI device via spidev interface (dev=/dev/spidevX.Y,spispeed=<kHz>,mode=<0-3>)",
    });

    programmers
}

/// Generate a short list of programmer names for CLI help
pub fn programmer_names_short() -> String {
    let programmers = available_programmers();
    if programmers.is_empty() {
        return "none (recompile with features)".to_string();
    }
    let names: Vec<&str> = programmers.iter().map(|p| p.name).collect();
    names.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_programmer_params() {
        let params = parse_programmer_params("dummy:id=0x204016,sr=0").unwrap();
        assert_eq!(params.name, "dummy");
        assert_eq!(params.params.get("id").map(String::as_str), Some("0x204016"));
        assert_eq!(params.params.get("sr").map(String::as_str), Some("0"));

        let params = parse_programmer_params("linux_spi").unwrap();
        assert!(params.params.is_empty());

        assert!(parse_programmer_params("dummy:id").is_err());
        assert!(parse_programmer_params(":id=1").is_err());
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("0x204016").unwrap(), 0x204016);
        assert_eq!(parse_number("0XFF").unwrap(), 0xFF);
        assert_eq!(parse_number("42").unwrap(), 42);
        assert!(parse_number("0xZZ").is_err());
        assert!(parse_number("").is_err());
    }

    #[test]
    fn test_unknown_programmer() {
        assert!(open_flash("nonexistent").is_err());
    }

    #[cfg(feature = "dummy")]
    #[test]
    fn test_dummy_params() {
        let params =
            parse_programmer_params("dummy:id=0xEF4018,sfdp06=1,sfdpf4=0xfe,sr=0x100").unwrap();
        let config = dummy_config(&params).unwrap();
        assert_eq!(config.jedec_id, 0xEF4018);
        assert_eq!(config.sfdp_06, 0x01);
        assert_eq!(config.sfdp_f4, 0xFE);
        assert_eq!(config.status, 0x100);

        let params = parse_programmer_params("dummy:sfdp06=0x100").unwrap();
        assert!(dummy_config(&params).is_err());
    }

    #[cfg(feature = "dummy")]
    #[test]
    fn test_dummy_handle_locks() {
        use srlock_core::xmc::{CheckOutcome, LockMode};

        let mut handle = open_flash("dummy:id=0x204017").unwrap();
        assert_eq!(handle.programmer(), "dummy");

        let identity = handle.identify().unwrap();
        assert_eq!(identity.flash_id, 0x204017);

        let outcome = handle.check_and_lock(LockMode::PowerCycle).unwrap();
        assert!(matches!(outcome, CheckOutcome::Locked { .. }));
        assert_eq!(handle.read_status().unwrap().raw(), 0x200300);
    }

    #[cfg(feature = "dummy")]
    #[test]
    fn test_dummy_handle_skips_non_xmc() {
        use srlock_core::xmc::{CheckOutcome, LockMode};

        let mut handle = open_flash("dummy:id=0xEF4018").unwrap();
        let outcome = handle.check_and_lock(LockMode::Permanent).unwrap();
        assert!(matches!(outcome, CheckOutcome::NotXmc { .. }));
        assert_eq!(handle.read_status().unwrap().raw(), 0);
    }
}
