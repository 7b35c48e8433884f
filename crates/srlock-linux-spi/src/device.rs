//! Linux spidev bus primitive
//!
//! Every [`SpiCommand`] becomes one `SPI_IOC_MESSAGE` with chip select held
//! across a transmit segment (opcode, address, dummy bytes, data) and an
//! optional receive segment.

use crate::error::{LinuxSpiError, Result};

use srlock_core::error::{Error as CoreError, Result as CoreResult};
use srlock_core::programmer::{default_execute, SpiMaster};
use srlock_core::spi::SpiCommand;

use std::fs::{File, OpenOptions};
use std::os::unix::io::{AsRawFd, RawFd};

/// Default SPI clock speed in Hz (2 MHz)
pub const DEFAULT_SPEED_HZ: u32 = 2_000_000;

/// Clock speed above which the flash needs its high frequency mode
pub const HFM_THRESHOLD_HZ: u32 = 80_000_000;

mod ioctl {
    use nix::ioctl_write_ptr;

    pub const SPI_IOC_MAGIC: u8 = b'k';

    ioctl_write_ptr!(spi_ioc_wr_mode, SPI_IOC_MAGIC, 1, u8);
    ioctl_write_ptr!(spi_ioc_wr_bits_per_word, SPI_IOC_MAGIC, 3, u8);
    ioctl_write_ptr!(spi_ioc_wr_max_speed_hz, SPI_IOC_MAGIC, 4, u32);

    /// `SPI_IOC_MESSAGE(n)`: `_IOW('k', 0, struct spi_ioc_transfer[n])`
    pub fn spi_ioc_message(n: usize) -> libc::c_ulong {
        let size = n * core::mem::size_of::<super::SpiIocTransfer>();
        ((1u32 << 30) | ((size as u32) << 16) | ((SPI_IOC_MAGIC as u32) << 8)) as libc::c_ulong
    }
}

/// Kernel `struct spi_ioc_transfer`
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
struct SpiIocTransfer {
    tx_buf: u64,
    rx_buf: u64,
    len: u32,
    speed_hz: u32,
    delay_usecs: u16,
    bits_per_word: u8,
    cs_change: u8,
    tx_nbits: u8,
    rx_nbits: u8,
    word_delay_usecs: u8,
    _pad: u8,
}

impl SpiIocTransfer {
    fn tx(buf: &[u8], speed_hz: u32) -> Self {
        Self {
            tx_buf: buf.as_ptr() as u64,
            len: buf.len() as u32,
            speed_hz,
            bits_per_word: 8,
            ..Default::default()
        }
    }

    fn rx(buf: &mut [u8], speed_hz: u32) -> Self {
        Self {
            rx_buf: buf.as_mut_ptr() as u64,
            len: buf.len() as u32,
            speed_hz,
            bits_per_word: 8,
            ..Default::default()
        }
    }
}

/// Configuration for opening a Linux SPI device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinuxSpiConfig {
    /// Device path (e.g., "/dev/spidev0.0")
    pub device: String,
    /// SPI clock speed in Hz
    pub speed_hz: u32,
    /// SPI mode (0-3)
    pub mode: u8,
}

impl Default for LinuxSpiConfig {
    fn default() -> Self {
        Self {
            device: String::new(),
            speed_hz: DEFAULT_SPEED_HZ,
            mode: 0,
        }
    }
}

impl LinuxSpiConfig {
    /// Create a new configuration with the given device path
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            ..Default::default()
        }
    }

    /// Set the SPI clock speed in Hz
    pub fn with_speed(mut self, speed_hz: u32) -> Self {
        self.speed_hz = speed_hz;
        self
    }

    /// Set the SPI mode (0-3)
    pub fn with_mode(mut self, mode: u8) -> Self {
        self.mode = mode;
        self
    }
}

/// Linux SPI programmer using the spidev interface
pub struct LinuxSpi {
    file: File,
    speed_hz: u32,
}

impl LinuxSpi {
    /// Open a Linux SPI device with the given configuration
    pub fn open(config: &LinuxSpiConfig) -> Result<Self> {
        if config.device.is_empty() {
            return Err(LinuxSpiError::NoDevice);
        }

        log::debug!("linux_spi: Opening device {}", config.device);

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&config.device)
            .map_err(|e| LinuxSpiError::OpenFailed {
                path: config.device.clone(),
                source: e,
            })?;

        let fd = file.as_raw_fd();
        let bits: u8 = 8;

        // SAFETY: fd is an open spidev descriptor and each pointer refers to
        // a value of the type the ioctl expects.
        configure(fd, "SPI mode", config.mode as u32, |fd| unsafe {
            ioctl::spi_ioc_wr_mode(fd, &config.mode)
        })?;
        configure(fd, "bits per word", bits as u32, |fd| unsafe {
            ioctl::spi_ioc_wr_bits_per_word(fd, &bits)
        })?;
        configure(fd, "clock speed (Hz)", config.speed_hz, |fd| unsafe {
            ioctl::spi_ioc_wr_max_speed_hz(fd, &config.speed_hz)
        })?;

        if config.speed_hz > HFM_THRESHOLD_HZ {
            log::warn!(
                "linux_spi: {} kHz is above 80 MHz, status register commands may be unreliable",
                config.speed_hz / 1000
            );
        }

        log::info!(
            "linux_spi: Opened {} (mode={}, speed={} kHz)",
            config.device,
            config.mode,
            config.speed_hz / 1000
        );

        Ok(Self {
            file,
            speed_hz: config.speed_hz,
        })
    }

    /// Open a device with default settings
    pub fn open_device(device: &str) -> Result<Self> {
        Self::open(&LinuxSpiConfig::new(device))
    }

    /// Current clock speed in Hz
    pub fn speed_hz(&self) -> u32 {
        self.speed_hz
    }

    /// Clock out `write_data`, then clock in `read_buf`, under one chip select
    fn spi_transfer(&mut self, write_data: &[u8], read_buf: &mut [u8]) -> Result<()> {
        if write_data.is_empty() {
            return Err(LinuxSpiError::InvalidParameter(
                "Write data cannot be empty".into(),
            ));
        }

        let count = if read_buf.is_empty() { 1 } else { 2 };
        let transfers = [
            SpiIocTransfer::tx(write_data, self.speed_hz),
            SpiIocTransfer::rx(read_buf, self.speed_hz),
        ];

        // SAFETY: the transfer array and the buffers it points to outlive
        // the call.
        let ret = unsafe {
            libc::ioctl(
                self.file.as_raw_fd(),
                ioctl::spi_ioc_message(count),
                transfers.as_ptr(),
            )
        };
        if ret < 0 {
            return Err(LinuxSpiError::TransferFailed(
                std::io::Error::last_os_error(),
            ));
        }

        Ok(())
    }
}

fn configure<F>(fd: RawFd, setting: &'static str, value: u32, f: F) -> Result<()>
where
    F: FnOnce(RawFd) -> nix::Result<libc::c_int>,
{
    f(fd).map(|_| ()).map_err(|e| LinuxSpiError::ConfigFailed {
        setting,
        value,
        source: std::io::Error::from_raw_os_error(e as i32),
    })
}

impl SpiMaster for LinuxSpi {
    fn execute(&mut self, cmd: &mut SpiCommand<'_>) -> CoreResult<()> {
        default_execute(cmd, |write_data, read_buf| {
            self.spi_transfer(write_data, read_buf).map_err(|e| {
                log::debug!("linux_spi: {}", e);
                match e {
                    LinuxSpiError::TransferFailed(_) => CoreError::SpiTransferFailed,
                    _ => CoreError::ProgrammerError,
                }
            })
        })
    }

    fn delay_us(&mut self, us: u32) {
        std::thread::sleep(std::time::Duration::from_micros(us as u64));
    }
}

/// Parse programmer options from a list of key-value pairs
///
/// Recognized keys: `dev` (required), `spispeed` in kHz, `mode` (0-3).
pub fn parse_options(options: &[(&str, &str)]) -> Result<LinuxSpiConfig> {
    let mut config = LinuxSpiConfig::default();

    for (key, value) in options {
        match *key {
            "dev" => {
                config.device = value.to_string();
            }
            "spispeed" => {
                let speed_khz: u32 = value.parse().map_err(|_| {
                    LinuxSpiError::InvalidParameter(format!("spispeed={}", value))
                })?;
                config.speed_hz = speed_khz.saturating_mul(1000);
            }
            "mode" => {
                let mode: u8 = value
                    .parse()
                    .ok()
                    .filter(|m| *m <= 3)
                    .ok_or_else(|| LinuxSpiError::InvalidParameter(format!("mode={}", value)))?;
                config.mode = mode;
            }
            _ => {
                log::warn!("linux_spi: Unknown option: {}={}", key, value);
            }
        }
    }

    if config.device.is_empty() {
        return Err(LinuxSpiError::NoDevice);
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options() {
        let config =
            parse_options(&[("dev", "/dev/spidev1.0"), ("spispeed", "8000"), ("mode", "3")])
                .unwrap();
        assert_eq!(
            config,
            LinuxSpiConfig::new("/dev/spidev1.0")
                .with_speed(8_000_000)
                .with_mode(3)
        );
    }

    #[test]
    fn test_parse_options_defaults() {
        let config = parse_options(&[("dev", "/dev/spidev0.0")]).unwrap();
        assert_eq!(config.speed_hz, DEFAULT_SPEED_HZ);
        assert_eq!(config.mode, 0);
    }

    #[test]
    fn test_parse_options_errors() {
        assert!(matches!(parse_options(&[]), Err(LinuxSpiError::NoDevice)));
        assert!(matches!(
            parse_options(&[("dev", "/dev/spidev0.0"), ("mode", "4")]),
            Err(LinuxSpiError::InvalidParameter(_))
        ));
        assert!(matches!(
            parse_options(&[("dev", "/dev/spidev0.0"), ("spispeed", "fast")]),
            Err(LinuxSpiError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_message_ioctl_number() {
        // SPI_IOC_MESSAGE(1) on Linux
        assert_eq!(ioctl::spi_ioc_message(1), 0x4020_6B00);
        assert_eq!(core::mem::size_of::<SpiIocTransfer>(), 32);
    }
}
