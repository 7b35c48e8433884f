//! srlock-linux-spi - Linux spidev support
//!
//! Runs the status register lock from a Linux host wired to the flash chip
//! through a `/dev/spidevX.Y` character device, e.g. a Raspberry Pi with a
//! test clip on the board's SPI NOR.
//!
//! # Example
//!
//! ```no_run
//! use srlock_core::programmer::NoSuspend;
//! use srlock_core::xmc::{self, FlashContext, LockMode};
//! use srlock_linux_spi::{LinuxSpi, LinuxSpiConfig};
//!
//! let config = LinuxSpiConfig::new("/dev/spidev0.0").with_speed(4_000_000);
//! let mut spi = LinuxSpi::open(&config)?;
//!
//! let mut suspend = NoSuspend;
//! let mut ctx = FlashContext::new(&mut spi, &mut suspend);
//! let outcome = xmc::check_and_lock(&mut ctx, LockMode::PowerCycle)?;
//! println!("{}", outcome);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Usage with the srlock CLI
//!
//! ```bash
//! srlock identify -p linux_spi:dev=/dev/spidev0.0
//! srlock check -p linux_spi:dev=/dev/spidev0.0,spispeed=8000,mode=0
//! ```
//!
//! # System Requirements
//!
//! - Linux kernel with spidev support enabled (`CONFIG_SPI_SPIDEV`)
//! - Read/write access to `/dev/spidevX.Y`

pub mod device;
pub mod error;

pub use device::{parse_options, LinuxSpi, LinuxSpiConfig, DEFAULT_SPEED_HZ, HFM_THRESHOLD_HZ};
pub use error::{LinuxSpiError, Result};
