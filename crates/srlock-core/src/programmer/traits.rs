//! Programmer trait definitions
//!
//! These traits use `maybe_async` to support both sync and async modes.
//! - By default, traits are async (suitable for Embassy, tokio)
//! - With the `is_sync` feature, traits become synchronous

use crate::error::Result;
use crate::protocol;
use crate::spi::SpiCommand;
use maybe_async::maybe_async;

/// How long and how often to poll for the flash to become idle
///
/// The default polls back-to-back with no upper bound: status register
/// writes finish within milliseconds on real silicon, so the routine relies
/// on the hardware completing. A bound changes observable timing and turns a
/// stuck chip into [`Error::Timeout`](crate::Error::Timeout).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WaitPolicy {
    /// Delay between WIP polls in microseconds (0 = busy poll)
    pub poll_delay_us: u32,
    /// Give up after this many microseconds (None = wait forever)
    pub timeout_us: Option<u32>,
}

impl WaitPolicy {
    /// Unbounded busy poll
    pub const fn unbounded() -> Self {
        Self {
            poll_delay_us: 0,
            timeout_us: None,
        }
    }

    /// Poll every `poll_delay_us` and fail after `timeout_us`
    pub const fn bounded(poll_delay_us: u32, timeout_us: u32) -> Self {
        Self {
            poll_delay_us,
            timeout_us: Some(timeout_us),
        }
    }
}

/// SPI Master trait (sync or async depending on `is_sync` feature)
///
/// This trait represents the bus primitive that executes exactly one SPI
/// transaction: an opcode, an optional address, dummy cycles and a single
/// data phase in either direction.
///
/// ## Example
///
/// ```ignore
/// #[maybe_async]
/// impl SpiMaster for RomFlash {
///     async fn execute(&mut self, cmd: &mut SpiCommand<'_>) -> Result<()> {
///         self.rom_execute(cmd.opcode, cmd.address, cmd.dummy_cycles,
///                          cmd.write_data, cmd.read_buf)
///     }
///
///     async fn delay_us(&mut self, us: u32) {
///         rom_delay_us(us);
///     }
/// }
/// ```
#[maybe_async(AFIT)]
pub trait SpiMaster {
    /// Execute a single SPI command
    ///
    /// The command contains all the information needed for the transaction:
    /// - `opcode`: The SPI command opcode
    /// - `address`: Optional address (with width)
    /// - `dummy_cycles`: Number of dummy clock cycles after address
    /// - `write_data`: Data to write after the header
    /// - `read_buf`: Buffer to read data into
    async fn execute(&mut self, cmd: &mut SpiCommand<'_>) -> Result<()>;

    /// Delay for the specified number of microseconds
    async fn delay_us(&mut self, us: u32);

    /// Wait until the flash has finished any previous operation
    ///
    /// The default polls the WIP bit of status register 1. Platforms whose
    /// flash controller keeps its own idle state (e.g. a ROM driver) should
    /// override this.
    async fn wait_idle(&mut self, policy: &WaitPolicy) -> Result<()> {
        protocol::poll_wip(self, policy).await
    }
}

// Blanket impl for boxed SPI masters to allow trait objects (sync mode only)
// In async mode, traits with async fn are not object-safe
#[cfg(all(feature = "alloc", feature = "is_sync"))]
impl SpiMaster for alloc::boxed::Box<dyn SpiMaster + Send> {
    fn execute(&mut self, cmd: &mut SpiCommand<'_>) -> Result<()> {
        (**self).execute(cmd)
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }

    fn wait_idle(&mut self, policy: &WaitPolicy) -> Result<()> {
        (**self).wait_idle(policy)
    }
}

/// Helper function for implementing `SpiMaster::execute()`.
///
/// Byte-oriented programmers clock the whole transaction as one buffer:
/// header, then write data, then a read phase. This builds the header and
/// write data and hands them to `transfer_fn` together with the command's
/// read buffer.
///
/// # Example
///
/// ```ignore
/// fn execute(&mut self, cmd: &mut SpiCommand<'_>) -> CoreResult<()> {
///     default_execute(cmd, |write_data, read_buf| {
///         self.spi_transfer(write_data, read_buf)
///             .map_err(|_| CoreError::ProgrammerError)
///     })
/// }
/// ```
#[cfg(feature = "alloc")]
pub fn default_execute<F>(cmd: &mut SpiCommand<'_>, transfer_fn: F) -> Result<()>
where
    F: FnOnce(&[u8], &mut [u8]) -> Result<()>,
{
    let header_len = cmd.header_len();
    let mut write_data = alloc::vec![0u8; header_len + cmd.write_data.len()];
    cmd.encode_header(&mut write_data);
    write_data[header_len..].copy_from_slice(cmd.write_data);

    transfer_fn(&write_data, cmd.read_buf)
}
