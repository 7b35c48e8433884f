//! srlock-core - Status register lock routine for XMC SPI NOR flash
//!
//! Some XMC flash chips can corrupt their status registers if power is lost
//! while the registers are being updated. The corruption may leave the chip
//! permanently write protected. This crate detects the affected chips and
//! writes a known-good status register value, then locks the status
//! registers either until the next power cycle or permanently.
//!
//! It is `no_std` compatible so it can run in a bootloader, and uses
//! `maybe_async` for dual sync/async support like the programmer traits.
//!
//! # Features
//!
//! - `std` - Enable standard library support (includes `alloc`)
//! - `alloc` - Enable heap allocation helpers for programmer implementations
//! - `is_sync` - Compile the `maybe_async` code as blocking code
//!
//! # Example
//!
//! ```ignore
//! use srlock_core::programmer::{NoSuspend, SpiMaster};
//! use srlock_core::xmc::{self, FlashContext, LockMode};
//!
//! fn early_boot<M: SpiMaster>(master: &mut M) {
//!     let mut suspend = NoSuspend;
//!     let mut ctx = FlashContext::new(master, &mut suspend);
//!     match xmc::check_and_lock(&mut ctx, LockMode::PowerCycle) {
//!         Ok(outcome) => log::debug!("SR lock: {}", outcome),
//!         Err(e) => log::error!("SR lock failed: {}", e),
//!     }
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
// Allow async fn in traits - we use maybe-async for dual sync/async support
#![allow(async_fn_in_trait)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod error;
pub mod programmer;
pub mod protocol;
pub mod spi;
pub mod status;
pub mod xmc;

pub use error::{Error, Result};
