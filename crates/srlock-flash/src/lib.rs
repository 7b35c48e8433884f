//! Programmer access for the srlock CLI
//!
//! This crate opens a programmer from a `name[:key=value,...]` string and
//! wraps it in a [`FlashHandle`] that runs the status register lock
//! routine. The CLI only talks to this crate and to the types of
//! `srlock-core` it re-exports; it never sees a concrete programmer.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      CLI (bin/srlock)                     │
//! └──────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │                  srlock-flash (this crate)                │
//! │  - FlashHandle: programmer + wait policy                  │
//! │  - Registry: opens programmers by name                    │
//! └──────────────────────────────────────────────────────────┘
//!                              │
//!              ┌───────────────┴───────────────┐
//!              ▼                               ▼
//! ┌──────────────────────────┐   ┌──────────────────────────┐
//! │      srlock-core         │   │  Programmer crates       │
//! │  - identify / classify   │   │  - dummy, linux-spi      │
//! │  - lock / check_and_lock │   │  - Implement SpiMaster   │
//! └──────────────────────────┘   └──────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use srlock_flash::{open_flash, LockMode};
//!
//! let mut handle = open_flash("linux_spi:dev=/dev/spidev0.0")?;
//! let outcome = handle.check_and_lock(LockMode::PowerCycle)?;
//! println!("{}", outcome);
//! ```

mod handle;
mod registry;

pub use handle::FlashHandle;
pub use registry::{
    available_programmers, open_flash, open_spi_programmer, parse_number,
    parse_programmer_params, programmer_names_short, BoxedSpiMaster, ProgrammerInfo,
    ProgrammerParams,
};

// Re-export core types that CLI needs
pub use srlock_core::programmer::WaitPolicy;
pub use srlock_core::status::{ProtectionMode, StatusBits, StatusComposite};
pub use srlock_core::xmc::{
    classify, AffectedModel, CheckOutcome, ChipIdentity, Classification, LockMode, LockPath,
    LockReport, AFFECTED_MODELS,
};
