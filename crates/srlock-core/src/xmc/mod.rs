//! XMC status register lock
//!
//! Some revisions of XMC XM25QHxxC chips can lose their status register
//! contents when power drops during a status register write: Quad Enable
//! gets cleared, block protection gets set, and the board stops booting
//! from flash. The workaround is to write a known good configuration once
//! and then raise SRP1 so that nothing can touch the registers again until
//! the next power cycle (or ever, with SRP0 as well).
//!
//! The flow is split into three steps that can be used on their own:
//!
//! - [`identify`] reads the JEDEC ID and, for XMC chips, two SFDP revision
//!   bytes;
//! - [`classify`] maps the identity to a [`Classification`];
//! - [`lock`] writes a good value and sets the protection bits.
//!
//! [`check_and_lock`] runs all three.
//!
//! All log records use the [`LOG_TARGET`] target.
//!
//! # Clock speed
//!
//! Locking the status registers may prevent later use of the high
//! frequency mode (above 80 MHz), which needs a status register change of
//! its own. Only lock devices that will never run the flash above 80 MHz.

mod context;
mod identify;
mod io;
mod lock;
mod policy;

pub use context::FlashContext;
pub use identify::{
    identify, ChipIdentity, SFDP_ADDR_06, SFDP_ADDR_F4, SFDP_NOT_PROBED,
};
pub use io::{StandardStatusIo, StatusRegisterIo};
pub use lock::{lock, lock_with, LockMode, LockPath, LockReport, LockTargets};
pub use policy::{
    classify, find_model, AffectedModel, Classification, AFFECTED_MODELS,
    AFFECTED_SFDP_SIGNATURE, XMC_MANUFACTURER_ID,
};

use core::fmt;

use crate::error::Result;
use crate::programmer::{BusSuspend, SpiMaster};
use maybe_async::maybe_async;

/// Log target of every record emitted by this module
pub const LOG_TARGET: &str = "xmc_sr";

/// Result of [`check_and_lock`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Not an XMC chip; nothing done
    NotXmc {
        /// Identity as read
        identity: ChipIdentity,
    },
    /// XMC chip without the defect; nothing done
    UnaffectedRevision {
        /// Identity as read
        identity: ChipIdentity,
    },
    /// Defective revision of a model with no known good value; nothing done
    UnsupportedModel {
        /// Identity as read
        identity: ChipIdentity,
    },
    /// The lock routine ran
    Locked {
        /// Model that matched
        model: &'static AffectedModel,
        /// What the lock routine did
        report: LockReport,
    },
}

impl CheckOutcome {
    /// True for the outcome that is treated as an error
    pub fn is_error(&self) -> bool {
        matches!(self, Self::UnsupportedModel { .. })
    }

    /// Lock report, if the lock routine ran
    pub fn report(&self) -> Option<&LockReport> {
        match self {
            Self::Locked { report, .. } => Some(report),
            _ => None,
        }
    }
}

impl fmt::Display for CheckOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotXmc { identity } => write!(f, "{}: not an XMC chip, skipped", identity),
            Self::UnaffectedRevision { identity } => {
                write!(f, "{}: unaffected revision, skipped", identity)
            }
            Self::UnsupportedModel { identity } => {
                write!(f, "{}: unsupported XMC model, not modified", identity)
            }
            Self::Locked { model, report } => write!(
                f,
                "{}: {} ({} -> {})",
                model.name, report.path, report.before, report.after
            ),
        }
    }
}

/// Identify the chip and lock its status registers if it needs it
///
/// Uses the standard status register commands. See [`check_and_lock_with`].
///
/// Caution: a locked chip may not be switchable to high frequency mode
/// (above 80 MHz) anymore.
#[maybe_async]
pub async fn check_and_lock<M, S>(
    ctx: &mut FlashContext<'_, M, S>,
    mode: LockMode,
) -> Result<CheckOutcome>
where
    M: SpiMaster + ?Sized,
    S: BusSuspend + ?Sized,
{
    check_and_lock_with(ctx, &mut StandardStatusIo, mode).await
}

/// Identify the chip and lock its status registers if it needs it, using
/// `io` for register access
///
/// Chips that are not XMC, XMC revisions without the defect and defective
/// revisions of unknown models are never written. Only bus failures are
/// returned as errors; the unsupported model case is logged at error level
/// and returned as [`CheckOutcome::UnsupportedModel`].
#[maybe_async]
pub async fn check_and_lock_with<M, S, R>(
    ctx: &mut FlashContext<'_, M, S>,
    io: &mut R,
    mode: LockMode,
) -> Result<CheckOutcome>
where
    M: SpiMaster + ?Sized,
    S: BusSuspend + ?Sized,
    R: StatusRegisterIo + ?Sized,
{
    let identity = identify(ctx).await?;

    let outcome = match classify(&identity) {
        Classification::NotXmc => {
            log::info!(
                target: LOG_TARGET,
                "non-xmc ({:06X}). SR lock skipped.",
                identity.flash_id
            );
            CheckOutcome::NotXmc { identity }
        }
        Classification::UnaffectedRevision => {
            log::info!(
                target: LOG_TARGET,
                "ver not match ({:02X}, {:02X}), SR lock skipped.",
                identity.sfdp_06,
                identity.sfdp_f4
            );
            CheckOutcome::UnaffectedRevision { identity }
        }
        Classification::UnsupportedModel => {
            log::error!(
                target: LOG_TARGET,
                "Unsupported XMC model: {:06X}",
                identity.flash_id
            );
            CheckOutcome::UnsupportedModel { identity }
        }
        Classification::Remediate(model) => {
            log::debug!(
                target: LOG_TARGET,
                "{} matched, good value {:06X}",
                model.name,
                model.good_value
            );
            let report = lock_with(ctx, io, model.good_value, mode).await?;
            CheckOutcome::Locked { model, report }
        }
    };

    Ok(outcome)
}
