//! Flash handle passed through the lock routine

use crate::programmer::{BusSuspend, SpiMaster, WaitPolicy};

/// Everything the routine needs to reach the flash chip
///
/// Bundles the bus primitive, the suspension bracket and the wait-for-idle
/// policy so no part of the routine relies on global state.
pub struct FlashContext<'a, M: SpiMaster + ?Sized, S: BusSuspend + ?Sized> {
    /// Bus primitive executing single SPI commands
    pub master: &'a mut M,
    /// Suspends competing flash users while raw commands are on the bus
    pub suspend: &'a mut S,
    /// How to wait for the chip to become idle
    pub wait: WaitPolicy,
}

impl<'a, M: SpiMaster + ?Sized, S: BusSuspend + ?Sized> FlashContext<'a, M, S> {
    /// Create a context with the default (unbounded) wait policy
    pub fn new(master: &'a mut M, suspend: &'a mut S) -> Self {
        Self {
            master,
            suspend,
            wait: WaitPolicy::default(),
        }
    }

    /// Replace the wait-for-idle policy
    pub fn with_wait_policy(mut self, wait: WaitPolicy) -> Self {
        self.wait = wait;
        self
    }
}
