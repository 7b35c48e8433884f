//! FlashHandle - an opened programmer plus how to wait on the chip

use srlock_core::error::Result;
use srlock_core::programmer::{NoSuspend, SpiMaster, WaitPolicy};
use srlock_core::protocol;
use srlock_core::status::StatusComposite;
use srlock_core::xmc::{self, ChipIdentity, CheckOutcome, FlashContext, LockMode, LockReport};

/// Opened programmer ready to run the lock routine
///
/// Hosted programmers own the SPI bus exclusively, so the handle runs every
/// operation with [`NoSuspend`].
pub struct FlashHandle {
    master: Box<dyn SpiMaster + Send>,
    programmer: String,
    wait: WaitPolicy,
}

impl FlashHandle {
    pub(crate) fn new(master: Box<dyn SpiMaster + Send>, programmer: &str) -> Self {
        Self {
            master,
            programmer: programmer.to_string(),
            wait: WaitPolicy::default(),
        }
    }

    /// Canonical name of the programmer behind this handle
    pub fn programmer(&self) -> &str {
        &self.programmer
    }

    /// Current wait-for-idle policy
    pub fn wait_policy(&self) -> WaitPolicy {
        self.wait
    }

    /// Replace the wait-for-idle policy
    pub fn set_wait_policy(&mut self, wait: WaitPolicy) {
        self.wait = wait;
    }

    fn with_context<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut FlashContext<'_, Box<dyn SpiMaster + Send>, NoSuspend>) -> Result<T>,
    {
        let mut suspend = NoSuspend;
        let mut ctx = FlashContext::new(&mut self.master, &mut suspend).with_wait_policy(self.wait);
        f(&mut ctx)
    }

    /// Read the JEDEC ID and SFDP revision bytes
    pub fn identify(&mut self) -> Result<ChipIdentity> {
        self.with_context(|ctx| xmc::identify(ctx))
    }

    /// Read SR1, SR2 and SR3
    pub fn read_status(&mut self) -> Result<StatusComposite> {
        self.master.wait_idle(&self.wait)?;
        let sr1 = protocol::read_status1(&mut self.master)?;
        let sr2 = protocol::read_status2(&mut self.master)?;
        let sr3 = protocol::read_status3(&mut self.master)?;
        Ok(StatusComposite::from_regs(sr1, sr2, sr3))
    }

    /// Identify the chip and lock it if it is an affected model
    pub fn check_and_lock(&mut self, mode: LockMode) -> Result<CheckOutcome> {
        self.with_context(|ctx| xmc::check_and_lock(ctx, mode))
    }

    /// Write `good_value` and lock, regardless of the chip model
    pub fn lock(&mut self, good_value: u32, mode: LockMode) -> Result<LockReport> {
        self.with_context(|ctx| xmc::lock(ctx, good_value, mode))
    }
}
