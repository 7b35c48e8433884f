//! Bus suspension around raw flash commands
//!
//! While raw commands are on the bus, nothing else may touch the flash:
//! a cache refill or an interrupt handler executing from flash would corrupt
//! the transaction. Platforms provide a [`BusSuspend`] that disables
//! interrupts, caches and other cores; hosted programmers own the bus
//! exclusively and use [`NoSuspend`].

/// Suspend/resume pair for interrupts and competing flash users
pub trait BusSuspend {
    /// Stop everything else that may access the flash
    fn suspend(&mut self);

    /// Undo the matching [`suspend`](Self::suspend)
    fn resume(&mut self);
}

impl<T: BusSuspend + ?Sized> BusSuspend for &mut T {
    fn suspend(&mut self) {
        (**self).suspend()
    }

    fn resume(&mut self) {
        (**self).resume()
    }
}

/// No-op suspension for programmers that own the bus exclusively
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSuspend;

impl BusSuspend for NoSuspend {
    fn suspend(&mut self) {}

    fn resume(&mut self) {}
}

/// Scope guard that keeps the bus suspended until dropped
///
/// Resuming on drop closes the window on every exit path, including early
/// returns on bus errors.
pub struct SuspendGuard<'a, S: BusSuspend + ?Sized> {
    inner: &'a mut S,
}

impl<'a, S: BusSuspend + ?Sized> SuspendGuard<'a, S> {
    /// Suspend the bus and return a guard that resumes it
    pub fn new(inner: &'a mut S) -> Self {
        inner.suspend();
        Self { inner }
    }
}

impl<S: BusSuspend + ?Sized> Drop for SuspendGuard<'_, S> {
    fn drop(&mut self) {
        self.inner.resume();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        depth: i32,
        resumed: u32,
    }

    impl BusSuspend for Counter {
        fn suspend(&mut self) {
            self.depth += 1;
        }

        fn resume(&mut self) {
            self.depth -= 1;
            self.resumed += 1;
        }
    }

    #[test]
    fn test_guard_resumes_on_drop() {
        let mut counter = Counter::default();
        {
            let _guard = SuspendGuard::new(&mut counter);
        }
        assert_eq!(counter.depth, 0);
        assert_eq!(counter.resumed, 1);
    }

    #[test]
    fn test_guard_resumes_on_early_return() {
        fn fails(counter: &mut Counter) -> Result<(), ()> {
            let _guard = SuspendGuard::new(counter);
            Err(())
        }

        let mut counter = Counter::default();
        assert!(fails(&mut counter).is_err());
        assert_eq!(counter.depth, 0);
    }
}
