use std::sync::atomic::{AtomicBool, Ordering};

/// Allows one refresh at a time. A second caller gets `None` instead of
/// queueing behind the one in flight.
#[derive(Debug, Default)]
pub struct RefreshGate {
    in_flight: AtomicBool,
}

/// Releases the gate when dropped, including on early return.
pub struct RefreshGuard<'a> {
    gate: &'a RefreshGate,
}

impl RefreshGate {
    pub fn try_begin(&self) -> Option<RefreshGuard<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RefreshGuard { gate: self })
    }

    #[cfg(test)]
    fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.gate.in_flight.store(false, Ordering::Release);
    }
}
