//! Delivery counters kept by the event loop.

use core::cell::Cell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::RawMutex;

/// Snapshot of what the event loop has done so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeliveryStats {
    /// Messages handed to the session, including QoS 0 publishes that timed
    /// out waiting for the broker.
    pub delivered: u32,
    /// Messages consumed from the queue whose publish failed.
    pub dropped: u32,
    /// Inbound messages passed on to listeners.
    pub received: u32,
    /// Times the Active state was left because the link failed.
    pub link_failures: u32,
}

pub(crate) struct DeliveryCounters<M: RawMutex> {
    inner: Mutex<M, Cell<DeliveryStats>>,
}

impl<M: RawMutex> DeliveryCounters<M> {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(Cell::new(DeliveryStats::default())),
        }
    }

    pub(crate) fn record(&self, update: impl FnOnce(&mut DeliveryStats)) {
        self.inner.lock(|cell| {
            let mut stats = cell.get();
            update(&mut stats);
            cell.set(stats);
        });
    }

    /// Add one to a counter, wrapping at `u32::MAX`.
    pub(crate) fn bump(&self, counter: impl FnOnce(&mut DeliveryStats) -> &mut u32) {
        self.record(|stats| {
            let value = counter(stats);
            *value = value.wrapping_add(1);
        });
    }

    pub(crate) fn snapshot(&self) -> DeliveryStats {
        self.inner.lock(Cell::get)
    }
}

#[cfg(test)]
mod tests {
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

    use super::*;

    #[test]
    fn updates_accumulate() {
        let counters = DeliveryCounters::<CriticalSectionRawMutex>::new();
        counters.bump(|s| &mut s.delivered);
        counters.bump(|s| &mut s.delivered);
        counters.bump(|s| &mut s.dropped);

        let stats = counters.snapshot();
        assert_eq!(stats.delivered, 2);
        assert_eq!(stats.dropped, 1);
        assert_eq!(stats.received, 0);
    }

    #[test]
    fn counters_wrap_at_max() {
        let counters = DeliveryCounters::<CriticalSectionRawMutex>::new();
        counters.record(|s| s.link_failures = u32::MAX);
        counters.bump(|s| &mut s.link_failures);
        assert_eq!(counters.snapshot().link_failures, 0);
    }
}
