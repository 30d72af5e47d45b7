//! Run-control flag read by the event loop and written by any task.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::{Duration, with_timeout};

use crate::error::LockTimeout;

/// Whether the event loop should be in its Active state.
pub struct RunControl<M: RawMutex> {
    active: Mutex<M, bool>,
    lock_wait: Duration,
}

impl<M: RawMutex> RunControl<M> {
    pub fn new(lock_wait: Duration) -> Self {
        Self {
            active: Mutex::new(false),
            lock_wait,
        }
    }

    /// Store a new value. Setting the current value again is a no-op.
    pub async fn set(&self, active: bool) -> Result<(), LockTimeout> {
        let mut flag = with_timeout(self.lock_wait, self.active.lock())
            .await
            .map_err(|_| LockTimeout)?;
        *flag = active;
        Ok(())
    }

    pub async fn get(&self) -> Result<bool, LockTimeout> {
        with_timeout(self.lock_wait, self.active.lock())
            .await
            .map(|flag| *flag)
            .map_err(|_| LockTimeout)
    }

    /// Read the flag for the event loop. A lock timeout reads as inactive.
    pub async fn is_active(&self) -> bool {
        self.get().await.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use embassy_futures::block_on;
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

    use super::*;

    #[test]
    fn starts_inactive_and_toggles_idempotently() {
        let control = RunControl::<CriticalSectionRawMutex>::new(Duration::from_millis(50));
        block_on(async {
            assert_eq!(control.get().await, Ok(false));

            control.set(true).await.unwrap();
            control.set(true).await.unwrap();
            assert!(control.is_active().await);

            control.set(false).await.unwrap();
            assert!(!control.is_active().await);
        });
    }

    #[test]
    fn contended_flag_reads_as_inactive() {
        let control = RunControl::<CriticalSectionRawMutex>::new(Duration::from_millis(20));
        block_on(async {
            control.set(true).await.unwrap();
            let _guard = control.active.lock().await;

            assert!(!control.is_active().await);
            assert_eq!(control.set(false).await, Err(LockTimeout));
        });
    }
}
