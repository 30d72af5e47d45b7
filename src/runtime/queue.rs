//! Bounded outbound FIFO shared between producers and the event loop.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};
use embassy_time::{Duration, with_timeout};
use heapless::Deque;

use crate::error::{LockTimeout, PublishError};
use crate::message::OutboundMessage;

/// Strict FIFO of messages waiting for delivery.
///
/// Every access takes the queue lock with a bounded wait, so a producer never
/// blocks for longer than `lock_wait`. There is no way to wait for the queue
/// to become non-empty; the event loop polls it once per iteration.
pub struct OutboundQueue<M: RawMutex, const QUEUE_DEPTH: usize, const PAYLOAD_SIZE: usize> {
    items: Mutex<M, Deque<OutboundMessage<PAYLOAD_SIZE>, QUEUE_DEPTH>>,
    lock_wait: Duration,
}

impl<M: RawMutex, const QUEUE_DEPTH: usize, const PAYLOAD_SIZE: usize>
    OutboundQueue<M, QUEUE_DEPTH, PAYLOAD_SIZE>
{
    pub fn new(lock_wait: Duration) -> Self {
        Self {
            items: Mutex::new(Deque::new()),
            lock_wait,
        }
    }

    async fn lock(
        &self,
    ) -> Result<MutexGuard<'_, M, Deque<OutboundMessage<PAYLOAD_SIZE>, QUEUE_DEPTH>>, LockTimeout>
    {
        with_timeout(self.lock_wait, self.items.lock())
            .await
            .map_err(|_| LockTimeout)
    }

    /// Append a message at the tail.
    ///
    /// A full queue rejects the new message and keeps everything already
    /// queued.
    pub async fn enqueue(&self, message: OutboundMessage<PAYLOAD_SIZE>) -> Result<(), PublishError> {
        let mut items = self.lock().await?;
        items
            .push_back(message)
            .map_err(|_| PublishError::QueueFull)
    }

    /// Remove the head of the queue.
    ///
    /// Returns `None` when the queue is empty or its lock was not acquired in
    /// time; the caller cannot tell the two apart and simply tries again
    /// later.
    pub async fn try_dequeue(&self) -> Option<OutboundMessage<PAYLOAD_SIZE>> {
        self.lock().await.ok()?.pop_front()
    }

    pub async fn is_empty(&self) -> Result<bool, LockTimeout> {
        Ok(self.lock().await?.is_empty())
    }

    pub async fn len(&self) -> Result<usize, LockTimeout> {
        Ok(self.lock().await?.len())
    }

    pub const fn capacity(&self) -> usize {
        QUEUE_DEPTH
    }
}
