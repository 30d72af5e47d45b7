//! The event loop worker.
//!
//! The worker alternates between two states:
//!
//! - **Idle**: the run flag is down. The loop only sleeps and re-checks it.
//! - **Active**: each iteration hands the session a bounded slice of time to
//!   process network traffic (inbound messages reach listeners from inside
//!   that call), then drains the outbound queue.
//!
//! Only a failed link lowers the run flag from inside the loop. Everything
//! else that goes wrong is logged, counted and skipped.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::{Timer, with_timeout};

use super::registry::Dispatch;
use crate::client::IotClient;
use crate::error::SessionError;
use crate::message::{OutboundMessage, QoS};
use crate::session::{LinkStatus, Session};

/// Outcome of a single Active iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Iteration {
    /// The session yielded and the queue was drained.
    Continue,
    /// A reconnect is in progress; nothing was drained.
    Reconnecting,
    /// The session lock was busy; the iteration did nothing.
    Skipped,
    /// The run flag was down on entry, or the session is not connected.
    Stopped,
    /// The link failed; the run flag has been lowered.
    LinkLost,
}

/// Worker that drives an [`IotClient`].
///
/// Borrowing the client keeps the worker from outliving it. Exactly one
/// worker should run per client.
pub struct EventLoop<'c, 'a, M, S, const QUEUE_DEPTH: usize, const PAYLOAD_SIZE: usize>
where
    M: RawMutex,
    S: Session,
{
    client: &'c IotClient<'a, M, S, QUEUE_DEPTH, PAYLOAD_SIZE>,
}

impl<'c, 'a, M, S, const QUEUE_DEPTH: usize, const PAYLOAD_SIZE: usize>
    EventLoop<'c, 'a, M, S, QUEUE_DEPTH, PAYLOAD_SIZE>
where
    M: RawMutex,
    S: Session,
{
    pub(crate) fn new(client: &'c IotClient<'a, M, S, QUEUE_DEPTH, PAYLOAD_SIZE>) -> Self {
        Self { client }
    }

    /// Run forever, moving between Idle and Active as the run flag changes.
    ///
    /// This future never completes.
    pub async fn run(&self) {
        info!("event loop started");
        loop {
            if self.client.run_control.is_active().await {
                debug!("event loop active");
                self.run_active().await;
                debug!("event loop idle");
            }
            Timer::after(self.client.timing.iteration_delay).await;
        }
    }

    /// Iterate until the flag goes down or the link is lost.
    async fn run_active(&self) {
        loop {
            match self.iterate().await {
                Iteration::Continue | Iteration::Skipped => {
                    Timer::after(self.client.timing.iteration_delay).await;
                }
                // The yield already waited for up to its timeout.
                Iteration::Reconnecting => {}
                Iteration::Stopped | Iteration::LinkLost => return,
            }
        }
    }

    /// Perform one Active iteration without the trailing sleep.
    pub async fn iterate(&self) -> Iteration {
        let client = self.client;
        if !client.run_control.is_active().await {
            return Iteration::Stopped;
        }

        let Ok(mut slot) = with_timeout(client.timing.lock_wait, client.slot.lock()).await else {
            debug!("session busy, skipping iteration");
            return Iteration::Skipped;
        };
        if !slot.connected {
            trace!("session not connected, nothing to drive");
            return Iteration::Stopped;
        }
        let session = &mut slot.session;

        let sink = Dispatch {
            registry: &client.registry,
            stats: &client.stats,
        };
        match session.yield_for(client.timing.yield_timeout, &sink).await {
            Ok(LinkStatus::Ready) => {}
            Ok(LinkStatus::Reconnected) => info!("link re-established"),
            Ok(LinkStatus::Reconnecting) => {
                trace!("reconnect in progress");
                return Iteration::Reconnecting;
            }
            Err(SessionError::Disconnected) if !session.auto_reconnect_enabled() => {
                warn!("link down with auto reconnect off, trying once");
                match session.attempt_reconnect().await {
                    Ok(LinkStatus::Reconnecting) => return Iteration::Reconnecting,
                    Ok(_) => info!("manual reconnect succeeded"),
                    Err(err) => {
                        drop(slot);
                        return self.lose_link(err).await;
                    }
                }
            }
            Err(err) => {
                drop(slot);
                return self.lose_link(err).await;
            }
        }

        while let Some(message) = client.queue.try_dequeue().await {
            self.deliver(session, &message).await;
        }
        Iteration::Continue
    }

    async fn lose_link(&self, err: SessionError<S::Error>) -> Iteration {
        error!("link failed, leaving active state: {:?}", err);
        self.client.stats.bump(|s| &mut s.link_failures);
        if self.client.run_control.set(false).await.is_err() {
            warn!("run flag busy, event loop will retry on the next pass");
        }
        Iteration::LinkLost
    }

    async fn deliver(&self, session: &mut S, message: &OutboundMessage<PAYLOAD_SIZE>) {
        match session
            .publish(message.topic(), message.payload(), message.qos())
            .await
        {
            Ok(()) => {
                trace!("published {} bytes to {}", message.payload().len(), message.topic());
                self.client.stats.bump(|s| &mut s.delivered);
            }
            Err(SessionError::RequestTimeout) if message.qos() == QoS::AtMostOnce => {
                warn!("publish to {} timed out, QoS 0 counts as sent", message.topic());
                self.client.stats.bump(|s| &mut s.delivered);
            }
            Err(err) => {
                error!("publish to {} failed, dropping: {:?}", message.topic(), err);
                self.client.stats.bump(|s| &mut s.dropped);
            }
        }
    }
}
