//! # IoT Client
//!
//! `IotClient` is the lifecycle facade of the crate. It owns the broker
//! session and everything the event loop shares with producers: the outbound
//! queue, the run-control flag, the listener registry and the delivery
//! counters.
//!
//! The client is an explicitly constructed value rather than a global. Place
//! it wherever the application keeps long-lived state (a `StaticCell` on
//! target, an `Arc` on a host) and hand out shared references; every method
//! takes `&self`.
//!
//! ## Lifecycle
//!
//! ```text
//! new -> initialize -> connect -> subscribe* -> start_publish
//!                        ^                          |
//!                        +------ disconnect <-------+
//! ```
//!
//! The event loop is never started implicitly. Run
//! [`IotClient::event_loop`]'s [`EventLoop::run`] on a task of its own (or use
//! `spawn_event_loop` with the `std` feature).

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};
use embassy_time::{Timer, with_timeout};
use heapless::String;

use crate::error::{ClientError, LockTimeout, PublishError};
use crate::message::{OutboundMessage, QoS};
use crate::options::{ConnectParams, InitParams, LoopTiming, SubscribeParams};
use crate::runtime::queue::OutboundQueue;
use crate::runtime::registry::ListenerRegistry;
use crate::runtime::run_control::RunControl;
use crate::runtime::stats::{DeliveryCounters, DeliveryStats};
use crate::runtime::EventLoop;
use crate::session::Session;

/// Maximum length of the broker host name.
pub const MAX_HOST_LEN: usize = 128;

/// The session together with the lifecycle state guarded by the same lock.
pub(crate) struct SessionSlot<S> {
    pub(crate) session: S,
    initialized: bool,
    pub(crate) connected: bool,
    host: String<MAX_HOST_LEN>,
    port: u16,
}

/// Owner of a broker session and its publish pipeline.
///
/// # Type Parameters
///
/// - `M`: raw mutex flavour for every internal lock
/// - `S`: the broker session implementation
/// - `QUEUE_DEPTH`: capacity of the outbound queue
/// - `PAYLOAD_SIZE`: maximum payload of an outbound message
///
/// `'a` bounds the listeners that can be registered: each one must outlive
/// the client.
pub struct IotClient<
    'a,
    M: RawMutex,
    S: Session,
    const QUEUE_DEPTH: usize,
    const PAYLOAD_SIZE: usize,
> {
    pub(crate) slot: Mutex<M, SessionSlot<S>>,
    pub(crate) queue: OutboundQueue<M, QUEUE_DEPTH, PAYLOAD_SIZE>,
    pub(crate) run_control: RunControl<M>,
    pub(crate) registry: ListenerRegistry<'a, M>,
    pub(crate) stats: DeliveryCounters<M>,
    pub(crate) timing: LoopTiming,
}

impl<'a, M, S, const QUEUE_DEPTH: usize, const PAYLOAD_SIZE: usize>
    IotClient<'a, M, S, QUEUE_DEPTH, PAYLOAD_SIZE>
where
    M: RawMutex,
    S: Session,
{
    pub fn new(session: S) -> Self {
        Self::with_timing(session, LoopTiming::default())
    }

    pub fn with_timing(session: S, timing: LoopTiming) -> Self {
        Self {
            slot: Mutex::new(SessionSlot {
                session,
                initialized: false,
                connected: false,
                host: String::new(),
                port: 0,
            }),
            queue: OutboundQueue::new(timing.lock_wait),
            run_control: RunControl::new(timing.lock_wait),
            registry: ListenerRegistry::new(),
            stats: DeliveryCounters::new(),
            timing,
        }
    }

    async fn lock_slot(&self) -> Result<MutexGuard<'_, M, SessionSlot<S>>, LockTimeout> {
        with_timeout(self.timing.lock_wait, self.slot.lock())
            .await
            .map_err(|_| LockTimeout)
    }

    /// Configure the session with endpoint, credentials and timeouts.
    ///
    /// Automatic reconnect stays off until `connect` succeeds.
    pub async fn initialize(&self, params: &InitParams<'_>) -> Result<(), ClientError<S::Error>> {
        let mut slot = self.lock_slot().await?;
        if slot.initialized {
            return Err(ClientError::AlreadyInitialized);
        }

        let mut host = String::new();
        host.push_str(params.host)
            .map_err(|_| ClientError::HostTooLong)?;

        debug!(
            "initializing session for {}:{} ({:?})",
            params.host, params.port, params.credentials
        );
        slot.session.init(params).await.inspect_err(|err| {
            error!("session init failed: {:?}", err);
        })?;

        slot.host = host;
        slot.port = params.port;
        slot.initialized = true;
        Ok(())
    }

    /// Open the broker connection and turn on automatic reconnect.
    ///
    /// Handshake attempts follow `params.retry`; the default makes exactly one.
    /// Failing to enable automatic reconnect is logged but does not fail the
    /// call.
    pub async fn connect(&self, params: &ConnectParams<'_>) -> Result<(), ClientError<S::Error>> {
        let mut slot = self.lock_slot().await?;
        if !slot.initialized {
            return Err(ClientError::NotInitialized);
        }
        if slot.connected {
            return Err(ClientError::AlreadyConnected);
        }

        let mut attempts = 0u32;
        loop {
            match slot.session.connect(params).await {
                Ok(()) => break,
                Err(err) => {
                    attempts += 1;
                    if !params.retry.allows(attempts) {
                        error!(
                            "connect to {}:{} failed after {} attempt(s): {:?}",
                            slot.host.as_str(),
                            slot.port,
                            attempts,
                            err
                        );
                        return Err(err.into());
                    }
                    warn!("connect attempt {} failed: {:?}", attempts, err);
                    Timer::after(params.retry.delay).await;
                }
            }
        }

        if let Err(err) = slot.session.set_auto_reconnect(true).await {
            warn!("could not enable auto reconnect: {:?}", err);
        }
        slot.connected = true;

        info!(
            "connected to {}:{} as {}",
            slot.host.as_str(),
            slot.port,
            params.client_id
        );
        Ok(())
    }

    /// Close the connection and return the event loop to Idle.
    ///
    /// On failure the client stays connected and the run flag is untouched.
    pub async fn disconnect(&self) -> Result<(), ClientError<S::Error>> {
        let mut slot = self.lock_slot().await?;
        if !slot.connected {
            return Err(ClientError::NotConnected);
        }

        if let Err(err) = slot.session.set_auto_reconnect(false).await {
            warn!("could not disable auto reconnect: {:?}", err);
        }
        slot.session.disconnect().await.inspect_err(|err| {
            error!("disconnect failed: {:?}", err);
        })?;
        slot.connected = false;

        // Lowered while the slot is held so a waiting worker sees both changes.
        if self.run_control.set(false).await.is_err() {
            warn!("run flag busy, event loop left running after disconnect");
        }
        drop(slot);
        info!("disconnected");
        Ok(())
    }

    /// Register `params.listener` for `params.topic` and subscribe on the
    /// broker.
    ///
    /// When the broker rejects the subscription the local registration is
    /// rolled back.
    pub async fn try_subscribe(
        &self,
        params: SubscribeParams<'_, 'a>,
    ) -> Result<(), ClientError<S::Error>> {
        let mut slot = self.lock_slot().await?;
        if !slot.initialized {
            return Err(ClientError::NotInitialized);
        }

        self.registry
            .register(params.topic, params.qos, params.listener)?;

        if let Err(err) = slot.session.subscribe(params.topic, params.qos).await {
            self.registry.remove(params.topic, params.listener);
            error!("subscribe to {} failed: {:?}", params.topic, err);
            return Err(err.into());
        }

        info!("subscribed to {} ({:?})", params.topic, params.qos);
        Ok(())
    }

    /// Subscribe, treating any failure as fatal.
    ///
    /// # Panics
    ///
    /// Panics when [`IotClient::try_subscribe`] fails. On target this ends in
    /// the panic handler, which is expected to reset the device.
    pub async fn subscribe(&self, params: SubscribeParams<'_, 'a>) {
        if let Err(err) = self.try_subscribe(params).await {
            panic!("subscription to {} failed: {:?}", params.topic, err);
        }
    }

    /// Queue a message for delivery by the event loop.
    ///
    /// Returns as soon as the message is queued. `Ok` says nothing about
    /// delivery, which is best effort and happens only while publishing is
    /// started.
    pub async fn publish(&self, topic: &str, qos: QoS, payload: &[u8]) -> Result<(), PublishError> {
        let message = OutboundMessage::new(topic, qos, payload).inspect_err(|err| {
            warn!("rejecting publish to {}: {:?}", topic, err);
        })?;
        self.publish_message(message).await
    }

    /// Queue an already built message.
    pub async fn publish_message(
        &self,
        message: OutboundMessage<PAYLOAD_SIZE>,
    ) -> Result<(), PublishError> {
        let result = self.queue.enqueue(message).await;
        if let Err(err) = &result {
            warn!("outbound queue rejected a message: {:?}", err);
        }
        result
    }

    /// Raise the run flag; the event loop enters its Active state.
    pub async fn start_publish(&self) -> Result<(), LockTimeout> {
        self.run_control.set(true).await?;
        debug!("publishing started");
        Ok(())
    }

    /// Lower the run flag; the event loop returns to Idle after its current
    /// iteration.
    pub async fn stop_publish(&self) -> Result<(), LockTimeout> {
        self.run_control.set(false).await?;
        debug!("publishing stopped");
        Ok(())
    }

    pub async fn is_initialized(&self) -> Result<bool, LockTimeout> {
        Ok(self.lock_slot().await?.initialized)
    }

    pub async fn is_connected(&self) -> Result<bool, LockTimeout> {
        Ok(self.lock_slot().await?.connected)
    }

    pub async fn is_publishing(&self) -> Result<bool, LockTimeout> {
        self.run_control.get().await
    }

    /// Number of messages waiting in the outbound queue.
    pub async fn pending(&self) -> Result<usize, LockTimeout> {
        self.queue.len().await
    }

    pub fn stats(&self) -> DeliveryStats {
        self.stats.snapshot()
    }

    pub fn timing(&self) -> LoopTiming {
        self.timing
    }

    pub fn registry(&self) -> &ListenerRegistry<'a, M> {
        &self.registry
    }

    /// The worker that drives this client.
    pub fn event_loop(&self) -> EventLoop<'_, 'a, M, S, QUEUE_DEPTH, PAYLOAD_SIZE> {
        EventLoop::new(self)
    }
}

#[cfg(feature = "std")]
impl<M, S, const QUEUE_DEPTH: usize, const PAYLOAD_SIZE: usize>
    IotClient<'static, M, S, QUEUE_DEPTH, PAYLOAD_SIZE>
where
    M: RawMutex + Send + Sync + 'static,
    S: Session + Send + 'static,
{
    /// Run the event loop on a dedicated, named host thread.
    ///
    /// The thread never finishes on its own; the handle is mostly useful for
    /// naming and ownership.
    pub fn spawn_event_loop(
        self: &std::sync::Arc<Self>,
        name: &str,
    ) -> std::io::Result<std::thread::JoinHandle<()>> {
        let client = std::sync::Arc::clone(self);
        std::thread::Builder::new()
            .name(name.into())
            .spawn(move || embassy_futures::block_on(client.event_loop().run()))
    }
}
