//! # Broker Session Abstraction
//!
//! This module defines the `Session` trait, the capability the uplink drives
//! to talk to the cloud broker. An implementation owns the socket and TLS
//! state, the wire protocol and its reconnect machinery; the uplink only
//! sequences calls into it. Swapping the implementation for a scripted fake is
//! how the event loop is tested off-target.
//!
//! The trait uses native `async fn`, so no `async-trait` macro is needed.

use embassy_time::Duration;

use crate::error::SessionError;
use crate::message::QoS;
use crate::options::{ConnectParams, InitParams};

/// Outcome of a successful [`Session::yield_for`] or reconnect attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkStatus {
    /// The link is up and idle work was processed.
    Ready,
    /// The link dropped and an automatic reconnect is under way.
    Reconnecting,
    /// The link was re-established during this call.
    Reconnected,
}

/// Receiver for complete inbound messages.
///
/// A session calls `deliver` from inside `yield_for`, on the caller's task, for
/// every message received on a subscribed topic. The slices are only valid for
/// the duration of the call.
pub trait InboundSink {
    fn deliver(&self, topic: &str, payload: &[u8]);
}

/// Result type shared by all session operations.
pub type SessionResult<T, E> = Result<T, SessionError<E>>;

/// An authenticated, reconnecting connection to the broker.
#[allow(async_fn_in_trait)]
pub trait Session {
    /// The error type returned by the broker client.
    type Error: core::fmt::Debug;

    /// Configure the client: endpoint, credentials and timeouts.
    ///
    /// Automatic reconnect stays disabled until [`Session::set_auto_reconnect`]
    /// enables it.
    async fn init(&mut self, params: &InitParams<'_>) -> SessionResult<(), Self::Error>;

    /// Perform one connection handshake.
    async fn connect(&mut self, params: &ConnectParams<'_>) -> SessionResult<(), Self::Error>;

    async fn set_auto_reconnect(&mut self, enabled: bool) -> SessionResult<(), Self::Error>;

    fn auto_reconnect_enabled(&self) -> bool;

    /// Try to restore a dropped link once, outside the automatic machinery.
    async fn attempt_reconnect(&mut self) -> SessionResult<LinkStatus, Self::Error>;

    /// Close the connection cleanly.
    async fn disconnect(&mut self) -> SessionResult<(), Self::Error>;

    async fn subscribe(&mut self, topic: &str, qos: QoS) -> SessionResult<(), Self::Error>;

    async fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
    ) -> SessionResult<(), Self::Error>;

    /// Hand control to the network layer for at most `timeout`.
    ///
    /// Processes inbound traffic, passing complete messages to `inbound`,
    /// services keep-alive and advances any reconnect in progress.
    async fn yield_for(
        &mut self,
        timeout: Duration,
        inbound: &dyn InboundSink,
    ) -> SessionResult<LinkStatus, Self::Error>;
}
