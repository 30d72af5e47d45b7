//! # Cloud Uplink for Embedded Devices
//!
//! `myrtio-uplink` keeps a camera-equipped microcontroller attached to a cloud
//! message broker. It owns a long-lived broker session, serializes outbound
//! messages through a bounded queue and runs a cooperative event loop that can
//! be started and stopped from any task or thread.
//!
//! ## Core Features
//!
//! - **`no_std` & `no_alloc`:** All buffers are fixed-capacity `heapless`
//!   storage sized by const generics.
//! - **Fully Async:** Built on the [Embassy](https://embassy.dev/) primitives;
//!   every shared lock is acquired with a bounded wait.
//! - **Session Agnostic:** The broker protocol, TLS and reconnect machinery sit
//!   behind the [`Session`] trait, so the same client runs over any broker
//!   stack and against a scripted fake in tests.
//! - **Borrow-checked listeners:** Subscription listeners are borrowed for the
//!   client's lifetime and can never dangle.
//!
//! ## Architecture
//!
//! ```text
//!  producers ──publish──> OutboundQueue ──drain──┐
//!                                                 v
//!  start/stop ──> RunControl ──> EventLoop ──> Session ──> broker
//!                                    │
//!                  listeners <── ListenerRegistry <── inbound
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use myrtio_uplink::{IotClient, QoS, app};
//!
//! static LISTENER: UrlCommandListener<CriticalSectionRawMutex> = ...;
//!
//! let client = IotClient::<CriticalSectionRawMutex, _, 8, 256>::new(session);
//! spawner.spawn(uplink_task(&client))?; // runs client.event_loop().run()
//!
//! let config = app::DeviceConfig::new(AWS_HOST, "camera-01");
//! app::bring_up(&client, &config, credentials, &LISTENER).await?;
//! app::publish_announce(&client, &config).await?;
//! ```
//!
//! ## Logging
//!
//! Enable one of the `log`, `defmt` or `esp32-log` features to route the
//! crate's diagnostics; without them logging compiles away.

#![no_std]

#[cfg(feature = "std")]
extern crate std;

#[macro_use]
mod fmt;

pub mod app;
pub mod client;
pub mod error;
pub mod message;
pub mod options;
pub mod runtime;
pub mod session;

// Re-export key types for easier access at the crate root.
pub use client::{IotClient, MAX_HOST_LEN};
pub use error::{ClientError, LockTimeout, PublishError, SessionError};
pub use message::{InboundMessage, MAX_INBOUND_PAYLOAD, MAX_TOPIC_LEN, OutboundMessage, QoS};
pub use options::{ConnectParams, Credentials, InitParams, LoopTiming, RetryPolicy, SubscribeParams};
pub use runtime::{DeliveryStats, EventLoop, SubscribeListener};
pub use session::{InboundSink, LinkStatus, Session, SessionResult};
