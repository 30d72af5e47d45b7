//! # Client Options
//!
//! Parameter structs for the lifecycle operations and the event loop timing.
//! All durations are `embassy_time::Duration`; defaults match the values the
//! device firmware ships with.

use embassy_time::Duration;

use crate::message::QoS;
use crate::runtime::SubscribeListener;

/// PEM-encoded TLS material handed through to the session.
#[derive(Clone, Copy, Default)]
pub struct Credentials<'a> {
    pub root_ca: &'a [u8],
    pub certificate: &'a [u8],
    pub private_key: &'a [u8],
}

// Key material never ends up in logs, only its size.
impl core::fmt::Debug for Credentials<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credentials")
            .field("root_ca_len", &self.root_ca.len())
            .field("certificate_len", &self.certificate.len())
            .field("private_key_len", &self.private_key.len())
            .finish()
    }
}

/// Parameters for [`IotClient::initialize`](crate::client::IotClient::initialize).
#[derive(Debug, Clone, Copy)]
pub struct InitParams<'a> {
    pub host: &'a str,
    pub port: u16,
    pub credentials: Credentials<'a>,
    /// Upper bound for a single broker request.
    pub command_timeout: Duration,
    pub tls_handshake_timeout: Duration,
}

impl<'a> InitParams<'a> {
    pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_millis(20_000);
    pub const DEFAULT_TLS_HANDSHAKE_TIMEOUT: Duration = Duration::from_millis(5_000);

    pub fn new(host: &'a str, port: u16, credentials: Credentials<'a>) -> Self {
        Self {
            host,
            port,
            credentials,
            command_timeout: Self::DEFAULT_COMMAND_TIMEOUT,
            tls_handshake_timeout: Self::DEFAULT_TLS_HANDSHAKE_TIMEOUT,
        }
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn with_tls_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.tls_handshake_timeout = timeout;
        self
    }
}

/// How `connect` reacts to a failed handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total handshake attempts; `None` keeps trying forever.
    pub max_attempts: Option<u32>,
    /// Pause between two attempts.
    pub delay: Duration,
}

impl RetryPolicy {
    /// A single attempt, failure reported to the caller.
    pub const fn once() -> Self {
        Self {
            max_attempts: Some(1),
            delay: Duration::from_millis(0),
        }
    }

    /// Retry with a fixed delay until the handshake succeeds.
    pub const fn forever(delay: Duration) -> Self {
        Self {
            max_attempts: None,
            delay,
        }
    }

    pub const fn limited(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: Some(max_attempts),
            delay,
        }
    }

    pub(crate) fn allows(&self, attempt: u32) -> bool {
        self.max_attempts.is_none_or(|max| attempt < max)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::once()
    }
}

/// Parameters for [`IotClient::connect`](crate::client::IotClient::connect).
#[derive(Debug, Clone, Copy)]
pub struct ConnectParams<'a> {
    pub keep_alive_secs: u16,
    pub client_id: &'a str,
    pub retry: RetryPolicy,
}

impl<'a> ConnectParams<'a> {
    pub const DEFAULT_KEEP_ALIVE_SECS: u16 = 10;

    pub fn new(client_id: &'a str) -> Self {
        Self {
            keep_alive_secs: Self::DEFAULT_KEEP_ALIVE_SECS,
            client_id,
            retry: RetryPolicy::once(),
        }
    }

    pub fn with_keep_alive(mut self, secs: u16) -> Self {
        self.keep_alive_secs = secs;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Parameters for [`IotClient::subscribe`](crate::client::IotClient::subscribe).
///
/// The topic is copied, but the listener is borrowed for the client's
/// lifetime `'a`, so it cannot be dropped while it is still registered.
#[derive(Clone, Copy)]
pub struct SubscribeParams<'t, 'a> {
    pub topic: &'t str,
    pub qos: QoS,
    pub listener: &'a dyn SubscribeListener,
}

impl<'t, 'a> SubscribeParams<'t, 'a> {
    pub fn new(topic: &'t str, qos: QoS, listener: &'a dyn SubscribeListener) -> Self {
        Self {
            topic,
            qos,
            listener,
        }
    }
}

/// Timing knobs of the event loop and of every bounded lock wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopTiming {
    /// Pause between two loop iterations, Idle or Active.
    pub iteration_delay: Duration,
    /// Longest wait for any shared lock before giving up.
    pub lock_wait: Duration,
    /// Bound passed to [`Session::yield_for`](crate::session::Session::yield_for).
    pub yield_timeout: Duration,
}

impl LoopTiming {
    pub const fn new() -> Self {
        Self {
            iteration_delay: Duration::from_millis(50),
            lock_wait: Duration::from_millis(100),
            yield_timeout: Duration::from_millis(100),
        }
    }

    pub const fn with_iteration_delay(mut self, delay: Duration) -> Self {
        self.iteration_delay = delay;
        self
    }

    pub const fn with_lock_wait(mut self, wait: Duration) -> Self {
        self.lock_wait = wait;
        self
    }

    pub const fn with_yield_timeout(mut self, timeout: Duration) -> Self {
        self.yield_timeout = timeout;
        self
    }
}

impl Default for LoopTiming {
    fn default() -> Self {
        Self::new()
    }
}
