//! Subscription listener trait and utilities.
//!
//! Listeners receive inbound messages on the event loop's own task, from
//! inside the session's yield call. They see an owned copy of the message,
//! so nothing they do can observe or disturb the session's receive buffer.
//!
//! # Composition
//!
//! A single listener is registered per subscription. To fan one topic out to
//! several consumers, wrap them in a [`ListenerPair`] (pairs nest).

/// Receives messages for the topic filters it was registered with.
///
/// Listeners are shared with the event loop, hence the `Sync` bound. State
/// that changes on delivery belongs behind a blocking mutex or an atomic.
///
/// # Example
///
/// ```ignore
/// struct Logger;
///
/// impl SubscribeListener for Logger {
///     fn on_message(&self, topic: &str, payload: &[u8]) {
///         log::info!("{} -> {} bytes", topic, payload.len());
///     }
/// }
/// ```
pub trait SubscribeListener: Sync {
    /// Handle one inbound message.
    ///
    /// Runs inline on the event loop. It must return quickly and must not
    /// wait on the client; hand longer work to another task.
    fn on_message(&self, topic: &str, payload: &[u8]);
}

/// A listener that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopListener;

impl SubscribeListener for NoopListener {
    fn on_message(&self, _topic: &str, _payload: &[u8]) {}
}

/// Delivers every message to two listeners, `first` before `second`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListenerPair<A, B> {
    pub first: A,
    pub second: B,
}

impl<A, B> ListenerPair<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

impl<A, B> SubscribeListener for ListenerPair<A, B>
where
    A: SubscribeListener,
    B: SubscribeListener,
{
    fn on_message(&self, topic: &str, payload: &[u8]) {
        self.first.on_message(topic, payload);
        self.second.on_message(topic, payload);
    }
}

/// Adapts a plain closure into a listener.
pub struct FnListener<F>(pub F);

impl<F> SubscribeListener for FnListener<F>
where
    F: Fn(&str, &[u8]) + Sync,
{
    fn on_message(&self, topic: &str, payload: &[u8]) {
        (self.0)(topic, payload)
    }
}

impl<L: SubscribeListener + ?Sized> SubscribeListener for &L {
    fn on_message(&self, topic: &str, payload: &[u8]) {
        (**self).on_message(topic, payload)
    }
}
