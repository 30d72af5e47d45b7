//! Listener registry and inbound dispatch.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::RawMutex;
use heapless::{String, Vec};

use super::stats::DeliveryCounters;
use super::traits::SubscribeListener;
use crate::error::ClientError;
use crate::message::{InboundMessage, MAX_TOPIC_LEN, QoS};
use crate::session::InboundSink;

/// Maximum number of subscriptions a client can hold.
pub const MAX_SUBSCRIPTIONS: usize = 8;

/// Reasons a listener could not be registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RegisterError {
    TopicTooLong,
    Full,
}

impl<E> From<RegisterError> for ClientError<E> {
    fn from(err: RegisterError) -> Self {
        match err {
            RegisterError::TopicTooLong => ClientError::TopicTooLong,
            RegisterError::Full => ClientError::RegistryFull,
        }
    }
}

struct Registration<'a> {
    filter: String<MAX_TOPIC_LEN>,
    qos: QoS,
    listener: &'a dyn SubscribeListener,
}

/// Topic filters and the listeners subscribed to them.
///
/// The lock is only held to read or change the table; listeners are always
/// invoked after it has been released, so a listener may query the registry
/// without deadlocking.
pub struct ListenerRegistry<'a, M: RawMutex> {
    entries: Mutex<M, RefCell<Vec<Registration<'a>, MAX_SUBSCRIPTIONS>>>,
}

impl<'a, M: RawMutex> ListenerRegistry<'a, M> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(RefCell::new(Vec::new())),
        }
    }

    pub(crate) fn register(
        &self,
        filter: &str,
        qos: QoS,
        listener: &'a dyn SubscribeListener,
    ) -> Result<(), RegisterError> {
        let mut owned = String::new();
        owned
            .push_str(filter)
            .map_err(|_| RegisterError::TopicTooLong)?;

        self.entries.lock(|entries| {
            entries
                .borrow_mut()
                .push(Registration {
                    filter: owned,
                    qos,
                    listener,
                })
                .map_err(|_| RegisterError::Full)
        })
    }

    /// Undo the most recent registration of `listener` on `filter`.
    pub(crate) fn remove(&self, filter: &str, listener: &'a dyn SubscribeListener) {
        self.entries.lock(|entries| {
            let mut entries = entries.borrow_mut();
            let position = entries.iter().rposition(|entry| {
                entry.filter == filter && core::ptr::addr_eq(entry.listener, listener)
            });
            if let Some(index) = position {
                entries.remove(index);
            }
        });
    }

    /// QoS of the first registration made on exactly `filter`.
    pub fn qos_for(&self, filter: &str) -> Option<QoS> {
        self.entries.lock(|entries| {
            entries
                .borrow()
                .iter()
                .find(|entry| entry.filter == filter)
                .map(|entry| entry.qos)
        })
    }

    pub fn len(&self) -> usize {
        self.entries.lock(|entries| entries.borrow().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Listeners whose filter matches `topic` with the QoS they were
    /// subscribed at, in registration order.
    fn matching(
        &self,
        topic: &str,
    ) -> Vec<(&'a dyn SubscribeListener, QoS), MAX_SUBSCRIPTIONS> {
        self.entries.lock(|entries| {
            entries
                .borrow()
                .iter()
                .filter(|entry| topic_matches(topic, &entry.filter))
                .map(|entry| (entry.listener, entry.qos))
                .collect()
        })
    }

    /// Call every listener that matches the message topic.
    ///
    /// Returns how many listeners were called.
    pub fn dispatch(&self, message: &InboundMessage) -> usize {
        let listeners = self.matching(message.topic());
        for (listener, qos) in &listeners {
            trace!("dispatching {} to a {:?} subscription", message.topic(), qos);
            listener.on_message(message.topic(), message.payload());
        }
        listeners.len()
    }
}

impl<M: RawMutex> Default for ListenerRegistry<'_, M> {
    fn default() -> Self {
        Self::new()
    }
}

/// Session-facing sink: copies each inbound message, then dispatches it.
pub(crate) struct Dispatch<'r, 'a, M: RawMutex> {
    pub(crate) registry: &'r ListenerRegistry<'a, M>,
    pub(crate) stats: &'r DeliveryCounters<M>,
}

impl<M: RawMutex> InboundSink for Dispatch<'_, '_, M> {
    fn deliver(&self, topic: &str, payload: &[u8]) {
        let Some(message) = InboundMessage::copy_from(topic, payload) else {
            warn!(
                "dropping inbound message on {} ({} bytes): too large",
                topic,
                payload.len()
            );
            return;
        };
        self.stats.bump(|s| &mut s.received);

        let handled = self.registry.dispatch(&message);
        if handled == 0 {
            debug!("no listener for {}", message.topic());
        } else {
            trace!("{} delivered to {} listener(s)", message.topic(), handled);
        }
    }
}

/// MQTT topic filter matching.
///
/// `+` matches exactly one level and `#` matches the remaining levels
/// (including none) when it is the last level of the filter. Wildcards in any
/// other position are compared literally.
pub fn topic_matches(topic: &str, filter: &str) -> bool {
    let mut levels = topic.split('/');
    let mut filter_levels = filter.split('/').peekable();

    while let Some(wanted) = filter_levels.next() {
        if wanted == "#" && filter_levels.peek().is_none() {
            return true;
        }
        match levels.next() {
            Some(level) if wanted == "+" || wanted == level => {}
            _ => return false,
        }
    }

    levels.next().is_none()
}

#[cfg(test)]
mod tests {
    extern crate std;

    use core::sync::atomic::{AtomicUsize, Ordering};

    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

    use super::*;
    use crate::runtime::traits::FnListener;

    type Registry<'a> = ListenerRegistry<'a, CriticalSectionRawMutex>;

    fn inbound(topic: &str, payload: &[u8]) -> InboundMessage {
        InboundMessage::copy_from(topic, payload).unwrap()
    }

    #[test]
    fn exact_filters() {
        assert!(topic_matches("esp32/sub/url", "esp32/sub/url"));
        assert!(!topic_matches("esp32/sub/url", "esp32/sub"));
        assert!(!topic_matches("esp32/sub", "esp32/sub/url"));
    }

    #[test]
    fn single_level_wildcard() {
        assert!(topic_matches("esp32/sub/url", "esp32/+/url"));
        assert!(topic_matches("esp32/sub/url", "+/+/+"));
        assert!(!topic_matches("esp32/sub/url/extra", "esp32/+/url"));
        assert!(!topic_matches("esp32", "esp32/+"));
        assert!(topic_matches("esp32/", "esp32/+"));
    }

    #[test]
    fn multi_level_wildcard() {
        assert!(topic_matches("esp32", "esp32/#"));
        assert!(topic_matches("esp32/sub/url", "esp32/#"));
        assert!(topic_matches("anything/at/all", "#"));
        assert!(!topic_matches("esp32/sub", "esp32/#/sub"));
        assert!(!topic_matches("cam/sub", "esp32/#"));
    }

    #[test]
    fn dispatch_reaches_matching_listeners_once_each() {
        let exact = AtomicUsize::new(0);
        let wildcard = AtomicUsize::new(0);
        let other = AtomicUsize::new(0);
        let exact_listener = FnListener(|_: &str, _: &[u8]| {
            exact.fetch_add(1, Ordering::Relaxed);
        });
        let wildcard_listener = FnListener(|_: &str, _: &[u8]| {
            wildcard.fetch_add(1, Ordering::Relaxed);
        });
        let other_listener = FnListener(|_: &str, _: &[u8]| {
            other.fetch_add(1, Ordering::Relaxed);
        });

        let registry = Registry::new();
        registry
            .register("esp32/sub/url", QoS::AtMostOnce, &exact_listener)
            .unwrap();
        registry
            .register("esp32/#", QoS::AtLeastOnce, &wildcard_listener)
            .unwrap();
        registry
            .register("cam/cmd", QoS::AtMostOnce, &other_listener)
            .unwrap();

        assert_eq!(registry.dispatch(&inbound("esp32/sub/url", b"x")), 2);
        assert_eq!(exact.load(Ordering::Relaxed), 1);
        assert_eq!(wildcard.load(Ordering::Relaxed), 1);
        assert_eq!(other.load(Ordering::Relaxed), 0);
        assert_eq!(registry.qos_for("esp32/#"), Some(QoS::AtLeastOnce));
    }

    #[test]
    fn registry_capacity_and_topic_bounds() {
        let listener = FnListener(|_: &str, _: &[u8]| {});
        let registry = Registry::new();
        for _ in 0..MAX_SUBSCRIPTIONS {
            registry.register("t", QoS::AtMostOnce, &listener).unwrap();
        }
        assert_eq!(
            registry.register("t", QoS::AtMostOnce, &listener),
            Err(RegisterError::Full)
        );

        let long_filter = "x".repeat(MAX_TOPIC_LEN + 1);
        let fresh = Registry::new();
        assert_eq!(
            fresh.register(&long_filter, QoS::AtMostOnce, &listener),
            Err(RegisterError::TopicTooLong)
        );
        assert!(fresh.is_empty());
    }

    #[test]
    fn remove_only_drops_the_matching_registration() {
        let a = FnListener(|_: &str, _: &[u8]| {});
        let b = FnListener(|_: &str, _: &[u8]| {});
        let registry = Registry::new();
        registry.register("t", QoS::AtMostOnce, &a).unwrap();
        registry.register("t", QoS::AtLeastOnce, &b).unwrap();

        registry.remove("t", &b);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.qos_for("t"), Some(QoS::AtMostOnce));

        registry.remove("t", &b);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn listener_sees_a_copy_not_the_source_buffer() {
        use std::sync::Mutex as StdMutex;
        use std::vec::Vec as StdVec;

        let seen = StdMutex::new(StdVec::new());
        let listener = FnListener(|_: &str, payload: &[u8]| {
            seen.lock().unwrap().extend_from_slice(payload);
        });
        let registry = Registry::new();
        registry
            .register("esp32/sub/url", QoS::AtMostOnce, &listener)
            .unwrap();
        let counters = DeliveryCounters::<CriticalSectionRawMutex>::new();
        let sink = Dispatch {
            registry: &registry,
            stats: &counters,
        };

        let mut buffer = *b"https://bucket/key";
        sink.deliver("esp32/sub/url", &buffer);
        buffer.fill(0);

        assert_eq!(seen.lock().unwrap().as_slice(), b"https://bucket/key");
        assert_eq!(counters.snapshot().received, 1);
    }
}
