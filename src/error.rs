//! # Error Types
//!
//! Errors reported by the uplink: lifecycle misuse, session failures coming
//! back from the broker client, and the soft failures of the lock-guarded
//! structures shared between producers and the event loop.

/// A bounded-wait lock could not be acquired in time.
///
/// Callers should treat this as transient: the operation was simply not
/// performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LockTimeout;

/// Errors returned by a [`Session`](crate::session::Session) implementation.
///
/// It is generic over the backend error type `E`, allowing it to wrap the
/// specific errors of the underlying broker client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionError<E> {
    /// The broker did not answer a request within the command timeout.
    RequestTimeout,
    /// The network link is down and no reconnect is in progress.
    Disconnected,
    /// Any other failure reported by the broker client.
    Backend(E),
}

impl<E> From<E> for SessionError<E> {
    fn from(err: E) -> Self {
        SessionError::Backend(err)
    }
}

/// Errors returned by the lifecycle operations of
/// [`IotClient`](crate::client::IotClient).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClientError<E> {
    /// `initialize` was called twice.
    AlreadyInitialized,
    /// The operation requires a successful `initialize` first.
    NotInitialized,
    /// `connect` was called while already connected.
    AlreadyConnected,
    /// The operation requires an established connection.
    NotConnected,
    /// The broker host name does not fit the host buffer.
    HostTooLong,
    /// A topic filter does not fit the topic buffer.
    TopicTooLong,
    /// No free slot is left in the listener registry.
    RegistryFull,
    /// A bounded-wait lock could not be acquired in time.
    LockTimeout,
    /// The session rejected the request.
    Session(SessionError<E>),
}

impl<E> From<SessionError<E>> for ClientError<E> {
    fn from(err: SessionError<E>) -> Self {
        ClientError::Session(err)
    }
}

impl<E> From<LockTimeout> for ClientError<E> {
    fn from(_: LockTimeout) -> Self {
        ClientError::LockTimeout
    }
}

/// Reasons a message could not be put on the outbound queue.
///
/// A successful enqueue says nothing about delivery, which happens later on
/// the event loop and is best effort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PublishError {
    /// The topic does not fit the topic buffer.
    TopicTooLong,
    /// The payload does not fit the payload buffer.
    PayloadTooLarge,
    /// The outbound queue is at capacity.
    QueueFull,
    /// The queue lock could not be acquired in time.
    LockTimeout,
}

impl From<LockTimeout> for PublishError {
    fn from(_: LockTimeout) -> Self {
        PublishError::LockTimeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_errors_convert_into_session_errors() {
        let err: SessionError<u8> = 7.into();
        assert_eq!(err, SessionError::Backend(7));
    }

    #[test]
    fn lock_timeouts_keep_their_meaning_across_layers() {
        let client: ClientError<()> = LockTimeout.into();
        assert_eq!(client, ClientError::LockTimeout);
        assert_eq!(PublishError::from(LockTimeout), PublishError::LockTimeout);
    }
}
