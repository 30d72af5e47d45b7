//! Uplink Runtime Module
//!
//! The pieces the event loop shares with the rest of the application.
//!
//! # Overview
//!
//! - [`OutboundQueue`]: bounded FIFO that producers push into and the worker
//!   drains
//! - [`RunControl`]: the flag that moves the worker between Idle and Active
//! - [`ListenerRegistry`]: topic filters mapped to [`SubscribeListener`]s
//! - [`EventLoop`]: the worker itself
//!
//! # Locking
//!
//! Every shared structure has its own lock and every async lock is taken with
//! a bounded wait. The worker holds the session lock while listeners run, so
//! the only nesting is session, then registry (or queue). Producers never
//! touch the session lock.

pub(crate) mod event_loop;
pub(crate) mod queue;
pub(crate) mod registry;
pub(crate) mod run_control;
pub(crate) mod stats;
pub(crate) mod traits;

pub use event_loop::{EventLoop, Iteration};
pub use queue::OutboundQueue;
pub use registry::{ListenerRegistry, MAX_SUBSCRIPTIONS, topic_matches};
pub use run_control::RunControl;
pub use stats::DeliveryStats;
pub use traits::{FnListener, ListenerPair, NoopListener, SubscribeListener};
