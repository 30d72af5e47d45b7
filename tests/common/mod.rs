#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::{Duration, Timer};
use myrtio_uplink::{
    ConnectParams, Credentials, InboundSink, InitParams, IotClient, LinkStatus, QoS, Session,
    SessionError, SessionResult,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FakeError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub topic: String,
    pub payload: Vec<u8>,
    pub qos: QoS,
}

#[derive(Default)]
pub struct FakeState {
    pub host: Option<String>,
    pub client_id: Option<String>,
    pub connected: bool,
    pub auto_reconnect: bool,
    pub subscribed: Vec<(String, QoS)>,
    pub published: Vec<Published>,
    pub inbound: VecDeque<(String, Vec<u8>)>,
    pub yield_results: VecDeque<SessionResult<LinkStatus, FakeError>>,
    pub publish_results: VecDeque<SessionResult<(), FakeError>>,
    pub yield_calls: usize,
    pub manual_reconnects: usize,
    pub fail_subscribe: bool,
    pub disconnect_delay: Option<Duration>,
}

/// Broker session double. Clones share the same recorded state.
#[derive(Clone, Default)]
pub struct FakeSession {
    state: Arc<Mutex<FakeState>>,
}

impl FakeSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn push_inbound(&self, topic: &str, payload: &[u8]) {
        self.state()
            .inbound
            .push_back((topic.into(), payload.to_vec()));
    }

    pub fn published(&self) -> Vec<Published> {
        self.state().published.clone()
    }
}

impl Session for FakeSession {
    type Error = FakeError;

    async fn init(&mut self, params: &InitParams<'_>) -> SessionResult<(), FakeError> {
        self.state().host = Some(params.host.into());
        Ok(())
    }

    async fn connect(&mut self, params: &ConnectParams<'_>) -> SessionResult<(), FakeError> {
        let mut state = self.state();
        state.client_id = Some(params.client_id.into());
        state.connected = true;
        Ok(())
    }

    async fn set_auto_reconnect(&mut self, enabled: bool) -> SessionResult<(), FakeError> {
        self.state().auto_reconnect = enabled;
        Ok(())
    }

    fn auto_reconnect_enabled(&self) -> bool {
        self.state().auto_reconnect
    }

    async fn attempt_reconnect(&mut self) -> SessionResult<LinkStatus, FakeError> {
        let mut state = self.state();
        state.manual_reconnects += 1;
        state.connected = true;
        Ok(LinkStatus::Reconnected)
    }

    async fn disconnect(&mut self) -> SessionResult<(), FakeError> {
        let delay = self.state().disconnect_delay;
        if let Some(delay) = delay {
            Timer::after(delay).await;
        }
        self.state().connected = false;
        Ok(())
    }

    async fn subscribe(&mut self, topic: &str, qos: QoS) -> SessionResult<(), FakeError> {
        let mut state = self.state();
        if state.fail_subscribe {
            return Err(SessionError::Backend(FakeError));
        }
        state.subscribed.push((topic.into(), qos));
        Ok(())
    }

    async fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
    ) -> SessionResult<(), FakeError> {
        let mut state = self.state();
        state.published.push(Published {
            topic: topic.into(),
            payload: payload.to_vec(),
            qos,
        });
        state.publish_results.pop_front().unwrap_or(Ok(()))
    }

    async fn yield_for(
        &mut self,
        _timeout: Duration,
        inbound: &dyn InboundSink,
    ) -> SessionResult<LinkStatus, FakeError> {
        let (messages, result) = {
            let mut state = self.state();
            state.yield_calls += 1;
            let messages: Vec<_> = state.inbound.drain(..).collect();
            let result = if state.connected {
                state.yield_results.pop_front().unwrap_or(Ok(LinkStatus::Ready))
            } else {
                Err(SessionError::Disconnected)
            };
            (messages, result)
        };

        for (topic, payload) in messages {
            inbound.deliver(&topic, &payload);
        }

        Timer::after(Duration::from_millis(1)).await;
        result
    }
}

/// Initialize and connect `client` against a local broker name.
pub async fn go_online<M: RawMutex, const Q: usize, const P: usize>(
    client: &IotClient<'_, M, FakeSession, Q, P>,
) {
    client
        .initialize(&InitParams::new("broker.local", 8883, Credentials::default()))
        .await
        .unwrap();
    client.connect(&ConnectParams::new("abc")).await.unwrap();
}

/// Poll `condition` every few milliseconds for up to two seconds.
pub async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..400 {
        if condition() {
            return true;
        }
        Timer::after(Duration::from_millis(5)).await;
    }
    condition()
}
