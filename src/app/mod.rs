//! # Device Application Glue
//!
//! Everything the camera firmware builds on top of [`IotClient`](crate::IotClient):
//! the device configuration, the bring-up sequence, the upload command
//! listener and the push button that triggers an announce.

mod bootstrap;
mod button;
mod url_listener;

pub use bootstrap::{BringUpError, MAX_ANNOUNCE_LEN, announce_payload, bring_up, publish_announce};
pub use button::ButtonTrigger;
pub use url_listener::{ImageUploader, MAX_URL_LEN, UploadRequest, UrlCommandListener};

use embassy_time::Duration;

use crate::message::QoS;
use crate::options::{ConnectParams, Credentials, InitParams};

/// Broker endpoint, identity and topics of one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceConfig<'a> {
    pub host: &'a str,
    pub port: u16,
    pub client_id: &'a str,
    pub command_timeout: Duration,
    pub tls_handshake_timeout: Duration,
    pub keep_alive_secs: u16,
    /// Topic the device receives upload commands on.
    pub subscribe_topic: &'a str,
    /// Topic the device announces itself on.
    pub publish_topic: &'a str,
    pub qos: QoS,
}

impl<'a> DeviceConfig<'a> {
    pub const DEFAULT_PORT: u16 = 8883;
    pub const DEFAULT_SUBSCRIBE_TOPIC: &'static str = "esp32/sub/url";
    pub const DEFAULT_PUBLISH_TOPIC: &'static str = "esp32/pub/url";

    pub fn new(host: &'a str, client_id: &'a str) -> Self {
        Self {
            host,
            port: Self::DEFAULT_PORT,
            client_id,
            command_timeout: InitParams::DEFAULT_COMMAND_TIMEOUT,
            tls_handshake_timeout: InitParams::DEFAULT_TLS_HANDSHAKE_TIMEOUT,
            keep_alive_secs: ConnectParams::DEFAULT_KEEP_ALIVE_SECS,
            subscribe_topic: Self::DEFAULT_SUBSCRIBE_TOPIC,
            publish_topic: Self::DEFAULT_PUBLISH_TOPIC,
            qos: QoS::AtMostOnce,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_topics(mut self, subscribe_topic: &'a str, publish_topic: &'a str) -> Self {
        self.subscribe_topic = subscribe_topic;
        self.publish_topic = publish_topic;
        self
    }

    pub fn init_params<'c>(&self, credentials: Credentials<'c>) -> InitParams<'c>
    where
        'a: 'c,
    {
        InitParams::new(self.host, self.port, credentials)
            .with_command_timeout(self.command_timeout)
            .with_tls_handshake_timeout(self.tls_handshake_timeout)
    }

    pub fn connect_params(&self) -> ConnectParams<'a> {
        ConnectParams::new(self.client_id).with_keep_alive(self.keep_alive_secs)
    }
}
