//! Bring-up sequence and the device announce message.

use core::fmt::Write;

use embassy_sync::blocking_mutex::raw::RawMutex;
use heapless::String;

use super::DeviceConfig;
use crate::client::IotClient;
use crate::error::{ClientError, LockTimeout, PublishError};
use crate::options::{Credentials, SubscribeParams};
use crate::runtime::SubscribeListener;
use crate::session::Session;

/// Capacity of the announce payload.
pub const MAX_ANNOUNCE_LEN: usize = 160;

/// The bring-up stage that failed, with its error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BringUpError<E> {
    Initialize(ClientError<E>),
    Connect(ClientError<E>),
    Subscribe(ClientError<E>),
    Start(LockTimeout),
}

/// Initialize, connect, subscribe `listener` to the command topic and start
/// publishing.
///
/// The event loop itself must already be running or be started by the
/// caller; this only raises the run flag.
pub async fn bring_up<'a, M, S, const QUEUE_DEPTH: usize, const PAYLOAD_SIZE: usize>(
    client: &IotClient<'a, M, S, QUEUE_DEPTH, PAYLOAD_SIZE>,
    config: &DeviceConfig<'_>,
    credentials: Credentials<'_>,
    listener: &'a dyn SubscribeListener,
) -> Result<(), BringUpError<S::Error>>
where
    M: RawMutex,
    S: Session,
{
    client
        .initialize(&config.init_params(credentials))
        .await
        .map_err(BringUpError::Initialize)?;
    client
        .connect(&config.connect_params())
        .await
        .map_err(BringUpError::Connect)?;
    client
        .try_subscribe(SubscribeParams::new(
            config.subscribe_topic,
            config.qos,
            listener,
        ))
        .await
        .map_err(BringUpError::Subscribe)?;
    client.start_publish().await.map_err(BringUpError::Start)?;

    info!("uplink ready, listening on {}", config.subscribe_topic);
    Ok(())
}

/// Build the `{"id":"<client id>"}` announce document.
pub fn announce_payload(client_id: &str) -> Result<String<MAX_ANNOUNCE_LEN>, PublishError> {
    let mut out = String::new();
    write_announce(&mut out, client_id).map_err(|_| PublishError::PayloadTooLarge)?;
    Ok(out)
}

fn write_announce(out: &mut impl Write, client_id: &str) -> core::fmt::Result {
    out.write_str("{\"id\":\"")?;
    for c in client_id.chars() {
        match c {
            '"' => out.write_str("\\\"")?,
            '\\' => out.write_str("\\\\")?,
            '\n' => out.write_str("\\n")?,
            '\r' => out.write_str("\\r")?,
            '\t' => out.write_str("\\t")?,
            c if (c as u32) < 0x20 => write!(out, "\\u{:04x}", c as u32)?,
            c => out.write_char(c)?,
        }
    }
    out.write_str("\"}")
}

/// Queue the announce message on the device's publish topic.
pub async fn publish_announce<M, S, const QUEUE_DEPTH: usize, const PAYLOAD_SIZE: usize>(
    client: &IotClient<'_, M, S, QUEUE_DEPTH, PAYLOAD_SIZE>,
    config: &DeviceConfig<'_>,
) -> Result<(), PublishError>
where
    M: RawMutex,
    S: Session,
{
    let payload = announce_payload(config.client_id)?;
    client
        .publish(config.publish_topic, config.qos, payload.as_bytes())
        .await
}
