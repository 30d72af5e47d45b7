mod common;

use embassy_futures::block_on;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::Duration;
use myrtio_uplink::runtime::Iteration;
use myrtio_uplink::{IotClient, LoopTiming, QoS};

use common::{FakeSession, go_online};

const PRODUCERS: usize = 10;
const PER_PRODUCER: u16 = 100;

type BulkClient = IotClient<'static, CriticalSectionRawMutex, FakeSession, 1000, 16>;

fn patient() -> LoopTiming {
    LoopTiming::new().with_lock_wait(Duration::from_secs(5))
}

#[test]
fn concurrent_producers_lose_and_duplicate_nothing() {
    let session = FakeSession::new();
    let client = BulkClient::with_timing(session.clone(), patient());

    std::thread::scope(|scope| {
        for producer in 0..PRODUCERS {
            let client = &client;
            scope.spawn(move || {
                let topic = format!("producer/{producer}");
                block_on(async {
                    for seq in 0..PER_PRODUCER {
                        client
                            .publish(&topic, QoS::AtMostOnce, &seq.to_be_bytes())
                            .await
                            .unwrap();
                    }
                });
            });
        }
    });

    block_on(async {
        assert_eq!(client.pending().await, Ok(PRODUCERS * PER_PRODUCER as usize));
        assert_eq!(client.is_publishing().await, Ok(false));

        go_online(&client).await;
        client.start_publish().await.unwrap();
        assert_eq!(client.event_loop().iterate().await, Iteration::Continue);
        assert_eq!(client.pending().await, Ok(0));
    });

    let published = session.published();
    assert_eq!(published.len(), PRODUCERS * PER_PRODUCER as usize);
    for producer in 0..PRODUCERS {
        let topic = format!("producer/{producer}");
        let sequence: Vec<u16> = published
            .iter()
            .filter(|p| p.topic == topic)
            .map(|p| u16::from_be_bytes([p.payload[0], p.payload[1]]))
            .collect();
        assert_eq!(sequence, (0..PER_PRODUCER).collect::<Vec<_>>());
    }
    assert_eq!(client.stats().delivered, 1000);
}

#[cfg(feature = "std")]
#[test]
fn spawned_worker_drives_the_client() {
    use std::sync::Arc;

    let session = FakeSession::new();
    let client: Arc<IotClient<'static, CriticalSectionRawMutex, FakeSession, 16, 64>> =
        Arc::new(IotClient::with_timing(
            session.clone(),
            LoopTiming::new().with_iteration_delay(Duration::from_millis(2)),
        ));
    client.spawn_event_loop("uplink-worker").unwrap();

    block_on(async {
        go_online(&client).await;
        client.start_publish().await.unwrap();
        client
            .publish("esp32/pub/url", QoS::AtMostOnce, b"from a host thread")
            .await
            .unwrap();
        assert!(common::eventually(|| session.published().len() == 1).await);
    });
}
