//! End-to-end scenarios over the in-process bus: full publisher → transport →
//! subscriber → dispatch paths, including hooks, fan-out and failure modes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::sync::Mutex;
use tokio::time::{sleep, timeout};

use omnibus::{
    local_client, Client, ClientError, Event, GlobMatcher, HandlerError, HandlerFn, Int64Payload,
    LocalBus, LocalPublishTransport, LocalSubscribeTransport, MultiClient, PayloadCodec,
    PayloadRegistry, PublishHooks, Publisher, SubscribeHooks, Subscriber, Utf8Payload,
};

async fn recv_one(rx: &mut broadcast::Receiver<(String, Event)>) -> (String, Event) {
    timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("timed out waiting for an event")
        .expect("tap closed")
}

async fn wait_until(check: impl Fn() -> bool) {
    timeout(Duration::from_secs(1), async {
        while !check() {
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

fn counting(hits: &Arc<AtomicUsize>, name: &'static str) -> omnibus::HandlerRef {
    let hits = Arc::clone(hits);
    HandlerFn::arc(name, move |_topic: String, _event: Event| {
        let hits = Arc::clone(&hits);
        async move {
            hits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    })
}

#[tokio::test]
async fn publish_without_subscribers_still_returns_the_event() {
    let bus = LocalBus::default();
    let client = local_client(&bus, PayloadRegistry::shared());
    client.connect().await.unwrap();

    let event = client
        .publish("void", Some(Utf8Payload::from("nobody listens").into_payload()))
        .await
        .unwrap();

    assert!(!event.identifier().is_empty());
    assert_eq!(event.publisher(), client.publisher().identifier());
    assert!(event.payload_as::<Utf8Payload>().is_some());
}

#[tokio::test]
async fn two_subscribers_both_receive_and_tap_one_entry_each() {
    let bus = LocalBus::default();
    let registry = PayloadRegistry::shared();

    let hits_a = Arc::new(AtomicUsize::new(0));
    let hits_b = Arc::new(AtomicUsize::new(0));

    let sub_a = Subscriber::new(LocalSubscribeTransport::new(&bus), Arc::clone(&registry));
    let sub_b = Subscriber::new(LocalSubscribeTransport::new(&bus), Arc::clone(&registry));
    sub_a.connect().await.unwrap();
    sub_b.connect().await.unwrap();

    let mut tap_a = sub_a.inbound_events();
    let mut tap_b = sub_b.inbound_events();

    sub_a
        .subscribe("alerts", Some(counting(&hits_a, "a")))
        .await
        .unwrap();
    sub_b
        .subscribe("alerts", Some(counting(&hits_b, "b")))
        .await
        .unwrap();

    let publisher = Publisher::new(LocalPublishTransport::new(&bus), registry);
    publisher.connect().await.unwrap();
    let published = publisher
        .publish("alerts", Some(Int64Payload(7).into_payload()))
        .await
        .unwrap();

    let (topic_a, event_a) = recv_one(&mut tap_a).await;
    let (topic_b, event_b) = recv_one(&mut tap_b).await;
    assert_eq!(topic_a, "alerts");
    assert_eq!(topic_b, "alerts");
    assert_eq!(event_a, published);
    assert_eq!(event_b, published);
    assert_eq!(event_a.payload_as::<Int64Payload>(), Some(&Int64Payload(7)));

    wait_until(|| hits_a.load(Ordering::SeqCst) == 1).await;
    wait_until(|| hits_b.load(Ordering::SeqCst) == 1).await;
}

#[tokio::test]
async fn unmatched_dispatch_surfaces_on_the_unhandled_tap() {
    let bus = LocalBus::default();
    let registry = PayloadRegistry::shared();

    // Exact matching in the dispatcher (the default), glob forwarding at the
    // transport: "orders.*" lets "orders.new" through the wire but matches no
    // binding.
    let subscriber = Subscriber::new(LocalSubscribeTransport::new(&bus), Arc::clone(&registry));
    subscriber.connect().await.unwrap();
    let mut unhandled = subscriber.unhandled_events();
    subscriber.subscribe("orders.*", None).await.unwrap();

    let publisher = Publisher::new(LocalPublishTransport::new(&bus), registry);
    publisher.connect().await.unwrap();
    publisher.publish("orders.new", None).await.unwrap();

    let (topic, event) = recv_one(&mut unhandled).await;
    assert_eq!(topic, "orders.new");
    assert!(event.is_signal());
}

#[tokio::test]
async fn unsubscribe_stops_delivery() {
    let bus = LocalBus::default();
    let registry = PayloadRegistry::shared();
    let hits = Arc::new(AtomicUsize::new(0));

    let subscriber = Subscriber::new(LocalSubscribeTransport::new(&bus), Arc::clone(&registry));
    subscriber.connect().await.unwrap();
    subscriber
        .subscribe("alerts", Some(counting(&hits, "h")))
        .await
        .unwrap();
    assert_eq!(subscriber.subscription_count().await, 1);

    let publisher = Publisher::new(LocalPublishTransport::new(&bus), registry);
    publisher.connect().await.unwrap();
    publisher.publish("alerts", None).await.unwrap();
    wait_until(|| hits.load(Ordering::SeqCst) == 1).await;

    subscriber.unsubscribe(Some("alerts")).await.unwrap();
    assert_eq!(subscriber.subscription_count().await, 0);

    publisher.publish("alerts", None).await.unwrap();
    sleep(Duration::from_millis(50)).await;
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    // Unsubscribing an unknown topic stays a no-op.
    subscriber.unsubscribe(Some("alerts")).await.unwrap();
}

#[tokio::test]
async fn handler_required_vetoes_handlerless_subscriptions() {
    let bus = LocalBus::default();
    let registry = PayloadRegistry::shared();

    let strict = Subscriber::builder(LocalSubscribeTransport::new(&bus), Arc::clone(&registry))
        .handler_required(true)
        .build();
    strict.connect().await.unwrap();

    let err = strict.subscribe("alerts", None).await.unwrap_err();
    assert!(matches!(err, ClientError::HandlerNotFound { topic } if topic == "alerts"));
    assert_eq!(strict.subscription_count().await, 0);

    // A fallback satisfies the requirement.
    let hits = Arc::new(AtomicUsize::new(0));
    let with_fallback = Subscriber::builder(LocalSubscribeTransport::new(&bus), registry)
        .handler_required(true)
        .fallback(counting(&hits, "fallback"))
        .build();
    with_fallback.connect().await.unwrap();
    with_fallback.subscribe("alerts", None).await.unwrap();
    assert_eq!(with_fallback.subscription_count().await, 1);
}

#[tokio::test]
async fn failing_handler_does_not_stop_overlapping_siblings() {
    let bus = LocalBus::default();
    let registry = PayloadRegistry::shared();
    let hits = Arc::new(AtomicUsize::new(0));

    let subscriber = Subscriber::builder(LocalSubscribeTransport::new(&bus), Arc::clone(&registry))
        .matcher(Arc::new(GlobMatcher))
        .build();
    subscriber.connect().await.unwrap();
    subscriber
        .subscribe(
            "orders.*",
            Some(HandlerFn::arc("boom", |_t: String, _e: Event| async {
                Err(HandlerError::new("boom"))
            })),
        )
        .await
        .unwrap();
    subscriber
        .subscribe("orders.new", Some(counting(&hits, "ok")))
        .await
        .unwrap();

    let publisher = Publisher::new(LocalPublishTransport::new(&bus), registry);
    publisher.connect().await.unwrap();
    publisher.publish("orders.new", None).await.unwrap();

    // The failure is logged and isolated; the sibling still runs and the
    // receive loop survives for the next event.
    wait_until(|| hits.load(Ordering::SeqCst) == 1).await;
    publisher.publish("orders.new", None).await.unwrap();
    wait_until(|| hits.load(Ordering::SeqCst) == 2).await;
}

struct RecordingPublishHooks {
    log: Arc<Mutex<Vec<&'static str>>>,
    veto: bool,
}

#[async_trait]
impl PublishHooks for RecordingPublishHooks {
    async fn on_publishing(&self, _topic: &str, _event: &Event) -> Result<(), ClientError> {
        self.log.lock().await.push("publishing");
        if self.veto {
            return Err(ClientError::Fanout {
                reason: "vetoed".into(),
            });
        }
        Ok(())
    }

    async fn on_published(&self, _topic: &str, _event: &Event) -> Result<(), ClientError> {
        self.log.lock().await.push("published");
        Ok(())
    }
}

struct RecordingSubscribeHooks {
    log: Arc<Mutex<Vec<&'static str>>>,
}

#[async_trait]
impl SubscribeHooks for RecordingSubscribeHooks {
    async fn on_subscribing(&self, _topic: &str) -> Result<(), ClientError> {
        self.log.lock().await.push("subscribing");
        Ok(())
    }

    async fn on_subscribed(&self, _topic: &str) -> Result<(), ClientError> {
        self.log.lock().await.push("subscribed");
        Ok(())
    }

    async fn on_unsubscribing(&self, _topic: Option<&str>) -> Result<(), ClientError> {
        self.log.lock().await.push("unsubscribing");
        Ok(())
    }

    async fn on_unsubscribed(&self, _topic: Option<&str>) -> Result<(), ClientError> {
        self.log.lock().await.push("unsubscribed");
        Ok(())
    }
}

#[tokio::test]
async fn hooks_run_in_order_around_the_transport_actions() {
    let bus = LocalBus::default();
    let registry = PayloadRegistry::shared();
    let pub_log = Arc::new(Mutex::new(Vec::new()));
    let sub_log = Arc::new(Mutex::new(Vec::new()));

    let publisher = Publisher::builder(LocalPublishTransport::new(&bus), Arc::clone(&registry))
        .hooks(Arc::new(RecordingPublishHooks {
            log: Arc::clone(&pub_log),
            veto: false,
        }))
        .build();
    let subscriber = Subscriber::builder(LocalSubscribeTransport::new(&bus), registry)
        .hooks(Arc::new(RecordingSubscribeHooks {
            log: Arc::clone(&sub_log),
        }))
        .build();

    publisher.connect().await.unwrap();
    subscriber.connect().await.unwrap();

    subscriber.subscribe("alerts", None).await.unwrap();
    subscriber.unsubscribe(Some("alerts")).await.unwrap();
    assert_eq!(
        *sub_log.lock().await,
        vec!["subscribing", "subscribed", "unsubscribing", "unsubscribed"]
    );

    publisher.publish("alerts", None).await.unwrap();
    assert_eq!(*pub_log.lock().await, vec!["publishing", "published"]);
}

#[tokio::test]
async fn failing_before_hook_skips_the_send() {
    let bus = LocalBus::default();
    let registry = PayloadRegistry::shared();
    let log = Arc::new(Mutex::new(Vec::new()));

    let subscriber = Subscriber::new(LocalSubscribeTransport::new(&bus), Arc::clone(&registry));
    subscriber.connect().await.unwrap();
    let mut inbound = subscriber.inbound_events();
    subscriber.subscribe("alerts", None).await.unwrap();

    let publisher = Publisher::builder(LocalPublishTransport::new(&bus), registry)
        .hooks(Arc::new(RecordingPublishHooks {
            log: Arc::clone(&log),
            veto: true,
        }))
        .build();
    publisher.connect().await.unwrap();

    assert!(publisher.publish("alerts", None).await.is_err());
    assert_eq!(*log.lock().await, vec!["publishing"]);

    sleep(Duration::from_millis(50)).await;
    assert!(matches!(
        inbound.try_recv(),
        Err(broadcast::error::TryRecvError::Empty)
    ));
}

struct TopicVetoPublishHooks {
    veto_topic: &'static str,
}

#[async_trait]
impl PublishHooks for TopicVetoPublishHooks {
    async fn on_publishing(&self, topic: &str, _event: &Event) -> Result<(), ClientError> {
        if topic == self.veto_topic {
            return Err(ClientError::Fanout {
                reason: format!("vetoed {topic}"),
            });
        }
        Ok(())
    }
}

struct TopicVetoSubscribeHooks {
    veto_topic: &'static str,
}

#[async_trait]
impl SubscribeHooks for TopicVetoSubscribeHooks {
    async fn on_subscribing(&self, topic: &str) -> Result<(), ClientError> {
        if topic == self.veto_topic {
            return Err(ClientError::Fanout {
                reason: format!("vetoed {topic}"),
            });
        }
        Ok(())
    }
}

#[tokio::test]
async fn multi_subscribe_parallel_binds_every_topic() {
    let bus = LocalBus::default();
    let registry = PayloadRegistry::shared();
    let hits = Arc::new(AtomicUsize::new(0));

    let subscriber = Subscriber::new(LocalSubscribeTransport::new(&bus), Arc::clone(&registry));
    subscriber.connect().await.unwrap();
    subscriber
        .multi_subscribe(&["a", "b", "c"], Some(counting(&hits, "h")), true)
        .await
        .unwrap();
    assert_eq!(subscriber.subscription_count().await, 3);

    let publisher = Publisher::new(LocalPublishTransport::new(&bus), registry);
    publisher.connect().await.unwrap();
    for topic in ["a", "b", "c"] {
        publisher.publish(topic, None).await.unwrap();
    }
    wait_until(|| hits.load(Ordering::SeqCst) == 3).await;
}

#[tokio::test]
async fn multi_subscribe_sequential_stops_at_first_failure() {
    let bus = LocalBus::default();
    let registry = PayloadRegistry::shared();
    let hits = Arc::new(AtomicUsize::new(0));

    let subscriber = Subscriber::builder(LocalSubscribeTransport::new(&bus), registry)
        .hooks(Arc::new(TopicVetoSubscribeHooks { veto_topic: "b" }))
        .build();
    subscriber.connect().await.unwrap();

    let err = subscriber
        .multi_subscribe(&["a", "b", "c"], Some(counting(&hits, "h")), false)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Fanout { .. }));

    // "a" was bound before the failure; "c" was never attempted.
    assert_eq!(subscriber.subscription_count().await, 1);
}

#[tokio::test]
async fn multi_unsubscribe_removes_topics_in_both_modes() {
    let bus = LocalBus::default();
    let registry = PayloadRegistry::shared();
    let hits = Arc::new(AtomicUsize::new(0));

    let subscriber = Subscriber::new(LocalSubscribeTransport::new(&bus), registry);
    subscriber.connect().await.unwrap();
    subscriber
        .multi_subscribe(&["a", "b", "c"], Some(counting(&hits, "h")), false)
        .await
        .unwrap();
    assert_eq!(subscriber.subscription_count().await, 3);

    subscriber.multi_unsubscribe(&["a", "b"], true).await.unwrap();
    assert_eq!(subscriber.subscription_count().await, 1);

    subscriber.multi_unsubscribe(&["c"], false).await.unwrap();
    assert_eq!(subscriber.subscription_count().await, 0);
}

#[tokio::test]
async fn multi_publish_sequential_stops_at_first_failure() {
    let bus = LocalBus::default();
    let registry = PayloadRegistry::shared();
    let hits = Arc::new(AtomicUsize::new(0));

    let subscriber = Subscriber::builder(LocalSubscribeTransport::new(&bus), Arc::clone(&registry))
        .matcher(Arc::new(GlobMatcher))
        .build();
    subscriber.connect().await.unwrap();
    subscriber
        .subscribe("fan.*", Some(counting(&hits, "fan")))
        .await
        .unwrap();

    let publisher = Publisher::builder(LocalPublishTransport::new(&bus), registry)
        .hooks(Arc::new(TopicVetoPublishHooks {
            veto_topic: "fan.b",
        }))
        .build();
    publisher.connect().await.unwrap();

    let err = publisher
        .multi_publish(&["fan.a", "fan.b", "fan.c"], None, false)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Fanout { .. }));

    // Only "fan.a" was sent; "fan.c" was never attempted.
    wait_until(|| hits.load(Ordering::SeqCst) == 1).await;
    sleep(Duration::from_millis(50)).await;
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn multi_publish_parallel_fails_fast_without_canceling_siblings() {
    let bus = LocalBus::default();
    let registry = PayloadRegistry::shared();
    let hits = Arc::new(AtomicUsize::new(0));

    let subscriber = Subscriber::builder(LocalSubscribeTransport::new(&bus), Arc::clone(&registry))
        .matcher(Arc::new(GlobMatcher))
        .build();
    subscriber.connect().await.unwrap();
    subscriber
        .subscribe("fan.*", Some(counting(&hits, "fan")))
        .await
        .unwrap();

    let publisher = Publisher::builder(LocalPublishTransport::new(&bus), registry)
        .hooks(Arc::new(TopicVetoPublishHooks {
            veto_topic: "fan.b",
        }))
        .build();
    publisher.connect().await.unwrap();

    let err = publisher
        .multi_publish(&["fan.a", "fan.b", "fan.c"], None, true)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Fanout { .. }));

    // The sibling sends were not canceled by the early error return.
    wait_until(|| hits.load(Ordering::SeqCst) == 2).await;
}

#[tokio::test]
async fn multi_client_fans_publish_out_over_every_member() {
    let bus_a = LocalBus::default();
    let bus_b = LocalBus::default();
    let hits = Arc::new(AtomicUsize::new(0));

    let client_a = local_client(&bus_a, PayloadRegistry::shared());
    let client_b = local_client(&bus_b, PayloadRegistry::shared());

    let multi = MultiClient::new(vec![
        Arc::new(client_a) as Arc<dyn Client>,
        Arc::new(client_b) as Arc<dyn Client>,
    ]);
    assert_eq!(multi.len(), 2);

    multi.connect().await.unwrap();
    multi
        .subscribe("alerts", Some(counting(&hits, "h")))
        .await
        .unwrap();

    // One aggregate publish: each member publishes on its own bus, so each
    // subscriber sees exactly one event.
    multi.publish("alerts", None).await.unwrap();
    wait_until(|| hits.load(Ordering::SeqCst) == 2).await;
    sleep(Duration::from_millis(50)).await;
    assert_eq!(hits.load(Ordering::SeqCst), 2);

    multi.disconnect().await.unwrap();
}

#[tokio::test]
async fn multi_client_fails_the_aggregate_when_a_member_fails() {
    let bus = LocalBus::default();

    let connected = local_client(&bus, PayloadRegistry::shared());
    connected.connect().await.unwrap();
    let disconnected = local_client(&bus, PayloadRegistry::shared());

    let multi = MultiClient::new(vec![
        Arc::new(connected) as Arc<dyn Client>,
        Arc::new(disconnected) as Arc<dyn Client>,
    ]);

    let err = multi.publish("alerts", None).await.unwrap_err();
    assert!(matches!(err, ClientError::NotConnected { .. }));
}

#[tokio::test]
async fn multi_publish_returns_events_in_topic_order() {
    let bus = LocalBus::default();
    let registry = PayloadRegistry::shared();
    let hits = Arc::new(AtomicUsize::new(0));

    let subscriber = Subscriber::builder(LocalSubscribeTransport::new(&bus), Arc::clone(&registry))
        .matcher(Arc::new(GlobMatcher))
        .build();
    subscriber.connect().await.unwrap();
    subscriber
        .subscribe("fan.*", Some(counting(&hits, "fan")))
        .await
        .unwrap();

    let publisher = Publisher::new(LocalPublishTransport::new(&bus), registry);
    publisher.connect().await.unwrap();

    for parallelize in [false, true] {
        hits.store(0, Ordering::SeqCst);
        let events = publisher
            .multi_publish(
                &["fan.a", "fan.b", "fan.c"],
                Some(Utf8Payload::from("x").into_payload()),
                parallelize,
            )
            .await
            .unwrap();
        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|e| e.publisher() == publisher.identifier()));
        wait_until(|| hits.load(Ordering::SeqCst) == 3).await;
    }
}

#[tokio::test]
async fn operations_require_a_connection() {
    let bus = LocalBus::default();
    let registry = PayloadRegistry::shared();

    let publisher = Publisher::new(LocalPublishTransport::new(&bus), Arc::clone(&registry));
    let err = publisher.publish("alerts", None).await.unwrap_err();
    assert!(matches!(err, ClientError::NotConnected { .. }));
    assert_eq!(err.as_label(), "client_not_connected");

    let subscriber = Subscriber::new(LocalSubscribeTransport::new(&bus), registry);
    assert!(subscriber.subscribe("alerts", None).await.is_err());
    assert!(subscriber.unsubscribe(None).await.is_err());

    // Disconnect on a never-connected client is an idempotent no-op.
    publisher.disconnect().await.unwrap();
}

#[tokio::test]
async fn undecodable_envelopes_are_skipped_without_killing_the_loop() {
    let bus = LocalBus::default();

    // Separate registries: the subscriber has never seen the publisher's
    // payload type, so decoding fails for the first event.
    let publisher = Publisher::new(LocalPublishTransport::new(&bus), PayloadRegistry::shared());
    let subscriber = Subscriber::new(LocalSubscribeTransport::new(&bus), PayloadRegistry::shared());

    publisher.connect().await.unwrap();
    subscriber.connect().await.unwrap();
    let mut inbound = subscriber.inbound_events();
    subscriber.subscribe("alerts", None).await.unwrap();

    publisher
        .publish("alerts", Some(Int64Payload(1).into_payload()))
        .await
        .unwrap();
    let signal = publisher.publish("alerts", None).await.unwrap();

    // Only the decodable signal event surfaces; the loop kept running.
    let (_, event) = recv_one(&mut inbound).await;
    assert_eq!(event, signal);
}

#[tokio::test]
async fn combined_client_round_trips_typed_payloads() {
    let bus = LocalBus::default();
    let registry = PayloadRegistry::shared();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let client = local_client(&bus, registry);
    client.connect().await.unwrap();

    let sink = Arc::clone(&seen);
    client
        .subscribe(
            "greetings",
            Some(HandlerFn::arc("collect", move |_t: String, event: Event| {
                let sink = Arc::clone(&sink);
                async move {
                    if let Some(text) = event.payload_as::<Utf8Payload>() {
                        sink.lock().await.push(text.0.clone());
                    }
                    Ok(())
                }
            })),
        )
        .await
        .unwrap();

    client
        .publish("greetings", Some(Utf8Payload::from("hello").into_payload()))
        .await
        .unwrap();

    timeout(Duration::from_secs(1), async {
        loop {
            if seen.lock().await.as_slice() == ["hello"] {
                break;
            }
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("payload never arrived");

    client.disconnect().await.unwrap();
}
