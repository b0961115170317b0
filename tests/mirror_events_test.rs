use kodegen_tools_sitemirror::mirror_events::*;
use kodegen_tools_sitemirror::{DownloadOutcome, ResourceCategory};
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::timeout;

#[tokio::test]
async fn test_event_bus_creation() {
    let bus = MirrorEventBus::new(100);
    assert_eq!(bus.subscriber_count(), 0);
    assert!(!bus.has_subscribers());
    assert_eq!(bus.capacity(), 100);
}

#[tokio::test]
async fn test_publish_with_no_subscribers() {
    let bus = MirrorEventBus::new(10);
    let event = MirrorEvent::crawl_started(
        "https://example.com/docs".to_string(),
        "https://example.com".to_string(),
    );

    let result = bus.publish(event).await;
    match result {
        Err(EventBusError::NoSubscribers) => {}
        other => panic!("Expected EventBusError::NoSubscribers, got: {other:?}"),
    }
    assert_eq!(bus.metrics().dropped(), 1);
    assert_eq!(bus.metrics().published(), 0);
}

#[tokio::test]
async fn test_subscribe_and_publish() {
    let bus = MirrorEventBus::new(10);
    let mut receiver = bus.subscribe();

    assert_eq!(bus.subscriber_count(), 1);
    assert!(bus.has_subscribers());

    let event = MirrorEvent::page_visited("https://example.com/".to_string(), 7, 3);
    let result = bus.publish(event).await;
    assert!(matches!(result, Ok(1)));

    let received = match timeout(Duration::from_millis(100), receiver.recv()).await {
        Ok(Ok(event)) => event,
        Ok(Err(e)) => panic!("Failed to receive event: {e}"),
        Err(_) => panic!("Timeout waiting for event"),
    };

    match received {
        MirrorEvent::PageVisited {
            url,
            resources,
            links_discovered,
            ..
        } => {
            assert_eq!(url, "https://example.com/");
            assert_eq!(resources, 7);
            assert_eq!(links_discovered, 3);
        }
        other => panic!("Wrong event type: {other:?}"),
    }
}

#[tokio::test]
async fn test_multiple_subscribers() {
    let bus = MirrorEventBus::new(10);
    let mut receiver1 = bus.subscribe();
    let mut receiver2 = bus.subscribe();

    let event = MirrorEvent::download_progress(
        ResourceCategory::Image,
        0,
        "https://example.com/logo.png".to_string(),
        DownloadOutcome::Fetched {
            path: PathBuf::from("/mirror/example.com/logo.png"),
        },
    );

    let result = bus.publish(event).await;
    assert!(matches!(result, Ok(2)));
    assert_eq!(bus.metrics().peak_subscribers.load(std::sync::atomic::Ordering::SeqCst), 2);

    for (name, receiver) in [("1", &mut receiver1), ("2", &mut receiver2)] {
        match timeout(Duration::from_millis(100), receiver.recv()).await {
            Ok(Ok(event)) => assert_eq!(event.channel(), "download:image"),
            Ok(Err(e)) => panic!("Receiver {name} failed to receive event: {e}"),
            Err(_) => panic!("Receiver {name} timeout waiting for event"),
        }
    }
}

#[tokio::test]
async fn test_shutdown_rejects_publish() {
    let bus = MirrorEventBus::new(10);
    let _receiver = bus.subscribe();
    bus.shutdown();

    assert!(bus.is_shutdown());
    let result = bus
        .publish(MirrorEvent::page_failed(
            "https://example.com/x".to_string(),
            "timeout".to_string(),
        ))
        .await;
    assert!(matches!(result, Err(EventBusError::Shutdown)));
}

#[test]
fn test_event_channels() {
    let cases = [
        (
            MirrorEvent::crawl_started(String::new(), String::new()),
            "crawl:started",
        ),
        (
            MirrorEvent::crawl_completed(2, 0, 5, false, Duration::from_secs(1)),
            "crawl:completed",
        ),
        (
            MirrorEvent::download_progress(
                ResourceCategory::Dom,
                3,
                "https://example.com/a".to_string(),
                DownloadOutcome::PolicyDenied,
            ),
            "download:dom",
        ),
        (
            MirrorEvent::download_completed(1, 2, 0, true, Duration::ZERO),
            "download:completed",
        ),
    ];

    for (event, channel) in cases {
        assert_eq!(event.channel(), channel);
    }
}

#[test]
fn test_progress_event_serializes_outcome_status() {
    let event = MirrorEvent::download_progress(
        ResourceCategory::Css,
        1,
        "https://example.com/a.css".to_string(),
        DownloadOutcome::Failed {
            error: "HTTP status 404".to_string(),
        },
    );

    let json = serde_json::to_value(&event).unwrap();
    let progress = &json["DownloadProgress"];
    assert_eq!(progress["category"], "css");
    assert_eq!(progress["index"], 1);
    assert_eq!(progress["outcome"]["status"], "failed");
    assert_eq!(progress["outcome"]["error"], "HTTP status 404");
}

#[tokio::test]
async fn test_progress_logger_keeps_reading_after_falling_behind() {
    let bus = MirrorEventBus::new(2);
    let events = bus.subscribe();
    for index in 0..5 {
        bus.publish(MirrorEvent::download_progress(
            ResourceCategory::Image,
            index,
            format!("https://example.com/{index}.png"),
            DownloadOutcome::PolicyDenied,
        ))
        .await
        .expect("subscriber is attached");
    }
    drop(bus);

    let tally = timeout(Duration::from_secs(1), log_progress(events))
        .await
        .expect("logger stops once the bus is gone");

    assert_eq!(tally.skipped, 3);
    assert_eq!(tally.received, 2);
}
