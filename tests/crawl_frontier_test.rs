//! Tests for the crawl frontier loop driven by an in-memory site

use kodegen_tools_sitemirror::crawl_engine::crawl_site;
use kodegen_tools_sitemirror::{
    CancellationToken, MirrorEvent, MirrorEventBus, ResourceCategory, ResourceKind,
};
use std::sync::Arc;
use std::time::Duration;

mod common;
use common::FakeSite;

const CSS: &str = "https://example.com/style.css";

fn two_page_site() -> FakeSite {
    FakeSite::new()
        .page(
            "https://example.com/",
            &["/about"],
            &[(ResourceKind::Stylesheet, CSS)],
        )
        .page(
            "https://example.com/about",
            &["/"],
            &[(ResourceKind::Stylesheet, CSS)],
        )
}

#[tokio::test]
async fn test_two_page_site_visits_each_page_once() {
    let site = two_page_site();
    let cancel = CancellationToken::new();

    let report = crawl_site(&site, "https://example.com", None, &cancel, None)
        .await
        .expect("crawl should succeed");

    assert_eq!(
        report.visited,
        vec![
            "https://example.com/".to_string(),
            "https://example.com/about".to_string()
        ]
    );
    assert_eq!(site.navigations(), 2, "each page is rendered exactly once");
    assert_eq!(report.origin, "https://example.com");
    assert!(report.is_complete());

    // Both pages loaded the stylesheet; the manifest lists it once
    assert_eq!(report.records.len(), 2);
    let manifest = report.manifest();
    assert_eq!(manifest.entries(ResourceCategory::Css), [CSS.to_string()]);
    assert_eq!(manifest.dom.len(), 2);
    assert!(manifest.script.is_empty());
}

#[tokio::test]
async fn test_start_path_is_replaced_by_origin() {
    let site = two_page_site();
    let cancel = CancellationToken::new();

    let report = crawl_site(&site, "https://example.com/about?x=1", None, &cancel, None)
        .await
        .expect("crawl should succeed");

    assert_eq!(site.navigation_log()[0], "https://example.com/");
    assert_eq!(report.visited.len(), 2);
}

#[tokio::test]
async fn test_cyclic_links_terminate() {
    let site = FakeSite::new()
        .page("https://example.com/", &["/a", "/b"], &[])
        .page("https://example.com/a", &["/b", "./c", "/"], &[])
        .page("https://example.com/b", &["/a", "c"], &[])
        .page("https://example.com/c", &["/a", "/b", "#top"], &[]);
    let cancel = CancellationToken::new();

    let report = tokio::time::timeout(
        Duration::from_secs(5),
        crawl_site(&site, "https://example.com", None, &cancel, None),
    )
    .await
    .expect("crawl of a cyclic graph should finish")
    .expect("crawl should succeed");

    assert_eq!(report.visited.len(), 4);
    assert_eq!(site.navigations(), 4);
}

#[tokio::test]
async fn test_external_links_are_not_followed() {
    let site = FakeSite::new().page(
        "https://example.com/",
        &[
            "https://other.org/page",
            "mailto:someone@example.com",
            "https://docs.example.com/guide",
        ],
        &[],
    );
    let cancel = CancellationToken::new();

    let report = crawl_site(&site, "https://example.com", None, &cancel, None)
        .await
        .expect("crawl should succeed");

    assert!(
        !site.navigation_log().iter().any(|u| u.contains("other.org")),
        "foreign host must never be rendered"
    );
    // Subdomain hosts contain the origin host and are followed
    assert!(
        report
            .visited
            .contains(&"https://docs.example.com/guide".to_string())
    );
}

#[tokio::test]
async fn test_failed_page_is_recorded_and_crawl_continues() {
    let site = FakeSite::new()
        .page("https://example.com/", &["/broken", "/ok"], &[])
        .failing_page("https://example.com/broken", "navigation timed out")
        .page(
            "https://example.com/ok",
            &[],
            &[(ResourceKind::Image, "https://example.com/logo.png")],
        );
    let cancel = CancellationToken::new();

    let report = crawl_site(&site, "https://example.com", None, &cancel, None)
        .await
        .expect("a page fault is not a crawl error");

    assert_eq!(report.visited.len(), 3, "failed page still counts as visited");
    assert_eq!(report.faults.len(), 1);
    assert_eq!(report.faults[0].url, "https://example.com/broken");
    assert!(report.faults[0].error.contains("navigation timed out"));
    assert!(!report.is_complete());
    assert_eq!(report.manifest().image.len(), 1);
}

#[tokio::test]
async fn test_max_pages_truncates_frontier() {
    let site = FakeSite::new()
        .page("https://example.com/", &["/a", "/b", "/c"], &[])
        .page("https://example.com/a", &[], &[])
        .page("https://example.com/b", &[], &[])
        .page("https://example.com/c", &[], &[]);
    let cancel = CancellationToken::new();

    let report = crawl_site(&site, "https://example.com", Some(2), &cancel, None)
        .await
        .expect("crawl should succeed");

    assert_eq!(report.visited.len(), 2);
    assert!(report.truncated);
    assert!(!report.cancelled);
    assert_eq!(site.navigations(), 2);
}

#[tokio::test]
async fn test_cancellation_stops_before_next_page() {
    let site = FakeSite::new()
        .page("https://example.com/", &["/a", "/b"], &[])
        .page("https://example.com/a", &[], &[])
        .page("https://example.com/b", &[], &[])
        .with_delay(Duration::from_millis(200));
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let report = crawl_site(&site, "https://example.com", None, &cancel, None)
        .await
        .expect("cancellation yields a partial report");

    assert!(report.cancelled);
    assert_eq!(site.navigations(), 1, "no navigation starts after cancel");
    assert!(report.records.is_empty());
}

#[tokio::test]
async fn test_cancelled_before_start_renders_nothing() {
    let site = two_page_site();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = crawl_site(&site, "https://example.com", None, &cancel, None)
        .await
        .expect("cancellation yields a partial report");

    assert!(report.cancelled);
    assert!(report.visited.is_empty());
    assert_eq!(site.navigations(), 0);
}

#[tokio::test]
async fn test_crawl_publishes_lifecycle_events() {
    let site = FakeSite::new()
        .page("https://example.com/", &["/gone"], &[])
        .failing_page("https://example.com/gone", "net::ERR_NAME_NOT_RESOLVED");
    let cancel = CancellationToken::new();
    let bus = Arc::new(MirrorEventBus::new(32));
    let mut receiver = bus.subscribe();

    crawl_site(&site, "https://example.com", None, &cancel, Some(&bus))
        .await
        .expect("crawl should succeed");

    let mut channels = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        if let MirrorEvent::CrawlCompleted {
            pages_visited,
            page_faults,
            cancelled,
            ..
        } = &event
        {
            assert_eq!(*pages_visited, 2);
            assert_eq!(*page_faults, 1);
            assert!(!cancelled);
        }
        channels.push(event.channel());
    }

    assert_eq!(
        channels,
        vec![
            "crawl:started",
            "crawl:page",
            "crawl:page-failed",
            "crawl:completed"
        ]
    );
}

#[tokio::test]
async fn test_invalid_start_url_is_an_error() {
    let site = FakeSite::new();
    let cancel = CancellationToken::new();

    let result = crawl_site(&site, "http://", None, &cancel, None).await;
    assert!(result.is_err());
    assert_eq!(site.navigations(), 0);
}
