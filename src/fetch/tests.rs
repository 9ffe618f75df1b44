use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;

use super::cache::ProfileCache;
use super::*;
use crate::utils::test_utils::{StubResponse, StubServer};

const UID: u64 = 800123456;

fn uid() -> Uid {
    Uid::new(UID).unwrap()
}

fn profile_body(name: &str) -> Value {
    json!({"player": {"nickname": "Trailblazer", "level": 70}, "characters": [{"name": name}]})
}

fn endpoints(server: &StubServer, paths: &[&str]) -> Vec<ProviderEndpoint> {
    paths
        .iter()
        .enumerate()
        .map(|(index, path)| ProviderEndpoint::new(format!("p{}", index + 1), server.template(path)))
        .collect()
}

fn fetcher(endpoints: Vec<ProviderEndpoint>, timeout: Duration) -> ProfileFetcher {
    ProfileFetcher::new(endpoints, timeout).unwrap()
}

#[tokio::test]
async fn falls_through_to_first_acceptable_candidate() {
    let server = StubServer::start(vec![
        ("/one/800123456", StubResponse::status(500)),
        ("/two/800123456", StubResponse::json(profile_body("Late")).delayed(Duration::from_secs(3))),
        ("/three/800123456", StubResponse::json(profile_body("Acheron"))),
        ("/four/800123456", StubResponse::json(profile_body("Never"))),
    ])
    .await;
    let fetcher = fetcher(
        endpoints(&server, &["/one/{uid}", "/two/{uid}", "/three/{uid}", "/four/{uid}"]),
        Duration::from_millis(500),
    );

    let payload = fetcher.fetch(uid(), false).await.unwrap();
    assert_eq!(payload.source, "p3");
    assert_eq!(payload.body["characters"][0]["name"], "Acheron");
    assert!(!payload.from_cache);

    let hits = server.hits().await;
    assert!(hits.contains(&"/three/800123456".to_string()));
    assert!(!hits.contains(&"/four/800123456".to_string()));
}

#[tokio::test]
async fn rejects_bodies_without_character_list() {
    let server = StubServer::start(vec![
        ("/a/800123456", StubResponse::json(json!({"retcode": 1, "message": "not found"}))),
        ("/b/800123456", StubResponse::raw("<html>maintenance</html>")),
    ])
    .await;
    let fetcher = fetcher(endpoints(&server, &["/a/{uid}", "/b/{uid}"]), Duration::from_secs(2));
    assert!(fetcher.fetch(uid(), false).await.is_none());
    assert_eq!(server.hits().await.len(), 2);
}

#[tokio::test]
async fn unavailable_providers_return_none_within_timeouts() {
    let server = StubServer::start(
        (1..=6)
            .map(|_| ("/slow/800123456", StubResponse::status(200).delayed(Duration::from_secs(5))))
            .collect(),
    )
    .await;
    let fetcher = fetcher(
        endpoints(&server, &["/slow/{uid}"; 6]),
        Duration::from_millis(200),
    );

    let started = std::time::Instant::now();
    assert!(fetcher.fetch(uid(), false).await.is_none());
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
async fn cache_is_read_unless_refresh_is_forced() {
    let dir = TempDir::new().unwrap();
    let server = StubServer::start(vec![("/p/800123456", StubResponse::json(profile_body("Seele")))]).await;
    let fetcher = fetcher(endpoints(&server, &["/p/{uid}"]), Duration::from_secs(2))
        .with_cache(ProfileCache::new(dir.path(), Duration::from_secs(1800)));

    let first = fetcher.fetch(uid(), false).await.unwrap();
    assert!(!first.from_cache);
    assert!(dir.path().join("800123456.json").exists());

    let second = fetcher.fetch(uid(), false).await.unwrap();
    assert!(second.from_cache);
    assert_eq!(second.body, first.body);
    assert_eq!(server.hits().await.len(), 1);

    let third = fetcher.fetch(uid(), true).await.unwrap();
    assert!(!third.from_cache);
    assert_eq!(server.hits().await.len(), 2);
}

#[tokio::test]
async fn expired_cache_triggers_network_fetch() {
    let dir = TempDir::new().unwrap();
    let cache = ProfileCache::new(dir.path(), Duration::from_secs(60));
    cache
        .store(&CachedProfile {
            uid: UID,
            fetched_at: Utc::now() - chrono::Duration::minutes(5),
            source: "old".to_string(),
            payload: profile_body("Stale"),
        })
        .unwrap();
    let server = StubServer::start(vec![("/p/800123456", StubResponse::json(profile_body("Fresh")))]).await;
    let fetcher = fetcher(endpoints(&server, &["/p/{uid}"]), Duration::from_secs(2)).with_cache(cache);

    let payload = fetcher.fetch(uid(), false).await.unwrap();
    assert_eq!(payload.body["characters"][0]["name"], "Fresh");
}

#[tokio::test(flavor = "current_thread")]
async fn unwritable_cache_still_returns_payload() {
    let dir = TempDir::new().unwrap();
    let blocked = dir.path().join("not-a-dir");
    std::fs::write(&blocked, "file in the way").unwrap();
    let server = StubServer::start(vec![("/p/800123456", StubResponse::json(profile_body("Kafka")))]).await;
    let fetcher = fetcher(endpoints(&server, &["/p/{uid}"]), Duration::from_secs(2))
        .with_cache(ProfileCache::new(&blocked, Duration::from_secs(1800)));

    let payload = fetcher.fetch(uid(), false).await.unwrap();
    assert_eq!(payload.body["characters"][0]["name"], "Kafka");
    assert!(blocked.is_file());
}

#[tokio::test(flavor = "current_thread")]
async fn concurrent_lookups_fill_the_cache_on_one_thread() {
    let dir = TempDir::new().unwrap();
    let server = StubServer::start(vec![
        ("/p/800123456", StubResponse::json(profile_body("Acheron"))),
        ("/p/700000001", StubResponse::json(profile_body("Jingliu"))),
    ])
    .await;
    let fetcher = fetcher(endpoints(&server, &["/p/{uid}"]), Duration::from_secs(2))
        .with_cache(ProfileCache::new(dir.path(), Duration::from_secs(1800)));
    let other = Uid::new(700000001).unwrap();

    let (first, second) =
        futures_util::future::join(fetcher.fetch(uid(), false), fetcher.fetch(other, false)).await;
    assert_eq!(first.unwrap().body["characters"][0]["name"], "Acheron");
    assert_eq!(second.unwrap().body["characters"][0]["name"], "Jingliu");
    assert!(dir.path().join("800123456.json").exists());
    assert!(dir.path().join("700000001.json").exists());

    let cached = fetcher.fetch(other, false).await.unwrap();
    assert!(cached.from_cache);
}

#[test]
fn timeout_is_clamped() {
    assert_eq!(clamp_timeout(Duration::from_secs(1)), MIN_REQUEST_TIMEOUT);
    assert_eq!(clamp_timeout(Duration::from_secs(60)), MAX_REQUEST_TIMEOUT);
    assert_eq!(clamp_timeout(DEFAULT_REQUEST_TIMEOUT), DEFAULT_REQUEST_TIMEOUT);
}
