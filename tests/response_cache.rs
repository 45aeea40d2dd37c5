//! End-to-end behavior of the index response cache middleware.
//!
//! The handler under the layer renders from a mutable "store" so the
//! tests can delete content underneath a live cache entry and watch the
//! stale page keep serving until the window closes.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
    middleware,
    routing::{get, post},
};
use tower::ServiceExt;

use rostra::cache::{CacheConfig, CacheState, ManualClock, ResponseStore, response_cache_layer};

const WINDOW: Duration = Duration::from_secs(20);

struct Harness {
    app: Router,
    posts: Arc<Mutex<Vec<&'static str>>>,
    renders: Arc<AtomicUsize>,
    clock: Arc<ManualClock>,
    store: Arc<ResponseStore>,
}

fn harness() -> Harness {
    let posts: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(vec!["first post"]));
    let renders = Arc::new(AtomicUsize::new(0));
    let clock = Arc::new(ManualClock::new());

    let config = CacheConfig {
        enabled: true,
        ttl: WINDOW,
        max_entries: 64,
    };
    let store = Arc::new(ResponseStore::new(&config, clock.clone()));
    let cache_state = CacheState {
        config,
        store: store.clone(),
    };

    let handler_posts = posts.clone();
    let handler_renders = renders.clone();
    let app = Router::new()
        .route(
            "/",
            get(move || {
                let posts = handler_posts.clone();
                let renders = handler_renders.clone();
                async move {
                    renders.fetch_add(1, Ordering::SeqCst);
                    let listing = posts.lock().expect("posts lock").join("\n");
                    format!("index:\n{listing}")
                }
            }),
        )
        .layer(middleware::from_fn_with_state(
            cache_state,
            response_cache_layer,
        ));

    Harness {
        app,
        posts,
        renders,
        clock,
        store,
    }
}

async fn fetch(app: &Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(uri)
                .body(Body::empty())
                .expect("request built"),
        )
        .await
        .expect("response");

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("body collected");
    (status, String::from_utf8(bytes.to_vec()).expect("utf-8 body"))
}

#[tokio::test]
async fn deleted_post_keeps_serving_until_cache_cleared() {
    let h = harness();

    let (status, body_before) = fetch(&h.app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body_before.contains("first post"));

    // Delete the post under the cache.
    h.posts.lock().expect("posts lock").clear();

    let (_, body_stale) = fetch(&h.app, "/").await;
    assert_eq!(body_stale, body_before);
    assert_eq!(h.renders.load(Ordering::SeqCst), 1);

    // Explicit clearing behaves like expiry.
    h.store.invalidate_all();
    let (_, body_fresh) = fetch(&h.app, "/").await;
    assert!(!body_fresh.contains("first post"));
}

#[tokio::test]
async fn entry_expires_after_the_window() {
    let h = harness();

    let (_, body_before) = fetch(&h.app, "/").await;
    assert!(body_before.contains("first post"));

    h.posts.lock().expect("posts lock").push("second post");

    h.clock.advance(WINDOW - Duration::from_secs(1));
    let (_, body_stale) = fetch(&h.app, "/").await;
    assert!(!body_stale.contains("second post"));

    h.clock.advance(Duration::from_secs(2));
    let (_, body_fresh) = fetch(&h.app, "/").await;
    assert!(body_fresh.contains("second post"));
    assert_eq!(h.renders.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn page_query_values_cache_independently() {
    let h = harness();

    fetch(&h.app, "/?page=1").await;
    fetch(&h.app, "/?page=2").await;
    assert_eq!(h.renders.load(Ordering::SeqCst), 2);

    // Repeats of both hit the cache.
    fetch(&h.app, "/?page=1").await;
    fetch(&h.app, "/?page=2").await;
    assert_eq!(h.renders.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn non_ok_responses_are_not_cached() {
    let renders = Arc::new(AtomicUsize::new(0));
    let handler_renders = renders.clone();

    let config = CacheConfig {
        enabled: true,
        ttl: WINDOW,
        max_entries: 64,
    };
    let store = Arc::new(ResponseStore::new(&config, Arc::new(ManualClock::new())));
    let app = Router::new()
        .route(
            "/",
            get(move || {
                let renders = handler_renders.clone();
                async move {
                    renders.fetch_add(1, Ordering::SeqCst);
                    (StatusCode::NOT_FOUND, "nothing here")
                }
            }),
        )
        .layer(middleware::from_fn_with_state(
            CacheState { config, store },
            response_cache_layer,
        ));

    fetch(&app, "/").await;
    fetch(&app, "/").await;
    assert_eq!(renders.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn writes_bypass_the_cache() {
    let hits = Arc::new(AtomicUsize::new(0));
    let handler_hits = hits.clone();

    let config = CacheConfig {
        enabled: true,
        ttl: WINDOW,
        max_entries: 64,
    };
    let store = Arc::new(ResponseStore::new(&config, Arc::new(ManualClock::new())));
    let app = Router::new()
        .route(
            "/submit",
            post(move || {
                let hits = handler_hits.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    "accepted"
                }
            }),
        )
        .layer(middleware::from_fn_with_state(
            CacheState { config, store },
            response_cache_layer,
        ));

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/submit")
                    .body(Body::empty())
                    .expect("request built"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(hits.load(Ordering::SeqCst), 2);
}
