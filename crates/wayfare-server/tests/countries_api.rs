use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use wayfare_db_memory::InMemoryCountryStore;
use wayfare_server::cache::CacheError;
use wayfare_server::config::{AuthSettings, StorageBackend};
use wayfare_server::{AppConfig, Cache, CacheBackend, ServerBuilder};
use wayfare_storage::Country;

const SECRET: &str = "integration-secret";

/// Local cache that counts writes and can be switched to failing reads.
struct RecordingCache {
    inner: CacheBackend,
    sets: AtomicUsize,
    broken: AtomicBool,
}

impl RecordingCache {
    fn new() -> Self {
        Self {
            inner: CacheBackend::new_local(),
            sets: AtomicUsize::new(0),
            broken: AtomicBool::new(false),
        }
    }

    fn break_backend(&self) {
        self.broken.store(true, Ordering::SeqCst);
    }

    fn sets(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Cache for RecordingCache {
    async fn get(&self, key: &str) -> Result<Option<Arc<Vec<u8>>>, CacheError> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(CacheError::backend("connection refused"));
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.inner.invalidate(key).await
    }

    fn mode(&self) -> &'static str {
        "recording"
    }
}

struct TestServer {
    base: String,
    store: Arc<InMemoryCountryStore>,
    cache: Arc<RecordingCache>,
    shutdown: tokio::sync::oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl TestServer {
    async fn stop(self) {
        let _ = self.shutdown.send(());
        let _ = self.handle.await;
    }
}

fn country(code: &str, code3: &str, name: &str, continent: &str, region: &str, popular: bool) -> Country {
    Country {
        code: code.into(),
        code3: code3.into(),
        name: name.into(),
        official_name: format!("Official {name}"),
        capital: String::new(),
        continent: continent.into(),
        region: region.into(),
        languages: vec!["en".into()],
        currencies: vec![],
        calling_codes: vec![],
        is_popular: popular,
        flag: String::new(),
        latitude: 0.0,
        longitude: 0.0,
    }
}

fn dataset() -> Vec<Country> {
    vec![
        country("US", "USA", "United States", "North America", "Northern America", true),
        country("CA", "CAN", "Canada", "North America", "Northern America", false),
        country("MX", "MEX", "Mexico", "North America", "Central America", true),
        country("FR", "FRA", "France", "Europe", "Western Europe", true),
        country("DE", "DEU", "Germany", "Europe", "Western Europe", false),
        country("PT", "PRT", "Portugal", "Europe", "Southern Europe", false),
        country("JP", "JPN", "Japan", "Asia", "Eastern Asia", true),
        country("KE", "KEN", "Kenya", "Africa", "Eastern Africa", false),
    ]
}

fn config(auth: AuthSettings) -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.storage.backend = StorageBackend::Memory;
    cfg.auth = auth;
    cfg
}

async fn start_server(store: InMemoryCountryStore, cfg: AppConfig) -> TestServer {
    let store = Arc::new(store);
    let cache = Arc::new(RecordingCache::new());

    let server = ServerBuilder::new()
        .with_config(cfg)
        .with_store(store.clone())
        .with_cache(cache.clone())
        .build()
        .await
        .expect("build server");
    let app = server.router();

    // Bind to an ephemeral port
    let listener = tokio::net::TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();

    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = rx.await;
            })
            .await;
    });

    TestServer {
        base: format!("http://{addr}"),
        store,
        cache,
        shutdown: tx,
        handle,
    }
}

async fn get_json(client: &reqwest::Client, url: String) -> (u16, Value) {
    let resp = client.get(url).send().await.unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

fn codes(body: &Value) -> Vec<String> {
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["code"].as_str().unwrap().to_string())
        .collect()
}

fn admin_token(secret: &str) -> String {
    let exp = time::OffsetDateTime::now_utc().unix_timestamp() + 600;
    encode(
        &Header::new(Algorithm::HS256),
        &json!({ "sub": "ops", "exp": exp }),
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

#[tokio::test]
async fn paginated_listing_envelope_and_metadata() {
    let srv = start_server(
        InMemoryCountryStore::with_countries(dataset()),
        config(AuthSettings::default()),
    )
    .await;
    let client = reqwest::Client::new();

    let (status, body) = get_json(&client, format!("{}/api/countries?page=2&limit=3", srv.base)).await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert!(body["timestamp"].is_string());
    assert_eq!(codes(&body), vec!["JP", "KE", "MX"]);
    assert_eq!(
        body["meta"],
        json!({
            "page": 2,
            "limit": 3,
            "total": 8,
            "totalPages": 3,
            "hasNext": true,
            "hasPrev": true
        })
    );

    // Pages are disjoint and cover the filtered set in name order
    let mut seen = Vec::new();
    for page in 1..=3 {
        let (_, body) =
            get_json(&client, format!("{}/api/countries?page={page}&limit=3", srv.base)).await;
        seen.extend(codes(&body));
    }
    assert_eq!(seen, vec!["CA", "FR", "DE", "JP", "KE", "MX", "PT", "US"]);

    // Past the end: empty data, same total
    let (status, body) = get_json(&client, format!("{}/api/countries?page=9&limit=3", srv.base)).await;
    assert_eq!(status, 200);
    assert!(codes(&body).is_empty());
    assert_eq!(body["meta"]["total"], 8);
    assert_eq!(body["meta"]["hasNext"], false);

    srv.stop().await;
}

#[tokio::test]
async fn filters_combine_continent_region_and_search() {
    let srv = start_server(
        InMemoryCountryStore::with_countries(dataset()),
        config(AuthSettings::default()),
    )
    .await;
    let client = reqwest::Client::new();

    let (_, body) = get_json(&client, format!("{}/api/countries?continent=europe", srv.base)).await;
    assert_eq!(codes(&body), vec!["FR", "DE", "PT"]);

    let (_, body) = get_json(
        &client,
        format!("{}/api/countries?continent=Europe&region=western", srv.base),
    )
    .await;
    assert_eq!(codes(&body), vec!["FR", "DE"]);

    // Search matches name, alpha-2 and alpha-3
    let (_, body) = get_json(&client, format!("{}/api/countries?search=prt", srv.base)).await;
    assert_eq!(codes(&body), vec!["PT"]);
    let (_, body) = get_json(&client, format!("{}/api/countries?search=an", srv.base)).await;
    assert_eq!(codes(&body), vec!["CA", "FR", "DE", "JP"]);

    srv.stop().await;
}

#[tokio::test]
async fn invalid_paging_is_rejected_and_large_limits_are_clamped() {
    let srv = start_server(
        InMemoryCountryStore::with_countries(dataset()),
        config(AuthSettings::default()),
    )
    .await;
    let client = reqwest::Client::new();

    for query in ["page=0", "limit=0", "page=abc", "limit=-5"] {
        let (status, body) = get_json(&client, format!("{}/api/countries?{query}", srv.base)).await;
        assert_eq!(status, 400, "{query}");
        assert_eq!(body["success"], false);
        assert_eq!(body["statusCode"], 400);
        assert!(body["message"].is_string());
        assert!(body["timestamp"].is_string());
    }

    let (status, body) = get_json(&client, format!("{}/api/countries?limit=5000", srv.base)).await;
    assert_eq!(status, 200);
    assert_eq!(body["meta"]["limit"], 100);

    srv.stop().await;
}

#[tokio::test]
async fn code_lookup_accepts_alpha2_alpha3_and_any_case() {
    let srv = start_server(
        InMemoryCountryStore::with_countries(dataset()),
        config(AuthSettings::default()),
    )
    .await;
    let client = reqwest::Client::new();

    let mut names = Vec::new();
    for code in ["us", "US", "USA", "usa"] {
        let (status, body) = get_json(&client, format!("{}/api/countries/{code}", srv.base)).await;
        assert_eq!(status, 200);
        names.push(body["data"]["name"].as_str().unwrap().to_string());
    }
    assert!(names.iter().all(|n| n == "United States"));

    let (status, body) = get_json(&client, format!("{}/api/countries/ZZZZZ", srv.base)).await;
    assert_eq!(status, 404);
    assert_eq!(body["success"], false);
    assert_eq!(body["statusCode"], 404);

    srv.stop().await;
}

#[tokio::test]
async fn repeated_reads_are_served_from_cache() {
    let srv = start_server(
        InMemoryCountryStore::with_countries(dataset()),
        config(AuthSettings::default()),
    )
    .await;
    let client = reqwest::Client::new();

    let url = format!("{}/api/countries?continent=Europe&page=1&limit=2", srv.base);
    let (_, first) = get_json(&client, url.clone()).await;
    let queries = srv.store.query_count();
    let (_, second) = get_json(&client, url).await;

    assert_eq!(srv.store.query_count(), queries);
    assert_eq!(first["data"], second["data"]);
    assert_eq!(first["meta"], second["meta"]);
    assert_eq!(srv.cache.sets(), 1);

    // Equivalent filter spelling hits the same entry
    let (_, third) = get_json(
        &client,
        format!("{}/api/countries?continent=%20europe%20&limit=2", srv.base),
    )
    .await;
    assert_eq!(srv.store.query_count(), queries);
    assert_eq!(third["data"], first["data"]);

    srv.stop().await;
}

#[tokio::test]
async fn disconnected_store_serves_offline_data_without_caching() {
    let store = InMemoryCountryStore::with_countries(dataset());
    store.set_connected(false);
    let srv = start_server(store, config(AuthSettings::default())).await;
    let client = reqwest::Client::new();

    let (status, body) = get_json(&client, format!("{}/api/countries/continents", srv.base)).await;
    assert_eq!(status, 200);
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    let mut sorted = names.clone();
    sorted.sort_unstable();
    assert_eq!(names, sorted);
    assert!(names.contains(&"Europe"));

    let (status, body) = get_json(&client, format!("{}/api/countries/jpn", srv.base)).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["code"], "JP");

    let (status, body) = get_json(&client, format!("{}/api/countries/popular", srv.base)).await;
    assert_eq!(status, 200);
    assert!(!codes(&body).is_empty());

    let (status, body) = get_json(&client, format!("{}/api/countries?limit=2", srv.base)).await;
    assert_eq!(status, 200);
    assert_eq!(codes(&body).len(), 2);

    // No offline fallback for the full listing
    let (status, body) = get_json(&client, format!("{}/api/countries/all", srv.base)).await;
    assert_eq!(status, 503);
    assert_eq!(body["statusCode"], 503);

    assert_eq!(srv.cache.sets(), 0);
    assert_eq!(srv.store.query_count(), 0);

    let (status, body) = get_json(&client, format!("{}/readyz", srv.base)).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["store"]["connected"], false);
    assert_eq!(body["cache"]["mode"], "recording");

    srv.stop().await;
}

#[tokio::test]
async fn invalidate_then_list_all_refetches_once() {
    let srv = start_server(
        InMemoryCountryStore::with_countries(dataset()),
        config(AuthSettings::default()),
    )
    .await;
    let client = reqwest::Client::new();

    let (status, body) = get_json(&client, format!("{}/api/countries/all", srv.base)).await;
    assert_eq!(status, 200);
    assert_eq!(codes(&body).len(), 8);
    let after_first = srv.store.query_count();

    let resp = client
        .post(format!("{}/api/countries/cache/invalidate", srv.base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["data"]["keys"],
        json!(["countries:all", "countries:continents", "countries:popular"])
    );

    get_json(&client, format!("{}/api/countries/all", srv.base)).await;
    get_json(&client, format!("{}/api/countries/all", srv.base)).await;
    assert_eq!(srv.store.query_count(), after_first + 1);

    srv.stop().await;
}

#[tokio::test]
async fn invalidate_requires_bearer_token_when_auth_enabled() {
    let auth = AuthSettings {
        enabled: true,
        jwt_secret: Some(SECRET.into()),
        issuer: None,
    };
    let srv = start_server(InMemoryCountryStore::with_countries(dataset()), config(auth)).await;
    let client = reqwest::Client::new();
    let url = format!("{}/api/countries/cache/invalidate", srv.base);

    let resp = client.post(&url).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["statusCode"], 401);

    let resp = client
        .post(&url)
        .bearer_auth(admin_token("wrong-secret"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);

    let resp = client
        .post(&url)
        .bearer_auth(admin_token(SECRET))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    // Read routes stay public
    let (status, _) = get_json(&client, format!("{}/api/countries/popular", srv.base)).await;
    assert_eq!(status, 200);

    srv.stop().await;
}

#[tokio::test]
async fn health_endpoints_and_request_id() {
    let srv = start_server(
        InMemoryCountryStore::with_countries(dataset()),
        config(AuthSettings::default()),
    )
    .await;
    let client = reqwest::Client::new();

    let (status, body) = get_json(&client, format!("{}/healthz", srv.base)).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");

    let (status, body) = get_json(&client, format!("{}/readyz", srv.base)).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["store"]["backend"], "memory");

    let resp = client
        .get(format!("{}/healthz", srv.base))
        .header("x-request-id", "abc-123")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.headers()["x-request-id"], "abc-123");

    let resp = client
        .get(format!("{}/healthz", srv.base))
        .send()
        .await
        .unwrap();
    assert!(resp.headers().contains_key("x-request-id"));

    get_json(&client, format!("{}/api/countries/us", srv.base)).await;
    let resp = client
        .get(format!("{}/metrics", srv.base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let text = resp.text().await.unwrap();
    assert!(text.contains("http_requests_total"));

    srv.stop().await;
}

#[tokio::test]
async fn cache_failure_returns_internal_error_envelope() {
    let srv = start_server(
        InMemoryCountryStore::with_countries(dataset()),
        config(AuthSettings::default()),
    )
    .await;
    let client = reqwest::Client::new();
    srv.cache.break_backend();

    for path in ["/api/countries", "/api/countries/FR", "/api/countries/continents"] {
        let (status, body) = get_json(&client, format!("{}{path}", srv.base)).await;
        assert_eq!(status, 500, "{path}");
        assert_eq!(body["success"], false);
        assert_eq!(body["statusCode"], 500);
        assert_eq!(body["message"], "Failed to load country data");
    }
    assert_eq!(srv.store.query_count(), 0);

    srv.stop().await;
}
