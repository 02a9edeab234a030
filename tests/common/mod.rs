//! Shared utilities for gateway integration tests.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use race_gateway::config::GatewayConfig;
use race_gateway::provider::client::encode_password;
use race_gateway::provider::{
    Credentials, ProviderError, ProviderResult, RaceDataProvider, SubsessionId,
};

pub const USERNAME: &str = "Driver@Example.com";
pub const PASSWORD: &str = "hunter2";

/// Provider cookie set by the mock on successful auth.
const PROVIDER_COOKIE: &str = "authtoken_members";

/// Gateway config suited to tests: development mode, loopback, short deadlines.
#[allow(dead_code)]
pub fn test_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.host = "127.0.0.1".into();
    config.listener.port = 0;
    config.provider.call_timeout_secs = 2;
    config.timeouts.shutdown_secs = 2;
    config
}

/// In-process provider that records how often each operation is called.
#[allow(dead_code)]
#[derive(Default)]
pub struct FakeProvider {
    pub auth_calls: AtomicUsize,
    pub recent_calls: AtomicUsize,
    pub result_calls: AtomicUsize,
    /// Hang on data calls instead of answering.
    pub stall: bool,
    /// Fail data calls as if the provider dropped our login.
    pub fail_data: bool,
}

#[allow(dead_code)]
impl FakeProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn stalling() -> Arc<Self> {
        Arc::new(Self {
            stall: true,
            ..Self::default()
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail_data: true,
            ..Self::default()
        })
    }

    pub fn calls(&self) -> (usize, usize, usize) {
        (
            self.auth_calls.load(Ordering::SeqCst),
            self.recent_calls.load(Ordering::SeqCst),
            self.result_calls.load(Ordering::SeqCst),
        )
    }

    async fn data<T>(&self, value: T) -> ProviderResult<T> {
        if self.stall {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if self.fail_data {
            return Err(ProviderError::Unauthorized);
        }
        Ok(value)
    }
}

#[async_trait]
impl RaceDataProvider for FakeProvider {
    async fn authenticate(&self, credentials: &Credentials) -> ProviderResult<()> {
        self.auth_calls.fetch_add(1, Ordering::SeqCst);
        if credentials.username == USERNAME && credentials.password == PASSWORD {
            Ok(())
        } else {
            Err(ProviderError::Rejected("Invalid email address or password".into()))
        }
    }

    async fn recent_races(&self) -> ProviderResult<Value> {
        self.recent_calls.fetch_add(1, Ordering::SeqCst);
        self.data(recent_races_fixture()).await
    }

    async fn race_result(&self, subsession_id: SubsessionId) -> ProviderResult<Value> {
        self.result_calls.fetch_add(1, Ordering::SeqCst);
        self.data(race_result_fixture(subsession_id.get())).await
    }
}

#[allow(dead_code)]
pub fn recent_races_fixture() -> Value {
    json!({
        "cust_id": 123456,
        "races": [
            { "subsession_id": 70001234, "series_name": "Skip Barber Formula 2000", "finish_position": 3 },
            { "subsession_id": 70005678, "series_name": "Global Mazda MX-5 Cup", "finish_position": 1 }
        ]
    })
}

#[allow(dead_code)]
pub fn race_result_fixture(subsession_id: u64) -> Value {
    json!({
        "subsession_id": subsession_id,
        "track": { "track_name": "Lime Rock Park" },
        "session_results": []
    })
}

/// Pull the `name=value` pair out of a `Set-Cookie` header, ready to send back.
#[allow(dead_code)]
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("gateway.sid="))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

/// Mock of the provider's members API, served over real TCP.
#[allow(dead_code)]
pub struct MockProvider {
    pub addr: SocketAddr,
    pub auth_calls: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl MockProvider {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

#[derive(Clone)]
struct MockState {
    base_url: String,
    auth_calls: Arc<AtomicUsize>,
}

#[derive(Deserialize)]
struct AuthBody {
    email: String,
    password: String,
}

#[derive(Deserialize)]
struct ResultQuery {
    subsession_id: u64,
}

/// Start the mock provider on an ephemeral loopback port.
///
/// `/auth` only accepts [`USERNAME`]/[`PASSWORD`] in the hashed form and then
/// sets a cookie; data endpoints answer 401 without that cookie. Race
/// results come back as a `link` to a second document.
#[allow(dead_code)]
pub async fn start_mock_provider() -> MockProvider {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let auth_calls = Arc::new(AtomicUsize::new(0));

    let state = MockState {
        base_url: format!("http://{}", addr),
        auth_calls: auth_calls.clone(),
    };

    let app = Router::new()
        .route("/auth", post(mock_auth))
        .route("/data/stats/member_recent_races", get(mock_recent_races))
        .route("/data/results/get", get(mock_result_link))
        .route("/links/result/{id}", get(mock_result_document))
        .with_state(state);

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockProvider { addr, auth_calls }
}

async fn mock_auth(State(state): State<MockState>, Json(body): Json<AuthBody>) -> Response {
    state.auth_calls.fetch_add(1, Ordering::SeqCst);

    if body.email == USERNAME && body.password == encode_password(USERNAME, PASSWORD) {
        (
            [(header::SET_COOKIE, format!("{PROVIDER_COOKIE}=valid; Path=/"))],
            Json(json!({ "authcode": "eyJhbGciOi", "custId": 123456 })),
        )
            .into_response()
    } else {
        Json(json!({ "authcode": 0, "message": "Invalid email address or password" })).into_response()
    }
}

fn has_provider_cookie(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.contains(&format!("{PROVIDER_COOKIE}=valid")))
}

async fn mock_recent_races(headers: HeaderMap) -> Response {
    if !has_provider_cookie(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(recent_races_fixture()).into_response()
}

async fn mock_result_link(
    State(state): State<MockState>,
    headers: HeaderMap,
    Query(query): Query<ResultQuery>,
) -> Response {
    if !has_provider_cookie(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({
        "link": format!("{}/links/result/{}", state.base_url, query.subsession_id),
        "expires": "2026-10-19T12:00:00Z"
    }))
    .into_response()
}

async fn mock_result_document(Path(id): Path<u64>) -> Json<Value> {
    Json(race_result_fixture(id))
}

/// A gateway served on an ephemeral port until `shutdown` is triggered.
#[allow(dead_code)]
pub struct RunningGateway {
    pub addr: SocketAddr,
    pub shutdown: race_gateway::Shutdown,
    pub handle: tokio::task::JoinHandle<Result<(), std::io::Error>>,
}

#[allow(dead_code)]
impl RunningGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start a gateway against the provider at `provider_url`.
#[allow(dead_code)]
pub async fn start_gateway(provider_url: &str) -> RunningGateway {
    let mut config = test_config();
    config.provider.base_url = provider_url.to_string();

    let server = race_gateway::HttpServer::new(config).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = race_gateway::Shutdown::new();
    let receiver = shutdown.subscribe();
    let handle = tokio::spawn(server.run(listener, receiver));

    RunningGateway {
        addr,
        shutdown,
        handle,
    }
}
