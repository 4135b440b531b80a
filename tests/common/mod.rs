//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cep_weather::clients::{OrchestratorClient, ViaCepClient, WeatherApiClient};
use cep_weather::config::{AppConfig, ServiceRole, TimeoutConfig};
use cep_weather::http::HttpServer;
use cep_weather::lifecycle::Shutdown;
use cep_weather::observability::trace_layer;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::Value;
use opentelemetry_sdk::export::trace::SpanData;
use opentelemetry_sdk::testing::trace::InMemorySpanExporter;
use opentelemetry_sdk::trace::TracerProvider;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::layer::SubscriberExt;

pub const API_KEY: &str = "test-key";

/// A programmable upstream speaking just enough HTTP/1.1 for one request per
/// connection. Every request target (path + query) is recorded.
pub struct MockBackend {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockBackend {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

/// Start a mock backend answering `f(request_target)` with `(status, body)`.
pub async fn start_programmable_backend<F>(f: F) -> MockBackend
where
    F: Fn(&str) -> (u16, String) + Send + Sync + 'static,
{
    start_delayed_backend(Duration::ZERO, f).await
}

/// Like [`start_programmable_backend`], but holds every answer for `delay`.
pub async fn start_delayed_backend<F>(delay: Duration, f: F) -> MockBackend
where
    F: Fn(&str) -> (u16, String) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let f = Arc::new(f);

    let recorded = requests.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    let recorded = recorded.clone();
                    tokio::spawn(async move {
                        let Some(target) = read_request_target(&mut socket).await else {
                            return;
                        };
                        recorded.lock().unwrap().push(target.clone());
                        if !delay.is_zero() {
                            tokio::time::sleep(delay).await;
                        }

                        let (status, body) = f(&target);
                        let reason = axum::http::StatusCode::from_u16(status)
                            .ok()
                            .and_then(|s| s.canonical_reason())
                            .unwrap_or("Unknown");
                        let response = format!(
                            "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status,
                            reason,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    MockBackend { addr, requests }
}

/// Read the request head and return the request target of its first line.
async fn read_request_target(socket: &mut tokio::net::TcpStream) -> Option<String> {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = socket.read(&mut buf).await.ok()?;
        if n == 0 {
            return None;
        }
        head.extend_from_slice(&buf[..n]);
    }
    let head = String::from_utf8_lossy(&head);
    head.lines()
        .next()?
        .split_whitespace()
        .nth(1)
        .map(str::to_string)
}

/// Canned ViaCEP: `01310100` resolves to São Paulo, everything else is `erro`.
pub async fn start_postal_registry() -> MockBackend {
    start_programmable_backend(|target| match target {
        "/ws/01310100/json/" => (
            200,
            r#"{"cep":"01310-100","logradouro":"Avenida Paulista","bairro":"Bela Vista","localidade":"São Paulo","uf":"SP","ibge":"3550308","ddd":"11"}"#.to_string(),
        ),
        "/ws/20040020/json/" => (200, r#"{"cep":"20040-020","localidade":""}"#.to_string()),
        _ => (200, r#"{"erro": "true"}"#.to_string()),
    })
    .await
}

const WEATHER_BODY: &str = r#"{"location":{"name":"São Paulo","region":"Sao Paulo","country":"Brazil"},"current":{"temp_c":25.5,"condition":{"text":"Ensolarado"}}}"#;

/// Canned WeatherAPI answering 25.5 °C for any location.
pub async fn start_weather_provider() -> MockBackend {
    start_programmable_backend(|_| (200, WEATHER_BODY.to_string())).await
}

/// Canned WeatherAPI that answers only after `delay`.
pub async fn start_slow_weather_provider(delay: Duration) -> MockBackend {
    start_delayed_backend(delay, |_| (200, WEATHER_BODY.to_string())).await
}

/// Orchestrator stand-in that answers a valid report only after `delay`.
pub async fn start_slow_orchestrator(delay: Duration) -> MockBackend {
    start_delayed_backend(delay, |_| {
        (
            200,
            r#"{"city":"São Paulo","temp_C":25.5,"temp_F":77.9,"temp_K":298.5}"#.to_string(),
        )
    })
    .await
}

/// Weather provider that always fails.
pub async fn start_failing_weather_provider(status: u16) -> MockBackend {
    start_programmable_backend(move |_| (status, r#"{"error":{"code":2008}}"#.to_string())).await
}

/// Client for talking to the services under test; never routed via a proxy.
pub fn http_client() -> reqwest::Client {
    http_client_with_timeout(Duration::from_secs(5))
}

pub fn http_client_with_timeout(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .timeout(timeout)
        .build()
        .unwrap()
}

/// Timeouts for a service under test, in seconds.
pub fn timeouts(request_secs: u64, upstream_secs: u64) -> TimeoutConfig {
    TimeoutConfig {
        request_secs,
        upstream_secs,
    }
}

/// A service running on an ephemeral port; stops when dropped.
pub struct RunningService {
    pub addr: SocketAddr,
    _shutdown: Shutdown,
}

impl RunningService {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

async fn serve(server: HttpServer) -> RunningService {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });
    RunningService {
        addr,
        _shutdown: shutdown,
    }
}

pub async fn start_orchestrator(postal: &MockBackend, weather: &MockBackend) -> RunningService {
    start_orchestrator_with(postal, weather, timeouts(25, 5)).await
}

/// Orchestrator whose upstream client uses `timeouts.upstream_secs`.
pub async fn start_orchestrator_with(
    postal: &MockBackend,
    weather: &MockBackend,
    timeouts: TimeoutConfig,
) -> RunningService {
    let mut config = AppConfig::for_role(ServiceRole::Orchestrator);
    config.upstreams.postal_base_url = postal.url();
    config.upstreams.weather_base_url = weather.url();
    config.upstreams.weather_api_key = API_KEY.to_string();
    config.timeouts = timeouts;

    let http = http_client_with_timeout(Duration::from_secs(config.timeouts.upstream_secs));
    let postal = ViaCepClient::new(http.clone(), &config.upstreams.postal_base_url).unwrap();
    let weather = WeatherApiClient::new(http, &config.upstreams.weather_base_url, API_KEY).unwrap();

    serve(HttpServer::orchestrator(config, Arc::new(postal), Arc::new(weather))).await
}

pub async fn start_input(orchestrator_url: &str) -> RunningService {
    start_input_with(orchestrator_url, timeouts(35, 5)).await
}

/// Input service whose orchestrator client uses `timeouts.upstream_secs`.
pub async fn start_input_with(orchestrator_url: &str, timeouts: TimeoutConfig) -> RunningService {
    let mut config = AppConfig::for_role(ServiceRole::Input);
    config.upstreams.orchestrator_url = orchestrator_url.to_string();
    config.timeouts = timeouts;

    let http = http_client_with_timeout(Duration::from_secs(config.timeouts.upstream_secs));
    let client = OrchestratorClient::new(http, orchestrator_url).unwrap();
    serve(HttpServer::input(config, Arc::new(client))).await
}

/// Both services wired to mock providers.
pub struct Stack {
    pub postal: MockBackend,
    pub weather: MockBackend,
    pub orchestrator: RunningService,
    pub input: RunningService,
}

pub async fn start_stack(weather: MockBackend) -> Stack {
    let postal = start_postal_registry().await;
    let orchestrator = start_orchestrator(&postal, &weather).await;
    let input = start_input(&orchestrator.url()).await;
    Stack {
        postal,
        weather,
        orchestrator,
        input,
    }
}

/// Collects spans exported by this thread's services.
///
/// Requires a current-thread runtime (the `#[tokio::test]` default) so that
/// server tasks run under the thread-local subscriber.
pub struct SpanCapture {
    exporter: InMemorySpanExporter,
    _provider: TracerProvider,
    _guard: DefaultGuard,
}

pub fn capture_spans() -> SpanCapture {
    let exporter = InMemorySpanExporter::default();
    let provider = TracerProvider::builder()
        .with_simple_exporter(exporter.clone())
        .build();
    let subscriber = tracing_subscriber::registry().with(trace_layer(provider.tracer("integration")));
    let guard = tracing::subscriber::set_default(subscriber);
    SpanCapture {
        exporter,
        _provider: provider,
        _guard: guard,
    }
}

impl SpanCapture {
    pub fn spans(&self) -> Vec<SpanData> {
        self.exporter.get_finished_spans().unwrap()
    }

    pub fn named(&self, name: &str) -> SpanData {
        let mut matching: Vec<_> = self.spans().into_iter().filter(|s| s.name == name).collect();
        assert_eq!(matching.len(), 1, "expected one {name} span, got {}", matching.len());
        matching.remove(0)
    }
}

/// Latest recorded value of `key` on `span`.
pub fn attribute(span: &SpanData, key: &str) -> Option<Value> {
    span.attributes
        .iter()
        .rev()
        .find(|kv| kv.key.as_str() == key)
        .map(|kv| kv.value.clone())
}

pub fn string_attribute(span: &SpanData, key: &str) -> Option<String> {
    attribute(span, key).map(|v| v.as_str().into_owned())
}
