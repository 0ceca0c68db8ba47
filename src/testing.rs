//! In-process mock of the Qlik Engine WebSocket endpoint.
//!
//! Binds to `127.0.0.1:0`, accepts a fixed number of clients, records every
//! request and answers through a scripted handler per connection.

// ============================================================================
// Imports
// ============================================================================

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tracing_subscriber::EnvFilter;
use url::Url;

// ============================================================================
// Constants
// ============================================================================

/// Upper bound for the mock session to wind down after a test.
const FINISH_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// Logging
// ============================================================================

/// Installs a test subscriber once; `RUST_LOG` overrides the default filter.
pub(crate) fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("qlik_engine_scraper=debug"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

// ============================================================================
// Respond
// ============================================================================

/// What the mock does after reading one request.
pub(crate) enum Respond {
    /// Send these raw text frames, in order.
    Frames(Vec<String>),
    /// Close the socket.
    Hangup,
}

impl Respond {
    /// Sends JSON frames.
    pub(crate) fn frames(frames: Vec<Value>) -> Self {
        Self::Frames(frames.iter().map(Value::to_string).collect())
    }

    /// Sends nothing.
    pub(crate) fn nothing() -> Self {
        Self::Frames(Vec::new())
    }
}

// ============================================================================
// MockSession
// ============================================================================

/// What the mock observed once the client went away.
#[derive(Debug, Default)]
pub(crate) struct MockSession {
    /// Request path of the handshake.
    pub path: String,
    /// `Cookie` header of the handshake.
    pub cookie: Option<String>,
    /// Every request frame, in arrival order.
    pub requests: Vec<Value>,
    /// Client sent a close frame (as opposed to dropping the socket).
    pub closed_by_client: bool,
}

impl MockSession {
    /// Requests whose method is `method`.
    pub(crate) fn calls(&self, method: &str) -> Vec<&Value> {
        self.requests
            .iter()
            .filter(|request| request["method"] == method)
            .collect()
    }

    /// Request ids, in arrival order.
    pub(crate) fn ids(&self) -> Vec<u64> {
        self.requests
            .iter()
            .filter_map(|request| request["id"].as_u64())
            .collect()
    }
}

// ============================================================================
// MockEngine
// ============================================================================

/// A running mock engine.
pub(crate) struct MockEngine {
    port: u16,
    task: JoinHandle<Vec<MockSession>>,
}

impl MockEngine {
    /// Starts a mock that answers each request through `handler`.
    pub(crate) async fn start<F>(handler: F) -> Self
    where
        F: FnMut(&Value) -> Respond + Send + 'static,
    {
        Self::start_with_greeting(Vec::new(), handler).await
    }

    /// Starts a mock that pushes `greeting` frames right after the handshake.
    pub(crate) async fn start_with_greeting<F>(greeting: Vec<Value>, handler: F) -> Self
    where
        F: FnMut(&Value) -> Respond + Send + 'static,
    {
        let mut handler = Some(handler);
        Self::spawn(1, move || (greeting.clone(), handler.take().expect("single connection"))).await
    }

    /// Starts a mock accepting `connections` clients, each answered by a
    /// fresh handler from `factory`.
    pub(crate) async fn start_many<F, H>(connections: usize, mut factory: F) -> Self
    where
        F: FnMut() -> H + Send + 'static,
        H: FnMut(&Value) -> Respond + Send + 'static,
    {
        Self::spawn(connections, move || (Vec::new(), factory())).await
    }

    async fn spawn<F, H>(connections: usize, mut setup: F) -> Self
    where
        F: FnMut() -> (Vec<Value>, H) + Send + 'static,
        H: FnMut(&Value) -> Respond + Send + 'static,
    {
        init_tracing();

        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0);
        let listener = TcpListener::bind(addr).await.expect("bind mock engine");
        let port = listener.local_addr().expect("local addr").port();

        let task = tokio::spawn(async move {
            let mut sessions = Vec::with_capacity(connections);
            for _ in 0..connections {
                let (stream, _) = listener.accept().await.expect("accept");
                let (greeting, handler) = setup();
                sessions.push(tokio::spawn(serve(stream, greeting, handler)));
            }

            let mut observed = Vec::with_capacity(connections);
            for session in sessions {
                observed.push(session.await.expect("mock session task"));
            }
            observed
        });

        Self { port, task }
    }

    /// Returns `http://127.0.0.1:{port}`, as a user would configure it.
    pub(crate) fn server_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// Returns the WebSocket URL of `app_id`.
    pub(crate) fn app_url(&self, app_id: &str) -> Url {
        Url::parse(&format!("ws://127.0.0.1:{}/app/{app_id}", self.port)).expect("app url")
    }

    /// Waits for the client to go away and returns what was observed.
    pub(crate) async fn finish(self) -> MockSession {
        self.finish_all()
            .await
            .pop()
            .expect("mock engine served one session")
    }

    /// Waits for every client to go away; sessions are in accept order.
    pub(crate) async fn finish_all(self) -> Vec<MockSession> {
        timeout(FINISH_TIMEOUT, self.task)
            .await
            .expect("mock engine sessions should end")
            .expect("mock engine task")
    }
}

// ============================================================================
// Session Loop
// ============================================================================

/// Performs the handshake and answers requests until the client leaves.
async fn serve<H>(stream: TcpStream, greeting: Vec<Value>, mut handler: H) -> MockSession
where
    H: FnMut(&Value) -> Respond,
{
    let handshake = Arc::new(Mutex::new((String::new(), None::<String>)));
    let seen = Arc::clone(&handshake);
    let callback = move |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
        let cookie = request
            .headers()
            .get("cookie")
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        *seen.lock() = (request.uri().path().to_owned(), cookie);
        Ok(response)
    };

    let mut ws = accept_hdr_async(stream, callback).await.expect("handshake");
    let (path, cookie) = handshake.lock().clone();
    let mut session = MockSession {
        path,
        cookie,
        ..MockSession::default()
    };

    for frame in greeting {
        ws.send(Message::Text(frame.to_string().into())).await.expect("greeting");
    }

    'session: while let Some(message) = ws.next().await {
        match message {
            Ok(Message::Text(text)) => {
                let request: Value = serde_json::from_str(text.as_str()).unwrap_or(Value::Null);
                session.requests.push(request.clone());

                match handler(&request) {
                    Respond::Frames(frames) => {
                        for frame in frames {
                            if ws.send(Message::Text(frame.into())).await.is_err() {
                                break 'session;
                            }
                        }
                    }
                    Respond::Hangup => {
                        let _ = ws.close(None).await;
                        break 'session;
                    }
                }
            }
            Ok(Message::Close(_)) => session.closed_by_client = true,
            Ok(_) => {}
            Err(_) => break,
        }
    }

    session
}

// ============================================================================
// Scripted App
// ============================================================================

/// Handler emulating one app whose inventory is `infos`.
///
/// `OpenDoc` returns handle 1, open calls hand out handles from 100 up, and
/// `GetProperties` answers with `{"qInfo": {"qId", "qType"}}` for the
/// opened item.
pub(crate) fn qlik_app(infos: Vec<Value>) -> impl FnMut(&Value) -> Respond + Send + 'static {
    let mut opened: FxHashMap<i64, Value> = FxHashMap::default();
    let mut next_handle = 100;

    move |request: &Value| {
        let id = request["id"].clone();
        match request["method"].as_str().unwrap_or_default() {
            "OpenDoc" => Respond::frames(vec![json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": {"qReturn": {"qType": "Doc", "qHandle": 1}}
            })]),
            "GetAllInfos" => Respond::frames(vec![json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": {"qInfos": infos}
            })]),
            "GetDimension" | "GetMeasure" | "GetObject" => {
                let q_id = request["params"]["qId"].clone();
                let q_type = infos
                    .iter()
                    .find(|info| info["qId"] == q_id)
                    .map(|info| info["qType"].clone())
                    .unwrap_or(Value::Null);
                let handle = next_handle;
                next_handle += 1;
                opened.insert(handle, json!({"qId": q_id, "qType": q_type}));
                Respond::frames(vec![json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "result": {"qReturn": {"qType": "GenericObject", "qHandle": handle}}
                })])
            }
            "GetProperties" => {
                let info = request["handle"]
                    .as_i64()
                    .and_then(|handle| opened.get(&handle).cloned())
                    .unwrap_or(Value::Null);
                Respond::frames(vec![json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "result": {"qProp": {"qInfo": info}}
                })])
            }
            _ => Respond::nothing(),
        }
    }
}

/// Inventory entry `{"qId", "qType"}`.
pub(crate) fn info(q_id: &str, q_type: &str) -> Value {
    json!({"qId": q_id, "qType": q_type})
}
