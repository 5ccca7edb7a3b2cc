use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::thread;

use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use reqwest::blocking::Client;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// One request as the loopback server saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub uri: String,
    pub headers: HeaderMap,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).expect("request body is json")
    }

    /// `http://host:port` the client used to reach us.
    pub fn origin(&self) -> String {
        format!("http://{}", self.header("host").expect("host header"))
    }
}

pub struct Reply {
    status: StatusCode,
    content_type: &'static str,
    body: String,
}

impl Reply {
    pub fn json(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.to_string(),
        }
    }

    pub fn event_stream(body: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            content_type: "text/event-stream",
            body: body.into(),
        }
    }
}

type Responder = Arc<dyn Fn(&RecordedRequest) -> Reply + Send + Sync>;

#[derive(Clone)]
struct ServerState {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    respond: Responder,
}

async fn record_and_reply(
    State(state): State<ServerState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    let req = RecordedRequest {
        method,
        uri: uri.to_string(),
        headers,
        body,
    };
    let reply = (state.respond)(&req);
    state.requests.lock().expect("requests lock").push(req);

    (
        reply.status,
        [(header::CONTENT_TYPE, reply.content_type)],
        reply.body,
    )
        .into_response()
}

/// Scripted HTTP server on 127.0.0.1 with its own runtime thread, so the
/// blocking clients can be driven from plain `#[test]`s.
pub struct TestServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    pub fn start(respond: impl Fn(&RecordedRequest) -> Reply + Send + Sync + 'static) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = ServerState {
            requests: requests.clone(),
            respond: Arc::new(respond),
        };
        let (addr_tx, addr_rx) = std::sync::mpsc::channel::<SocketAddr>();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("test server runtime");

            rt.block_on(async move {
                let listener = TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind test server listener");
                addr_tx
                    .send(listener.local_addr().expect("test listener local addr"))
                    .expect("report test server address");

                let app = Router::new().fallback(record_and_reply).with_state(state);
                axum::serve(listener, app)
                    .with_graceful_shutdown(async {
                        let _ = shutdown_rx.await;
                    })
                    .await
                    .expect("run test server");
            });
        });

        let address = addr_rx.recv().expect("test server address");
        Self {
            base_url: format!("http://{address}"),
            requests,
            shutdown: Some(shutdown_tx),
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// Client that never routes loopback traffic through an env proxy.
pub fn loopback_client() -> Client {
    Client::builder()
        .no_proxy()
        .build()
        .expect("loopback client")
}
