//! Stub REST server recording the actions it receives.

use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::Router;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

#[derive(Debug, Clone)]
pub struct StubRequest {
    pub path: String,
    pub body: Value,
}

type Responder = Arc<dyn Fn(&StubRequest) -> (StatusCode, String) + Send + Sync>;

#[derive(Clone)]
struct StubState {
    requests: Arc<Mutex<Vec<StubRequest>>>,
    respond: Responder,
}

pub struct StubServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<StubRequest>>>,
    _shutdown: oneshot::Sender<()>,
}

impl StubServer {
    pub async fn start<F>(respond: F) -> Self
    where
        F: Fn(&StubRequest) -> (StatusCode, String) + Send + Sync + 'static,
    {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = StubState {
            requests: Arc::clone(&requests),
            respond: Arc::new(respond),
        };
        let app = Router::new().fallback(record).with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // dropping the sender resolves the receiver and stops the server
        let (shutdown, stopped) = oneshot::channel::<()>();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = stopped.await;
                })
                .await;
        });

        Self {
            base_url: format!("http://{addr}"),
            requests,
            _shutdown: shutdown,
        }
    }

    pub fn requests(&self) -> Vec<StubRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<StubRequest> {
        self.requests().into_iter().filter(|r| r.path == path).collect()
    }
}

async fn record(State(state): State<StubState>, uri: Uri, body: Bytes) -> (StatusCode, String) {
    let request = StubRequest {
        path: uri.path().to_string(),
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    };
    state.requests.lock().unwrap().push(request.clone());
    (state.respond)(&request)
}

pub fn ok(body: impl Into<String>) -> (StatusCode, String) {
    (StatusCode::OK, body.into())
}
