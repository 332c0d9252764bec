use actix_web::dev::ServerHandle;
use actix_web::{App, HttpRequest, HttpResponse, HttpServer, web};
use duckchat_relay_rs::config::{CHAT_PATH, STATUS_PATH};
use duckchat_relay_rs::relay::{VQD_HASH_HEADER, VQD_TOKEN_HEADER};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

pub const MOCK_TOKEN: &str = "4-mock-token";
pub const MOCK_HASH: &str = "mock-hash";

/// Configuration for mock upstream behavior
#[derive(Clone)]
pub struct MockUpstreamConfig {
    pub chat_status: u16,
    pub chat_body: String,
    pub issue_credentials: bool,
    pub response_delay_ms: u64,
    pub status_delay_ms: u64,
}

impl MockUpstreamConfig {
    pub fn streaming(fragments: &[&str]) -> Self {
        let mut body = String::new();
        for fragment in fragments {
            let frame = serde_json::json!({
                "role": "assistant",
                "message": fragment,
                "model": "gpt-4o-mini",
            });
            body.push_str(&format!("data: {}\n\n", frame));
        }
        body.push_str("data: [DONE]\n");
        Self::raw(200, &body)
    }

    pub fn raw(chat_status: u16, chat_body: &str) -> Self {
        Self {
            chat_status,
            chat_body: chat_body.to_string(),
            issue_credentials: true,
            response_delay_ms: 0,
            status_delay_ms: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecordedChat {
    pub headers: HashMap<String, String>,
    pub body: Value,
}

#[derive(Default)]
struct Recorded {
    status_calls: usize,
    chat_calls: Vec<RecordedChat>,
}

struct MockState {
    config: MockUpstreamConfig,
    recorded: Arc<RwLock<Recorded>>,
}

/// Stand-in for the upstream status and chat endpoints.
pub struct MockUpstream {
    config: MockUpstreamConfig,
    recorded: Arc<RwLock<Recorded>>,
    handle: Option<ServerHandle>,
}

impl MockUpstream {
    pub fn new(config: MockUpstreamConfig) -> Self {
        Self {
            config,
            recorded: Arc::new(RwLock::new(Recorded::default())),
            handle: None,
        }
    }

    /// Start on an ephemeral port and return the base URL.
    pub async fn start(&mut self) -> Result<String, Box<dyn std::error::Error>> {
        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();

        let state = web::Data::new(MockState {
            config: self.config.clone(),
            recorded: self.recorded.clone(),
        });
        let server = HttpServer::new(move || {
            App::new()
                .app_data(state.clone())
                .route(STATUS_PATH, web::get().to(status_handler))
                .route(CHAT_PATH, web::post().to(chat_handler))
        })
        .workers(1)
        .disable_signals()
        .listen(listener)?
        .run();

        self.handle = Some(server.handle());
        actix_web::rt::spawn(server);

        Ok(format!("http://127.0.0.1:{}", port))
    }

    pub async fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.stop(false).await;
        }
    }

    pub async fn status_calls(&self) -> usize {
        self.recorded.read().await.status_calls
    }

    pub async fn chat_calls(&self) -> Vec<RecordedChat> {
        self.recorded.read().await.chat_calls.clone()
    }
}

async fn status_handler(state: web::Data<MockState>) -> HttpResponse {
    state.recorded.write().await.status_calls += 1;
    if state.config.status_delay_ms > 0 {
        tokio::time::sleep(tokio::time::Duration::from_millis(
            state.config.status_delay_ms,
        ))
        .await;
    }
    let mut resp = HttpResponse::Ok();
    if state.config.issue_credentials {
        resp.insert_header((VQD_TOKEN_HEADER, MOCK_TOKEN));
        resp.insert_header((VQD_HASH_HEADER, MOCK_HASH));
    }
    resp.finish()
}

async fn chat_handler(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<MockState>,
) -> HttpResponse {
    let headers = req
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.to_string(), v.to_string()))
        })
        .collect();
    let body = serde_json::from_slice(&body).unwrap_or(Value::Null);
    state
        .recorded
        .write()
        .await
        .chat_calls
        .push(RecordedChat { headers, body });

    if state.config.response_delay_ms > 0 {
        tokio::time::sleep(tokio::time::Duration::from_millis(
            state.config.response_delay_ms,
        ))
        .await;
    }

    let status = actix_web::http::StatusCode::from_u16(state.config.chat_status)
        .unwrap_or(actix_web::http::StatusCode::INTERNAL_SERVER_ERROR);
    HttpResponse::build(status)
        .content_type("text/event-stream")
        .body(state.config.chat_body.clone())
}
