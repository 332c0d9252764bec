use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::io_struct::ChatReqInput;
use crate::relay::Relay;
use actix_web::http::header::ContentType;
use actix_web::{HttpRequest, HttpResponse, HttpServer, error, web};
use log::{error, info};
use serde_json::Value;
use std::io::Write;

pub const CHAT_ROUTES: &[&str] = &["/chat/", "/duckchat/v1/chat"];

/// Every relay response is JSON, readable cross-origin.
pub fn json_response(payload: &Value) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::json())
        .insert_header(("Access-Control-Allow-Origin", "*"))
        .json(payload)
}

// Unparseable or oversized bodies get the same answer as a bad history.
fn json_error_handler(err: error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    error!("JSON payload error: {}", err);
    RelayError::MalformedRequest {
        reason: err.to_string(),
    }
    .into()
}

pub async fn chat(req: web::Json<ChatReqInput>, relay: web::Data<Relay>) -> HttpResponse {
    let req = req.into_inner();
    let model = req
        .model
        .unwrap_or_else(|| relay.config().default_model.clone());
    let history = req.history.unwrap_or_default();
    let result = relay.handle(&req.prompt, history, &model).await;
    if !result.is_success() {
        info!("Chat request for model {} ended with status {}", model, result.status());
    }
    json_response(&result.to_payload())
}

pub async fn not_found(relay: web::Data<Relay>) -> HttpResponse {
    let err = RelayError::RouteNotFound {
        models: relay.config().models.clone(),
    };
    json_response(&err.to_payload())
}

/// Register the chat aliases and the catch-all 404 handler.
pub fn configure_routes(cfg: &mut web::ServiceConfig, max_payload_size: usize) {
    cfg.app_data(
        web::JsonConfig::default()
            .limit(max_payload_size)
            .content_type_required(false)
            .error_handler(json_error_handler),
    );
    for path in CHAT_ROUTES {
        cfg.service(
            web::resource(*path)
                .route(web::post().to(chat))
                .default_service(web::to(not_found)),
        );
    }
    cfg.default_service(web::to(not_found));
}

pub fn init_logging(level: log::LevelFilter) {
    let result = env_logger::Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} - {} - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, level)
        .try_init();
    if result.is_err() {
        log::debug!("Logger already initialized");
    }
}

pub async fn startup(config: RelayConfig) -> std::io::Result<()> {
    let level = config
        .log_level
        .as_deref()
        .and_then(|l| l.parse().ok())
        .unwrap_or(log::LevelFilter::Info);
    init_logging(level);

    let relay = Relay::new(config.clone()).map_err(|e| std::io::Error::other(e.to_string()))?;
    let app_state = web::Data::new(relay);
    let max_payload_size = config.max_payload_size;

    info!("Relaying to upstream {}", config.upstream_url);
    info!("Models: {:?} (default {})", config.models, config.default_model);
    info!("Starting server at {}:{}", config.host, config.port);

    HttpServer::new(move || {
        actix_web::App::new()
            .wrap(actix_web::middleware::Logger::default())
            .app_data(app_state.clone())
            .configure(|cfg| configure_routes(cfg, max_payload_size))
    })
    .bind((config.host, config.port))?
    .run()
    .await?;

    std::io::Result::Ok(())
}
