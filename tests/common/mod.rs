// These modules are used by several test binaries
#![allow(dead_code)]

pub mod mock_upstream;

use actix_web::dev::ServiceResponse;
use actix_web::{App, test as actix_test, web};
use duckchat_relay_rs::server::configure_routes;
use duckchat_relay_rs::{Relay, RelayConfig};

pub fn test_config(upstream_url: &str) -> RelayConfig {
    RelayConfig {
        upstream_url: upstream_url.to_string(),
        request_timeout_secs: 5,
        ..Default::default()
    }
    .validate()
    .expect("test config must be valid")
}

pub fn create_relay(config: RelayConfig) -> web::Data<Relay> {
    web::Data::new(Relay::new(config).expect("Failed to create relay in test"))
}

/// Route one request through a freshly initialized relay app.
pub async fn call_relay(
    relay: web::Data<Relay>,
    req: actix_test::TestRequest,
) -> ServiceResponse {
    let max_payload_size = relay.config().max_payload_size;
    let app = actix_test::init_service(
        App::new()
            .app_data(relay)
            .configure(|cfg| configure_routes(cfg, max_payload_size)),
    )
    .await;
    actix_test::call_service(&app, req.to_request()).await
}

/// An address nothing is listening on.
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}
