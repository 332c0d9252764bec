use clap::Parser;
use duckchat_relay_rs::config::{DEFAULT_MODEL, DEFAULT_MODELS, DEFAULT_UPSTREAM_URL, RelayConfig};
use duckchat_relay_rs::server;

#[derive(Parser, Debug)]
#[command(name = "duckchat-relay")]
#[command(about = "Stateless HTTP relay that turns a single POST into an upstream chat session")]
#[command(long_about = r#"
Stateless HTTP relay that turns a single POST into an upstream chat session

Usage:
  duckchat-relay --port 8787

  curl -X POST http://127.0.0.1:8787/chat/ \
    -d '{"prompt":"Hello","model":"gpt-4o-mini","history":"[]"}'
"#)]
struct CliArgs {
    /// Host address to bind the relay server
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the relay server
    #[arg(long, default_value_t = 8787)]
    port: u16,

    /// Base URL of the upstream chat service
    #[arg(long, default_value = DEFAULT_UPSTREAM_URL)]
    upstream_url: String,

    /// Model identifiers accepted and advertised by the relay
    #[arg(long, num_args = 1.., default_values_t = DEFAULT_MODELS.iter().map(|m| m.to_string()).collect::<Vec<_>>())]
    models: Vec<String>,

    /// Model used when a request does not name one
    #[arg(long, default_value = DEFAULT_MODEL)]
    default_model: String,

    /// User-Agent sent to the upstream
    #[arg(long, default_value = "Mozilla/5.0")]
    user_agent: String,

    /// Referer sent to the upstream
    #[arg(long, default_value = "https://duckduckgo.com/")]
    referer: String,

    /// Timeout in seconds for each upstream call
    #[arg(long, default_value_t = 30)]
    request_timeout_secs: u64,

    /// Maximum request body size in bytes
    #[arg(long, default_value_t = 1024 * 1024)]
    max_payload_size: usize,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,

    /// Shorthand for --log-level debug
    #[arg(long, default_value_t = false)]
    verbose: bool,
}

impl CliArgs {
    fn into_config(self) -> RelayConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else {
            self.log_level
        };
        RelayConfig {
            host: self.host,
            port: self.port,
            upstream_url: self.upstream_url,
            models: self.models,
            default_model: self.default_model,
            user_agent: self.user_agent,
            referer: self.referer,
            request_timeout_secs: self.request_timeout_secs,
            max_payload_size: self.max_payload_size,
            log_level,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let config = CliArgs::parse().into_config().validate()?;
    actix_web::rt::System::new().block_on(server::startup(config))?;
    Ok(())
}
