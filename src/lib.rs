pub mod config;
pub mod decode;
pub mod error;
pub mod io_struct;
pub mod relay;
pub mod server;

pub use config::RelayConfig;
pub use relay::Relay;
