//! DTZ practice proxy: rate-limited, timeout-guarded relay to the OpenAI API
//! for letter correction, dialogue chat and speech synthesis.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod schreiben;
pub mod security;
pub mod store;
pub mod upstream;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
