pub mod config;
pub mod error;
pub mod ollama;
pub mod output;
pub mod pod;
pub mod proxy;
pub mod resolver;
pub mod server;
pub mod telemetry;
