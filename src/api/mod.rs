//! HTTP API (`keystone-te-server`)

pub mod handlers;
pub mod server;

pub use server::{router, run_api_server, ApiConfig, AppState};
