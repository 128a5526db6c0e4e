//! Maternal Risk Service
//!
//! HTTP front end over the fitted artifacts produced by `risk-trainer`.
//! Exposes `POST /predict` for single-record inference and `GET /health`.

pub mod config;
pub mod server;

pub use config::ServiceConfig;
pub use server::{build_router, start_server, AppState};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
