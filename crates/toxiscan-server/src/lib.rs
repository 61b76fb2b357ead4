//! toxiscan Server
//!
//! HTTP front end for the toxicity classifier: `GET /` for liveness,
//! `POST /predict` for scoring, `GET /metrics` for Prometheus.

pub mod cli;
pub mod config;
pub mod routes;
pub mod state;

pub use cli::Cli;
pub use config::ServerConfig;
pub use routes::create_router;
pub use state::AppState;
