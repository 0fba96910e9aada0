//! Pengu Server
//!
//! HTTP backend for the Pengu weather app.
//!
//! # Features
//!
//! - AI weather analysis through a cascading multi-provider resolver
//! - JWT authentication with an in-memory user store
//! - Authenticated proxy for the PurpleAir air-quality API
//! - City search and current conditions via Open-Meteo
//! - In-memory feedback collection

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::Config;
pub use routes::create_router;
pub use state::AppState;
