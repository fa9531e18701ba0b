//! Bookstore Server - HTTP API for approximate catalogue lookups
//!
//! Exposes the lookup engine over JSON:
//!
//! - **Lookups**: books by number, title, publisher, keywords and authors;
//!   customers by online id, name, address or order id
//! - **Seeding**: insert books, customers and orders into the in-memory store
//! - **Health & Metrics**: liveness/readiness probes and Prometheus metrics
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! ## Public Endpoints (No Authentication)
//!
//! - `GET /` - API information
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe
//! - `GET /metrics` - Prometheus metrics
//!
//! ## Protected Endpoints (API Key Required)
//!
//! - `POST /api/v1/books/query` - Book lookup
//! - `POST /api/v1/customers/query` - Customer lookup
//! - `POST /api/v1/books` - Insert a book
//! - `POST /api/v1/customers` - Insert a customer
//! - `POST /api/v1/orders` - Insert an order
//! - `GET /api/v1/metadata` - Server metadata

pub mod config;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::{build_router, start_server};
pub use state::ServerState;
