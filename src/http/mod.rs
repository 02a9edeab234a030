//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, span, metrics)
//!     → session layer (for /api routes)
//!     → handlers.rs (auth gate, provider call)
//!     → error.rs (status + generic JSON error body)
//!     → Send to client
//! ```

pub mod error;
pub mod handlers;
pub mod request;
pub mod server;

pub use error::ApiError;
pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer, ServerError};
