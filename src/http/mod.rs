//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, inbound handler)
//!     → request.rs (request ID, upstream URL and headers)
//!     → [dispatch queue → worker → upstream]
//!     → response.rs (rewrite headers, build buffered response)
//!     → Send to client
//! ```

pub mod headers;
pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestId, X_REQUEST_ID};
pub use response::PROXY_NAME;
pub use server::{HttpServer, ServerError};
