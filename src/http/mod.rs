//! HTTP message plumbing and the server host.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum setup, tower layers, config reload)
//!     → request.rs (attributes attached out-of-band)
//!     → pipeline (boundary → routing → dispatch)
//!     → response.rs (fallback responses for failures)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{Attributes, RequestAttributesExt, ACTION_ATTRIBUTE, ROUTE_ATTRIBUTE};
pub use response::{PlainResponseFactory, Request, Response, ResponseFactory};
pub use server::HttpServer;
