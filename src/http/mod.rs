//! HTTP serving subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware layers)
//!     → request.rs (request ID)
//!     → dispatch.rs (path matcher → method table → handler chain)
//!     → context.rs (Ctx flows through USE middleware, route middleware, handler)
//!     → handler.rs (errors mapped to a response by the scoped error handler)
//! ```

pub mod context;
pub mod dispatch;
pub mod handler;
pub mod request;
pub mod server;

pub use context::Ctx;
pub use handler::{ErrorHandler, Handler, HandlerError, HandlerResult};
pub use request::{MakeRequestUuidV4, RequestIdExt, X_REQUEST_ID};
pub use server::HttpServer;
