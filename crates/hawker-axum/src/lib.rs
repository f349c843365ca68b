//! Axum adapter: routes, handlers, the WebSocket broadcast hub and the
//! composition root that wires the scheduler core to its ports.

pub mod bootstrap;
pub mod error;
pub mod handlers;
pub mod hub;
pub mod routes;
pub mod state;

pub use bootstrap::{bootstrap, start_server, AxumContext, CorsConfig, HawkerDeps};
pub use hub::Hub;
pub use routes::create_router;
