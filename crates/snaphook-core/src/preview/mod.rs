mod pages;
mod routes;
mod server;
mod state;

pub use {routes::router, server::PreviewServer, state::PreviewState};

/// Default loopback port for the preview server.
pub const DEFAULT_PREVIEW_PORT: u16 = 8765;
