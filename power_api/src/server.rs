//! HTTP server wrapper.

use std::net::SocketAddr;

use tracing::info;

use crate::routes;
use crate::state::ApiState;

/// The power API server.
pub struct ApiServer {
    addr: SocketAddr,
    state: ApiState,
}

impl ApiServer {
    pub fn new(addr: SocketAddr, state: ApiState) -> Self {
        Self { addr, state }
    }

    /// Bind and serve until the process is terminated.
    pub async fn run(self) -> std::io::Result<()> {
        let app = routes::router(self.state);
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        info!("power API listening on {}", listener.local_addr()?);
        axum::serve(listener, app).await
    }
}
