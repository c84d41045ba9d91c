use crate::api;
use crate::config::ServerConfig;
use crate::error::{ErrorContext, Result};
use crate::issues::IssueStorage;
use crate::resource::IssueResource;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// Route path of the issue collection
pub const ISSUES_PATH: &str = "/api/issues/:project";

/// Build the application router over `resource`
pub fn router(resource: Arc<IssueResource>) -> Router {
    Router::new()
        .route(
            ISSUES_PATH,
            get(api::list_issues)
                .post(api::create_issue)
                .put(api::update_issue)
                .delete(api::delete_issue),
        )
        .with_state(resource)
}

/// A bound HTTP server for the issue API
pub struct IssueServer {
    listener: TcpListener,
    app: Router,
}

impl IssueServer {
    /// Bind the configured address and wire `storage` into the router
    ///
    /// Port 0 binds an ephemeral port; see [`IssueServer::local_addr`].
    pub async fn bind(config: &ServerConfig, storage: Arc<dyn IssueStorage>) -> Result<Self> {
        let address = config.bind_address();
        let listener = TcpListener::bind(&address)
            .await
            .with_context(|| format!("Failed to bind {}", address))?;

        let app = router(Arc::new(IssueResource::new(storage)))
            .layer(DefaultBodyLimit::max(config.max_body_bytes));

        Ok(Self { listener, app })
    }

    /// The address actually bound
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .context("Failed to read bound address")
    }

    /// Serve requests until `shutdown` is cancelled
    ///
    /// In-flight requests are allowed to finish before this returns.
    pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
        let address = self.local_addr()?;
        tracing::info!("Issue API listening on http://{}", address);

        axum::serve(self.listener, self.app)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
            .context("Issue API server failed")?;

        tracing::info!("Issue API on {} stopped", address);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issues::MemoryIssueStorage;

    fn ephemeral_config() -> ServerConfig {
        ServerConfig {
            port: 0,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_bind_ephemeral_port() {
        let server = IssueServer::bind(&ephemeral_config(), Arc::new(MemoryIssueStorage::new()))
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();
        assert!(addr.ip().is_loopback());
        assert_ne!(addr.port(), 0);
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel() {
        let server = IssueServer::bind(&ephemeral_config(), Arc::new(MemoryIssueStorage::new()))
            .await
            .unwrap();
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(server.run(shutdown.clone()));

        shutdown.cancel();
        let result = tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .expect("server did not stop")
            .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_bind_conflict_is_an_error() {
        let first = IssueServer::bind(&ephemeral_config(), Arc::new(MemoryIssueStorage::new()))
            .await
            .unwrap();
        let taken = ServerConfig {
            port: first.local_addr().unwrap().port(),
            ..Default::default()
        };

        let second = IssueServer::bind(&taken, Arc::new(MemoryIssueStorage::new())).await;
        assert!(second.is_err());
    }
}
