//! ServerBuilder for fluent API to build HTTP servers

use super::handlers::AppState;
use super::router::{build_cascade_routes, health_routes};
use crate::cascade::{CascadeEngine, EngineOptions, RelationshipGraph};
use crate::config::CascadeConfig;
use crate::core::CollectionAccessor;
use crate::entities::DependentService;
use anyhow::{Result, anyhow};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Builder for creating HTTP servers exposing the cascade routes
///
/// Configurations added with [`with_config`](Self::with_config) are merged
/// in order. When none is given, the built-in relationship table is used.
///
/// # Example
///
/// ```ignore
/// let app = ServerBuilder::new()
///     .with_accessor(InMemoryStore::new())
///     .with_yaml_config("config/cascade.yaml")?
///     .build()?;
/// ```
pub struct ServerBuilder {
    accessor: Option<Arc<dyn CollectionAccessor>>,
    configs: Vec<CascadeConfig>,
    options: EngineOptions,
    custom_routes: Vec<Router>,
}

impl ServerBuilder {
    /// Create a new ServerBuilder
    pub fn new() -> Self {
        Self {
            accessor: None,
            configs: Vec::new(),
            options: EngineOptions::default(),
            custom_routes: Vec::new(),
        }
    }

    /// Set the collection accessor (required)
    pub fn with_accessor(mut self, accessor: impl CollectionAccessor + 'static) -> Self {
        self.accessor = Some(Arc::new(accessor));
        self
    }

    /// Set an already shared collection accessor
    pub fn with_shared_accessor(mut self, accessor: Arc<dyn CollectionAccessor>) -> Self {
        self.accessor = Some(accessor);
        self
    }

    /// Add a relationship configuration
    pub fn with_config(mut self, config: CascadeConfig) -> Self {
        self.configs.push(config);
        self
    }

    /// Load a relationship configuration from a YAML file
    pub fn with_yaml_config(self, path: &str) -> Result<Self> {
        let config = CascadeConfig::from_yaml_file(path)?;
        Ok(self.with_config(config))
    }

    /// Set engine options
    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    /// Add custom routes to the server
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// Build the dependent service without any HTTP layer
    ///
    /// Fails when no accessor was set or when the merged configuration does
    /// not validate.
    pub fn build_service(&mut self) -> Result<DependentService> {
        let accessor = self
            .accessor
            .take()
            .ok_or_else(|| anyhow!("CollectionAccessor is required. Call .with_accessor()"))?;

        let config = if self.configs.is_empty() {
            CascadeConfig::default_config()
        } else {
            CascadeConfig::merge(std::mem::take(&mut self.configs))
        };

        let graph = RelationshipGraph::from_config(&config)?;
        tracing::debug!(
            collections = graph.collections().count(),
            "Relationship graph loaded"
        );

        let engine = CascadeEngine::new(Arc::new(graph), accessor).with_options(self.options);
        Ok(DependentService::new(engine))
    }

    /// Build the final REST router
    ///
    /// This generates:
    /// - Health check routes
    /// - Custom routes
    /// - Cascade routes for every registered collection
    pub fn build(mut self) -> Result<Router> {
        let service = self.build_service()?;
        let state = AppState {
            service: Arc::new(service),
        };

        let mut app = health_routes();
        for custom_router in std::mem::take(&mut self.custom_routes) {
            app = app.merge(custom_router);
        }

        Ok(app
            .merge(build_cascade_routes(state))
            .layer(TraceLayer::new_for_http()))
    }

    /// Serve the application with graceful shutdown
    ///
    /// This will:
    /// - Bind to the provided address
    /// - Start serving requests
    /// - Handle SIGTERM and SIGINT (Ctrl+C) for graceful shutdown
    ///
    /// # Example
    ///
    /// ```ignore
    /// ServerBuilder::new()
    ///     .with_accessor(store)
    ///     .serve("127.0.0.1:3000").await?;
    /// ```
    pub async fn serve(self, addr: &str) -> Result<()> {
        let app = self.build()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for a shutdown signal (SIGTERM or Ctrl+C)
async fn shutdown_signal() {
    let ctrl_c = wait_for_signal("Ctrl+C", tokio::signal::ctrl_c());

    #[cfg(unix)]
    let terminate = wait_for_signal("SIGTERM", async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?
            .recv()
            .await;
        Ok::<(), std::io::Error>(())
    });

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}

/// Resolve when `signal` fires; never resolve if its handler can't be installed
async fn wait_for_signal(
    name: &str,
    signal: impl std::future::Future<Output = std::io::Result<()>>,
) {
    if let Err(e) = signal.await {
        tracing::error!("Failed to install {} handler: {}", name, e);
        std::future::pending::<()>().await;
    }
}
