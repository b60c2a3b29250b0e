//! The axum server hosting the scenario routes and the mock dispatcher.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use axum::routing::{get, put};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

use super::handlers;
use super::state::ServerState;
use crate::config::ServerOptions;
use crate::error::Result;
use crate::scenario::ScenarioSet;

/// A running mock server.
///
/// The server runs in a background task until [`shutdown`](Self::shutdown)
/// is called or the value is dropped.
#[derive(Debug)]
pub struct MockServer {
    addr: SocketAddr,
    state: Arc<ServerState>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<std::io::Result<()>>,
}

impl MockServer {
    /// Start a server on `127.0.0.1` and a random free port, ignoring
    /// `options.port`.
    pub async fn start(scenarios: ScenarioSet, options: ServerOptions) -> Result<Self> {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await?;
        Self::with_listener(listener, scenarios, options)
    }

    /// Start a server on an already bound listener.
    pub fn with_listener(
        listener: TcpListener,
        scenarios: ScenarioSet,
        options: ServerOptions,
    ) -> Result<Self> {
        let state = Arc::new(ServerState::new(scenarios, options)?);
        let addr = listener.local_addr()?;
        let app = build_router(state.clone());
        let (shutdown, signal) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = signal.await;
                })
                .await
        });

        tracing::debug!(%addr, "mock server started");
        Ok(Self {
            addr,
            state,
            shutdown: Some(shutdown),
            handle,
        })
    }

    /// Serve on `0.0.0.0:{options.port}` until ctrl-c.
    pub async fn run(scenarios: ScenarioSet, options: ServerOptions) -> Result<()> {
        let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, options.port)).await?;
        let addr = listener.local_addr()?;
        let app = build_router(Arc::new(ServerState::new(scenarios, options)?));

        tracing::info!(%addr, "mock server listening");
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                if let Err(error) = tokio::signal::ctrl_c().await {
                    tracing::error!(%error, "failed to listen for ctrl-c");
                }
                tracing::info!("shutting down");
            })
            .await?;
        Ok(())
    }

    /// Base URL, e.g. `http://127.0.0.1:53211`.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// The state shared with the running server.
    pub fn state(&self) -> Arc<ServerState> {
        self.state.clone()
    }

    /// Stop accepting connections and wait for in-flight requests.
    pub async fn shutdown(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        match (&mut self.handle).await {
            Ok(Err(error)) => tracing::warn!(%error, "mock server stopped with an error"),
            Err(error) if error.is_panic() => tracing::error!(%error, "mock server task panicked"),
            _ => {}
        }
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        if self.shutdown.is_some() {
            self.handle.abort();
        }
    }
}

/// The application router: management routes, a dispatching fallback and CORS.
pub fn build_router(state: Arc<ServerState>) -> Router {
    let options = state.options().clone();

    Router::new()
        .route(&options.scenarios_path, get(handlers::list_scenarios))
        .route(&options.select_scenario_path, put(handlers::select_scenario))
        .route(&options.groups_path, get(handlers::list_groups))
        .fallback(handlers::dispatch)
        .layer(cors())
        .with_state(state)
}

/// Credentialed CORS for browser front-ends: the request's origin, method
/// and headers are mirrored back.
fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}
