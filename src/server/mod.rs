//! Reference REST backend for the incident and patient resources
//!
//! Serves the same contract the client side consumes: paged lists with an
//! `x-total-count` header, `field.equals` / `field.contains` predicates, a
//! `/count` endpoint, JSON bodies on create/update and merge-patch on
//! partial update. Records live in [`InMemoryRepository`]s.
//!
//! ```rust,ignore
//! Backend::new().serve("127.0.0.1:8080").await?;
//! ```

pub mod error;
pub mod handlers;
pub mod repository;

pub use error::ApiError;
pub use repository::InMemoryRepository;

use crate::core::entity::Record;
use crate::entities::{Incident, Patient};
use anyhow::Result;
use axum::Json;
use axum::Router;
use axum::routing::get;
use handlers::Repo;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// CRUD routes of one record type under `{prefix}/{resource}`
pub fn resource_routes<R: Record>(prefix: &str, repo: Repo<R>) -> Router {
    let base = format!("{}/{}", prefix.trim_end_matches('/'), R::resource_name());

    Router::new()
        .route(&base, get(handlers::list::<R>).post(handlers::create::<R>))
        .route(&format!("{}/count", base), get(handlers::count::<R>))
        .route(
            &format!("{}/{{id}}", base),
            get(handlers::get_one::<R>)
                .put(handlers::update::<R>)
                .patch(handlers::partial_update::<R>)
                .delete(handlers::delete::<R>),
        )
        .with_state(repo)
}

/// In-memory backend holding both resources
#[derive(Clone, Default)]
pub struct Backend {
    incidents: Arc<InMemoryRepository<Incident>>,
    patients: Arc<InMemoryRepository<Patient>>,
}

impl Backend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn incidents(&self) -> &Arc<InMemoryRepository<Incident>> {
        &self.incidents
    }

    pub fn patients(&self) -> &Arc<InMemoryRepository<Patient>> {
        &self.patients
    }

    /// Build the complete router: health check plus both resources under `/api`
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(health_check))
            .merge(resource_routes("/api", self.incidents.clone()))
            .merge(resource_routes("/api", self.patients.clone()))
            .layer(TraceLayer::new_for_http())
    }

    /// Serve on `addr` until Ctrl+C or SIGTERM
    pub async fn serve(self, addr: &str) -> Result<()> {
        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Backend listening on {}", addr);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Backend shutdown complete");
        Ok(())
    }
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "ipms-backend"
    }))
}

/// Wait for SIGTERM or Ctrl+C
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

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
