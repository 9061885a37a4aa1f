//! Server assembly and lifecycle

use crate::routes::{self, AppState};
use scribe_core::{ComposePipeline, ScribeConfig};
use scribe_llm::ChatClient;
use scribe_store::MemoryStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

/// Wire the pipeline from configuration
///
/// A missing API key leaves the generation service unset; the server still
/// starts and compose requests answer 500 until it is configured.
#[must_use]
pub fn build_pipeline(config: ScribeConfig) -> ComposePipeline {
    let mut pipeline = ComposePipeline::new(config.clone());

    match ChatClient::from_config(&config.generation) {
        Ok(client) => {
            info!(
                model = client.model(),
                endpoint = client.endpoint(),
                "generation service configured"
            );
            pipeline = pipeline.with_generation(Arc::new(client));
        }
        Err(e) => warn!(error = %e, "generation service not configured"),
    }

    if config.storage.enabled {
        let store = Arc::new(MemoryStore::new());
        pipeline = pipeline
            .with_brand_store(store.clone())
            .with_document_store(store);
        info!("in-memory store enabled");
    } else {
        info!("storage disabled, documents will not be persisted");
    }

    pipeline
}

/// Serve until Ctrl-C
///
/// # Errors
/// Fails if the address cannot be bound
pub async fn run(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let state = Arc::new(state);
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
        info!("shutdown signal received");
    };
    let (bound, server) =
        warp::serve(routes::routes(state)).try_bind_with_graceful_shutdown(addr, shutdown)?;

    info!(version = scribe_core::VERSION, "listening on http://{bound}");
    server.await;
    info!("server stopped");
    Ok(())
}
