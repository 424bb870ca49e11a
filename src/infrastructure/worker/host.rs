//! Worker host: drives the lifecycle and routes intercepted requests

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::domain::{
    ActivateEvent, DomainError, FetchEvent, FetchResponse, Fetcher, InstallEvent, ProxyRequest,
    ServiceWorker, WorkerState,
};

/// Snapshot of the hosted worker
#[derive(Debug, Clone, Serialize)]
pub struct WorkerStatus {
    pub state: WorkerState,
    pub cache_name: String,
    pub skip_waiting: bool,
    pub clients_claimed: bool,
}

#[derive(Debug)]
struct Lifecycle {
    state: WorkerState,
    skip_waiting: bool,
    clients_claimed: bool,
}

/// Hosts a single worker
///
/// Until the worker is active, requests go straight to the network.
#[derive(Debug)]
pub struct WorkerHost {
    worker: Arc<dyn ServiceWorker>,
    fetcher: Arc<dyn Fetcher>,
    cache_name: String,
    lifecycle: RwLock<Lifecycle>,
}

impl WorkerHost {
    pub fn new(worker: Arc<dyn ServiceWorker>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            cache_name: worker.cache_name().to_string(),
            worker,
            fetcher,
            lifecycle: RwLock::new(Lifecycle {
                state: WorkerState::Registered,
                skip_waiting: false,
                clients_claimed: false,
            }),
        }
    }

    pub async fn state(&self) -> WorkerState {
        self.lifecycle.read().await.state
    }

    pub async fn status(&self) -> WorkerStatus {
        let lifecycle = self.lifecycle.read().await;

        WorkerStatus {
            state: lifecycle.state,
            cache_name: self.cache_name.clone(),
            skip_waiting: lifecycle.skip_waiting,
            clients_claimed: lifecycle.clients_claimed,
        }
    }

    async fn transition(&self, next: WorkerState) -> Result<(), DomainError> {
        let mut lifecycle = self.lifecycle.write().await;

        if !lifecycle.state.can_transition_to(next) {
            return Err(DomainError::lifecycle(format!(
                "{} -> {}",
                lifecycle.state, next
            )));
        }

        info!(from = %lifecycle.state, to = %next, cache = %self.cache_name, "Worker state changed");
        lifecycle.state = next;
        Ok(())
    }

    /// Installs and activates the worker, awaiting each handler in turn
    ///
    /// A handler error makes the worker redundant and is returned.
    pub async fn start(&self) -> Result<(), DomainError> {
        self.transition(WorkerState::Installing).await?;

        let mut install = InstallEvent::new();
        if let Err(e) = self.worker.on_install(&mut install).await {
            error!(error = %e, "Worker install failed");
            self.transition(WorkerState::Redundant).await?;
            return Err(e);
        }

        self.lifecycle.write().await.skip_waiting = install.skip_waiting_requested();
        self.transition(WorkerState::Waiting).await?;

        // No previous worker controls any client in this host, so waiting ends at once
        self.transition(WorkerState::Activating).await?;

        let mut activate = ActivateEvent::new();
        if let Err(e) = self.worker.on_activate(&mut activate).await {
            error!(error = %e, "Worker activation failed");
            self.transition(WorkerState::Redundant).await?;
            return Err(e);
        }

        self.lifecycle.write().await.clients_claimed = activate.claim_requested();
        self.transition(WorkerState::Active).await
    }

    /// Serves one intercepted request
    pub async fn dispatch(&self, request: ProxyRequest) -> Result<FetchResponse, DomainError> {
        if !self.state().await.can_intercept_fetch() {
            debug!(url = %request.url, "No active worker, passing through");
            return self.fetcher.fetch(&request).await.map(FetchResponse::network);
        }

        // Dropping the event detaches its background work, it keeps running
        let mut event = FetchEvent::new(request);
        self.worker.on_fetch(&mut event).await
    }
}
