//! Events delivered to worker handlers

use std::future::Future;

use tokio::task::JoinHandle;
use tracing::warn;

use crate::domain::http::ProxyRequest;

/// Delivered to `on_install`
#[derive(Debug, Default)]
pub struct InstallEvent {
    skip_waiting: bool,
}

impl InstallEvent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Promote the worker as soon as install completes
    pub fn skip_waiting(&mut self) {
        self.skip_waiting = true;
    }

    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting
    }
}

/// Delivered to `on_activate`
#[derive(Debug, Default)]
pub struct ActivateEvent {
    claim_clients: bool,
}

impl ActivateEvent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take control of clients that connected before activation
    pub fn claim_clients(&mut self) {
        self.claim_clients = true;
    }

    pub fn claim_requested(&self) -> bool {
        self.claim_clients
    }
}

/// Delivered to `on_fetch` for every intercepted request
///
/// Work registered with `wait_until` keeps running after the response has
/// been handed back to the caller.
#[derive(Debug)]
pub struct FetchEvent {
    request: ProxyRequest,
    pending: Vec<JoinHandle<()>>,
}

impl FetchEvent {
    pub fn new(request: ProxyRequest) -> Self {
        Self {
            request,
            pending: Vec::new(),
        }
    }

    pub fn request(&self) -> &ProxyRequest {
        &self.request
    }

    /// Spawns background work tied to this event
    pub fn wait_until<F>(&mut self, work: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.pending.push(tokio::spawn(work));
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Waits for all background work registered on this event
    pub async fn settled(self) {
        for handle in self.pending {
            if let Err(e) = handle.await {
                warn!(error = %e, "Background task of fetch event did not complete");
            }
        }
    }
}
