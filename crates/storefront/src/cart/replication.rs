//! Detached replication of local cart changes to the remote cart.
//!
//! Each local mutation is applied first and returns immediately; the
//! matching remote call runs as its own tokio task whose outcome is only
//! logged. Tasks are never cancelled. Responses may arrive out of order,
//! which is harmless because the local cart decides what the user sees.

use std::future::Future;
use std::sync::Arc;

use ecomfront_core::ProductId;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::remote::{RemoteCart, RemoteError};

#[derive(Default)]
pub(crate) struct Replicator {
    remote: Option<Arc<dyn RemoteCart>>,
    in_flight: Vec<JoinHandle<()>>,
}

impl Replicator {
    pub(crate) fn attach(&mut self, remote: Arc<dyn RemoteCart>) {
        self.remote = Some(remote);
    }

    pub(crate) fn detach(&mut self) {
        self.remote = None;
    }

    pub(crate) const fn is_active(&self) -> bool {
        self.remote.is_some()
    }

    /// Spawn `call` against the attached remote. Does nothing when no user
    /// session is active or when called outside a tokio runtime.
    pub(crate) fn dispatch<F, Fut>(&mut self, operation: &'static str, product_id: &ProductId, call: F)
    where
        F: FnOnce(Arc<dyn RemoteCart>) -> Fut,
        Fut: Future<Output = Result<(), RemoteError>> + Send + 'static,
    {
        let Some(remote) = self.remote.clone() else {
            return;
        };
        let Ok(runtime) = Handle::try_current() else {
            warn!(operation, product_id = %product_id, "No async runtime, skipping remote cart sync");
            return;
        };

        self.in_flight.retain(|task| !task.is_finished());

        let product_id = product_id.clone();
        let request = call(remote);
        self.in_flight.push(runtime.spawn(async move {
            match request.await {
                Ok(()) => debug!(operation, product_id = %product_id, "Remote cart synced"),
                Err(e) => warn!(
                    operation,
                    product_id = %product_id,
                    error = %e,
                    "Remote cart sync failed, local cart kept"
                ),
            }
        }));
    }

    /// Wait for every in-flight replication task.
    pub(crate) async fn flush(&mut self) {
        for task in self.in_flight.drain(..) {
            if let Err(e) = task.await {
                warn!(error = %e, "Remote cart sync task did not complete");
            }
        }
    }

    pub(crate) fn in_flight(&self) -> usize {
        self.in_flight.iter().filter(|task| !task.is_finished()).count()
    }
}
