//! Instance wiring.
//!
//! Mints the instance namespace, subscribes the response ingestor and builds
//! the coordinator and transfer pipeline on top of the given bus and cache.
//! The ingestor is subscribed before the instance is handed out, so no
//! response to a command it publishes can be missed.

use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::cache::{CacheClient, StateCache};
use crate::config::ServiceConfig;
use crate::lifecycle::Shutdown;
use crate::messaging::{BusError, MessageBus, ResponseIngestor};
use crate::payments::{PaymentProcessor, SentinelFallback, TransferService};
use crate::rendezvous::{InstanceNamespace, RendezvousCoordinator};
use crate::resilience::{CircuitBreaker, GuardedInvoker};

/// One running coordinator instance.
pub struct Instance {
    coordinator: Arc<RendezvousCoordinator>,
    service: TransferService,
    shutdown: Shutdown,
}

impl Instance {
    pub async fn start(
        config: &ServiceConfig,
        bus: Arc<dyn MessageBus>,
        cache: Arc<dyn CacheClient>,
        processor: Arc<dyn PaymentProcessor>,
    ) -> Result<Self, BusError> {
        let namespace = InstanceNamespace::generate();
        let mut shutdown = Shutdown::new();

        let states = StateCache::new(cache.clone(), config.cache.pending_ttl());
        let ingestor = ResponseIngestor::new(namespace.clone(), states, config);
        let task = ingestor.spawn(bus.clone(), shutdown.subscribe()).await?;
        shutdown.track(task);

        let coordinator = Arc::new(RendezvousCoordinator::from_config(
            config,
            namespace.clone(),
            bus,
            cache,
        ));
        let invoker = GuardedInvoker::new(
            CircuitBreaker::new(config.circuit_breaker.clone()),
            processor,
            Arc::new(SentinelFallback),
        );
        let service = TransferService::new(coordinator.clone(), invoker);

        info!(%namespace, "Rendezvous instance started");
        Ok(Self {
            coordinator,
            service,
            shutdown,
        })
    }

    pub fn namespace(&self) -> &InstanceNamespace {
        self.coordinator.namespace()
    }

    pub fn coordinator(&self) -> &Arc<RendezvousCoordinator> {
        &self.coordinator
    }

    pub fn service(&self) -> &TransferService {
        &self.service
    }

    /// Additional background task to stop with this instance.
    pub fn track(&mut self, task: tokio::task::JoinHandle<()>) {
        self.shutdown.track(task);
    }

    pub fn shutdown_signal(&self) -> tokio::sync::broadcast::Receiver<()> {
        self.shutdown.subscribe()
    }

    /// Stop the ingestor and any tracked tasks.
    pub async fn stop(self, deadline: Duration) {
        let namespace = self.coordinator.namespace().clone();
        self.shutdown.drain(deadline).await;
        info!(%namespace, "Rendezvous instance stopped");
    }
}
