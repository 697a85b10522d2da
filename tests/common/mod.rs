//! Shared harness for rendezvous integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use transfer_rendezvous::cache::{CacheClient, CacheError, InMemoryCache};
use transfer_rendezvous::config::{BackoffStrategy, ServiceConfig};
use transfer_rendezvous::messaging::{codec, MessageBus, InMemoryBus};
use transfer_rendezvous::payments::{DownstreamProcessingError, PaymentProcessor};
use transfer_rendezvous::rendezvous::{TransferRequest, ValidationCommand, ValidationResponse};

/// Config with a fixed poll delay.
pub fn fixed_config(max_attempts: u32, delay_ms: u64) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.rendezvous.max_attempts = max_attempts;
    config.rendezvous.base_delay_ms = delay_ms;
    config.rendezvous.max_delay_ms = delay_ms;
    config.rendezvous.strategy = BackoffStrategy::Fixed;
    config
}

pub fn transfer(from: &str, to: &str, amount: Decimal) -> TransferRequest {
    TransferRequest {
        from_account: from.to_string(),
        to_account: to.to_string(),
        amount,
    }
}

/// Start a programmable remote validator.
///
/// For each command, `f` returns the verdicts to publish (empty = stay silent),
/// each sent after the returned delay.
pub async fn start_programmable_validator<F, Fut>(
    bus: &InMemoryBus,
    config: &ServiceConfig,
    f: F,
) -> JoinHandle<()>
where
    F: Fn(ValidationCommand) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (Duration, Vec<bool>)> + Send + 'static,
{
    let mut commands = bus
        .subscribe(&config.messaging.command_topic, "test-validators")
        .await
        .unwrap();
    let bus = bus.clone();
    let messaging = config.messaging.clone();
    let f = Arc::new(f);

    tokio::spawn(async move {
        while let Some(delivery) = commands.recv().await {
            let command: ValidationCommand =
                codec::decode(messaging.command_schema_id, &delivery.payload).unwrap();
            let _ = commands.ack(&delivery).await;

            let bus = bus.clone();
            let messaging = messaging.clone();
            let f = f.clone();
            tokio::spawn(async move {
                let id = command.id;
                let (delay, verdicts) = f(command).await;
                tokio::time::sleep(delay).await;
                for valid in verdicts {
                    let frame =
                        codec::encode(messaging.response_schema_id, &ValidationResponse { id, valid })
                            .unwrap();
                    bus.publish(&messaging.response_topic, &id.to_string(), frame)
                        .await
                        .unwrap();
                }
            });
        }
    })
}

/// Cache wrapper that fails or stalls selected operations.
#[derive(Clone, Default)]
pub struct FlakyCache {
    pub inner: InMemoryCache,
    pub failing_gets: Arc<AtomicU32>,
    pub fail_sets: Arc<AtomicBool>,
    pub fail_deletes: Arc<AtomicBool>,
    pub cas_delay_ms: Arc<AtomicU32>,
    pub delete_delay_ms: Arc<AtomicU32>,
    pub gets: Arc<AtomicU32>,
}

impl FlakyCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheClient for FlakyCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failing_gets.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failing_gets.store(remaining - 1, Ordering::SeqCst);
            return Err(CacheError::Unavailable("injected get failure".to_string()));
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), CacheError> {
        if self.fail_sets.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable("injected set failure".to_string()));
        }
        self.inner.set(key, value, ttl).await
    }

    async fn compare_and_set(
        &self,
        key: &str,
        expected: &str,
        value: String,
    ) -> Result<bool, CacheError> {
        let delay = self.cas_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay as u64)).await;
        }
        self.inner.compare_and_set(key, expected, value).await
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        let delay = self.delete_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay as u64)).await;
        }
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable("injected delete failure".to_string()));
        }
        self.inner.delete(key).await
    }
}

/// Payment processor that fails until told otherwise.
#[derive(Default)]
pub struct SwitchableProcessor {
    pub calls: AtomicU32,
    pub healthy: AtomicBool,
}

#[async_trait]
impl PaymentProcessor for SwitchableProcessor {
    async fn process(&self, _request: &TransferRequest) -> Result<String, DownstreamProcessingError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.healthy.load(Ordering::SeqCst) {
            Ok(format!("payment-{}", call))
        } else {
            Err(DownstreamProcessingError("processPayment ex".to_string()))
        }
    }
}

/// Wait until `condition` holds or the timeout elapses.
pub async fn eventually<F: Fn() -> bool>(timeout: Duration, condition: F) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
