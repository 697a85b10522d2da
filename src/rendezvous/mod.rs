//! Request/reply correlation over a bus and a shared cache.
//!
//! The originator and the responder are different processes connected only by
//! topics and the store, so the answer is picked up by polling a namespaced
//! cache slot rather than through a reply channel.

pub mod coordinator;
pub mod error;
pub mod types;

pub use coordinator::RendezvousCoordinator;
pub use error::{RendezvousError, RendezvousResult};
pub use types::{
    CacheKey, CorrelationId, InstanceNamespace, RequestId, ResponseState, TransferRequest,
    ValidationCommand, ValidationOutcome, ValidationResponse,
};
