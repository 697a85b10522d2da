//! Transfer validation rendezvous.
//!
//! A caller publishes a validation command on a bus; a remote validator
//! answers on another topic; the answer reaches the caller through a shared
//! cache slot keyed by instance namespace and correlation id.

pub mod cache;
pub mod config;
pub mod lifecycle;
pub mod messaging;
pub mod observability;
pub mod payments;
pub mod rendezvous;
pub mod resilience;

pub use config::ServiceConfig;
pub use lifecycle::Instance;
pub use rendezvous::RendezvousCoordinator;
