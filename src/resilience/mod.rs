//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Rendezvous await loop:
//!     → backoff.rs (delay before each cache poll, bounded attempts)
//!
//! Payment processing:
//!     → guarded.rs (GuardedInvoker)
//!     → circuit_breaker.rs (track failures, open circuit, half-open trial)
//!     → fallback outcome when open or failed
//! ```
//!
//! # Design Decisions
//! - Delays are tokio timers; no thread sleeps while waiting
//! - Circuit breaker is per named operation and process-local
//! - The guarded call never surfaces downstream errors

pub mod backoff;
pub mod circuit_breaker;
pub mod guarded;

pub use backoff::PollPolicy;
pub use circuit_breaker::{CircuitBreaker, CircuitState};
pub use guarded::GuardedInvoker;
