//! Transfer payment pipeline.
//!
//! # Data Flow
//! ```text
//! TransferRequest
//!     → service.rs (validate via rendezvous)
//!     → resilience::GuardedInvoker (circuit breaker)
//!     → processor.rs (downstream capability or fallback)
//!     → TransferReceipt
//! ```

pub mod processor;
pub mod service;
pub mod types;

pub use processor::{Fallback, FallbackCause, LoggingProcessor, PaymentProcessor, SentinelFallback};
pub use service::TransferService;
pub use types::{DownstreamProcessingError, ProcessingOutcome, TransferReceipt};
