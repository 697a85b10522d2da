//! Messaging subsystem.
//!
//! # Data Flow
//! ```text
//! coordinator
//!     → publisher.rs ── command topic (key: source account) ──▶ validator.rs
//!                                                                    │
//! ingestor.rs ◀──── response topic ◀─────────────────────────────────┘
//!     → cache (resolve pending slot)
//! ```
//!
//! # Design Decisions
//! - bus.rs is the broker contract; memory.rs is the in-process adapter
//! - codec.rs frames records with a schema-registry header
//! - Handlers are idempotent and always ack, so broker redelivery is harmless

pub mod bus;
pub mod codec;
pub mod ingestor;
pub mod memory;
pub mod publisher;
pub mod validator;

pub use bus::{Ack, BusError, Delivery, MessageBus, Subscription};
pub use ingestor::{IngestResult, ResponseIngestor};
pub use memory::InMemoryBus;
pub use publisher::{CommandPublisher, PublishError};
pub use validator::{BasicTransferRule, TransferValidator, ValidationRule};
