//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Mint namespace → Subscribe ingestor → Build coordinator and pipeline
//!
//! Shutdown (shutdown.rs):
//!     Broadcast stop → Consumers leave their loops → Await tasks (bounded)
//! ```
//!
//! # Design Decisions
//! - The namespace is regenerated on every start; in-flight rendezvous do not
//!   survive a restart
//! - Shutdown has a deadline: stuck tasks are aborted

pub mod shutdown;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::Instance;
