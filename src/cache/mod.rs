//! Shared rendezvous store.
//!
//! # Data Flow
//! ```text
//! coordinator ── put_pending / get / remove ──┐
//!                                             ├─▶ state.rs (typed, JSON) ─▶ client.rs (CacheClient)
//! ingestor ───── resolve_if_pending ──────────┘                                  │
//!                                                                                ▼
//!                                                              memory.rs (in-process adapter)
//! ```
//!
//! # Design Decisions
//! - Keys are only ever written under the owning instance's namespace
//! - Resolution is a compare-and-set from `Pending`, so it never creates a key
//!   and never clobbers a resolved value
//! - Pending placeholders carry a TTL; a missed cleanup expires on its own

pub mod client;
pub mod memory;
pub mod state;

pub use client::{CacheClient, CacheError};
pub use memory::InMemoryCache;
pub use state::StateCache;
