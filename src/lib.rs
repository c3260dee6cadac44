//! School fee ledger over a paged document store.
//!
//! The store filters on equality and containment only, pages behind an opaque
//! cursor and never aggregates. Sortable keys, filtered pagination, counting
//! and the per-class collection report are all built on top of it here.

pub mod config;
pub mod core;
pub mod keys;
pub mod query;
pub mod records;
pub mod service;
pub mod state;
pub mod storage;
pub mod web;

pub use config::{AppConfig, ServiceConfig};
pub use self::core::{Collection, Document, LedgerError, Result};
pub use keys::{KeyAllocator, RetryPolicy};
pub use service::LedgerService;
pub use state::AppState;
pub use storage::{DocumentStore, MemoryDocumentStore};
pub use web::build_router;
