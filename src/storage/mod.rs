pub mod engine;
pub mod filter;
pub mod memory;

pub use engine::{
    DocumentStore, FetchOptions, FetchResponse, PutManyResponse, StoreError, StoreResult,
};
pub use filter::{Condition, FetchQuery, Filter};
pub use memory::MemoryDocumentStore;
