pub mod collection;
pub mod document;
pub mod error;

pub use collection::Collection;
pub use document::{Document, KEY_FIELD, document_key, from_document, to_document};
pub use error::{LedgerError, Result, StoreResultExt};
