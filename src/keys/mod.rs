//! Identifier minting: sortable record keys and human-readable login ids.

pub mod allocator;
pub mod lexico;
pub mod login_id;

pub use allocator::{KEY_SEPARATOR, KeyAllocator, RetryPolicy, SuffixSource, TimeRandomSuffix};
pub use lexico::encode;
pub use login_id::{LOGIN_ID_NUMERIC_LEN, LOGIN_ID_STEP, split_login_id};
