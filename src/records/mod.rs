//! Typed views of the documents stored in each collection.

pub mod account;
pub mod collection;
pub mod student;

pub use account::AccountEntry;
pub use collection::CollectionRecord;
pub use student::{StudentDetailRecord, StudentRecord};

/// Field shared by every record marking soft activation.
pub const IS_ACTIVE_FIELD: &str = "isActive";
/// Back-reference to the owning student's key.
pub const STUDENT_ID_FIELD: &str = "studentId";
