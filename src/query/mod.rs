//! Query engine over the paged document store.
//!
//! Everything here is built from one primitive, [`fetch_page`]: plain listings,
//! filtered pagination with caller-side predicates, exhaustive counts and the
//! classwise collection report.

pub mod count;
pub mod merge;
pub mod page;
pub mod predicate;

pub use count::{CollectionReport, UNPAID_SUFFIX, classwise_report, count_all};
pub use merge::{FilteredPage, FilteredScan, ResumeCursor, filtered_page};
pub use page::{ListingPage, Page, PageRequest, fetch_listing, fetch_page};
pub use predicate::{account_covers, collection_covers, session_values, sessions_match};
