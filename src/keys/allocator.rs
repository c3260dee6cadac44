use super::lexico::encode;
use crate::core::{Collection, LedgerError, Result, StoreResultExt};
use crate::storage::DocumentStore;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

/// Separator between the sortable prefix and the unique suffix of a key.
pub const KEY_SEPARATOR: char = '-';

const RANDOM_SUFFIX_LEN: usize = 6;

/// Bounded retry with exponential backoff for identifier allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 8,
            initial_backoff: Duration::from_millis(5),
            max_backoff: Duration::from_millis(250),
        }
    }
}

impl RetryPolicy {
    /// Retries without sleeping between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay after the given number of failed attempts (1-based).
    pub fn backoff(&self, failed_attempts: u32) -> Duration {
        let shift = failed_attempts.saturating_sub(1).min(16);
        self.initial_backoff
            .saturating_mul(1u32 << shift)
            .min(self.max_backoff)
    }
}

/// Source of the globally-unique part of a key.
pub trait SuffixSource: Send + Sync {
    fn next_suffix(&self) -> String;
}

/// Base-36 wall clock microseconds followed by random hex characters.
#[derive(Debug, Default, Clone, Copy)]
pub struct TimeRandomSuffix;

impl SuffixSource for TimeRandomSuffix {
    fn next_suffix(&self) -> String {
        let micros = u64::try_from(Utc::now().timestamp_micros()).unwrap_or_default();
        let random = Uuid::new_v4().simple().to_string();
        format!("{}{}", to_base36(micros), &random[..RANDOM_SUFFIX_LEN])
    }
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut out = Vec::new();
    loop {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
        if value == 0 {
            break;
        }
    }
    out.iter().rev().map(|&b| b as char).collect()
}

/// Mints sortable, collision-checked keys and login identifiers.
///
/// A candidate key is `prefix-suffix`: the prefix is derived from a date so that
/// newer records sort first, the suffix makes it unique. Each candidate is probed
/// against the target collection before it is handed out. Probing is not a
/// reservation; writers still persist with a conditional insert.
#[derive(Clone)]
pub struct KeyAllocator {
    pub(super) store: Arc<dyn DocumentStore>,
    suffixes: Arc<dyn SuffixSource>,
    pub(super) retry: RetryPolicy,
}

impl KeyAllocator {
    pub fn new(store: Arc<dyn DocumentStore>, retry: RetryPolicy) -> Self {
        Self {
            store,
            suffixes: Arc::new(TimeRandomSuffix),
            retry,
        }
    }

    pub fn with_suffix_source(mut self, suffixes: Arc<dyn SuffixSource>) -> Self {
        self.suffixes = suffixes;
        self
    }

    pub fn date_prefix(year: u32, month: u32, day: u32) -> String {
        let mut prefix = encode(u64::from(year));
        prefix.push_str(&encode(u64::from(month)));
        prefix.push_str(&encode(u64::from(day)));
        prefix
    }

    pub fn year_prefix(year: u32) -> String {
        encode(u64::from(year))
    }

    pub async fn allocate_date_key(
        &self,
        collection: Collection,
        year: u32,
        month: u32,
        day: u32,
    ) -> Result<String> {
        self.allocate(collection, Self::date_prefix(year, month, day))
            .await
    }

    pub async fn allocate_year_key(&self, collection: Collection, year: u32) -> Result<String> {
        self.allocate(collection, Self::year_prefix(year)).await
    }

    async fn allocate(&self, collection: Collection, prefix: String) -> Result<String> {
        let attempts = self.retry.attempts();
        for attempt in 1..=attempts {
            let candidate = format!("{prefix}{KEY_SEPARATOR}{}", self.suffixes.next_suffix());
            let existing = self
                .store
                .get(collection.name(), &candidate)
                .await
                .at(collection)?;

            if existing.is_none() {
                debug!(%collection, key = %candidate, attempt, "allocated key");
                return Ok(candidate);
            }

            warn!(%collection, key = %candidate, attempt, "key collision, regenerating suffix");
            if attempt < attempts {
                let delay = self.retry.backoff(attempt);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
        }

        Err(LedgerError::AllocationExhausted {
            collection,
            attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_up_to_the_cap() {
        let policy = RetryPolicy {
            max_attempts: 6,
            initial_backoff: Duration::from_millis(10),
            max_backoff: Duration::from_millis(50),
        };
        assert_eq!(policy.backoff(1), Duration::from_millis(10));
        assert_eq!(policy.backoff(2), Duration::from_millis(20));
        assert_eq!(policy.backoff(3), Duration::from_millis(40));
        assert_eq!(policy.backoff(4), Duration::from_millis(50));
        assert_eq!(policy.backoff(30), Duration::from_millis(50));
    }

    #[test]
    fn date_prefix_concatenates_encoded_parts() {
        assert_eq!(KeyAllocator::date_prefix(2024, 3, 15), "HJHFJGIE");
        assert_eq!(KeyAllocator::year_prefix(2024), "HJHF");
    }

    #[test]
    fn later_dates_sort_first() {
        let older = KeyAllocator::date_prefix(2024, 3, 15);
        let newer = KeyAllocator::date_prefix(2024, 11, 2);
        assert!(newer < older);
    }

    #[test]
    fn generated_suffix_is_alphanumeric() {
        let suffix = TimeRandomSuffix.next_suffix();
        assert!(suffix.len() > RANDOM_SUFFIX_LEN);
        assert!(suffix.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(71), "1z");
    }
}
