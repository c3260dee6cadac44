use super::allocator::KeyAllocator;
use crate::core::{Collection, LedgerError, Result};
use crate::query::count_all;
use crate::records::student::LOGIN_ID_FIELD;
use crate::storage::{FetchQuery, Filter};
use tracing::{debug, warn};

/// Number of trailing characters that form the numeric part of a login id.
pub const LOGIN_ID_NUMERIC_LEN: usize = 6;
/// Each probe advances the numeric part by this factor times the match count.
pub const LOGIN_ID_STEP: u64 = 3;

/// Splits a login id into its prefix and parsed numeric tail.
pub fn split_login_id(candidate: &str) -> Result<(&str, u64)> {
    let split_at = candidate
        .char_indices()
        .rev()
        .nth(LOGIN_ID_NUMERIC_LEN - 1)
        .map(|(index, _)| index)
        .filter(|&index| index > 0)
        .ok_or_else(|| {
            LedgerError::validation(format!(
                "login id '{candidate}' must be longer than {LOGIN_ID_NUMERIC_LEN} characters"
            ))
        })?;

    let (prefix, tail) = candidate.split_at(split_at);
    if !tail.bytes().all(|b| b.is_ascii_digit()) {
        return Err(LedgerError::validation(format!(
            "login id '{candidate}' must end with {LOGIN_ID_NUMERIC_LEN} digits"
        )));
    }
    let numeric = tail
        .parse::<u64>()
        .map_err(|err| LedgerError::validation(format!("invalid login id tail: {err}")))?;
    Ok((prefix, numeric))
}

impl KeyAllocator {
    /// Returns the first free login id reachable from `candidate`.
    ///
    /// While `prefix + numeric` is taken by `count` students the numeric part
    /// advances by `3 * count`. The result is not re-padded, so leading zeros of
    /// the tail are dropped and the digit count can grow.
    pub async fn resolve_login_id(&self, candidate: &str) -> Result<String> {
        let (prefix, mut numeric) = split_login_id(candidate)?;
        let attempts = self.retry.attempts();

        for attempt in 1..=attempts {
            let login_id = format!("{prefix}{numeric}");
            let query = FetchQuery::from(Filter::new().eq(LOGIN_ID_FIELD, login_id.as_str()));
            let taken = count_all(self.store.as_ref(), Collection::Students, &query).await?;

            if taken == 0 {
                debug!(candidate, login_id = %login_id, attempt, "resolved login id");
                return Ok(login_id);
            }

            warn!(login_id = %login_id, taken, attempt, "login id in use, advancing");
            numeric = LOGIN_ID_STEP
                .checked_mul(taken)
                .and_then(|step| numeric.checked_add(step))
                .ok_or_else(|| {
                    LedgerError::validation(format!("login id '{candidate}' overflowed"))
                })?;
        }

        Err(LedgerError::AllocationExhausted {
            collection: Collection::Students,
            attempts,
        })
    }
}
