use super::dto::{
    AccountReceipt, AccountStatusRequest, DeleteAccountRequest, InstallmentGroupRequest,
    ListAccountEntriesRequest, TransactionDetailsRequest, TransactionPage,
};
use super::{LedgerService, keys_of, single_field};
use crate::core::{Collection, Document, LedgerError, Result, StoreResultExt, to_document};
use crate::query::{FilteredScan, ListingPage, PageRequest, account_covers, fetch_listing};
use crate::records::account::INSTALLMENT_ID_FIELD;
use crate::records::collection::{CLASS_NAME_FIELD, SESSION_YEAR_FIELD};
use crate::records::{AccountEntry, IS_ACTIVE_FIELD, STUDENT_ID_FIELD};
use crate::storage::{FetchOptions, FetchQuery, Filter};
use tracing::info;

fn date_filter(mut filter: Filter, day: u32, month: u32, year: u32) -> Filter {
    if day > 0 {
        filter = filter.eq("dtDay", day);
    }
    if month > 0 {
        filter = filter.eq("dtMonth", month);
    }
    if year > 0 {
        filter = filter.eq("dtYear", year);
    }
    filter
}

fn eq_if_set(filter: Filter, field: &str, value: &str) -> Filter {
    match value.trim() {
        "" => filter,
        value => filter.eq(field, value),
    }
}

impl LedgerService {
    /// Records a standalone account entry under a freshly minted date key.
    pub async fn record_account_entry(&self, mut entry: AccountEntry) -> Result<AccountReceipt> {
        entry.validate_standalone()?;
        let key = self
            .keys
            .allocate_date_key(
                Collection::Accounts,
                entry.dt_year,
                entry.dt_month,
                entry.dt_day,
            )
            .await?;
        entry.key = Some(key.clone());

        self.store
            .insert(Collection::Accounts.name(), to_document(&entry)?)
            .await
            .at(Collection::Accounts)?;
        info!(
            key = %key,
            student_id = %entry.student_id,
            fee_type = %entry.fee_type,
            "recorded account entry"
        );

        if entry.is_principal() && entry.is_active {
            self.record_paid_periods(&entry).await?;
        }
        Ok(AccountReceipt { key })
    }

    pub async fn list_account_entries(
        &self,
        request: ListAccountEntriesRequest,
    ) -> Result<ListingPage> {
        request.validate(self.config.max_page_limit)?;

        let filter = Filter::new()
            .eq(STUDENT_ID_FIELD, request.student_id.as_str())
            .eq(IS_ACTIVE_FIELD, request.is_active);
        let filter = eq_if_set(filter, INSTALLMENT_ID_FIELD, &request.installment_id);
        let filter = date_filter(filter, request.dt_day, request.dt_month, request.dt_year);

        let mut options = FetchOptions::new();
        if request.limit > 0 {
            options = options.limit(request.limit);
        }
        if !request.last.trim().is_empty() {
            options = options.after(request.last.trim());
        }

        let page_request = PageRequest::new(FetchQuery::from(filter), options);
        fetch_listing(self.store.as_ref(), Collection::Accounts, &page_request).await
    }

    /// Installment rows of a principal followed by the principal itself.
    pub async fn installment_group(&self, request: InstallmentGroupRequest) -> Result<Vec<Document>> {
        request.validate()?;
        let query = FetchQuery::from(
            Filter::new()
                .eq(INSTALLMENT_ID_FIELD, request.installment_id.as_str())
                .eq(IS_ACTIVE_FIELD, request.is_active),
        );
        let mut group = self.fetch_all(Collection::Accounts, &query).await?;

        let principal = self
            .store
            .get(Collection::Accounts.name(), &request.installment_id)
            .await
            .at(Collection::Accounts)?;
        group.extend(principal);
        Ok(group)
    }

    /// Activates or deactivates an entry, cascading over its installments when
    /// asked to.
    ///
    /// The collection record follows only principal entries whose status
    /// actually changed, and only once every row was written.
    pub async fn set_account_status(&self, request: AccountStatusRequest) -> Result<()> {
        request.validate()?;
        let entry: AccountEntry = self
            .get_record(Collection::Accounts, &request.key_id)
            .await?
            .ok_or_else(|| LedgerError::not_found(format!("account entry '{}'", request.key_id)))?;

        let mut keys = vec![request.key_id.clone()];
        if request.is_main_installment && entry.is_principal() {
            let query = FetchQuery::from(
                Filter::new().eq(INSTALLMENT_ID_FIELD, request.key_id.as_str()),
            );
            let installments = self.fetch_all(Collection::Accounts, &query).await?;
            keys.extend(keys_of(&installments));
        }

        self.update_each(
            Collection::Accounts,
            &single_field(IS_ACTIVE_FIELD, request.is_active),
            &keys,
        )
        .await?;
        info!(
            key = %request.key_id,
            is_active = request.is_active,
            rows = keys.len(),
            "changed account status"
        );

        if entry.is_principal() && entry.is_active != request.is_active {
            if request.is_active {
                self.record_paid_periods(&entry).await?;
            } else {
                self.withdraw_paid_periods(&entry).await?;
            }
        }
        Ok(())
    }

    /// Deletes an inactive entry. Deleting a principal as the main installment
    /// also removes its inactive installment rows.
    pub async fn delete_account_entry(&self, request: DeleteAccountRequest) -> Result<()> {
        request.validate()?;
        let entry: AccountEntry = self
            .get_record(Collection::Accounts, &request.key_id)
            .await?
            .ok_or_else(|| LedgerError::not_found(format!("account entry '{}'", request.key_id)))?;
        if entry.is_active {
            return Err(LedgerError::invalid_state(format!(
                "account entry '{}' must be deactivated before deletion",
                request.key_id
            )));
        }

        let mut keys = Vec::new();
        if request.is_main_installment && entry.is_principal() {
            let query = FetchQuery::from(
                Filter::new()
                    .eq(INSTALLMENT_ID_FIELD, request.key_id.as_str())
                    .eq(IS_ACTIVE_FIELD, false),
            );
            let installments = self.fetch_all(Collection::Accounts, &query).await?;
            keys.extend(keys_of(&installments));
        }
        keys.push(request.key_id.clone());

        let mut messages = Vec::new();
        for key in &keys {
            if let Err(err) = self.store.delete(Collection::Accounts.name(), key).await {
                messages.push(format!("{key}: {err}"));
            }
        }
        if !messages.is_empty() {
            return Err(LedgerError::MultiWrite {
                collection: Collection::Accounts,
                messages,
            });
        }
        info!(key = %request.key_id, rows = keys.len(), "deleted account entry");
        Ok(())
    }

    /// Active transactions matching the optional filters. Requested periods are
    /// matched caller-side, which switches to filtered pagination.
    pub async fn transaction_details(
        &self,
        request: TransactionDetailsRequest,
    ) -> Result<TransactionPage> {
        request.validate(self.config.max_page_limit)?;
        let TransactionDetailsRequest {
            fee_type,
            dt_day,
            dt_month,
            dt_year,
            class_id,
            class_name,
            sec,
            std_name,
            session,
            session_year,
            limit,
            last,
        } = request;

        let mut filter = Filter::new().eq(IS_ACTIVE_FIELD, true);
        filter = eq_if_set(filter, "feeType", &fee_type);
        filter = date_filter(filter, dt_day, dt_month, dt_year);
        filter = eq_if_set(filter, "classId", &class_id);
        filter = eq_if_set(filter, CLASS_NAME_FIELD, &class_name);
        filter = eq_if_set(filter, "sec", &sec);
        if !std_name.trim().is_empty() {
            filter = filter.contains("stdName", std_name.trim());
        }
        if session_year > 0 {
            filter = filter.eq(SESSION_YEAR_FIELD, session_year);
        }
        let query = FetchQuery::from(filter);
        let start = last.and_then(|cursor| cursor.into_cursor());

        if !session.is_empty() {
            let page = FilteredScan::new(self.store.as_ref(), Collection::Accounts, &query)
                .with_page_budget(self.config.scan_page_budget)
                .collect(|row| account_covers(row, &session), limit, start.as_ref())
                .await?;
            return Ok(TransactionPage::Filtered(page));
        }

        let mut options = FetchOptions::new().limit(limit);
        if let Some(position) = start.as_ref().and_then(|cursor| cursor.position()) {
            options = options.after(position);
        }
        let page_request = PageRequest::new(query, options);
        let page = fetch_listing(self.store.as_ref(), Collection::Accounts, &page_request).await?;
        Ok(TransactionPage::Listing(page))
    }
}
