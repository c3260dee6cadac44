use super::dto::{
    EnrollStudentRequest, EnrollmentReceipt, ListStudentsRequest, StatusChangeRequest,
    StudentDetailsRequest, UpdateStudentProfileRequest,
};
use super::{LedgerService, single_field};
use crate::core::{Collection, Document, LedgerError, Result, StoreResultExt, document_key, to_document};
use crate::query::{ListingPage, PageRequest, fetch_listing};
use crate::records::{IS_ACTIVE_FIELD, STUDENT_ID_FIELD};
use crate::storage::{FetchOptions, FetchQuery, Filter};
use tracing::info;

const PASSWORD_FIELD: &str = "password";

impl LedgerService {
    /// Enrolls a student with details and the admission and tuition entries.
    ///
    /// The writes are sequenced: student, details, both account entries in one
    /// batch, then the collection record. A failure leaves earlier writes behind.
    pub async fn enroll_student(&self, request: EnrollStudentRequest) -> Result<EnrollmentReceipt> {
        request.validate()?;
        let EnrollStudentRequest {
            mut student_info,
            mut student_more_info,
            student_admission_fee_info,
            student_tuition_fee_info,
        } = request;

        student_info.key = None;
        student_info.std_login_id = self.keys.resolve_login_id(&student_info.std_login_id).await?;
        student_info.password = self
            .hash_password(std::mem::take(&mut student_info.password))
            .await?;

        let stored = self
            .store
            .put(Collection::Students.name(), to_document(&student_info)?)
            .await
            .at(Collection::Students)?;
        let student_id = stored_key(&stored, Collection::Students)?;

        student_more_info.key = None;
        student_more_info.student_id = student_id.clone();
        let stored = self
            .store
            .put(
                Collection::StudentDetails.name(),
                to_document(&student_more_info)?,
            )
            .await
            .at(Collection::StudentDetails)?;
        let detail_id = stored_key(&stored, Collection::StudentDetails)?;

        let mut entries = [student_admission_fee_info, student_tuition_fee_info];
        let mut documents = Vec::with_capacity(entries.len());
        for entry in &mut entries {
            entry.key = Some(
                self.keys
                    .allocate_date_key(
                        Collection::Accounts,
                        entry.dt_year,
                        entry.dt_month,
                        entry.dt_day,
                    )
                    .await?,
            );
            entry.student_id = student_id.clone();
            entry.std_name = student_info.name.clone();
            documents.push(to_document(&*entry)?);
        }

        let expected = documents.len();
        let response = self
            .store
            .put_many(Collection::Accounts.name(), documents)
            .await
            .at(Collection::Accounts)?;
        if response.processed.len() != expected {
            return Err(LedgerError::PartialBatch {
                collection: Collection::Accounts,
                processed: response.processed.len(),
                expected,
            });
        }

        for entry in entries.iter().filter(|entry| entry.is_principal() && entry.is_active) {
            self.record_paid_periods(entry).await?;
        }

        info!(
            student_id = %student_id,
            login_id = %student_info.std_login_id,
            "enrolled student"
        );
        Ok(EnrollmentReceipt {
            student_id,
            std_login_id: student_info.std_login_id,
            detail_id,
            account_keys: entries.into_iter().filter_map(|entry| entry.key).collect(),
        })
    }

    pub async fn list_students(&self, request: ListStudentsRequest) -> Result<ListingPage> {
        request.validate(self.config.max_page_limit)?;

        let mut filter = Filter::new().eq(IS_ACTIVE_FIELD, request.is_active);
        if let Some(class_id) = request.class_id() {
            filter = filter.eq("classId", class_id);
        }
        if let Some(section) = request.section() {
            filter = filter.eq("section", section);
        }
        if let Some(name) = request.name() {
            filter = filter.contains("name", name);
        }

        let mut options = FetchOptions::new();
        if request.limit > 0 {
            options = options.limit(request.limit);
        }
        if let Some(last) = request.last() {
            options = options.after(last);
        }

        let page_request = PageRequest::new(FetchQuery::from(filter), options);
        let mut page = fetch_listing(self.store.as_ref(), Collection::Students, &page_request).await?;
        for item in &mut page.items {
            item.remove(PASSWORD_FIELD);
        }
        Ok(page)
    }

    /// Detail records of one student.
    pub async fn student_details(&self, request: StudentDetailsRequest) -> Result<Vec<Document>> {
        request.validate()?;
        let query = FetchQuery::from(Filter::new().eq(STUDENT_ID_FIELD, request.std_id.as_str()));
        self.fetch_all(Collection::StudentDetails, &query).await
    }

    /// Applies partial updates to a student and/or its detail record.
    ///
    /// A login id or password that cannot be prepared rejects the request
    /// before any write. Otherwise both updates are attempted and their
    /// failures are reported together.
    pub async fn update_student_profile(&self, request: UpdateStudentProfileRequest) -> Result<()> {
        request.validate()?;
        let UpdateStudentProfileRequest {
            student_info_key,
            mut student_info,
            student_more_info_key,
            student_more_info,
        } = request;

        let update_student = !student_info_key.trim().is_empty() && !student_info.is_empty();
        let update_details =
            !student_more_info_key.trim().is_empty() && !student_more_info.is_empty();
        if !update_student && !update_details {
            return Err(LedgerError::NoFieldsToUpdate);
        }

        let mut failures: Vec<(Collection, String)> = Vec::new();

        if update_student {
            if let Some(login_id) = student_info.std_login_id.take() {
                student_info.std_login_id = Some(self.keys.resolve_login_id(&login_id).await?);
            }
            if let Some(password) = student_info.password.take() {
                student_info.password = Some(self.hash_password(password).await?);
            }
            let updates = to_document(&student_info)?;
            match self
                .update_record(Collection::Students, updates, &student_info_key)
                .await
            {
                Ok(()) => {
                    info!(key = %student_info_key, "updated student");
                    if student_info.changes_placement() {
                        if let Err(err) = self
                            .sync_class_placement(&student_info_key, &student_info)
                            .await
                        {
                            failures.push((Collection::Collections, err.to_string()));
                        }
                    }
                }
                Err(err) => failures.push((Collection::Students, err.to_string())),
            }
        }

        if update_details {
            let updates = to_document(&student_more_info)?;
            match self
                .update_record(Collection::StudentDetails, updates, &student_more_info_key)
                .await
            {
                Ok(()) => info!(key = %student_more_info_key, "updated student details"),
                Err(err) => failures.push((Collection::StudentDetails, err.to_string())),
            }
        }

        match failures.first() {
            None => Ok(()),
            Some((collection, _)) => Err(LedgerError::MultiWrite {
                collection: *collection,
                messages: failures.into_iter().map(|(_, message)| message).collect(),
            }),
        }
    }

    pub async fn set_student_active(&self, request: StatusChangeRequest) -> Result<()> {
        request.validate()?;
        self.update_record(
            Collection::Students,
            single_field(IS_ACTIVE_FIELD, request.is_active),
            &request.key_id,
        )
        .await?;
        info!(key = %request.key_id, is_active = request.is_active, "changed student status");
        Ok(())
    }
}

fn stored_key(document: &Document, collection: Collection) -> Result<String> {
    document_key(document)
        .map(str::to_string)
        .ok_or_else(|| LedgerError::internal(format!("{collection} write returned no key")))
}
