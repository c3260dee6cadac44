//! Request and response payloads with their field contracts.

use crate::core::{LedgerError, Result};
use crate::query::{FilteredPage, ListingPage, ResumeCursor};
use crate::records::{AccountEntry, StudentDetailRecord, StudentRecord};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

pub const LOGIN_ID_MIN_LEN: usize = 7;
pub const PASSWORD_MIN_LEN: usize = 5;
pub const RECORD_KEY_MIN_LEN: usize = 12;
pub const ADMISSION_FEE: &str = "admissionFee";
pub const TUITION_FEE: &str = "tuitionFee";

static ALPHANUMERIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("^[A-Za-z0-9]+$").expect("alphanumeric pattern is valid")
});

fn require_min_len(field: &str, value: &str, min: usize) -> Result<()> {
    if value.chars().count() < min {
        return Err(LedgerError::validation(format!(
            "{field} must be at least {min} characters"
        )));
    }
    Ok(())
}

fn require_alphanumeric(field: &str, value: &str) -> Result<()> {
    if !ALPHANUMERIC.is_match(value) {
        return Err(LedgerError::validation(format!(
            "{field} must contain only letters and digits"
        )));
    }
    Ok(())
}

fn require_sessions(field: &str, sessions: &[u32]) -> Result<()> {
    if sessions.is_empty() {
        return Err(LedgerError::validation(format!(
            "{field} must contain at least one period"
        )));
    }
    Ok(())
}

fn require_limit(limit: usize, min: usize, max: usize) -> Result<()> {
    if limit < min || limit > max {
        return Err(LedgerError::validation(format!(
            "limit must be between {min} and {max}"
        )));
    }
    Ok(())
}

/// Fee types become field paths inside `collectionInfo`.
fn require_fee_type(fee_type: &str) -> Result<()> {
    if fee_type.trim().is_empty() || fee_type.contains('.') {
        return Err(LedgerError::validation(
            "feeType must be non-empty and must not contain '.'",
        ));
    }
    Ok(())
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Accepts either a plain record key (legacy clients) or a resume cursor object.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CursorInput {
    Key(String),
    Token(ResumeCursor),
}

impl CursorInput {
    pub fn into_cursor(self) -> Option<ResumeCursor> {
        match self {
            CursorInput::Key(key) => non_empty(&key).map(ResumeCursor::after),
            CursorInput::Token(cursor) => cursor.position().is_some().then_some(cursor),
        }
    }
}

impl StudentRecord {
    pub fn validate_new(&self) -> Result<()> {
        require_min_len("stdLoginId", &self.std_login_id, LOGIN_ID_MIN_LEN)?;
        require_min_len("password", &self.password, PASSWORD_MIN_LEN)
    }
}

impl AccountEntry {
    /// Contract shared by every newly recorded entry.
    pub fn validate_new(&self) -> Result<()> {
        require_fee_type(&self.fee_type)?;
        require_sessions("session", &self.session)?;
        if !(1..=12).contains(&self.dt_month) {
            return Err(LedgerError::validation("dtMonth must be between 1 and 12"));
        }
        if !(1..=31).contains(&self.dt_day) {
            return Err(LedgerError::validation("dtDay must be between 1 and 31"));
        }
        // Keys only sort correctly among years of equal digit width.
        if !(1000..=9999).contains(&self.dt_year) {
            return Err(LedgerError::validation("dtYear must have four digits"));
        }
        if !self.is_principal() {
            require_min_len("installmentId", &self.installment_id, RECORD_KEY_MIN_LEN)?;
        }
        Ok(())
    }

    /// Entries recorded on their own must name their student.
    pub fn validate_standalone(&self) -> Result<()> {
        self.validate_new()?;
        require_alphanumeric("studentId", &self.student_id)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollStudentRequest {
    pub student_info: StudentRecord,
    pub student_more_info: StudentDetailRecord,
    pub student_admission_fee_info: AccountEntry,
    pub student_tuition_fee_info: AccountEntry,
}

impl EnrollStudentRequest {
    pub fn validate(&self) -> Result<()> {
        self.student_info.validate_new()?;
        self.student_admission_fee_info.validate_new()?;
        self.student_tuition_fee_info.validate_new()?;
        if !self.student_admission_fee_info.fee_type.contains(ADMISSION_FEE) {
            return Err(LedgerError::validation(format!(
                "studentAdmissionFeeInfo.feeType must be {ADMISSION_FEE}"
            )));
        }
        if !self.student_tuition_fee_info.fee_type.contains(TUITION_FEE) {
            return Err(LedgerError::validation(format!(
                "studentTuitionFeeInfo.feeType must be {TUITION_FEE}"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentReceipt {
    pub student_id: String,
    pub std_login_id: String,
    pub detail_id: String,
    pub account_keys: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListStudentsRequest {
    #[serde(default)]
    pub class_id: String,
    #[serde(default)]
    pub section: String,
    #[serde(default)]
    pub limit: usize,
    #[serde(default)]
    pub last: String,
    #[serde(default)]
    pub name: String,
    pub is_active: bool,
}

impl ListStudentsRequest {
    pub fn validate(&self, max_limit: usize) -> Result<()> {
        require_limit(self.limit, 0, max_limit)
    }

    pub fn class_id(&self) -> Option<&str> {
        non_empty(&self.class_id)
    }

    pub fn section(&self) -> Option<&str> {
        non_empty(&self.section)
    }

    pub fn name(&self) -> Option<&str> {
        non_empty(&self.name)
    }

    pub fn last(&self) -> Option<&str> {
        non_empty(&self.last)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentDetailsRequest {
    pub std_id: String,
}

impl StudentDetailsRequest {
    pub fn validate(&self) -> Result<()> {
        require_alphanumeric("stdId", &self.std_id)
    }
}

/// Partial update of a student. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub std_login_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roll_no: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doa: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_sync: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl StudentPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn changes_placement(&self) -> bool {
        self.class_name.is_some() || self.class_id.is_some() || self.section.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentDetailPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medium: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second_lang: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dob: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub father_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mother_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lg_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_sync: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl StudentDetailPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStudentProfileRequest {
    #[serde(default)]
    pub student_info_key: String,
    #[serde(default)]
    pub student_info: StudentPatch,
    #[serde(default)]
    pub student_more_info_key: String,
    #[serde(default)]
    pub student_more_info: StudentDetailPatch,
}

impl UpdateStudentProfileRequest {
    pub fn validate(&self) -> Result<()> {
        if let Some(login_id) = &self.student_info.std_login_id {
            require_min_len("studentInfo.stdLoginId", login_id, LOGIN_ID_MIN_LEN)?;
        }
        if let Some(password) = &self.student_info.password {
            require_min_len("studentInfo.password", password, PASSWORD_MIN_LEN)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChangeRequest {
    pub key_id: String,
    pub is_active: bool,
}

impl StatusChangeRequest {
    pub fn validate(&self) -> Result<()> {
        require_min_len("keyId", &self.key_id, RECORD_KEY_MIN_LEN)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAccountEntriesRequest {
    pub student_id: String,
    #[serde(default)]
    pub installment_id: String,
    pub is_active: bool,
    #[serde(default)]
    pub limit: usize,
    #[serde(default)]
    pub last: String,
    #[serde(default)]
    pub dt_day: u32,
    #[serde(default)]
    pub dt_month: u32,
    #[serde(default)]
    pub dt_year: u32,
}

impl ListAccountEntriesRequest {
    pub fn validate(&self, max_limit: usize) -> Result<()> {
        require_alphanumeric("studentId", &self.student_id)?;
        require_limit(self.limit, 0, max_limit)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallmentGroupRequest {
    pub installment_id: String,
    pub is_active: bool,
}

impl InstallmentGroupRequest {
    pub fn validate(&self) -> Result<()> {
        require_min_len("installmentId", &self.installment_id, RECORD_KEY_MIN_LEN)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountStatusRequest {
    pub key_id: String,
    pub is_active: bool,
    /// Cascade the change to every installment row of this principal.
    pub is_main_installment: bool,
}

impl AccountStatusRequest {
    pub fn validate(&self) -> Result<()> {
        require_min_len("keyId", &self.key_id, RECORD_KEY_MIN_LEN)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAccountRequest {
    pub key_id: String,
    pub is_main_installment: bool,
}

impl DeleteAccountRequest {
    pub fn validate(&self) -> Result<()> {
        require_min_len("keyId", &self.key_id, RECORD_KEY_MIN_LEN)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionReportRequest {
    pub fee_type: String,
    pub session_year: u32,
    pub session: Vec<u32>,
}

impl CollectionReportRequest {
    pub fn validate(&self) -> Result<()> {
        require_fee_type(&self.fee_type)?;
        require_sessions("session", &self.session)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentCollectionRequest {
    pub fee_type: String,
    pub session_year: u32,
    pub session: Vec<u32>,
    pub class_name: String,
    pub is_paid: bool,
    pub limit: usize,
    #[serde(default)]
    pub last: Option<CursorInput>,
}

impl StudentCollectionRequest {
    pub fn validate(&self, max_limit: usize) -> Result<()> {
        require_fee_type(&self.fee_type)?;
        require_sessions("session", &self.session)?;
        require_limit(self.limit, 1, max_limit)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDetailsRequest {
    #[serde(default)]
    pub fee_type: String,
    #[serde(default)]
    pub dt_day: u32,
    #[serde(default)]
    pub dt_month: u32,
    #[serde(default)]
    pub dt_year: u32,
    #[serde(default)]
    pub class_id: String,
    #[serde(default)]
    pub class_name: String,
    #[serde(default)]
    pub sec: String,
    #[serde(default)]
    pub std_name: String,
    #[serde(default)]
    pub session: Vec<u32>,
    #[serde(default)]
    pub session_year: u32,
    pub limit: usize,
    #[serde(default)]
    pub last: Option<CursorInput>,
}

impl TransactionDetailsRequest {
    pub fn validate(&self, max_limit: usize) -> Result<()> {
        require_limit(self.limit, 1, max_limit)
    }
}

/// Plain `{ statusCode, message }` acknowledgement.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Acknowledgement {
    pub status_code: u16,
    pub message: &'static str,
}

impl Acknowledgement {
    pub fn ok() -> Self {
        Self {
            status_code: 200,
            message: "success",
        }
    }

    pub fn created() -> Self {
        Self {
            status_code: 201,
            message: "success",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountReceipt {
    pub key: String,
}

/// Transaction listing: a filtered page when periods were requested, a plain
/// listing otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TransactionPage {
    Filtered(FilteredPage),
    Listing(ListingPage),
}
