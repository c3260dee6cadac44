use serde::{Deserialize, Serialize};

pub const LOGIN_ID_FIELD: &str = "stdLoginId";

/// Core enrollment record. Never deleted, only deactivated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub std_login_id: String,
    pub name: String,
    pub class_name: String,
    pub class_id: String,
    pub section: String,
    pub roll_no: u32,
    /// Date of admission as supplied by the client.
    pub doa: String,
    /// bcrypt hash of the login password.
    pub password: String,
    pub is_sync: bool,
    pub is_active: bool,
}

/// Contact and demographic extension of a [`StudentRecord`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentDetailRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default)]
    pub student_id: String,
    pub medium: String,
    pub second_lang: String,
    pub dob: String,
    pub father_name: String,
    pub mother_name: String,
    pub lg_name: String,
    pub contact1: String,
    #[serde(default)]
    pub contact2: String,
    #[serde(default)]
    pub email_id: String,
    pub address1: String,
    #[serde(default)]
    pub address2: String,
    pub is_sync: bool,
    pub is_active: bool,
}
