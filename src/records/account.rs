use serde::{Deserialize, Serialize};

pub const INSTALLMENT_ID_FIELD: &str = "installmentId";

/// One fee obligation or payment.
///
/// The key is minted from `dtYear`/`dtMonth`/`dtDay` so newer entries sort
/// first. Installment rows carry their principal's key in `installment_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub fee_type: String,
    pub amount: f64,
    pub is_installment: bool,
    #[serde(default)]
    pub installment_id: String,
    pub dt_day: u32,
    pub dt_month: u32,
    pub dt_year: u32,
    pub class_id: String,
    pub class_name: String,
    pub sec: String,
    #[serde(default)]
    pub student_id: String,
    #[serde(default)]
    pub std_name: String,
    pub session: Vec<u32>,
    pub session_year: u32,
    pub is_sync: bool,
    pub is_active: bool,
}

impl AccountEntry {
    /// Principal entries (no grouping reference) feed the collection record.
    pub fn is_principal(&self) -> bool {
        self.installment_id.is_empty()
    }
}
