// Wire types for the transfer backend
//
// Numan Thabit 2025 Nov

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub source_account: String,
    pub destination_account: String,
    pub transfer_amount: f64,
    pub transfer_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferResponse {
    pub id: i64,
    pub source_account: String,
    pub destination_account: String,
    pub transfer_amount: f64,
    pub fee: f64,
    pub transfer_date: NaiveDate,
    /// Set by the backend when the transfer was accepted.
    pub schedule_date: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeCalculationRequest {
    pub transfer_amount: f64,
    pub transfer_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeCalculationResponse {
    #[serde(default)]
    pub fee: Option<f64>,
}
