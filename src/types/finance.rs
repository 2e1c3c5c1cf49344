//! Payments and finance ledger entries

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A payment or refund recorded against a reservation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: Option<String>,
    /// Negative amounts are refunds
    pub amount: f64,
    pub currency: String,
    pub fx_rate: f64,
    pub date: Option<NaiveDate>,
    /// Raw method label as entered at the front desk
    pub method: String,
    /// Raw kind/type label, e.g. "refund"
    pub kind: String,
}

impl Payment {
    pub fn is_refund(&self) -> bool {
        if self.amount < 0.0 {
            return true;
        }
        let kind = self.kind.to_lowercase();
        kind.contains("refund") || kind.contains("iade")
    }
}

/// Normalized payment channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Pos,
    Online,
    Transfer,
}

impl PaymentMethod {
    /// Map a free-text method label. Anything unrecognized is a transfer.
    pub fn from_label(label: &str) -> Self {
        let x = label.to_lowercase();
        if x.contains("nakit") || x.contains("cash") {
            Self::Cash
        } else if ["pos", "card", "kredi", "kart"].iter().any(|k| x.contains(k)) {
            Self::Pos
        } else if ["online", "stripe", "iyzico", "virtual", "pay"]
            .iter()
            .any(|k| x.contains(k))
        {
            Self::Online
        } else {
            Self::Transfer
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Income,
    Expense,
}

/// One row of the finance ledger, shaped for the bulk upsert endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    pub method: PaymentMethod,
    pub category: String,
    pub amount: f64,
    pub currency: String,
    pub fx_rate: f64,
    pub date: NaiveDate,
    pub note: String,
    /// Stable key so repeated syncs upsert instead of duplicating
    pub unique_key: String,
    pub source: String,
    pub reservation: String,
    pub guest_name: String,
    pub channel: String,
}
