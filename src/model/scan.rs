use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a scan log row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScanId(pub Uuid);

impl ScanId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }
}

impl fmt::Display for ScanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a single scan of one guild ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanOutcome {
    /// No previous snapshot existed; the current one was stored as baseline.
    Baseline,
    Compared,
    NotFound,
    FetchFailed,
    /// Changes were computed but at least one webhook call failed.
    DeliveryFailed,
}

impl ScanOutcome {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "Baseline" => Some(ScanOutcome::Baseline),
            "Compared" => Some(ScanOutcome::Compared),
            "NotFound" => Some(ScanOutcome::NotFound),
            "FetchFailed" => Some(ScanOutcome::FetchFailed),
            "DeliveryFailed" => Some(ScanOutcome::DeliveryFailed),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            ScanOutcome::Baseline => "Baseline",
            ScanOutcome::Compared => "Compared",
            ScanOutcome::NotFound => "NotFound",
            ScanOutcome::FetchFailed => "FetchFailed",
            ScanOutcome::DeliveryFailed => "DeliveryFailed",
        }
    }
}

/// One row of the scan log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRecord {
    pub id: ScanId,
    pub group_name: String,
    pub scanned_at: DateTime<Utc>,
    pub outcome: ScanOutcome,
    pub change_count: usize,
    pub anomaly_count: usize,
    pub detail: Option<String>,
}

impl ScanRecord {
    pub fn create(group_name: String, outcome: ScanOutcome) -> Self {
        Self {
            id: ScanId::generate(),
            group_name,
            scanned_at: Utc::now(),
            outcome,
            change_count: 0,
            anomaly_count: 0,
            detail: None,
        }
    }
}
