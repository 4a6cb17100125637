//! Data API request and response shapes

pub mod account;
pub mod dashboard;
pub mod records;
pub mod upload;

pub use account::{ChangePasswordRequest, ProfileUpdate, UserProfile};
pub use dashboard::{
    BudgetByAgency, BudgetByItem, BudgetSummary, DashboardQuery, DashboardSummary, KpiByCollege,
    KpiSummary, PublicationByDepartment, PublicationStats, StudentByDepartment, StudentByProgram,
    StudentByStatus, StudentStats,
};
pub use records::{Page, RecordFilter, RecordItem, RecordOrdering, RecordQuery, RecordType};
pub use upload::{UploadDataType, UploadRecord, UploadResult, UploadStatus};

use serde::{Deserialize, Serialize};

/// JSON error envelope returned by the data API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}
