//! Spreadsheet upload results and history

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Dataset a spreadsheet is imported into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadDataType {
    DepartmentKpi,
    Publication,
    ResearchProject,
    StudentRoster,
}

impl UploadDataType {
    pub const ALL: [Self; 4] = [
        Self::DepartmentKpi,
        Self::Publication,
        Self::ResearchProject,
        Self::StudentRoster,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DepartmentKpi => "department_kpi",
            Self::Publication => "publication",
            Self::ResearchProject => "research_project",
            Self::StudentRoster => "student_roster",
        }
    }
}

impl fmt::Display for UploadDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UploadDataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown upload data type: {s}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Success,
    Partial,
    Failed,
}

/// Outcome of one spreadsheet upload
///
/// Returned on success and also as the body of a rejected upload, in which
/// case only `status` and `error_message` are reliable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub data_type: Option<UploadDataType>,
    #[serde(default)]
    pub rows_processed: u64,
    pub status: UploadStatus,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub uploaded_at: Option<String>,
}

impl UploadResult {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == UploadStatus::Success
    }
}

/// Upload history row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRecord {
    pub id: i64,
    pub file_name: String,
    pub data_type: UploadDataType,
    #[serde(default)]
    pub rows_processed: u64,
    pub status: UploadStatus,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub uploaded_by: String,
    pub uploaded_at: String,
}
