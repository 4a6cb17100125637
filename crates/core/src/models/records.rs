//! Unified data records and listing queries

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of record shown in the unified data view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    Performance,
    Paper,
    Student,
    Budget,
}

impl RecordType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Performance => "performance",
            Self::Paper => "paper",
            Self::Student => "student",
            Self::Budget => "budget",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "performance" => Ok(Self::Performance),
            "paper" => Ok(Self::Paper),
            "student" => Ok(Self::Student),
            "budget" => Ok(Self::Budget),
            other => Err(format!("unknown record type: {other}")),
        }
    }
}

/// Sort order accepted by the listing endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordOrdering {
    #[serde(rename = "-date")]
    NewestFirst,
    #[serde(rename = "date")]
    OldestFirst,
    #[serde(rename = "-amount")]
    LargestFirst,
    #[serde(rename = "amount")]
    SmallestFirst,
}

impl RecordOrdering {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NewestFirst => "-date",
            Self::OldestFirst => "date",
            Self::LargestFirst => "-amount",
            Self::SmallestFirst => "amount",
        }
    }
}

impl FromStr for RecordOrdering {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "-date" => Ok(Self::NewestFirst),
            "date" => Ok(Self::OldestFirst),
            "-amount" => Ok(Self::LargestFirst),
            "amount" => Ok(Self::SmallestFirst),
            other => Err(format!("unknown ordering: {other}")),
        }
    }
}

/// One row of the unified data view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordItem {
    pub id: i64,
    #[serde(rename = "type")]
    pub record_type: RecordType,
    /// ISO 8601 date
    pub date: String,
    pub title: String,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub uploaded_at: String,
    #[serde(default)]
    pub uploaded_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_fields: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Paginated listing envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Number of pages at `page_size` rows each
    #[must_use]
    pub fn total_pages(&self, page_size: u32) -> u64 {
        if page_size == 0 {
            return 0;
        }
        self.count.div_ceil(u64::from(page_size))
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.next.is_some()
    }
}

/// Filter shared by listing and CSV export
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub record_type: Option<RecordType>,
    pub year: Option<i32>,
    pub search: Option<String>,
    pub ordering: Option<RecordOrdering>,
}

impl RecordFilter {
    /// Query parameters for the filter, leaving out unset and blank values
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = self.export_pairs();
        if let Some(ordering) = self.ordering {
            pairs.push(("ordering".to_string(), ordering.as_str().to_string()));
        }
        pairs
    }

    /// Query parameters understood by the export endpoint, which ignores ordering
    #[must_use]
    pub fn export_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(record_type) = self.record_type {
            pairs.push(("type".to_string(), record_type.to_string()));
        }
        if let Some(year) = self.year {
            pairs.push(("year".to_string(), year.to_string()));
        }
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            pairs.push(("search".to_string(), search.to_string()));
        }
        pairs
    }
}

/// A page request against the listing endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordQuery {
    pub filter: RecordFilter,
    pub page: u32,
    pub page_size: u32,
}

impl Default for RecordQuery {
    fn default() -> Self {
        Self {
            filter: RecordFilter::default(),
            page: 1,
            page_size: 20,
        }
    }
}

impl RecordQuery {
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("page".to_string(), self.page.to_string()),
            ("page_size".to_string(), self.page_size.to_string()),
        ];
        pairs.extend(self.filter.query_pairs());
        pairs
    }
}
