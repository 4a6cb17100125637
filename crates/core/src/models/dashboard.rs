//! Dashboard summary aggregates

use serde::{Deserialize, Serialize};

/// Optional dashboard filters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardQuery {
    pub year: Option<i32>,
    pub department: Option<String>,
}

impl DashboardQuery {
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(year) = self.year {
            pairs.push(("year".to_string(), year.to_string()));
        }
        if let Some(department) = self.department.as_deref().filter(|d| !d.is_empty()) {
            pairs.push(("department".to_string(), department.to_string()));
        }
        pairs
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub kpi_summary: KpiSummary,
    pub publication_stats: PublicationStats,
    pub student_stats: StudentStats,
    pub budget_summary: BudgetSummary,
}

/// Department KPI totals
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KpiSummary {
    /// Percent
    pub avg_employment_rate: f64,
    pub total_full_time_faculty: u64,
    pub total_visiting_faculty: u64,
    /// Hundred-million won
    pub total_tech_transfer_income: f64,
    pub total_intl_conferences: u64,
    pub by_college: Vec<KpiByCollege>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KpiByCollege {
    pub college: String,
    pub avg_employment_rate: f64,
    pub total_faculty: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublicationStats {
    pub total_papers: u64,
    pub scie_count: u64,
    pub kci_count: u64,
    /// SCIE papers only
    pub avg_impact_factor: f64,
    /// Between 0 and 1
    pub project_linked_ratio: f64,
    pub by_department: Vec<PublicationByDepartment>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublicationByDepartment {
    pub department: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudentStats {
    pub total_students: u64,
    pub by_program: Vec<StudentByProgram>,
    pub by_status: Vec<StudentByStatus>,
    pub by_department: Vec<StudentByDepartment>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudentByProgram {
    pub program_type: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudentByStatus {
    pub enrollment_status: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudentByDepartment {
    pub department: String,
    pub count: u64,
}

/// Research budget totals, amounts in won
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetSummary {
    pub total_budget: i64,
    pub total_execution: i64,
    /// Between 0 and 1
    pub execution_rate: f64,
    pub by_item: Vec<BudgetByItem>,
    pub by_agency: Vec<BudgetByAgency>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetByItem {
    pub execution_item: String,
    pub total_amount: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetByAgency {
    pub funding_agency: String,
    pub total_budget: i64,
}
