use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const REPORT_SCHEMA_VERSION: &str = "1.0.0";

pub const REPORT_TYPE_INITIAL: &str = "initial";
pub const REPORT_TYPE_REVERIFY_DELTA: &str = "reverify_delta";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Implemented,
    Partial,
    NotImplemented,
    Na,
}

impl Status {
    pub const VALUES: [&'static str; 4] = ["implemented", "partial", "not_implemented", "na"];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Implemented => "implemented",
            Self::Partial => "partial",
            Self::NotImplemented => "not_implemented",
            Self::Na => "na",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Moscow {
    Must,
    Should,
    Could,
    Wont,
}

impl Moscow {
    pub const VALUES: [&'static str; 4] = ["MUST", "SHOULD", "COULD", "WONT"];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Must => "MUST",
            Self::Should => "SHOULD",
            Self::Could => "COULD",
            Self::Wont => "WONT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestCoverage {
    Full,
    Partial,
    None,
}

impl TestCoverage {
    pub const VALUES: [&'static str; 3] = ["full", "partial", "none"];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Partial => "partial",
            Self::None => "none",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Fixed,
    PartiallyFixed,
    NotFixed,
    Regressed,
}

impl Resolution {
    pub const VALUES: [&'static str; 4] = ["fixed", "partially_fixed", "not_fixed", "regressed"];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub path: String,
    #[serde(default)]
    pub lines: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Implementation {
    #[serde(default)]
    pub files: Vec<FileRef>,
    #[serde(default)]
    pub notes: String,
}

/// One verified requirement. `v_item_id` is assigned by the report
/// assembler, never authored; the empty string means "unassigned".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub schema_version: String,
    pub fragment_id: String,
    pub section_ref: String,
    pub title: String,
    pub requirement_text: String,
    pub moscow: Moscow,
    pub status: Status,
    pub implementation: Implementation,
    pub test_coverage: TestCoverage,
    #[serde(default)]
    pub tests: Vec<FileRef>,
    #[serde(default)]
    pub missing_tests: Vec<String>,
    #[serde(default)]
    pub missing_implementation: Vec<String>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub v_item_id: String,
    #[serde(default)]
    pub previous_status: Option<Status>,
    #[serde(default)]
    pub resolution: Option<Resolution>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoscowBreakdown {
    #[serde(default)]
    pub total: usize,
    #[serde(default)]
    pub implemented: usize,
    #[serde(default)]
    pub partial: usize,
    #[serde(default)]
    pub not_implemented: usize,
    #[serde(default)]
    pub na: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Statistics {
    pub total_requirements: usize,
    pub by_status: BTreeMap<String, usize>,
    pub by_moscow: BTreeMap<String, MoscowBreakdown>,
    pub test_coverage: BTreeMap<String, usize>,
    pub implementation_rate: f64,
    pub test_rate: f64,
    pub must_implementation_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityGap {
    pub priority: Priority,
    pub v_item_id: String,
    pub section_ref: String,
    pub title: String,
    pub moscow: Moscow,
    pub status: Status,
    pub test_coverage: TestCoverage,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub project_name: String,
    pub spec_path: String,
    pub implementation_path: String,
    pub date: String,
    pub run: u32,
    #[serde(default)]
    pub previous_report: Option<String>,
    #[serde(default)]
    pub spec_version: String,
    #[serde(default)]
    pub mode: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionSummary {
    pub previous_total: usize,
    pub fixed: usize,
    pub partially_fixed: usize,
    pub not_fixed: usize,
    pub regressed: usize,
    pub new_items: usize,
}

/// Root snapshot. Built once by the assembler and persisted as-is; a
/// later run reads a prior snapshot back without modifying it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub schema_version: String,
    pub report_type: String,
    pub metadata: ReportMetadata,
    #[serde(default)]
    pub findings: Vec<Finding>,
    #[serde(default)]
    pub statistics: Statistics,
    #[serde(default)]
    pub priority_gaps: Vec<PriorityGap>,
    #[serde(default)]
    pub resolution_summary: Option<ResolutionSummary>,
}
