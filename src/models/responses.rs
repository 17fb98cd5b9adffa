use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use crate::models::domain::MatchResult;

/// Informational, non-fatal conditions encountered during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunNotice {
    /// Excluded from candidate generation for lack of category/preference data
    PreferenceDataMissing { id: String },
    /// Filtered candidate list came out empty
    NoFeasibleMatch { id: String },
    /// Isolated participant given one-directional candidates back
    CandidatesRecovered { id: String, count: usize },
    /// Fewer than two eligible participants for the assignment solve
    AssignmentInfeasible { matcher: String },
}

/// A matcher output labelled for comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedResult {
    pub name: String,
    pub result: MatchResult,
}

/// Grade breakdown for one result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GradeBreakdown {
    pub same_grade_pairs: usize,
    pub different_grade_pairs: usize,
    pub missing_grade_info: usize,
    /// grade gap -> pair count
    pub histogram: BTreeMap<u32, usize>,
}

impl GradeBreakdown {
    pub fn graded_pairs(&self) -> usize {
        self.same_grade_pairs + self.different_grade_pairs
    }
}

/// Summary statistics for one named result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSummary {
    pub name: String,
    pub total_pairs: usize,
    pub unpaired: usize,
    /// `None` when there are no pairs
    pub average_quality: Option<f64>,
    /// `None` when no pair carries a grade difference
    pub grades: Option<GradeBreakdown>,
}

/// Comparison of all named results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub summaries: Vec<MatchSummary>,
    /// Name of the result with the highest average quality
    pub best_quality: Option<String>,
}

/// Everything produced by one engine run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairingRun {
    pub run_id: uuid::Uuid,
    pub generated_at: chrono::DateTime<chrono::Utc>,
    pub strategy: String,
    pub results: Vec<NamedResult>,
    pub report: AnalysisReport,
    pub notices: Vec<RunNotice>,
}

impl PairingRun {
    pub fn result(&self, name: &str) -> Option<&MatchResult> {
        self.results.iter().find(|r| r.name == name).map(|r| &r.result)
    }
}
