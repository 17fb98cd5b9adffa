// Model exports
pub mod domain;
pub mod options;
pub mod responses;

pub use domain::{grade_gap, Candidate, CandidateList, CandidatePool, MatchResult, Pair, Participant};
pub use options::{
    EngineConfig, GradeBlend, GradePenaltyTable, PointPairing, PreferenceMode, PreferenceRules,
    SimilarityStrategy, DEFAULT_GRADE_PENALTY_STEPS, MIN_MATCH_QUALITY,
};
pub use responses::{AnalysisReport, GradeBreakdown, MatchSummary, NamedResult, PairingRun, RunNotice};
