// Core algorithm exports
pub mod analysis;
pub mod assignment;
pub mod cancel;
pub mod engine;
pub mod filters;
pub mod geometry;
pub mod greedy;
pub mod optimal;
pub mod scoring;
pub mod similarity;

pub use analysis::{summarize, summarize_named, summarize_one};
pub use assignment::{maximize_matching, solve, Assignment, CostMatrix};
pub use cancel::CancelFlag;
pub use engine::{PairingEngine, GRADE_SENSITIVE_GREEDY, GRADE_SENSITIVE_HUNGARIAN, GREEDY, HUNGARIAN};
pub use filters::{accepts, is_mutually_compatible, FilterOutcome, PreferenceFilter};
pub use greedy::GreedyMatcher;
pub use optimal::OptimalMatcher;
pub use scoring::{blend, grade_penalty, rank_cost, CostTable, NO_EDGE_COST};
pub use similarity::{SimilarityMatrix, SimilarityModel};
