//! Pairing Engine - compatibility matching for survey respondents
//!
//! This library turns questionnaire answers into a similarity model, filters
//! candidates by mutual preference and pairs participants with a fast greedy
//! matcher and a globally optimal assignment solver.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use crate::core::{CancelFlag, GreedyMatcher, OptimalMatcher, PairingEngine, PreferenceFilter, SimilarityModel};
pub use error::{DataError, EngineError};
pub use models::{
    AnalysisReport, CandidateList, CandidatePool, EngineConfig, MatchResult, Pair, PairingRun, Participant,
    PreferenceMode, RunNotice, SimilarityStrategy,
};
