use std::sync::Arc;
use validator::Validate;
use crate::core::{
    analysis::summarize_named,
    cancel::CancelFlag,
    filters::{FilterOutcome, PreferenceFilter},
    greedy::GreedyMatcher,
    optimal::OptimalMatcher,
    similarity::SimilarityModel,
};
use crate::error::EngineError;
use crate::models::{CandidatePool, EngineConfig, NamedResult, PairingRun, Participant, RunNotice};

pub const GREEDY: &str = "Greedy";
pub const HUNGARIAN: &str = "Hungarian";
pub const GRADE_SENSITIVE_GREEDY: &str = "Grade-Sensitive Greedy";
pub const GRADE_SENSITIVE_HUNGARIAN: &str = "Grade-Sensitive Hungarian";

/// One matcher invocation planned for a run
#[derive(Debug, Clone)]
enum MatcherJob {
    Greedy(&'static str, GreedyMatcher),
    Optimal(&'static str, OptimalMatcher),
}

impl MatcherJob {
    fn name(&self) -> &'static str {
        match self {
            MatcherJob::Greedy(name, _) | MatcherJob::Optimal(name, _) => *name,
        }
    }

    fn execute(&self, pool: &CandidatePool) -> Result<NamedResult, EngineError> {
        let result = match self {
            MatcherJob::Greedy(_, matcher) => matcher.pair(pool),
            MatcherJob::Optimal(_, matcher) => matcher.pair(pool)?,
        };
        debug_assert!(
            result.is_partition_of(pool.roster()),
            "{} broke the partition invariant",
            self.name()
        );
        Ok(NamedResult {
            name: self.name().to_string(),
            result,
        })
    }
}

/// Pipeline orchestrator
///
/// # Pipeline Stages
/// 1. Similarity model over the answer vectors
/// 2. Ranked candidate lists
/// 3. Mutual preference filtering
/// 4. Greedy and optimal matchers (plus grade-sensitive variants)
/// 5. Analysis of all results
#[derive(Debug, Clone)]
pub struct PairingEngine {
    config: EngineConfig,
    cancel: CancelFlag,
}

impl PairingEngine {
    /// # Errors
    /// `EngineError::InvalidConfig` if a weight lies outside [0, 1]
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            config,
            cancel: CancelFlag::default(),
        })
    }

    pub fn with_defaults() -> Self {
        Self {
            config: EngineConfig::default(),
            cancel: CancelFlag::default(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Handle for cancelling runs of this engine from another thread
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Stages 1-3: similarity, candidate lists and preference filtering
    pub fn candidate_pool(&self, participants: &[Participant]) -> Result<FilterOutcome, EngineError> {
        self.cancel.checkpoint("similarity")?;

        let matrix = SimilarityModel::new(self.config.similarity_strategy).compute(participants)?;
        let lists = matrix.candidate_lists();

        let outcome = PreferenceFilter::new(
            self.config.preference_mode,
            self.config.preference_rules.clone(),
        )
        .with_recovery(self.config.recover_isolated)
        .filter(&lists, participants);

        Ok(outcome)
    }

    fn plan(&self, pool: &CandidatePool) -> Vec<MatcherJob> {
        let qw = self.config.quality_weight;
        let optimal = OptimalMatcher::new(qw)
            .with_min_quality(self.config.min_match_quality)
            .with_cancel(self.cancel.clone());

        let mut jobs = vec![
            MatcherJob::Greedy(GREEDY, GreedyMatcher::new(qw)),
            MatcherJob::Optimal(HUNGARIAN, optimal.clone()),
        ];

        if let Some(blend) = self.config.grade_blend() {
            if pool.has_grades() {
                jobs.push(MatcherJob::Greedy(
                    GRADE_SENSITIVE_GREEDY,
                    GreedyMatcher::new(qw).with_grade_gate(blend.max_difference),
                ));
                jobs.push(MatcherJob::Optimal(
                    GRADE_SENSITIVE_HUNGARIAN,
                    optimal.with_grade_blend(Some(blend)),
                ));
            } else {
                tracing::info!("Grade blending enabled but no grades supplied, skipping grade-sensitive matchers");
            }
        }

        jobs
    }

    fn infeasible_notices(jobs: &[MatcherJob], pool: &CandidatePool) -> Vec<RunNotice> {
        if pool.universe().len() >= 2 {
            return Vec::new();
        }
        jobs.iter()
            .filter(|job| matches!(job, MatcherJob::Optimal(..)))
            .map(|job| RunNotice::AssignmentInfeasible {
                matcher: job.name().to_string(),
            })
            .collect()
    }

    fn finish(&self, mut notices: Vec<RunNotice>, results: Vec<NamedResult>) -> PairingRun {
        let report = summarize_named(&results);

        for named in &results {
            tracing::info!(
                "{}: {} pairs, {} unpaired",
                named.name,
                named.result.pair_count(),
                named.result.unpaired.len()
            );
        }
        notices.dedup();

        PairingRun {
            run_id: uuid::Uuid::new_v4(),
            generated_at: chrono::Utc::now(),
            strategy: self.config.similarity_strategy.to_string(),
            results,
            report,
            notices,
        }
    }

    /// Run the whole pipeline on one snapshot of participants
    ///
    /// # Errors
    /// `DataError` for malformed input, `Cancelled` if the cancel flag is raised
    pub fn run(&self, participants: &[Participant]) -> Result<PairingRun, EngineError> {
        tracing::info!("Pairing run started for {} participants", participants.len());

        let outcome = self.candidate_pool(participants)?;
        let jobs = self.plan(&outcome.pool);

        let mut notices = outcome.notices();
        notices.extend(Self::infeasible_notices(&jobs, &outcome.pool));

        let results = jobs
            .iter()
            .map(|job| job.execute(&outcome.pool))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(self.finish(notices, results))
    }

    /// Same as `run`, with each matcher on its own blocking worker.
    ///
    /// Matchers never mutate their input, so the results equal those of `run`
    /// apart from the run id and timestamp.
    pub async fn run_parallel(&self, participants: Vec<Participant>) -> Result<PairingRun, EngineError> {
        tracing::info!("Parallel pairing run started for {} participants", participants.len());

        let engine = self.clone();
        let outcome = tokio::task::spawn_blocking(move || engine.candidate_pool(&participants))
            .await
            .map_err(|e| EngineError::Worker(e.to_string()))??;

        let jobs = self.plan(&outcome.pool);
        let mut notices = outcome.notices();
        notices.extend(Self::infeasible_notices(&jobs, &outcome.pool));

        let pool = Arc::new(outcome.pool);
        let handles: Vec<_> = jobs
            .into_iter()
            .map(|job| {
                let pool = Arc::clone(&pool);
                tokio::task::spawn_blocking(move || job.execute(&pool))
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            let named = handle.await.map_err(|e| EngineError::Worker(e.to_string()))??;
            results.push(named);
        }

        Ok(self.finish(notices, results))
    }
}

impl Default for PairingEngine {
    fn default() -> Self {
        Self::with_defaults()
    }
}
