use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// How answer vectors are turned into 2-D points for the geometric strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointPairing {
    /// Every unordered index pair `(i, j)` with `i < j`
    #[default]
    AllPairs,
    /// `(v0, v1), (v2, v3), ...`; an odd trailing value is paired with itself
    Consecutive,
}

impl FromStr for PointPairing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all_pairs" | "all" => Ok(Self::AllPairs),
            "consecutive" => Ok(Self::Consecutive),
            other => Err(format!("unknown point pairing '{}'", other)),
        }
    }
}

/// Named similarity strategies
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SimilarityStrategy {
    /// `exp(-d)` between centroid-distance profiles
    Geometric { pairing: PointPairing },
    /// Cosine of the angle between answer vectors
    Cosine { centered: bool },
}

impl Default for SimilarityStrategy {
    fn default() -> Self {
        Self::Geometric {
            pairing: PointPairing::AllPairs,
        }
    }
}

impl fmt::Display for SimilarityStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Geometric { pairing } => write!(f, "geometric ({:?})", pairing),
            Self::Cosine { centered: true } => write!(f, "cosine (centered)"),
            Self::Cosine { centered: false } => write!(f, "cosine"),
        }
    }
}

/// Strictness of the mutual preference check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferenceMode {
    /// Wildcards, literal codes and the equivalence table all count
    #[default]
    Lenient,
    /// Both directions must name the peer's category literally
    Strict,
}

impl FromStr for PreferenceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            other => Err(format!("unknown preference mode '{}'", other)),
        }
    }
}

/// Tokens and the category equivalence table used by the preference filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceRules {
    /// Preference tokens that accept every category
    pub wildcard_tokens: Vec<String>,
    /// Preference tokens that accept no category
    pub none_tokens: Vec<String>,
    /// Preference code -> categories it also accepts
    pub equivalences: HashMap<String, Vec<String>>,
}

impl Default for PreferenceRules {
    fn default() -> Self {
        Self {
            wildcard_tokens: vec!["any".to_string(), "no preference".to_string()],
            none_tokens: vec!["none".to_string()],
            equivalences: HashMap::new(),
        }
    }
}

impl PreferenceRules {
    pub fn with_equivalence<I, S>(mut self, code: impl Into<String>, accepted: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.equivalences
            .insert(code.into(), accepted.into_iter().map(Into::into).collect());
        self
    }

    pub fn is_wildcard(&self, token: &str) -> bool {
        self.wildcard_tokens
            .iter()
            .any(|w| w.trim().eq_ignore_ascii_case(token.trim()))
    }

    pub fn is_none(&self, token: &str) -> bool {
        self.none_tokens
            .iter()
            .any(|w| w.trim().eq_ignore_ascii_case(token.trim()))
    }
}

/// Default grade penalty steps: index = grade gap, last entry saturates
pub const DEFAULT_GRADE_PENALTY_STEPS: [f64; 4] = [0.0, 0.3, 0.6, 1.0];

/// Step function from grade gap to a cost in [0, 1]
///
/// (De)serialized as a plain array; deserialization goes through `new`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct GradePenaltyTable {
    steps: Vec<f64>,
}

impl GradePenaltyTable {
    /// Steps must be non-empty, start at 0, stay within [0, 1] and never decrease
    pub fn new(steps: Vec<f64>) -> Result<Self, String> {
        if steps.is_empty() {
            return Err("grade penalty table needs at least one step".to_string());
        }
        if steps[0] != 0.0 {
            return Err("grade penalty for equal grades must be 0".to_string());
        }
        if steps.iter().any(|s| !s.is_finite() || *s < 0.0 || *s > 1.0) {
            return Err("grade penalty steps must lie within [0, 1]".to_string());
        }
        if steps.windows(2).any(|w| w[1] < w[0]) {
            return Err("grade penalty steps must be non-decreasing".to_string());
        }
        Ok(Self { steps })
    }

    #[inline]
    pub fn penalty(&self, gap: u32) -> f64 {
        let last = self.steps.len() - 1;
        self.steps[(gap as usize).min(last)]
    }

    pub fn steps(&self) -> &[f64] {
        &self.steps
    }
}

impl TryFrom<Vec<f64>> for GradePenaltyTable {
    type Error = String;

    fn try_from(steps: Vec<f64>) -> Result<Self, Self::Error> {
        Self::new(steps)
    }
}

impl From<GradePenaltyTable> for Vec<f64> {
    fn from(table: GradePenaltyTable) -> Self {
        table.steps
    }
}

impl Default for GradePenaltyTable {
    fn default() -> Self {
        Self {
            steps: DEFAULT_GRADE_PENALTY_STEPS.to_vec(),
        }
    }
}

/// Grade-proximity blending applied on top of rank costs
#[derive(Debug, Clone, PartialEq)]
pub struct GradeBlend {
    pub weight: f64,
    pub penalty: GradePenaltyTable,
    pub max_difference: Option<u32>,
}

/// Minimum `1 - cost` for an optimal assignment to be kept
pub const MIN_MATCH_QUALITY: f64 = 0.3;

/// Explicit run configuration passed into the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct EngineConfig {
    /// 0 favours pair count, 1 favours pair quality
    #[validate(range(min = 0.0, max = 1.0))]
    pub quality_weight: f64,
    /// 0 disables grade blending
    #[validate(range(min = 0.0, max = 1.0))]
    pub grade_weight: f64,
    /// `None` means unrestricted
    pub max_grade_difference: Option<u32>,
    #[validate(range(min = 0.0, max = 1.0))]
    pub min_match_quality: f64,
    pub preference_mode: PreferenceMode,
    pub similarity_strategy: SimilarityStrategy,
    pub grade_penalty: GradePenaltyTable,
    pub preference_rules: PreferenceRules,
    /// Re-admit one-directional candidates for participants left with none
    pub recover_isolated: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            quality_weight: 0.5,
            grade_weight: 0.0,
            max_grade_difference: None,
            min_match_quality: MIN_MATCH_QUALITY,
            preference_mode: PreferenceMode::default(),
            similarity_strategy: SimilarityStrategy::default(),
            grade_penalty: GradePenaltyTable::default(),
            preference_rules: PreferenceRules::default(),
            recover_isolated: false,
        }
    }
}

impl EngineConfig {
    /// Grade blending parameters, if enabled
    pub fn grade_blend(&self) -> Option<GradeBlend> {
        if self.grade_weight <= 0.0 {
            return None;
        }
        Some(GradeBlend {
            weight: self.grade_weight,
            penalty: self.grade_penalty.clone(),
            max_difference: self.max_grade_difference,
        })
    }
}
