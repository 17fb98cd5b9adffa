use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use crate::error::EngineError;
use crate::models::{
    EngineConfig, GradePenaltyTable, PointPairing, PreferenceMode, PreferenceRules, SimilarityStrategy,
    DEFAULT_GRADE_PENALTY_STEPS, MIN_MATCH_QUALITY,
};

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub engine: EngineSettings,
    #[serde(default)]
    pub preferences: PreferenceSettings,
    #[serde(default)]
    pub grades: GradeSettings,
    #[serde(default)]
    pub input: InputSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineSettings {
    #[serde(default = "default_quality_weight")]
    pub quality_weight: f64,
    #[serde(default)]
    pub grade_weight: f64,
    #[serde(default)]
    pub max_grade_difference: Option<u32>,
    #[serde(default = "default_min_match_quality")]
    pub min_match_quality: f64,
    /// `geometric` or `cosine`
    #[serde(default = "default_similarity")]
    pub similarity: String,
    /// `all_pairs` or `consecutive`; geometric only
    #[serde(default = "default_point_pairing")]
    pub point_pairing: String,
    /// Mean-center vectors first; cosine only
    #[serde(default)]
    pub centered: bool,
    #[serde(default)]
    pub recover_isolated: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            quality_weight: default_quality_weight(),
            grade_weight: 0.0,
            max_grade_difference: None,
            min_match_quality: default_min_match_quality(),
            similarity: default_similarity(),
            point_pairing: default_point_pairing(),
            centered: false,
            recover_isolated: false,
        }
    }
}

fn default_quality_weight() -> f64 { 0.5 }
fn default_min_match_quality() -> f64 { MIN_MATCH_QUALITY }
fn default_similarity() -> String { "geometric".to_string() }
fn default_point_pairing() -> String { "all_pairs".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct PreferenceSettings {
    /// `lenient` or `strict`
    #[serde(default = "default_preference_mode")]
    pub mode: String,
    #[serde(default = "default_wildcard_tokens")]
    pub wildcard_tokens: Vec<String>,
    #[serde(default = "default_none_tokens")]
    pub none_tokens: Vec<String>,
    #[serde(default)]
    pub equivalences: HashMap<String, Vec<String>>,
}

impl Default for PreferenceSettings {
    fn default() -> Self {
        Self {
            mode: default_preference_mode(),
            wildcard_tokens: default_wildcard_tokens(),
            none_tokens: default_none_tokens(),
            equivalences: HashMap::new(),
        }
    }
}

fn default_preference_mode() -> String { "lenient".to_string() }
fn default_wildcard_tokens() -> Vec<String> { PreferenceRules::default().wildcard_tokens }
fn default_none_tokens() -> Vec<String> { PreferenceRules::default().none_tokens }

#[derive(Debug, Clone, Deserialize)]
pub struct GradeSettings {
    #[serde(default = "default_penalty_steps")]
    pub penalty_steps: Vec<f64>,
}

impl Default for GradeSettings {
    fn default() -> Self {
        Self {
            penalty_steps: default_penalty_steps(),
        }
    }
}

fn default_penalty_steps() -> Vec<f64> { DEFAULT_GRADE_PENALTY_STEPS.to_vec() }

#[derive(Debug, Clone, Deserialize)]
pub struct InputSettings {
    /// Used when no path is given on the command line
    #[serde(default)]
    pub participants_path: Option<String>,
    /// `text` or `json`
    #[serde(default = "default_output_format")]
    pub output_format: String,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            participants_path: None,
            output_format: default_output_format(),
        }
    }
}

fn default_output_format() -> String { "text".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "full".to_string() }

fn environment() -> Environment {
    // e.g., PAIRING__ENGINE__QUALITY_WEIGHT -> engine.quality_weight
    Environment::with_prefix("PAIRING")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with PAIRING__)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(environment())
            .build()?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment())
            .build()?;

        settings.try_deserialize()
    }

    pub fn similarity_strategy(&self) -> Result<SimilarityStrategy, EngineError> {
        match self.engine.similarity.trim().to_ascii_lowercase().as_str() {
            "geometric" => {
                let pairing: PointPairing = self
                    .engine
                    .point_pairing
                    .parse()
                    .map_err(EngineError::InvalidConfig)?;
                Ok(SimilarityStrategy::Geometric { pairing })
            }
            "cosine" => Ok(SimilarityStrategy::Cosine {
                centered: self.engine.centered,
            }),
            other => Err(EngineError::InvalidConfig(format!(
                "unknown similarity strategy '{}'",
                other
            ))),
        }
    }

    /// Build the validated run configuration
    ///
    /// # Errors
    /// `EngineError::InvalidConfig` for unknown names, a malformed penalty
    /// table, or a weight outside [0, 1]
    pub fn engine_config(&self) -> Result<EngineConfig, EngineError> {
        let preference_mode: PreferenceMode = self
            .preferences
            .mode
            .parse()
            .map_err(EngineError::InvalidConfig)?;
        let grade_penalty =
            GradePenaltyTable::new(self.grades.penalty_steps.clone()).map_err(EngineError::InvalidConfig)?;

        let config = EngineConfig {
            quality_weight: self.engine.quality_weight,
            grade_weight: self.engine.grade_weight,
            max_grade_difference: self.engine.max_grade_difference,
            min_match_quality: self.engine.min_match_quality,
            preference_mode,
            similarity_strategy: self.similarity_strategy()?,
            grade_penalty,
            preference_rules: PreferenceRules {
                wildcard_tokens: self.preferences.wildcard_tokens.clone(),
                none_tokens: self.preferences.none_tokens.clone(),
                equivalences: self.preferences.equivalences.clone(),
            },
            recover_isolated: self.engine.recover_isolated,
        };

        validator::Validate::validate(&config)?;
        Ok(config)
    }
}
