//! Pipeline configuration
//!
//! One immutable `PipelineConfig` value is validated up front and threaded
//! through every stage call. It deserializes from YAML with camelCase keys;
//! every field has a default, so a partial file is valid.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}

/// Options consumed by the concept pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineConfig {
    /// Consolidation threshold: minimum cosine similarity for two candidates
    /// to be merged as synonyms
    pub similarity_threshold: f64,
    /// Minimum cosine similarity between a label and a sentence window for
    /// paraphrase evidence
    pub evidence_threshold: f64,
    pub max_hierarchy_levels: usize,
    pub min_cluster_size: usize,
    /// Forwarded to the embedding model only
    pub random_seed: u64,
    pub extraction: ExtractionConfig,
    pub scoring: ConfidenceWeights,
    pub clustering: ClusteringConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.9,
            evidence_threshold: 0.8,
            max_hierarchy_levels: 4,
            min_cluster_size: 2,
            random_seed: 42,
            extraction: ExtractionConfig::default(),
            scoring: ConfidenceWeights::default(),
            clustering: ClusteringConfig::default(),
        }
    }
}

/// Candidate extraction knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractionConfig {
    /// Abstract or full text must reach this many characters
    pub min_document_chars: usize,
    pub max_phrase_tokens: usize,
    /// Per extractor, per paper
    pub max_candidates_per_paper: usize,
    pub textrank_window: usize,
    pub textrank_damping: f64,
    pub textrank_iterations: usize,
    /// Share of TF-IDF in the statistical score; the rest is TextRank
    pub tfidf_weight: f64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_document_chars: 200,
            max_phrase_tokens: 4,
            max_candidates_per_paper: 15,
            textrank_window: 3,
            textrank_damping: 0.85,
            textrank_iterations: 100,
            tfidf_weight: 0.5,
        }
    }
}

/// Blend weights for evidence confidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfidenceWeights {
    /// Weight of lexical match strength
    pub lexical_weight: f64,
    /// Weight of the corroborating-strategy count
    pub corroboration_weight: f64,
    /// Strength multiplier applied to paraphrase (embedding-only) matches
    pub paraphrase_scale: f64,
    /// Strategy count at which corroboration saturates
    pub saturation_strategies: usize,
    pub max_evidence_per_concept: usize,
}

impl Default for ConfidenceWeights {
    fn default() -> Self {
        Self {
            lexical_weight: 0.8,
            corroboration_weight: 0.2,
            paraphrase_scale: 0.7,
            saturation_strategies: 3,
            max_evidence_per_concept: 25,
        }
    }
}

/// Dendrogram cutoff selection knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClusteringConfig {
    pub min_hierarchy_levels: usize,
    /// A gap is significant when it is at least this multiple of the mean gap
    pub gap_significance: f64,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            min_hierarchy_levels: 1,
            gap_significance: 1.0,
        }
    }
}

impl PipelineConfig {
    /// Parse from YAML and validate
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a YAML file and validate
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Same configuration with a different seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    /// Check every option against its documented range
    pub fn validate(&self) -> Result<(), ConfigError> {
        unit_interval("similarityThreshold", self.similarity_threshold)?;
        unit_interval("evidenceThreshold", self.evidence_threshold)?;
        at_least_one("maxHierarchyLevels", self.max_hierarchy_levels)?;
        at_least_one("minClusterSize", self.min_cluster_size)?;

        let e = &self.extraction;
        at_least_one("extraction.maxPhraseTokens", e.max_phrase_tokens)?;
        at_least_one("extraction.maxCandidatesPerPaper", e.max_candidates_per_paper)?;
        at_least_one("extraction.textrankWindow", e.textrank_window)?;
        at_least_one("extraction.textrankIterations", e.textrank_iterations)?;
        if !(e.textrank_damping > 0.0 && e.textrank_damping < 1.0) {
            return Err(invalid(
                "extraction.textrankDamping",
                format!("must be in (0,1), got {}", e.textrank_damping),
            ));
        }
        if !(0.0..=1.0).contains(&e.tfidf_weight) {
            return Err(invalid(
                "extraction.tfidfWeight",
                format!("must be in [0,1], got {}", e.tfidf_weight),
            ));
        }

        let s = &self.scoring;
        non_negative("scoring.lexicalWeight", s.lexical_weight)?;
        non_negative("scoring.corroborationWeight", s.corroboration_weight)?;
        if s.lexical_weight + s.corroboration_weight <= 0.0 {
            return Err(invalid(
                "scoring",
                "lexicalWeight and corroborationWeight must not both be zero".to_string(),
            ));
        }
        unit_interval("scoring.paraphraseScale", s.paraphrase_scale)?;
        at_least_one("scoring.saturationStrategies", s.saturation_strategies)?;
        at_least_one("scoring.maxEvidencePerConcept", s.max_evidence_per_concept)?;

        let c = &self.clustering;
        at_least_one("clustering.minHierarchyLevels", c.min_hierarchy_levels)?;
        if c.min_hierarchy_levels > self.max_hierarchy_levels {
            return Err(invalid(
                "clustering.minHierarchyLevels",
                format!(
                    "{} exceeds maxHierarchyLevels {}",
                    c.min_hierarchy_levels, self.max_hierarchy_levels
                ),
            ));
        }
        non_negative("clustering.gapSignificance", c.gap_significance)?;

        Ok(())
    }
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::Invalid { field, reason }
}

fn unit_interval(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("must be in (0,1], got {}", value)))
    }
}

fn at_least_one(field: &'static str, value: usize) -> Result<(), ConfigError> {
    if value >= 1 {
        Ok(())
    } else {
        Err(invalid(field, "must be at least 1".to_string()))
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("must be finite and >= 0, got {}", value)))
    }
}
