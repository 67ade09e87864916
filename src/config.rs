//! Engine configuration
//!
//! Every heuristic constant of the extraction engine lives here so it can be
//! tuned per deployment. Defaults reproduce the stock behaviour.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level configuration for a [`crate::engine::PageEngine`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub selector: SelectorConfig,
    pub container: ContainerConfig,
    pub similarity: SimilarityThresholds,
    pub session: SessionConfig,
}

/// Selector generation limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Maximum class tokens in a `tag.a.b.c` selector.
    pub max_classes: usize,

    /// Maximum number of path segments in an `nth-of-type` path.
    pub max_path_depth: usize,

    /// State classes that never identify an element.
    pub transient_classes: Vec<String>,

    /// Prefix of classes added by the engine itself.
    pub engine_class_prefix: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            max_classes: 3,
            max_path_depth: 4,
            transient_classes: ["active", "hover", "selected", "focus"]
                .into_iter()
                .map(String::from)
                .collect(),
            engine_class_prefix: "extractor-".to_string(),
        }
    }
}

impl SelectorConfig {
    /// True if `class` is a state or engine class.
    pub fn is_transient(&self, class: &str) -> bool {
        class.starts_with(&self.engine_class_prefix)
            || self.transient_classes.iter().any(|c| c == class)
    }
}

/// Container inference heuristics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// Ancestors inspected for card markers, the exemplar included.
    pub max_card_depth: usize,

    /// Ancestors inspected for a layout container, starting at the parent.
    pub max_layout_depth: usize,

    /// Class substrings marking a repeated card or row.
    pub card_markers: Vec<String>,

    /// Class substring marking a grid column; siblings carrying it count as repeats.
    pub column_marker: String,

    /// Class substrings marking a layout container.
    pub layout_markers: Vec<String>,

    /// Siblings (candidate included) required to accept a card.
    pub min_repeated_siblings: usize,

    /// Children required to accept a layout container.
    pub min_layout_children: usize,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            max_card_depth: 8,
            max_layout_depth: 5,
            card_markers: ["card", "item", "product", "menu"]
                .into_iter()
                .map(String::from)
                .collect(),
            column_marker: "col-".to_string(),
            layout_markers: ["row", "grid"].into_iter().map(String::from).collect(),
            min_repeated_siblings: 2,
            min_layout_children: 3,
        }
    }
}

/// Thresholds of the structural similarity matcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityThresholds {
    /// Minimum `shared / max(count1, count2)` class overlap (inclusive).
    pub min_class_overlap: f64,

    /// Position similarity must be strictly greater than this.
    pub min_position_similarity: f64,
}

impl Default for SimilarityThresholds {
    fn default() -> Self {
        Self {
            min_class_overlap: 0.3,
            min_position_similarity: 0.8,
        }
    }
}

/// Selection session behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// How long the on-page hint stays visible, in milliseconds.
    pub hint_ttl_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { hint_ttl_ms: 2000 }
    }
}

impl SessionConfig {
    pub fn hint_ttl(&self) -> Duration {
        Duration::from_millis(self.hint_ttl_ms)
    }
}

impl EngineConfig {
    /// Parse a TOML document. Missing sections and keys fall back to defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Reject ratios outside `0.0..=1.0` and an empty engine class prefix.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        let ratio_ok = |v: f64| (0.0..=1.0).contains(&v);
        if !ratio_ok(self.similarity.min_class_overlap) {
            return Err(ConfigError::Invalid {
                field: "similarity.min_class_overlap",
                reason: format!("{} is outside 0.0..=1.0", self.similarity.min_class_overlap),
            });
        }
        if !ratio_ok(self.similarity.min_position_similarity) {
            return Err(ConfigError::Invalid {
                field: "similarity.min_position_similarity",
                reason: format!(
                    "{} is outside 0.0..=1.0",
                    self.similarity.min_position_similarity
                ),
            });
        }
        if self.selector.engine_class_prefix.is_empty() {
            return Err(ConfigError::Invalid {
                field: "selector.engine_class_prefix",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}
