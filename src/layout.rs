//! Layout configuration: global defaults plus per-entity overrides.
//!
//! ```yaml
//! defaults:
//!   chart_type: scatter_plot
//!   num_plots: 3
//! overrides:
//!   CA:
//!     chart_type: bar_chart
//! entities: [CA, TX]
//! site:
//!   title: Regional Gallery
//!   max_concurrent: 6
//!   root_margin: 200px
//! ```
//!
//! Resolution is a shallow merge: override keys replace default keys wholesale,
//! nested maps are never merged.

use crate::models::ParamSet;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::OnceLock;
use thiserror::Error;

pub const CHART_TYPE_KEY: &str = "chart_type";
pub const NUM_PLOTS_KEY: &str = "num_plots";

/// Largest `num_plots` a single page may request.
pub const MAX_PLOTS_PER_PAGE: usize = 10_000;

pub const DEFAULT_TITLE: &str = "Plot Gallery";
pub const DEFAULT_MAX_CONCURRENT: usize = 6;
pub const DEFAULT_ROOT_MARGIN: &str = "200px";

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("cannot read layout file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed layout configuration: {0}")]
    Parse(String),
    #[error("{scope}: missing required key `{key}`")]
    MissingKey { scope: String, key: &'static str },
    #[error("{scope}: `{key}` {reason}")]
    InvalidValue {
        scope: String,
        key: &'static str,
        reason: String,
    },
    #[error("invalid entity key `{0}` (allowed: letters, digits, `_` and `-`)")]
    InvalidEntity(String),
    #[error("entity `{0}` is listed more than once")]
    DuplicateEntity(String),
    #[error("site.max_concurrent must be greater than zero")]
    InvalidConcurrency,
}

/// Page-independent options for the emitted site.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SiteOptions {
    pub title: String,
    pub max_concurrent: usize,
    pub root_margin: String,
}

impl Default for SiteOptions {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.into(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            root_margin: DEFAULT_ROOT_MARGIN.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayoutConfig {
    pub defaults: ParamSet,
    #[serde(default)]
    pub overrides: BTreeMap<String, ParamSet>,
    /// Pages to generate, in order. Empty means "every overridden entity".
    #[serde(default)]
    pub entities: Vec<String>,
    #[serde(default)]
    pub site: SiteOptions,
}

/// Validated view of a merged [`ParamSet`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedParams {
    pub chart_type: String,
    pub num_plots: usize,
    /// Everything except `chart_type` and `num_plots`; passed to plot modules.
    pub extra: ParamSet,
}

impl ResolvedParams {
    /// Check the two required keys of a merged parameter set.
    pub fn from_params(scope: &str, mut params: ParamSet) -> Result<Self, LayoutError> {
        let chart_type = match params.remove(CHART_TYPE_KEY) {
            None | Some(Value::Null) => {
                return Err(LayoutError::MissingKey {
                    scope: scope.into(),
                    key: CHART_TYPE_KEY,
                });
            }
            Some(Value::String(s)) if !s.trim().is_empty() => s,
            Some(other) => {
                return Err(LayoutError::InvalidValue {
                    scope: scope.into(),
                    key: CHART_TYPE_KEY,
                    reason: format!("must be a non-empty string, got {}", other),
                });
            }
        };
        let num_plots = match params.remove(NUM_PLOTS_KEY) {
            None | Some(Value::Null) => {
                return Err(LayoutError::MissingKey {
                    scope: scope.into(),
                    key: NUM_PLOTS_KEY,
                });
            }
            Some(v) => {
                let n = v
                    .as_u64()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| LayoutError::InvalidValue {
                        scope: scope.into(),
                        key: NUM_PLOTS_KEY,
                        reason: format!("must be a positive integer, got {}", v),
                    })?;
                usize::try_from(n)
                    .ok()
                    .filter(|n| *n <= MAX_PLOTS_PER_PAGE)
                    .ok_or_else(|| LayoutError::InvalidValue {
                        scope: scope.into(),
                        key: NUM_PLOTS_KEY,
                        reason: format!("must be at most {}, got {}", MAX_PLOTS_PER_PAGE, n),
                    })?
            }
        };
        Ok(Self {
            chart_type,
            num_plots,
            extra: params,
        })
    }
}

fn entity_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("static regex"))
}

/// Entity keys become file names and anchor-id segments.
pub fn is_valid_entity(key: &str) -> bool {
    entity_pattern().is_match(key)
}

/// Shallow merge of the entity's override (if any) onto a copy of the defaults.
pub fn resolve_params(config: &LayoutConfig, entity: &str) -> ParamSet {
    let mut merged = config.defaults.clone();
    if let Some(overrides) = config.overrides.get(entity) {
        for (k, v) in overrides {
            merged.insert(k.clone(), v.clone());
        }
    }
    merged
}

/// Merge and validate the effective parameters for one page.
pub fn resolve(config: &LayoutConfig, entity: &str) -> Result<ResolvedParams, LayoutError> {
    if !is_valid_entity(entity) {
        return Err(LayoutError::InvalidEntity(entity.to_string()));
    }
    let scope = if config.overrides.contains_key(entity) {
        format!("entity `{}`", entity)
    } else {
        "defaults".to_string()
    };
    ResolvedParams::from_params(&scope, resolve_params(config, entity))
}

impl LayoutConfig {
    /// Config with the given defaults and nothing else.
    pub fn with_defaults(defaults: ParamSet) -> Self {
        Self {
            defaults,
            overrides: BTreeMap::new(),
            entities: Vec::new(),
            site: SiteOptions::default(),
        }
    }

    /// Load and validate a YAML (`.yaml`/`.yml`) or JSON (`.json`) layout.
    /// Other extensions are parsed as YAML, which also accepts JSON.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LayoutError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| LayoutError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        let config = if is_json {
            Self::from_json_str(&text)?
        } else {
            Self::from_yaml_str(&text)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(s: &str) -> Result<Self, LayoutError> {
        serde_yaml::from_str(s).map_err(|e| LayoutError::Parse(e.to_string()))
    }

    pub fn from_json_str(s: &str) -> Result<Self, LayoutError> {
        serde_json::from_str(s).map_err(|e| LayoutError::Parse(e.to_string()))
    }

    /// Fail fast on anything that would only surface halfway through a build.
    pub fn validate(&self) -> Result<(), LayoutError> {
        ResolvedParams::from_params("defaults", self.defaults.clone())?;
        for entity in self.overrides.keys().chain(self.entities.iter()) {
            resolve(self, entity)?;
        }
        let mut seen = BTreeSet::new();
        for entity in &self.entities {
            if !seen.insert(entity.as_str()) {
                return Err(LayoutError::DuplicateEntity(entity.clone()));
            }
        }
        if self.site.max_concurrent == 0 {
            return Err(LayoutError::InvalidConcurrency);
        }
        Ok(())
    }

    /// Configured page order, or the sorted override keys when none is given.
    pub fn entities(&self) -> Vec<String> {
        if self.entities.is_empty() {
            self.overrides.keys().cloned().collect()
        } else {
            self.entities.clone()
        }
    }
}
