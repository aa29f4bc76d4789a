//! Plot modules and the registry that dispatches to them.
//!
//! A plot module implements [`Plot`]: static [`PlotMetadata`] plus a pure
//! `create(seed, params)` that returns a Vega-Lite [`ChartSpec`]. Modules are
//! made available to the [`Registry`] through [`PlotSource`] entries; adding a
//! chart type only means appending one entry to [`builtin_sources`].
//!
//! ### Example
//! ```
//! use plot_gallery::plots::Registry;
//! use plot_gallery::models::ParamSet;
//!
//! let registry = Registry::builtin();
//! let spec = registry.create("bar_chart", 42, &ParamSet::new())?;
//! assert!(spec.is_some());
//! assert!(registry.create("pie_chart", 42, &ParamSet::new())?.is_none());
//! # Ok::<(), plot_gallery::plots::PlotError>(())
//! ```

pub mod bar_chart;
pub mod heatmap;
pub mod line_chart;
pub mod scatter_plot;
pub mod synth;

use crate::models::{ChartSpec, ParamSet, PlotMetadata};
use log::{debug, warn};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Errors raised by plot modules.
///
/// A load error makes discovery skip the source. A construction error is
/// fatal for the caller: it means a layout or a module is broken.
#[derive(Debug, Error)]
pub enum PlotError {
    #[error("failed to load plot source `{source_name}`: {reason}")]
    Load { source_name: String, reason: String },
    #[error("plot `{plot_id}`: invalid parameter `{param}`: {reason}")]
    InvalidParam {
        plot_id: String,
        param: String,
        reason: String,
    },
}

/// Capability contract every plot module satisfies.
pub trait Plot: Send + Sync {
    fn metadata(&self) -> PlotMetadata;

    /// Build a chart spec. Must be pure in `(seed, params)`.
    fn create(&self, seed: u64, params: &ParamSet) -> Result<ChartSpec, PlotError>;
}

/// A compiled-in plot module candidate.
#[derive(Clone, Copy)]
pub struct PlotSource {
    pub name: &'static str,
    pub load: fn() -> Result<Box<dyn Plot>, PlotError>,
}

impl fmt::Debug for PlotSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlotSource").field("name", &self.name).finish()
    }
}

/// Plot sources shipped with the crate.
pub fn builtin_sources() -> Vec<PlotSource> {
    vec![
        PlotSource {
            name: "bar_chart",
            load: || Ok(Box::new(bar_chart::BarChart)),
        },
        PlotSource {
            name: "heatmap",
            load: || Ok(Box::new(heatmap::Heatmap)),
        },
        PlotSource {
            name: "line_chart",
            load: || Ok(Box::new(line_chart::LineChart)),
        },
        PlotSource {
            name: "scatter_plot",
            load: || Ok(Box::new(scatter_plot::ScatterPlot)),
        },
    ]
}

/// Reasons a loaded module is rejected.
fn metadata_problem(meta: &PlotMetadata) -> Option<&'static str> {
    if meta.id.trim().is_empty() {
        Some("empty id")
    } else if meta.title.trim().is_empty() {
        Some("empty title")
    } else if !meta.estimated_render_time.is_finite() || meta.estimated_render_time < 0.0 {
        Some("estimated_render_time must be a finite, non-negative number")
    } else {
        None
    }
}

struct Registered {
    metadata: PlotMetadata,
    plot: Box<dyn Plot>,
}

/// Plot id -> module mapping. Read-only once built.
pub struct Registry {
    plots: BTreeMap<String, Registered>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("plots", &self.plots.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Registry {
    /// Registry over [`builtin_sources`].
    pub fn builtin() -> Self {
        Self::discover(builtin_sources())
    }

    /// Load and validate every source. Bad sources are skipped with a warning;
    /// discovery itself never fails.
    pub fn discover(sources: impl IntoIterator<Item = PlotSource>) -> Self {
        let mut plots = BTreeMap::new();
        for source in sources {
            let plot = match (source.load)() {
                Ok(p) => p,
                Err(e) => {
                    warn!("skipping plot source `{}`: {}", source.name, e);
                    continue;
                }
            };
            let metadata = plot.metadata();
            if let Some(problem) = metadata_problem(&metadata) {
                warn!("skipping plot source `{}`: {}", source.name, problem);
                continue;
            }
            if plots.contains_key(&metadata.id) {
                warn!(
                    "skipping plot source `{}`: duplicate plot id `{}`",
                    source.name, metadata.id
                );
                continue;
            }
            debug!("registered plot `{}` from `{}`", metadata.id, source.name);
            plots.insert(metadata.id.clone(), Registered { metadata, plot });
        }
        Self { plots }
    }

    pub fn lookup(&self, plot_id: &str) -> Option<&dyn Plot> {
        self.plots.get(plot_id).map(|r| r.plot.as_ref())
    }

    pub fn metadata(&self, plot_id: &str) -> Option<&PlotMetadata> {
        self.plots.get(plot_id).map(|r| &r.metadata)
    }

    /// Dispatch to a module.
    ///
    /// `Ok(None)` means the id is not registered; callers decide the fallback.
    pub fn create(
        &self,
        plot_id: &str,
        seed: u64,
        params: &ParamSet,
    ) -> Result<Option<ChartSpec>, PlotError> {
        match self.plots.get(plot_id) {
            Some(r) => r.plot.create(seed, params).map(Some),
            None => Ok(None),
        }
    }

    /// Metadata of every registered module, sorted by id.
    pub fn list(&self) -> Vec<PlotMetadata> {
        self.plots.values().map(|r| r.metadata.clone()).collect()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.plots.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.plots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Nameless;

    impl Plot for Nameless {
        fn metadata(&self) -> PlotMetadata {
            PlotMetadata {
                id: "".into(),
                title: "No id".into(),
                tags: vec![],
                estimated_render_time: 0.1,
            }
        }

        fn create(&self, _seed: u64, _params: &ParamSet) -> Result<ChartSpec, PlotError> {
            Ok(ChartSpec(json!({})))
        }
    }

    #[test]
    fn builtin_registry_has_four_modules() {
        let reg = Registry::builtin();
        let ids: Vec<&str> = reg.ids().collect();
        assert_eq!(ids, ["bar_chart", "heatmap", "line_chart", "scatter_plot"]);
    }

    #[test]
    fn invalid_metadata_is_skipped() {
        let mut sources = builtin_sources();
        sources.push(PlotSource {
            name: "nameless",
            load: || Ok(Box::new(Nameless)),
        });
        let reg = Registry::discover(sources);
        assert_eq!(reg.len(), 4);
        assert!(reg.lookup("").is_none());
    }

    #[test]
    fn duplicate_ids_keep_first_registration() {
        let mut sources = builtin_sources();
        sources.push(PlotSource {
            name: "bar_chart_again",
            load: || Ok(Box::new(bar_chart::BarChart)),
        });
        let reg = Registry::discover(sources);
        assert_eq!(reg.len(), 4);
    }

    #[test]
    fn unknown_id_is_a_sentinel_not_an_error() {
        let reg = Registry::builtin();
        let got = reg.create("violin", 1, &ParamSet::new()).unwrap();
        assert!(got.is_none());
    }
}
