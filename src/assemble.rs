//! Page assembly: seeds, anchor ids and registry dispatch with fallback.

use crate::layout::{self, LayoutConfig, LayoutError, ResolvedParams};
use crate::models::{ManifestEntry, PageManifest};
use crate::plots::{PlotError, Registry, scatter_plot};
use log::warn;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Used when a layout names a chart type the registry does not know.
pub const DEFAULT_PLOT_ID: &str = scatter_plot::ID;

/// Seeds are reduced into `0..SEED_RANGE`.
pub const SEED_RANGE: u64 = 10_000;

#[derive(Debug, Error)]
pub enum AssembleError {
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Plot(#[from] PlotError),
    #[error("fallback plot `{fallback}` is not registered (requested `{requested}`)")]
    MissingFallback { requested: String, fallback: String },
}

/// Stable seed for plot `index` on page `entity`.
///
/// Independent of process, platform and Rust version. Different pages may
/// share seeds; anchors never depend on them.
pub fn derive_seed(entity: &str, index: usize) -> u64 {
    let digest = Sha256::digest(format!("{}-{}", entity, index).as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(head) % SEED_RANGE
}

/// DOM id for plot `index` on page `entity`.
///
/// The index is always the trailing `-<digits>` segment, so the mapping is
/// injective over valid entity keys.
pub fn anchor_id(entity: &str, index: usize) -> String {
    format!("vis-{}-{}", entity, index)
}

#[derive(Debug)]
pub struct Assembler<'r> {
    registry: &'r Registry,
    fallback: String,
}

impl<'r> Assembler<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            fallback: DEFAULT_PLOT_ID.to_string(),
        }
    }

    pub fn with_fallback(mut self, plot_id: impl Into<String>) -> Self {
        self.fallback = plot_id.into();
        self
    }

    /// Build the manifest for one page.
    pub fn assemble(
        &self,
        entity: &str,
        params: &ResolvedParams,
    ) -> Result<PageManifest, AssembleError> {
        let mut entries = Vec::new();
        let mut warned = false;
        for i in 0..params.num_plots {
            let seed = derive_seed(entity, i);
            let (plot_id, spec) =
                match self.registry.create(&params.chart_type, seed, &params.extra)? {
                    Some(spec) => (params.chart_type.as_str(), spec),
                    None => {
                        if !warned {
                            warn!(
                                "page `{}`: unknown chart type `{}`, using `{}`",
                                entity, params.chart_type, self.fallback
                            );
                            warned = true;
                        }
                        let spec = self
                            .registry
                            .create(&self.fallback, seed, &params.extra)?
                            .ok_or_else(|| AssembleError::MissingFallback {
                                requested: params.chart_type.clone(),
                                fallback: self.fallback.clone(),
                            })?;
                        (self.fallback.as_str(), spec)
                    }
                };
            entries.push(ManifestEntry {
                id: anchor_id(entity, i),
                spec,
                plot_id: plot_id.to_string(),
                seed,
            });
        }
        Ok(PageManifest {
            entity: entity.to_string(),
            entries,
        })
    }

    /// Resolve and assemble every page, in the given order.
    pub fn assemble_site(
        &self,
        config: &LayoutConfig,
        entities: &[String],
    ) -> Result<Vec<PageManifest>, AssembleError> {
        entities
            .iter()
            .map(|entity| {
                let params = layout::resolve(config, entity)?;
                self.assemble(entity, &params)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ParamSet;
    use crate::plots::builtin_sources;
    use std::collections::HashSet;

    fn params(chart_type: &str, n: usize) -> ResolvedParams {
        ResolvedParams {
            chart_type: chart_type.into(),
            num_plots: n,
            extra: ParamSet::new(),
        }
    }

    #[test]
    fn seeds_are_stable_and_bounded() {
        assert_eq!(derive_seed("CA", 0), derive_seed("CA", 0));
        for i in 0..200 {
            assert!(derive_seed("TX", i) < SEED_RANGE);
        }
    }

    #[test]
    fn anchors_are_unique_within_a_page() {
        let reg = Registry::builtin();
        let page = Assembler::new(&reg)
            .assemble("CA", &params("heatmap", 25))
            .unwrap();
        assert_eq!(page.len(), 25);
        let ids: HashSet<&str> = page.anchor_ids().collect();
        assert_eq!(ids.len(), 25);
    }

    #[test]
    fn unknown_chart_type_falls_back() {
        let reg = Registry::builtin();
        let page = Assembler::new(&reg)
            .assemble("TX", &params("violin_plot", 2))
            .unwrap();
        assert!(page.entries.iter().all(|e| e.plot_id == DEFAULT_PLOT_ID));
        let direct = reg
            .create(DEFAULT_PLOT_ID, page.entries[0].seed, &ParamSet::new())
            .unwrap()
            .unwrap();
        assert_eq!(page.entries[0].spec, direct);
    }

    #[test]
    fn missing_fallback_is_fatal() {
        let reg = Registry::discover(
            builtin_sources()
                .into_iter()
                .filter(|s| s.name != DEFAULT_PLOT_ID),
        );
        let err = Assembler::new(&reg)
            .assemble("TX", &params("violin_plot", 1))
            .unwrap_err();
        assert!(matches!(err, AssembleError::MissingFallback { .. }));
    }

    #[test]
    fn plot_errors_propagate() {
        let reg = Registry::builtin();
        let mut p = params("bar_chart", 1);
        p.extra
            .insert("num_categories".into(), serde_json::json!("lots"));
        let err = Assembler::new(&reg).assemble("TX", &p).unwrap_err();
        assert!(matches!(err, AssembleError::Plot(_)));
    }
}
