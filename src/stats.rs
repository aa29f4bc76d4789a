use crate::models::PageManifest;
use crate::plots::Registry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Totals for a generated gallery.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GallerySummary {
    pub pages: usize,
    pub total_plots: usize,
    /// Plot id -> number of charts produced by that module.
    pub per_chart: BTreeMap<String, usize>,
    /// Sum of the modules' informational render estimates, in seconds.
    pub estimated_render_seconds: f64,
}

impl GallerySummary {
    /// Largest page, used for the "plots per page" figure.
    pub fn max_plots_per_page(pages: &[PageManifest]) -> usize {
        pages.iter().map(PageManifest::len).max().unwrap_or(0)
    }
}

/// Count charts per module across all pages.
pub fn summarize(pages: &[PageManifest], registry: &Registry) -> GallerySummary {
    let mut per_chart: BTreeMap<String, usize> = BTreeMap::new();
    for entry in pages.iter().flat_map(|p| p.entries.iter()) {
        *per_chart.entry(entry.plot_id.clone()).or_default() += 1;
    }
    let estimated_render_seconds = per_chart
        .iter()
        .map(|(id, n)| {
            let each = registry
                .metadata(id)
                .map(|m| m.estimated_render_time)
                .unwrap_or(0.0);
            each * *n as f64
        })
        .sum();
    GallerySummary {
        pages: pages.len(),
        total_plots: per_chart.values().sum(),
        per_chart,
        estimated_render_seconds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::Assembler;
    use crate::layout::ResolvedParams;
    use crate::models::ParamSet;

    #[test]
    fn counts_and_estimates() {
        let reg = Registry::builtin();
        let asm = Assembler::new(&reg);
        let bars = ResolvedParams {
            chart_type: "bar_chart".into(),
            num_plots: 4,
            extra: ParamSet::new(),
        };
        let heat = ResolvedParams {
            chart_type: "heatmap".into(),
            num_plots: 2,
            extra: ParamSet::new(),
        };
        let pages = vec![
            asm.assemble("A", &bars).unwrap(),
            asm.assemble("B", &heat).unwrap(),
        ];
        let s = summarize(&pages, &reg);
        assert_eq!(s.pages, 2);
        assert_eq!(s.total_plots, 6);
        assert_eq!(s.per_chart["bar_chart"], 4);
        assert_eq!(s.per_chart["heatmap"], 2);
        assert!((s.estimated_render_seconds - (4.0 * 0.12 + 2.0 * 0.18)).abs() < 1e-9);
        assert_eq!(GallerySummary::max_plots_per_page(&pages), 4);
    }
}
