use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Free-form parameter bag used by layouts and plot modules.
///
/// Backed by `serde_json::Map`, which keeps keys sorted, so serialized output
/// never depends on insertion order.
pub type ParamSet = serde_json::Map<String, Value>;

/// Static description of a plot module.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlotMetadata {
    pub id: String,
    pub title: String,
    pub tags: Vec<String>,
    /// Informational only, in seconds.
    pub estimated_render_time: f64,
}

/// Opaque declarative chart document (Vega-Lite JSON).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct ChartSpec(pub Value);

impl ChartSpec {
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Compact JSON text. Identical specs always serialize to identical bytes.
    pub fn to_json(&self) -> String {
        self.0.to_string()
    }
}

impl From<Value> for ChartSpec {
    fn from(v: Value) -> Self {
        Self(v)
    }
}

/// One chart on a page, correlated to a DOM placeholder by `id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ManifestEntry {
    pub id: String,
    pub spec: ChartSpec,
    /// Module that actually produced the spec (after any fallback).
    #[serde(skip)]
    pub plot_id: String,
    #[serde(skip)]
    pub seed: u64,
}

/// Ordered charts for one page, in generation order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageManifest {
    pub entity: String,
    pub entries: Vec<ManifestEntry>,
}

impl PageManifest {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn anchor_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.id.as_str())
    }
}

/// Client-facing spec reference inside [`EmbeddedManifest`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpecRef {
    pub id: String,
    pub spec: ChartSpec,
}

/// Document embedded into every gallery page and read by the lazy loader.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddedManifest {
    pub specs: Vec<SpecRef>,
    pub embed_options: Value,
    pub max_concurrent: usize,
    pub root_margin: String,
}

impl EmbeddedManifest {
    pub fn from_page(
        page: &PageManifest,
        embed_options: Value,
        max_concurrent: usize,
        root_margin: &str,
    ) -> Self {
        Self {
            specs: page
                .entries
                .iter()
                .map(|e| SpecRef {
                    id: e.id.clone(),
                    spec: e.spec.clone(),
                })
                .collect(),
            embed_options,
            max_concurrent,
            root_margin: root_margin.to_string(),
        }
    }
}

/// One row of the exported plot catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct CatalogRow {
    pub entity: String,
    pub anchor_id: String,
    pub plot_id: String,
    pub seed: u64,
}

impl CatalogRow {
    pub fn from_pages(pages: &[PageManifest]) -> Vec<CatalogRow> {
        pages
            .iter()
            .flat_map(|p| {
                p.entries.iter().map(move |e| CatalogRow {
                    entity: p.entity.clone(),
                    anchor_id: e.id.clone(),
                    plot_id: e.plot_id.clone(),
                    seed: e.seed,
                })
            })
            .collect()
    }
}
