//! Bar chart over a handful of categories with integer values.

use super::synth::{self, CHART_HEIGHT, CHART_WIDTH, NEUTRAL_RANGE, VEGA_LITE_SCHEMA};
use super::{Plot, PlotError};
use crate::models::{ChartSpec, ParamSet, PlotMetadata};
use rand::Rng;
use serde_json::{Value, json};

pub const ID: &str = "bar_chart";
const CATEGORIES: [&str; 5] = [
    "Category A",
    "Category B",
    "Category C",
    "Category D",
    "Category E",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct BarChart;

impl Plot for BarChart {
    fn metadata(&self) -> PlotMetadata {
        PlotMetadata {
            id: ID.into(),
            title: "Categorical Bar Chart".into(),
            tags: vec!["bar".into(), "categorical".into(), "comparison".into()],
            estimated_render_time: 0.12,
        }
    }

    fn create(&self, seed: u64, params: &ParamSet) -> Result<ChartSpec, PlotError> {
        // More categories than labels are silently clamped.
        let n = synth::positive_param(ID, params, "num_categories", CATEGORIES.len())?
            .min(CATEGORIES.len());
        let mut rng = synth::rng(seed);

        let values: Vec<Value> = CATEGORIES[..n]
            .iter()
            .map(|c| json!({ "category": c, "value": rng.random_range(10..100) }))
            .collect();

        Ok(ChartSpec(json!({
            "$schema": VEGA_LITE_SCHEMA,
            "title": format!("Bar Chart {}", seed),
            "width": CHART_WIDTH,
            "height": CHART_HEIGHT,
            "data": { "values": values },
            "mark": { "type": "bar" },
            "encoding": {
                "x": { "field": "category", "type": "nominal", "title": "Category" },
                "y": { "field": "value", "type": "quantitative", "title": "Value" },
                "color": {
                    "field": "category",
                    "type": "nominal",
                    "scale": { "range": NEUTRAL_RANGE },
                    "legend": null
                },
                "tooltip": [
                    { "field": "category", "type": "nominal" },
                    { "field": "value", "type": "quantitative" }
                ]
            },
            "config": synth::neutral_config()
        })))
    }
}
