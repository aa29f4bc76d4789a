//! Interactive scatter plot of normally distributed points in four categories.

use super::synth::{self, CHART_HEIGHT, CHART_WIDTH, NEUTRAL_RANGE, VEGA_LITE_SCHEMA};
use super::{Plot, PlotError};
use crate::models::{ChartSpec, ParamSet, PlotMetadata};
use rand::Rng;
use serde_json::{Value, json};

pub const ID: &str = "scatter_plot";
const CATEGORIES: [&str; 4] = ["A", "B", "C", "D"];

#[derive(Debug, Clone, Copy, Default)]
pub struct ScatterPlot;

impl Plot for ScatterPlot {
    fn metadata(&self) -> PlotMetadata {
        PlotMetadata {
            id: ID.into(),
            title: "Interactive Scatter Plot".into(),
            tags: vec![
                "scatter".into(),
                "interactive".into(),
                "points".into(),
                "categories".into(),
            ],
            estimated_render_time: 0.15,
        }
    }

    fn create(&self, seed: u64, params: &ParamSet) -> Result<ChartSpec, PlotError> {
        let num_points = synth::positive_param(ID, params, "num_points", 100)?;
        let mut rng = synth::rng(seed);

        let values: Vec<Value> = (0..num_points)
            .map(|_| {
                let x = synth::round4(synth::standard_normal(&mut rng));
                let y = synth::round4(synth::standard_normal(&mut rng));
                let category = CATEGORIES[rng.random_range(0..CATEGORIES.len())];
                json!({ "x": x, "y": y, "category": category })
            })
            .collect();

        Ok(ChartSpec(json!({
            "$schema": VEGA_LITE_SCHEMA,
            "title": format!("Plot {}", seed),
            "width": CHART_WIDTH,
            "height": CHART_HEIGHT,
            "data": { "values": values },
            "mark": { "type": "circle", "size": 60 },
            "params": [{
                "name": "grid",
                "select": "interval",
                "bind": "scales"
            }],
            "encoding": {
                "x": { "field": "x", "type": "quantitative", "scale": { "domain": [-4, 4] } },
                "y": { "field": "y", "type": "quantitative", "scale": { "domain": [-4, 4] } },
                "color": {
                    "field": "category",
                    "type": "nominal",
                    "scale": { "range": &NEUTRAL_RANGE[..4] },
                    "legend": { "title": "Category" }
                },
                "tooltip": [
                    { "field": "x", "type": "quantitative" },
                    { "field": "y", "type": "quantitative" },
                    { "field": "category", "type": "nominal" }
                ]
            },
            "config": synth::neutral_config()
        })))
    }
}
