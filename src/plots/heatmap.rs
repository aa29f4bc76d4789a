//! Square heatmap of uniform random intensities.

use super::synth::{self, CHART_HEIGHT, CHART_WIDTH, VEGA_LITE_SCHEMA};
use super::{Plot, PlotError};
use crate::models::{ChartSpec, ParamSet, PlotMetadata};
use rand::Rng;
use serde_json::{Value, json};

pub const ID: &str = "heatmap";

#[derive(Debug, Clone, Copy, Default)]
pub struct Heatmap;

impl Plot for Heatmap {
    fn metadata(&self) -> PlotMetadata {
        PlotMetadata {
            id: ID.into(),
            title: "Correlation Heatmap".into(),
            tags: vec![
                "heatmap".into(),
                "matrix".into(),
                "correlation".into(),
                "intensity".into(),
            ],
            estimated_render_time: 0.18,
        }
    }

    fn create(&self, seed: u64, params: &ParamSet) -> Result<ChartSpec, PlotError> {
        let grid_size = synth::positive_param(ID, params, "grid_size", 10)?;
        let cells = grid_size
            .checked_mul(grid_size)
            .filter(|c| *c <= synth::MAX_DATA_POINTS)
            .ok_or_else(|| PlotError::InvalidParam {
                plot_id: ID.into(),
                param: "grid_size".into(),
                reason: format!(
                    "{} x {} cells exceeds the limit of {}",
                    grid_size,
                    grid_size,
                    synth::MAX_DATA_POINTS
                ),
            })?;
        let mut rng = synth::rng(seed);

        let mut values: Vec<Value> = Vec::with_capacity(cells);
        for x in 0..grid_size {
            for y in 0..grid_size {
                let value = synth::round4(rng.random::<f64>());
                values.push(json!({ "x": x, "y": y, "value": value }));
            }
        }

        Ok(ChartSpec(json!({
            "$schema": VEGA_LITE_SCHEMA,
            "title": format!("Heatmap {}", seed),
            "width": CHART_WIDTH,
            "height": CHART_HEIGHT,
            "data": { "values": values },
            "mark": { "type": "rect" },
            "encoding": {
                "x": { "field": "x", "type": "ordinal", "title": "X Axis" },
                "y": { "field": "y", "type": "ordinal", "title": "Y Axis" },
                "color": {
                    "field": "value",
                    "type": "quantitative",
                    "scale": { "scheme": "greys" },
                    "legend": { "title": "Intensity" }
                },
                "tooltip": [
                    { "field": "x", "type": "ordinal" },
                    { "field": "y", "type": "ordinal" },
                    { "field": "value", "type": "quantitative" }
                ]
            },
            "config": { "view": { "strokeWidth": 0 } }
        })))
    }
}
