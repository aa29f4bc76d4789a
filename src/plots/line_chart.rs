//! Daily time series: a linear trend plus Gaussian noise.

use super::synth::{self, CHART_HEIGHT, CHART_WIDTH, NEUTRAL_RANGE, VEGA_LITE_SCHEMA};
use super::{Plot, PlotError};
use crate::models::{ChartSpec, ParamSet, PlotMetadata};
use chrono::{Days, NaiveDate};
use serde_json::{Value, json};

pub const ID: &str = "line_chart";
const TREND_END: f64 = 10.0;
const NOISE_SCALE: f64 = 2.0;

fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or(NaiveDate::MIN)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LineChart;

impl Plot for LineChart {
    fn metadata(&self) -> PlotMetadata {
        PlotMetadata {
            id: ID.into(),
            title: "Time Series Line Chart".into(),
            tags: vec![
                "line".into(),
                "time-series".into(),
                "trend".into(),
                "temporal".into(),
            ],
            estimated_render_time: 0.13,
        }
    }

    fn create(&self, seed: u64, params: &ParamSet) -> Result<ChartSpec, PlotError> {
        let num_points = synth::positive_param(ID, params, "num_points", 50)?;
        let mut rng = synth::rng(seed);
        let start = start_date();

        let mut values: Vec<Value> = Vec::with_capacity(num_points);
        for i in 0..num_points {
            // linspace(0, TREND_END, num_points)
            let trend = if num_points > 1 {
                TREND_END * i as f64 / (num_points - 1) as f64
            } else {
                0.0
            };
            let value = trend + synth::standard_normal(&mut rng) * NOISE_SCALE;
            let date = start
                .checked_add_days(Days::new(i as u64))
                .ok_or_else(|| PlotError::InvalidParam {
                    plot_id: ID.into(),
                    param: "num_points".into(),
                    reason: format!("day {} is past the last representable date", i),
                })?;
            values.push(json!({
                "date": date.format("%Y-%m-%d").to_string(),
                "value": synth::round4(value)
            }));
        }

        Ok(ChartSpec(json!({
            "$schema": VEGA_LITE_SCHEMA,
            "title": format!("Line Chart {}", seed),
            "width": CHART_WIDTH,
            "height": CHART_HEIGHT,
            "data": { "values": values },
            "mark": {
                "type": "line",
                "point": true,
                "strokeWidth": 2,
                "color": NEUTRAL_RANGE[0]
            },
            "encoding": {
                "x": { "field": "date", "type": "temporal", "title": "Date" },
                "y": { "field": "value", "type": "quantitative", "title": "Value" },
                "tooltip": [
                    { "field": "date", "type": "temporal" },
                    { "field": "value", "type": "quantitative" }
                ]
            },
            "config": synth::neutral_config()
        })))
    }
}
