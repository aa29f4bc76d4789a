//! Shared helpers for plot modules: seeded randomness, parameter access and
//! the neutral chart theme.

use super::PlotError;
use crate::models::ParamSet;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Value, json};

pub const VEGA_LITE_SCHEMA: &str = "https://vega.github.io/schema/vega-lite/v5.json";
pub const CHART_WIDTH: u32 = 300;
pub const CHART_HEIGHT: u32 = 300;

/// Upper bound on rows a single chart may embed.
pub const MAX_DATA_POINTS: usize = 100_000;

/// Grey ramp shared by the categorical modules.
pub const NEUTRAL_RANGE: [&str; 5] = ["#6c757d", "#868e96", "#adb5bd", "#ced4da", "#dee2e6"];

pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Standard normal sample (Box-Muller).
pub fn standard_normal(rng: &mut StdRng) -> f64 {
    // u1 in (0, 1] so ln() stays finite
    let u1: f64 = 1.0 - rng.random::<f64>();
    let u2: f64 = rng.random::<f64>();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

/// Round to 4 decimals to keep embedded specs compact.
pub fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

/// Read a positive integer parameter in `1..=MAX_DATA_POINTS`, falling back to
/// `default` when absent.
pub fn positive_param(
    plot_id: &str,
    params: &ParamSet,
    name: &str,
    default: usize,
) -> Result<usize, PlotError> {
    let invalid = |reason: &str| PlotError::InvalidParam {
        plot_id: plot_id.to_string(),
        param: name.to_string(),
        reason: reason.to_string(),
    };
    match params.get(name) {
        None | Some(Value::Null) => Ok(default),
        Some(v) => {
            let n = v
                .as_u64()
                .ok_or_else(|| invalid(&format!("expected a positive integer, got {}", v)))?;
            if n == 0 {
                return Err(invalid("must be greater than zero"));
            }
            usize::try_from(n)
                .ok()
                .filter(|n| *n <= MAX_DATA_POINTS)
                .ok_or_else(|| invalid(&format!("must be at most {}", MAX_DATA_POINTS)))
        }
    }
}

/// Grid/view settings applied to every built-in chart.
pub fn neutral_config() -> Value {
    json!({
        "axis": {
            "gridColor": "#e9ecef",
            "gridOpacity": 0.5,
            "gridWidth": 0.5
        },
        "view": { "strokeWidth": 0 }
    })
}
