use plot_gallery::models::{ChartSpec, ParamSet, PlotMetadata};
use plot_gallery::plots::{Plot, PlotError, PlotSource, Registry, builtin_sources};
use proptest::prelude::*;
use serde_json::json;

struct Broken;

impl Plot for Broken {
    fn metadata(&self) -> PlotMetadata {
        PlotMetadata {
            id: "broken".into(),
            title: "".into(),
            tags: vec![],
            estimated_render_time: 0.1,
        }
    }

    fn create(&self, _seed: u64, _params: &ParamSet) -> Result<ChartSpec, PlotError> {
        Ok(ChartSpec(json!({})))
    }
}

struct NegativeCost;

impl Plot for NegativeCost {
    fn metadata(&self) -> PlotMetadata {
        PlotMetadata {
            id: "negative".into(),
            title: "Negative".into(),
            tags: vec![],
            estimated_render_time: -1.0,
        }
    }

    fn create(&self, _seed: u64, _params: &ParamSet) -> Result<ChartSpec, PlotError> {
        Ok(ChartSpec(json!({})))
    }
}

fn failing_load() -> Result<Box<dyn Plot>, PlotError> {
    Err(PlotError::Load {
        source_name: "violin".into(),
        reason: "missing create capability".into(),
    })
}

#[test]
fn bad_sources_do_not_block_discovery() {
    let mut sources = vec![PlotSource {
        name: "violin",
        load: failing_load,
    }];
    sources.extend(builtin_sources());
    sources.push(PlotSource {
        name: "broken",
        load: || Ok(Box::new(Broken)),
    });
    sources.push(PlotSource {
        name: "negative",
        load: || Ok(Box::new(NegativeCost)),
    });

    let reg = Registry::discover(sources);
    let ids: Vec<String> = reg.list().into_iter().map(|m| m.id).collect();
    assert_eq!(ids, ["bar_chart", "heatmap", "line_chart", "scatter_plot"]);
    assert!(reg.lookup("broken").is_none());
    assert!(reg.lookup("negative").is_none());
}

#[test]
fn empty_source_list_gives_empty_registry() {
    let reg = Registry::discover(Vec::new());
    assert!(reg.is_empty());
    assert!(reg.create("bar_chart", 1, &ParamSet::new()).unwrap().is_none());
}

#[test]
fn list_exposes_module_metadata() {
    let reg = Registry::builtin();
    let bar = reg
        .list()
        .into_iter()
        .find(|m| m.id == "bar_chart")
        .expect("bar_chart registered");
    assert_eq!(bar.title, "Categorical Bar Chart");
    assert_eq!(bar.tags, ["bar", "categorical", "comparison"]);
    assert!((bar.estimated_render_time - 0.12).abs() < 1e-12);
}

#[test]
fn every_builtin_emits_a_vega_lite_spec() {
    let reg = Registry::builtin();
    for id in ["scatter_plot", "bar_chart", "line_chart", "heatmap"] {
        let spec = reg.create(id, 42, &ParamSet::new()).unwrap().unwrap();
        let v = spec.as_value();
        assert!(v["$schema"].as_str().unwrap().contains("vega-lite/v5"));
        assert!(v["data"]["values"].as_array().is_some_and(|a| !a.is_empty()));
        assert!(v["mark"]["type"].is_string(), "{id} has no mark type");
    }
}

#[test]
fn invalid_params_surface_as_errors() {
    let reg = Registry::builtin();
    let mut params = ParamSet::new();
    params.insert("grid_size".into(), json!(0));
    let err = reg.create("heatmap", 1, &params).unwrap_err();
    assert!(err.to_string().contains("grid_size"), "{err}");
}

#[test]
fn oversized_params_are_errors_not_panics() {
    let reg = Registry::builtin();

    let mut params = ParamSet::new();
    params.insert("grid_size".into(), json!(4_294_967_296u64));
    let err = reg.create("heatmap", 1, &params).unwrap_err();
    assert!(matches!(err, PlotError::InvalidParam { ref param, .. } if param == "grid_size"));

    let mut params = ParamSet::new();
    params.insert("grid_size".into(), json!(400));
    assert!(reg.create("heatmap", 1, &params).is_err());

    let mut params = ParamSet::new();
    params.insert("num_points".into(), json!(100_000_000u64));
    let err = reg.create("line_chart", 1, &params).unwrap_err();
    assert!(matches!(err, PlotError::InvalidParam { ref param, .. } if param == "num_points"));

    let mut params = ParamSet::new();
    params.insert("num_points".into(), json!(u64::MAX));
    assert!(reg.create("scatter_plot", 1, &params).is_err());
}

#[test]
fn different_seeds_give_different_data() {
    let reg = Registry::builtin();
    let a = reg.create("scatter_plot", 1, &ParamSet::new()).unwrap().unwrap();
    let b = reg.create("scatter_plot", 2, &ParamSet::new()).unwrap().unwrap();
    assert_ne!(a.as_value()["data"], b.as_value()["data"]);
}

proptest! {
    #[test]
    fn create_is_deterministic(
        idx in 0usize..4,
        seed in 0u64..10_000,
        size in proptest::option::of(1u64..30),
    ) {
        let reg = Registry::builtin();
        let id = ["scatter_plot", "bar_chart", "line_chart", "heatmap"][idx];
        let mut params = ParamSet::new();
        if let Some(n) = size {
            params.insert("num_points".into(), json!(n));
            params.insert("num_categories".into(), json!(n));
            params.insert("grid_size".into(), json!(n));
        }
        let a = reg.create(id, seed, &params).unwrap().unwrap();
        let b = reg.create(id, seed, &params).unwrap().unwrap();
        prop_assert_eq!(a.to_json(), b.to_json());
    }
}
