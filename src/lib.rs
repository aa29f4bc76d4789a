//! plot_gallery
//!
//! A small Rust library for generating a static, lazily rendered gallery of
//! Vega-Lite charts. Pairs with the `gallery` CLI.
//!
//! ### Features
//! - Pluggable plot modules behind one trait, dispatched through a [`Registry`]
//! - Layouts with global defaults and per-page overrides (YAML or JSON)
//! - Deterministic, seed-keyed synthetic data: same layout, same bytes
//! - Pages that render charts on scroll with a bounded number of concurrent renders
//!
//! ### Example
//! ```no_run
//! use plot_gallery::{Assembler, LayoutConfig, Registry, SiteEmitter, stats};
//!
//! let config = LayoutConfig::load("layout.yaml")?;
//! let registry = Registry::builtin();
//! let pages = Assembler::new(&registry).assemble_site(&config, &config.entities())?;
//! let summary = stats::summarize(&pages, &registry);
//! SiteEmitter::new("docs", config.site.clone()).emit(&pages, &summary)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod assemble;
pub mod layout;
pub mod models;
pub mod plots;
pub mod scheduler;
pub mod site;
pub mod stats;
pub mod storage;

pub use assemble::{Assembler, DEFAULT_PLOT_ID, anchor_id, derive_seed};
pub use layout::{LayoutConfig, ResolvedParams, SiteOptions};
pub use models::{ChartSpec, PageManifest, ParamSet, PlotMetadata};
pub use plots::{Plot, PlotSource, Registry};
pub use scheduler::{LazyRenderer, RenderHost};
pub use site::SiteEmitter;
