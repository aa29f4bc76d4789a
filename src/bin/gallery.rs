use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use plot_gallery::models::{CatalogRow, ParamSet};
use plot_gallery::scheduler::sim::{self, SimHost};
use plot_gallery::{Assembler, LayoutConfig, LazyRenderer, Registry, SiteEmitter};
use plot_gallery::{site, stats, storage};
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "gallery",
    version,
    about = "Generate a lazily rendered static gallery of Vega-Lite charts"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the site from a layout file.
    Build(BuildArgs),
    /// List registered plot modules.
    List,
    /// Print the chart spec one plot module produces for a seed.
    Spec(SpecArgs),
    /// Replay the lazy-render protocol for one page and report the schedule.
    Simulate(SimulateArgs),
}

#[derive(Args, Debug)]
struct BuildArgs {
    /// Layout file (.yaml, .yml or .json).
    #[arg(short, long, value_parser = existing_file)]
    config: PathBuf,
    /// Output directory.
    #[arg(short, long, default_value = "docs")]
    out: PathBuf,
    /// Entity keys separated by comma or semicolon (e.g., CA,TX). Overrides the layout's list.
    #[arg(short, long)]
    entities: Option<String>,
    /// Override `num_plots` in the layout defaults.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    num_plots: Option<u32>,
    /// Maximum concurrent chart renders in the browser.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    max_concurrent: Option<u32>,
    /// Pre-load margin around the viewport (CSS margin, e.g. 200px).
    #[arg(long)]
    root_margin: Option<String>,
    /// Also write a plot catalog (format from extension: .csv or .json).
    #[arg(long)]
    catalog: Option<PathBuf>,
    /// Print gallery statistics to stdout.
    #[arg(long, default_value_t = false)]
    stats: bool,
}

#[derive(Args, Debug)]
struct SpecArgs {
    /// Plot module id (see `gallery list`).
    #[arg(short, long)]
    plot: String,
    #[arg(short, long, default_value_t = 0)]
    seed: u64,
    /// Extra plot parameter as key=value; values are parsed as JSON when possible.
    #[arg(long = "param", value_parser = parse_param)]
    params: Vec<(String, Value)>,
}

#[derive(Args, Debug)]
struct SimulateArgs {
    #[arg(short, long, value_parser = existing_file)]
    config: PathBuf,
    /// Page to simulate.
    #[arg(short, long)]
    entity: String,
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    max_concurrent: Option<u32>,
    /// Charts that scroll into view per step.
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u32).range(1..))]
    per_screen: u32,
    /// Simulate a browser without IntersectionObserver/requestIdleCallback.
    #[arg(long, default_value_t = false)]
    eager: bool,
    /// Anchor ids whose render should fail.
    #[arg(long)]
    fail: Vec<String>,
}

fn existing_file(s: &str) -> Result<PathBuf, String> {
    let p = PathBuf::from(s);
    if p.is_file() {
        Ok(p)
    } else {
        Err(format!("file not found: {}", s))
    }
}

fn parse_param(s: &str) -> Result<(String, Value), String> {
    let (k, v) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got `{}`", s))?;
    let value = serde_json::from_str(v).unwrap_or_else(|_| Value::String(v.to_string()));
    Ok((k.trim().to_string(), value))
}

fn parse_list(s: &str) -> Vec<String> {
    s.split([',', ';'])
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Build(args) => cmd_build(args),
        Command::List => cmd_list(),
        Command::Spec(args) => cmd_spec(args),
        Command::Simulate(args) => cmd_simulate(args),
    }
}

fn cmd_build(args: BuildArgs) -> Result<()> {
    let mut config = LayoutConfig::load(&args.config)
        .with_context(|| format!("load layout {}", args.config.display()))?;
    if let Some(n) = args.num_plots {
        config
            .defaults
            .insert(plot_gallery::layout::NUM_PLOTS_KEY.into(), Value::from(n));
    }
    if let Some(c) = args.max_concurrent {
        config.site.max_concurrent = c as usize;
    }
    if let Some(m) = args.root_margin {
        config.site.root_margin = m;
    }
    if let Some(list) = args.entities.as_deref() {
        config.entities = parse_list(list);
    }
    config.validate()?;

    let entities = config.entities();
    if entities.is_empty() {
        anyhow::bail!("no pages to build: set `entities` in the layout or pass --entities");
    }

    let registry = Registry::builtin();
    let pages = Assembler::new(&registry).assemble_site(&config, &entities)?;
    let summary = stats::summarize(&pages, &registry);

    let report = SiteEmitter::new(&args.out, config.site.clone()).emit(&pages, &summary)?;
    info!(
        "wrote {} pages and {} to {}",
        report.pages.len(),
        site::LOADER_FILE,
        args.out.display()
    );

    if let Some(path) = args.catalog.as_ref() {
        let rows = CatalogRow::from_pages(&pages);
        storage::save_catalog(&rows, path)?;
        eprintln!("Saved {} catalog rows to {}", rows.len(), path.display());
    }

    if args.stats {
        println!(
            "pages={} plots={} est_render={:.2}s",
            summary.pages, summary.total_plots, summary.estimated_render_seconds
        );
        for (plot_id, n) in &summary.per_chart {
            println!("  {:<14} {}", plot_id, n);
        }
    }
    Ok(())
}

fn cmd_list() -> Result<()> {
    let registry = Registry::builtin();
    for m in registry.list() {
        println!("{}", m.title);
        println!("  ID: {}", m.id);
        println!("  Tags: {}", m.tags.join(", "));
        println!("  Estimated render time: {}s", m.estimated_render_time);
    }
    Ok(())
}

fn cmd_spec(args: SpecArgs) -> Result<()> {
    let registry = Registry::builtin();
    let params: ParamSet = args.params.into_iter().collect();
    let spec = registry
        .create(&args.plot, args.seed, &params)?
        .ok_or_else(|| {
            let known: Vec<&str> = registry.ids().collect();
            anyhow::anyhow!("unknown plot `{}` (known: {})", args.plot, known.join(", "))
        })?;
    println!("{}", serde_json::to_string_pretty(spec.as_value())?);
    Ok(())
}

fn cmd_simulate(args: SimulateArgs) -> Result<()> {
    let mut config = LayoutConfig::load(&args.config)
        .with_context(|| format!("load layout {}", args.config.display()))?;
    if let Some(c) = args.max_concurrent {
        config.site.max_concurrent = c as usize;
    }
    let params = plot_gallery::layout::resolve(&config, &args.entity)?;
    let registry = Registry::builtin();
    let page = Assembler::new(&registry).assemble(&args.entity, &params)?;

    let emitter = SiteEmitter::new(PathBuf::new(), config.site.clone());
    let manifest_json = site::script_json(&emitter.embedded_manifest(&page))?;
    let mut host = if args.eager {
        SimHost::legacy()
    } else {
        SimHost::browser()
    };
    let mut renderer = LazyRenderer::boot(&mut host, Some(manifest_json.as_str()))
        .context("renderer did not start")?;

    let ids: Vec<String> = page.anchor_ids().map(String::from).collect();
    let screens: Vec<Vec<String>> = ids
        .chunks(args.per_screen as usize)
        .map(|c| c.to_vec())
        .collect();
    let fail: BTreeSet<String> = args.fail.into_iter().collect();
    let report = sim::run_to_completion(&mut renderer, &mut host, &screens, &fail);

    println!(
        "charts={} cap={} peak={} drains={} settled={} failed={}",
        renderer.len(),
        renderer.max_concurrent(),
        report.peak_in_flight,
        report.drain_passes,
        report.settled,
        report.failed.len()
    );
    for (i, id) in report.dispatch_order.iter().enumerate() {
        let mark = if report.failed.contains(id) { " (failed)" } else { "" };
        println!("{:>4}  {}{}", i + 1, id, mark);
    }
    Ok(())
}
