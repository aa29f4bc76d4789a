//! Static site output: `index.html`, one page per entity and the shared
//! `lazy-loader.js`.
//!
//! Page layout:
//! - header with the gallery title and navigation to every page
//! - one empty `div.plot-container` per chart, keyed by anchor id
//! - the page manifest as `<script type="application/json" id="gallery-manifest">`
//! - vega, vega-lite and vega-embed from the CDN, then the loader

use crate::layout::SiteOptions;
use crate::models::{EmbeddedManifest, PageManifest};
use crate::stats::GallerySummary;
use anyhow::{Context, Result};
use log::info;
use num_format::{Locale, ToFormattedString};
use serde_json::{Value, json};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

pub const LOADER_FILE: &str = "lazy-loader.js";
pub const MANIFEST_ELEMENT_ID: &str = "gallery-manifest";

/// Browser-side scheduler, shipped verbatim next to the pages.
pub const LOADER_JS: &str = include_str!("../assets/lazy-loader.js");

const VEGA_SCRIPTS: [&str; 3] = [
    "https://cdn.jsdelivr.net/npm/vega@5",
    "https://cdn.jsdelivr.net/npm/vega-lite@5",
    "https://cdn.jsdelivr.net/npm/vega-embed@6",
];

const PAGE_CSS: &str = r#"
        body { font-family: Arial, sans-serif; margin: 0; padding: 20px; background-color: #f5f5f5; }
        .header { background-color: #2c3e50; color: white; padding: 20px; margin: -20px -20px 20px -20px; }
        .header h1 { margin: 0; }
        .nav { margin: 10px 0; }
        .nav a { color: #3498db; text-decoration: none; margin-right: 15px; padding: 5px 10px; background-color: white; border-radius: 3px; }
        .nav a:hover { background-color: #e8e8e8; }
        .gallery { display: grid; grid-template-columns: repeat(auto-fill, minmax(320px, 1fr)); gap: 20px; margin-top: 20px; }
        .plot-container { background-color: white; padding: 15px; border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); min-height: 340px; }
        .plot-error { color: #a94442; background-color: #f2dede; padding: 10px; border-radius: 4px; }
        .footer { margin-top: 40px; padding-top: 20px; border-top: 1px solid #ddd; text-align: center; color: #666; }
"#;

const INDEX_CSS: &str = r#"
        body { font-family: Arial, sans-serif; margin: 0; padding: 0; background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); min-height: 100vh; display: flex; align-items: center; justify-content: center; }
        .container { background-color: white; padding: 50px; border-radius: 10px; box-shadow: 0 10px 40px rgba(0,0,0,0.2); max-width: 800px; text-align: center; }
        h1 { color: #2c3e50; margin-bottom: 20px; }
        .stats { display: grid; grid-template-columns: repeat(3, 1fr); gap: 20px; margin-bottom: 40px; }
        .stat-box { background-color: #f8f9fa; padding: 20px; border-radius: 8px; }
        .stat-number { font-size: 2em; font-weight: bold; color: #667eea; }
        .stat-label { color: #666; margin-top: 5px; }
        .page-grid { display: grid; grid-template-columns: repeat(5, 1fr); gap: 15px; margin-top: 30px; }
        .page-link { display: block; padding: 20px; background-color: #667eea; color: white; text-decoration: none; border-radius: 8px; font-weight: bold; }
        .page-link:hover { background-color: #764ba2; }
        .footer { margin-top: 40px; padding-top: 20px; border-top: 1px solid #ddd; color: #999; font-size: 0.9em; }
"#;

/// vega-embed options: export only, no source/editor links.
pub fn embed_options() -> Value {
    json!({
        "actions": {
            "export": true,
            "source": false,
            "compiled": false,
            "editor": false
        }
    })
}

/// Escape text for HTML element content and double-quoted attributes.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// JSON safe to place inside a `<script>` element.
pub fn script_json(value: &impl serde::Serialize) -> Result<String> {
    let s = serde_json::to_string(value)?;
    Ok(s.replace("</", "<\\/"))
}

pub fn page_file_name(entity: &str) -> String {
    format!("{}.html", entity)
}

/// Files written by [`SiteEmitter::emit`].
#[derive(Debug, Clone, PartialEq)]
pub struct SiteReport {
    pub index: PathBuf,
    pub pages: Vec<PathBuf>,
    pub loader: PathBuf,
}

#[derive(Debug, Clone)]
pub struct SiteEmitter {
    out_dir: PathBuf,
    options: SiteOptions,
}

impl SiteEmitter {
    pub fn new<P: Into<PathBuf>>(out_dir: P, options: SiteOptions) -> Self {
        Self {
            out_dir: out_dir.into(),
            options,
        }
    }

    /// Manifest embedded in the page for `page`.
    pub fn embedded_manifest(&self, page: &PageManifest) -> EmbeddedManifest {
        EmbeddedManifest::from_page(
            page,
            embed_options(),
            self.options.max_concurrent,
            &self.options.root_margin,
        )
    }

    /// Write the whole site, creating the output directory if needed.
    pub fn emit(&self, pages: &[PageManifest], summary: &GallerySummary) -> Result<SiteReport> {
        fs::create_dir_all(&self.out_dir)
            .with_context(|| format!("create output directory {}", self.out_dir.display()))?;

        let entities: Vec<&str> = pages.iter().map(|p| p.entity.as_str()).collect();

        let index = self.out_dir.join("index.html");
        write_file(&index, &self.render_index(&entities, summary, pages))?;

        let mut written = Vec::with_capacity(pages.len());
        for page in pages {
            let path = self.out_dir.join(page_file_name(&page.entity));
            write_file(&path, &self.render_page(page, &entities)?)?;
            info!("wrote {} ({} charts)", path.display(), page.len());
            written.push(path);
        }

        let loader = self.out_dir.join(LOADER_FILE);
        write_file(&loader, LOADER_JS)?;

        Ok(SiteReport {
            index,
            pages: written,
            loader,
        })
    }

    fn nav(&self, entities: &[&str]) -> String {
        let mut nav = String::from("<a href=\"index.html\">Home</a>");
        for e in entities {
            let _ = write!(
                nav,
                "<a href=\"{}\">{}</a>",
                escape_html(&page_file_name(e)),
                escape_html(e)
            );
        }
        nav
    }

    /// One gallery page.
    pub fn render_page(&self, page: &PageManifest, entities: &[&str]) -> Result<String> {
        let title = escape_html(&format!("{} - {}", self.options.title, page.entity));
        let manifest = script_json(&self.embedded_manifest(page))?;

        let mut html = String::new();
        let _ = write!(
            html,
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>{css}    </style>
</head>
<body>
    <div class="header">
        <h1>{title}</h1>
        <div class="nav">{nav}</div>
    </div>

    <div class="gallery">
"#,
            title = title,
            css = PAGE_CSS,
            nav = self.nav(entities),
        );
        for id in page.anchor_ids() {
            let _ = writeln!(
                html,
                "        <div class=\"plot-container\" id=\"{}\"></div>",
                escape_html(id)
            );
        }
        let _ = write!(
            html,
            r#"    </div>

    <div class="footer">
        <p>{count} charts, rendered on demand</p>
    </div>

    <script type="application/json" id="{manifest_id}">{manifest}</script>
"#,
            count = page.len(),
            manifest_id = MANIFEST_ELEMENT_ID,
            manifest = manifest,
        );
        for src in VEGA_SCRIPTS {
            let _ = writeln!(html, "    <script src=\"{}\"></script>", src);
        }
        let _ = write!(
            html,
            "    <script src=\"{}\"></script>\n</body>\n</html>\n",
            LOADER_FILE
        );
        Ok(html)
    }

    /// Landing page with totals and links.
    pub fn render_index(
        &self,
        entities: &[&str],
        summary: &GallerySummary,
        pages: &[PageManifest],
    ) -> String {
        let title = escape_html(&self.options.title);
        let per_page = GallerySummary::max_plots_per_page(pages);
        let stat = |n: usize, label: &str| {
            format!(
                "            <div class=\"stat-box\">\n                <div class=\"stat-number\">{}</div>\n                <div class=\"stat-label\">{}</div>\n            </div>\n",
                n.to_formatted_string(&Locale::en),
                label
            )
        };

        let mut html = String::new();
        let _ = write!(
            html,
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - Home</title>
    <style>{css}    </style>
</head>
<body>
    <div class="container">
        <h1>{title}</h1>
        <div class="stats">
"#,
            title = title,
            css = INDEX_CSS,
        );
        html.push_str(&stat(summary.pages, "Pages"));
        html.push_str(&stat(per_page, "Plots per Page"));
        html.push_str(&stat(summary.total_plots, "Total Plots"));
        html.push_str("        </div>\n\n        <h2>Select a Page</h2>\n        <div class=\"page-grid\">\n");
        for e in entities {
            let _ = writeln!(
                html,
                "            <a href=\"{}\" class=\"page-link\">{}</a>",
                escape_html(&page_file_name(e)),
                escape_html(e)
            );
        }
        let _ = write!(
            html,
            r#"        </div>

        <div class="footer">
            <p>Estimated render time: {secs:.1}s across all pages</p>
        </div>
    </div>
</body>
</html>
"#,
            secs = summary.estimated_render_seconds,
        );
        html
    }
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("write {}", path.display()))
}
