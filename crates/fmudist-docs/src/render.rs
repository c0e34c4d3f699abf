//! Rendering of a unit's documentation subtree.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use fmudist_package::ModelDescription;
use pulldown_cmark::{html, Options, Parser};
use tracing::debug;

use crate::error::Result;
use crate::template::{Template, TemplateValues};

/// Authored readme inside a unit's source directory.
pub const README_FILE: &str = "readme.md";
/// Rendered page inside the documentation directory.
pub const INDEX_FILE: &str = "index.html";

/// Inputs for one unit's documentation.
#[derive(Debug, Clone, Copy)]
pub struct DocsInput<'a> {
    pub unit: &'a str,
    /// `<source-dir>/<Unit>`, holding `readme.md` and any `*.svg` figures.
    pub source_dir: &'a Path,
    pub model_description: &'a ModelDescription,
    /// Simulator arguments of the reference run, if one was made.
    pub simulator_args: Option<&'a [String]>,
    /// File name of the plot inside the documentation directory, if any.
    pub plot: Option<&'a str>,
    pub template: &'a Template,
}

/// Files written by [`render_docs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocTree {
    pub index: PathBuf,
    /// Figures copied from the source directory.
    pub figures: Vec<PathBuf>,
}

/// Render `documentation/index.html` and copy figures into `docs_dir`.
///
/// Returns `Ok(None)` without writing anything when the unit has no readme.
pub fn render_docs(input: &DocsInput<'_>, docs_dir: &Path) -> Result<Option<DocTree>> {
    let readme = input.source_dir.join(README_FILE);
    if !readme.is_file() {
        debug!(target: "fmudist::docs", unit = input.unit, "no readme, skipping documentation");
        return Ok(None);
    }
    let markdown = fs::read_to_string(&readme)?;

    let values = TemplateValues {
        model_name: escape_html(input.unit),
        content: markdown_to_html(&markdown),
        variables: variable_rows(input.model_description),
        params: input
            .simulator_args
            .map(|args| escape_html(&args.join(" ")))
            .unwrap_or_default(),
        plot: input
            .plot
            .map(|file| {
                format!(
                    r#"<img src="{}" alt="Simulation result of {}">"#,
                    escape_html(file),
                    escape_html(input.unit)
                )
            })
            .unwrap_or_default(),
    };

    fs::create_dir_all(docs_dir)?;
    let index = docs_dir.join(INDEX_FILE);
    fs::write(&index, input.template.render(&values))?;

    let mut figures = Vec::new();
    let mut svgs: Vec<PathBuf> = fs::read_dir(input.source_dir)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().and_then(|e| e.to_str()) == Some("svg"))
        .collect();
    svgs.sort();
    for svg in svgs {
        if let Some(name) = svg.file_name() {
            let target = docs_dir.join(name);
            fs::copy(&svg, &target)?;
            figures.push(target);
        }
    }

    debug!(
        target: "fmudist::docs",
        unit = input.unit,
        figures = figures.len(),
        "rendered documentation"
    );
    Ok(Some(DocTree { index, figures }))
}

/// Markdown to HTML with tables enabled. Fenced code is part of CommonMark.
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    let parser = Parser::new_ext(markdown, options);
    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

fn variable_rows(md: &ModelDescription) -> String {
    let mut rows = String::new();
    for var in &md.variables {
        let _ = writeln!(
            rows,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape_html(&var.name),
            escape_html(var.causality.as_deref().unwrap_or("")),
            escape_html(md.unit_of(&var.name)),
            escape_html(var.description.as_deref().unwrap_or("")),
        );
    }
    rows
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
