//! `proflens search`: retrieve, rerank and summarize matching professors.

use crate::output::{CliError, OutputMode, pretty_kv, pretty_section, render_error, render_mode};
use clap::Args;
use proflens_search::{Pipeline, SearchError, SearchResponse};
use std::io::Write;
use std::path::Path;

const MAX_LIMIT: usize = 100;

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Free-text question, e.g. "easy calculus professor".
    pub query: String,

    /// Maximum number of professors to return (default from `[search] top_k`).
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

/// Execute `proflens search <query>`.
///
/// # Errors
///
/// Returns an error for an empty query, an unparseable config, or a failed
/// write to stdout.
pub fn run_search(args: &SearchArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    if args.query.trim().is_empty() {
        return reject_empty(output);
    }

    let config = super::load_config(output, project_root)?;
    let top_k = args.limit.unwrap_or(config.search.top_k).min(MAX_LIMIT);
    let pipeline = Pipeline::from_config(&config, project_root);

    let response = match pipeline.search(&args.query, top_k) {
        Ok(response) => response,
        Err(SearchError::InvalidQuery) => return reject_empty(output),
    };

    render_mode(
        output,
        &response,
        |out, w| render_search_text(out, w),
        |out, w| render_search_human(out, w),
    )
}

fn reject_empty(output: OutputMode) -> anyhow::Result<()> {
    let error = SearchError::InvalidQuery;
    render_error(
        output,
        &CliError::with_details(
            "search query must not be empty",
            "provide a non-empty query string",
            "empty_query",
        )
        .with_code(error.code()),
    )?;
    Err(error.into())
}

fn render_search_human(out: &SearchResponse, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, &format!("Answer for '{}'", out.query))?;
    writeln!(w, "{}", out.answer)?;
    if !out.sources.is_empty() {
        pretty_kv(w, "Sources", out.sources.join(", "))?;
    }
    if let Some(subject) = out.subject {
        pretty_kv(w, "Subject", subject.as_str())?;
    }
    writeln!(w)?;

    if out.ranked_matches.is_empty() {
        writeln!(w, "No professors found ({} raw matches).", out.total_found)?;
        return Ok(());
    }

    writeln!(
        w,
        "{} professor(s) from {} raw matches:",
        out.ranked_matches.len(),
        out.total_found
    )?;
    writeln!(w, "{:-<90}", "")?;
    writeln!(
        w,
        "{:<16}  {:>6}  {:>6}  {:>7}  {:<24}  SUBJECT",
        "ID", "SCORE", "SIM", "RATING", "NAME"
    )?;
    writeln!(w, "{:-<90}", "")?;
    for row in &out.ranked_matches {
        writeln!(
            w,
            "{:<16}  {:>6.3}  {:>6.3}  {:>6.1}★  {:<24}  {}",
            row.id, row.final_score, row.similarity_score, row.rating, row.name, row.subject
        )?;
    }
    Ok(())
}

fn render_search_text(out: &SearchResponse, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w, "answer  {}", out.answer)?;
    if !out.sources.is_empty() {
        writeln!(w, "sources  {}", out.sources.join(","))?;
    }
    if out.ranked_matches.is_empty() {
        writeln!(w, "advice  no-results  query={}", out.query)?;
        return Ok(());
    }
    for row in &out.ranked_matches {
        writeln!(
            w,
            "{}  score={:.4}  sim={:.4}  rating={:.1}  reviews={}  {}",
            row.id, row.final_score, row.similarity_score, row.rating, row.num_reviews, row.name
        )?;
    }
    Ok(())
}
