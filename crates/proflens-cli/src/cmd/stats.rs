//! `proflens stats`: corpus size, dimension and per-subject counts.

use crate::output::{CliError, OutputMode, pretty_kv, pretty_section, render_error, render_mode};
use proflens_core::error::ErrorCode;
use proflens_core::snapshot::{subject_counts, try_load_snapshot};
use proflens_search::VectorIndex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
pub struct StatsOutput {
    pub corpus: PathBuf,
    pub entries: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension: Option<usize>,
    pub subjects: BTreeMap<String, usize>,
}

impl StatsOutput {
    fn from_index(corpus: PathBuf, index: &VectorIndex) -> Self {
        Self {
            corpus,
            entries: index.len(),
            dimension: index.dimension(),
            subjects: subject_counts(index.entries()),
        }
    }
}

/// Execute `proflens stats`.
///
/// # Errors
///
/// Returns an error if the config or snapshot cannot be parsed, or output
/// fails. A missing corpus is reported, not treated as a failure.
pub fn run_stats(output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let config = super::load_config(output, project_root)?;
    let path = config.corpus_path(project_root);

    let index = match try_load_snapshot(&path) {
        Ok(Some(entries)) => VectorIndex::load(entries),
        Ok(None) => {
            if !output.is_json() {
                render_error(output, &CliError::from(ErrorCode::IndexUnavailable))?;
            }
            VectorIndex::empty()
        }
        Err(err) => {
            render_error(
                output,
                &CliError::new(format!("{err:#}")).with_code(ErrorCode::SnapshotUnreadable),
            )?;
            return Err(err);
        }
    };
    let stats = StatsOutput::from_index(path, &index);

    render_mode(
        output,
        &stats,
        |out, w| render_stats_text(out, w),
        |out, w| render_stats_human(out, w),
    )
}

fn render_stats_human(out: &StatsOutput, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, "Corpus")?;
    pretty_kv(w, "Path", out.corpus.display().to_string())?;
    pretty_kv(w, "Entries", out.entries.to_string())?;
    pretty_kv(
        w,
        "Dimension",
        out.dimension.map_or_else(|| "-".to_string(), |d| d.to_string()),
    )?;

    if out.subjects.is_empty() {
        return Ok(());
    }
    writeln!(w)?;
    pretty_section(w, "Subjects")?;
    for (subject, count) in &out.subjects {
        writeln!(w, "{count:>6}  {subject}")?;
    }
    Ok(())
}

fn render_stats_text(out: &StatsOutput, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(
        w,
        "entries={}  dimension={}  path={}",
        out.entries,
        out.dimension.map_or_else(|| "-".to_string(), |d| d.to_string()),
        out.corpus.display()
    )?;
    for (subject, count) in &out.subjects {
        writeln!(w, "{count}  {subject}")?;
    }
    Ok(())
}
