//! `proflens classify`: show the subject a query routes to.

use crate::output::{OutputMode, render_mode};
use clap::Args;
use proflens_search::Subject;
use proflens_search::subject::classify;
use serde::Serialize;

#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Query text to classify.
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct ClassifyOutput {
    pub query: String,
    pub subject: Option<Subject>,
}

pub fn run_classify(args: &ClassifyArgs, output: OutputMode) -> anyhow::Result<()> {
    let result = ClassifyOutput {
        query: args.query.clone(),
        subject: classify(&args.query),
    };

    render_mode(
        output,
        &result,
        |out, w| writeln!(w, "{}", subject_label(out.subject)),
        |out, w| {
            writeln!(
                w,
                "'{}' -> {}",
                out.query,
                subject_label(out.subject)
            )
        },
    )
}

fn subject_label(subject: Option<Subject>) -> &'static str {
    subject.map_or("none", Subject::as_str)
}
