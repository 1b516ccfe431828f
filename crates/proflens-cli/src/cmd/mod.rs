pub mod classify;
pub mod search;
pub mod stats;

use crate::output::{CliError, OutputMode, render_error};
use proflens_core::config::{ProjectConfig, resolve_config};
use proflens_core::error::ErrorCode;
use std::path::Path;

/// Resolve the effective config, rendering a structured error on failure.
pub(crate) fn load_config(output: OutputMode, project_root: &Path) -> anyhow::Result<ProjectConfig> {
    match resolve_config(project_root) {
        Ok(config) => Ok(config),
        Err(err) => {
            render_error(
                output,
                &CliError::new(format!("{err:#}")).with_code(ErrorCode::ConfigParseError),
            )?;
            Err(err)
        }
    }
}
