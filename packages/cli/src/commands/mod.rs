pub mod check;
pub mod render;

pub use check::{check, CheckArgs};
pub use render::{render, RenderArgs};

use anyhow::{Context as _, Result};
use etch_engine::{AmbientData, Context};
use std::fs;
use std::path::Path;

/// Read an ambient data file into the initial render context. No file means an empty context.
pub(crate) fn load_context(path: Option<&Path>) -> Result<Context> {
    let Some(path) = path else {
        return Ok(Context::new());
    };
    let content = fs::read_to_string(path)
        .with_context(|| format!("Cannot read context file {}", path.display()))?;
    let ambient = AmbientData::parse(&content)
        .with_context(|| format!("Invalid context file {}", path.display()))?;
    Ok(ambient.into_context())
}
