use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
    Yaml,
}

/// Renders `value` for the machine-readable formats; `None` for human output.
pub fn render<T: Serialize>(format: OutputFormat, value: &T) -> Result<Option<String>> {
    let rendered = match format {
        OutputFormat::Human => return Ok(None),
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
    };
    Ok(Some(rendered))
}
