use crate::commands::load_context;
use crate::config::Config;
use anyhow::{Context as _, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;
use etch_engine::Engine;
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Final markup
    Html,
    /// Host block JSON
    Blocks,
}

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Block-tree JSON document to render
    pub input: PathBuf,

    /// Ambient data (`this`, `site`, `user`, ...) as a JSON object
    #[arg(short, long)]
    pub context: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "html")]
    pub format: OutputFormat,

    /// Write to a file instead of stdout
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// List the style ids registered by the render
    #[arg(long)]
    pub styles: bool,
}

pub fn render(args: RenderArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let stores = config.load_stores(cwd)?;
    let ctx = load_context(args.context.as_deref())?;

    let source = fs::read_to_string(&args.input)
        .with_context(|| format!("Cannot read {}", args.input.display()))?;

    let engine = Engine::new(&stores.components, &stores.presets, &stores.svgs)
        .with_options(config.engine.clone());
    let output = engine.render_json(&source, &ctx)?;
    info!(
        input = %args.input.display(),
        nodes = output.nodes.len(),
        styles = output.styles.len(),
        "Rendered document"
    );

    let rendered = match args.format {
        OutputFormat::Html => output.to_html(),
        OutputFormat::Blocks => serde_json::to_string_pretty(&output.to_blocks())?,
    };

    match &args.out {
        Some(path) => {
            fs::write(path, &rendered)?;
            eprintln!(
                "  {} {} → {}",
                "✓".green(),
                args.input.display(),
                path.display()
            );
        }
        None => println!("{}", rendered),
    }

    if args.styles {
        eprintln!("{}", "Styles:".bright_blue().bold());
        for style in &output.styles {
            eprintln!("  {}", style);
        }
    }

    Ok(())
}
