use crate::commands::load_context;
use crate::config::Config;
use anyhow::{anyhow, Context as _, Result};
use clap::Args;
use colored::Colorize;
use etch_blocks::parse_blocks;
use etch_common::{check_inner_slots, SlotViolation, StyleReferenceCollector, Visitor};
use etch_engine::Engine;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Block-tree JSON document to check
    pub input: PathBuf,

    /// Also render the document with this context and check the output
    #[arg(short, long)]
    pub context: Option<PathBuf>,

    /// Only check the input tree
    #[arg(long)]
    pub no_render: bool,
}

pub fn check(args: CheckArgs, cwd: &str) -> Result<()> {
    println!("🔍 {} {}", "Checking".green().bold(), args.input.display());

    let source = fs::read_to_string(&args.input)
        .with_context(|| format!("Cannot read {}", args.input.display()))?;
    let nodes = parse_blocks(&source)?;

    let mut collector = StyleReferenceCollector::default();
    collector.visit_nodes(&nodes);
    println!(
        "   {} top-level blocks, {} style references",
        nodes.len(),
        collector.styles.len()
    );

    let mut total = report("input", &check_inner_slots(&nodes));

    if !args.no_render {
        let config = Config::load(cwd)?;
        let stores = config.load_stores(cwd)?;
        let ctx = load_context(args.context.as_deref())?;
        let engine = Engine::new(&stores.components, &stores.presets, &stores.svgs)
            .with_options(config.engine.clone());

        let output = engine.render(&nodes, &ctx);
        total += report("output", &check_inner_slots(&output.nodes));
    }

    println!();
    if total == 0 {
        println!("{} Inner slots are consistent", "✅".green());
        Ok(())
    } else {
        Err(anyhow!("{} inner-slot violations", total))
    }
}

fn report(label: &str, violations: &[SlotViolation]) -> usize {
    if violations.is_empty() {
        println!("  {} {}", "✓".green(), label);
    }
    for violation in violations {
        let path: Vec<String> = violation.path.iter().map(|i| i.to_string()).collect();
        eprintln!(
            "  {} {} [{}] {} - {} children, {} placeholders",
            "✗".red(),
            label,
            path.join("/"),
            violation.kind.yellow(),
            violation.children,
            violation.placeholders
        );
    }
    violations.len()
}
