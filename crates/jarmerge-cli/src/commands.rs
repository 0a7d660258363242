use std::fs;

use anyhow::Context;
use colored::Colorize;
use jarmerge_filter::builtin;
use jarmerge_merge::{JarMerger, MergeConfig, MergeReport};
use tracing::debug;

use crate::cli::{Cli, OutputFormat};

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    if cli.list_filters {
        return cmd_list_filters(cli.format);
    }
    cmd_merge(cli)
}

fn cmd_merge(cli: Cli) -> anyhow::Result<()> {
    let config = build_config(&cli)?;
    debug!(?config, "effective merge configuration");
    let merger = JarMerger::with_builtin_filters(config)?;
    let report = merger
        .merge(&cli.inputs)
        .with_context(|| format!("merging into {}", merger.config().output_path.display()))?;

    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print!("{}", render_summary(&report)),
    }
    Ok(())
}

/// Config file first, then flags on top.
fn build_config(cli: &Cli) -> anyhow::Result<MergeConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            toml::from_str::<MergeConfig>(&text)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => MergeConfig::default(),
    };

    if let Some(output) = &cli.output {
        config.output_path = output.clone();
    }
    if let Some(level) = cli.level {
        config.compression_level = level;
    }
    config.generate_index |= cli.index;
    config.zero_timestamps |= cli.zero_timestamps;
    if let Some(main_class) = &cli.main_class {
        config.main_class = Some(main_class.clone());
    }
    config.filters.enable.extend(cli.enable.iter().cloned());
    config.filters.disable.extend(cli.disable.iter().cloned());
    Ok(config)
}

fn render_summary(report: &MergeReport) -> String {
    let mut out = String::new();
    let counts = &report.counts;
    out.push_str(&format!(
        "{} Merged {} archives into {}\n",
        "✓".green().bold(),
        report.inputs.len(),
        report.output.display().to_string().bold()
    ));
    if let Some(backup) = &report.backup {
        out.push_str(&format!("  Backup: {}\n", backup.display().to_string().cyan()));
    }
    if let Some(main_class) = &report.main_class {
        out.push_str(&format!("  Main-Class: {}\n", main_class.cyan()));
    }
    out.push_str(&format!(
        "  Entries: {} read, {} written, {} coalesced, {} skipped, {} duplicates\n",
        counts.total.to_string().bold(),
        counts.written,
        counts.coalesced,
        counts.skipped,
        counts.duplicates
    ));
    out.push_str(&format!("  Output entries: {}\n", report.output_entries));
    if let Some(index) = &report.index {
        out.push_str(&format!("  Index: {} paths\n", index.len()));
    }
    out.push_str(&format!("  Filters: {}\n", report.filters.join(", ").dimmed()));

    if report.conflicts.is_empty() {
        out.push_str(&format!("  Conflicts: {}\n", "none".green()));
    } else {
        out.push_str(&format!(
            "  {} {} paths differ between inputs (first archive kept):\n",
            "!".yellow().bold(),
            report.conflicts.len()
        ));
        for conflict in &report.conflicts {
            out.push_str(&format!("    {}\n", conflict.path.yellow()));
            for variant in &conflict.variants {
                out.push_str(&format!(
                    "      {} {}\n",
                    variant.digest[..12.min(variant.digest.len())].dimmed(),
                    variant.archives.join(", ")
                ));
            }
        }
    }
    out
}

fn cmd_list_filters(format: OutputFormat) -> anyhow::Result<()> {
    let filters = builtin::all();
    match format {
        OutputFormat::Json => {
            let listed: Vec<serde_json::Value> = filters
                .iter()
                .map(|f| {
                    serde_json::json!({
                        "name": f.name(),
                        "precedence": f.precedence(),
                        "critical": f.is_critical(),
                        "default": f.enabled_by_default(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&listed)?);
        }
        OutputFormat::Text => {
            for filter in &filters {
                let state = if filter.is_critical() {
                    "critical".red()
                } else if filter.enabled_by_default() {
                    "on".green()
                } else {
                    "off".dimmed()
                };
                println!("  {:<18} {:>4}  {}", filter.name().bold(), filter.precedence(), state);
            }
        }
    }
    Ok(())
}
