use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "jarmerge",
    about = "Merge JAR archives into one, coalescing service files and reporting conflicts",
    version
)]
pub struct Cli {
    /// Input archives; on duplicate paths the earliest one wins
    #[arg(required_unless_present = "list_filters")]
    pub inputs: Vec<PathBuf>,

    /// Output archive (may be one of the inputs; it is backed up first)
    #[arg(short, long, required_unless_present_any = ["list_filters", "config"])]
    pub output: Option<PathBuf>,

    /// TOML file with merge options; flags override it
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Deflate level 0-9; 0 stores entries uncompressed
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(0..=9))]
    pub level: Option<u32>,

    /// Append META-INF/INDEX.LIST
    #[arg(long)]
    pub index: bool,

    /// Stamp every entry with 1980-01-01 for reproducible output
    #[arg(long)]
    pub zero_timestamps: bool,

    /// Main-Class of the output manifest
    #[arg(short, long)]
    pub main_class: Option<String>,

    /// Enable a filter that is off by default (repeatable)
    #[arg(long = "enable", value_name = "FILTER")]
    pub enable: Vec<String>,

    /// Disable a filter that is on by default (repeatable)
    #[arg(long = "disable", value_name = "FILTER")]
    pub disable: Vec<String>,

    /// List the built-in filters and exit
    #[arg(long)]
    pub list_filters: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
