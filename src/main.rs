//! region-digraph CLI: validate, inspect and query region digraph configs.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

use region_digraph::config::DigraphConfig;
use region_digraph::digraph::RegionDigraph;
use region_digraph::query::{CapabilityVisibility, ModuleVisibility, ServiceVisibility};
use region_digraph::region::ModuleId;

#[derive(Parser)]
#[command(name = "region-digraph", version, about = "Region isolation digraph tool")]
struct Cli {
    /// Log filter used when RUST_LOG is not set.
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate a digraph config.
    Check {
        /// Path to the TOML config.
        #[arg(long)]
        config: PathBuf,
    },

    /// Print regions, members and edges.
    Show {
        #[arg(long)]
        config: PathBuf,
    },

    /// Print the digraph as JSON.
    Export {
        #[arg(long)]
        config: PathBuf,
    },

    /// Print the candidates a requester can see.
    Visible {
        #[arg(long)]
        config: PathBuf,

        /// Requesting module id (0 is the system module).
        #[arg(long)]
        requester: u64,

        /// Kind of candidates in the candidates file.
        #[arg(long, value_enum, default_value = "module")]
        kind: CandidateKind,

        /// JSON array of candidates. Attribute strings are compared as text
        /// unless a capability lists the key in `version_keys`.
        #[arg(long)]
        candidates: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum CandidateKind {
    Module,
    Service,
    Capability,
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .init();

    match cli.command {
        Commands::Check { config } => {
            let digraph = load_digraph(&config)?;
            println!(
                "{}: ok ({} regions, {} edges)",
                config.display(),
                digraph.region_count(),
                digraph.edge_count()
            );
        }

        Commands::Show { config } => {
            let digraph = load_digraph(&config)?;
            show(&digraph);
        }

        Commands::Export { config } => {
            let digraph = load_digraph(&config)?;
            print_json(&digraph.to_config())?;
        }

        Commands::Visible {
            config,
            requester,
            kind,
            candidates,
        } => {
            let digraph = load_digraph(&config)?;
            let requester = ModuleId::new(requester);
            match kind {
                CandidateKind::Module => {
                    let all = read_candidates(&candidates)?;
                    print_json(&ModuleVisibility::new(&digraph).visible(requester, &all))?;
                }
                CandidateKind::Service => {
                    let all = read_candidates(&candidates)?;
                    print_json(&ServiceVisibility::new(&digraph).visible(requester, &all))?;
                }
                CandidateKind::Capability => {
                    let all = read_candidates(&candidates)?;
                    print_json(&CapabilityVisibility::new(&digraph).visible(requester, &all))?;
                }
            }
        }
    }

    Ok(())
}

fn load_digraph(path: &Path) -> Result<RegionDigraph> {
    let config = DigraphConfig::load(path)?;
    Ok(config.build()?)
}

fn read_candidates<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let content = std::fs::read_to_string(path).into_diagnostic()?;
    serde_json::from_str(&content).into_diagnostic()
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).into_diagnostic()?;
    println!("{json}");
    Ok(())
}

fn show(digraph: &RegionDigraph) {
    if digraph.region_count() == 0 {
        println!("No regions.");
        return;
    }
    println!("Regions ({}):", digraph.region_count());
    for region in digraph.regions() {
        let members: Vec<String> = region.members().map(|m| m.get().to_string()).collect();
        println!("  {region}: [{}]", members.join(", "));
    }

    let edges = digraph.edges();
    if edges.is_empty() {
        println!("No edges.");
        return;
    }
    println!("Edges ({}):", edges.len());
    for (tail, filter, head) in edges {
        println!("  {} -> {}: {filter}", tail.name(), head.name());
    }
}
