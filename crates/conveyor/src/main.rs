use std::{
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};

use conveyor::{
    combine,
    config::Config,
    orchestrator::{Bundle, BundleOrchestrator},
};

#[derive(Debug, Parser)]
#[command(name = "conveyor", version, about = "Bundle directive-driven assets into a single script")]
struct Args {
    /// Entry asset (typically a manifest file)
    entry: PathBuf,

    /// Write the bundle here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Additional load path for logical references; may be repeated,
    /// searched before any configured load paths
    #[arg(short = 'p', long = "load-path", value_name = "DIR")]
    load_paths: Vec<PathBuf>,

    /// Use this config file instead of discovering conveyor.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Append a content digest to the output file name
    #[arg(long)]
    digest: bool,

    /// Print the resolved inclusion order instead of bundling
    #[arg(long)]
    list: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(match args.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        })
        .init();

    let config = load_config(&args)?;
    let mut orchestrator = BundleOrchestrator::new(config.clone());
    let bundle = orchestrator.bundle(&args.entry)?;

    if args.list {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        for path in &bundle.order {
            writeln!(out, "{}", path.display())?;
        }
        return Ok(());
    }

    emit(&bundle, &config)
}

/// Merge CLI flags over the loaded or discovered configuration
fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => {
            let start = args
                .entry
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
            Config::discover(&start)?
        }
    };

    // CLI load paths are searched first
    let mut load_paths = args.load_paths.clone();
    load_paths.append(&mut config.load_paths);
    config.load_paths = load_paths;

    if let Some(output) = &args.output {
        config.output = Some(output.clone());
    }
    if args.digest {
        config.digest = true;
    }

    Ok(config)
}

fn emit(bundle: &Bundle, config: &Config) -> Result<()> {
    match &config.output {
        Some(output) => {
            let target = if config.digest {
                combine::fingerprinted_path(output, &combine::content_digest(&bundle.source))
            } else {
                output.clone()
            };
            if let Some(parent) = target.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(&target, &bundle.source)
                .with_context(|| format!("failed to write bundle to {}", target.display()))?;
            info!(
                "wrote {} asset(s), {} bytes to {}",
                bundle.order.len(),
                bundle.source.len(),
                target.display()
            );
        }
        None => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            out.write_all(bundle.source.as_bytes())?;
        }
    }
    Ok(())
}
