// src/main.rs

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use modpack::{BuildConfig, Declarations, Pipeline};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Output formats for the build recipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Toml,
}

#[derive(Parser)]
#[command(name = "modpack")]
#[command(author, version, about = "Assemble module packages from build declarations", long_about = None)]
struct Cli {
    /// Build configuration file
    #[arg(short, long, global = true, default_value = "modpack.toml")]
    config: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full build and print the recipe
    Plan {
        /// Declarations file
        decls: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: OutputFormat,
    },
    /// Validate declarations without assembling packages
    Check {
        /// Declarations file
        decls: PathBuf,
    },
    /// List the variants created for every module
    Variants {
        /// Declarations file
        decls: PathBuf,
    },
}

fn load_inputs(decls: &Path, config: &Path) -> Result<(Declarations, BuildConfig)> {
    let decls = Declarations::load(decls)
        .with_context(|| format!("Failed to load declarations from {}", decls.display()))?;
    let config = BuildConfig::load(config)
        .with_context(|| format!("Failed to load config from {}", config.display()))?;
    Ok((decls, config))
}

fn cmd_plan(decls: &Path, config: &Path, format: OutputFormat) -> Result<()> {
    let (decls, config) = load_inputs(decls, config)?;
    let recipe = Pipeline::new(&decls, &config)
        .plan()
        .context("Build failed")?;
    let output = match format {
        OutputFormat::Json => recipe.to_json()?,
        OutputFormat::Toml => recipe.to_toml()?,
    };
    println!("{}", output);
    Ok(())
}

fn cmd_check(decls: &Path, config: &Path) -> Result<()> {
    let (decls, config) = load_inputs(decls, config)?;
    let summary = Pipeline::new(&decls, &config)
        .check()
        .context("Validation failed")?;
    println!(
        "OK: {} packages, {} modules, {} variants, {} links",
        summary.packages, summary.modules, summary.variants, summary.links
    );
    Ok(())
}

fn cmd_variants(decls: &Path, config: &Path) -> Result<()> {
    let (decls, config) = load_inputs(decls, config)?;
    let entries = Pipeline::new(&decls, &config).variants()?;
    for entry in entries {
        println!("{:<32} {}", entry.module, entry.variant);
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Plan { decls, format } => {
            info!("Planning packages from {}", decls.display());
            cmd_plan(&decls, &cli.config, format)
        }
        Commands::Check { decls } => {
            info!("Checking {}", decls.display());
            cmd_check(&decls, &cli.config)
        }
        Commands::Variants { decls } => cmd_variants(&decls, &cli.config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_plan_format() {
        let cli = Cli::try_parse_from(["modpack", "plan", "decls.toml", "--format", "toml", "-v"])
            .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, PathBuf::from("modpack.toml"));
        match cli.command {
            Commands::Plan { format, .. } => assert_eq!(format, OutputFormat::Toml),
            _ => panic!("expected plan"),
        }
    }
}
