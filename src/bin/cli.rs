// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Spatial Engine Contributors

//! Spatial engine CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use spatial_engine::cli::{commands, parse_point, Reporter, TextFormat};
use spatial_engine::{EngineConfig, GeometryHelper};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "spatial-engine")]
#[command(about = "Bounding volumes, predicates and exports for 3D geometry", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./spatial-engine.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print reports as JSON instead of formatted text
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the AABB (and OBB) of each input as JSON
    Bounds {
        /// Mesh JSON, GeoJSON or WKT files, or directories to search
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Also fit an oriented bounding box
        #[arg(long)]
        oriented: bool,
    },

    /// Test a point against a mesh and its bounding volumes
    Probe {
        /// Mesh JSON or model item JSON
        mesh: PathBuf,

        /// Point as x,y,z
        #[arg(short, long, allow_hyphen_values = true)]
        point: String,
    },

    /// Merge inputs and export a Wavefront OBJ file
    ExportObj {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// Convert an input to WKT, GeoJSON or BOX3D text
    Convert {
        input: PathBuf,

        /// Target format (wkt, geojson, box3d)
        #[arg(short, long, default_value = "wkt")]
        to: String,
    },

    /// Report area, length and optionally the distance to a second input
    Measure {
        input: PathBuf,

        #[arg(long)]
        other: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(&cli) {
        Reporter::report_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>, verbose: bool) -> Result<EngineConfig> {
    match path {
        Some(path) => {
            let mut config = EngineConfig::from_file(path)?;
            config.apply_overrides(|key| std::env::var(key).ok())?;
            if verbose {
                Reporter::report_info(&format!("Loaded config from {}", path.display()));
            }
            Ok(config)
        }
        None => EngineConfig::load(),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to serialize report")?
    );
    Ok(())
}

fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli.config.as_ref(), cli.verbose)?;
    let helper = GeometryHelper::new(config);

    match &cli.command {
        Commands::Bounds { inputs, oriented } => {
            for report in commands::bounds(inputs, *oriented)? {
                print_json(&report)?;
            }
        }
        Commands::Probe { mesh, point } => {
            let report = commands::probe_file(&helper, mesh, parse_point(point)?)?;
            if cli.json {
                print_json(&report)?;
            } else {
                Reporter::report_probe(mesh, &report);
            }
        }
        Commands::ExportObj { inputs, output } => {
            let start = Instant::now();
            let summary = commands::export_obj(&helper, inputs, output)?;
            if cli.json {
                print_json(&summary)?;
            } else {
                if summary.face_count == 0 {
                    Reporter::report_warning("No faces were written; inputs hold only points or lines");
                }
                Reporter::report_export(output, &summary, start.elapsed());
            }
        }
        Commands::Convert { input, to } => {
            let format: TextFormat = to.parse()?;
            println!("{}", commands::convert(&helper, input, format)?);
        }
        Commands::Measure { input, other } => {
            let report = commands::measure(&helper, input, other.as_deref())?;
            if cli.json {
                print_json(&report)?;
            } else {
                Reporter::report_measure(input, &report);
            }
        }
    }

    Ok(())
}
