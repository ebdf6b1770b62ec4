//! Protoplug CLI - runs a generation plan
//!
//! Commands: generate, entities
//! Outputs JSON to stdout, logs to stderr when PROTOPLUG_LOG is set
//! Returns 2 when generation fails

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use protoplug_core::{pipeline::run_plan, GenerationPlan, SymbolRegistry};

#[derive(Parser)]
#[command(name = "protoplug-cli")]
#[command(about = "Protoplug CLI - generated file assembly")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the generation plan (JSON)
    #[arg(short, long, default_value = "plan.json")]
    plan: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// List entities declared by the plan
    Entities,

    /// Generate all files of the plan
    Generate {
        /// Plugin parameter, e.g. "target=ts,keep_empty_files=true"
        #[arg(long)]
        parameter: Option<String>,

        /// Print only the manifest, not file contents
        #[arg(long)]
        manifest_only: bool,
    },
}

fn init_tracing() {
    if let Ok(filter) = EnvFilter::try_from_env("PROTOPLUG_LOG") {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
        tracing::debug!("tracing initialized");
    }
}

fn write_json<T: Serialize>(out: &mut impl Write, value: &T) -> bool {
    let written = serde_json::to_string_pretty(value)
        .map_err(|e| e.to_string())
        .and_then(|text| writeln!(out, "{}", text).map_err(|e| e.to_string()));
    match written {
        Ok(()) => true,
        Err(e) => {
            eprintln!("failed to write output: {}", e);
            false
        }
    }
}

/// Print `value` and exit with `code`, or fail if it cannot be printed.
fn print_json<T: Serialize>(value: &T, code: ExitCode) -> ExitCode {
    if write_json(&mut std::io::stdout().lock(), value) {
        code
    } else {
        ExitCode::FAILURE
    }
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let plan = match GenerationPlan::load(&cli.plan) {
        Ok(p) => p,
        Err(e) => {
            return print_json(
                &serde_json::json!({
                    "success": false,
                    "error": format!("Failed to load plan: {}", e),
                }),
                ExitCode::FAILURE,
            );
        }
    };

    match cli.command {
        Commands::Entities => {
            let mut registry = SymbolRegistry::new(plan.settings.file_naming());
            for entity in &plan.entities {
                registry.register(entity.clone());
            }
            let entities: Vec<_> = registry
                .list()
                .iter()
                .map(|e| serde_json::json!({
                    "typeName": e.type_name,
                    "kind": e.kind,
                    "localName": e.local_name(),
                    "importPath": registry.naming().import_path(&e.file),
                }))
                .collect();
            print_json(&entities, ExitCode::SUCCESS)
        }

        Commands::Generate { parameter, manifest_only } => {
            match run_plan(&plan, parameter.as_deref()) {
                Ok(output) => {
                    let output = if manifest_only {
                        serde_json::json!({ "success": true, "manifest": output.manifest })
                    } else {
                        serde_json::json!({ "success": true, "output": output })
                    };
                    print_json(&output, ExitCode::SUCCESS)
                }
                Err(e) => {
                    tracing::error!(error = %e, "generation failed");
                    print_json(
                        &serde_json::json!({
                            "success": false,
                            "error": e.to_string(),
                        }),
                        ExitCode::from(2),
                    )
                }
            }
        }
    }
}
