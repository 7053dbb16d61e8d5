//! matrix-gate CLI — deployment gate for the matrix registry.
//!
//! ## Usage
//!
//! ```bash
//! # Consistency gate (labels exist, shapes match)
//! matrix-gate check --matrices /srv/pooldecode/matrices.json
//!
//! # Registry API gate (lookups and error listings)
//! matrix-gate api --matrices /srv/pooldecode/matrices.json --registry config/registry.json
//!
//! # Both, writing an audit artifact
//! matrix-gate all --matrices /srv/pooldecode/matrices.json --out gates/matrix_gates.json
//!
//! # Print the configuration table
//! matrix-gate list --matrices /srv/pooldecode/matrices.json
//! ```
//!
//! The matrix store manifest is produced by the matrix design pipeline and is
//! not shipped here. Without `--registry` the builtin configuration table is
//! used; `config/registry.json` holds the same table as a manifest.
//!
//! ## Exit Codes
//! - 0: All gates passed
//! - 1: One or more gates failed (deployment must not proceed)
//! - 2: Error (missing files, invalid manifests, etc.)

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use pooldecode_gates::{
    ApiSanityConfig, ApiSanityGate, GateResult, GateStatus, StderrNotifier, TracingNotifier,
    at_deployment, write_gate_results,
};
use pooldecode_registry::{MatrixRegistry, MatrixStore};
use tracing_subscriber::EnvFilter;

/// matrix-gate: deployment gate for the pooled-test matrix registry.
#[derive(Parser)]
#[command(name = "matrix-gate")]
#[command(version)]
#[command(about = "Validates the matrix registry before deployment")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format: text (default) or json
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Args)]
struct Sources {
    /// Path to the matrix store manifest (matrices.json)
    #[arg(long, short = 'm')]
    matrices: PathBuf,

    /// Path to the registry manifest (registry.json); builtin table if omitted
    #[arg(long, short = 'r')]
    registry: Option<PathBuf>,

    /// Write gate results as JSON to this path
    #[arg(long, short = 'o')]
    out: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Consistency gate: every size maps to an existing matrix of that shape
    Check {
        #[command(flatten)]
        sources: Sources,
    },

    /// API gate: lookups succeed for published keys, fail with full listings otherwise
    Api {
        #[command(flatten)]
        sources: Sources,

        /// Extra unregistered sizes to probe
        #[arg(long = "probe-size")]
        probe_sizes: Vec<String>,

        /// Extra unknown labels to probe
        #[arg(long = "probe-label")]
        probe_labels: Vec<String>,
    },

    /// Run all gates
    All {
        #[command(flatten)]
        sources: Sources,
    },

    /// Print the size -> label table
    List {
        #[command(flatten)]
        sources: Sources,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let status = match run(cli) {
        Ok(status) => status,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            GateStatus::Error
        }
    };
    ExitCode::from(status.exit_code())
}

fn run(cli: Cli) -> anyhow::Result<GateStatus> {
    match cli.command {
        Commands::Check { sources } => run_check(&sources, cli.format),
        Commands::Api {
            sources,
            probe_sizes,
            probe_labels,
        } => run_api(&sources, probe_sizes, probe_labels, cli.format),
        Commands::All { sources } => run_all(&sources, cli.format),
        Commands::List { sources } => run_list(&sources, cli.format),
    }
}

fn load_registry(sources: &Sources) -> anyhow::Result<MatrixRegistry> {
    let store = MatrixStore::load(&sources.matrices)
        .with_context(|| format!("loading matrix store {}", sources.matrices.display()))?;
    let store = Arc::new(store);

    match &sources.registry {
        Some(path) => MatrixRegistry::load(store, path)
            .with_context(|| format!("loading registry {}", path.display())),
        None => Ok(MatrixRegistry::with_builtins(store)),
    }
}

/// Deployment gate. Violations go to the log and to the operator on stderr.
fn consistency_gate(registry: &MatrixRegistry) -> GateResult {
    match at_deployment(registry, &(TracingNotifier, StderrNotifier)) {
        Ok(gate) => gate,
        Err(blocked) => blocked.gate,
    }
}

fn run_check(sources: &Sources, format: OutputFormat) -> anyhow::Result<GateStatus> {
    let registry = load_registry(sources)?;
    let gate = consistency_gate(&registry);
    emit(&[gate], sources.out.as_deref(), format)
}

fn run_api(
    sources: &Sources,
    probe_sizes: Vec<String>,
    probe_labels: Vec<String>,
    format: OutputFormat,
) -> anyhow::Result<GateStatus> {
    let registry = load_registry(sources)?;

    let mut config = ApiSanityConfig::default();
    config.probe_configurations.extend(probe_sizes);
    config.probe_labels.extend(probe_labels);

    let gate = ApiSanityGate::new(config).validate(&registry);
    emit(&[gate], sources.out.as_deref(), format)
}

fn run_all(sources: &Sources, format: OutputFormat) -> anyhow::Result<GateStatus> {
    let registry = load_registry(sources)?;
    let gates = vec![
        consistency_gate(&registry),
        ApiSanityGate::new(ApiSanityConfig::default()).validate(&registry),
    ];
    emit(&gates, sources.out.as_deref(), format)
}

fn run_list(sources: &Sources, format: OutputFormat) -> anyhow::Result<GateStatus> {
    let registry = load_registry(sources)?;
    let table = registry.list_configurations();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&table)?),
        OutputFormat::Text => {
            for (config, label) in &table {
                println!("{:<10} {}", config, label);
            }
            println!("registry version hash: {}", registry.compute_version_hash_hex());
        }
    }

    Ok(GateStatus::Passed)
}

fn emit(
    gates: &[GateResult],
    out: Option<&Path>,
    format: OutputFormat,
) -> anyhow::Result<GateStatus> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(gates)?),
        OutputFormat::Text => {
            for gate in gates {
                print!("{}", gate.render_text());
            }
        }
    }

    if let Some(path) = out {
        write_gate_results(path, gates)
            .with_context(|| format!("writing gate results to {}", path.display()))?;
    }

    let status = GateStatus::from_gates(gates);
    if format == OutputFormat::Text {
        println!(
            "{}",
            if status == GateStatus::Passed { "\nAll OK" } else { "\nGot Error" }
        );
    }
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MATRICES: &str = r#"{
        "schema_version": "1.0.0",
        "matrices": {"M_2_2": [[1, 0], [0, 1]], "M_2_3": [[1, 0, 1], [0, 1, 1]]}
    }"#;

    fn exit_code(dir: &Path, registry_json: &str, command: &str) -> u8 {
        let matrices = dir.join("matrices.json");
        let registry = dir.join("registry.json");
        std::fs::write(&matrices, MATRICES).unwrap();
        std::fs::write(&registry, registry_json).unwrap();

        let cli = Cli::parse_from([
            "matrix-gate",
            command,
            "--matrices",
            matrices.to_str().unwrap(),
            "--registry",
            registry.to_str().unwrap(),
            "--out",
            dir.join("gates.json").to_str().unwrap(),
        ]);
        match run(cli) {
            Ok(status) => status.exit_code(),
            Err(_) => GateStatus::Error.exit_code(),
        }
    }

    #[test]
    fn test_coherent_registry_exits_zero() {
        let dir = tempfile::tempdir().unwrap();
        let json = r#"{"schema_version": "1.0.0", "configurations": {"2x2": "M_2_2", "2x3": "M_2_3"}}"#;
        assert_eq!(exit_code(dir.path(), json, "check"), 0);
        assert_eq!(exit_code(dir.path(), json, "all"), 0);
    }

    #[test]
    fn test_broken_registry_exits_one_and_writes_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let json = r#"{"schema_version": "1.0.0", "configurations": {"2x2": "M_2_3", "x": "M_2_2"}}"#;
        assert_eq!(exit_code(dir.path(), json, "check"), 1);

        let written: Vec<GateResult> =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("gates.json")).unwrap())
                .unwrap();
        assert_eq!(written.len(), 1);
        assert!(!written[0].passed);
        assert_eq!(written[0].metrics.as_ref().unwrap()["violations"], 2);
    }

    #[test]
    fn test_missing_manifest_exits_two() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::parse_from([
            "matrix-gate",
            "check",
            "--matrices",
            dir.path().join("absent.json").to_str().unwrap(),
        ]);
        let err = run(cli).unwrap_err();
        assert!(format!("{:#}", err).contains("loading matrix store"));
    }

    #[test]
    fn test_invalid_registry_manifest_exits_two() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(exit_code(dir.path(), "{not json", "check"), 2);
    }
}
