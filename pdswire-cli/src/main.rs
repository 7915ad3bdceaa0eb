//! pdswire CLI - inspect Proteus projects and export pin connections from the command line.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use pdswire::parser::fallback::demo_components;
use pdswire::{
    Component, ConnectionOp, CoreOptions, DuplicatePolicy, Endpoint, ExportTarget,
    InMemorySessionStore, ParsedFileInfo, ProjectCore, SessionId,
};
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pdswire")]
#[command(about = "Proteus project inspection and wiring export tool", long_about = None)]
#[command(version)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect the format of a project file and list its components
    Inspect {
        /// Path to a .pdsprj file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// Record connections for a project file and write export artifacts
    Export {
        /// Path to a .pdsprj file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Connection to record, e.g. IC1.D13=D1.A (repeatable)
        #[arg(short, long = "connect", value_name = "FROM=TO", value_parser = parse_connection)]
        connections: Vec<(Endpoint, Endpoint)>,

        /// Artifact to write
        #[arg(short, long, value_enum, default_value = "all")]
        target: TargetArg,

        /// Directory for the written files
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        out_dir: PathBuf,

        /// Refuse a connection that duplicates an earlier one
        #[arg(long)]
        reject_duplicates: bool,
    },

    /// Print the demo component set used when a file cannot be parsed
    Demo {
        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output for scripting
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum TargetArg {
    All,
    ProjectCopy,
    Netlist,
    Script,
    Guide,
}

impl TargetArg {
    fn targets(self) -> Vec<ExportTarget> {
        match self {
            TargetArg::All => ExportTarget::ALL.to_vec(),
            TargetArg::ProjectCopy => vec![ExportTarget::ProjectCopy],
            TargetArg::Netlist => vec![ExportTarget::Netlist],
            TargetArg::Script => vec![ExportTarget::Script],
            TargetArg::Guide => vec![ExportTarget::Guide],
        }
    }
}

fn parse_connection(raw: &str) -> Result<(Endpoint, Endpoint), String> {
    let (from, to) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected FROM=TO, got {:?}", raw))?;
    let from = from.parse::<Endpoint>().map_err(|e| e.to_string())?;
    let to = to.parse::<Endpoint>().map_err(|e| e.to_string())?;
    Ok((from, to))
}

fn init_logging(verbose: bool) {
    // -v wins over RUST_LOG
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Inspect { file, format } => handle_inspect(&file, &format),
        Commands::Export {
            file,
            connections,
            target,
            out_dir,
            reject_duplicates,
        } => handle_export(&file, connections, target, &out_dir, reject_duplicates),
        Commands::Demo { format } => handle_demo(&format),
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    };

    process::exit(exit_code);
}

fn read_project(file: &Path) -> Result<Vec<u8>> {
    std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))
}

fn handle_inspect(file: &Path, format: &OutputFormat) -> Result<i32> {
    let bytes = read_project(file)?;
    let project = pdswire::parse_project(&bytes);

    match format {
        OutputFormat::Human => {
            println!("\nFile: {}", file.display());
            println!("{}", "─".repeat(60));
            print_info(&project.info);
            print_components(&project.components);
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "file": file.display().to_string(),
                "info": project.info,
                "components": project.components,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(0)
}

fn print_info(info: &ParsedFileInfo) {
    println!("  Format:     {}", info.format.description());
    if let Some(ref hint) = info.version_hint {
        println!("  Version:    {}", hint);
    }
    println!("  Size:       {} bytes", info.size);
    println!("  Signature:  {}", info.signature);
    println!("  Components: {}", info.component_count);
    if info.synthetic {
        println!("  (file could not be parsed; showing demo components)");
    }

    if !info.parse_warnings.is_empty() {
        println!("\n  Warnings:");
        for warning in &info.parse_warnings {
            println!("    - {}", warning);
        }
    }
}

fn print_components(components: &[Component]) {
    println!("\n  Components:");
    for component in components {
        let pins: Vec<_> = component.pins.iter().map(|p| p.name.as_str()).collect();
        println!(
            "    {:<8} {:<20} [{}]",
            component.id,
            component.device,
            component.kind.as_str()
        );
        if let Some(ref value) = component.value {
            println!("      Value: {}", value);
        }
        println!("      Pins:  {}", pins.join(", "));
    }
}

fn handle_demo(format: &OutputFormat) -> Result<i32> {
    let components = demo_components();
    match format {
        OutputFormat::Human => print_components(&components),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&components)?),
    }
    Ok(0)
}

fn handle_export(
    file: &Path,
    connections: Vec<(Endpoint, Endpoint)>,
    target: TargetArg,
    out_dir: &Path,
    reject_duplicates: bool,
) -> Result<i32> {
    let bytes = read_project(file)?;
    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let options = CoreOptions {
        duplicate_policy: if reject_duplicates {
            DuplicatePolicy::Reject
        } else {
            DuplicatePolicy::Accumulate
        },
        ..CoreOptions::default()
    };
    let core = ProjectCore::new(options);
    let store = InMemorySessionStore::new();

    let opened = core.open(&store, &file_name, bytes);
    if opened.info.synthetic {
        eprintln!("Warning: {} could not be parsed; using demo components", file.display());
    }
    for warning in &opened.info.parse_warnings {
        eprintln!("Warning: {}", warning);
    }

    let rejected = record_connections(&core, &store, &opened.session_id, connections);

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".to_string());
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
    tracing::debug!("Writing artifacts to {} with stamp {}", out_dir.display(), timestamp);

    let mut failed = 0;
    for target in target.targets() {
        match core.generate(&store, &opened.session_id, target) {
            Ok(artifact) => {
                let path = out_dir.join(artifact_file_name(target, &stem, &timestamp));
                std::fs::write(&path, artifact)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!("  Wrote {:<13} {}", target.as_str(), path.display());
            }
            Err(e) => {
                eprintln!("  Failed {}: {}", target, e);
                failed += 1;
            }
        }
    }

    if rejected > 0 || failed > 0 {
        eprintln!(
            "\n{} connection(s) rejected, {} artifact(s) failed",
            rejected, failed
        );
        return Ok(1);
    }
    Ok(0)
}

/// Apply each connection in order; returns how many were rejected
fn record_connections(
    core: &ProjectCore,
    store: &InMemorySessionStore,
    session_id: &SessionId,
    connections: Vec<(Endpoint, Endpoint)>,
) -> usize {
    let mut rejected = 0;
    let total = connections.len();
    for (from, to) in connections {
        let label = format!("{} -> {}", from, to);
        if let Err(e) = core.mutate_connections(store, session_id, ConnectionOp::Add { from, to }) {
            eprintln!("Rejected {}: {}", label, e);
            rejected += 1;
        }
    }
    println!("Connections: {} accepted, {} rejected", total - rejected, rejected);
    rejected
}

fn artifact_file_name(target: ExportTarget, stem: &str, timestamp: &str) -> String {
    let ext = target.extension();
    match target {
        ExportTarget::ProjectCopy => format!("connected_{}_{}.{}", stem, timestamp, ext),
        ExportTarget::Netlist => format!("netlist_{}.{}", timestamp, ext),
        ExportTarget::Script => format!("connect_script_{}.{}", timestamp, ext),
        ExportTarget::Guide => format!("wiring_guide_{}.{}", timestamp, ext),
    }
}
