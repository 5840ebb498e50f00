use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use formc_core::{compile_json, CompileOptions};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Form compiler: schema bundles + presentation to a renderable form.
#[derive(Parser)]
#[command(
    name = "formc",
    version,
    about = "Compile schema bundles and a presentation into a renderable form"
)]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a bundle and its presentation to form JSON
    Compile {
        /// Path to the base schema bundle JSON
        bundle: PathBuf,
        /// Dependency bundle JSON (repeatable)
        #[arg(long = "dep")]
        deps: Vec<PathBuf>,
        /// Path to the presentation JSON
        #[arg(long)]
        presentation: PathBuf,
        /// Path to a JSON object of conditional rules keyed by attribute path
        #[arg(long)]
        conditionals: Option<PathBuf>,
        /// Attribute path rendered read-only, with its descendants (repeatable)
        #[arg(long)]
        readonly: Vec<String>,
        /// RFC 3339 instant relative date ranges resolve against (default: now)
        #[arg(long)]
        reference_time: Option<String>,
        /// Write the compiled form here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Validate a presentation JSON against the formal JSON Schema
    Validate {
        /// Path to the presentation JSON file
        presentation: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.quiet);

    match cli.command {
        Commands::Compile {
            bundle,
            deps,
            presentation,
            conditionals,
            readonly,
            reference_time,
            out,
        } => {
            cmd_compile(
                CompileArgs {
                    bundle: &bundle,
                    deps: &deps,
                    presentation: &presentation,
                    conditionals: conditionals.as_deref(),
                    readonly: &readonly,
                    reference_time: reference_time.as_deref(),
                    out: out.as_deref(),
                },
                cli.output,
                cli.quiet,
            );
        }
        Commands::Validate { presentation } => {
            cmd_validate(&presentation, cli.output, cli.quiet);
        }
    }
}

/// Compiler diagnostics go to stderr; `RUST_LOG` overrides the default level.
fn init_tracing(quiet: bool) {
    let default = if quiet { "off" } else { "formc=warn,formc_core=warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

struct CompileArgs<'a> {
    bundle: &'a Path,
    deps: &'a [PathBuf],
    presentation: &'a Path,
    conditionals: Option<&'a Path>,
    readonly: &'a [String],
    reference_time: Option<&'a str>,
    out: Option<&'a Path>,
}

fn cmd_compile(args: CompileArgs<'_>, output: OutputFormat, quiet: bool) {
    let reference_time = match args.reference_time {
        None => OffsetDateTime::now_utc(),
        Some(raw) => match OffsetDateTime::parse(raw, &Rfc3339) {
            Ok(t) => t,
            Err(e) => {
                let msg = format!("invalid --reference-time '{}': {}", raw, e);
                report_error(&msg, output, quiet);
                process::exit(1);
            }
        },
    };

    let bundle = read_json(args.bundle, output, quiet);
    let deps: Vec<serde_json::Value> = args
        .deps
        .iter()
        .map(|p| read_json(p, output, quiet))
        .collect();
    let presentation = read_json(args.presentation, output, quiet);
    let conditionals = args
        .conditionals
        .map(|p| read_json(p, output, quiet))
        .unwrap_or(serde_json::Value::Null);

    let options = CompileOptions { reference_time };
    let compiled = match compile_json(
        &bundle,
        &deps,
        &presentation,
        &conditionals,
        args.readonly,
        &options,
    ) {
        Ok(c) => c,
        Err(e) => {
            match output {
                OutputFormat::Json => {
                    let err_json = serde_json::to_string_pretty(&e.to_json_value())
                        .unwrap_or_else(|_| format!("{{\"error\": \"{:?}\"}}", e));
                    eprintln!("{}", err_json);
                }
                OutputFormat::Text => {
                    if !quiet {
                        eprintln!("error: {}", e);
                    }
                }
            }
            process::exit(1);
        }
    };

    let pretty = serde_json::to_string_pretty(&compiled)
        .unwrap_or_else(|e| format!("serialization error: {}", e));
    match args.out {
        None => println!("{}", pretty),
        Some(path) => {
            if let Err(e) = std::fs::write(path, pretty + "\n") {
                let msg = format!("error writing file '{}': {}", path.display(), e);
                report_error(&msg, output, quiet);
                process::exit(1);
            }
            if !quiet {
                match output {
                    OutputFormat::Text => println!("wrote {}", path.display()),
                    OutputFormat::Json => println!(
                        "{}",
                        serde_json::json!({"written": path.display().to_string()})
                    ),
                }
            }
        }
    }
}

static PRESENTATION_SCHEMA_STR: &str = include_str!("../../../schema/presentation-schema.json");

fn cmd_validate(presentation_path: &Path, output: OutputFormat, quiet: bool) {
    let schema: serde_json::Value = match serde_json::from_str(PRESENTATION_SCHEMA_STR) {
        Ok(s) => s,
        Err(e) => {
            let msg = format!(
                "internal error: failed to parse embedded presentation schema: {}",
                e
            );
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };
    let validator = match jsonschema::validator_for(&schema) {
        Ok(v) => v,
        Err(e) => {
            let msg = format!("internal error: failed to compile schema: {}", e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };

    let doc = read_json(presentation_path, output, quiet);
    let errors: Vec<String> = validator
        .iter_errors(&doc)
        .map(|e| format!("{}", e))
        .collect();

    if errors.is_empty() {
        if !quiet {
            match output {
                OutputFormat::Text => println!("valid"),
                OutputFormat::Json => println!("{{\"valid\": true}}"),
            }
        }
        return;
    }

    match output {
        OutputFormat::Text => {
            if !quiet {
                eprintln!("invalid presentation");
                for err in &errors {
                    eprintln!("  - {}", err);
                }
            }
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "valid": false,
                "errors": errors
            });
            eprintln!(
                "{}",
                serde_json::to_string_pretty(&json).unwrap_or_default()
            );
        }
    }
    process::exit(1);
}

/// Read and parse a JSON file, exiting on failure.
fn read_json(path: &Path, output: OutputFormat, quiet: bool) -> serde_json::Value {
    let src = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            let msg = format!("error reading file '{}': {}", path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };
    match serde_json::from_str(&src) {
        Ok(v) => v,
        Err(e) => {
            let msg = format!("error parsing JSON in '{}': {}", path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    }
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
