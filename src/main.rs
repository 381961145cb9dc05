//! buildcfg CLI
//!
//! Entry point for the `buildcfg` command-line tool.

use buildcfg::options::{default_host_path, PROJECT_OPTIONS_FILE};
use buildcfg::{
    load_declarations, resolve, EffectiveConfiguration, EffectiveOptions, Failure,
    LoadedDeclarations, Warning,
};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process;
use tracing::debug;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Schema identifier of the resolution report
const REPORT_SCHEMA_ID: &str = "buildcfg/resolution_report@1";

#[derive(Parser)]
#[command(name = "buildcfg")]
#[command(about = "Resolve layered module build configuration", version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve declarations and print the resolution report
    Resolve {
        #[command(flatten)]
        input: InputArgs,

        /// Write the effective configuration to this file
        #[arg(long)]
        out: Option<PathBuf>,

        /// Output in human-readable format instead of JSON
        #[arg(long)]
        human: bool,
    },

    /// Print one resolved property and where it came from
    Get {
        #[command(flatten)]
        input: InputArgs,

        /// Property key, e.g. defaultConfig.minSdk
        key: String,
    },

    /// Print one resolved build variant
    Variant {
        #[command(flatten)]
        input: InputArgs,

        /// Variant name, e.g. release
        name: String,
    },

    /// Validate declarations and print a summary
    Check {
        #[command(flatten)]
        input: InputArgs,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Declaration file (.toml or .json)
    file: PathBuf,

    /// Project options file (default: buildcfg.toml next to the declarations)
    #[arg(long, short = 'o')]
    options: Option<PathBuf>,

    /// Host options file (default: ~/.config/buildcfg/options.toml)
    #[arg(long)]
    host_options: Option<PathBuf>,

    /// Treat duplicate dependencies as fatal
    #[arg(long)]
    strict_dependencies: Option<bool>,

    /// Fail when any variant cannot be resolved
    #[arg(long)]
    require_all_variants: Option<bool>,
}

impl InputArgs {
    fn cli_overrides(&self) -> Option<serde_json::Value> {
        let mut overrides = serde_json::Map::new();
        if let Some(strict) = self.strict_dependencies {
            overrides.insert("strict_dependencies".to_string(), strict.into());
        }
        if let Some(require) = self.require_all_variants {
            overrides.insert("require_all_variants_resolve".to_string(), require.into());
        }
        (!overrides.is_empty()).then_some(serde_json::Value::Object(overrides))
    }

    fn project_options_path(&self) -> PathBuf {
        self.options.clone().unwrap_or_else(|| {
            self.file
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join(PROJECT_OPTIONS_FILE)
        })
    }
}

/// Resolution report written by `resolve`
#[derive(Serialize)]
struct Report<'a> {
    schema_id: &'static str,
    created_at: DateTime<Utc>,
    declaration_file: String,

    /// SHA-256 of the raw declaration file
    file_digest: &'a str,

    options: &'a EffectiveOptions,

    #[serde(skip_serializing_if = "Option::is_none")]
    effective_configuration: Option<&'a EffectiveConfiguration>,

    #[serde(skip_serializing_if = "Option::is_none")]
    failure: Option<Failure>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Resolve { input, out, human } => run_resolve(&input, out, human),
        Commands::Get { input, key } => run_get(&input, &key),
        Commands::Variant { input, name } => run_variant(&input, &name),
        Commands::Check { input } => run_check(&input),
    }
}

fn init_logging(verbose: u8) {
    let default_directive = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_filter(filter),
        )
        .init();
}

fn load_inputs(input: &InputArgs) -> (LoadedDeclarations, EffectiveOptions) {
    let loaded = match load_declarations(&input.file) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error loading declarations: {}", e);
            process::exit(1);
        }
    };

    let host_path = input
        .host_options
        .clone()
        .or_else(|| default_host_path().ok());
    let project_path = input.project_options_path();
    let options = match EffectiveOptions::build(
        host_path.as_deref(),
        Some(&project_path),
        input.cli_overrides(),
    ) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error loading options: {}", e);
            process::exit(1);
        }
    };

    debug!(sources = options.sources.len(), "Options loaded");
    (loaded, options)
}

fn resolve_or_exit(input: &InputArgs) -> EffectiveConfiguration {
    let (loaded, options) = load_inputs(input);
    match resolve(loaded.tree, &options.options) {
        Ok(effective) => effective,
        Err(e) => {
            print_json(&e.to_failure());
            process::exit(1);
        }
    }
}

fn run_resolve(input: &InputArgs, out: Option<PathBuf>, human: bool) {
    let (loaded, options) = load_inputs(input);
    let result = resolve(loaded.tree, &options.options);

    if let (Ok(effective), Some(path)) = (&result, &out) {
        if let Err(e) = effective.write_to_file(path) {
            eprintln!("Error writing {}: {}", path.display(), e);
            process::exit(1);
        }
    }

    if human {
        match &result {
            Ok(effective) => print_human(effective),
            Err(e) => eprintln!("Resolution failed [{}]: {}", e.kind(), e),
        }
    } else {
        let report = Report {
            schema_id: REPORT_SCHEMA_ID,
            created_at: Utc::now(),
            declaration_file: loaded.path.display().to_string(),
            file_digest: &loaded.digest,
            options: &options,
            effective_configuration: result.as_ref().ok(),
            failure: result.as_ref().err().map(|e| e.to_failure()),
        };
        print_json(&report);
    }

    if result.is_err() {
        process::exit(1);
    }
}

fn run_get(input: &InputArgs, key: &str) {
    let effective = resolve_or_exit(input);
    match effective.property(key) {
        Some(property) => print_json(&serde_json::json!({
            "key": key,
            "value": property.value,
            "origin": property.origin,
            "via": property.via,
        })),
        None => {
            eprintln!("Property '{}' is not defined", key);
            process::exit(1);
        }
    }
}

fn run_variant(input: &InputArgs, name: &str) {
    let effective = resolve_or_exit(input);
    match effective.variant(name) {
        Some(variant) => print_json(variant),
        None => {
            eprintln!("Variant '{}' is not defined", name);
            eprintln!(
                "Available variants: {}",
                effective
                    .variants()
                    .keys()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            process::exit(1);
        }
    }
}

fn run_check(input: &InputArgs) {
    let effective = resolve_or_exit(input);
    println!("Declarations valid: {}", input.file.display());
    println!();
    println!("  Target layer: {}", effective.target_layer());
    println!("  Properties: {}", effective.properties().len());
    println!("  Plugins: {}", effective.plugins().len());
    println!("  Dependencies: {}", effective.dependencies().len());
    println!(
        "  Variants: {}",
        effective
            .variants()
            .keys()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    );
    if !effective.warnings().is_empty() {
        println!("  Warnings: {}", effective.warnings().len());
    }
}

fn print_human(effective: &EffectiveConfiguration) {
    println!("Target layer: {}", effective.target_layer());
    println!("Digest: {}", effective.declaration_digest());
    println!();

    println!("Properties:");
    for (key, property) in effective.properties() {
        println!("  {} = {}  ({})", key, property.value, property.origin);
    }

    if !effective.plugins().is_empty() {
        println!();
        println!("Plugins:");
        for plugin in effective.plugins() {
            println!("  {}", plugin);
        }
    }

    if !effective.dependencies().is_empty() {
        println!();
        println!("Dependencies:");
        for dependency in effective.dependencies() {
            println!("  {} {}", dependency.role, dependency.coordinate);
        }
    }

    for (name, variant) in effective.variants() {
        println!();
        println!("Variant {} ({}):", name, variant.chain.join(" <- "));
        for (setting, resolved) in &variant.settings {
            let source = if resolved.explicit {
                String::new()
            } else {
                format!("  (from {})", resolved.from)
            };
            println!("  {} = {}{}", setting, resolved.value, source);
        }
    }

    if !effective.warnings().is_empty() {
        println!();
        println!("Warnings:");
        for warning in effective.warnings() {
            println!("  {}", describe_warning(warning));
        }
    }
}

fn describe_warning(warning: &Warning) -> String {
    match warning {
        Warning::DuplicateDependency {
            role,
            kept,
            ignored,
        } => format!("{}: kept {}, ignored {}", role, kept, ignored),
        Warning::VariantOmitted {
            variant,
            kind,
            reason,
        } => format!("variant {} omitted [{}]: {}", variant, kind, reason),
        Warning::SigningReuse(reuse) => format!(
            "variant {} is signed with '{}', also used by {}",
            reuse.variant,
            reuse.signing_config,
            reuse.shared_with.join(", ")
        ),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            process::exit(1);
        }
    }
}
