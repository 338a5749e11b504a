//! droidcfg CLI
//!
//! Resolves the release signing identity, app version and SDK levels of a
//! Flutter Android module from its property files.

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use droidcfg_android::{AndroidBuildConfig, BuildConfigResolver, BuildVariantConfig, SigningIdentity};
use droidcfg_cli::output::{format_count, format_optional, format_secret, set_quiet, Status};
use droidcfg_core::config::{Config, FallbackPolicy};
use droidcfg_core::error::{exit_codes, Error};
use droidcfg_core::properties::PropertySource;
use droidcfg_core::validation::ValidationError;
use owo_colors::OwoColorize;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "droidcfg")]
#[command(about = "Resolve Android release signing and build configuration")]
#[command(version)]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Project root containing local.properties and android/
    #[arg(short = 'C', long, global = true, default_value = ".")]
    project_dir: PathBuf,

    /// Increase output verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the full module configuration
    Resolve {
        /// Fail instead of signing the release build with the debug key
        #[arg(long)]
        strict: bool,
    },

    /// Show the release signing identity and which key signs release builds
    Signing {
        /// Signing properties file, relative to the project directory
        #[arg(long)]
        key_properties: Option<PathBuf>,
    },

    /// Show versionCode and versionName
    Version,

    /// Check that release builds are signed with the release keystore
    Check {
        /// Treat a debug-key fallback as a failure
        #[arg(long)]
        strict: bool,
    },

    /// Report which input files are present
    Doctor,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        owo_colors::set_override(false);
    }
    set_quiet(cli.quiet);
    init_logging(cli.verbose, cli.quiet)?;

    let config = match Config::load(cli.config.as_deref(), &cli.project_dir) {
        Ok(config) => config,
        Err(e) => std::process::exit(report_error(&e, cli.format)),
    };
    let resolver = BuildConfigResolver::from_config(&cli.project_dir, &config);

    let exit_code = match cli.command {
        Commands::Resolve { strict } => run_resolve(resolver, strict, cli.format),
        Commands::Signing { key_properties } => run_signing(resolver, key_properties, cli.format),
        Commands::Version => run_version(&resolver, cli.format),
        Commands::Check { strict } => run_check(&resolver, strict, cli.format),
        Commands::Doctor => run_doctor(&resolver, &config, cli.format),
    };

    std::process::exit(exit_code);
}

fn init_logging(verbose: u8, quiet: bool) -> Result<()> {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))
}

fn report_error(err: &Error, format: OutputFormat) -> i32 {
    match format {
        OutputFormat::Json => {
            print_json(&err.to_report());
        }
        OutputFormat::Text => Status::error(&err.to_string()),
    }
    err.exit_code()
}

fn print_json<T: Serialize>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            exit_codes::SUCCESS
        }
        Err(e) => {
            Status::error(&format!("Failed to serialize output: {}", e));
            exit_codes::FAILURE
        }
    }
}

fn run_resolve(resolver: BuildConfigResolver, strict: bool, format: OutputFormat) -> i32 {
    let resolver = if strict {
        resolver.with_policy(FallbackPolicy::Fail)
    } else {
        resolver
    };

    match resolver.resolve() {
        Ok(config) => match format {
            OutputFormat::Json => print_json(&config),
            OutputFormat::Text => {
                print_build_config(&config);
                exit_codes::SUCCESS
            }
        },
        Err(e) => report_error(&e, format),
    }
}

fn print_build_config(config: &AndroidBuildConfig) {
    Status::header("Android build configuration");
    Status::field("namespace", &config.namespace);
    Status::field("applicationId", &config.application_id);
    Status::field("compileSdk", &config.compile_sdk.to_string());
    Status::field("minSdk", &config.min_sdk.to_string());
    Status::field("targetSdk", &config.target_sdk.to_string());
    Status::field("ndkVersion", &config.ndk_version);
    Status::field("versionCode", &config.version.version_code.to_string());
    Status::field("versionName", &config.version.version_name);
    Status::field(
        "java",
        &format!(
            "source {} / target {} / jvmTarget {}",
            config.java.source, config.java.target, config.java.jvm_target
        ),
    );
    Status::field("flutter source", &config.flutter_source.display().to_string());

    Status::header("Release signing");
    print_variant(&config.build_types.release);
}

fn print_variant(variant: &BuildVariantConfig) {
    let signing = if variant.is_fallback() {
        format!("{} {}", variant.signing_config, "(fallback)".yellow())
    } else {
        variant.signing_config.to_string()
    };
    Status::field("signingConfig", &signing);
    print_identity(&variant.identity);
}

fn print_identity(identity: &SigningIdentity) {
    let store_file = identity.store_file.as_ref().map(|p| p.display().to_string());
    Status::field("storeFile", &format_optional(store_file.as_deref()));
    Status::field("keyAlias", &format_optional(identity.key_alias.as_deref()));
    Status::field("keyPassword", &format_secret(identity.key_password.as_deref()));
    Status::field("storePassword", &format_secret(identity.store_password.as_deref()));
}

#[derive(Serialize)]
struct SigningReport {
    key_properties: PathBuf,
    identity: SigningIdentity,
    release: BuildVariantConfig,
}

fn run_signing(
    resolver: BuildConfigResolver,
    key_properties: Option<PathBuf>,
    format: OutputFormat,
) -> i32 {
    let resolver = match key_properties {
        Some(path) => resolver.with_key_properties(path),
        None => resolver,
    };

    let report = resolver.release_identity().and_then(|identity| {
        let release = resolver.resolve_release()?;
        Ok(SigningReport {
            key_properties: resolver.key_properties_path(),
            identity,
            release,
        })
    });

    match report {
        Ok(report) => match format {
            OutputFormat::Json => print_json(&report),
            OutputFormat::Text => {
                Status::header("Signing properties");
                Status::field("file", &report.key_properties.display().to_string());
                print_identity(&report.identity);
                Status::header("Release variant");
                print_variant(&report.release);
                exit_codes::SUCCESS
            }
        },
        Err(e) => report_error(&e, format),
    }
}

fn run_version(resolver: &BuildConfigResolver, format: OutputFormat) -> i32 {
    match resolver.resolve_version() {
        Ok(version) => match format {
            OutputFormat::Json => print_json(&version),
            OutputFormat::Text => {
                println!("{} ({})", version.version_name, version.version_code);
                exit_codes::SUCCESS
            }
        },
        Err(e) => report_error(&e, format),
    }
}

#[derive(Serialize)]
struct CheckReport {
    release_key: bool,
    signing_config: String,
    key_properties: PathBuf,
    strict: bool,
}

fn run_check(resolver: &BuildConfigResolver, strict: bool, format: OutputFormat) -> i32 {
    let strict = strict || resolver.policy() == FallbackPolicy::Fail;
    let key_properties = resolver.key_properties_path();

    // Always resolve leniently so the fallback can be reported
    let release = match resolver.clone().with_policy(FallbackPolicy::Debug).resolve_release() {
        Ok(release) => release,
        Err(e) => return report_error(&e, format),
    };

    let exit_code = match (release.uses_release_key(), strict) {
        (true, _) => exit_codes::SUCCESS,
        (false, true) => exit_codes::SIGNING_FALLBACK,
        (false, false) => exit_codes::SUCCESS,
    };

    if format == OutputFormat::Json {
        print_json(&CheckReport {
            release_key: release.uses_release_key(),
            signing_config: release.signing_config.to_string(),
            key_properties,
            strict,
        });
        return exit_code;
    }

    if release.uses_release_key() {
        Status::success("Release builds are signed with the release keystore");
    } else if strict {
        Status::error(&format!(
            "No release keystore found via {}; release builds would use the debug key",
            key_properties.display()
        ));
    } else {
        Status::warning(&format!(
            "No release keystore found via {}; release builds will use the debug key",
            key_properties.display()
        ));
    }

    exit_code
}

#[derive(Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum DoctorKind {
    Config,
    LocalProperties,
    KeyProperties,
    ReleaseKeystore,
    DebugKeystore,
}

impl DoctorKind {
    fn label(self) -> &'static str {
        match self {
            DoctorKind::Config => "config",
            DoctorKind::LocalProperties => "local.properties",
            DoctorKind::KeyProperties => "key.properties",
            DoctorKind::ReleaseKeystore => "release keystore",
            DoctorKind::DebugKeystore => "debug keystore",
        }
    }
}

#[derive(Serialize)]
struct DoctorEntry {
    kind: DoctorKind,
    path: Option<PathBuf>,
    present: bool,
    keys: usize,
}

#[derive(Serialize)]
struct DoctorReport<'a> {
    entries: Vec<DoctorEntry>,
    warnings: &'a [ValidationError],
}

fn run_doctor(resolver: &BuildConfigResolver, config: &Config, format: OutputFormat) -> i32 {
    let mut entries = vec![DoctorEntry {
        kind: DoctorKind::Config,
        path: config.path.clone(),
        present: config.path.is_some(),
        keys: 0,
    }];

    for (kind, path) in [
        (DoctorKind::LocalProperties, resolver.local_properties_path()),
        (DoctorKind::KeyProperties, resolver.key_properties_path()),
    ] {
        match PropertySource::load_optional(&path) {
            Ok(props) => entries.push(DoctorEntry {
                kind,
                present: props.origin().is_some(),
                keys: props.len(),
                path: Some(path),
            }),
            Err(e) => return report_error(&e, format),
        }
    }

    let identity = match resolver.release_identity() {
        Ok(identity) => identity,
        Err(e) => return report_error(&e, format),
    };
    entries.push(DoctorEntry {
        kind: DoctorKind::ReleaseKeystore,
        present: identity.is_usable(),
        path: identity.store_file.clone(),
        keys: 0,
    });

    let debug_keystore = resolver.toolchain().debug_keystore.clone();
    entries.push(DoctorEntry {
        kind: DoctorKind::DebugKeystore,
        present: debug_keystore.exists(),
        path: Some(debug_keystore),
        keys: 0,
    });

    if format == OutputFormat::Json {
        return print_json(&DoctorReport {
            entries,
            warnings: &config.warnings,
        });
    }

    Status::header("Environment Check");
    for entry in &entries {
        print_doctor_entry(entry);
    }
    for warning in &config.warnings {
        Status::warning(&format!("{}: {}", warning.field, warning.message));
    }
    exit_codes::SUCCESS
}

fn print_doctor_entry(entry: &DoctorEntry) {
    let name = entry.kind.label();
    let location = entry
        .path
        .as_deref()
        .map(Path::display)
        .map(|p| p.to_string())
        .unwrap_or_else(|| "defaults".to_string());

    match (entry.present, entry.kind) {
        (true, DoctorKind::LocalProperties | DoctorKind::KeyProperties) => {
            Status::success(&format!(
                "{}: {} ({})",
                name,
                location,
                format_count(entry.keys, "key", "keys")
            ))
        }
        (true, _) => Status::success(&format!("{}: {}", name, location)),
        (false, DoctorKind::Config) => Status::info("config: using defaults"),
        (false, DoctorKind::DebugKeystore) => Status::info(&format!(
            "debug keystore: {} (created on first debug build)",
            location
        )),
        (false, _) => Status::warning(&format!("{}: not found", name)),
    }
}
