use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use protoform::manifest::{build_manifest, discover_sources, IdlSource};
use protoform::store::MemoryFormStore;
use protoform::sync::sync;
use protoform::{evaluate, parse_record, to_runtime_schema, try_compile, validate, CompileOptions, FormError};
use protoform_compiler::compile_source;
use protoform_compiler::compiler::DEFAULT_MAX_DEPTH;
use protoform::schema::FormStatus;

#[derive(Parser)]
#[command(name = "pform")]
#[command(about = "Compile protobuf form sources into form schemas and check records against them", long_about = None)]
struct Cli {
    /// Raise log verbosity (repeat for more)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Status stamped on compiled schemas (`published` or `draft`)
    #[arg(long, global = true, default_value = "published")]
    status: FormStatus,

    /// Version stamped on compiled schemas
    #[arg(long = "version-tag", global = true, default_value = "1.0.0")]
    version_tag: String,

    /// Deepest message nesting expanded into object fields
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the domain schema of a `.proto` file
    Compile {
        file: PathBuf,

        /// App id used to pick the root message (defaults to the file stem)
        #[arg(long)]
        app: Option<String>,
    },

    /// Print the runtime schema of a `.proto` file
    Runtime {
        file: PathBuf,

        #[arg(long)]
        app: Option<String>,
    },

    /// Validate a JSON record against the schema of a `.proto` file
    Validate {
        file: PathBuf,

        /// JSON file holding one record object
        #[arg(short, long)]
        data: PathBuf,

        #[arg(long)]
        app: Option<String>,
    },

    /// Print verifier diagnostics for a `.proto` file
    Check {
        file: PathBuf,
    },

    /// Print the app manifest of every source in a directory
    Manifest {
        dir: PathBuf,
    },

    /// Resync every source in a directory into an in-memory store
    Sync {
        dir: PathBuf,

        #[arg(short, long)]
        tenant: String,
    },

    /// Evaluate a visibility expression against a JSON record
    Eval {
        expr: String,

        #[arg(short, long)]
        data: PathBuf,
    },
}

impl Cli {
    fn options(&self) -> CompileOptions {
        CompileOptions {
            status: self.status,
            version: self.version_tag.clone(),
            max_depth: self.max_depth,
            ..CompileOptions::default()
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn load_source(file: &Path, app: Option<&str>) -> Result<IdlSource, FormError> {
    let mut source = IdlSource::read(file)?;
    if let Some(app) = app {
        source.app_id = app.to_string();
    }
    log::debug!("compiling {} as app {}", file.display(), source.app_id);
    Ok(source)
}

fn load_record(path: &Path) -> Result<Map<String, Value>, FormError> {
    let text = fs::read_to_string(path)?;
    parse_record(&path.display().to_string(), &text)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), FormError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run(cli: &Cli) -> Result<ExitCode, FormError> {
    let options = cli.options();

    match &cli.command {
        Commands::Compile { file, app } => {
            let source = load_source(file, app.as_deref())?;
            print_json(&try_compile(&source.app_id, &source.text, &options)?)?;
        }

        Commands::Runtime { file, app } => {
            let source = load_source(file, app.as_deref())?;
            let domain = try_compile(&source.app_id, &source.text, &options)?;
            print_json(&to_runtime_schema(&domain))?;
        }

        Commands::Validate { file, data, app } => {
            let source = load_source(file, app.as_deref())?;
            let domain = try_compile(&source.app_id, &source.text, &options)?;
            let record = load_record(data)?;
            if let Err(e) = validate(&domain, &record) {
                eprintln!("{}", e);
                return Ok(ExitCode::FAILURE);
            }
            println!("{} is valid for {}", data.display(), domain.form_name);
        }

        Commands::Check { file } => {
            let source = IdlSource::read(file)?;
            let compilation = compile_source(&source.app_id, &source.text, &options);
            match &compilation.root {
                Some(root) => println!("root: {}", root),
                None       => println!("root: none"),
            }
            for diagnostic in &compilation.diagnostics {
                println!("{}", diagnostic);
            }
            if compilation.root.is_none() || !compilation.diagnostics.is_empty() {
                return Ok(ExitCode::FAILURE);
            }
        }

        Commands::Manifest { dir } => {
            let sources = discover_sources(dir)?;
            print_json(&build_manifest(&sources, &options))?;
        }

        Commands::Sync { dir, tenant } => {
            let sources = discover_sources(dir)?;
            let mut store = MemoryFormStore::new();
            let report = sync(tenant, &sources, &mut store, &options);
            print_json(&report)?;
            if !report.failed.is_empty() {
                return Ok(ExitCode::FAILURE);
            }
        }

        Commands::Eval { expr, data } => {
            let record = load_record(data)?;
            println!("{}", evaluate(expr, &record)?);
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
