//! slotgen CLI
//!
//! Usage:
//!   slotgen [OPTIONS] [REQUEST]
//!
//! Options:
//!   -o, --output-dir <DIR>  Write all generated files into DIR
//!   -t, --template <FILE>   Source template to use instead of the bundled one
//!   --telemetry             Enable file-access telemetry in the generated code
//!   -c, --check             Validate the request and templates, write nothing
//!   --slots                 List the declared slots
//!   -v, --verbose           Debug logging
//!   -h, --help              Print help

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use slotgen::{GenerateConfig, GenerateError, GenerationRequest, Generator, SlotValue};

#[derive(Parser)]
#[command(name = "slotgen")]
#[command(about = "Generate event-loop analysis algorithms from code fragments")]
struct Cli {
    /// Request file in TOML format (reads from stdin if not provided)
    request: Option<PathBuf>,

    /// Write all generated files into this directory instead of printing the source
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Source template to use instead of the bundled one
    #[arg(short, long)]
    template: Option<PathBuf>,

    /// Enable file-access telemetry in the generated constructor
    #[arg(long)]
    telemetry: bool,

    /// Validate the request and templates without writing anything
    #[arg(short, long)]
    check: bool,

    /// List the declared slots and exit
    #[arg(long)]
    slots: bool,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "slotgen=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(io::stderr),
        )
        .init();
}

fn fail(err: &GenerateError) -> ! {
    eprintln!("{}", err.report());
    std::process::exit(1);
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = GenerateConfig::new().with_file_access_telemetry(cli.telemetry);
    if let Some(path) = &cli.template {
        match fs::read_to_string(path) {
            Ok(source) => config = config.with_source_template(source),
            Err(e) => {
                eprintln!("Error reading template '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        }
    }

    let generator = match Generator::new(config) {
        Ok(g) => g,
        Err(e) => fail(&e),
    };

    if cli.slots {
        print_slots(&generator);
        return;
    }

    // Read request
    let request = match &cli.request {
        Some(path) => GenerationRequest::from_file(path).map_err(|e| {
            eprintln!("Error loading request '{}': {}", path.display(), e);
        }),
        None => {
            let mut buffer = String::new();
            match io::stdin().read_to_string(&mut buffer) {
                Ok(_) => GenerationRequest::from_toml(&buffer).map_err(|e| {
                    eprintln!("Error loading request from stdin: {}", e);
                }),
                Err(e) => {
                    eprintln!("Error reading from stdin: {}", e);
                    std::process::exit(1);
                }
            }
        }
    };
    let Ok(request) = request else {
        std::process::exit(1);
    };

    let files = match generator.generate(&request) {
        Ok(files) => files,
        Err(e) => fail(&e),
    };

    if cli.check {
        for name in files.names() {
            println!("ok: {}", name);
        }
        return;
    }

    match &cli.output_dir {
        Some(dir) => {
            if let Err(e) = files.write_to(dir) {
                fail(&GenerateError::from(e));
            }
        }
        None => match files.iter().find(|f| f.name.ends_with(slotgen::SOURCE_SUFFIX)) {
            Some(source) => print!("{}", source.contents),
            None => {
                for file in files.iter() {
                    print!("{}", file.contents);
                }
            }
        },
    }
}

fn print_slots(generator: &Generator) {
    for decl in generator.registry().iter() {
        let default = match &decl.default {
            None => "required".to_string(),
            Some(SlotValue::Scalar(s)) => format!("default \"{}\"", s),
            Some(SlotValue::Sequence(items)) if items.is_empty() => "default empty".to_string(),
            Some(SlotValue::Sequence(items)) => format!("default {} fragments", items.len()),
        };
        println!("{:<26} {:<9} {}", decl.name, decl.kind.to_string(), default);
    }
}
