//! qtrig Command-Line Interface
//!
//! Compiles gate-level programs for a control platform and prints the
//! resulting per-channel wait/trigger streams.
//!
//! ```text
//! qtrig compile  --platform spin-2.json --program parallel.json
//! qtrig schedule --platform spin-2.json --program parallel.json --scheduler alap
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{common, compile, schedule, version};

/// qtrig - timing-aware compilation to channel trigger streams
#[derive(Parser)]
#[command(name = "qtrig")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a program into per-channel instruction streams
    Compile {
        /// Platform description (JSON)
        #[arg(short, long)]
        platform: String,

        /// Program file (JSON)
        #[arg(short = 'i', long)]
        program: String,

        /// Compiler options (YAML)
        #[arg(short, long)]
        config: Option<String>,

        /// Scheduling policy (asap, alap)
        #[arg(short, long)]
        scheduler: Option<String>,

        /// Pass option override, as pass.key=value (repeatable)
        #[arg(long = "set", value_name = "PASS.KEY=VALUE")]
        overrides: Vec<String>,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
        format: String,

        /// Also write <output_dir>/<program>.json through the write stage
        #[arg(long)]
        write: bool,
    },

    /// Print the per-kernel schedule of a program
    Schedule {
        /// Platform description (JSON)
        #[arg(short, long)]
        platform: String,

        /// Program file (JSON)
        #[arg(short = 'i', long)]
        program: String,

        /// Scheduling policy (asap, alap)
        #[arg(short, long, default_value = "asap")]
        scheduler: String,

        /// Output format
        #[arg(short, long, default_value = "table", value_parser = ["table", "json"])]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let config = match &cli.command {
        Commands::Compile { config, .. } => config.as_deref(),
        _ => None,
    };
    let filter = common::log_filter(cli.verbose, config);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Execute command
    let result = match cli.command {
        Commands::Compile {
            platform,
            program,
            config,
            scheduler,
            overrides,
            output,
            format,
            write,
        } => compile::execute(&compile::CompileArgs {
            platform,
            program,
            config,
            scheduler,
            overrides,
            output,
            format,
            write,
        }),

        Commands::Schedule {
            platform,
            program,
            scheduler,
            format,
        } => schedule::execute(&platform, &program, &scheduler, &format),

        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    // Handle errors
    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
