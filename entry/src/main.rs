//! ananse: prediction of transcription factor binding in enhancers
//!
//! This is the entry point for the ananse CLI. It parses the
//! arguments of each subcommand, validates the input that every
//! run needs and hands the work to the matching library crate.
//!
//! Currently offered subcommands:
//! - binding: predict TF binding probabilities for every
//!   (factor, enhancer) pair from enhancer signal and motif scores
//!
//! To get help on a subcommand, run:
//!
//! ```shell
//! ananse binding --help
//! ```

use ananse::binding;
use ananse_binding::{cli::Args, Binding};
use clap::{Parser, Subcommand};
use log::{error, info, Level};
use simple_logger::init_with_level;

#[derive(Parser)]
#[command(name = "ananse")]
#[command(about = "ananse: prediction of transcription factor binding in enhancers")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict transcription factor binding in enhancers
    #[command(name = "binding")]
    Binding {
        #[command(flatten)]
        args: Args,
    },
}

fn main() {
    let start = std::time::Instant::now();
    if let Err(e) = init_with_level(Level::Info) {
        eprintln!("ERROR: cannot initialize logger: {}", e);
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::Binding { args } => {
            binding(&args, Binding::new).unwrap_or_else(|e| {
                error!("{:#}", e);
                std::process::exit(1);
            });
        }
    }

    let elapsed = start.elapsed();
    info!("Elapsed time: {:.3?}", elapsed);
}
