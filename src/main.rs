use clap::Parser;
use edgelog::cli::{Cli, Commands};
use edgelog::commands::{run_parse, run_patterns};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.parallel > 0 {
        if let Err(e) = rayon::ThreadPoolBuilder::new().num_threads(cli.parallel).build_global() {
            tracing::warn!(error = %e, "could not configure thread pool");
        }
    }

    let result = match cli.command {
        Commands::Parse(args) => run_parse(args),
        Commands::Patterns(args) => run_patterns(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
