pub mod config;
pub mod error;
pub mod pipeline;
pub mod producer;
pub mod report;
pub mod searcher;
pub mod tsv_streamer;
pub mod types;
pub mod writer;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::error;
use tracing_subscriber::EnvFilter;

use arb_graph_core::{BellmanFordSolver, ExchangeGraph};
use error::Error;
use searcher::ArbSearcher;
use types::SharedGraph;

#[derive(Parser, Debug)]
#[command(version, about = "Finds currency arbitrage cycles in a table of exchange rates")]
struct Args {
    /// Rate file with one `origin<TAB>destination<TAB>rate` quote per line
    #[arg(long, default_value = "testdata")]
    rates: PathBuf,

    /// Path to config file (optional)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search for profitable conversion cycles (default)
    Arbitrage {
        /// Only report cycles that pass through this currency
        #[arg(long)]
        through: Option<String>,
    },
    /// List the currencies that are referenced by only one edge
    ListLonely,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(args: Args) -> Result<(), Error> {
    let config = config::load_config(args.config.as_deref())?;

    let shared_graph: SharedGraph =
        Arc::new(RwLock::new(ExchangeGraph::with_precision(config.precision()?)));

    pipeline::ingest(&args.rates, shared_graph.clone(), &config).await?;

    let searcher = ArbSearcher::new(shared_graph, BellmanFordSolver::new(config.detector_config()));

    match args.command.unwrap_or(Command::Arbitrage { through: None }) {
        Command::Arbitrage { through } => {
            let cycles = searcher.search_for_arbs(through.as_deref()).await?;
            print!("{}", report::render_cycles(&cycles));
        }
        Command::ListLonely => {
            let alone = searcher.alone_currencies().await;
            print!("{}", report::render_alone(&alone));
        }
    }

    Ok(())
}
