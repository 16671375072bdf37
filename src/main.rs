//! CLI front end: parses arguments, brings up MPI and logging, loads the
//! graph, and hands off to the dispatcher.

use std::fs::File;
use std::io::Write;
use std::process::ExitCode;

use mpi::traits::*;
use rand::thread_rng;
use structopt::StructOpt;

use mrg_mincut::context::Context;
use mrg_mincut::dispatch;
use mrg_mincut::error::Error;
use mrg_mincut::graph::Graph;
use mrg_mincut::transport::MpiTransport;

/// Distributed branch-and-bound search for the minimum-weight balanced
/// graph bipartition.
#[derive(StructOpt)]
struct Opt {
    /// Path to the graph instance (ASCII `N` followed by an `N`x`N` 0/1
    /// adjacency matrix).
    graph: String,

    /// Log the progression; repeat for more detail (overrides RUST_LOG).
    #[structopt(short, long, parse(from_occurrences))]
    verbose: u8,
}

fn main() -> ExitCode {
    let opt = Opt::from_args();

    let universe = match mpi::initialize() {
        Some(u) => u,
        None => {
            eprintln!("failed to initialize MPI runtime");
            return ExitCode::FAILURE;
        }
    };
    let world = universe.world();
    let rank = world.rank();

    init_logging(rank, opt.verbose);

    match run(rank, world, &opt.graph) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("[rank {}] fatal: {}", rank, e);
            ExitCode::FAILURE
        }
    }
}

fn run(rank: i32, world: mpi::topology::SystemCommunicator, path: &str) -> Result<(), Error> {
    let size = world.size();
    let file = File::open(path).map_err(Error::Io)?;
    let mut rng = thread_rng();
    let graph = Graph::load(file, &mut rng)?;

    let mut ctx = Context::new(rank, size, graph);
    let mut transport = MpiTransport::new(world);
    dispatch::run(&mut ctx, &mut transport);
    Ok(())
}

/// Initializes `env_logger` with a format that folds the process rank into
/// every record so interleaved output from many ranks stays attributable.
/// `-v`/`--verbose` raises the default filter when
/// `RUST_LOG` is not set; an explicit `RUST_LOG` always wins.
fn init_logging(rank: i32, verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format(move |buf, record| {
            writeln!(buf, "[rank {rank}] {} {}", record.level(), record.args())
        })
        .init();
}
