//! restbase server binary.
//!
//! Builds a multi-threaded runtime with `--workers` worker threads and serves
//! the manifest's resources until interrupted.

use anyhow::Result;
use clap::Parser;
use restbase_server::{init_logging, run, Args};
use tracing::info;

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);
    args.validate()?;

    info!(
        "Starting restbase server on {}:{} with {} workers",
        args.host, args.port, args.workers
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(args.workers)
        .enable_all()
        .build()?;

    runtime.block_on(run(args))
}
