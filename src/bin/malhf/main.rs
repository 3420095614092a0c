use env_logger::{Builder, Env};
use log::error;

mod cli;
mod cmd_create;
mod cmd_insert;
mod cmd_query;
mod cmd_stats;

use clap::Parser;

fn init_logger() {
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

fn main() {
    init_logger();

    if let Err(e) = run() {
        error!("{e:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    match cli.cmd {
        cli::Cmd::Create {
            name,
            nattrs,
            chvec,
            npages,
            depth,
        } => cmd_create::exec(name, nattrs, chvec, npages, depth),

        cli::Cmd::Insert { name, tuple, file } => cmd_insert::exec(name, tuple, file),

        cli::Cmd::Query { name, pattern } => cmd_query::exec(name, pattern),

        cli::Cmd::Stats { name, json } => cmd_stats::exec(name, json),
    }
}
