use clap::{Parser, Subcommand};

/// Minimal CLI front end for the multi-attribute linear-hashed file engine.
#[derive(Parser, Debug)]
#[command(name = "malhf", version, about = "MALHF partial-match index CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Create a new relation: three files `<name>.{info,data,ovflow}`.
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        nattrs: u32,
        /// Choice vector, e.g. "0:0,1:0,0:1,1:1,...". Defaults to round-robin.
        #[arg(long)]
        chvec: Option<String>,
        #[arg(long, default_value_t = 1)]
        npages: u32,
        #[arg(long, default_value_t = 0)]
        depth: u32,
    },

    /// Insert one tuple (--tuple "apple,red") or bulk-load newline-delimited
    /// tuples from a file (--file tuples.txt). Exactly one of the two must
    /// be given.
    Insert {
        #[arg(long)]
        name: String,
        #[arg(long)]
        tuple: Option<String>,
        #[arg(long)]
        file: Option<std::path::PathBuf>,
    },

    /// Partial-match query, e.g. --pattern "apple,?".
    Query {
        #[arg(long)]
        name: String,
        #[arg(long)]
        pattern: String,
    },

    /// Print global info, choice vector and per-bucket page chains.
    Stats {
        #[arg(long)]
        name: String,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}
