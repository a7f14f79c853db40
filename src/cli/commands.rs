use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "proof-ledger", about = "Tamper-evident ledger with proof-of-work admission")]
pub struct Opt {
    #[arg(long, global = true, help = "TOML configuration file")]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(
        name = "simulate",
        about = "Interactive hash-linked chain; type 'exit' to finish"
    )]
    Simulate {
        #[arg(long = "seed", help = "Payloads appended before the interactive prompt")]
        seed: Vec<String>,
        #[arg(long, help = "Write the final chain as JSON to this file")]
        export: Option<PathBuf>,
    },
    #[command(
        name = "mine",
        about = "Interactive proof-of-work chain; type 'exit' to finish"
    )]
    Mine {
        #[arg(
            long,
            value_parser = clap::value_parser!(u32).range(1..=64),
            help = "Leading zero hex digits required (overrides config)"
        )]
        difficulty: Option<u32>,
        #[arg(long = "timeout-ms", help = "Abort a block's search after this many milliseconds")]
        timeout_ms: Option<u64>,
        #[arg(
            long,
            value_parser = clap::value_parser!(u64).range(1..),
            help = "Threads searching for each nonce"
        )]
        workers: Option<u64>,
        #[arg(long, help = "Write the final chain as JSON to this file")]
        export: Option<PathBuf>,
    },
    #[command(name = "hash", about = "Print the SHA-256 digest of a string")]
    Hash {
        #[arg(help = "Text to hash")]
        input: String,
    },
    #[command(name = "verify", about = "Check a claimed proof-of-work")]
    Verify {
        #[arg(help = "Mined content (without the nonce)")]
        content: String,
        #[arg(help = "Claimed nonce")]
        nonce: u64,
        #[arg(help = "Claimed hash")]
        hash: String,
        #[arg(
            long,
            value_parser = clap::value_parser!(u32).range(1..=64),
            help = "Difficulty to verify against (overrides config)"
        )]
        difficulty: Option<u32>,
    },
    #[command(name = "info", about = "Show target and expected attempts for a difficulty")]
    Info {
        #[arg(
            long,
            value_parser = clap::value_parser!(u32).range(1..=64),
            help = "Difficulty to describe (overrides config)"
        )]
        difficulty: Option<u32>,
    },
    #[command(name = "compare", about = "Mine one payload across a range of difficulties")]
    Compare {
        #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..=64))]
        from: u32,
        #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u32).range(1..=64))]
        to: u32,
        #[arg(long, default_value = "Sample Transaction Block")]
        payload: String,
        #[arg(long = "timeout-ms", help = "Abort each search after this many milliseconds")]
        timeout_ms: Option<u64>,
    },
}
