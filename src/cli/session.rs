// Line-oriented interactive sessions: every line becomes a block until "exit" or EOF
// Reader and writer are generic so the sessions run the same against stdin and in tests

use crate::config::Config;
use crate::core::{Block, Blockchain, ChainBlock, MinedBlock, MiningOutcome};
use crate::error::Result;
use log::info;
use std::fmt::Display;
use std::io::{BufRead, Write};

/// Typing this (in any case) ends a session
pub const EXIT_SENTINEL: &str = "exit";

/// Read payloads until the sentinel, appending each to a linked chain
pub fn run_simulation<R: BufRead, W: Write>(
    chain: &Blockchain<Block>,
    mut input: R,
    out: &mut W,
) -> Result<()> {
    writeln!(out, "Enter block data (type '{EXIT_SENTINEL}' to quit):")?;

    while let Some(payload) = next_payload(&mut input, out)? {
        let block = chain.append(payload.as_bytes())?;
        writeln!(out, "✓ Block #{} added", block.get_index())?;
        writeln!(out, "  Hash: {}", block.get_hash())?;
        writeln!(out)?;
    }

    print_final_state(chain, out)
}

/// Read payloads until the sentinel, mining each onto a proof-of-work chain.
///
/// A search that times out or is cancelled is reported and the session
/// carries on with the next line.
pub fn run_mining<R: BufRead, W: Write>(
    chain: &Blockchain<MinedBlock>,
    config: &Config,
    mut input: R,
    out: &mut W,
) -> Result<()> {
    let engine = config.engine()?;
    let info = engine.info();
    writeln!(
        out,
        "Mining with difficulty {} (target {}..., ~{} attempts per block)",
        info.difficulty, info.target_prefix, info.expected_attempts
    )?;
    writeln!(out, "Enter block data (type '{EXIT_SENTINEL}' to quit):")?;

    while let Some(payload) = next_payload(&mut input, out)? {
        let control = config.mining_control();
        let outcome = if config.workers > 1 {
            chain.append_with_miner(payload.as_bytes(), |content| {
                engine.search_parallel(content, config.workers, &control)
            })?
        } else {
            chain.append_with_miner(payload.as_bytes(), |content| {
                engine.search_with_progress(content, &control, &mut |progress| {
                    info!("{progress}")
                })
            })?
        };

        match outcome {
            MiningOutcome::Found(block) => {
                writeln!(out, "✓ Block mined!")?;
                writeln!(out, "{block}")?;
            }
            MiningOutcome::Aborted(reason) => {
                writeln!(out, "✗ Mining {reason}; block not added")?;
            }
        }
        writeln!(out)?;
    }

    print_final_state(chain, out)?;
    writeln!(out, "Total Mining Time: {:.3}s", chain.total_mining_time())?;
    Ok(())
}

// None on EOF or the exit sentinel; blank lines are skipped
fn next_payload<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> Result<Option<String>> {
    let mut line = String::new();
    loop {
        write!(out, ">>> ")?;
        out.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            return Ok(None);
        }

        let payload = line.trim_end_matches(|c| c == '\r' || c == '\n');
        if payload.trim().eq_ignore_ascii_case(EXIT_SENTINEL) {
            return Ok(None);
        }
        if !payload.trim().is_empty() {
            return Ok(Some(payload.to_string()));
        }
    }
}

fn print_final_state<B, W>(chain: &Blockchain<B>, out: &mut W) -> Result<()>
where
    B: ChainBlock + Display,
    W: Write,
{
    writeln!(out)?;
    writeln!(out, "Final chain state:")?;
    writeln!(out, "{chain}")?;
    writeln!(out, "STATISTICS")?;
    writeln!(out, "{}", chain.stats())?;

    let report = chain.validate();
    if !report.is_valid() {
        writeln!(out, "{report}")?;
    }
    Ok(())
}
