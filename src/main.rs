// This is the entry point for the proof-ledger CLI
// Every subcommand works on an in-memory chain; --export is the only thing that touches disk
use clap::Parser;
use log::{error, LevelFilter};
use proof_ledger::cli::{run_mining, run_simulation};
use proof_ledger::{
    sha256_hex, Block, Blockchain, ChainBlock, Command, Config, MinedBlock, MiningControl,
    MiningOutcome, Opt, ProofOfWork,
};
use std::io::{self, Write};
use std::process;
use std::time::Duration;

fn main() {
    // I initialize logging at Info so mining progress shows up without drowning the prompt
    env_logger::builder().filter_level(LevelFilter::Info).init();

    // I parse the command line with clap
    let opt = Opt::parse();

    // Any error ends up here: I log it and exit with code 1
    if let Err(e) = run_command(opt) {
        error!("Error: {e}");
        process::exit(1);
    }
}

// Each subcommand maps to one ledger operation
fn run_command(opt: Opt) -> Result<(), Box<dyn std::error::Error>> {
    // Defaults, then the TOML file, then LEDGER_* variables; flags are applied per command below
    let mut config = Config::load(opt.config.as_deref())?;

    match opt.command {
        // When I want a hash-linked chain without proof-of-work
        Command::Simulate { seed, export } => {
            // Seeds go in before the prompt so a session can start from known blocks
            let chain: Blockchain<Block> = Blockchain::new(&config)?;
            for payload in &seed {
                let block = chain.append(payload.as_bytes())?;
                println!("✓ Block #{}: {payload}", block.get_index());
            }

            // I hand the session locked stdin/stdout; it returns on "exit" or EOF
            let stdin = io::stdin();
            let mut stdout = io::stdout();
            run_simulation(&chain, stdin.lock(), &mut stdout)?;
            stdout.flush()?;

            if let Some(path) = export {
                chain.export_to_file(&path)?;
            }
        }
        // When every block has to be mined before it is admitted
        Command::Mine {
            difficulty,
            timeout_ms,
            workers,
            export,
        } => {
            // Command-line flags win over the file and the environment
            if let Some(difficulty) = difficulty {
                config.difficulty = difficulty;
            }
            if timeout_ms.is_some() {
                config.mining_timeout_ms = timeout_ms;
            }
            if let Some(workers) = workers {
                config.workers = usize::try_from(workers)?;
            }
            config.validate()?;

            let chain: Blockchain<MinedBlock> = Blockchain::new(&config)?;
            let stdin = io::stdin();
            let mut stdout = io::stdout();
            run_mining(&chain, &config, stdin.lock(), &mut stdout)?;
            stdout.flush()?;

            if let Some(path) = export {
                chain.export_to_file(&path)?;
            }
        }
        // When I just want the SHA-256 of some text
        Command::Hash { input } => {
            let digest = sha256_hex(input.as_bytes());
            println!("Input:  {input}");
            println!("Hash:   {digest}");
            println!("Length: {} characters", digest.len());
        }
        // When I want to check a claimed nonce and hash without mining anything
        Command::Verify {
            content,
            nonce,
            hash,
            difficulty,
        } => {
            let engine = ProofOfWork::new(difficulty.unwrap_or(config.difficulty))?;
            let valid = engine.verify(content.as_bytes(), nonce, &hash);
            println!(
                "Verification: {} (difficulty {})",
                if valid { "✓ Valid" } else { "✗ Invalid" },
                engine.difficulty()
            );
        }
        // When I want to know what a difficulty costs before mining at it
        Command::Info { difficulty } => {
            let engine = ProofOfWork::new(difficulty.unwrap_or(config.difficulty))?;
            println!("{}", serde_json::to_string_pretty(&engine.info())?);
        }
        // When I want to see how mining time grows with difficulty
        Command::Compare {
            from,
            to,
            payload,
            timeout_ms,
        } => {
            if from > to {
                return Err(format!("--from ({from}) must not exceed --to ({to})").into());
            }
            let rule = "─".repeat(60);
            for difficulty in from..=to {
                let engine = ProofOfWork::new(difficulty)?;
                let info = engine.info();
                println!("{rule}");
                println!("Difficulty: {difficulty}");
                println!("Target: {}...", info.target_prefix);
                println!("Expected attempts: {}", info.expected_attempts);

                // Each difficulty gets its own timeout budget
                let control = MiningControl::from_timeout(timeout_ms.map(Duration::from_millis));
                match engine.search(payload.as_bytes(), &control) {
                    MiningOutcome::Found(proof) => {
                        println!("✓ Block mined!");
                        println!("  Hash: {}", proof.hash);
                        println!("  Nonce: {}", proof.nonce);
                        println!("  Time: {:.3}s", proof.elapsed.as_secs_f64());
                    }
                    MiningOutcome::Aborted(reason) => println!("✗ Mining {reason}"),
                }
            }
            println!("{rule}");
        }
    }
    Ok(())
}
