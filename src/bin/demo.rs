#![forbid(unsafe_code)]

//! Walk-through of the KEM and signature paths with timing and resource
//! accounting, against whichever backend the process selects at startup.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;

use pqc_edge::{
    select_backend, CryptoBackend, KemAlgorithm, MemoryStore, OperationOutcome, OperationStore,
    PqcConfig, PqcEngine, ResourceLimits, SigAlgorithm, SimProfile, SimulatedBackend,
};

#[derive(Parser, Debug)]
#[command(name = "pqc_edge_demo", version)]
#[command(about = "Post-quantum KEM + signature demo under simulated edge-device limits")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,

    /// Path to JSON config (defaults apply if the file does not exist)
    #[arg(long, global = true, default_value = "pqc_edge.json")]
    config: PathBuf,

    /// Force the simulated backend even when native primitives are available
    #[arg(long, global = true)]
    simulated: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// KEM round trip: keygen, encapsulate, decapsulate
    Kem,
    /// Signature round trip: keygen, sign, verify, tampered-message check
    Sign,
    /// Both walk-throughs plus the aggregate stats table
    Full,
}

#[derive(Deserialize)]
struct FileConfig {
    max_memory_mb: f64,
    max_cpu_percent: f64,
    kem_algorithm: String,
    signature_algorithm: String,
}

fn load_config(path: &PathBuf) -> Result<PqcConfig> {
    if !path.exists() {
        log::info!("no config at {}, using defaults", path.display());
        return Ok(PqcConfig::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let file: FileConfig = serde_json::from_str(&raw)
        .with_context(|| format!("parsing config {}", path.display()))?;

    let kem = match file.kem_algorithm.as_str() {
        "Kyber768" => KemAlgorithm::Kyber768,
        other => bail!("unknown KEM algorithm in config: {other}"),
    };
    let sig = match file.signature_algorithm.as_str() {
        "Falcon-512" => SigAlgorithm::Falcon512,
        other => bail!("unknown signature algorithm in config: {other}"),
    };

    Ok(PqcConfig {
        limits: ResourceLimits::new(file.max_memory_mb, file.max_cpu_percent),
        kem,
        sig,
    })
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = load_config(&cli.config)?;
    let backend: Box<dyn CryptoBackend> = if cli.simulated {
        Box::new(SimulatedBackend::new(config.kem, config.sig, SimProfile::constrained_device()))
    } else {
        select_backend(&config, SimProfile::constrained_device())
    };

    let store = Arc::new(MemoryStore::new());
    let engine = PqcEngine::new(config, backend, store.clone());

    let info = engine.system_info();
    println!("pqc_edge demo");
    println!("  backend mode : {}", engine.mode().as_str());
    println!("  host         : {} ({} cpus, {} GB)",
        info.os.as_deref().unwrap_or("unknown"), info.cpu_count, info.total_memory_gb);
    println!("  limits       : {} MB / {} %",
        config.limits.max_memory_mb, config.limits.max_cpu_percent);
    println!();

    match cli.cmd {
        Command::Kem => run_kem(&engine)?,
        Command::Sign => run_sign(&engine)?,
        Command::Full => {
            run_kem(&engine)?;
            println!();
            run_sign(&engine)?;
            println!();
            print_stats(store.as_ref());
        }
    }
    Ok(())
}

fn run_kem(engine: &PqcEngine) -> Result<()> {
    println!("== {} key encapsulation ==", engine.config().kem.name());

    let outcome = engine.generate_keypair("KEM");
    let (keys, ms) = unwrap_outcome(outcome, "keygen")?;
    println!("  1. keygen       {:>8.2} ms  pk {} B, sk {} B",
        ms, keys.public_key.len(), keys.private_key.len());

    let outcome = engine.encapsulate(&keys.public_key);
    let (enc, ms) = unwrap_outcome(outcome, "encapsulate")?;
    println!("  2. encapsulate  {:>8.2} ms  ct {} B, secret {}",
        ms, enc.ciphertext.len(), hex_head(&enc.shared_secret));

    let outcome = engine.decapsulate(&keys.private_key, &enc.ciphertext);
    let (secret, ms) = unwrap_outcome(outcome, "decapsulate")?;
    println!("  3. decapsulate  {:>8.2} ms  secret {}", ms, hex_head(&secret));

    if secret == enc.shared_secret {
        println!("  shared secrets match, key exchange successful");
    } else {
        bail!("shared secrets do not match");
    }
    Ok(())
}

fn run_sign(engine: &PqcEngine) -> Result<()> {
    println!("== {} signatures ==", engine.config().sig.name());
    let message = b"Hello, Post-Quantum World!";

    let outcome = engine.generate_keypair("SIGNATURE");
    let (keys, ms) = unwrap_outcome(outcome, "keygen")?;
    println!("  1. keygen       {:>8.2} ms  pk {} B, sk {} B",
        ms, keys.public_key.len(), keys.private_key.len());

    let outcome = engine.sign(&keys.private_key, message);
    let (signature, ms) = unwrap_outcome(outcome, "sign")?;
    println!("  2. sign         {:>8.2} ms  signature {} B", ms, signature.len());

    let outcome = engine.verify(&keys.public_key, message, &signature);
    let (valid, ms) = unwrap_outcome(outcome, "verify")?;
    println!("  3. verify       {:>8.2} ms  valid: {valid}", ms);

    let outcome = engine.verify(&keys.public_key, b"Hello, tampered world!", &signature);
    let (valid, ms) = unwrap_outcome(outcome, "verify (tampered)")?;
    println!("  4. tampered     {:>8.2} ms  valid: {valid} (expected false)", ms);
    Ok(())
}

fn print_stats(store: &MemoryStore) {
    println!("== per-operation stats ==");
    for (operation, stats) in store.stats() {
        println!("  {:<16} {:>5} calls  avg {:>8.2} ms", operation, stats.count, stats.avg_time_ms);
    }
    println!("  ({} operation records, {} usage records)",
        store.operation_count(), store.usage_count());
}

fn unwrap_outcome<T>(outcome: OperationOutcome<T>, what: &str) -> Result<(T, f64)> {
    if let Some(result) = outcome.result {
        Ok((result, outcome.execution_time_ms))
    } else {
        bail!("{what} failed: {}", outcome.error.unwrap_or_else(|| "unknown error".into()))
    }
}

fn hex_head(bytes: &[u8]) -> String {
    let head = &bytes[..bytes.len().min(8)];
    format!("{}..", hex::encode(head))
}
