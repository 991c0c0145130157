//! ProInfo CLI
//!
//! Target-intelligence correlation for IPs and domains.

use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use proinfo_core::{extract_iocs, parse_targets, Investigation, TargetRecord};
use proinfo_runtime::{
    BatchOrchestrator, Correlator, EngineConfig, HistoryArchive, JsonlArchive, PivotExpander,
};

const DEFAULT_HISTORY_FILE: &str = "proinfo_history.jsonl";

#[derive(Parser)]
#[command(name = "proinfo")]
#[command(author, version, about = "ProInfo: target-intelligence correlation and threat scoring", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level (0-3)
    #[arg(short, long, default_value = "1")]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze IPs and domains
    Analyze {
        /// Targets (IPs or domains); commas and whitespace also separate
        targets: Vec<String>,

        /// Read additional targets from a file
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Pivot on linked assets up to this depth
        #[arg(short, long)]
        expand: Option<u32>,

        /// Print records as JSON
        #[arg(long)]
        json: bool,

        /// Append the completed batch to this history file
        #[arg(long)]
        history: Option<PathBuf>,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Targets analyzed concurrently per wave
        #[arg(long)]
        wave_size: Option<usize>,

        /// Per-source timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// AbuseIPDB API key; otherwise the config file, then ABUSEIPDB_API_KEY
        #[arg(long)]
        abuseipdb_key: Option<String>,
    },

    /// Extract and defang indicators of compromise from text
    Extract {
        /// Input file (default: stdin)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Print indicators as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show or manage archived scans
    History {
        /// History file
        #[arg(long, default_value = DEFAULT_HISTORY_FILE)]
        path: PathBuf,

        /// Delete the entry with this id
        #[arg(long)]
        delete: Option<i64>,

        /// Delete every entry
        #[arg(long)]
        clear: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = match cli.verbose {
        0 => Level::ERROR,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    match cli.command {
        Commands::Analyze {
            targets,
            file,
            expand,
            json,
            history,
            config,
            wave_size,
            timeout,
            abuseipdb_key,
        } => {
            let config = load_config(config, wave_size, timeout, abuseipdb_key)?;
            let targets = collect_targets(&targets, file)?;
            run_analyze(config, targets, expand, json, history).await?;
        }
        Commands::Extract { file, json } => {
            run_extract(file, json)?;
        }
        Commands::History { path, delete, clear } => {
            run_history(path, delete, clear).await?;
        }
    }

    Ok(())
}

fn load_config(
    path: Option<PathBuf>,
    wave_size: Option<usize>,
    timeout: Option<u64>,
    abuseipdb_key: Option<String>,
) -> Result<EngineConfig> {
    let mut config = match path {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };

    if let Some(wave_size) = wave_size {
        config = config.with_wave_size(wave_size);
    }
    if let Some(secs) = timeout {
        config = config.with_adapter_timeout(secs);
        config.http.timeout_secs = secs;
    }
    if let Some(key) = abuseipdb_key.filter(|k| !k.trim().is_empty()) {
        config = config.with_abuseipdb_key(&key);
    }

    Ok(config)
}

fn collect_targets(args: &[String], file: Option<PathBuf>) -> Result<Vec<String>> {
    let mut raw = args.join("\n");
    if let Some(file) = file {
        raw.push('\n');
        raw.push_str(&fs::read_to_string(&file)?);
    }

    let targets = parse_targets(&raw);
    if targets.is_empty() {
        anyhow::bail!("No targets given. Pass them as arguments or use --file");
    }
    Ok(targets)
}

async fn run_analyze(
    config: EngineConfig,
    targets: Vec<String>,
    expand: Option<u32>,
    json: bool,
    history: Option<PathBuf>,
) -> Result<()> {
    info!("Analyzing {} targets", targets.len());

    let correlator = Correlator::from_config(&config)?;
    let mut orchestrator = BatchOrchestrator::new(correlator.clone(), config.wave_size);
    if let Some(path) = history {
        info!("Archiving to {}", path.display());
        orchestrator = orchestrator.with_archive(Arc::new(JsonlArchive::new(path)));
    }

    let (tx, mut rx) = mpsc::unbounded_channel::<Vec<TargetRecord>>();
    let progress = tokio::spawn(async move {
        while let Some(snapshot) = rx.recv().await {
            let done = snapshot.iter().filter(|r| r.is_terminal()).count();
            info!("Progress: {}/{} complete", done, snapshot.len());
        }
    });

    let mut investigation = orchestrator.run(targets.as_slice(), &tx).await;
    drop(tx);
    if let Err(e) = progress.await {
        warn!("Progress reporter failed: {}", e);
    }

    if let Some(max_depth) = expand {
        let added = PivotExpander::new(correlator)
            .expand_all(&mut investigation, max_depth)
            .await;
        info!("Expansion added {} linked targets", added);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&investigation.records())?);
    } else {
        print_table(&investigation);
    }

    Ok(())
}

fn print_table(investigation: &Investigation) {
    println!(
        "{:<32} {:<8} {:<16} {:<28} {:<3} {:>5} {:>5} {:>5} {:<8}",
        "TARGET", "STATUS", "ADDRESS", "OWNER", "CC", "PORTS", "CVES", "SCORE", "LEVEL"
    );
    println!("{}", "=".repeat(120));

    for record in investigation.iter() {
        let target = format!("{}{}", "  ".repeat(record.depth as usize), record.identifier);

        if record.is_success() {
            println!(
                "{:<32} {:<8} {:<16} {:<28} {:<3} {:>5} {:>5} {:>5} {:<8}",
                truncate(&target, 32),
                record.status,
                record.resolved_address.as_deref().unwrap_or("-"),
                truncate(record.owner_org.as_deref().unwrap_or("-"), 28),
                record.country_code.as_deref().unwrap_or("-"),
                record.open_ports.len(),
                record.vulnerability_ids.len(),
                record.threat_score,
                record.threat_level,
            );
        } else {
            println!(
                "{:<32} {:<8} {}",
                truncate(&target, 32),
                record.status,
                record.error_reason.as_deref().unwrap_or("-"),
            );
        }
    }
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let kept: String = value.chars().take(width.saturating_sub(3)).collect();
    format!("{}...", kept)
}

fn run_extract(file: Option<PathBuf>, json: bool) -> Result<()> {
    let text = match file {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let iocs = extract_iocs(&text);
    info!("Extracted {} indicators", iocs.total());

    let defanged = iocs.defanged();
    if json {
        println!("{}", serde_json::to_string_pretty(&defanged)?);
        return Ok(());
    }

    if defanged.is_empty() {
        println!("No indicators found.");
        return Ok(());
    }

    for (label, values) in [
        ("IPs", &defanged.ips),
        ("Domains", &defanged.domains),
        ("URLs", &defanged.urls),
        ("Hashes", &defanged.hashes),
    ] {
        if values.is_empty() {
            continue;
        }
        println!("{} ({}):", label, values.len());
        for value in values {
            println!("  {}", value);
        }
    }

    Ok(())
}

async fn run_history(path: PathBuf, delete: Option<i64>, clear: bool) -> Result<()> {
    let archive = JsonlArchive::new(&path);

    if clear {
        archive.clear().await?;
        println!("History cleared: {}", path.display());
        return Ok(());
    }

    if let Some(id) = delete {
        if archive.remove(id).await? {
            println!("Deleted entry {}", id);
        } else {
            println!("No entry with id {}", id);
        }
        return Ok(());
    }

    let entries = archive.entries().await?;
    if entries.is_empty() {
        println!("No scan history in {}", path.display());
        return Ok(());
    }

    for entry in entries {
        println!(
            "{}  {}  {} targets  {}",
            entry.id,
            entry.timestamp,
            entry.targets,
            entry.preview(3)
        );
    }

    Ok(())
}
