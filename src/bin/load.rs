use clap::{Parser, ValueEnum};
use staffload::Config;
use staffload::config::MAX_BATCH_SIZE;
use staffload::db::Db;
use staffload::ingest::{
    discover_csv_files, CoercionPolicy, CommitMode, IngestionOrchestrator, WriteStrategy,
};
use std::path::PathBuf;
use std::time::Instant;
use anyhow::Result;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    Upsert,
    InsertOnly,
    InsertOnlyByKey,
}

impl From<StrategyArg> for WriteStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Upsert => WriteStrategy::Upsert,
            StrategyArg::InsertOnly => WriteStrategy::InsertOnly,
            StrategyArg::InsertOnlyByKey => WriteStrategy::InsertOnlyByKey,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CommitArg {
    EndOfRun,
    PerFile,
}

impl From<CommitArg> for CommitMode {
    fn from(arg: CommitArg) -> Self {
        match arg {
            CommitArg::EndOfRun => CommitMode::EndOfRun,
            CommitArg::PerFile => CommitMode::PerFile,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "load")]
#[command(about = "Load employees, departments and jobs CSV files from a folder in one ingestion run")]
struct Args {
    /// Folder to scan (defaults to ingest.data_folder from config.toml)
    folder: Option<PathBuf>,

    /// Write strategy override
    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Records per batch override
    #[arg(long)]
    batch_size: Option<usize>,

    /// Commit mode override
    #[arg(long, value_enum)]
    commit_mode: Option<CommitArg>,

    /// Reject rows with unparseable values instead of substituting defaults
    #[arg(long)]
    strict: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default()
            .filter_or("RUST_LOG", "info")
    ).init();

    let args = Args::parse();

    log::info!("Starting Staffload folder load");

    let config = Config::load()?;
    log::info!("Configuration loaded successfully");
    log::info!("Database path: {}", config.db_path().display());

    let folder = args
        .folder
        .clone()
        .or_else(|| config.ingest.data_folder.clone())
        .ok_or_else(|| anyhow::anyhow!("No folder given and ingest.data_folder is not set in config.toml"))?;

    let mut options = config.ingest_options();
    if let Some(strategy) = args.strategy {
        options.strategy = strategy.into();
    }
    if let Some(commit_mode) = args.commit_mode {
        options.commit_mode = commit_mode.into();
    }
    if let Some(batch_size) = args.batch_size {
        if batch_size == 0 || batch_size > MAX_BATCH_SIZE {
            anyhow::bail!("--batch-size must be between 1 and {}, got {}", MAX_BATCH_SIZE, batch_size);
        }
        options.batch_size = batch_size;
    }
    if args.strict {
        options.coercion = CoercionPolicy::Strict;
    }

    let db = Db::new(config.db_path());
    db.initialize().await?;
    log::info!("Database initialized");

    log::info!("Discovering CSV files in {}", folder.display());
    let files = discover_csv_files(&folder)?;
    if files.is_empty() {
        log::warn!("No CSV files found in {}", folder.display());
        return Ok(());
    }
    for file in &files {
        match file.kind {
            Some(kind) => log::info!("  {} → {} ({} bytes)", file.relative_path, kind.keyword(), file.file_size),
            None => log::warn!("{} matches no entity (employees, departments, jobs)", file.relative_path),
        }
    }

    let uploads = files
        .iter()
        .map(|f| f.read())
        .collect::<staffload::Result<Vec<_>>>()?;

    log::info!(
        "Loading {} file(s) with strategy {:?}, commit {:?}, batch size {}",
        uploads.len(),
        options.strategy,
        options.commit_mode,
        options.batch_size
    );

    let start = Instant::now();
    let orchestrator = IngestionOrchestrator::new(db, options);
    let report = orchestrator.run(uploads).await?;
    let elapsed = start.elapsed();

    log::info!("=== Load Complete ===");
    log::info!("Run: {}", report.run_id);
    for file in &report.files {
        log::info!(
            "  {}: {} parsed, {} written",
            file.filename,
            file.rows_parsed,
            file.rows_written
        );
    }
    log::info!(
        "Rows written: {}",
        report.files.iter().map(|f| f.rows_written).sum::<usize>()
    );
    log::info!("Time: {:?}", elapsed);

    Ok(())
}
