//! shardvault command line
//!
//! Usage:
//!   shardvault build --count 5 --input chapter2.txt
//!   shardvault add-replication
//!   shardvault add-shard
//!   shardvault sync
//!   shardvault show 0-1
//!
//! Log verbosity follows `RUST_LOG` (default `shardvault=info`).

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use shardvault::{dataset, ShardError, ShardManager, StoreConfig};

#[derive(Parser, Debug)]
#[command(name = "shardvault")]
#[command(about = "Shard a text file into N pieces with replicated copies")]
#[command(version)]
struct Args {
    /// JSON config file (index path, shard dir, extension)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Index file, overrides the config
    #[arg(long)]
    index: Option<PathBuf>,

    /// Shard directory, overrides the config
    #[arg(long)]
    shard_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Split a file into shards (only on an empty index)
    Build {
        /// Number of shards
        #[arg(short = 'n', long)]
        count: usize,
        /// Dataset file
        #[arg(short, long, default_value = "chapter2.txt")]
        input: PathBuf,
    },
    /// Rebalance across one more shard
    AddShard,
    /// Rebalance across one fewer shard
    RemoveShard,
    /// Add a replication level
    AddReplication,
    /// Remove the deepest replication level
    RemoveReplication,
    /// Repair missing primaries and stale replicas
    Sync,
    /// List shard and replica ids
    Ids,
    /// Print the byte range of one id, or the whole index
    Show { id: Option<String> },
    /// Write the reassembled dataset to stdout or a file
    Reconstruct {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Write the effective config as JSON
    InitConfig { path: PathBuf },
}

fn load_config(args: &Args) -> Result<StoreConfig> {
    let mut config = match &args.config {
        Some(path) => StoreConfig::read_from(path)?
            .with_context(|| format!("config file {:?} not found", path))?,
        None => StoreConfig::default(),
    };
    if let Some(index) = &args.index {
        config.index_path = index.clone();
    }
    if let Some(shard_dir) = &args.shard_dir {
        config.shard_dir = shard_dir.clone();
    }
    Ok(config)
}

fn run(args: Args) -> Result<()> {
    let config = load_config(&args)?;
    let mut manager = ShardManager::from_config(&config)
        .with_context(|| format!("opening index {:?}", config.index_path))?;

    match args.command {
        Command::Build { count, input } => {
            let data = dataset::load_from_file(&input)
                .with_context(|| format!("reading dataset {:?}", input))?;
            manager.build(count, &data)?;
            println!("built {} shards", count);
        }
        Command::AddShard => {
            manager.add_shard()?;
            println!("now {} shards", manager.shard_ids().len());
        }
        Command::RemoveShard => {
            manager.remove_shard()?;
            println!("now {} shards", manager.shard_ids().len());
        }
        Command::AddReplication => {
            let level = manager.add_replication()?;
            println!("added replication level {}", level);
        }
        Command::RemoveReplication => {
            let level = manager.remove_replication()?;
            println!("removed replication level {}", level);
        }
        Command::Sync => {
            let report = manager.sync()?;
            if report.is_clean() {
                println!("in sync");
            }
            for shard in &report.restored_primaries {
                println!("restored primary {}", shard);
            }
            for replica in &report.rebuilt_replicas {
                println!("rebuilt replica {}", replica);
            }
        }
        Command::Ids => {
            println!("shards: {:?}", manager.shard_ids());
            let replicas: Vec<String> =
                manager.replica_ids().iter().map(|id| id.to_string()).collect();
            println!("replicas: {:?}", replicas);
            println!("replication depth: {}", manager.replication_depth());
        }
        Command::Show { id: Some(id) } => match manager.shard_data(&id) {
            Ok((entry, range)) => println!("Shard {}: {}", entry, serde_json::to_string(&range)?),
            Err(e) if e.is_recoverable() => println!("{}", e),
            Err(e) => return Err(e.into()),
        },
        Command::Show { id: None } => {
            println!("{}", serde_json::to_string_pretty(manager.all_shard_data())?);
        }
        Command::Reconstruct { output } => {
            let data = manager.reconstruct()?;
            match output {
                Some(path) => std::fs::write(&path, &data)
                    .with_context(|| format!("writing {:?}", path))?,
                None => std::io::stdout().write_all(&data)?,
            }
        }
        Command::InitConfig { path } => {
            config.write_to(&path)?;
            println!("wrote config to {}", path.display());
        }
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("shardvault=info")),
        )
        .init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        match e.downcast_ref::<ShardError>() {
            Some(shard_err) => eprintln!("[shardvault] {}: {:#}", shard_err.code(), e),
            None => eprintln!("[shardvault] error: {:#}", e),
        }
        std::process::exit(1);
    }
}
