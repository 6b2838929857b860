// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use semantic_search::utils::logging::{
    format_error, format_info, format_match, format_step, format_success, format_warning,
};
use semantic_search::{
    Config, ConfiguredEmbedder, DocumentId, DocumentStore, EmbedOptions, Embedder, FlatIndex,
    JsonExporter, OperationTimer, QueryRunner, SearchError, SimilarityIndex, ingest,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "semantic_search")]
#[command(author = "cipher")]
#[command(version = "0.1.0")]
#[command(about = "Embed documents, persist the index and run top-k similarity queries", long_about = None)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config/default.toml"
    )]
    config: PathBuf,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write, embed and index the documents in a file, then save a snapshot
    Index {
        /// JSON document(s) or a plain text file
        path: PathBuf,

        /// Start from an empty store instead of resuming the existing snapshot
        #[arg(long)]
        fresh: bool,

        /// Recompute every embedding
        #[arg(long)]
        force: bool,

        #[arg(long, value_name = "PATH")]
        index: Option<PathBuf>,
    },

    /// Load a snapshot and print the documents most similar to the query
    Query {
        text: String,

        #[arg(short, long, value_name = "N")]
        k: Option<usize>,

        #[arg(long, value_name = "PATH")]
        index: Option<PathBuf>,
    },

    Stats {
        #[arg(long, value_name = "PATH")]
        index: Option<PathBuf>,
    },

    Export {
        #[arg(long, value_name = "PATH")]
        index: Option<PathBuf>,

        #[arg(short, long, default_value = "./exports")]
        output: PathBuf,

        #[arg(short, long)]
        pretty: bool,

        #[arg(long, value_name = "ID")]
        id: Option<u64>,
    },

    /// Empty the snapshot
    Reset {
        #[arg(long, value_name = "PATH")]
        index: Option<PathBuf>,

        #[arg(long)]
        confirm: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    semantic_search::utils::logging::init_logger(cli.color, cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let kind = err.downcast_ref::<SearchError>().map(SearchError::kind);
            let code = kind.map(|k| k.code()).unwrap_or("E_FATAL");
            eprintln!("{}", format_error(&format!("error[{}]: {:#}", code, err)));
            let status = kind.map(|k| k.exit_code()).unwrap_or(1);
            ExitCode::from(u8::try_from(status).unwrap_or(1))
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    info!("Loading configuration from: {}", cli.config.display());

    let config = if cli.config.exists() {
        Config::load(Some(cli.config.as_path())).context("Failed to load configuration")?
    } else {
        warn!(
            "Config file {} not found, using default configuration",
            cli.config.display()
        );
        Config::load(None).unwrap_or_else(|e| {
            warn!("Falling back to built-in defaults: {}", e);
            Config::default_config()
        })
    };

    match cli.command {
        Commands::Index {
            path,
            fresh,
            force,
            index,
        } => {
            let snapshot = snapshot_path(&config, index);
            cmd_index(&config, &path, &snapshot, fresh, force).await?;
        }
        Commands::Query { text, k, index } => {
            let snapshot = snapshot_path(&config, index);
            cmd_query(&config, &text, k, &snapshot).await?;
        }
        Commands::Stats { index } => {
            cmd_stats(&snapshot_path(&config, index))?;
        }
        Commands::Export {
            index,
            output,
            pretty,
            id,
        } => {
            cmd_export(&snapshot_path(&config, index), output, pretty, id)?;
        }
        Commands::Reset { index, confirm } => {
            cmd_reset(&config, &snapshot_path(&config, index), confirm)?;
        }
    }

    Ok(())
}

fn snapshot_path(config: &Config, override_path: Option<PathBuf>) -> PathBuf {
    override_path.unwrap_or_else(|| config.store.snapshot_path.clone())
}

fn load_snapshot(snapshot: &Path) -> Result<DocumentStore> {
    DocumentStore::load(snapshot).with_context(|| {
        format!(
            "Failed to load snapshot {} (run `index` first?)",
            snapshot.display()
        )
    })
}

async fn cmd_index(
    config: &Config,
    path: &Path,
    snapshot: &Path,
    fresh: bool,
    force: bool,
) -> Result<()> {
    let total = OperationTimer::new("index");

    println!("{}", format_step(1, 4, "Writing documents"));
    let documents = ingest::read_documents(path)
        .with_context(|| format!("Failed to read documents from {}", path.display()))?;

    let mut store = if !fresh && snapshot.exists() {
        info!("Resuming from snapshot {}", snapshot.display());
        load_snapshot(snapshot)?
    } else {
        DocumentStore::new(config.store.metric)
    };

    if store.metric() != config.store.metric {
        warn!(
            "Snapshot uses metric {}, configuration says {}; keeping {}",
            store.metric(),
            config.store.metric,
            store.metric()
        );
    }

    let ids = store.write(documents).context("Failed to write documents")?;
    info!("Assigned ids {:?}", ids);

    println!("{}", format_step(2, 4, "Updating embeddings"));
    let embedder = ConfiguredEmbedder::from_config(&config.embedder)?;
    let options = EmbedOptions {
        force: force || config.pipeline.force_reembed,
        parallel_workers: config.pipeline.parallel_workers,
        deadline: ConfiguredEmbedder::deadline(&config.embedder),
        truncate_input: config.embedder.truncate_input,
    };

    let timer = OperationTimer::new("embed");
    let embedded = match store.update_embeddings(&embedder, &options).await {
        Ok(count) => count,
        Err(e @ SearchError::EmbeddingBatch { .. }) => {
            // Keep the vectors that were computed before reporting the failure.
            store
                .save(snapshot)
                .context("Failed to save partial snapshot")?;
            if let SearchError::EmbeddingBatch { failures, .. } = &e {
                for (id, cause) in failures {
                    error!("Document {} was not embedded: {}", id, cause);
                }
            }
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };
    timer.finish_with_count(embedded);

    println!("{}", format_step(3, 4, "Building index"));
    let index = FlatIndex::from_store(&store, store.metric())?;
    info!(
        "Index holds {} vectors (dimension {:?}, metric {})",
        index.len(),
        index.dimension(),
        index.metric()
    );

    println!("{}", format_step(4, 4, "Saving snapshot"));
    store
        .save(snapshot)
        .with_context(|| format!("Failed to save snapshot {}", snapshot.display()))?;

    total.finish();
    println!(
        "{}",
        format_success(&format!(
            "Indexed {} new document(s), {} embedding(s) computed, snapshot at {}",
            ids.len(),
            embedded,
            snapshot.display()
        ))
    );

    Ok(())
}

async fn cmd_query(config: &Config, text: &str, k: Option<usize>, snapshot: &Path) -> Result<()> {
    info!("Searching for: {}", text);
    let timer = OperationTimer::new("query");

    let store = load_snapshot(snapshot)?;
    let index = FlatIndex::from_store(&store, store.metric())?;

    if store.pending_count() > 0 {
        println!(
            "{}",
            format_warning(&format!(
                "{} document(s) have no embedding and cannot match",
                store.pending_count()
            ))
        );
    }

    let embedder = ConfiguredEmbedder::from_config(&config.embedder)?;
    if let Some(stored) = store.embeddings().next().map(|(_, e)| e.model.as_str()) {
        if stored != embedder.model_id() {
            warn!(
                "Snapshot was embedded with {}, querying with {}",
                stored,
                embedder.model_id()
            );
        }
    }

    let runner = QueryRunner::new()
        .with_deadline(ConfiguredEmbedder::deadline(&config.embedder))
        .with_truncation(config.embedder.truncate_input);
    let k = k.unwrap_or(config.query.top_k);
    let results = runner
        .run(text, &embedder, &store, &index, k)
        .await
        .context("Query failed")?;

    if results.is_empty() {
        println!("{}", format_info(&format!("No matching documents for \"{}\"", text)));
        timer.finish();
        return Ok(());
    }

    println!("\nMatching Article(s) for \"{}\":\n", text);
    for (rank, result) in results.iter().enumerate() {
        println!("{}\n", format_match(rank + 1, result));
    }

    timer.finish_with_count(results.len());
    Ok(())
}

fn cmd_stats(snapshot: &Path) -> Result<()> {
    let store = load_snapshot(snapshot)?;

    println!("Snapshot:   {}", snapshot.display());
    println!("Metric:     {}", store.metric());
    println!(
        "Dimension:  {}",
        store
            .dimension()
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string())
    );
    println!("Documents:  {}", store.len());
    println!("Embedded:   {}", store.embedded_count());
    println!("Pending:    {}", store.pending_count());

    Ok(())
}

fn cmd_export(snapshot: &Path, output: PathBuf, pretty: bool, id: Option<u64>) -> Result<()> {
    let store = load_snapshot(snapshot)?;
    let exporter = JsonExporter::new(output)?;

    if let Some(id) = id {
        let path = exporter.export_single(&store, DocumentId(id), pretty)?;
        println!("{}", format_success(&format!("Exported {}", path.display())));
    } else {
        let manifest = exporter.export_all(&store, pretty)?;
        println!(
            "{}",
            format_success(&format!(
                "Exported {} document(s)",
                manifest.total_documents
            ))
        );
    }

    Ok(())
}

fn cmd_reset(config: &Config, snapshot: &Path, confirm: bool) -> Result<()> {
    if !confirm {
        error!("This will delete all documents and embeddings. Use --confirm to proceed");
        return Ok(());
    }

    let mut store = if snapshot.exists() {
        load_snapshot(snapshot)?
    } else {
        DocumentStore::new(config.store.metric)
    };
    store.reset();
    store.save(snapshot)?;

    println!(
        "{}",
        format_success(&format!("Snapshot {} reset", snapshot.display()))
    );
    Ok(())
}
