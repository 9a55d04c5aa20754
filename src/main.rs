use airstream::orchestration::{DistributionPipeline, DistributionRequest, SnapshotService};
use airstream::{
    config::Config, ArchiveStore, CsvTransferSource, FsArchive, MerkleEngine, SnapshotRegistry,
    TransferSource, TreeRegistry,
};
use anyhow::Context;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(config).await {
        eprintln!("Distribution failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    let source: Arc<dyn TransferSource> = Arc::new(CsvTransferSource::new(
        config.transfer_log_path.clone(),
        config.total_supply,
    ));
    let archive = config
        .archive_dir
        .clone()
        .map(|dir| Arc::new(FsArchive::new(dir)) as Arc<dyn ArchiveStore>);

    let registry = Arc::new(SnapshotRegistry::new());
    let snapshots = SnapshotService::new(source, registry, config.chain_id);
    let merkle = MerkleEngine::new(Arc::new(TreeRegistry::new()));
    let pipeline = DistributionPipeline::new(snapshots, merkle, archive);

    let plan = pipeline
        .create_distribution(&DistributionRequest::from(&config))
        .await
        .with_context(|| {
            format!(
                "creating distribution from {}",
                config.transfer_log_path.display()
            )
        })?;

    tracing::info!(
        "Distribution ready: tree {} with {} leaves, root {}",
        plan.tree.id,
        plan.tree.leaf_count,
        airstream::domain::format_hash(&plan.tree.root)
    );

    let json = serde_json::to_string_pretty(&plan).context("serializing distribution plan")?;
    println!("{}", json);
    Ok(())
}
