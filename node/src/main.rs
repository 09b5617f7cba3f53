use std::{io, sync::Arc};

use dataset::{RatingsDataset, SafetensorsLoader, ShardCatalog};
use futures::future;
use log::{info, warn};
use tokio::{signal, task};
use tokio_util::sync::CancellationToken;

use node::{NodeConfig, run_worker};

#[tokio::main]
async fn main() -> io::Result<()> {
    env_logger::init();

    let config = NodeConfig::from_env()?;
    let catalog = ShardCatalog::from_dir(&config.shard_dir)?;
    info!(
        shards = catalog.len(),
        seed = config.seed;
        "catalog loaded from {}",
        config.shard_dir.display()
    );

    let dataset = Arc::new(RatingsDataset::new(catalog, config.seed));
    let token = CancellationToken::new();

    let handles: Vec<_> = config
        .mode
        .contexts()
        .into_iter()
        .map(|ctx| {
            let dataset = Arc::clone(&dataset);
            let token = token.clone();
            let epochs = config.epochs;
            task::spawn_blocking(move || {
                run_worker(&dataset, ctx, epochs, SafetensorsLoader, &token)
            })
        })
        .collect();

    let mut workers = Box::pin(future::join_all(handles));
    let results = tokio::select! {
        results = &mut workers => results,
        _ = signal::ctrl_c() => {
            info!("received Ctrl-C, stopping workers");
            token.cancel();
            workers.await
        }
    };

    let mut failed = None;
    for result in results {
        match result.map_err(io::Error::other)? {
            Ok(summary) => {
                let digest = summary.passes.last().copied().unwrap_or_default();
                info!(
                    worker_id = summary.worker_id,
                    epochs = summary.passes.len(),
                    shards = summary.metrics.shards_loaded,
                    records = digest.records,
                    checksum = digest.checksum,
                    cancelled = summary.cancelled;
                    "worker finished"
                );
            }
            Err(e) => {
                warn!("worker failed: {e}");
                failed.get_or_insert(e);
            }
        }
    }

    match failed {
        Some(e) => Err(e.into()),
        None => {
            info!("wrapping up");
            Ok(())
        }
    }
}
