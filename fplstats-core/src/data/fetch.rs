//! Batch fetch orchestrator: fetches every listed player with per-player
//! failure isolation and progress reporting.

use super::provider::{DataError, EntitySource, FetchProgress};
use crate::domain::{EntityFile, WeeklyTable};
use rayon::prelude::*;

/// Options for a batch fetch.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Players fetched at once. 0 and 1 both mean sequential.
    pub concurrency: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self { concurrency: 1 }
    }
}

/// Result of fetching one player.
#[derive(Debug)]
pub enum FetchOutcome {
    Fetched(WeeklyTable),
    Failed { entity: EntityFile, error: DataError },
}

impl FetchOutcome {
    pub fn entity(&self) -> &EntityFile {
        match self {
            FetchOutcome::Fetched(t) => &t.entity,
            FetchOutcome::Failed { entity, .. } => entity,
        }
    }

    pub fn is_fetched(&self) -> bool {
        matches!(self, FetchOutcome::Fetched(_))
    }
}

/// All outcomes of a batch, in listing order.
#[derive(Debug, Default)]
pub struct FetchBatch {
    pub outcomes: Vec<FetchOutcome>,
}

impl FetchBatch {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn fetched_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_fetched()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.total() - self.fetched_count()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed_count() == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = (&EntityFile, &DataError)> {
        self.outcomes.iter().filter_map(|o| match o {
            FetchOutcome::Failed { entity, error } => Some((entity, error)),
            FetchOutcome::Fetched(_) => None,
        })
    }
}

/// Fetch every entity. Failures are recorded per entity; the batch never aborts
/// on a single bad player.
///
/// Once the source reports itself unavailable (rate limited), the remaining
/// entities are marked failed without being requested.
pub fn fetch_all(
    source: &dyn EntitySource,
    entities: &[EntityFile],
    options: &FetchOptions,
    progress: &dyn FetchProgress,
) -> FetchBatch {
    let total = entities.len();
    tracing::info!(
        source = source.name(),
        total,
        concurrency = options.concurrency,
        "fetching gameweek files"
    );

    let outcomes: Vec<FetchOutcome> = if options.concurrency > 1 {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(options.concurrency)
            .build()
        {
            Ok(pool) => pool.install(|| {
                entities
                    .par_iter()
                    .enumerate()
                    .map(|(i, entity)| fetch_one(source, entity, i, total, progress))
                    .collect::<Vec<_>>()
            }),
            Err(e) => {
                tracing::warn!("failed to build fetch pool, fetching sequentially: {e}");
                fetch_sequential(source, entities, progress)
            }
        }
    } else {
        fetch_sequential(source, entities, progress)
    };

    let batch = FetchBatch { outcomes };
    progress.on_batch_complete(batch.fetched_count(), batch.failed_count(), total);
    tracing::info!(
        fetched = batch.fetched_count(),
        failed = batch.failed_count(),
        "fetch complete"
    );
    batch
}

fn fetch_sequential(
    source: &dyn EntitySource,
    entities: &[EntityFile],
    progress: &dyn FetchProgress,
) -> Vec<FetchOutcome> {
    let total = entities.len();
    let mut outcomes = Vec::with_capacity(total);

    for (i, entity) in entities.iter().enumerate() {
        outcomes.push(fetch_one(source, entity, i, total, progress));

        // Bail out early once the source stops answering
        if !source.is_available() {
            for rest in &entities[(i + 1)..] {
                outcomes.push(FetchOutcome::Failed {
                    entity: rest.clone(),
                    error: DataError::RateLimited(format!("{} not requested", rest.name)),
                });
            }
            break;
        }
    }

    outcomes
}

fn fetch_one(
    source: &dyn EntitySource,
    entity: &EntityFile,
    index: usize,
    total: usize,
    progress: &dyn FetchProgress,
) -> FetchOutcome {
    progress.on_start(entity, index, total);

    let result = if source.is_available() {
        source.fetch_entity(entity)
    } else {
        Err(DataError::RateLimited(format!("{} not requested", entity.name)))
    };

    match result {
        Ok(table) => {
            progress.on_complete(entity, index, total, Ok(table.len()));
            FetchOutcome::Fetched(table)
        }
        Err(error) => {
            tracing::warn!(player = %entity, "fetch failed: {error}");
            progress.on_complete(entity, index, total, Err(&error));
            FetchOutcome::Failed {
                entity: entity.clone(),
                error,
            }
        }
    }
}
