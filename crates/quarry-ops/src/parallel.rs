//! Applying one operator to many independent batches.

use quarry_columnar::ColumnBatch;

use crate::error::ExecResult;
use crate::operator::UncheckedOperator;

#[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
use rayon::ThreadPool;
#[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
use std::sync::OnceLock;

/// Pool used for fragment application, sized by `RAYON_NUM_THREADS` or the available cores.
///
/// Built on first use and never torn down. `None` when not even a single worker thread could be
/// spawned; callers then apply fragments on the calling thread.
#[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
fn fragment_pool() -> Option<&'static ThreadPool> {
    static POOL: OnceLock<Option<ThreadPool>> = OnceLock::new();
    POOL.get_or_init(|| {
        let threads = std::env::var("RAYON_NUM_THREADS")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|&n| n > 0)
            .or_else(|| std::thread::available_parallelism().ok().map(|n| n.get()))
            .unwrap_or(1);
        let build = |n| rayon::ThreadPoolBuilder::new().num_threads(n).build();
        let pool = build(threads).or_else(|err| {
            log::warn!("operator pool with {threads} threads unavailable: {err}");
            build(1)
        });
        match pool {
            Ok(pool) => {
                log::debug!("operator pool started with {} threads", pool.current_num_threads());
                Some(pool)
            }
            Err(err) => {
                log::warn!("applying fragments sequentially: {err}");
                None
            }
        }
    })
    .as_ref()
}

/// Apply `operator` to each fragment's input columns.
///
/// Outputs come back in fragment order. If any fragment faults, the error of the earliest
/// faulting fragment is returned and no outputs are.
pub fn apply_to_batches_parallel(
    operator: &UncheckedOperator,
    fragments: &[Vec<ColumnBatch>],
) -> ExecResult<Vec<ColumnBatch>> {
    #[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
    {
        use rayon::prelude::*;

        if let Some(pool) = fragment_pool() {
            let outputs: Vec<ExecResult<ColumnBatch>> = pool.install(|| {
                fragments
                    .par_iter()
                    .map(|columns| operator.apply_to_columns(columns))
                    .collect()
            });
            return outputs.into_iter().collect();
        }
    }

    fragments
        .iter()
        .map(|columns| operator.apply_to_columns(columns))
        .collect()
}
