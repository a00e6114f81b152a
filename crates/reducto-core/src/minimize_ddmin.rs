use crate::minimize::{Minimizer, Reduction};
use crate::oracle::Oracle;
use crate::partition::{complement, divide};
use crate::types::{MinimizeStats, Verdict};
use tracing::{debug, info};

const INITIAL_GRANULARITY: usize = 2;

#[derive(Debug, Default)]
pub struct DdMinimizer;

impl Minimizer for DdMinimizer {
    fn minimize<T, O>(&self, initial: Vec<T>, oracle: &mut O) -> Result<Reduction<T>, O::Error>
    where
        T: Clone,
        O: Oracle<T>,
    {
        let mut stats = MinimizeStats {
            initial_len: initial.len(),
            ..MinimizeStats::default()
        };
        let mut working = initial;
        let mut granularity = INITIAL_GRANULARITY;

        'search: loop {
            let parts = divide(&working, granularity);
            debug!(size = working.len(), granularity, "partitioned working set");

            for (index, part) in parts.iter().enumerate() {
                if part.is_empty() {
                    continue;
                }
                stats.oracle_calls += 1;
                if oracle.evaluate(part)?.is_fail() {
                    info!(
                        from = working.len(),
                        to = part.len(),
                        part = index,
                        "reduced to partition"
                    );
                    working = part.clone();
                    granularity = INITIAL_GRANULARITY;
                    stats.partition_shrinks += 1;
                    continue 'search;
                }
            }

            for index in 0..parts.len() {
                let candidate = complement(&parts, index);
                if candidate.is_empty() {
                    continue;
                }
                stats.oracle_calls += 1;
                if oracle.evaluate(&candidate)?.is_fail() {
                    info!(
                        from = working.len(),
                        to = candidate.len(),
                        removed = index,
                        "reduced to complement"
                    );
                    working = candidate;
                    granularity = (granularity - 1).max(INITIAL_GRANULARITY);
                    stats.complement_shrinks += 1;
                    continue 'search;
                }
            }

            granularity *= 2;
            stats.granularity_increases += 1;
            if granularity > working.len() {
                break;
            }
        }

        stats.final_len = working.len();
        stats.final_granularity = granularity;
        info!(
            initial = stats.initial_len,
            minimized = stats.final_len,
            oracle_calls = stats.oracle_calls,
            "minimization converged"
        );
        Ok(Reduction {
            elements: working,
            stats,
        })
    }
}

/// Runs [`DdMinimizer`] with an infallible oracle and returns the minimized
/// elements.
pub fn ddmin<T, F>(initial: Vec<T>, mut oracle: F) -> Vec<T>
where
    T: Clone,
    F: FnMut(&[T]) -> Verdict,
{
    match DdMinimizer.minimize(initial, &mut oracle) {
        Ok(reduction) => reduction.elements,
        Err(never) => match never {},
    }
}
