//! Batch synthesis of independent seams on a bounded worker pool.
//!
//! Jobs are grouped into waves in which no two jobs touch the same part.
//! Each wave runs in parallel, every job owning the two parts it edits;
//! the parts are merged back by id before the next wave starts.

use std::collections::BTreeMap;

use rayon::prelude::*;
use snapsplit_mesh::GeometryKernel;
use tracing::debug;

use super::ConnectJob;
use crate::cancel::CancelToken;
use crate::error::{SelectionError, SnapSplitError, SnapSplitResult};
use crate::part::{Part, PartId};
use crate::synthesis::{ConnectResult, ConnectorSynthesizer};

/// Groups job indices into waves of jobs with disjoint parts.
///
/// A job lands in the wave after the latest wave that already uses one of
/// its parts, so jobs sharing a part keep their input order.
///
/// ```
/// use snapsplit::orchestrator::batch::schedule_waves;
/// use snapsplit::PartId;
///
/// let pairs = [(PartId(0), PartId(1)), (PartId(2), PartId(3)), (PartId(1), PartId(2))];
/// assert_eq!(schedule_waves(&pairs), vec![vec![0, 1], vec![2]]);
/// ```
pub fn schedule_waves(pairs: &[(PartId, PartId)]) -> Vec<Vec<usize>> {
    let mut last_wave: BTreeMap<PartId, usize> = BTreeMap::new();
    let mut waves: Vec<Vec<usize>> = Vec::new();
    for (index, &(a, b)) in pairs.iter().enumerate() {
        let wave = [a, b]
            .iter()
            .filter_map(|id| last_wave.get(id))
            .max()
            .map_or(0, |w| w + 1);
        if waves.len() <= wave {
            waves.resize_with(wave + 1, Vec::new);
        }
        waves[wave].push(index);
        last_wave.insert(a, wave);
        last_wave.insert(b, wave);
    }
    waves
}

/// Runs `jobs` wave by wave and returns their results in job order.
///
/// `parts` is only updated when every wave finished; a cancelled or failed
/// batch leaves it untouched.
pub(crate) fn run_waves(
    kernel: &dyn GeometryKernel,
    worker_threads: usize,
    parts: &mut BTreeMap<PartId, Part>,
    jobs: Vec<ConnectJob>,
    cancel: &CancelToken,
) -> SnapSplitResult<Vec<ConnectResult>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(worker_threads)
        .build()
        .map_err(|err| SnapSplitError::Collaborator {
            service: "worker pool",
            message: err.to_string(),
        })?;

    let pairs: Vec<(PartId, PartId)> = jobs.iter().map(|job| (job.male, job.female)).collect();
    let waves = schedule_waves(&pairs);
    let mut working: BTreeMap<PartId, Part> = pairs
        .iter()
        .flat_map(|&(a, b)| [a, b])
        .filter_map(|id| parts.get(&id).map(|part| (id, part.clone())))
        .collect();
    let mut slots: Vec<Option<ConnectJob>> = jobs.into_iter().map(Some).collect();
    let mut results: Vec<Option<ConnectResult>> = vec![None; slots.len()];

    for (level, wave) in waves.iter().enumerate() {
        cancel.check()?;
        let mut owned = Vec::with_capacity(wave.len());
        for &index in wave {
            let job = slots[index].take();
            let (male, female) = pairs[index];
            match (job, working.remove(&male), working.remove(&female)) {
                (Some(job), Some(male), Some(female)) => owned.push((index, job, male, female)),
                _ => return Err(SelectionError::Overlapping(male).into()),
            }
        }
        debug!(wave = level, jobs = owned.len(), "synthesis wave");

        let finished: Vec<SnapSplitResult<(usize, Part, Part, ConnectResult)>> = pool.install(|| {
            owned
                .into_par_iter()
                .map(|(index, job, mut male, mut female)| {
                    let synthesizer = ConnectorSynthesizer::new(kernel);
                    let result =
                        synthesizer.synthesize(&mut male, &mut female, &job.plan, &job.tolerance, cancel)?;
                    Ok((index, male, female, result))
                })
                .collect()
        });

        for outcome in finished {
            let (index, male, female, result) = outcome?;
            working.insert(male.id(), male);
            working.insert(female.id(), female);
            results[index] = Some(result);
        }
    }
    cancel.check()?;

    parts.extend(working);
    Ok(results.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn ids(pairs: &[(u64, u64)]) -> Vec<(PartId, PartId)> {
        pairs.iter().map(|&(a, b)| (PartId(a), PartId(b))).collect()
    }

    #[test]
    fn test_independent_pairs_share_a_wave() {
        let pairs = ids(&[(0, 1), (2, 3), (4, 5)]);
        assert_eq!(schedule_waves(&pairs), vec![vec![0, 1, 2]]);
    }

    #[test]
    fn test_chain_is_serialized() {
        let pairs = ids(&[(0, 1), (1, 2), (2, 3)]);
        assert_eq!(schedule_waves(&pairs), vec![vec![0], vec![1], vec![2]]);
    }

    #[test]
    fn test_no_wave_shares_a_part() {
        let pairs = ids(&[(0, 1), (1, 2), (3, 4), (0, 3), (2, 4), (5, 6), (1, 5)]);
        let waves = schedule_waves(&pairs);
        let scheduled: usize = waves.iter().map(Vec::len).sum();
        assert_eq!(scheduled, pairs.len());
        for wave in &waves {
            let mut seen = BTreeSet::new();
            for &index in wave {
                let (a, b) = pairs[index];
                assert!(seen.insert(a), "{a} used twice in one wave");
                assert!(seen.insert(b), "{b} used twice in one wave");
            }
        }
    }

    #[test]
    fn test_jobs_on_a_part_keep_input_order() {
        let pairs = ids(&[(0, 1), (2, 3), (0, 2), (0, 1)]);
        let waves = schedule_waves(&pairs);
        let wave_of = |job: usize| waves.iter().position(|w| w.contains(&job)).unwrap();
        assert!(wave_of(0) < wave_of(2));
        assert!(wave_of(1) < wave_of(2));
        assert!(wave_of(2) < wave_of(3));
    }

    #[test]
    fn test_empty_batch() {
        assert!(schedule_waves(&[]).is_empty());
    }
}
