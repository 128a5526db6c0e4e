//! Deterministic utilities for reproducible training
//!
//! Every randomized step draws from its own `StdRng` seeded from the run seed
//! plus a fixed stream offset, so steps never share a generator and adding
//! draws to one step cannot shift another.

use crate::errors::TrainerError;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Stream offsets for the randomized training steps.
pub mod streams {
    pub const BALANCE: u64 = 1;
    pub const SPLIT: u64 = 2;
    pub const FOLDS: u64 = 3;
    pub const EXTRA_TREES: u64 = 4;
    pub const MARGIN: u64 = 5;
}

/// Seeded generator for one training step.
pub fn step_rng(seed: u64, stream: u64) -> StdRng {
    StdRng::seed_from_u64(seed.wrapping_add(stream.wrapping_mul(0x9E37_79B9_7F4A_7C15)))
}

/// Shuffled `0..n`.
pub fn permutation(n: usize, rng: &mut StdRng) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);
    indices
}

/// Shuffle and split `0..n` into `(train, test)` index sets.
///
/// The test partition takes `ceil(n * test_fraction)` rows; both partitions
/// must end up non-empty.
pub fn train_test_split(
    n: usize,
    test_fraction: f64,
    rng: &mut StdRng,
) -> Result<(Vec<usize>, Vec<usize>), TrainerError> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(TrainerError::Training(format!(
            "test fraction must be in (0, 1), got {test_fraction}"
        )));
    }
    let n_test = (n as f64 * test_fraction).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(TrainerError::Training(format!(
            "cannot split {n} samples with test fraction {test_fraction}"
        )));
    }

    let mut indices = permutation(n, rng);
    let train = indices.split_off(n_test);
    Ok((train, indices))
}

/// Assign each sample to one of `k` folds, preserving class proportions.
///
/// Samples of each class are shuffled and dealt round-robin. Every class
/// needs at least `k` samples so that each fold sees it in training.
pub fn stratified_folds(
    labels: &[usize],
    n_classes: usize,
    k: usize,
    rng: &mut StdRng,
) -> Result<Vec<usize>, TrainerError> {
    if k < 2 {
        return Err(TrainerError::Training(format!(
            "cross-validation needs at least 2 folds, got {k}"
        )));
    }

    let mut by_class: Vec<Vec<usize>> = vec![Vec::new(); n_classes];
    for (i, &label) in labels.iter().enumerate() {
        by_class
            .get_mut(label)
            .ok_or_else(|| TrainerError::Training(format!("label index {label} out of range")))?
            .push(i);
    }

    let mut assignment = vec![0usize; labels.len()];
    let mut next_fold = 0usize;
    for (class, members) in by_class.iter_mut().enumerate() {
        if members.len() < k {
            return Err(TrainerError::EmptyClass {
                label: format!("#{class}"),
                count: members.len(),
                required: k,
            });
        }
        members.shuffle(rng);
        // Continue dealing where the previous class stopped to even out fold sizes.
        for &sample in members.iter() {
            assignment[sample] = next_fold;
            next_fold = (next_fold + 1) % k;
        }
    }
    Ok(assignment)
}
