// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// Shuffles records with a seeded RNG and splits them into:
//   - Training set:   used to update model weights
//   - Validation set: used to measure performance on unseen data
//
// The partition is a deterministic function of the seed: the same
// seed on the same corpus yields bit-identical membership in both
// subsets on every run. The evaluator re-derives the validation
// set later by repeating the split with the seed recorded in the
// snapshot config, so determinism here is a hard contract, not a
// convenience — thread-local RNGs are deliberately not used.
//
// The two subsets are disjoint by construction (two halves of one
// shuffled permutation) and together cover the whole corpus.
//
// Uses Fisher-Yates shuffle via rand::seq::SliceRandom.
//
// Reference: rand crate documentation (SeedableRng)

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Shuffle `records` with the given seed and split into
/// (train, validation).
///
/// # Arguments
/// * `records`        - All available records (consumed by this function)
/// * `train_fraction` - Proportion for training, e.g. 0.8 = 80%
/// * `seed`           - Seed for the shuffle; same seed → same partition
///
/// # Returns
/// A tuple (train_records, val_records)
pub fn split_train_val<T>(
    mut records:    Vec<T>,
    train_fraction: f64,
    seed:           u64,
) -> (Vec<T>, Vec<T>) {
    // Seeded RNG so the permutation is reproducible across runs
    // and across processes (train now, evaluate later).
    let mut rng = StdRng::seed_from_u64(seed);

    // Fisher-Yates shuffle — every permutation is equally likely
    records.shuffle(&mut rng);

    // Calculate the split index
    // e.g. 100 records * 0.8 = 80 → first 80 are training
    let total    = records.len();
    let split_at = ((total as f64) * train_fraction).round() as usize;

    // Clamp to valid range to avoid panics on tiny datasets
    let split_at = split_at.min(total);

    // split_off(n) removes elements [n..] from the Vec and returns them
    // After this: records = [0..split_at], val = [split_at..total]
    let val = records.split_off(split_at);

    tracing::debug!(
        "Dataset split (seed {}): {} training, {} validation",
        seed,
        records.len(),
        val.len(),
    );

    (records, val)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correct_split_sizes() {
        let items: Vec<usize> = (0..100).collect();
        let (train, val)      = split_train_val(items, 0.8, 42);
        assert_eq!(train.len(), 80);
        assert_eq!(val.len(),   20);
    }

    #[test]
    fn test_validation_share_within_one_of_twenty_percent() {
        // Odd corpus size — rounding may move one record either way
        let items: Vec<usize> = (0..101).collect();
        let (_, val)          = split_train_val(items, 0.8, 42);
        let expected          = (101.0_f64 * 0.2).round() as isize;
        assert!((val.len() as isize - expected).abs() <= 1);
    }

    #[test]
    fn test_same_seed_same_partition() {
        let items: Vec<usize> = (0..500).collect();
        let (train_a, val_a)  = split_train_val(items.clone(), 0.8, 42);
        let (train_b, val_b)  = split_train_val(items, 0.8, 42);
        // Bit-identical membership AND order across repeated executions
        assert_eq!(train_a, train_b);
        assert_eq!(val_a, val_b);
    }

    #[test]
    fn test_different_seed_different_partition() {
        let items: Vec<usize> = (0..500).collect();
        let (train_a, _)      = split_train_val(items.clone(), 0.8, 42);
        let (train_b, _)      = split_train_val(items, 0.8, 43);
        assert_ne!(train_a, train_b);
    }

    #[test]
    fn test_disjoint_and_exhaustive() {
        let items: Vec<usize> = (0..250).collect();
        let (train, val)      = split_train_val(items, 0.8, 7);

        assert_eq!(train.len() + val.len(), 250);

        // Elements are unique, so set intersection checks disjointness
        let train_set: std::collections::HashSet<_> = train.iter().collect();
        assert!(val.iter().all(|v| !train_set.contains(v)));
    }

    #[test]
    fn test_empty_dataset() {
        let items: Vec<usize> = Vec::new();
        let (train, val)      = split_train_val(items, 0.8, 42);
        assert!(train.is_empty());
        assert!(val.is_empty());
    }

    #[test]
    fn test_full_training_split() {
        // 1.0 fraction means everything goes to training
        let items: Vec<usize> = (0..10).collect();
        let (train, val)      = split_train_val(items, 1.0, 42);
        assert_eq!(train.len(), 10);
        assert!(val.is_empty());
    }
}
